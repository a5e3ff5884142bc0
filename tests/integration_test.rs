//! End-to-end backtest tests.
//!
//! Tests cover:
//! - Reference scenarios: dip then stop-loss, always-buy liquidation, short series
//! - No look-ahead: truncating the series never changes earlier decisions
//! - Cash accounting across every trade, with and without slippage
//! - Seeded random strategy reproducibility
//! - Sweep cells match standalone runs and do not affect each other
//! - Strategy comparison ranks every registered strategy

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;

use bartrader::domain::backtest::{BacktestConfig, BacktestResult, Backtester, RunStatus};
use bartrader::domain::compare::compare_strategies;
use bartrader::domain::ledger::TradeKind;
use bartrader::domain::strategy::{Signal, StrategyId, StrategyParams, build_strategy};
use bartrader::domain::summary::TradeSummary;
use bartrader::domain::sweep::{SweepGrid, SweepRequest, run_sweep};
use bartrader::ports::data_port::DataPort;

fn reference_config() -> BacktestConfig {
    BacktestConfig {
        starting_balance: 1_000_000.0,
        position_fraction: 0.1,
        stop_loss: 0.015,
        take_profit: 0.07,
        minimum_order_amount: 5000.0,
        warmup_bars: 30,
        slippage_enabled: false,
    }
}

fn run(id: StrategyId, config: BacktestConfig, closes: &[f64], seed: u64) -> BacktestResult {
    let backtester = Backtester::new(config).unwrap();
    let mut strategy = build_strategy(id, &StrategyParams::default(), seed);
    backtester.run_raw(strategy.as_mut(), bars_from_closes(closes))
}

mod scenarios {
    use super::*;

    #[test]
    fn mean_reversion_buys_the_dip_and_stops_out() {
        let result = run(
            StrategyId::MeanReversion,
            reference_config(),
            &dip_closes(),
            0,
        );

        let kinds: Vec<TradeKind> = result.ledger.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TradeKind::Buy, TradeKind::StopLoss]);

        let buy = &result.ledger.as_slice()[0];
        assert_eq!(buy.timestamp, ts(35));
        assert_eq!(buy.price, 90.0);
        let stop = &result.ledger.as_slice()[1];
        assert_eq!(stop.timestamp, ts(36));
        assert_eq!(stop.price, 88.0);
        assert!(stop.profit.unwrap() < 0.0);

        assert_eq!(result.status, RunStatus::Completed);
        assert!(result.liquidation.is_none());
        assert!(result.final_balance < result.starting_balance);
        assert_relative_eq!(
            result.final_balance,
            900_000.0 + 100_000.0 / 90.0 * 88.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn always_buy_enters_once_and_is_liquidated() {
        let config = BacktestConfig {
            stop_loss: 0.0,
            take_profit: 0.5,
            ..reference_config()
        };
        let closes = rising_closes(50);
        let result = run(StrategyId::AlwaysBuy, config, &closes, 0);

        assert_eq!(result.ledger.len(), 1);
        let buy = &result.ledger.as_slice()[0];
        assert_eq!(buy.kind, TradeKind::Buy);
        assert_eq!(buy.timestamp, ts(30));
        assert_eq!(buy.price, 130.0);

        let liq = result.liquidation.as_ref().unwrap();
        assert_eq!(liq.price, 149.0);
        assert_relative_eq!(liq.quantity, 100_000.0 / 130.0, max_relative = 1e-12);
        assert_relative_eq!(
            result.final_balance,
            900_000.0 + 100_000.0 / 130.0 * 149.0,
            max_relative = 1e-12
        );
        assert!(result.final_balance > result.starting_balance);
        assert_eq!(result.closing_trades, 0);
    }

    #[test]
    fn series_no_longer_than_warmup_trades_nothing() {
        let result = run(
            StrategyId::AlwaysBuy,
            reference_config(),
            &rising_closes(30),
            0,
        );
        assert!(result.ledger.is_empty());
        assert_eq!(
            result.status,
            RunStatus::InsufficientData {
                bars: 30,
                warmup: 30
            }
        );
        assert_eq!(result.final_balance, result.starting_balance);
        assert_eq!(result.return_ratio, 0.0);
    }

    #[test]
    fn scripted_round_trip_through_mock_port() {
        let port = MockDataPort::new(bars_from_closes(&rising_closes(10)));
        let bars = port
            .fetch_bars(Some(date(2025, 1, 2)), Some(date(2025, 1, 9)))
            .unwrap();
        assert_eq!(bars.len(), 8);

        let config = BacktestConfig {
            warmup_bars: 1,
            stop_loss: 0.0,
            take_profit: 0.5,
            ..reference_config()
        };
        let mut strategy = ScriptedStrategy::new(&[(2, Signal::Buy), (5, Signal::Sell)]);
        let result = Backtester::new(config).unwrap().run_raw(&mut strategy, bars);

        let kinds: Vec<TradeKind> = result.ledger.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TradeKind::Buy, TradeKind::Sell]);
        assert_eq!(result.wins, 1);
        let summary = TradeSummary::compute(&result.ledger);
        assert_eq!(summary.holding.periods[0].days, 3);
    }

    #[test]
    fn zero_priced_bar_never_opens_a_position() {
        let config = BacktestConfig {
            warmup_bars: 2,
            stop_loss: 0.0,
            take_profit: 0.5,
            ..reference_config()
        };
        let mut strategy = ScriptedStrategy::new(&[(2, Signal::Buy), (3, Signal::Buy)]);
        let bars = bars_from_closes(&[100.0, 100.0, 0.0, 100.0]);
        let result = Backtester::new(config).unwrap().run(&mut strategy, &bars);

        assert!(result.final_balance.is_finite());
        let buys: Vec<_> = result.ledger.iter().map(|t| (t.kind, t.price)).collect();
        assert_eq!(buys, vec![(TradeKind::Buy, 100.0)]);
        assert!(result.ledger.iter().all(|t| t.quantity.is_finite()));
        assert_relative_eq!(result.final_balance, result.starting_balance);
    }

    #[test]
    fn failing_port_surfaces_data_error() {
        let port = MockDataPort::failing("exchange unavailable");
        assert!(port.fetch_bars(None, None).is_err());
    }
}

mod look_ahead {
    use super::*;

    #[test]
    fn truncation_never_changes_earlier_trades() {
        let closes = wave_closes(160);
        let config = BacktestConfig {
            warmup_bars: 35,
            position_fraction: 0.5,
            stop_loss: 0.03,
            take_profit: 0.05,
            ..reference_config()
        };

        for id in StrategyId::ALL {
            let full = run(id, config.clone(), &closes, 11);
            for cut in [60, 90, 120, 159] {
                let partial = run(id, config.clone(), &closes[..cut], 11);
                let horizon = ts(cut as i64);
                let expected: Vec<_> = full
                    .ledger
                    .iter()
                    .filter(|t| t.timestamp < horizon)
                    .cloned()
                    .collect();
                assert_eq!(
                    partial.ledger.as_slice(),
                    expected.as_slice(),
                    "{id} diverged when cut at {cut}"
                );
            }
        }
    }
}

mod accounting {
    use super::*;

    fn check_cash_walk(result: &BacktestResult) {
        let mut cash = result.starting_balance;
        let mut expect_buy = true;
        for t in &result.ledger {
            assert_eq!(t.kind == TradeKind::Buy, expect_buy, "trades must alternate");
            expect_buy = !expect_buy;
            let notional = t.quantity * t.execution_price;
            let expected = if t.kind == TradeKind::Buy {
                cash - notional
            } else {
                cash + notional
            };
            assert_relative_eq!(t.balance, expected, epsilon = 1e-6, max_relative = 1e-9);
            assert!(t.balance >= 0.0);
            cash = t.balance;
        }

        let marked = result.liquidation.as_ref().map_or(0.0, |l| l.value);
        assert_relative_eq!(
            result.final_balance,
            cash + marked,
            epsilon = 1e-6,
            max_relative = 1e-9
        );
    }

    proptest! {
        #[test]
        fn every_trade_moves_cash_by_its_notional(
            closes in prop::collection::vec(50.0f64..150.0, 20..120),
            seed in any::<u64>(),
            fraction in 0.05f64..=1.0,
            slippage in any::<bool>(),
        ) {
            let config = BacktestConfig {
                warmup_bars: 5,
                position_fraction: fraction,
                slippage_enabled: slippage,
                ..reference_config()
            };
            let result = run(StrategyId::Random, config, &closes, seed);
            check_cash_walk(&result);
        }
    }

    #[test]
    fn full_fraction_with_slippage_never_overdraws() {
        let config = BacktestConfig {
            warmup_bars: 2,
            position_fraction: 1.0,
            slippage_enabled: true,
            stop_loss: 0.0,
            take_profit: 0.01,
            ..reference_config()
        };
        let result = run(StrategyId::AlwaysBuy, config, &wave_closes(200), 0);
        assert!(result.ledger.len() > 2);
        check_cash_walk(&result);
    }
}

mod determinism {
    use super::*;

    #[test]
    fn same_seed_same_ledger() {
        let closes = wave_closes(200);
        let a = run(StrategyId::Random, reference_config(), &closes, 1234);
        let b = run(StrategyId::Random, reference_config(), &closes, 1234);
        assert_eq!(a, b);
        assert!(!a.ledger.is_empty());
    }

    #[test]
    fn different_seeds_diverge() {
        let closes = wave_closes(200);
        let a = run(StrategyId::Random, reference_config(), &closes, 1);
        let b = run(StrategyId::Random, reference_config(), &closes, 2);
        assert_ne!(a.ledger, b.ledger);
    }

    #[test]
    fn indicator_strategies_are_repeatable() {
        let closes = wave_closes(150);
        for id in StrategyId::ALL {
            let a = run(id, reference_config(), &closes, 0);
            let b = run(id, reference_config(), &closes, 0);
            assert_eq!(a, b, "{id} is not repeatable");
        }
    }
}

mod sweeps {
    use super::*;

    fn request(min_trades: usize) -> SweepRequest {
        SweepRequest {
            strategy: StrategyId::Random,
            params: StrategyParams::default(),
            base: reference_config(),
            seed: 99,
            min_trades,
        }
    }

    fn grid() -> SweepGrid {
        SweepGrid {
            starting_balance: vec![1_000_000.0],
            rsi_oversold: vec![30.0],
            position_fraction: vec![0.1, 0.3],
            stop_loss: vec![0.0, 0.02],
            take_profit: vec![0.03, 0.07],
        }
    }

    #[test]
    fn cells_match_standalone_runs() {
        let closes = wave_closes(200);
        let rows = run_sweep(&request(0), &grid(), bars_from_closes(&closes)).unwrap();
        assert_eq!(rows.len(), 8);

        for row in &rows {
            let config = BacktestConfig {
                starting_balance: row.cell.starting_balance,
                position_fraction: row.cell.position_fraction,
                stop_loss: row.cell.stop_loss,
                take_profit: row.cell.take_profit,
                ..reference_config()
            };
            let solo = run(StrategyId::Random, config, &closes, 99);
            assert_eq!(row.final_balance, solo.final_balance);
            assert_eq!(row.buys, solo.ledger.buy_count());
        }
    }

    #[test]
    fn rows_are_sorted_best_first() {
        let rows = run_sweep(&request(0), &grid(), bars_from_closes(&wave_closes(200))).unwrap();
        assert!(
            rows.windows(2)
                .all(|w| w[0].return_ratio >= w[1].return_ratio)
        );
    }

    #[test]
    fn axis_order_does_not_change_results() {
        let bars = bars_from_closes(&wave_closes(200));
        let forward = run_sweep(&request(0), &grid(), bars.clone()).unwrap();

        let mut reversed_grid = grid();
        reversed_grid.position_fraction.reverse();
        reversed_grid.take_profit.reverse();
        let reversed = run_sweep(&request(0), &reversed_grid, bars).unwrap();

        for row in &forward {
            let twin = reversed.iter().find(|r| r.cell == row.cell).unwrap();
            assert_eq!(twin.final_balance, row.final_balance);
        }
    }

    #[test]
    fn min_trades_filters_cells() {
        let bars = bars_from_closes(&wave_closes(200));
        let all = run_sweep(&request(0), &grid(), bars.clone()).unwrap();
        let most = all.iter().map(|r| r.buys).max().unwrap();
        let filtered = run_sweep(&request(most + 1), &grid(), bars).unwrap();
        assert!(filtered.is_empty());
    }
}

mod comparison {
    use super::*;

    #[test]
    fn each_run_matches_a_standalone_backtest() {
        let closes = wave_closes(150);
        let runs = compare_strategies(
            |id| {
                Ok(BacktestConfig {
                    stop_loss: id.preset().stop_loss,
                    take_profit: id.preset().take_profit,
                    ..reference_config()
                })
            },
            &StrategyParams::default(),
            5,
            &bars_from_closes(&closes),
        )
        .unwrap();

        assert_eq!(runs.len(), StrategyId::ALL.len());
        assert!(
            runs.windows(2)
                .all(|w| w[0].result.return_ratio >= w[1].result.return_ratio)
        );
        for entry in &runs {
            let preset = entry.id.preset();
            let config = BacktestConfig {
                stop_loss: preset.stop_loss,
                take_profit: preset.take_profit,
                ..reference_config()
            };
            let solo = run(entry.id, config, &closes, 5);
            assert_eq!(entry.result, solo, "{} differs from a standalone run", entry.id);
        }
    }
}
