//! Backtest engine: bar-by-bar replay of one strategy over one series.
//!
//! Per bar after the warmup:
//! 1. ask the strategy for a signal on the prefix ending at this bar
//! 2. Flat: enter on `Buy`
//! 3. Long: stop-loss, then take-profit, then strategy `Sell`
//!
//! At most one position-changing action happens per bar. An open position
//! at the end is marked to market at the last close without a ledger record.

use tracing::{info, warn};

use super::account::{Account, PositionState};
use super::error::TraderError;
use super::execution::{EntryResult, ExecutionConfig, check_triggers, enter_long, exit_position};
use super::ledger::{TradeKind, TradeLedger};
use super::ohlcv::{Bar, buy_and_hold_return};
use super::slippage::SlippageModel;
use super::strategy::{Preset, Signal, Strategy};

const SECTION: &str = "backtest";

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub starting_balance: f64,
    pub position_fraction: f64,
    /// 0 disables the stop-loss check.
    pub stop_loss: f64,
    pub take_profit: f64,
    pub minimum_order_amount: f64,
    pub warmup_bars: usize,
    pub slippage_enabled: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
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
}

impl BacktestConfig {
    /// Defaults with the preset's recommended stop-loss and take-profit.
    pub fn from_preset(preset: &Preset) -> Self {
        BacktestConfig {
            stop_loss: preset.stop_loss,
            take_profit: preset.take_profit,
            ..BacktestConfig::default()
        }
    }

    pub fn validate(&self) -> Result<(), TraderError> {
        if !(self.starting_balance > 0.0) {
            return Err(TraderError::invalid(
                SECTION,
                "starting_balance",
                format!("must be positive, got {}", self.starting_balance),
            ));
        }
        if !(self.position_fraction > 0.0 && self.position_fraction <= 1.0) {
            return Err(TraderError::invalid(
                SECTION,
                "position_fraction",
                format!("must be in (0, 1], got {}", self.position_fraction),
            ));
        }
        if !(self.stop_loss >= 0.0) {
            return Err(TraderError::invalid(
                SECTION,
                "stop_loss",
                format!("must be >= 0, got {}", self.stop_loss),
            ));
        }
        if !(self.take_profit > 0.0) {
            return Err(TraderError::invalid(
                SECTION,
                "take_profit",
                format!("must be positive, got {}", self.take_profit),
            ));
        }
        if !(self.minimum_order_amount > 0.0) {
            return Err(TraderError::invalid(
                SECTION,
                "minimum_order_amount",
                format!("must be positive, got {}", self.minimum_order_amount),
            ));
        }
        Ok(())
    }

    pub fn execution(&self) -> ExecutionConfig {
        ExecutionConfig {
            position_fraction: self.position_fraction,
            minimum_order_amount: self.minimum_order_amount,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            slippage: SlippageModel::from_enabled(self.slippage_enabled),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// No bar past the warmup; nothing was simulated.
    InsufficientData { bars: usize, warmup: usize },
}

/// Open position valued at the last close when the run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Liquidation {
    pub quantity: f64,
    pub price: f64,
    pub value: f64,
    /// Value less the entry cost basis.
    pub unrealized_pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy: String,
    pub status: RunStatus,
    pub bars: usize,
    pub starting_balance: f64,
    pub final_balance: f64,
    pub total_return: f64,
    pub return_ratio: f64,
    pub ledger: TradeLedger,
    pub closing_trades: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub buy_and_hold_return: f64,
    /// Buy signals dropped because the order was below the minimum amount.
    pub rejected_orders: usize,
    pub liquidation: Option<Liquidation>,
}

impl BacktestResult {
    pub fn trade_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn beat_buy_and_hold(&self) -> bool {
        self.return_ratio > self.buy_and_hold_return
    }
}

#[derive(Debug, Clone)]
pub struct Backtester {
    config: BacktestConfig,
    execution: ExecutionConfig,
}

impl Backtester {
    pub fn new(config: BacktestConfig) -> Result<Self, TraderError> {
        config.validate()?;
        let execution = config.execution();
        Ok(Backtester { config, execution })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Attaches the strategy's indicators to `bars`, then runs.
    pub fn run_raw(&self, strategy: &mut dyn Strategy, bars: Vec<Bar>) -> BacktestResult {
        let bars = strategy.compute_indicators(bars);
        self.run(strategy, &bars)
    }

    /// Replays indicator-augmented `bars`.
    pub fn run(&self, strategy: &mut dyn Strategy, bars: &[Bar]) -> BacktestResult {
        let warmup = self.config.warmup_bars;
        let mut account = Account::new(self.config.starting_balance);

        if bars.len() <= warmup {
            warn!(
                strategy = strategy.name(),
                bars = bars.len(),
                warmup,
                "series not longer than warmup, nothing simulated"
            );
            let status = RunStatus::InsufficientData {
                bars: bars.len(),
                warmup,
            };
            return self.finish(strategy, bars, account, 0, status);
        }

        let mut rejected = 0;
        for i in warmup..bars.len() {
            let bar = &bars[i];
            let signal = strategy.signal(&bars[..=i]);

            match account.state() {
                PositionState::Flat => {
                    if signal == Signal::Buy {
                        let entry =
                            enter_long(&mut account, bar.timestamp, bar.close, &self.execution);
                        if let EntryResult::BelowMinimum { .. } = entry {
                            rejected += 1;
                        }
                    }
                }
                PositionState::Long => {
                    let exit = check_triggers(&account, bar.close, &self.execution)
                        .or((signal == Signal::Sell).then_some(TradeKind::Sell));
                    if let Some(kind) = exit {
                        exit_position(
                            &mut account,
                            bar.timestamp,
                            bar.close,
                            kind,
                            &self.execution,
                        );
                    }
                }
            }
        }

        self.finish(strategy, bars, account, rejected, RunStatus::Completed)
    }

    fn finish(
        &self,
        strategy: &dyn Strategy,
        bars: &[Bar],
        mut account: Account,
        rejected_orders: usize,
        status: RunStatus,
    ) -> BacktestResult {
        let liquidation = match (account.position().cloned(), bars.last()) {
            (Some(position), Some(last)) => {
                let value = position.market_value(last.close);
                account.mark_to_market(value);
                Some(Liquidation {
                    quantity: position.quantity,
                    price: last.close,
                    value,
                    unrealized_pnl: position.unrealized_pnl(last.close),
                })
            }
            _ => None,
        };

        let starting_balance = self.config.starting_balance;
        let final_balance = account.cash;
        let ledger = account.into_ledger();
        let closing_trades = ledger.closing_trades().count();
        let wins = ledger.closing_trades().filter(|t| t.is_win()).count();
        let win_rate = if closing_trades == 0 {
            0.0
        } else {
            wins as f64 / closing_trades as f64
        };
        let total_return = final_balance - starting_balance;

        let result = BacktestResult {
            strategy: strategy.name().to_string(),
            status,
            bars: bars.len(),
            starting_balance,
            final_balance,
            total_return,
            return_ratio: total_return / starting_balance,
            ledger,
            closing_trades,
            wins,
            win_rate,
            buy_and_hold_return: buy_and_hold_return(bars),
            rejected_orders,
            liquidation,
        };

        info!(
            strategy = %result.strategy,
            trades = result.trade_count(),
            final_balance = result.final_balance,
            return_ratio = result.return_ratio,
            slippage = self.execution.slippage.is_enabled(),
            "backtest finished"
        );
        result
    }
}
