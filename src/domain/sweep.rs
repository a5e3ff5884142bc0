//! Parameter sweeps over a Cartesian grid.
//!
//! Starting capital is the outermost axis: with tiered slippage the same
//! fraction costs more at larger balances.
//!
//! Every cell gets its own `StrategyParams`, `BacktestConfig` and strategy
//! instance; nothing is shared or mutated between cells.

use tracing::{debug, info};

use super::backtest::{BacktestConfig, Backtester};
use super::error::TraderError;
use super::ohlcv::Bar;
use super::strategy::{StrategyId, StrategyParams, build_strategy};
use super::summary::TradeSummary;

#[derive(Debug, Clone, PartialEq)]
pub struct SweepGrid {
    pub starting_balance: Vec<f64>,
    pub rsi_oversold: Vec<f64>,
    pub position_fraction: Vec<f64>,
    pub stop_loss: Vec<f64>,
    pub take_profit: Vec<f64>,
}

impl SweepGrid {
    /// Single-cell grid at the given base values.
    pub fn single(params: &StrategyParams, config: &BacktestConfig) -> Self {
        SweepGrid {
            starting_balance: vec![config.starting_balance],
            rsi_oversold: vec![params.rsi_oversold],
            position_fraction: vec![config.position_fraction],
            stop_loss: vec![config.stop_loss],
            take_profit: vec![config.take_profit],
        }
    }

    pub fn len(&self) -> usize {
        self.starting_balance.len()
            * self.rsi_oversold.len()
            * self.position_fraction.len()
            * self.stop_loss.len()
            * self.take_profit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cells(&self) -> Vec<SweepCell> {
        let mut cells = Vec::with_capacity(self.len());
        for &starting_balance in &self.starting_balance {
            for &rsi_oversold in &self.rsi_oversold {
                for &position_fraction in &self.position_fraction {
                    for &stop_loss in &self.stop_loss {
                        for &take_profit in &self.take_profit {
                            cells.push(SweepCell {
                                starting_balance,
                                rsi_oversold,
                                position_fraction,
                                stop_loss,
                                take_profit,
                            });
                        }
                    }
                }
            }
        }
        cells
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepCell {
    pub starting_balance: f64,
    pub rsi_oversold: f64,
    pub position_fraction: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// What to sweep and the fixed values around the grid.
#[derive(Debug, Clone)]
pub struct SweepRequest {
    pub strategy: StrategyId,
    pub params: StrategyParams,
    pub base: BacktestConfig,
    pub seed: u64,
    /// Cells with fewer buys are dropped from the results.
    pub min_trades: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepRow {
    pub cell: SweepCell,
    pub final_balance: f64,
    pub total_return: f64,
    pub return_ratio: f64,
    pub buys: usize,
    pub win_rate: f64,
    pub avg_slippage: f64,
}

/// Runs every grid cell over `bars` and returns qualifying rows sorted by
/// return ratio, best first.
///
/// Indicators are computed once: the grid axes do not change indicator
/// periods, so every cell sees the same augmented series.
pub fn run_sweep(
    request: &SweepRequest,
    grid: &SweepGrid,
    bars: Vec<Bar>,
) -> Result<Vec<SweepRow>, TraderError> {
    for (axis, len) in [
        ("starting_balance", grid.starting_balance.len()),
        ("rsi_oversold", grid.rsi_oversold.len()),
        ("position_fraction", grid.position_fraction.len()),
        ("stop_loss", grid.stop_loss.len()),
        ("take_profit", grid.take_profit.len()),
    ] {
        if len == 0 {
            return Err(TraderError::invalid("sweep", axis, "no values to sweep"));
        }
    }

    let bars = build_strategy(request.strategy, &request.params, request.seed)
        .compute_indicators(bars);

    let mut rows = Vec::new();
    for cell in grid.cells() {
        let params = StrategyParams {
            rsi_oversold: cell.rsi_oversold,
            ..request.params
        };
        let config = BacktestConfig {
            starting_balance: cell.starting_balance,
            position_fraction: cell.position_fraction,
            stop_loss: cell.stop_loss,
            take_profit: cell.take_profit,
            ..request.base.clone()
        };
        let backtester = Backtester::new(config)?;
        let mut strategy = build_strategy(request.strategy, &params, request.seed);
        let result = backtester.run(strategy.as_mut(), &bars);

        let buys = result.ledger.buy_count();
        debug!(?cell, buys, return_ratio = result.return_ratio, "sweep cell done");
        if buys < request.min_trades {
            continue;
        }

        rows.push(SweepRow {
            cell,
            final_balance: result.final_balance,
            total_return: result.total_return,
            return_ratio: result.return_ratio,
            buys,
            win_rate: result.win_rate,
            avg_slippage: TradeSummary::compute(&result.ledger).avg_slippage,
        });
    }

    rows.sort_by(|a, b| b.return_ratio.total_cmp(&a.return_ratio));
    info!(
        cells = grid.len(),
        kept = rows.len(),
        strategy = %request.strategy,
        "sweep finished"
    );
    Ok(rows)
}
