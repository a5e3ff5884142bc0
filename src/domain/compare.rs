//! Runs every built-in strategy over the same series and ranks them.

use tracing::info;

use super::backtest::{BacktestConfig, BacktestResult, Backtester};
use super::error::TraderError;
use super::ohlcv::Bar;
use super::strategy::{StrategyId, StrategyParams, build_strategy};

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRun {
    pub id: StrategyId,
    pub result: BacktestResult,
}

/// Backtests each registered strategy on `bars` and returns the runs sorted
/// by return ratio, best first.
///
/// `config_for` is asked for a fresh config per strategy, so each one can
/// fall back to its own recommended stop-loss and take-profit.
pub fn compare_strategies<F>(
    config_for: F,
    params: &StrategyParams,
    seed: u64,
    bars: &[Bar],
) -> Result<Vec<StrategyRun>, TraderError>
where
    F: Fn(StrategyId) -> Result<BacktestConfig, TraderError>,
{
    let mut runs = Vec::with_capacity(StrategyId::ALL.len());
    for id in StrategyId::ALL {
        let backtester = Backtester::new(config_for(id)?)?;
        let mut strategy = build_strategy(id, params, seed);
        let result = backtester.run_raw(strategy.as_mut(), bars.to_vec());
        runs.push(StrategyRun { id, result });
    }

    runs.sort_by(|a, b| b.result.return_ratio.total_cmp(&a.result.return_ratio));
    if let Some(best) = runs.first() {
        info!(
            best = %best.id,
            return_ratio = best.result.return_ratio,
            strategies = runs.len(),
            "comparison finished"
        );
    }
    Ok(runs)
}
