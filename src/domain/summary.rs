//! Trade ledger statistics: profit averages, slippage paid and holding times.

use chrono::NaiveDateTime;

use super::ledger::{TradeKind, TradeLedger};

/// One buy matched with the closing trade that follows it.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingPeriod {
    pub opened_at: NaiveDateTime,
    pub closed_at: NaiveDateTime,
    pub days: i64,
    pub profit: f64,
    pub profit_ratio: f64,
    pub exit: TradeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoldingBucket {
    pub label: &'static str,
    pub min_days: i64,
    /// Inclusive; `None` is unbounded.
    pub max_days: Option<i64>,
    pub count: usize,
    pub pct: f64,
}

const BUCKETS: [(&str, i64, Option<i64>); 5] = [
    ("1d", 0, Some(1)),
    ("2-3d", 2, Some(3)),
    ("4-7d", 4, Some(7)),
    ("8-14d", 8, Some(14)),
    ("15d+", 15, None),
];

#[derive(Debug, Clone, PartialEq)]
pub struct HoldingStats {
    pub periods: Vec<HoldingPeriod>,
    pub avg_days: f64,
    pub longest: Option<HoldingPeriod>,
    pub shortest: Option<HoldingPeriod>,
    pub avg_win_days: Option<f64>,
    pub avg_loss_days: Option<f64>,
    pub buckets: Vec<HoldingBucket>,
    /// Entry time of a buy with no closing trade after it.
    pub open_since: Option<NaiveDateTime>,
}

/// Pairs buys and closing trades by alternation. A closing trade with no
/// preceding buy is skipped.
pub fn pair_holdings(ledger: &TradeLedger) -> (Vec<HoldingPeriod>, Option<NaiveDateTime>) {
    let mut periods = Vec::new();
    let mut open: Option<NaiveDateTime> = None;

    for trade in ledger {
        if trade.kind == TradeKind::Buy {
            open = Some(trade.timestamp);
            continue;
        }
        if let Some(opened_at) = open.take() {
            periods.push(HoldingPeriod {
                opened_at,
                closed_at: trade.timestamp,
                days: (trade.timestamp - opened_at).num_days(),
                profit: trade.profit.unwrap_or(0.0),
                profit_ratio: trade.profit_ratio.unwrap_or(0.0),
                exit: trade.kind,
            });
        }
    }

    (periods, open)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

impl HoldingStats {
    pub fn compute(ledger: &TradeLedger) -> Self {
        let (periods, open_since) = pair_holdings(ledger);
        let total = periods.len();

        let avg_days = mean(periods.iter().map(|p| p.days as f64)).unwrap_or(0.0);
        let longest = periods.iter().max_by_key(|p| p.days).cloned();
        let shortest = periods.iter().min_by_key(|p| p.days).cloned();
        let avg_win_days = mean(
            periods
                .iter()
                .filter(|p| p.profit > 0.0)
                .map(|p| p.days as f64),
        );
        let avg_loss_days = mean(
            periods
                .iter()
                .filter(|p| p.profit < 0.0)
                .map(|p| p.days as f64),
        );

        let buckets = BUCKETS
            .iter()
            .map(|&(label, min_days, max_days)| {
                let count = periods
                    .iter()
                    .filter(|p| p.days >= min_days && max_days.is_none_or(|max| p.days <= max))
                    .count();
                let pct = if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64 * 100.0
                };
                HoldingBucket {
                    label,
                    min_days,
                    max_days,
                    count,
                    pct,
                }
            })
            .collect();

        HoldingStats {
            periods,
            avg_days,
            longest,
            shortest,
            avg_win_days,
            avg_loss_days,
            buckets,
            open_since,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeSummary {
    pub total_trades: usize,
    pub closing_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub avg_profit: f64,
    pub avg_profit_ratio: f64,
    /// Mean slippage ratio over every trade, buys included.
    pub avg_slippage: f64,
    pub holding: HoldingStats,
}

impl TradeSummary {
    pub fn compute(ledger: &TradeLedger) -> Self {
        let profits: Vec<(f64, f64)> = ledger
            .closing_trades()
            .map(|t| (t.profit.unwrap_or(0.0), t.profit_ratio.unwrap_or(0.0)))
            .collect();

        TradeSummary {
            total_trades: ledger.len(),
            closing_trades: profits.len(),
            wins: profits.iter().filter(|(p, _)| *p > 0.0).count(),
            losses: profits.iter().filter(|(p, _)| *p < 0.0).count(),
            avg_profit: mean(profits.iter().map(|(p, _)| *p)).unwrap_or(0.0),
            avg_profit_ratio: mean(profits.iter().map(|(_, r)| *r)).unwrap_or(0.0),
            avg_slippage: mean(ledger.iter().map(|t| t.slippage)).unwrap_or(0.0),
            holding: HoldingStats::compute(ledger),
        }
    }
}
