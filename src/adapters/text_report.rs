//! Plain-text report formatting for the console.
//!
//! Provides functions to render:
//! - Run result (balances, returns, buy-and-hold comparison)
//! - Trade log table
//! - Trade summary with the holding-period distribution
//! - Sweep ranking table
//! - Strategy comparison ranking
//! - Strategy registry listing

use std::fmt::Write;

use crate::domain::backtest::{BacktestResult, RunStatus};
use crate::domain::compare::StrategyRun;
use crate::domain::ledger::TradeLedger;
use crate::domain::strategy::StrategyId;
use crate::domain::summary::TradeSummary;
use crate::domain::sweep::SweepRow;

const RULE: &str = "------------------------------------------------------------";

fn signed_pct(ratio: f64) -> String {
    format!("{:+.2}%", ratio * 100.0)
}

pub fn format_result(result: &BacktestResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", result.strategy);
    if let RunStatus::InsufficientData { bars, warmup } = result.status {
        let _ = writeln!(
            out,
            "Insufficient data: {bars} bars, warmup {warmup}; nothing simulated"
        );
    }
    let _ = writeln!(out, "Bars:             {}", result.bars);
    let _ = writeln!(out, "Starting balance: {:.0}", result.starting_balance);
    let _ = writeln!(out, "Final balance:    {:.0}", result.final_balance);
    let _ = writeln!(
        out,
        "Return:           {:+.0} ({})",
        result.total_return,
        signed_pct(result.return_ratio)
    );
    let _ = writeln!(
        out,
        "Buy and hold:     {}",
        signed_pct(result.buy_and_hold_return)
    );
    let verdict = if result.beat_buy_and_hold() {
        "beat"
    } else {
        "lagged"
    };
    let _ = writeln!(out, "Strategy {verdict} buy and hold");
    let _ = writeln!(
        out,
        "Trades:           {} ({} closed, {} wins, {:.1}% win rate)",
        result.trade_count(),
        result.closing_trades,
        result.wins,
        result.win_rate * 100.0
    );
    if result.rejected_orders > 0 {
        let _ = writeln!(
            out,
            "Rejected orders:  {} below minimum amount",
            result.rejected_orders
        );
    }
    if let Some(liq) = &result.liquidation {
        let _ = writeln!(
            out,
            "Open position marked at {:.2}: {:.6} units worth {:.0} (unrealized {:+.0})",
            liq.price, liq.quantity, liq.value, liq.unrealized_pnl
        );
    }
    out
}

pub fn format_trade_log(ledger: &TradeLedger) -> String {
    if ledger.is_empty() {
        return "No trades.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<19}  {:<11} {:>12} {:>12} {:>7} {:>14} {:>14} {:>12} {:>8}",
        "time", "kind", "price", "exec", "slip", "qty", "balance", "profit", "ratio"
    );
    for t in ledger {
        let profit = t
            .profit
            .map_or_else(|| "-".to_string(), |p| format!("{p:+.0}"));
        let ratio = t.profit_ratio.map_or_else(|| "-".to_string(), signed_pct);
        let _ = writeln!(
            out,
            "{:<19}  {:<11} {:>12.2} {:>12.2} {:>6.2}% {:>14.6} {:>14.0} {:>12} {:>8}",
            t.timestamp.format("%Y-%m-%d %H:%M:%S"),
            t.kind.to_string(),
            t.price,
            t.execution_price,
            t.slippage * 100.0,
            t.quantity,
            t.balance,
            profit,
            ratio
        );
    }
    out
}

pub fn format_summary(summary: &TradeSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Trade Summary ===");
    let _ = writeln!(
        out,
        "Closed trades:    {} ({} wins, {} losses)",
        summary.closing_trades, summary.wins, summary.losses
    );
    let _ = writeln!(
        out,
        "Average profit:   {:+.0} ({})",
        summary.avg_profit,
        signed_pct(summary.avg_profit_ratio)
    );
    let _ = writeln!(
        out,
        "Average slippage: {:.3}%",
        summary.avg_slippage * 100.0
    );

    let h = &summary.holding;
    if h.periods.is_empty() {
        let _ = writeln!(out, "No completed holding periods.");
    } else {
        let _ = writeln!(out, "Average holding:  {:.1} days", h.avg_days);
        if let (Some(long), Some(short)) = (&h.longest, &h.shortest) {
            let _ = writeln!(
                out,
                "Longest:          {} days ({} -> {})",
                long.days,
                long.opened_at.format("%Y-%m-%d"),
                long.closed_at.format("%Y-%m-%d")
            );
            let _ = writeln!(out, "Shortest:         {} days", short.days);
        }
        if let Some(days) = h.avg_win_days {
            let _ = writeln!(out, "Winners held:     {days:.1} days");
        }
        if let Some(days) = h.avg_loss_days {
            let _ = writeln!(out, "Losers held:      {days:.1} days");
        }
        let _ = writeln!(out, "Holding distribution:");
        for b in &h.buckets {
            let _ = writeln!(out, "  {:<6} {:>4}  {:>5.1}%", b.label, b.count, b.pct);
        }
    }
    if let Some(since) = h.open_since {
        let _ = writeln!(
            out,
            "Position still open since {}",
            since.format("%Y-%m-%d %H:%M:%S")
        );
    }
    out
}

pub fn format_sweep(rows: &[SweepRow], top: usize) -> String {
    if rows.is_empty() {
        return "No sweep cell met the minimum trade count.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4} {:>12} {:>8} {:>9} {:>7} {:>7} {:>14} {:>9} {:>5} {:>7} {:>7}",
        "rank", "capital", "oversold", "fraction", "sl", "tp", "final", "return", "buys", "win", "slip"
    );
    let _ = writeln!(out, "{RULE}{RULE}");
    for (rank, row) in rows.iter().take(top).enumerate() {
        let _ = writeln!(
            out,
            "{:>4} {:>12.0} {:>8.1} {:>9.2} {:>6.1}% {:>6.1}% {:>14.0} {:>9} {:>5} {:>6.1}% {:>6.3}%",
            rank + 1,
            row.cell.starting_balance,
            row.cell.rsi_oversold,
            row.cell.position_fraction,
            row.cell.stop_loss * 100.0,
            row.cell.take_profit * 100.0,
            row.final_balance,
            signed_pct(row.return_ratio),
            row.buys,
            row.win_rate * 100.0,
            row.avg_slippage * 100.0
        );
    }
    if rows.len() > top {
        let _ = writeln!(out, "... {} more", rows.len() - top);
    }
    out
}

pub fn format_comparison(runs: &[StrategyRun]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4} {:>2}  {:<16} {:>9} {:>14} {:>6} {:>7} {:>9}",
        "rank", "id", "strategy", "return", "profit", "trades", "win", "vs hold"
    );
    let _ = writeln!(out, "{RULE}{}", &RULE[..20]);
    for (rank, run) in runs.iter().enumerate() {
        let r = &run.result;
        let marker = if rank == 0 { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{:>3}{} {:>2}  {:<16} {:>9} {:>+14.0} {:>6} {:>6.1}% {:>9}",
            rank + 1,
            marker,
            run.id.number(),
            run.id.slug(),
            signed_pct(r.return_ratio),
            r.total_return,
            r.trade_count(),
            r.win_rate * 100.0,
            signed_pct(r.return_ratio - r.buy_and_hold_return)
        );
    }
    out
}

pub fn format_strategy_list() -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>2}  {:<16} {:<16} {:>6} {:>6}  {:<8}  description",
        "id", "slug", "name", "sl", "tp", "interval"
    );
    for id in StrategyId::ALL {
        let p = id.preset();
        let _ = writeln!(
            out,
            "{:>2}  {:<16} {:<16} {:>5.1}% {:>5.1}%  {:<8}  {}",
            id.number(),
            id.slug(),
            p.name,
            p.stop_loss * 100.0,
            p.take_profit * 100.0,
            p.interval.to_string(),
            p.description
        );
    }
    out
}
