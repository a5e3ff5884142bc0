//! Append-only trade ledger.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeKind {
    Buy,
    Sell,
    StopLoss,
    TakeProfit,
}

impl TradeKind {
    /// True for the kinds that close a position.
    pub fn is_closing(self) -> bool {
        !matches!(self, TradeKind::Buy)
    }
}

impl fmt::Display for TradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeKind::Buy => write!(f, "buy"),
            TradeKind::Sell => write!(f, "sell"),
            TradeKind::StopLoss => write!(f, "stop_loss"),
            TradeKind::TakeProfit => write!(f, "take_profit"),
        }
    }
}

/// One state-changing event. Immutable once recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub timestamp: NaiveDateTime,
    pub kind: TradeKind,
    /// Quoted bar close.
    pub price: f64,
    pub execution_price: f64,
    /// Slippage ratio applied to `price`.
    pub slippage: f64,
    pub quantity: f64,
    /// Cash balance after the trade.
    pub balance: f64,
    /// Realized profit, closing trades only.
    pub profit: Option<f64>,
    /// Realized profit over cost basis, closing trades only.
    pub profit_ratio: Option<f64>,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.profit.is_some_and(|p| p > 0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLedger {
    trades: Vec<Trade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trade> {
        self.trades.iter()
    }

    pub fn as_slice(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn closing_trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().filter(|t| t.kind.is_closing())
    }

    pub fn buy_count(&self) -> usize {
        self.trades
            .iter()
            .filter(|t| t.kind == TradeKind::Buy)
            .count()
    }
}

impl<'a> IntoIterator for &'a TradeLedger {
    type Item = &'a Trade;
    type IntoIter = std::slice::Iter<'a, Trade>;

    fn into_iter(self) -> Self::IntoIter {
        self.trades.iter()
    }
}
