//! The single open long position and its risk checks.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub quantity: f64,
    /// Execution price paid on entry, slippage included.
    pub entry_price: f64,
    pub opened_at: NaiveDateTime,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.entry_price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity * (price - self.entry_price)
    }

    /// Price move relative to the entry price.
    pub fn return_ratio(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price
    }

    /// A zero threshold disables the check.
    pub fn should_stop_loss(&self, price: f64, threshold: f64) -> bool {
        threshold > 0.0 && self.return_ratio(price) <= -threshold
    }

    /// A zero threshold disables the check.
    pub fn should_take_profit(&self, price: f64, threshold: f64) -> bool {
        threshold > 0.0 && self.return_ratio(price) >= threshold
    }
}
