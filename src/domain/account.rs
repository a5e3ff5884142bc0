//! Account state for one simulation run: cash, the open position and the
//! trade ledger.

use super::ledger::{Trade, TradeLedger};
use super::position::Position;

/// Exclusive position state. Quantity is nonzero iff `Long`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Flat,
    Long,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub starting_balance: f64,
    pub cash: f64,
    position: Option<Position>,
    ledger: TradeLedger,
}

impl Account {
    pub fn new(starting_balance: f64) -> Self {
        Account {
            starting_balance,
            cash: starting_balance,
            position: None,
            ledger: TradeLedger::new(),
        }
    }

    pub fn state(&self) -> PositionState {
        match self.position {
            Some(_) => PositionState::Long,
            None => PositionState::Flat,
        }
    }

    pub fn is_long(&self) -> bool {
        self.position.is_some()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    pub(crate) fn open(&mut self, position: Position, cost: f64, trade: Trade) {
        self.cash -= cost;
        self.position = Some(position);
        self.ledger.push(trade);
    }

    pub(crate) fn close(&mut self, proceeds: f64, trade: Trade) -> Option<Position> {
        let position = self.position.take()?;
        self.cash += proceeds;
        self.ledger.push(trade);
        Some(position)
    }

    /// Drops the open position without a ledger entry, crediting `proceeds`.
    pub(crate) fn mark_to_market(&mut self, proceeds: f64) -> Option<Position> {
        let position = self.position.take()?;
        self.cash += proceeds;
        Some(position)
    }

    pub fn into_ledger(self) -> TradeLedger {
        self.ledger
    }
}
