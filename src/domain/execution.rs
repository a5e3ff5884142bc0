//! Order execution against the account: entries, exits and risk triggers.
//!
//! Every function either applies fully (cash, position and exactly one
//! ledger record) or leaves the account untouched.

use chrono::NaiveDateTime;
use tracing::debug;

use super::account::Account;
use super::ledger::{Trade, TradeKind};
use super::position::Position;
use super::slippage::SlippageModel;

/// Parameters that govern a single fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionConfig {
    pub position_fraction: f64,
    pub minimum_order_amount: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub slippage: SlippageModel,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            position_fraction: 0.1,
            minimum_order_amount: 5000.0,
            stop_loss: 0.0,
            take_profit: 0.1,
            slippage: SlippageModel::None,
        }
    }
}

/// Result of an entry attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered {
        quantity: f64,
        execution_price: f64,
        cost: f64,
        slippage: f64,
    },
    /// Invest amount did not exceed the minimum order; nothing happened.
    BelowMinimum { amount: f64 },
    /// A position is already open; nothing happened.
    AlreadyLong,
    /// Quoted or execution price was not a positive number; nothing happened.
    InvalidPrice { price: f64 },
}

/// Opens a long position with `position_fraction` of current cash.
///
/// 1. invest = cash * fraction, rejected if <= minimum order amount
/// 2. execution price = price * (1 + slippage(invest))
/// 3. quantity = invest / execution price
/// 4. cash -= quantity * execution price
pub fn enter_long(
    account: &mut Account,
    timestamp: NaiveDateTime,
    price: f64,
    config: &ExecutionConfig,
) -> EntryResult {
    if account.is_long() {
        return EntryResult::AlreadyLong;
    }

    let invest = account.cash * config.position_fraction;
    if invest <= config.minimum_order_amount {
        debug!(
            %timestamp,
            amount = invest,
            minimum = config.minimum_order_amount,
            "order below minimum, skipped"
        );
        return EntryResult::BelowMinimum { amount: invest };
    }

    let (execution_price, slippage) = config.slippage.buy_price(price, invest);
    if !(execution_price > 0.0 && execution_price.is_finite()) {
        debug!(%timestamp, price, execution_price, "non-positive price, entry skipped");
        return EntryResult::InvalidPrice { price };
    }
    let quantity = invest / execution_price;
    let cost = (quantity * execution_price).min(account.cash);
    let balance = account.cash - cost;

    let trade = Trade {
        timestamp,
        kind: TradeKind::Buy,
        price,
        execution_price,
        slippage,
        quantity,
        balance,
        profit: None,
        profit_ratio: None,
    };
    let position = Position {
        quantity,
        entry_price: execution_price,
        opened_at: timestamp,
    };
    account.open(position, cost, trade);

    debug!(%timestamp, price, execution_price, quantity, balance, "entered long");

    EntryResult::Entered {
        quantity,
        execution_price,
        cost,
        slippage,
    }
}

/// Result of an exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitResult {
    pub kind: TradeKind,
    pub quantity: f64,
    pub execution_price: f64,
    pub proceeds: f64,
    pub profit: f64,
    pub profit_ratio: f64,
}

/// Closes the open position at `price` less slippage on the exit notional.
///
/// Returns `None` when flat.
pub fn exit_position(
    account: &mut Account,
    timestamp: NaiveDateTime,
    price: f64,
    kind: TradeKind,
    config: &ExecutionConfig,
) -> Option<ExitResult> {
    let position = account.position()?.clone();

    let (execution_price, slippage) = config
        .slippage
        .sell_price(price, position.market_value(price));
    let proceeds = position.quantity * execution_price;
    let profit = position.quantity * (execution_price - position.entry_price);
    let profit_ratio = profit / position.cost_basis();
    let balance = account.cash + proceeds;

    let trade = Trade {
        timestamp,
        kind,
        price,
        execution_price,
        slippage,
        quantity: position.quantity,
        balance,
        profit: Some(profit),
        profit_ratio: Some(profit_ratio),
    };
    account.close(proceeds, trade)?;

    debug!(%timestamp, %kind, price, execution_price, profit, balance, "closed long");

    Some(ExitResult {
        kind,
        quantity: position.quantity,
        execution_price,
        proceeds,
        profit,
        profit_ratio,
    })
}

/// Risk exit due at `price`, stop-loss first. `None` when flat or when
/// neither limit is breached.
pub fn check_triggers(
    account: &Account,
    price: f64,
    config: &ExecutionConfig,
) -> Option<TradeKind> {
    let position = account.position()?;
    if position.should_stop_loss(price, config.stop_loss) {
        Some(TradeKind::StopLoss)
    } else if position.should_take_profit(price, config.take_profit) {
        Some(TradeKind::TakeProfit)
    } else {
        None
    }
}
