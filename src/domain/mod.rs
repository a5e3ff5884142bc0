//! Core domain types and logic. No I/O happens below this module.

pub mod account;
pub mod backtest;
pub mod compare;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod ledger;
pub mod ohlcv;
pub mod position;
pub mod slippage;
pub mod strategy;
pub mod summary;
pub mod sweep;
