//! Append-only trade ledger for the grid trading bot.

pub mod error;
pub mod ledger;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{TradeLedger, TradeRecord};
