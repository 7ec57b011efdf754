//! Core ledger logic and the abstractions it depends on

pub mod address;
pub mod amount;
pub mod config;
pub mod conversion;
pub mod error;
pub mod ledger;
pub mod log;
pub mod oracle;
pub mod payout;

// Re-export main types for cleaner imports
pub use address::Address;
pub use error::{LedgerError, LedgerResult};
pub use ledger::{Contribution, Ledger, LedgerSnapshot, WithdrawStrategy, Withdrawal};
pub use oracle::{PriceOracle, RoundData};
pub use payout::{AccountBook, Payout};
