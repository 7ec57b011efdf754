//! Error types for ledger operations.

use crate::core::address::Address;
use crate::core::amount::format_fixed;
use thiserror::Error;

/// Reasons a ledger call is rejected. Every variant aborts the whole call
/// with no state change.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The contribution converts to less than the minimum reference value.
    #[error(
        "insufficient contribution: worth {} but at least {} is required",
        fixed(.value),
        fixed(.minimum)
    )]
    InsufficientContribution { value: u128, minimum: u128 },

    /// Only the owner may withdraw.
    #[error("caller {caller} is not the owner")]
    NotOwner { caller: Address },

    /// The price feed could not be read or returned an unusable rate.
    #[error("price oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// The payout collaborator refused the transfer; nothing was withdrawn.
    #[error("transfer to {to} failed: {reason}")]
    TransferFailed { to: Address, reason: String },

    /// A cumulative amount would not fit in 128 bits.
    #[error("amount overflow")]
    Overflow,
}

fn fixed(value: &u128) -> String {
    format_fixed(*value)
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
