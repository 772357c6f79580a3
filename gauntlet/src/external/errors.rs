//! Escrow error types.

use thiserror::Error;

use crate::queue::{AccountId, Amount};

/// Escrow errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// Payer cannot cover the amount
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Amount, required: Amount },

    /// Custody account cannot cover a refund or payout
    #[error("Insufficient custody: held {held}, required {required}")]
    InsufficientCustody { held: Amount, required: Amount },

    /// Amount must be positive
    #[error("Invalid amount: {0}")]
    InvalidAmount(Amount),

    /// Account unknown to the escrow
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Backend failure
    #[error("Transfer failed: {0}")]
    TransferFailed(String),
}

/// Result type for escrow operations
pub type EscrowResult<T> = Result<T, EscrowError>;
