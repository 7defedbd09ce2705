//! Unified error types for the wallet ledger.
//!
//! Every fallible operation in the crate returns [`Result`]. Domain failures are typed
//! variants so the calling layer can map each one to its own response; storage failures
//! are wrapped from `SeaORM`.

use thiserror::Error;

/// All errors the ledger core can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Settings file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// A request field failed validation (empty merchant label, negative stock, ...)
    #[error("Validation error: {message}")]
    Validation {
        /// What went wrong
        message: String,
    },

    /// A wallet, user, product, token or transfer does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record that was looked up
        entity: &'static str,
        /// Identifier used for the lookup
        id: String,
    },

    /// Amount was zero or negative
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: i64,
    },

    /// Wallet balance does not cover the requested debit
    #[error("Insufficient balance. Current: {current}, Required: {required}")]
    InsufficientBalance {
        /// Balance at the time of the check
        current: i64,
        /// Amount that was needed
        required: i64,
    },

    /// Sender and receiver are the same wallet
    #[error("Cannot transfer to yourself")]
    SelfTransfer,

    /// Product has been switched to inactive
    #[error("Product {product_id} is not active")]
    ProductInactive {
        /// The product that was requested
        product_id: i64,
    },

    /// Product has no stock left
    #[error("Product {product_id} is out of stock")]
    OutOfStock {
        /// The product that was requested
        product_id: i64,
    },

    /// A QR purchase arrived without a payment token
    #[error("QR payment requires a token")]
    TokenRequired,

    /// Payment token is past its expiry
    #[error("Payment token has expired")]
    TokenExpired,

    /// Payment token was already redeemed
    #[error("Payment token has already been used")]
    TokenConsumed,

    /// Payment token belongs to a different wallet
    #[error("Payment token does not belong to this wallet")]
    TokenOwnershipMismatch,

    /// Payment token was issued for a different amount
    #[error("Payment token amount mismatch. Expected: {expected}, Found: {found}")]
    TokenAmountMismatch {
        /// Amount the caller expected to pay
        expected: i64,
        /// Amount stored on the token
        found: i64,
    },

    /// A recipient-less bill was redeemed but no fallback account could be resolved
    #[error("No recipient available for payment: {reason}")]
    NoFallbackRecipient {
        /// Why resolution failed
        reason: String,
    },

    /// Wallet balance changed between read and write of an absolute balance override
    #[error("Wallet {wallet_id} was modified concurrently")]
    ConcurrentUpdate {
        /// The wallet being overridden
        wallet_id: i64,
    },
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] with any displayable id.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_message() {
        let err = Error::InsufficientBalance {
            current: 10,
            required: 25,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance. Current: 10, Required: 25"
        );
    }

    #[test]
    fn test_not_found_helper() {
        let err = Error::not_found("wallet", 42);
        assert!(matches!(
            err,
            Error::NotFound { entity: "wallet", ref id } if id == "42"
        ));
        assert_eq!(err.to_string(), "wallet not found: 42");
    }
}
