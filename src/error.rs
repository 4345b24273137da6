// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

/// Every failure a money-moving operation can report.
///
/// An operation either succeeds or returns exactly one of these; nothing is
/// persisted when one is returned from inside a transaction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Insufficient balance in {account}: available {available}, required {required}")]
    InsufficientBalance {
        account: String,
        available: Decimal,
        required: Decimal,
    },

    #[error("Movement {0} already processed")]
    AlreadyProcessed(i64),

    #[error("Movement not found: {0}")]
    MovementNotFound(i64),

    #[error("Settlement not found: {0}")]
    SettlementNotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Source and target account cannot be the same")]
    SameAccount,

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Invalid provider response: {0}")]
    InvalidProviderResponse(String),

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    #[error("Service is locked for maintenance")]
    ServiceLocked,

    #[error("Transaction aborted: {0}")]
    TransactionAborted(String),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            EngineError::InvalidAccount(_) => "INVALID_ACCOUNT",
            EngineError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            EngineError::AlreadyProcessed(_) => "ALREADY_PROCESSED",
            EngineError::MovementNotFound(_) => "MOVEMENT_NOT_FOUND",
            EngineError::SettlementNotFound(_) => "SETTLEMENT_NOT_FOUND",
            EngineError::InvalidAmount(_) => "INVALID_AMOUNT",
            EngineError::SameAccount => "SAME_ACCOUNT",
            EngineError::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            EngineError::InvalidProviderResponse(_) => "INVALID_PROVIDER_RESPONSE",
            EngineError::DeadlineExceeded => "DEADLINE_EXCEEDED",
            EngineError::ServiceLocked => "SERVICE_LOCKED",
            EngineError::TransactionAborted(_) => "TRANSACTION_ABORTED",
        }
    }

    /// Whether the caller may resubmit the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::ProviderUnavailable(_)
                | EngineError::InvalidProviderResponse(_)
                | EngineError::DeadlineExceeded
                | EngineError::TransactionAborted(_)
        )
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if matches!(
                    err.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                EngineError::DeadlineExceeded
            }
            _ => EngineError::TransactionAborted(e.to_string()),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(EngineError::SameAccount.code(), "SAME_ACCOUNT");
        assert_eq!(EngineError::AlreadyProcessed(7).code(), "ALREADY_PROCESSED");
        assert_eq!(
            EngineError::InsufficientBalance {
                account: "RT1".into(),
                available: Decimal::ZERO,
                required: Decimal::ONE,
            }
            .code(),
            "INSUFFICIENT_BALANCE"
        );
    }

    #[test]
    fn provider_failures_are_retryable_user_failures_are_not() {
        assert!(EngineError::ProviderUnavailable("timeout".into()).is_retryable());
        assert!(EngineError::InvalidProviderResponse("status 9".into()).is_retryable());
        assert!(!EngineError::AlreadyProcessed(1).is_retryable());
        assert!(!EngineError::AccountNotFound("RT9".into()).is_retryable());
    }

    #[test]
    fn busy_database_maps_to_deadline() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert_eq!(EngineError::from(busy), EngineError::DeadlineExceeded);

        let other = rusqlite::Error::QueryReturnedNoRows;
        assert_eq!(EngineError::from(other).code(), "TRANSACTION_ABORTED");
    }
}
