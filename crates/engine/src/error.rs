//! The module contains the errors the engine can return.
//!
//! Every engine operation returns [`ResultEngine`](crate::ResultEngine). Store
//! failures surface as [`Persistence`] and always roll back the enclosing
//! atomic unit; every other variant is raised before anything is written.
//!
//!  [`Persistence`]: EngineError::Persistence
use std::fmt;

use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a debt payment was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRejection {
    /// The debt has nothing left to pay.
    AlreadySettled,
    /// The due month is behind the current month.
    WindowExpired,
    /// The due month has not started yet.
    WindowNotOpen,
}

impl fmt::Display for PaymentRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::AlreadySettled => "already settled",
            Self::WindowExpired => "window expired (past due, needs manual reconciliation)",
            Self::WindowNotOpen => "window not yet open (future)",
        };
        f.write_str(reason)
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Inactive account: {0}")]
    InactiveAccount(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("Payment not accepted: {0}")]
    IneligiblePayment(PaymentRejection),
    #[error("Persistence failure: {0}")]
    Persistence(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::ValidationFailed(a), Self::ValidationFailed(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::InactiveAccount(a), Self::InactiveAccount(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::IneligiblePayment(a), Self::IneligiblePayment(b)) => a == b,
            (Self::Persistence(a), Self::Persistence(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_reasons_are_distinct() {
        let reasons = [
            PaymentRejection::AlreadySettled.to_string(),
            PaymentRejection::WindowExpired.to_string(),
            PaymentRejection::WindowNotOpen.to_string(),
        ];
        assert!(reasons[1].starts_with("window expired"));
        assert_ne!(reasons[0], reasons[1]);
        assert_ne!(reasons[1], reasons[2]);
    }

    #[test]
    fn ineligible_payment_message_includes_reason() {
        let err = EngineError::IneligiblePayment(PaymentRejection::WindowNotOpen);
        assert_eq!(
            err.to_string(),
            "Payment not accepted: window not yet open (future)"
        );
    }
}
