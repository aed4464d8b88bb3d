//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when an entry, operation or owner does not exist
//!   for the acting owner.
//! - [`AccountNotFound`] thrown when a payment line references an unknown
//!   account.
//! - [`PlanLimitExceeded`] thrown when a new operation would exceed the
//!   owner's monthly cap.
//! - [`Database`] wraps every persistence failure; the surrounding
//!   transaction is rolled back.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`AccountNotFound`]: EngineError::AccountNotFound
//!  [`PlanLimitExceeded`]: EngineError::PlanLimitExceeded
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Account \"{0}\" not found!")]
    AccountNotFound(String),
    #[error("Plan limit reached: {used} of {cap} operations used this month")]
    PlanLimitExceeded { used: u64, cap: u32 },
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Attachment error: {0}")]
    Attachment(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::AccountNotFound(a), Self::AccountNotFound(b)) => a == b,
            (
                Self::PlanLimitExceeded { used: a, cap: c },
                Self::PlanLimitExceeded { used: b, cap: d },
            ) => a == b && c == d,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Attachment(a), Self::Attachment(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
