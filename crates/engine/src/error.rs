//! The module contains the errors the engine can throw.
//!
//! Business-rule errors are deterministic for a given ledger state and are
//! never retried:
//!
//! - [`KeyNotFound`] thrown when a brand or campaign does not exist.
//! - [`NotActive`] thrown when spend is attempted on an inactive campaign.
//! - [`BudgetExceeded`] thrown when spend would breach the daily or monthly cap.
//! - [`InvalidAmount`], [`InvalidWindow`], [`InvalidName`] and [`InvalidId`]
//!   thrown when the caller passes malformed input.
//!
//! [`LockTimeout`] and [`ConcurrencyConflict`] are transient: see
//! [`EngineError::is_transient`].
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`NotActive`]: EngineError::NotActive
//!  [`BudgetExceeded`]: EngineError::BudgetExceeded
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidWindow`]: EngineError::InvalidWindow
//!  [`InvalidName`]: EngineError::InvalidName
//!  [`InvalidId`]: EngineError::InvalidId
//!  [`LockTimeout`]: EngineError::LockTimeout
//!  [`ConcurrencyConflict`]: EngineError::ConcurrencyConflict
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("campaign is not active")]
    NotActive(String),
    #[error("spend would exceed budget limits")]
    BudgetExceeded(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid dayparting window: {0}")]
    InvalidWindow(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("timed out waiting for campaign \"{0}\"")]
    LockTimeout(String),
    #[error("campaign \"{0}\" changed concurrently")]
    ConcurrencyConflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` for failures caused by contention rather than by the
    /// request itself. Only these are retried by the engine.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::LockTimeout(_) | Self::ConcurrencyConflict(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::NotActive(a), Self::NotActive(b)) => a == b,
            (Self::BudgetExceeded(a), Self::BudgetExceeded(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidWindow(a), Self::InvalidWindow(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::LockTimeout(a), Self::LockTimeout(b)) => a == b,
            (Self::ConcurrencyConflict(a), Self::ConcurrencyConflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
