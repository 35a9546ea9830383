//! The module contains the errors the engine can return.
//!
//! Validation errors ([`InvalidInput`], [`InvalidAmount`], [`InvalidSplit`],
//! [`SelfSettlement`]) are detected before anything is written, so a failed
//! command never leaves partial state behind. [`Database`] wraps transient
//! store failures; the engine never retries a failed append on its own.
//!
//! [`InvalidInput`]: EngineError::InvalidInput
//! [`InvalidAmount`]: EngineError::InvalidAmount
//! [`InvalidSplit`]: EngineError::InvalidSplit
//! [`SelfSettlement`]: EngineError::SelfSettlement
//! [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
    #[error("Cannot settle with yourself: {0}")]
    SelfSettlement(String),
    #[error("Group not found: {0}")]
    UnknownGroup(String),
    #[error("\"{0}\" is not a member of the group")]
    UnknownMember(String),
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidSplit(a), Self::InvalidSplit(b)) => a == b,
            (Self::SelfSettlement(a), Self::SelfSettlement(b)) => a == b,
            (Self::UnknownGroup(a), Self::UnknownGroup(b)) => a == b,
            (Self::UnknownMember(a), Self::UnknownMember(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
