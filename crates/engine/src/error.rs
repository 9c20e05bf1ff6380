//! The module contains the errors the engine can throw.
//!
//! Every variant belongs to one [`ErrorKind`], which is what callers (the HTTP
//! layer, the admin CLI) branch on:
//!
//! - [`Validation`] thrown when an input is rejected before any write.
//! - [`KeyNotFound`] thrown when a booking, vehicle, driver, package or expense
//!   does not exist.
//! - [`ExistingKey`], [`Unavailable`] and [`InUse`] are conflicts: a duplicate
//!   invoice code or plate, a resource claimed by another booking, an entity
//!   still referenced elsewhere.
//! - [`Database`] is any other store failure. When it happens inside an atomic
//!   batch, nothing was written.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Unavailable`]: EngineError::Unavailable
//!  [`InUse`]: EngineError::InUse
//!  [`Database`]: EngineError::Database
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Unavailable: {0}")]
    Unavailable(String),
    #[error("Still in use: {0}")]
    InUse(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Coarse classification of an [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Store,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::KeyNotFound(_) => ErrorKind::NotFound,
            Self::ExistingKey(_) | Self::Unavailable(_) | Self::InUse(_) => ErrorKind::Conflict,
            Self::Database(_) => ErrorKind::Store,
        }
    }

    /// Maps a store error raised while writing `label`, turning the store's
    /// "unique key" and "row not found" signals into typed errors.
    pub(crate) fn from_write(err: DbErr, label: &str) -> Self {
        if matches!(err, DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated) {
            return Self::KeyNotFound(format!("{label} not exists"));
        }
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                Self::ExistingKey(format!("{label} already exists"))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                Self::InUse(format!("{label} is referenced by other records"))
            }
            _ => Self::Database(err),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Unavailable(a), Self::Unavailable(b)) => a == b,
            (Self::InUse(a), Self::InUse(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            EngineError::Validation("x".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EngineError::KeyNotFound("x".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::ExistingKey("x".to_string()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            EngineError::Unavailable("x".to_string()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            EngineError::Database(DbErr::Custom("boom".to_string())).kind(),
            ErrorKind::Store
        );
    }

    #[test]
    fn record_not_updated_is_not_found() {
        let err = EngineError::from_write(DbErr::RecordNotUpdated, "booking");
        assert_eq!(err, EngineError::KeyNotFound("booking not exists".to_string()));
    }

    #[test]
    fn other_store_errors_stay_opaque() {
        let err = EngineError::from_write(DbErr::Custom("disk full".to_string()), "booking");
        assert_eq!(err.kind(), ErrorKind::Store);
    }
}
