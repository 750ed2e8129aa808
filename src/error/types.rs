// src/error/types.rs
use crate::domain::{DomainError, Id};
use rusqlite::ErrorCode;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// An update referenced an id with no stored row
    #[error("{entity} {} not found", display_id(.id))]
    NotFound {
        entity: &'static str,
        id: Option<Id>,
    },

    /// The row exists but the supplied version is stale
    #[error("{entity} {id} was modified concurrently (expected version {expected})")]
    OptimisticLock {
        entity: &'static str,
        id: Id,
        expected: i64,
    },

    /// Backend integrity failure, e.g. a reference to a missing group
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

fn display_id(id: &Option<Id>) -> String {
    id.map_or_else(|| "without id".to_string(), |id| id.to_string())
}

impl AppError {
    /// True for the two causes of a rejected update (missing row, stale version).
    /// Callers above the repository layer treat both as "could not apply update".
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            AppError::NotFound { .. } | AppError::OptimisticLock { .. }
        )
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, ref message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                AppError::ConstraintViolation(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                )
            }
            other => AppError::Database(other),
        }
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
