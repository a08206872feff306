//! Catalog error types
//!
//! Every failure a catalog operation can surface, already categorized the way
//! the HTTP boundary reports it.

use sea_orm::DbErr;
use thiserror::Error;
use tracing::warn;

use super::RuleError;
use crate::common::db_errors::{DbErrorKind, format_db_error};
use crate::services::validation::ValidationError;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// Malformed or missing input fields
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Referenced entity absent
    #[error("{entity} not found")]
    NotFound { entity: &'static str, key: String },

    /// Compatibility rule engine rejected the operation
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// Store uniqueness constraint tripped
    #[error("Resource already exists")]
    UniqueViolation(String),

    /// Store referential integrity tripped
    #[error("Invalid reference to related resource")]
    ForeignKeyViolation(String),

    /// Store unreachable, busy or timed out
    #[error("Database connection error")]
    Unavailable { kind: DbErrorKind, message: String },

    /// Unrecognized store failure
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: DbErr,
    },
}

impl CatalogError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        CatalogError::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Categorize a store error raised while performing `operation`.
    pub fn from_db(operation: &str, err: DbErr) -> Self {
        let (kind, message) = format_db_error(operation, &err);
        match kind {
            DbErrorKind::UniqueViolation => CatalogError::UniqueViolation(message),
            DbErrorKind::ForeignKeyViolation => CatalogError::ForeignKeyViolation(message),
            DbErrorKind::ConnectionError | DbErrorKind::Timeout | DbErrorKind::Deadlock => {
                warn!("{}", message);
                CatalogError::Unavailable { kind, message }
            }
            DbErrorKind::NotFound => CatalogError::NotFound {
                entity: "Record",
                key: message,
            },
            DbErrorKind::Unknown => CatalogError::Database {
                message,
                source: err,
            },
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            CatalogError::Validation(_) => 400,
            CatalogError::NotFound { .. } => 404,
            CatalogError::Rule(err) => err.http_status_code(),
            CatalogError::UniqueViolation(_) => 409,
            CatalogError::ForeignKeyViolation(_) => 400,
            CatalogError::Unavailable { kind, .. } => kind.http_status_code(),
            CatalogError::Database { .. } => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            CatalogError::Validation(_) => "VALIDATION_FAILED",
            CatalogError::NotFound { .. } => "NOT_FOUND",
            CatalogError::Rule(err) => err.error_code(),
            CatalogError::UniqueViolation(_) => "CONFLICT",
            CatalogError::ForeignKeyViolation(_) => "INVALID_REFERENCE",
            CatalogError::Unavailable { .. } => "SERVICE_UNAVAILABLE",
            CatalogError::Database { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.http_status_code() >= 500
    }
}

impl From<DbErr> for CatalogError {
    fn from(err: DbErr) -> Self {
        CatalogError::from_db("catalog store", err)
    }
}
