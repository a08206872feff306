//! Catalog store error categorization
//!
//! Maps `sea_orm::DbErr` onto the small set of failure kinds the API
//! distinguishes, along with the HTTP status each kind surfaces as.
//!
//! ```rust
//! use configurator::common::db_errors::*;
//! use sea_orm::DbErr;
//!
//! let err = DbErr::RecordNotFound("Option choice not found".to_string());
//! let (kind, message) = format_db_error("find option choice", &err);
//!
//! assert_eq!(kind, DbErrorKind::NotFound);
//! assert_eq!(message, "find option choice: record not found");
//! ```

use sea_orm::{DbErr, SqlErr};

/// Categories of database errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    /// Record not found (404)
    NotFound,

    /// Unique constraint violation (409)
    UniqueViolation,

    /// Foreign key constraint violation (400)
    ForeignKeyViolation,

    /// Store unreachable or pool exhausted (503)
    ConnectionError,

    /// Query timeout (504)
    Timeout,

    /// Transaction deadlock or busy database (503, retry)
    Deadlock,

    /// Anything else (500)
    Unknown,
}

impl DbErrorKind {
    pub fn from_db_err(err: &DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => return Self::UniqueViolation,
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => return Self::ForeignKeyViolation,
            _ => {}
        }

        match err {
            DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => Self::NotFound,
            DbErr::Conn(_) => {
                if err.to_string().to_lowercase().contains("timeout") {
                    Self::Timeout
                } else {
                    Self::ConnectionError
                }
            }
            DbErr::Exec(_) | DbErr::Query(_) => {
                let msg = err.to_string().to_lowercase();
                if msg.contains("unique") || msg.contains("duplicate") {
                    Self::UniqueViolation
                } else if msg.contains("foreign key") || msg.contains("fk_") {
                    Self::ForeignKeyViolation
                } else if msg.contains("deadlock") || msg.contains("database is locked") {
                    Self::Deadlock
                } else if msg.contains("timeout") {
                    Self::Timeout
                } else if msg.contains("pool") || msg.contains("connection") {
                    Self::ConnectionError
                } else {
                    Self::Unknown
                }
            }
            _ => Self::Unknown,
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::UniqueViolation => 409,
            Self::ForeignKeyViolation => 400,
            Self::ConnectionError => 503,
            Self::Timeout => 504,
            Self::Deadlock => 503,
            Self::Unknown => 500,
        }
    }

    /// Transient failures that might succeed on retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionError | Self::Timeout | Self::Deadlock
        )
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound | Self::UniqueViolation | Self::ForeignKeyViolation
        )
    }
}

/// Format database error with operation context
pub fn format_db_error(operation: &str, err: &DbErr) -> (DbErrorKind, String) {
    let kind = DbErrorKind::from_db_err(err);

    let message = match kind {
        DbErrorKind::NotFound => format!("{}: record not found", operation),
        DbErrorKind::UniqueViolation => format!("{}: duplicate key violation", operation),
        DbErrorKind::ForeignKeyViolation => {
            format!("{}: foreign key constraint violation", operation)
        }
        DbErrorKind::ConnectionError => format!("{}: database connection failed", operation),
        DbErrorKind::Timeout => format!("{}: query timeout", operation),
        DbErrorKind::Deadlock => format!("{}: transaction deadlock", operation),
        DbErrorKind::Unknown => format!("{}: database error - {}", operation, err),
    };

    (kind, message)
}
