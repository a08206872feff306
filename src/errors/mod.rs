//! Domain error types
//!
//! - **CatalogError**: everything a catalog operation can fail with, including
//!   store failures already categorized for the HTTP boundary.
//! - **RuleError**: compatibility rule engine failures (self-rules, duplicate
//!   triples, unresolved priority ties).
//!
//! ```rust
//! use configurator::errors::{CatalogError, RuleError};
//!
//! let err: CatalogError = RuleError::InvalidRule { choice: 4 }.into();
//! assert_eq!(err.http_status_code(), 400);
//! ```

pub mod catalog;
pub mod rule;

pub use catalog::CatalogError;
pub use rule::RuleError;

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
