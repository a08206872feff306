//! Compatibility rule engine errors

use thiserror::Error;

use crate::compatibility::{ChoiceId, RuleConflict, RuleKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    /// Source and target reference the same choice
    #[error("A choice cannot have a compatibility rule with itself (choice {choice})")]
    InvalidRule { choice: ChoiceId },

    /// A rule of this kind already exists for the ordered pair
    #[error("A {kind} rule from choice {source_choice} to choice {target_choice} already exists")]
    DuplicateRule {
        kind: RuleKind,
        source_choice: ChoiceId,
        target_choice: ChoiceId,
    },

    /// REQUIRES and INCOMPATIBLE rules tie at the governing priority
    #[error(
        "Rules {} (REQUIRES) and {} (INCOMPATIBLE) between choices {} and {} share priority {}",
        .0.requires_rule,
        .0.incompatible_rule,
        .0.first,
        .0.second,
        .0.priority
    )]
    ConflictingRules(RuleConflict),
}

impl RuleError {
    pub fn error_code(&self) -> &'static str {
        match self {
            RuleError::InvalidRule { .. } => "INVALID_RULE",
            RuleError::DuplicateRule { .. } => "DUPLICATE_RULE",
            RuleError::ConflictingRules(_) => "CONFLICTING_RULES",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            RuleError::InvalidRule { .. } => 400,
            RuleError::DuplicateRule { .. } | RuleError::ConflictingRules(_) => 409,
        }
    }

    /// Duplicate creation can race between writers; callers may report and retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RuleError::DuplicateRule { .. })
    }
}
