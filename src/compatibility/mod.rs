//! Compatibility rule engine
//!
//! Compatibility rules are directed, typed relations between two option
//! choices. This module holds the in-memory side of the subsystem:
//!
//! - [`RuleIndex`]: adjacency structure keyed by `(source, target, kind)` with
//!   per-choice outgoing and incoming indexes.
//! - [`CompatibilityEngine`]: answers configuration-level questions
//!   (`is_compatible`, conflict detection) over an index.
//!
//! The catalog store remains the source of truth; services load the relevant
//! rows into a [`RuleIndex`] before asking the engine anything.

pub mod engine;
pub mod index;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

pub use engine::{CompatibilityEngine, CompatibilityPolicy, Outcome, RuleConflict, Violation};
pub use index::{RuleIndex, RuleSet};

pub type ChoiceId = i32;
pub type RuleId = i32;

/// Kind of relation a rule expresses between its source and target choice.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleKind {
    /// Selecting the source demands the target is selected as well.
    Requires,
    /// Source and target may never be selected together (symmetric).
    Incompatible,
    /// Informational unless an allow-list policy is in force.
    Compatible,
}

impl RuleKind {
    pub const ALL: [RuleKind; 3] = [
        RuleKind::Requires,
        RuleKind::Incompatible,
        RuleKind::Compatible,
    ];

    /// Whether the kind has an effect under the permissive policy.
    pub fn is_enforcing(&self) -> bool {
        matches!(self, RuleKind::Requires | RuleKind::Incompatible)
    }
}

/// Identity of a rule: at most one rule per kind for an ordered pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleKey {
    pub source: ChoiceId,
    pub target: ChoiceId,
    pub kind: RuleKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub kind: RuleKind,
    pub source: ChoiceId,
    pub target: ChoiceId,
    pub priority: i32,
    pub is_active: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Rule {
    pub fn key(&self) -> RuleKey {
        RuleKey {
            source: self.source,
            target: self.target,
            kind: self.kind,
        }
    }

    /// True when the rule touches both choices, in either direction.
    pub fn connects(&self, a: ChoiceId, b: ChoiceId) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }
}

/// Evaluation order: priority descending, then creation ascending. The id
/// breaks ties between rules created within the same clock tick.
pub fn evaluation_order(a: &Rule, b: &Rule) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::{Duration, TimeZone};

    /// Builds an active rule whose creation time is derived from its id, so
    /// ids double as creation order.
    pub fn rule(id: RuleId, kind: RuleKind, source: ChoiceId, target: ChoiceId, priority: i32) -> Rule {
        let epoch = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Rule {
            id,
            kind,
            source,
            target,
            priority,
            is_active: true,
            description: None,
            created_at: epoch + Duration::seconds(id as i64),
        }
    }
}
