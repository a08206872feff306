//! Configuration-level evaluation of compatibility rules

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use super::{ChoiceId, Rule, RuleId, RuleIndex, RuleKind};
use crate::errors::RuleError;

/// How COMPATIBLE rules take part in evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CompatibilityPolicy {
    /// COMPATIBLE rules are informational only.
    #[default]
    Permissive,
    /// Every selected pair must be covered by an active COMPATIBLE or
    /// REQUIRES rule.
    AllowList,
}

/// A reason a configuration was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Violation {
    Incompatible {
        source: ChoiceId,
        target: ChoiceId,
        rule_id: RuleId,
    },
    MissingRequirement {
        source: ChoiceId,
        required: ChoiceId,
        rule_id: RuleId,
    },
    NotAllowed {
        first: ChoiceId,
        second: ChoiceId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Rejected(Vec<Violation>),
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Outcome::Accepted => &[],
            Outcome::Rejected(violations) => violations,
        }
    }
}

/// An active REQUIRES and an active INCOMPATIBLE rule between the same pair
/// at the same, highest, priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleConflict {
    pub first: ChoiceId,
    pub second: ChoiceId,
    pub priority: i32,
    pub requires_rule: RuleId,
    pub incompatible_rule: RuleId,
}

pub struct CompatibilityEngine {
    index: RuleIndex,
    policy: CompatibilityPolicy,
}

impl CompatibilityEngine {
    pub fn new(index: RuleIndex, policy: CompatibilityPolicy) -> Self {
        Self { index, policy }
    }

    /// Decide whether a set of choices may be selected together.
    pub fn is_compatible(&self, choices: &BTreeSet<ChoiceId>) -> Result<Outcome, RuleError> {
        let mut violations = Vec::new();
        let selected: Vec<ChoiceId> = choices.iter().copied().collect();

        for (i, &a) in selected.iter().enumerate() {
            for &b in &selected[i + 1..] {
                if let Some(rule) = self.governing(a, b)? {
                    if rule.kind == RuleKind::Incompatible {
                        violations.push(Violation::Incompatible {
                            source: rule.source,
                            target: rule.target,
                            rule_id: rule.id,
                        });
                    }
                }
                if self.policy == CompatibilityPolicy::AllowList && !self.is_allowed(a, b) {
                    violations.push(Violation::NotAllowed {
                        first: a,
                        second: b,
                    });
                }
            }
        }

        for &a in &selected {
            for rule in self.index.rules_for(a).outgoing {
                if !rule.is_active || rule.kind != RuleKind::Requires || choices.contains(&rule.target) {
                    continue;
                }
                // A higher-priority INCOMPATIBLE between the pair overrides the requirement.
                let in_force = self
                    .governing(a, rule.target)?
                    .map_or(false, |g| g.kind == RuleKind::Requires);
                if in_force {
                    violations.push(Violation::MissingRequirement {
                        source: a,
                        required: rule.target,
                        rule_id: rule.id,
                    });
                }
            }
        }

        debug!(
            "Evaluated {} choices against {} rules: {} violations",
            choices.len(),
            self.index.len(),
            violations.len()
        );

        if violations.is_empty() {
            Ok(Outcome::Accepted)
        } else {
            Ok(Outcome::Rejected(violations))
        }
    }

    /// Every pair whose governing decision is an unresolved tie.
    pub fn find_conflicts(&self) -> Vec<RuleConflict> {
        self.index
            .pairs()
            .into_iter()
            .filter_map(|(a, b)| self.governing(a, b).err())
            .filter_map(|err| match err {
                RuleError::ConflictingRules(conflict) => Some(conflict),
                _ => None,
            })
            .collect()
    }

    /// Highest-priority active enforcing rule between two choices.
    fn governing(&self, a: ChoiceId, b: ChoiceId) -> Result<Option<&Rule>, RuleError> {
        let enforcing: Vec<&Rule> = self
            .index
            .between(a, b)
            .into_iter()
            .filter(|rule| rule.is_active && rule.kind.is_enforcing())
            .collect();

        let Some(top) = enforcing.first().copied() else {
            return Ok(None);
        };

        let tied = enforcing.iter().take_while(|rule| rule.priority == top.priority);
        let requires = tied.clone().find(|rule| rule.kind == RuleKind::Requires);
        let incompatible = tied.clone().find(|rule| rule.kind == RuleKind::Incompatible);

        if let (Some(requires), Some(incompatible)) = (requires, incompatible) {
            return Err(RuleError::ConflictingRules(RuleConflict {
                first: a.min(b),
                second: a.max(b),
                priority: top.priority,
                requires_rule: requires.id,
                incompatible_rule: incompatible.id,
            }));
        }

        Ok(Some(top))
    }

    fn is_allowed(&self, a: ChoiceId, b: ChoiceId) -> bool {
        self.index.between(a, b).into_iter().any(|rule| {
            rule.is_active && matches!(rule.kind, RuleKind::Compatible | RuleKind::Requires)
        })
    }
}
