//! Adjacency index over compatibility rules

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use super::{evaluation_order, ChoiceId, Rule, RuleKey, RuleKind};
use crate::errors::RuleError;

/// Rules touching one choice, split by direction and sorted in evaluation
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleSet {
    pub outgoing: Vec<Rule>,
    pub incoming: Vec<Rule>,
}

impl RuleSet {
    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty() && self.incoming.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    rules: BTreeMap<RuleKey, Rule>,
    outgoing: HashMap<ChoiceId, BTreeSet<RuleKey>>,
    incoming: HashMap<ChoiceId, BTreeSet<RuleKey>>,
}

impl RuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from stored rules, enforcing the same invariants as
    /// [`RuleIndex::insert`].
    pub fn from_rules<I>(rules: I) -> Result<Self, RuleError>
    where
        I: IntoIterator<Item = Rule>,
    {
        let mut index = Self::new();
        for rule in rules {
            index.insert(rule)?;
        }
        Ok(index)
    }

    /// Check whether a rule with this shape could be added.
    pub fn check_candidate(
        &self,
        kind: RuleKind,
        source: ChoiceId,
        target: ChoiceId,
    ) -> Result<(), RuleError> {
        if source == target {
            return Err(RuleError::InvalidRule { choice: source });
        }
        let key = RuleKey {
            source,
            target,
            kind,
        };
        if self.rules.contains_key(&key) {
            return Err(RuleError::DuplicateRule {
                kind,
                source_choice: source,
                target_choice: target,
            });
        }
        Ok(())
    }

    pub fn insert(&mut self, rule: Rule) -> Result<&Rule, RuleError> {
        self.check_candidate(rule.kind, rule.source, rule.target)?;

        let key = rule.key();
        self.outgoing.entry(rule.source).or_default().insert(key);
        self.incoming.entry(rule.target).or_default().insert(key);
        Ok(self.rules.entry(key).or_insert(rule))
    }

    fn remove(&mut self, key: &RuleKey) -> Option<Rule> {
        let rule = self.rules.remove(key)?;
        detach(&mut self.outgoing, key.source, key);
        detach(&mut self.incoming, key.target, key);
        Some(rule)
    }

    /// Drop every rule where the choice is source or target.
    pub fn remove_choice(&mut self, choice: ChoiceId) -> Vec<Rule> {
        let mut keys: BTreeSet<RuleKey> = BTreeSet::new();
        if let Some(out) = self.outgoing.get(&choice) {
            keys.extend(out.iter().copied());
        }
        if let Some(inc) = self.incoming.get(&choice) {
            keys.extend(inc.iter().copied());
        }

        let removed: Vec<Rule> = keys.iter().filter_map(|key| self.remove(key)).collect();
        debug!("Removed {} rules attached to choice {}", removed.len(), choice);
        removed
    }

    pub fn rules_for(&self, choice: ChoiceId) -> RuleSet {
        RuleSet {
            outgoing: self.collect_sorted(self.outgoing.get(&choice)),
            incoming: self.collect_sorted(self.incoming.get(&choice)),
        }
    }

    /// All rules between two choices, in either direction, in evaluation order.
    pub fn between(&self, a: ChoiceId, b: ChoiceId) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self
            .outgoing
            .get(&a)
            .into_iter()
            .flatten()
            .chain(self.incoming.get(&a).into_iter().flatten())
            .filter_map(|key| self.rules.get(key))
            .filter(|rule| rule.connects(a, b))
            .collect();
        rules.sort_by(|x, y| evaluation_order(x, y));
        rules
    }

    /// Unordered pairs of choices that have at least one rule between them.
    pub fn pairs(&self) -> BTreeSet<(ChoiceId, ChoiceId)> {
        self.rules
            .keys()
            .map(|key| (key.source.min(key.target), key.source.max(key.target)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn collect_sorted(&self, keys: Option<&BTreeSet<RuleKey>>) -> Vec<Rule> {
        let mut rules: Vec<Rule> = keys
            .into_iter()
            .flatten()
            .filter_map(|key| self.rules.get(key).cloned())
            .collect();
        rules.sort_by(evaluation_order);
        rules
    }
}

fn detach(side: &mut HashMap<ChoiceId, BTreeSet<RuleKey>>, choice: ChoiceId, key: &RuleKey) {
    if let Some(keys) = side.get_mut(&choice) {
        keys.remove(key);
        if keys.is_empty() {
            side.remove(&choice);
        }
    }
}
