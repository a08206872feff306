//! Compatibility rules over the catalog store
//!
//! Rules are persisted rows; every decision is taken by loading the rows that
//! touch the choices in question into a [`RuleIndex`] and asking the engine.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::{debug, info, instrument, warn};

use super::option_choice_service::by_id;
use super::views::{
    ChoiceSummary, ConfigurationReport, ConflictReport, RuleLookupView, RuleView, ViolationReport,
};
use super::ambiguous_key;
use crate::common::db_errors::DbErrorKind;
use crate::compatibility::{
    ChoiceId, CompatibilityEngine, CompatibilityPolicy, Outcome, Rule, RuleIndex, RuleKind, Violation,
};
use crate::database::entities::{compatibility_rules, option_categories, option_choices, product_templates};
use crate::errors::{CatalogError, CatalogResult, RuleError};

/// A rule to create from a source choice, with the target still given by key.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRule {
    pub kind: RuleKind,
    pub target_choice_str_id: String,
    pub target_category_str_id: Option<String>,
    pub priority: i32,
    pub description: Option<String>,
}

/// Mutable rule fields; kind and endpoints are fixed once created.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleUpdate {
    pub is_active: Option<bool>,
    pub priority: Option<i32>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
}

/// Stored rules touching one choice, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleLookup {
    pub outgoing: Vec<compatibility_rules::Model>,
    pub incoming: Vec<compatibility_rules::Model>,
}

#[derive(Clone)]
pub struct CompatibilityRuleService {
    db: DatabaseConnection,
}

impl CompatibilityRuleService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persist a new active rule between two existing choices.
    #[instrument(skip(self, description))]
    pub async fn create_rule(
        &self,
        kind: RuleKind,
        source_id: ChoiceId,
        target_id: ChoiceId,
        priority: i32,
        description: Option<String>,
    ) -> CatalogResult<compatibility_rules::Model> {
        let index = self.index_for(&[source_id]).await?;
        index.check_candidate(kind, source_id, target_id)?;

        for choice_id in [source_id, target_id] {
            option_choices::Entity::find_by_id(choice_id)
                .one(&self.db)
                .await
                .map_err(|e| CatalogError::from_db("find option choice", e))?
                .ok_or_else(|| CatalogError::not_found("Option choice", choice_id.to_string()))?;
        }

        let now = Utc::now();
        let inserted = compatibility_rules::ActiveModel {
            rule_type: Set(kind.to_string()),
            description: Set(description),
            is_active: Set(true),
            priority: Set(priority),
            source_choice_id: Set(source_id),
            target_choice_id: Set(target_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await;

        let rule = match inserted {
            Ok(rule) => rule,
            // Another writer created the same triple after our check.
            Err(err) if DbErrorKind::from_db_err(&err) == DbErrorKind::UniqueViolation => {
                warn!("Concurrent insert of {} rule {} -> {}", kind, source_id, target_id);
                return Err(RuleError::DuplicateRule {
                    kind,
                    source_choice: source_id,
                    target_choice: target_id,
                }
                .into());
            }
            Err(err) => return Err(CatalogError::from_db("create compatibility rule", err)),
        };

        info!(
            "Created {} rule {} from choice {} to choice {} (priority {})",
            kind, rule.id, source_id, target_id, priority
        );
        Ok(rule)
    }

    /// Create a rule whose target is looked up by key within the source
    /// choice's product template.
    pub async fn create_for_choice(
        &self,
        source: &option_choices::Model,
        input: NewRule,
    ) -> CatalogResult<RuleView> {
        let target = self
            .resolve_target(
                source,
                &input.target_choice_str_id,
                input.target_category_str_id.as_deref(),
            )
            .await?;

        let rule = self
            .create_rule(input.kind, source.id, target.id, input.priority, input.description)
            .await?;

        Ok(RuleView {
            rule,
            source_choice: Some(ChoiceSummary::from(source)),
            target_choice: Some(ChoiceSummary::from(&target)),
        })
    }

    /// Rules where the choice is source (outgoing) or target (incoming).
    pub async fn rules_for(&self, choice_id: ChoiceId) -> CatalogResult<RuleLookup> {
        let models = self.load_rules(&[choice_id]).await?;
        let index = build_index(&models)?;
        let set = index.rules_for(choice_id);

        let mut rows: HashMap<i32, compatibility_rules::Model> =
            models.into_iter().map(|model| (model.id, model)).collect();
        let mut take = |rules: &[Rule]| -> Vec<compatibility_rules::Model> {
            rules.iter().filter_map(|rule| rows.remove(&rule.id)).collect()
        };

        Ok(RuleLookup {
            outgoing: take(set.outgoing.as_slice()),
            incoming: take(set.incoming.as_slice()),
        })
    }

    /// [`Self::rules_for`] with both endpoints of every rule summarized.
    pub async fn lookup(&self, choice: &option_choices::Model) -> CatalogResult<RuleLookupView> {
        let mut views = self.lookup_many(std::slice::from_ref(choice)).await?;
        Ok(views.remove(&choice.id).unwrap_or_default())
    }

    /// [`Self::lookup`] for several choices, loading their rules in one query.
    pub async fn lookup_many(
        &self,
        choices: &[option_choices::Model],
    ) -> CatalogResult<HashMap<ChoiceId, RuleLookupView>> {
        let ids: Vec<ChoiceId> = choices.iter().map(|choice| choice.id).collect();
        let models = self.load_rules(&ids).await?;
        let index = build_index(&models)?;

        let endpoint_ids: BTreeSet<i32> = models
            .iter()
            .flat_map(|rule| [rule.source_choice_id, rule.target_choice_id])
            .filter(|id| !ids.contains(id))
            .collect();
        let mut summaries: HashMap<i32, ChoiceSummary> = self
            .choices_by_id(endpoint_ids)
            .await?
            .iter()
            .map(|(id, choice)| (*id, ChoiceSummary::from(choice)))
            .collect();
        for choice in choices {
            summaries.insert(choice.id, ChoiceSummary::from(choice));
        }

        let rows: HashMap<i32, &compatibility_rules::Model> =
            models.iter().map(|model| (model.id, model)).collect();
        let views = |rules: &[Rule]| -> Vec<RuleView> {
            rules
                .iter()
                .filter_map(|rule| rows.get(&rule.id))
                .map(|model| RuleView {
                    source_choice: summaries.get(&model.source_choice_id).cloned(),
                    target_choice: summaries.get(&model.target_choice_id).cloned(),
                    rule: (*model).clone(),
                })
                .collect()
        };

        debug!("Loaded {} rules for {} choices", models.len(), ids.len());
        Ok(ids
            .iter()
            .map(|&id| {
                let set = index.rules_for(id);
                let view = RuleLookupView {
                    source_rules: views(set.outgoing.as_slice()),
                    target_rules: views(set.incoming.as_slice()),
                };
                (id, view)
            })
            .collect())
    }

    pub async fn find(&self, rule_id: i32) -> CatalogResult<compatibility_rules::Model> {
        compatibility_rules::Entity::find_by_id(rule_id)
            .one(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("find compatibility rule", e))?
            .ok_or_else(|| CatalogError::not_found("Compatibility rule", rule_id.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn update_rule(&self, rule_id: i32, update: RuleUpdate) -> CatalogResult<compatibility_rules::Model> {
        let rule = self.find(rule_id).await?;

        let mut active: compatibility_rules::ActiveModel = rule.into();
        if let Some(is_active) = update.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(priority) = update.priority {
            active.priority = Set(priority);
        }
        if let Some(description) = update.description {
            active.description = Set(description);
        }
        active.updated_at = Set(Utc::now());

        active
            .update(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("update compatibility rule", e))
    }

    #[instrument(skip(self))]
    pub async fn delete_rule(&self, rule_id: i32) -> CatalogResult<()> {
        let result = compatibility_rules::Entity::delete_by_id(rule_id)
            .exec(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("delete compatibility rule", e))?;

        if result.rows_affected == 0 {
            return Err(CatalogError::not_found("Compatibility rule", rule_id.to_string()));
        }
        info!("Deleted compatibility rule {}", rule_id);
        Ok(())
    }

    /// Evaluate a selection of choices (given by key, optionally qualified as
    /// `category_str_id:choice_str_id`) from one template.
    #[instrument(skip(self, template, keys), fields(template_str_id = %template.template_str_id))]
    pub async fn check_configuration(
        &self,
        template: &product_templates::Model,
        keys: &[String],
        policy: CompatibilityPolicy,
    ) -> CatalogResult<ConfigurationReport> {
        let catalog = TemplateChoices::load(&self.db, template.id).await?;

        let mut selected: BTreeSet<ChoiceId> = BTreeSet::new();
        for key in keys {
            selected.insert(catalog.resolve(key)?.id);
        }

        let models = self.load_rules(&selected.iter().copied().collect::<Vec<_>>()).await?;
        let engine = CompatibilityEngine::new(build_index(&models)?, policy);
        let outcome = engine.is_compatible(&selected)?;

        let mut summaries = catalog.summaries();
        let missing: BTreeSet<i32> = outcome
            .violations()
            .iter()
            .flat_map(violation_choices)
            .filter(|id| !summaries.contains_key(id))
            .collect();
        for (id, choice) in self.choices_by_id(missing).await? {
            summaries.insert(id, ChoiceSummary::from(&choice));
        }

        let violations: Vec<ViolationReport> = outcome
            .violations()
            .iter()
            .map(|violation| report_violation(violation, &summaries))
            .collect();

        debug!("Configuration of {} choices: {} violations", selected.len(), violations.len());
        Ok(ConfigurationReport {
            accepted: matches!(outcome, Outcome::Accepted),
            policy,
            choices: selected
                .iter()
                .filter_map(|id| summaries.get(id).cloned())
                .collect(),
            violations,
        })
    }

    /// Equal-priority REQUIRES/INCOMPATIBLE ties among the template's rules.
    pub async fn find_conflicts(&self, template: &product_templates::Model) -> CatalogResult<Vec<ConflictReport>> {
        let catalog = TemplateChoices::load(&self.db, template.id).await?;
        let ids: Vec<i32> = catalog.choices.iter().map(|(_, choice)| choice.id).collect();

        let models = self.load_rules(&ids).await?;
        let engine = CompatibilityEngine::new(build_index(&models)?, CompatibilityPolicy::Permissive);

        let mut summaries = catalog.summaries();
        let outside: BTreeSet<i32> = models
            .iter()
            .flat_map(|rule| [rule.source_choice_id, rule.target_choice_id])
            .filter(|id| !summaries.contains_key(id))
            .collect();
        for (id, choice) in self.choices_by_id(outside).await? {
            summaries.insert(id, ChoiceSummary::from(&choice));
        }

        let reports = engine
            .find_conflicts()
            .into_iter()
            .filter_map(|conflict| {
                let first = summaries.get(&conflict.first)?.clone();
                let second = summaries.get(&conflict.second)?.clone();
                let message = format!(
                    "REQUIRES rule {} and INCOMPATIBLE rule {} between {} and {} share priority {}",
                    conflict.requires_rule,
                    conflict.incompatible_rule,
                    first.choice_str_id,
                    second.choice_str_id,
                    conflict.priority
                );
                Some(ConflictReport {
                    first,
                    second,
                    priority: conflict.priority,
                    requires_rule_id: conflict.requires_rule,
                    incompatible_rule_id: conflict.incompatible_rule,
                    message,
                })
            })
            .collect::<Vec<_>>();

        if !reports.is_empty() {
            warn!(
                "Template {} has {} conflicting rule pairs",
                template.template_str_id,
                reports.len()
            );
        }
        Ok(reports)
    }

    async fn resolve_target(
        &self,
        source: &option_choices::Model,
        target_choice_str_id: &str,
        target_category_str_id: Option<&str>,
    ) -> CatalogResult<option_choices::Model> {
        let category = option_categories::Entity::find_by_id(source.option_category_id)
            .one(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("find option category", e))?
            .ok_or_else(|| CatalogError::not_found("Option category", source.option_category_id.to_string()))?;

        let catalog = TemplateChoices::load(&self.db, category.product_template_id).await?;
        let key = match target_category_str_id {
            Some(category_str_id) => format!("{}:{}", category_str_id, target_choice_str_id),
            None => target_choice_str_id.to_string(),
        };

        catalog.resolve(&key).cloned().map_err(|err| match err {
            CatalogError::NotFound { .. } => {
                CatalogError::not_found("Target option choice", target_choice_str_id)
            }
            CatalogError::Validation(_) => {
                ambiguous_key("target_choice_str_id", target_choice_str_id, "target_category_str_id")
            }
            other => other,
        })
    }

    async fn load_rules(&self, choice_ids: &[ChoiceId]) -> CatalogResult<Vec<compatibility_rules::Model>> {
        if choice_ids.is_empty() {
            return Ok(Vec::new());
        }
        compatibility_rules::Entity::find()
            .filter(
                Condition::any()
                    .add(compatibility_rules::Column::SourceChoiceId.is_in(choice_ids.iter().copied()))
                    .add(compatibility_rules::Column::TargetChoiceId.is_in(choice_ids.iter().copied())),
            )
            .order_by_asc(compatibility_rules::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("load compatibility rules", e))
    }

    async fn index_for(&self, choice_ids: &[ChoiceId]) -> CatalogResult<RuleIndex> {
        let models = self.load_rules(choice_ids).await?;
        build_index(&models)
    }

    async fn choices_by_id<I>(&self, ids: I) -> CatalogResult<HashMap<i32, option_choices::Model>>
    where
        I: IntoIterator<Item = i32>,
    {
        let ids: Vec<i32> = ids.into_iter().collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let choices = option_choices::Entity::find()
            .filter(option_choices::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| CatalogError::from_db("list option choices", e))?;
        Ok(by_id(choices))
    }
}

fn build_index(models: &[compatibility_rules::Model]) -> CatalogResult<RuleIndex> {
    let rules = models
        .iter()
        .map(Rule::try_from)
        .collect::<Result<Vec<_>, DbErr>>()?;
    Ok(RuleIndex::from_rules(rules)?)
}

/// Every choice of one template, each paired with its category key.
struct TemplateChoices {
    choices: Vec<(String, option_choices::Model)>,
}

impl TemplateChoices {
    async fn load(db: &DatabaseConnection, template_id: i32) -> CatalogResult<Self> {
        let categories: HashMap<i32, String> = option_categories::Entity::find()
            .filter(option_categories::Column::ProductTemplateId.eq(template_id))
            .all(db)
            .await
            .map_err(|e| CatalogError::from_db("list option categories", e))?
            .into_iter()
            .map(|category| (category.id, category.category_str_id))
            .collect();

        if categories.is_empty() {
            return Ok(Self { choices: Vec::new() });
        }

        let choices = option_choices::Entity::find()
            .filter(option_choices::Column::OptionCategoryId.is_in(categories.keys().copied()))
            .order_by_asc(option_choices::Column::Id)
            .all(db)
            .await
            .map_err(|e| CatalogError::from_db("list option choices", e))?
            .into_iter()
            .filter_map(|choice| {
                let category = categories.get(&choice.option_category_id)?.clone();
                Some((category, choice))
            })
            .collect();

        Ok(Self { choices })
    }

    /// `choice_str_id` or `category_str_id:choice_str_id`.
    fn resolve(&self, key: &str) -> CatalogResult<&option_choices::Model> {
        let (category, choice_key) = match key.split_once(':') {
            Some((category, choice)) => (Some(category), choice),
            None => (None, key),
        };

        let mut matches = self.choices.iter().filter(|(category_key, choice)| {
            choice.choice_str_id == choice_key && category.map_or(true, |c| c == category_key)
        });

        match (matches.next(), matches.next()) {
            (None, _) => Err(CatalogError::not_found("Option choice", key)),
            (Some((_, choice)), None) => Ok(choice),
            (Some(_), Some(_)) => Err(ambiguous_key("choice_str_id", key, "category_str_id")),
        }
    }

    fn summaries(&self) -> HashMap<i32, ChoiceSummary> {
        self.choices
            .iter()
            .map(|(_, choice)| (choice.id, ChoiceSummary::from(choice)))
            .collect()
    }
}

fn violation_choices(violation: &Violation) -> [ChoiceId; 2] {
    match violation {
        Violation::Incompatible { source, target, .. } => [*source, *target],
        Violation::MissingRequirement { source, required, .. } => [*source, *required],
        Violation::NotAllowed { first, second } => [*first, *second],
    }
}

fn report_violation(violation: &Violation, summaries: &HashMap<i32, ChoiceSummary>) -> ViolationReport {
    let label = |id: &ChoiceId| {
        summaries
            .get(id)
            .map(|s| s.choice_str_id.clone())
            .unwrap_or_else(|| id.to_string())
    };
    let choices = violation_choices(violation)
        .iter()
        .filter_map(|id| summaries.get(id).cloned())
        .collect();

    match violation {
        Violation::Incompatible {
            source,
            target,
            rule_id,
        } => ViolationReport {
            kind: "incompatible",
            rule_id: Some(*rule_id),
            choices,
            message: format!("{} is incompatible with {}", label(source), label(target)),
        },
        Violation::MissingRequirement {
            source,
            required,
            rule_id,
        } => ViolationReport {
            kind: "missing_requirement",
            rule_id: Some(*rule_id),
            choices,
            message: format!("{} requires {}", label(source), label(required)),
        },
        Violation::NotAllowed { first, second } => ViolationReport {
            kind: "not_allowed",
            rule_id: None,
            choices,
            message: format!(
                "No active compatibility rule allows {} together with {}",
                label(first),
                label(second)
            ),
        },
    }
}
