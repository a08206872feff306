//! Response shapes that embed related records next to a stored row.

use serde::Serialize;

use crate::compatibility::CompatibilityPolicy;
use crate::database::entities::{compatibility_rules, option_categories, option_choices, product_templates};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateSummary {
    pub id: i32,
    pub template_str_id: String,
    pub name: String,
}

impl From<&product_templates::Model> for TemplateSummary {
    fn from(model: &product_templates::Model) -> Self {
        Self {
            id: model.id,
            template_str_id: model.template_str_id.clone(),
            name: model.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub id: i32,
    pub category_str_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_template: Option<TemplateSummary>,
}

impl From<&option_categories::Model> for CategorySummary {
    fn from(model: &option_categories::Model) -> Self {
        Self {
            id: model.id,
            category_str_id: model.category_str_id.clone(),
            name: model.name.clone(),
            product_template: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceSummary {
    pub id: i32,
    pub choice_str_id: String,
    pub name: String,
}

impl From<&option_choices::Model> for ChoiceSummary {
    fn from(model: &option_choices::Model) -> Self {
        Self {
            id: model.id,
            choice_str_id: model.choice_str_id.clone(),
            name: model.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateView {
    #[serde(flatten)]
    pub template: product_templates::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_categories: Option<Vec<CategoryView>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    #[serde(flatten)]
    pub category: option_categories::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_template: Option<TemplateSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_choices: Option<Vec<ChoiceView>>,
}

impl CategoryView {
    pub fn bare(category: option_categories::Model) -> Self {
        Self {
            category,
            product_template: None,
            option_choices: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceView {
    #[serde(flatten)]
    pub choice: option_choices::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_category: Option<CategorySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_rules: Option<RuleLookupView>,
}

impl ChoiceView {
    pub fn bare(choice: option_choices::Model) -> Self {
        Self {
            choice,
            option_category: None,
            compatibility_rules: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleView {
    #[serde(flatten)]
    pub rule: compatibility_rules::Model,
    pub source_choice: Option<ChoiceSummary>,
    pub target_choice: Option<ChoiceSummary>,
}

/// Rules touching one choice: `source_rules` start at it, `target_rules` end
/// at it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleLookupView {
    pub source_rules: Vec<RuleView>,
    pub target_rules: Vec<RuleView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceRulesView {
    pub choice: ChoiceSummary,
    #[serde(flatten)]
    pub rules: RuleLookupView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViolationReport {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub rule_id: Option<i32>,
    pub choices: Vec<ChoiceSummary>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationReport {
    pub accepted: bool,
    pub policy: CompatibilityPolicy,
    pub choices: Vec<ChoiceSummary>,
    pub violations: Vec<ViolationReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictReport {
    pub first: ChoiceSummary,
    pub second: ChoiceSummary,
    pub priority: i32,
    pub requires_rule_id: i32,
    pub incompatible_rule_id: i32,
    pub message: String,
}
