pub mod cascade;
pub mod compatibility_rule_service;
pub mod option_category_service;
pub mod option_choice_service;
pub mod pagination;
pub mod product_template_service;
pub mod validation;
pub mod views;

pub use compatibility_rule_service::*;
pub use option_category_service::*;
pub use option_choice_service::*;
pub use pagination::{Page, PageRequest, Pagination};
pub use product_template_service::*;

use serde_json::Value;

use crate::errors::CatalogError;
use validation::ValidationError;

/// Optional parent keys narrowing a lookup by a key that is only unique
/// within its parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentScope {
    pub template_str_id: Option<String>,
    pub category_str_id: Option<String>,
}

impl ParentScope {
    pub fn template(template_str_id: impl Into<String>) -> Self {
        Self {
            template_str_id: Some(template_str_id.into()),
            category_str_id: None,
        }
    }

    pub fn category(category_str_id: impl Into<String>) -> Self {
        Self {
            template_str_id: None,
            category_str_id: Some(category_str_id.into()),
        }
    }
}

pub(crate) fn ambiguous_key(key_field: &str, key: &str, scope_field: &str) -> CatalogError {
    ValidationError::field(
        scope_field,
        format!(
            "{} '{}' matches more than one record; pass {} to choose one",
            key_field, key, scope_field
        ),
        Value::Null,
    )
    .into()
}
