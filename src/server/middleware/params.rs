use std::collections::HashMap;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde_json::Value;

use crate::config::PaginationConfig;
use crate::errors::CatalogError;
use crate::services::pagination::PageRequest;
use crate::services::validation::{FieldValidator, ValidationError};
use crate::services::ParentScope;

/// Raw query string values. Parsing is left to the accessors so that bad
/// input is reported in the regular error envelope.
#[derive(Debug, Clone, Default)]
pub struct Params(pub HashMap<String, String>);

#[async_trait]
impl<S> FromRequestParts<S> for Params
where
    S: Send + Sync,
{
    type Rejection = CatalogError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(values) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map_err(|e| ValidationError::field("query", e.body_text(), Value::Null))?;
        Ok(Params(values))
    }
}

impl Params {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// `true` only for the literal string "true".
    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    pub fn required_key(&self, key: &str) -> Result<String, ValidationError> {
        let mut v = FieldValidator::new();
        let value = v.str_id(key, self.get(key).map(str::to_string));
        v.finish()?;
        Ok(value.unwrap_or_default())
    }

    pub fn optional_key(&self, key: &str) -> Result<Option<String>, ValidationError> {
        let mut v = FieldValidator::new();
        let value = v.optional_str_id(key, self.get(key).map(str::to_string));
        v.finish()?;
        Ok(value)
    }

    pub fn scope(&self) -> Result<ParentScope, ValidationError> {
        Ok(ParentScope {
            template_str_id: self.optional_key("template_str_id")?,
            category_str_id: self.optional_key("category_str_id")?,
        })
    }

    pub fn page(&self, config: &PaginationConfig) -> Result<PageRequest, ValidationError> {
        PageRequest::parse(
            self.get("page"),
            self.get("limit"),
            config.default_limit,
            config.max_limit,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        Params(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_flags_and_keys() {
        let p = params(&[("include_choices", "true"), ("template_str_id", "laptop_x"), ("x", "")]);
        assert!(p.flag("include_choices"));
        assert!(!p.flag("include_rules"));
        assert_eq!(p.required_key("template_str_id").unwrap(), "laptop_x");
        assert_eq!(p.get("x"), None);

        let err = p.required_key("category_str_id").unwrap_err();
        assert_eq!(err.details[0].message, "category_str_id is required");
    }

    #[test]
    fn test_scope_rejects_malformed_keys() {
        let p = params(&[("template_str_id", "not valid")]);
        assert!(p.scope().is_err());
    }
}
