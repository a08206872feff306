use std::str::FromStr;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::compatibility::{CompatibilityPolicy, RuleKind};
use crate::errors::CatalogError;
use crate::services::validation::{FieldValidator, Validate, ValidationError};
use crate::services::{NewOptionCategory, NewOptionChoice, NewProductTemplate, NewRule, RuleUpdate};

/// JSON body deserialized into `T` and validated into `T::Output`.
pub struct Valid<T: Validate>(pub T::Output);

#[async_trait]
impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = CatalogError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|e| {
            ValidationError::field("body", format!("Failed to read request body: {}", e), Value::Null)
        })?;
        let payload: T = parse_json(&bytes)?;
        Ok(Valid(payload.validate()?))
    }
}

/// An empty body is treated as `{}` so missing fields are reported one by one.
pub fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ValidationError> {
    let value: Value = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(bytes)
            .map_err(|e| ValidationError::field("body", format!("Invalid JSON: {}", e), Value::Null))?
    };

    if !value.is_object() {
        return Err(ValidationError::field("body", "Request body must be a JSON object", value));
    }

    serde_json::from_value(value).map_err(|e| ValidationError::field("body", e.to_string(), Value::Null))
}

// Product template validation structures

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductTemplatePayload {
    pub template_str_id: Option<String>,
    pub name: Option<String>,
    pub base_price: Option<f64>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl Validate for ProductTemplatePayload {
    type Output = NewProductTemplate;

    fn validate(self) -> Result<NewProductTemplate, ValidationError> {
        let mut v = FieldValidator::new();
        let template_str_id = v.str_id("template_str_id", self.template_str_id);
        let name = v.name(self.name);
        let base_price = match self.base_price {
            Some(price) => v.amount("base_price", price, true),
            None => {
                v.reject("base_price", "base_price is required", Value::Null);
                None
            }
        };
        let description = v.description(self.description);
        v.finish()?;

        Ok(NewProductTemplate {
            template_str_id: template_str_id.unwrap_or_default(),
            name: name.unwrap_or_default(),
            base_price: base_price.unwrap_or_default(),
            description,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

// Option category validation structures

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OptionCategoryPayload {
    pub category_str_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_required: Option<bool>,
    pub display_order: Option<i64>,
}

impl Validate for OptionCategoryPayload {
    type Output = NewOptionCategory;

    fn validate(self) -> Result<NewOptionCategory, ValidationError> {
        let mut v = FieldValidator::new();
        let category_str_id = v.str_id("category_str_id", self.category_str_id);
        let name = v.name(self.name);
        let description = v.description(self.description);
        let display_order = v.non_negative_int("display_order", self.display_order);
        v.finish()?;

        Ok(NewOptionCategory {
            category_str_id: category_str_id.unwrap_or_default(),
            name: name.unwrap_or_default(),
            description,
            is_required: self.is_required.unwrap_or(false),
            display_order: display_order.unwrap_or_default(),
        })
    }
}

// Option choice validation structures

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OptionChoicePayload {
    pub choice_str_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_delta: Option<f64>,
    pub is_default: Option<bool>,
    pub is_available: Option<bool>,
    pub display_order: Option<i64>,
}

impl Validate for OptionChoicePayload {
    type Output = NewOptionChoice;

    fn validate(self) -> Result<NewOptionChoice, ValidationError> {
        let mut v = FieldValidator::new();
        let choice_str_id = v.str_id("choice_str_id", self.choice_str_id);
        let name = v.name(self.name);
        let description = v.description(self.description);
        let price_delta = v.amount("price_delta", self.price_delta.unwrap_or(0.0), false);
        let display_order = v.non_negative_int("display_order", self.display_order);
        v.finish()?;

        Ok(NewOptionChoice {
            choice_str_id: choice_str_id.unwrap_or_default(),
            name: name.unwrap_or_default(),
            description,
            price_delta: price_delta.unwrap_or_default(),
            is_default: self.is_default.unwrap_or(false),
            is_available: self.is_available.unwrap_or(true),
            display_order: display_order.unwrap_or_default(),
        })
    }
}

// Compatibility rule validation structures

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CompatibilityRulePayload {
    /// REQUIRES, INCOMPATIBLE or COMPATIBLE
    pub rule_type: Option<String>,
    pub target_choice_str_id: Option<String>,
    /// Narrows the target key when several categories of the template use it
    pub target_category_str_id: Option<String>,
    pub priority: Option<i64>,
    pub description: Option<String>,
}

impl Validate for CompatibilityRulePayload {
    type Output = NewRule;

    fn validate(self) -> Result<NewRule, ValidationError> {
        let mut v = FieldValidator::new();
        let kind = rule_kind(&mut v, self.rule_type);
        let target_choice_str_id = v.str_id("target_choice_str_id", self.target_choice_str_id);
        let target_category_str_id =
            v.optional_str_id("target_category_str_id", self.target_category_str_id);
        let priority = v.non_negative_int("priority", self.priority);
        let description = v.description(self.description);
        v.finish()?;

        Ok(NewRule {
            kind: kind.unwrap_or(RuleKind::Compatible),
            target_choice_str_id: target_choice_str_id.unwrap_or_default(),
            target_category_str_id,
            priority: priority.unwrap_or_default(),
            description,
        })
    }
}

fn rule_kind(v: &mut FieldValidator, raw: Option<String>) -> Option<RuleKind> {
    let Some(raw) = raw else {
        v.reject("rule_type", "rule_type is required", Value::Null);
        return None;
    };
    match RuleKind::from_str(&raw) {
        Ok(kind) => Some(kind),
        Err(_) => {
            v.reject(
                "rule_type",
                "rule_type must be one of [REQUIRES, INCOMPATIBLE, COMPATIBLE]",
                Value::from(raw),
            );
            None
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RuleUpdatePayload {
    pub is_active: Option<bool>,
    pub priority: Option<i64>,
    /// An explicit `null` clears the description
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>, nullable)]
    pub description: Option<Option<String>>,
}

/// Distinguishes a field sent as `null` (`Some(None)`) from an absent one.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl Validate for RuleUpdatePayload {
    type Output = RuleUpdate;

    fn validate(self) -> Result<RuleUpdate, ValidationError> {
        let mut v = FieldValidator::new();
        if self.is_active.is_none() && self.priority.is_none() && self.description.is_none() {
            v.reject(
                "body",
                "At least one of is_active, priority or description is required",
                Value::Null,
            );
        }
        let priority = match self.priority {
            Some(priority) => v.non_negative_int("priority", Some(priority)),
            None => None,
        };
        let description = match self.description {
            Some(Some(description)) => v.description(Some(description)).map(Some),
            Some(None) => Some(None),
            None => None,
        };
        v.finish()?;

        Ok(RuleUpdate {
            is_active: self.is_active,
            priority,
            description,
        })
    }
}

// Configuration check structures

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ConfigurationCheckPayload {
    /// `choice_str_id` or `category_str_id:choice_str_id`
    pub choices: Option<Vec<String>>,
    /// `permissive` or `allow_list`; defaults to the configured policy
    pub policy: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationCheck {
    pub keys: Vec<String>,
    pub policy: Option<CompatibilityPolicy>,
}

impl Validate for ConfigurationCheckPayload {
    type Output = ConfigurationCheck;

    fn validate(self) -> Result<ConfigurationCheck, ValidationError> {
        let mut v = FieldValidator::new();

        let choices = match self.choices {
            Some(choices) => choices,
            None => {
                v.reject("choices", "choices is required", Value::Null);
                Vec::new()
            }
        };

        let mut keys = Vec::with_capacity(choices.len());
        for (i, key) in choices.into_iter().enumerate() {
            let field = format!("choices[{}]", i);
            let valid = match key.split_once(':') {
                Some((category, choice)) => {
                    v.str_id(&field, Some(category.to_string())).is_some()
                        && v.str_id(&field, Some(choice.to_string())).is_some()
                }
                None => v.str_id(&field, Some(key.clone())).is_some(),
            };
            if valid {
                keys.push(key);
            }
        }

        let policy = match self.policy {
            Some(raw) => match CompatibilityPolicy::from_str(&raw) {
                Ok(policy) => Some(policy),
                Err(_) => {
                    v.reject("policy", "policy must be one of [permissive, allow_list]", Value::from(raw));
                    None
                }
            },
            None => None,
        };
        v.finish()?;

        Ok(ConfigurationCheck { keys, policy })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse<T: DeserializeOwned>(value: Value) -> T {
        parse_json(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn test_template_payload_defaults() {
        let payload: ProductTemplatePayload = parse(json!({
            "template_str_id": "laptop_x",
            "name": "Laptop X",
            "base_price": 800,
            "unknown": "ignored"
        }));
        let input = payload.validate().unwrap();
        assert!(input.is_active);
        assert_eq!(input.base_price, 800.0);
        assert_eq!(input.description, None);
    }

    #[test]
    fn test_template_payload_reports_every_field() {
        let payload: ProductTemplatePayload = parse(json!({"template_str_id": "bad key", "base_price": -5}));
        let err = payload.validate().unwrap_err();
        let fields: Vec<&str> = err.details.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["template_str_id", "name", "base_price"]);
    }

    #[test]
    fn test_rule_payload() {
        let payload: CompatibilityRulePayload = parse(json!({
            "rule_type": "REQUIRES",
            "target_choice_str_id": "ddr5_ram",
            "priority": 5,
            "description": "Needs fast memory"
        }));
        let rule = payload.validate().unwrap();
        assert_eq!(rule.kind, RuleKind::Requires);
        assert_eq!(rule.priority, 5);

        let payload: CompatibilityRulePayload = parse(json!({"rule_type": "EXCLUDES", "priority": -1}));
        let err = payload.validate().unwrap_err();
        assert_eq!(err.details.len(), 3);
        assert_eq!(err.details[0].value, json!("EXCLUDES"));
    }

    #[test]
    fn test_rule_update_needs_a_field() {
        let payload: RuleUpdatePayload = parse(json!({}));
        assert!(payload.validate().is_err());

        let payload: RuleUpdatePayload = parse(json!({"is_active": false}));
        let update = payload.validate().unwrap();
        assert_eq!(update.is_active, Some(false));
        assert_eq!(update.description, None);
    }

    #[test]
    fn test_rule_update_null_description_clears() {
        let payload: RuleUpdatePayload = parse(json!({"description": null}));
        assert_eq!(payload.validate().unwrap().description, Some(None));

        let payload: RuleUpdatePayload = parse(json!({"description": "Needs DDR5"}));
        assert_eq!(
            payload.validate().unwrap().description,
            Some(Some("Needs DDR5".to_string()))
        );
    }

    #[test]
    fn test_configuration_check_keys() {
        let payload: ConfigurationCheckPayload = parse(json!({
            "choices": ["intel_i7", "memory:ddr5_ram"],
            "policy": "allow_list"
        }));
        let check = payload.validate().unwrap();
        assert_eq!(check.keys.len(), 2);
        assert_eq!(check.policy, Some(CompatibilityPolicy::AllowList));

        let payload: ConfigurationCheckPayload = parse(json!({"choices": ["a b", "x:"]}));
        let err = payload.validate().unwrap_err();
        assert_eq!(err.details[0].field, "choices[0]");
        assert_eq!(err.details[1].field, "choices[1]");

        let payload: ConfigurationCheckPayload = parse(json!({}));
        assert_eq!(payload.validate().unwrap_err().details[0].field, "choices");
    }

    #[test]
    fn test_malformed_bodies() {
        let err = parse_json::<ProductTemplatePayload>(b"{not json").unwrap_err();
        assert_eq!(err.details[0].field, "body");

        let err = parse_json::<ProductTemplatePayload>(b"[1, 2]").unwrap_err();
        assert_eq!(err.details[0].message, "Request body must be a JSON object");

        let err = parse_json::<ProductTemplatePayload>(br#"{"base_price": "cheap"}"#).unwrap_err();
        assert_eq!(err.details[0].field, "body");

        assert!(parse_json::<ProductTemplatePayload>(b"").is_ok());
    }
}
