use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

static STR_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("static pattern compiles"));

pub const MAX_STR_ID_LEN: usize = 100;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[schema(value_type = Object)]
    pub value: Value,
}

/// Every field-level problem found in one payload.
#[derive(Error, Debug, Clone, Default, PartialEq)]
#[error("Validation Error")]
pub struct ValidationError {
    pub details: Vec<FieldError>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(field: impl Into<String>, message: impl Into<String>, value: Value) -> Self {
        let mut err = Self::new();
        err.push(field, message, value);
        err
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>, value: Value) {
        self.details.push(FieldError {
            field: field.into(),
            message: message.into(),
            value,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Turns a raw request payload into sanitized service input.
pub trait Validate {
    type Output;

    fn validate(self) -> Result<Self::Output, ValidationError>;
}

/// Accumulates field errors so a payload reports all of its problems at once.
#[derive(Debug, Default)]
pub struct FieldValidator {
    errors: ValidationError,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject(&mut self, field: &str, message: impl Into<String>, value: Value) {
        self.errors.push(field, message, value);
    }

    /// External string keys: `template_str_id`, `category_str_id`, ...
    pub fn str_id(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let Some(value) = value else {
            self.reject(field, format!("{} is required", field), Value::Null);
            return None;
        };

        if value.is_empty() {
            self.reject(
                field,
                format!("{} must be at least 1 character long", field),
                Value::from(value),
            );
            return None;
        }
        if value.chars().count() > MAX_STR_ID_LEN {
            self.reject(
                field,
                format!("{} must be at most {} characters long", field, MAX_STR_ID_LEN),
                Value::from(value),
            );
            return None;
        }
        if !STR_ID_PATTERN.is_match(&value) {
            self.reject(
                field,
                format!(
                    "{} must contain only alphanumeric characters, underscores, and hyphens",
                    field
                ),
                Value::from(value),
            );
            return None;
        }
        Some(value)
    }

    pub fn optional_str_id(&mut self, field: &str, value: Option<String>) -> Option<String> {
        value.and_then(|value| self.str_id(field, Some(value)))
    }

    pub fn name(&mut self, value: Option<String>) -> Option<String> {
        let Some(value) = value else {
            self.reject("name", "name is required", Value::Null);
            return None;
        };

        if value.trim().is_empty() {
            self.reject("name", "name must be at least 1 character long", Value::from(value));
            return None;
        }
        if value.chars().count() > MAX_NAME_LEN {
            self.reject(
                "name",
                format!("name must be at most {} characters long", MAX_NAME_LEN),
                Value::from(value),
            );
            return None;
        }
        if value.chars().any(|c| c.is_control()) {
            self.reject("name", "name cannot contain control characters", Value::from(value));
            return None;
        }
        Some(value)
    }

    /// Optional free text; empty strings are allowed and kept as given.
    pub fn description(&mut self, value: Option<String>) -> Option<String> {
        let value = value?;
        if value.chars().count() > MAX_DESCRIPTION_LEN {
            self.reject(
                "description",
                format!(
                    "description must be at most {} characters long",
                    MAX_DESCRIPTION_LEN
                ),
                Value::from(value),
            );
            return None;
        }
        Some(value)
    }

    /// Monetary amount with at most two decimal places.
    pub fn amount(&mut self, field: &str, value: f64, non_negative: bool) -> Option<f64> {
        if !value.is_finite() {
            self.reject(field, format!("{} must be a finite number", field), Value::Null);
            return None;
        }
        if non_negative && value < 0.0 {
            self.reject(
                field,
                format!("{} must be a positive number", field),
                Value::from(value),
            );
            return None;
        }
        if !has_at_most_two_decimals(value) {
            self.reject(
                field,
                format!("{} must have at most 2 decimal places", field),
                Value::from(value),
            );
            return None;
        }
        Some(value)
    }

    /// Non-negative integer that fits the store's integer column.
    pub fn non_negative_int(&mut self, field: &str, value: Option<i64>) -> Option<i32> {
        let value = value.unwrap_or(0);
        if value < 0 {
            self.reject(
                field,
                format!("{} must be a non-negative number", field),
                Value::from(value),
            );
            return None;
        }
        match i32::try_from(value) {
            Ok(value) => Some(value),
            Err(_) => {
                self.reject(field, format!("{} is too large", field), Value::from(value));
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        self.errors.into_result()
    }
}

fn has_at_most_two_decimals(value: f64) -> bool {
    let scaled = value * 100.0;
    (scaled - scaled.round()).abs() < 1e-6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_id_rules() {
        let mut v = FieldValidator::new();
        assert_eq!(v.str_id("choice_str_id", Some("intel_i7".into())), Some("intel_i7".into()));
        assert_eq!(v.str_id("choice_str_id", Some("with-dash-9".into())), Some("with-dash-9".into()));
        assert!(v.finish().is_ok());

        let mut v = FieldValidator::new();
        assert!(v.str_id("choice_str_id", Some("bad id".into())).is_none());
        assert!(v.str_id("template_str_id", None).is_none());
        assert!(v.str_id("category_str_id", Some("x".repeat(101))).is_none());
        let err = v.finish().unwrap_err();
        assert_eq!(err.details.len(), 3);
        assert_eq!(err.details[0].field, "choice_str_id");
        assert_eq!(err.details[0].value, Value::from("bad id"));
        assert_eq!(err.details[1].message, "template_str_id is required");
    }

    #[test]
    fn test_amount_precision_and_sign() {
        let mut v = FieldValidator::new();
        assert_eq!(v.amount("base_price", 800.0, true), Some(800.0));
        assert_eq!(v.amount("price_delta", -150.25, false), Some(-150.25));
        assert_eq!(v.amount("base_price", 19.99, true), Some(19.99));
        assert!(v.finish().is_ok());

        let mut v = FieldValidator::new();
        assert!(v.amount("base_price", -1.0, true).is_none());
        assert!(v.amount("price_delta", 1.005, false).is_none());
        let err = v.finish().unwrap_err();
        assert_eq!(err.details[0].message, "base_price must be a positive number");
        assert_eq!(err.details[1].message, "price_delta must have at most 2 decimal places");
    }

    #[test]
    fn test_name_and_description() {
        let mut v = FieldValidator::new();
        assert!(v.name(Some("   ".into())).is_none());
        assert!(v.name(Some("a".repeat(256))).is_none());
        assert_eq!(v.description(Some(String::new())), Some(String::new()));
        assert!(v.description(Some("d".repeat(1001))).is_none());
        assert_eq!(v.finish().unwrap_err().details.len(), 3);
    }

    #[test]
    fn test_non_negative_int_defaults_to_zero() {
        let mut v = FieldValidator::new();
        assert_eq!(v.non_negative_int("display_order", None), Some(0));
        assert_eq!(v.non_negative_int("priority", Some(10)), Some(10));
        assert!(v.non_negative_int("priority", Some(-1)).is_none());
        assert!(v.non_negative_int("priority", Some(i64::from(i32::MAX) + 1)).is_none());
        assert_eq!(v.finish().unwrap_err().details.len(), 2);
    }
}
