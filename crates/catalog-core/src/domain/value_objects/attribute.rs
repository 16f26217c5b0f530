//! Attribute types, validation rules and value checking.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

/// Value type of an attribute, stored as the `attribute_value_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "attribute_value_type", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    String,
    Number,
    Boolean,
    List,
    Date,
}

impl AttributeType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::List => "list",
            Self::Date => "date",
        }
    }

    #[must_use]
    pub const fn all() -> [Self; 5] {
        [Self::String, Self::Number, Self::Boolean, Self::List, Self::Date]
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown attribute type '{s}'"))
    }
}

/// Constraints applied to attribute values. Stored as JSONB.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct ValidationRules {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    pub multiple: bool,
}

impl ValidationRules {
    /// Checks the rules are coherent for the given type.
    pub fn check_definition(&self, value_type: AttributeType) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if value_type == AttributeType::List && self.allowed_values.is_empty() {
            errors.push("list attributes require allowed_values".to_string());
        }
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                errors.push("min_length must not exceed max_length".to_string());
            }
        }
        if let (Some(min), Some(max)) = (self.min_value, self.max_value) {
            if min > max {
                errors.push("min_value must not exceed max_value".to_string());
            }
        }
        if let Some(pattern) = &self.pattern {
            if let Err(e) = Regex::new(pattern) {
                errors.push(format!("invalid pattern: {e}"));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates a JSON value against the type and these rules.
    #[must_use]
    pub fn check_value(&self, value_type: AttributeType, value: &Value) -> AttributeValidation {
        let mut errors = Vec::new();
        let normalized = match value_type {
            AttributeType::String => self.check_string(value, &mut errors),
            AttributeType::Number => self.check_number(value, &mut errors),
            AttributeType::Boolean => check_boolean(value, &mut errors),
            AttributeType::List => self.check_list(value, &mut errors),
            AttributeType::Date => check_date(value, &mut errors),
        };
        AttributeValidation::from_parts(errors, normalized)
    }

    fn check_string(&self, value: &Value, errors: &mut Vec<String>) -> Option<Value> {
        let Value::String(s) = value else {
            errors.push("Value must be a string".to_string());
            return None;
        };
        let len = s.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                errors.push(format!("Value must be at least {min} characters"));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                errors.push(format!("Value must be at most {max} characters"));
            }
        }
        if let Some(pattern) = &self.pattern {
            match Regex::new(&format!("^(?:{pattern})")) {
                Ok(re) if !re.is_match(s) => errors.push("Value does not match required pattern".to_string()),
                Ok(_) => {}
                Err(_) => errors.push("Attribute pattern is invalid".to_string()),
            }
        }
        Some(value.clone())
    }

    fn check_number(&self, value: &Value, errors: &mut Vec<String>) -> Option<Value> {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        };
        let Some(number) = parsed else {
            errors.push("Value must be a number".to_string());
            return None;
        };
        if let Some(min) = self.min_value {
            if number < min {
                errors.push(format!("Value must be at least {min}"));
            }
        }
        if let Some(max) = self.max_value {
            if number > max {
                errors.push(format!("Value must be at most {max}"));
            }
        }
        Some(number_value(number))
    }

    fn check_list(&self, value: &Value, errors: &mut Vec<String>) -> Option<Value> {
        let allowed = |s: &str| self.allowed_values.iter().any(|a| a == s);
        let one_of = || format!("Value must be one of: {}", self.allowed_values.join(", "));
        match value {
            Value::String(s) => {
                if !allowed(s) {
                    errors.push(one_of());
                }
                Some(if self.multiple {
                    Value::Array(vec![value.clone()])
                } else {
                    value.clone()
                })
            }
            Value::Array(items) if self.multiple => {
                for item in items {
                    match item.as_str() {
                        Some(s) if allowed(s) => {}
                        _ => {
                            errors.push(one_of());
                            break;
                        }
                    }
                }
                Some(value.clone())
            }
            Value::Array(_) => {
                errors.push("Attribute does not allow multiple values".to_string());
                None
            }
            _ => {
                errors.push(one_of());
                None
            }
        }
    }
}

fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < 9.0e15 {
        #[allow(clippy::cast_possible_truncation)]
        return Value::Number(Number::from(number as i64));
    }
    Number::from_f64(number).map_or(Value::Null, Value::Number)
}

fn check_boolean(value: &Value, errors: &mut Vec<String>) -> Option<Value> {
    let parsed = match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    };
    if parsed.is_none() {
        errors.push("Value must be a boolean".to_string());
    }
    parsed.map(Value::Bool)
}

fn check_date(value: &Value, errors: &mut Vec<String>) -> Option<Value> {
    let Value::String(s) = value else {
        errors.push("Value must be a date".to_string());
        return None;
    };
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Value::String(date.format("%Y-%m-%d").to_string()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        let dt = DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc);
        return Some(Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)));
    }
    errors.push("Value must be a valid ISO date format".to_string());
    None
}

/// Outcome of checking a value against an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AttributeValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub normalized_value: Option<Value>,
}

impl AttributeValidation {
    fn from_parts(errors: Vec<String>, normalized: Option<Value>) -> Self {
        let is_valid = errors.is_empty();
        Self {
            is_valid,
            errors,
            normalized_value: if is_valid { normalized } else { None },
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            errors: vec![message.into()],
            normalized_value: None,
        }
    }
}
