//! Attribute definitions and their assignment to categories.

use crate::domain::value_objects::{AttributeType, AttributeValidation, Slug, ValidationRules};
use crate::{AttributeId, CatalogError, CatalogResult, CategoryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Group name reported for attributes without one.
pub const DEFAULT_GROUP: &str = "Default";

/// A typed, configurable product characteristic such as "Screen size".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub value_type: AttributeType,
    pub rules: ValidationRules,
    pub default_value: Option<Value>,
    pub unit: Option<String>,
    /// Display group; ungrouped attributes are listed under [`DEFAULT_GROUP`].
    pub group_name: Option<String>,
    pub is_required: bool,
    pub is_filterable: bool,
    pub is_searchable: bool,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attribute {
    #[must_use]
    pub fn new(name: impl Into<String>, slug: Slug, value_type: AttributeType, rules: ValidationRules) -> Self {
        let now = Utc::now();
        Self {
            id: AttributeId::new(),
            name: name.into(),
            slug,
            description: None,
            value_type,
            rules,
            default_value: None,
            unit: None,
            group_name: None,
            is_required: false,
            is_filterable: false,
            is_searchable: false,
            sort_order: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Checks the type/rules combination and the default value.
    pub fn validate_definition(&self) -> CatalogResult<()> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::validation("Attribute name cannot be empty"));
        }
        self.rules
            .check_definition(self.value_type)
            .map_err(|errors| CatalogError::validation(errors.join("; ")))?;
        if let Some(default) = &self.default_value {
            let result = self.validate_value(default);
            if !result.is_valid {
                return Err(CatalogError::validation(format!(
                    "default_value: {}",
                    result.errors.join("; ")
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn validate_value(&self, value: &Value) -> AttributeValidation {
        self.rules.check_value(self.value_type, value)
    }

    #[must_use]
    pub fn group(&self) -> &str {
        self.group_name.as_deref().unwrap_or(DEFAULT_GROUP)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Link between a category and an attribute, as seen from `category_id`.
///
/// `is_inherited` is set when the link was resolved from an ancestor whose
/// assignment has `inherit_to_descendants`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CategoryAttribute {
    pub category_id: CategoryId,
    pub attribute_id: AttributeId,
    pub is_inherited: bool,
    pub inherit_to_descendants: bool,
    pub sort_order: i32,
}
