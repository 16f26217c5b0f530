//! Attribute DTOs.

use catalog_core::domain::{Attribute, AttributeType, ValidationRules};
use catalog_core::validation::rules::{not_blank, valid_slug};
use catalog_core::{AttributeId, CategoryId};
use catalog_repository::{AssignedAttribute, AttributeAssignment, AttributeFilter, AttributeStatistics, AttributeUsage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request to create an attribute definition.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateAttributeRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1-255 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,

    #[validate(custom(function = "valid_slug"))]
    pub slug: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    pub value_type: AttributeType,

    #[serde(default)]
    pub rules: ValidationRules,

    pub default_value: Option<Value>,

    #[validate(length(max = 50, message = "Unit cannot exceed 50 characters"))]
    pub unit: Option<String>,

    #[validate(length(max = 100, message = "Group name cannot exceed 100 characters"))]
    pub group_name: Option<String>,

    #[serde(default)]
    pub is_required: bool,

    #[serde(default)]
    pub is_filterable: bool,

    #[serde(default)]
    pub is_searchable: bool,

    #[serde(default)]
    pub sort_order: i32,
}

/// Partial update; omitted fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateAttributeRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1-255 characters"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,

    #[validate(custom(function = "valid_slug"))]
    pub slug: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    /// Only allowed while no product holds a value.
    pub value_type: Option<AttributeType>,

    pub rules: Option<ValidationRules>,

    pub default_value: Option<Value>,

    #[validate(length(max = 50, message = "Unit cannot exceed 50 characters"))]
    pub unit: Option<String>,

    #[validate(length(max = 100, message = "Group name cannot exceed 100 characters"))]
    pub group_name: Option<String>,

    pub is_required: Option<bool>,
    pub is_filterable: Option<bool>,
    pub is_searchable: Option<bool>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Filters of the attribute listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttributeListQuery {
    pub value_type: Option<AttributeType>,
    pub is_required: Option<bool>,
    pub is_filterable: Option<bool>,
    pub is_searchable: Option<bool>,
    pub is_active: Option<bool>,
    pub group_name: Option<String>,
    pub search: Option<String>,
}

impl From<AttributeListQuery> for AttributeFilter {
    fn from(query: AttributeListQuery) -> Self {
        Self {
            value_type: query.value_type,
            is_required: query.is_required,
            is_filterable: query.is_filterable,
            is_searchable: query.is_searchable,
            is_active: query.is_active,
            group_name: query.group_name.filter(|g| !g.trim().is_empty()),
            search: query.search.filter(|s| !s.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttributeAssignmentInput {
    pub attribute_id: AttributeId,
    #[serde(default)]
    pub sort_order: i32,
    /// Descendant categories inherit the attribute.
    #[serde(default)]
    pub inherit_to_descendants: bool,
}

impl From<&AttributeAssignmentInput> for AttributeAssignment {
    fn from(input: &AttributeAssignmentInput) -> Self {
        Self {
            attribute_id: input.attribute_id,
            sort_order: input.sort_order,
            inherit_to_descendants: input.inherit_to_descendants,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AssignAttributesRequest {
    #[validate(length(min = 1, message = "At least one attribute is required"))]
    pub attributes: Vec<AttributeAssignmentInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateValueRequest {
    pub value: Value,
}

/// Attribute response DTO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttributeResponse {
    pub id: AttributeId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub value_type: AttributeType,
    pub rules: ValidationRules,
    pub default_value: Option<Value>,
    pub unit: Option<String>,
    pub group_name: Option<String>,
    pub is_required: bool,
    pub is_filterable: bool,
    pub is_searchable: bool,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Attribute> for AttributeResponse {
    fn from(attribute: &Attribute) -> Self {
        Self {
            id: attribute.id,
            name: attribute.name.clone(),
            slug: attribute.slug.to_string(),
            description: attribute.description.clone(),
            value_type: attribute.value_type,
            rules: attribute.rules.clone(),
            default_value: attribute.default_value.clone(),
            unit: attribute.unit.clone(),
            group_name: attribute.group_name.clone(),
            is_required: attribute.is_required,
            is_filterable: attribute.is_filterable,
            is_searchable: attribute.is_searchable,
            sort_order: attribute.sort_order,
            is_active: attribute.is_active,
            created_at: attribute.created_at,
            updated_at: attribute.updated_at,
        }
    }
}

impl From<Attribute> for AttributeResponse {
    fn from(attribute: Attribute) -> Self {
        Self::from(&attribute)
    }
}

/// An attribute as attached to a category.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryAttributeResponse {
    pub category_id: CategoryId,
    pub attribute: AttributeResponse,
    /// Resolved from an ancestor assignment.
    pub is_inherited: bool,
    pub inherit_to_descendants: bool,
    pub sort_order: i32,
}

impl From<AssignedAttribute> for CategoryAttributeResponse {
    fn from(assigned: AssignedAttribute) -> Self {
        Self {
            category_id: assigned.link.category_id,
            attribute: AttributeResponse::from(&assigned.attribute),
            is_inherited: assigned.link.is_inherited,
            inherit_to_descendants: assigned.link.inherit_to_descendants,
            sort_order: assigned.link.sort_order,
        }
    }
}

/// Attributes sharing a display group.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttributeGroupResponse {
    pub group_name: String,
    pub attributes: Vec<AttributeResponse>,
    /// Lowest sort order among the group's attributes.
    pub sort_order: i32,
}

impl AttributeGroupResponse {
    /// Groups attributes by [`Attribute::group`], each group and its members
    /// ordered by sort order.
    #[must_use]
    pub fn group(attributes: Vec<Attribute>) -> Vec<Self> {
        let mut groups: Vec<Self> = Vec::new();
        for attribute in attributes {
            let response = AttributeResponse::from(&attribute);
            match groups.iter_mut().find(|g| g.group_name == attribute.group()) {
                Some(group) => {
                    group.sort_order = group.sort_order.min(attribute.sort_order);
                    group.attributes.push(response);
                }
                None => groups.push(Self {
                    group_name: attribute.group().to_string(),
                    sort_order: attribute.sort_order,
                    attributes: vec![response],
                }),
            }
        }
        for group in &mut groups {
            group.attributes.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        }
        groups.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.group_name.cmp(&b.group_name)));
        groups
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TypeCount {
    pub value_type: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttributeUsageResponse {
    pub attribute_id: AttributeId,
    pub name: String,
    pub usage_count: i64,
}

impl From<AttributeUsage> for AttributeUsageResponse {
    fn from(usage: AttributeUsage) -> Self {
        Self {
            attribute_id: usage.attribute_id,
            name: usage.name,
            usage_count: usage.usage_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttributeStatsResponse {
    pub total: i64,
    pub by_type: Vec<TypeCount>,
    pub required: i64,
    pub filterable: i64,
    pub searchable: i64,
    pub most_used: Vec<AttributeUsageResponse>,
}

impl From<AttributeStatistics> for AttributeStatsResponse {
    fn from(stats: AttributeStatistics) -> Self {
        Self {
            total: stats.total,
            by_type: stats
                .by_type
                .into_iter()
                .map(|(value_type, count)| TypeCount { value_type, count })
                .collect(),
            required: stats.required,
            filterable: stats.filterable,
            searchable: stats.searchable,
            most_used: stats.most_used.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_defaults() {
        let request: CreateAttributeRequest = serde_json::from_value(json!({
            "name": "Color",
            "value_type": "list",
            "rules": {"allowed_values": ["red", "blue"]}
        }))
        .unwrap();

        assert!(request.validate().is_ok());
        assert_eq!(request.value_type, AttributeType::List);
        assert_eq!(request.rules.allowed_values.len(), 2);
        assert!(!request.is_required);
    }

    #[test]
    fn test_assign_request_requires_items() {
        let request = AssignAttributesRequest { attributes: vec![] };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_group_orders_groups_and_members() {
        let attr = |name: &str, group: Option<&str>, sort_order| {
            let mut a = Attribute::new(
                name,
                catalog_core::domain::Slug::from_name(name).unwrap(),
                AttributeType::String,
                ValidationRules::default(),
            );
            a.group_name = group.map(str::to_string);
            a.sort_order = sort_order;
            a
        };

        let groups = AttributeGroupResponse::group(vec![
            attr("Weight", Some("Physical"), 5),
            attr("Brand", None, 3),
            attr("Height", Some("Physical"), 1),
            attr("Model", None, 2),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_name, "Physical");
        assert_eq!(groups[0].sort_order, 1);
        assert_eq!(groups[0].attributes[0].name, "Height");
        assert_eq!(groups[1].group_name, "Default");
        assert_eq!(groups[1].attributes[0].name, "Model");
    }

    #[test]
    fn test_stats_conversion() {
        let stats = AttributeStatistics {
            total: 3,
            by_type: vec![("string".to_string(), 2), ("number".to_string(), 1)],
            ..Default::default()
        };
        let response = AttributeStatsResponse::from(stats);
        assert_eq!(response.by_type[0].value_type, "string");
        assert_eq!(response.by_type[1].count, 1);
    }
}
