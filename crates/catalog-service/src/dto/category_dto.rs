//! Category DTOs.

use catalog_core::domain::{Category, SeoData};
use catalog_core::validation::rules::{not_blank, valid_slug};
use catalog_core::CategoryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Request to create a category.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1-255 characters"),
        custom(function = "not_blank")
    )]
    pub name: String,

    /// Derived from the name when omitted.
    #[validate(custom(function = "valid_slug"))]
    pub slug: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    pub parent_id: Option<CategoryId>,

    #[validate(length(max = 255, message = "Meta title cannot exceed 255 characters"))]
    pub meta_title: Option<String>,

    #[validate(length(max = 500, message = "Meta description cannot exceed 500 characters"))]
    pub meta_description: Option<String>,

    #[validate(length(max = 500))]
    pub meta_keywords: Option<String>,

    #[serde(default)]
    pub sort_order: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// Partial update; omitted fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1-255 characters"),
        custom(function = "not_blank")
    )]
    pub name: Option<String>,

    #[validate(custom(function = "valid_slug"))]
    pub slug: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(length(max = 255, message = "Meta title cannot exceed 255 characters"))]
    pub meta_title: Option<String>,

    #[validate(length(max = 500, message = "Meta description cannot exceed 500 characters"))]
    pub meta_description: Option<String>,

    #[validate(length(max = 500))]
    pub meta_keywords: Option<String>,

    pub sort_order: Option<i32>,

    pub is_active: Option<bool>,
}

impl UpdateCategoryRequest {
    /// SEO block merged over the current one, if any SEO field is present.
    #[must_use]
    pub fn merged_seo(&self, current: &SeoData) -> Option<SeoData> {
        if self.meta_title.is_none() && self.meta_description.is_none() && self.meta_keywords.is_none() {
            return None;
        }
        Some(SeoData {
            title: self.meta_title.clone().or_else(|| current.title.clone()),
            description: self.meta_description.clone().or_else(|| current.description.clone()),
            keywords: self.meta_keywords.clone().or_else(|| current.keywords.clone()),
        })
    }
}

/// Request to re-parent a category; `null` moves it to the root.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MoveCategoryRequest {
    pub new_parent_id: Option<CategoryId>,
}

/// Query parameters of the category listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryListQuery {
    #[serde(default)]
    pub active_only: bool,
    /// Case-insensitive match over name and description.
    pub search: Option<String>,
}

/// Category response DTO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    /// `ltree` path of id labels.
    pub path: String,
    pub depth: usize,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Category> for CategoryResponse {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.to_string(),
            description: category.description.clone(),
            parent_id: category.parent_id,
            path: category.path.to_string(),
            depth: category.depth(),
            meta_title: category.seo.title.clone(),
            meta_description: category.seo.description.clone(),
            meta_keywords: category.seo.keywords.clone(),
            is_active: category.is_active,
            sort_order: category.sort_order,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self::from(&category)
    }
}

/// A node of the nested category tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryTreeNode {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub depth: usize,
    pub is_active: bool,
    pub sort_order: i32,
    #[schema(no_recursion)]
    pub children: Vec<CategoryTreeNode>,
}

impl CategoryTreeNode {
    /// Builds the forest from categories ordered by path.
    ///
    /// Nodes whose parent is missing from the input are treated as roots.
    /// Siblings are ordered by `sort_order`, then name.
    #[must_use]
    pub fn build(categories: &[Category]) -> Vec<Self> {
        let mut children_of: HashMap<Option<CategoryId>, Vec<&Category>> = HashMap::new();
        let known: HashSet<CategoryId> = categories.iter().map(|c| c.id).collect();
        for category in categories {
            let parent = category.parent_id.filter(|p| known.contains(p));
            children_of.entry(parent).or_default().push(category);
        }

        fn attach(
            parent: Option<CategoryId>,
            children_of: &HashMap<Option<CategoryId>, Vec<&Category>>,
        ) -> Vec<CategoryTreeNode> {
            let mut nodes: Vec<CategoryTreeNode> = children_of
                .get(&parent)
                .map(|children| {
                    children
                        .iter()
                        .map(|c| CategoryTreeNode {
                            id: c.id,
                            name: c.name.clone(),
                            slug: c.slug.to_string(),
                            depth: c.depth(),
                            is_active: c.is_active,
                            sort_order: c.sort_order,
                            children: attach(Some(c.id), children_of),
                        })
                        .collect()
                })
                .unwrap_or_default();
            nodes.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
            nodes
        }

        attach(None, &children_of)
    }

    /// Number of nodes in this subtree, self included.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Self::size).sum::<usize>()
    }
}

/// One step of a breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BreadcrumbItem {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

impl From<&Category> for BreadcrumbItem {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.to_string(),
        }
    }
}
