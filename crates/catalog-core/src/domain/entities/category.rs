//! Category entity.

use crate::domain::value_objects::{CategoryPath, SeoData, Slug};
use crate::{CatalogError, CatalogResult, CategoryId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A node of the category hierarchy.
///
/// The path is the parent's path followed by this category's label, which is
/// derived from its id and therefore survives renames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub path: CategoryPath,
    pub seo: SeoData,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Creates an active category under an optional parent.
    pub fn new(
        name: impl Into<String>,
        slug: Slug,
        description: Option<String>,
        parent: Option<&Category>,
        sort_order: i32,
    ) -> CatalogResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CatalogError::validation("Category name cannot be empty"));
        }
        let id = CategoryId::new();
        let path = Self::path_for(id, parent)?;
        let now = Utc::now();
        Ok(Self {
            id,
            name,
            slug,
            description,
            parent_id: parent.map(|p| p.id),
            path,
            seo: SeoData::default(),
            is_active: true,
            sort_order,
            created_at: now,
            updated_at: now,
        })
    }

    fn path_for(id: CategoryId, parent: Option<&Category>) -> CatalogResult<CategoryPath> {
        CategoryPath::under(parent.map(|p| &p.path), &id.label())
            .map_err(|e| CatalogError::internal(e.to_string()))
    }

    /// Applies the provided changes; `None` leaves a field unchanged.
    pub fn update(
        &mut self,
        name: Option<String>,
        slug: Option<Slug>,
        description: Option<Option<String>>,
        seo: Option<SeoData>,
        sort_order: Option<i32>,
    ) -> CatalogResult<()> {
        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(CatalogError::validation("Category name cannot be empty"));
            }
            self.name = name;
        }
        if let Some(slug) = slug {
            self.slug = slug;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(seo) = seo {
            if let Some(violation) = seo.violation() {
                return Err(CatalogError::validation(violation));
            }
            self.seo = seo;
        }
        if let Some(sort_order) = sort_order {
            self.sort_order = sort_order;
        }
        self.touch();
        Ok(())
    }

    /// Re-parents this category and recomputes its path.
    ///
    /// Fails when the new parent is the category itself or one of its
    /// descendants.
    pub fn move_under(&mut self, parent: Option<&Category>) -> CatalogResult<()> {
        if let Some(parent) = parent {
            if parent.id == self.id {
                return Err(CatalogError::business_rule("Category cannot be its own parent"));
            }
            if parent.path.is_descendant_of(&self.path) {
                return Err(CatalogError::business_rule(
                    "Category cannot be moved under one of its descendants",
                ));
            }
        }
        self.path = Self::path_for(self.id, parent)?;
        self.parent_id = parent.map(|p| p.id);
        self.touch();
        Ok(())
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.touch();
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.touch();
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    #[must_use]
    pub fn is_descendant_of(&self, other: &Category) -> bool {
        self.path.is_descendant_of(&other.path)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
