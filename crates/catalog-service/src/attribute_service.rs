//! Attribute definitions and their assignment to categories.

use crate::cache::{cache_keys, AttributeChange, CacheCoordinator, CacheNamespace};
use crate::dto::{
    AssignAttributesRequest, AttributeGroupResponse, AttributeListQuery, AttributeResponse, AttributeStatsResponse,
    CategoryAttributeResponse, CreateAttributeRequest, UpdateAttributeRequest,
};
use crate::support::resolve_slug;
use async_trait::async_trait;
use catalog_core::domain::{Attribute, AttributeValidation};
use catalog_core::{
    AttributeId, AttributeSortField, CatalogError, CatalogResult, CategoryId, Page, PageRequest, Sort, ValidateExt,
};
use catalog_repository::{AssignedAttribute, AttributeAssignment, AttributeFilter, AttributeRepository, CategoryRepository};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait AttributeService: Send + Sync {
    async fn create(&self, request: CreateAttributeRequest) -> CatalogResult<AttributeResponse>;

    async fn get(&self, id: AttributeId) -> CatalogResult<AttributeResponse>;

    async fn get_by_name(&self, name: &str) -> CatalogResult<AttributeResponse>;

    async fn list(
        &self,
        query: AttributeListQuery,
        page: PageRequest,
        sort: Sort<AttributeSortField>,
    ) -> CatalogResult<Page<AttributeResponse>>;

    /// Every attribute by display group; ungrouped ones fall under "Default".
    async fn groups(&self) -> CatalogResult<Vec<AttributeGroupResponse>>;

    async fn update(&self, id: AttributeId, request: UpdateAttributeRequest) -> CatalogResult<AttributeResponse>;

    /// Fails with `Conflict` while any product holds a value.
    async fn delete(&self, id: AttributeId) -> CatalogResult<()>;

    async fn validate_value(&self, id: AttributeId, value: Value) -> CatalogResult<AttributeValidation>;

    async fn stats(&self) -> CatalogResult<AttributeStatsResponse>;

    async fn assign_to_category(
        &self,
        category_id: CategoryId,
        request: AssignAttributesRequest,
    ) -> CatalogResult<Vec<CategoryAttributeResponse>>;

    async fn unassign_from_category(&self, category_id: CategoryId, attribute_id: AttributeId) -> CatalogResult<()>;

    /// Own and inherited attributes of a category.
    async fn category_attributes(&self, category_id: CategoryId) -> CatalogResult<Vec<CategoryAttributeResponse>>;
}

pub struct AttributeServiceImpl {
    attributes: Arc<dyn AttributeRepository>,
    categories: Arc<dyn CategoryRepository>,
    cache: Arc<CacheCoordinator>,
}

impl AttributeServiceImpl {
    pub fn new(
        attributes: Arc<dyn AttributeRepository>,
        categories: Arc<dyn CategoryRepository>,
        cache: Arc<CacheCoordinator>,
    ) -> Self {
        Self {
            attributes,
            categories,
            cache,
        }
    }

    async fn find(&self, id: AttributeId) -> CatalogResult<Attribute> {
        self.attributes
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Attribute", id))
    }

    async fn ensure_category(&self, id: CategoryId) -> CatalogResult<()> {
        if self.categories.find_by_id(id).await?.is_none() {
            return Err(CatalogError::not_found("Category", id));
        }
        Ok(())
    }

    async fn ensure_unique(&self, name: &str, slug: &str, exclude: Option<AttributeId>) -> CatalogResult<()> {
        if let Some(existing) = self.attributes.find_by_name(name).await? {
            if Some(existing.id) != exclude {
                return Err(CatalogError::conflict(format!("Attribute '{name}' already exists")));
            }
        }
        if let Some(existing) = self.attributes.find_by_slug(slug).await? {
            if Some(existing.id) != exclude {
                return Err(CatalogError::conflict(format!("Attribute with slug '{slug}' already exists")));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AttributeService for AttributeServiceImpl {
    async fn create(&self, request: CreateAttributeRequest) -> CatalogResult<AttributeResponse> {
        debug!("Creating attribute: {}", request.name);
        request.validate_request()?;

        let slug = resolve_slug(request.slug.as_deref(), &request.name)?;
        self.ensure_unique(&request.name, slug.as_str(), None).await?;

        let mut attribute = Attribute::new(request.name, slug, request.value_type, request.rules);
        attribute.description = request.description;
        attribute.default_value = request.default_value;
        attribute.unit = request.unit;
        attribute.group_name = request.group_name;
        attribute.is_required = request.is_required;
        attribute.is_filterable = request.is_filterable;
        attribute.is_searchable = request.is_searchable;
        attribute.sort_order = request.sort_order;
        attribute.validate_definition()?;

        let saved = self.attributes.save(&attribute).await?;
        self.cache.on_attribute_changed(saved.id, AttributeChange::Created).await;

        info!("Attribute created: {} ({})", saved.id, saved.name);
        Ok(saved.into())
    }

    async fn get(&self, id: AttributeId) -> CatalogResult<AttributeResponse> {
        let attributes = &self.attributes;
        let attribute: Attribute = self
            .cache
            .cached(
                CacheNamespace::Attribute,
                &cache_keys::attribute_by_id(id),
                self.cache.ttls().categories,
                || async move {
                    attributes
                        .find_by_id(id)
                        .await?
                        .ok_or_else(|| CatalogError::not_found("Attribute", id))
                },
            )
            .await?;
        Ok(attribute.into())
    }

    async fn get_by_name(&self, name: &str) -> CatalogResult<AttributeResponse> {
        self.attributes
            .find_by_name(name)
            .await?
            .map(AttributeResponse::from)
            .ok_or_else(|| CatalogError::not_found("Attribute", name))
    }

    async fn list(
        &self,
        query: AttributeListQuery,
        page: PageRequest,
        sort: Sort<AttributeSortField>,
    ) -> CatalogResult<Page<AttributeResponse>> {
        let filter = AttributeFilter::from(query);
        let page = self.attributes.find_all(&filter, page, sort).await?;
        Ok(page.map(AttributeResponse::from))
    }

    async fn groups(&self) -> CatalogResult<Vec<AttributeGroupResponse>> {
        let attributes = self.attributes.find_all_by_group().await?;
        Ok(AttributeGroupResponse::group(attributes))
    }

    async fn update(&self, id: AttributeId, request: UpdateAttributeRequest) -> CatalogResult<AttributeResponse> {
        debug!("Updating attribute: {}", id);
        request.validate_request()?;

        let mut attribute = self.find(id).await?;

        if let Some(value_type) = request.value_type.filter(|t| *t != attribute.value_type) {
            let usage = self.attributes.usage_count(id).await?;
            if usage > 0 {
                return Err(CatalogError::conflict(format!(
                    "Cannot change the type of attribute '{}': {usage} products hold a value",
                    attribute.name
                )));
            }
            attribute.value_type = value_type;
        }

        let name = request.name.unwrap_or_else(|| attribute.name.clone());
        let slug = match request.slug.as_deref() {
            Some(slug) => resolve_slug(Some(slug), &name)?,
            None => attribute.slug.clone(),
        };
        if name != attribute.name || slug != attribute.slug {
            self.ensure_unique(&name, slug.as_str(), Some(id)).await?;
        }
        attribute.name = name;
        attribute.slug = slug;

        if let Some(description) = request.description {
            attribute.description = Some(description);
        }
        if let Some(rules) = request.rules {
            attribute.rules = rules;
        }
        if let Some(default_value) = request.default_value {
            attribute.default_value = Some(default_value);
        }
        if let Some(unit) = request.unit {
            attribute.unit = Some(unit);
        }
        if let Some(group_name) = request.group_name {
            attribute.group_name = Some(group_name).filter(|g| !g.trim().is_empty());
        }
        if let Some(is_required) = request.is_required {
            attribute.is_required = is_required;
        }
        if let Some(is_filterable) = request.is_filterable {
            attribute.is_filterable = is_filterable;
        }
        if let Some(is_searchable) = request.is_searchable {
            attribute.is_searchable = is_searchable;
        }
        if let Some(sort_order) = request.sort_order {
            attribute.sort_order = sort_order;
        }
        if let Some(is_active) = request.is_active {
            attribute.is_active = is_active;
        }
        attribute.validate_definition()?;
        attribute.touch();

        let updated = self.attributes.update(&attribute).await?;
        self.cache.on_attribute_changed(id, AttributeChange::Updated).await;

        info!("Attribute updated: {}", id);
        Ok(updated.into())
    }

    async fn delete(&self, id: AttributeId) -> CatalogResult<()> {
        let attribute = self.find(id).await?;

        let usage = self.attributes.usage_count(id).await?;
        if usage > 0 {
            return Err(CatalogError::conflict(format!(
                "Attribute '{}' is used by {usage} products and cannot be deleted",
                attribute.name
            )));
        }

        if !self.attributes.delete(id).await? {
            return Err(CatalogError::not_found("Attribute", id));
        }
        self.cache.on_attribute_changed(id, AttributeChange::Deleted).await;

        info!("Attribute deleted: {} ({})", id, attribute.name);
        Ok(())
    }

    async fn validate_value(&self, id: AttributeId, value: Value) -> CatalogResult<AttributeValidation> {
        let attribute = self.find(id).await?;
        Ok(attribute.validate_value(&value))
    }

    async fn stats(&self) -> CatalogResult<AttributeStatsResponse> {
        Ok(self.attributes.statistics().await?.into())
    }

    async fn assign_to_category(
        &self,
        category_id: CategoryId,
        request: AssignAttributesRequest,
    ) -> CatalogResult<Vec<CategoryAttributeResponse>> {
        request.validate_request()?;
        self.ensure_category(category_id).await?;

        let ids: Vec<AttributeId> = request.attributes.iter().map(|a| a.attribute_id).collect();
        let found = self.attributes.find_by_ids(&ids).await?;
        if let Some(missing) = ids.iter().find(|id| !found.iter().any(|a| a.id == **id)) {
            return Err(CatalogError::not_found("Attribute", missing));
        }

        let assignments: Vec<AttributeAssignment> = request.attributes.iter().map(AttributeAssignment::from).collect();
        self.attributes.assign_to_category(category_id, &assignments).await?;
        self.cache.on_category_attributes_changed().await;

        info!("Assigned {} attributes to category {}", ids.len(), category_id);
        self.category_attributes(category_id).await
    }

    async fn unassign_from_category(&self, category_id: CategoryId, attribute_id: AttributeId) -> CatalogResult<()> {
        if !self.attributes.unassign_from_category(category_id, attribute_id).await? {
            return Err(CatalogError::not_found(
                "CategoryAttribute",
                format!("{category_id}/{attribute_id}"),
            ));
        }
        self.cache.on_category_attributes_changed().await;

        info!("Attribute {} removed from category {}", attribute_id, category_id);
        Ok(())
    }

    async fn category_attributes(&self, category_id: CategoryId) -> CatalogResult<Vec<CategoryAttributeResponse>> {
        let gen = self.cache.generation(CacheNamespace::Category).await;

        let assigned: Vec<AssignedAttribute> = self
            .cache
            .cached(
                CacheNamespace::Category,
                &cache_keys::category_attributes(gen, category_id),
                self.cache.ttls().category_attributes,
                || async move {
                    self.ensure_category(category_id).await?;
                    self.attributes.find_for_category(category_id).await
                },
            )
            .await?;
        Ok(assigned.into_iter().map(CategoryAttributeResponse::from).collect())
    }
}

impl std::fmt::Debug for AttributeServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeServiceImpl").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheTtls;
    use crate::dto::AttributeAssignmentInput;
    use crate::testing::{InMemoryAttributeRepository, InMemoryCache, InMemoryCategoryRepository};
    use catalog_core::domain::{AttributeType, Category, Slug};
    use serde_json::json;

    struct Fixture {
        attributes: Arc<InMemoryAttributeRepository>,
        categories: Arc<InMemoryCategoryRepository>,
        cache: Arc<InMemoryCache>,
        coordinator: Arc<CacheCoordinator>,
        category: Category,
        service: AttributeServiceImpl,
    }

    async fn fixture() -> Fixture {
        let categories = Arc::new(InMemoryCategoryRepository::default());
        let attributes = Arc::new(InMemoryAttributeRepository::with_categories(categories.clone()));
        let cache = Arc::new(InMemoryCache::new());
        let coordinator = Arc::new(CacheCoordinator::with_ttls(cache.clone(), CacheTtls::default()));

        let category = Category::new("Laptops", Slug::new("laptops").unwrap(), None, None, 0).unwrap();
        categories.save(&category).await.unwrap();

        let service = AttributeServiceImpl::new(attributes.clone(), categories.clone(), coordinator.clone());
        Fixture {
            attributes,
            categories,
            cache,
            coordinator,
            category,
            service,
        }
    }

    async fn add_category(f: &Fixture, name: &str, parent: Option<&Category>) -> Category {
        let category = Category::new(name, Slug::from_name(name).unwrap(), None, parent, 0).unwrap();
        f.categories.save(&category).await.unwrap()
    }

    fn assign(id: AttributeId, sort_order: i32, inherit: bool) -> AttributeAssignmentInput {
        AttributeAssignmentInput {
            attribute_id: id,
            sort_order,
            inherit_to_descendants: inherit,
        }
    }

    fn create_request(name: &str, value_type: &str) -> CreateAttributeRequest {
        serde_json::from_value(json!({ "name": name, "value_type": value_type })).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let f = fixture().await;
        let created = f.service.create(create_request("Screen Size", "number")).await.unwrap();
        assert_eq!(created.slug, "screen-size");

        let fetched = f.service.get(created.id).await.unwrap();
        assert_eq!(fetched.name, "Screen Size");
        assert!(f.cache.contains(&cache_keys::attribute_by_id(created.id)));

        let by_name = f.service.get_by_name("screen size").await.unwrap();
        assert_eq!(by_name.id, created.id);
    }

    #[tokio::test]
    async fn test_create_duplicate_name() {
        let f = fixture().await;
        f.service.create(create_request("Color", "string")).await.unwrap();

        let result = f.service.create(create_request("Color", "string")).await;
        assert!(matches!(result, Err(CatalogError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_default() {
        let f = fixture().await;
        let request: CreateAttributeRequest = serde_json::from_value(json!({
            "name": "Weight",
            "value_type": "number",
            "rules": {"min_value": 0.0},
            "default_value": -5
        }))
        .unwrap();

        assert!(matches!(f.service.create(request).await, Err(CatalogError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_type_only_while_unused() {
        let f = fixture().await;
        let created = f.service.create(create_request("Capacity", "string")).await.unwrap();

        f.attributes.set_usage(created.id, 2);
        let change = UpdateAttributeRequest {
            value_type: Some(AttributeType::Number),
            ..Default::default()
        };
        assert!(matches!(
            f.service.update(created.id, change.clone()).await,
            Err(CatalogError::Conflict(_))
        ));

        f.attributes.set_usage(created.id, 0);
        let updated = f.service.update(created.id, change).await.unwrap();
        assert_eq!(updated.value_type, AttributeType::Number);
    }

    #[tokio::test]
    async fn test_update_evicts_cached_attribute() {
        let f = fixture().await;
        let created = f.service.create(create_request("Material", "string")).await.unwrap();
        f.service.get(created.id).await.unwrap();

        let rename = UpdateAttributeRequest {
            name: Some("Fabric".to_string()),
            ..Default::default()
        };
        f.service.update(created.id, rename).await.unwrap();

        assert!(!f.cache.contains(&cache_keys::attribute_by_id(created.id)));
        assert_eq!(f.service.get(created.id).await.unwrap().name, "Fabric");
    }

    #[tokio::test]
    async fn test_delete_in_use() {
        let f = fixture().await;
        let created = f.service.create(create_request("Brand", "string")).await.unwrap();
        f.attributes.set_usage(created.id, 5);

        match f.service.delete(created.id).await.unwrap_err() {
            CatalogError::Conflict(msg) => assert!(msg.contains("5 products")),
            other => panic!("Expected Conflict, got {other:?}"),
        }

        f.attributes.set_usage(created.id, 0);
        f.service.delete(created.id).await.unwrap();
        assert!(matches!(f.service.get(created.id).await, Err(CatalogError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_validate_value() {
        let f = fixture().await;
        let request: CreateAttributeRequest = serde_json::from_value(json!({
            "name": "RAM",
            "value_type": "number",
            "rules": {"min_value": 4.0, "max_value": 128.0}
        }))
        .unwrap();
        let created = f.service.create(request).await.unwrap();

        let ok = f.service.validate_value(created.id, json!("16")).await.unwrap();
        assert!(ok.is_valid);
        assert!(ok.normalized_value.unwrap().is_number());

        let too_big = f.service.validate_value(created.id, json!(512)).await.unwrap();
        assert!(!too_big.is_valid);
        assert!(!too_big.errors.is_empty());
    }

    #[tokio::test]
    async fn test_assign_and_unassign() {
        let f = fixture().await;
        let color = f.service.create(create_request("Color", "string")).await.unwrap();
        let weight = f.service.create(create_request("Weight", "number")).await.unwrap();

        assert!(f.service.category_attributes(f.category.id).await.unwrap().is_empty());

        let assigned = f
            .service
            .assign_to_category(
                f.category.id,
                AssignAttributesRequest {
                    attributes: vec![
                        AttributeAssignmentInput {
                            attribute_id: weight.id,
                            sort_order: 2,
                            inherit_to_descendants: false,
                        },
                        AttributeAssignmentInput {
                            attribute_id: color.id,
                            sort_order: 1,
                            inherit_to_descendants: false,
                        },
                    ],
                },
            )
            .await
            .unwrap();
        assert_eq!(assigned.len(), 2);
        assert_eq!(assigned[0].attribute.id, color.id);

        f.service.unassign_from_category(f.category.id, color.id).await.unwrap();
        let remaining = f.service.category_attributes(f.category.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].attribute.id, weight.id);

        assert!(matches!(
            f.service.unassign_from_category(f.category.id, color.id).await,
            Err(CatalogError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_descendants_see_only_inheritable_assignments() {
        let f = fixture().await;
        let gaming = add_category(&f, "Gaming Laptops", Some(&f.category)).await;
        let plain = f.service.create(create_request("Plain", "string")).await.unwrap();
        let inherited = f.service.create(create_request("Inherited", "string")).await.unwrap();

        f.service
            .assign_to_category(
                f.category.id,
                AssignAttributesRequest {
                    attributes: vec![assign(plain.id, 1, false), assign(inherited.id, 2, true)],
                },
            )
            .await
            .unwrap();

        let own = f.service.category_attributes(f.category.id).await.unwrap();
        assert_eq!(own.len(), 2);
        assert!(own.iter().all(|a| !a.is_inherited));

        let child = f.service.category_attributes(gaming.id).await.unwrap();
        assert_eq!(child.len(), 1);
        assert_eq!(child[0].attribute.id, inherited.id);
        assert!(child[0].is_inherited);
        assert_eq!(child[0].category_id, gaming.id);
    }

    #[tokio::test]
    async fn test_own_assignment_overrides_inherited() {
        let f = fixture().await;
        let gaming = add_category(&f, "Gaming Laptops", Some(&f.category)).await;
        let gpu = f.service.create(create_request("GPU", "string")).await.unwrap();

        f.service
            .assign_to_category(f.category.id, AssignAttributesRequest { attributes: vec![assign(gpu.id, 5, true)] })
            .await
            .unwrap();
        f.service
            .assign_to_category(gaming.id, AssignAttributesRequest { attributes: vec![assign(gpu.id, 1, false)] })
            .await
            .unwrap();

        let child = f.service.category_attributes(gaming.id).await.unwrap();
        assert_eq!(child.len(), 1);
        assert!(!child[0].is_inherited);
        assert_eq!(child[0].sort_order, 1);
    }

    #[tokio::test]
    async fn test_inheritance_follows_moves_and_unassign() {
        let f = fixture().await;
        let other_root = add_category(&f, "Tablets", None).await;
        let gaming = add_category(&f, "Gaming Laptops", Some(&f.category)).await;
        let screen = f.service.create(create_request("Screen", "number")).await.unwrap();
        let stylus = f.service.create(create_request("Stylus", "boolean")).await.unwrap();

        f.service
            .assign_to_category(f.category.id, AssignAttributesRequest { attributes: vec![assign(screen.id, 0, true)] })
            .await
            .unwrap();
        f.service
            .assign_to_category(other_root.id, AssignAttributesRequest { attributes: vec![assign(stylus.id, 0, true)] })
            .await
            .unwrap();
        assert_eq!(f.service.category_attributes(gaming.id).await.unwrap()[0].attribute.id, screen.id);

        let moved = f.categories.move_subtree(gaming.id, Some(other_root.id)).await.unwrap();
        f.coordinator.on_categories_moved(&moved).await;

        let after_move = f.service.category_attributes(gaming.id).await.unwrap();
        assert_eq!(after_move.len(), 1);
        assert_eq!(after_move[0].attribute.id, stylus.id);

        f.service.unassign_from_category(other_root.id, stylus.id).await.unwrap();
        assert!(f.service.category_attributes(gaming.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_assignment_bumps_category_generation_once() {
        let f = fixture().await;
        let mut inputs = Vec::new();
        for name in ["CPU", "RAM", "SSD"] {
            let created = f.service.create(create_request(name, "string")).await.unwrap();
            inputs.push(assign(created.id, 0, false));
        }
        let before = f.coordinator.generation(CacheNamespace::Category).await;

        f.service
            .assign_to_category(f.category.id, AssignAttributesRequest { attributes: inputs })
            .await
            .unwrap();
        assert_eq!(f.coordinator.generation(CacheNamespace::Category).await, before + 1);
    }

    #[tokio::test]
    async fn test_groups_and_group_filter() {
        let f = fixture().await;
        let with_group = |name: &str, group: &str| -> CreateAttributeRequest {
            serde_json::from_value(json!({ "name": name, "value_type": "number", "group_name": group })).unwrap()
        };
        f.service.create(with_group("Width", "Dimensions")).await.unwrap();
        f.service.create(with_group("Height", "Dimensions")).await.unwrap();
        f.service.create(create_request("Brand", "string")).await.unwrap();

        let groups = f.service.groups().await.unwrap();
        assert_eq!(groups.len(), 2);
        let dimensions = groups.iter().find(|g| g.group_name == "Dimensions").unwrap();
        assert_eq!(dimensions.attributes.len(), 2);
        assert!(groups.iter().any(|g| g.group_name == "Default" && g.attributes[0].name == "Brand"));

        let query = AttributeListQuery {
            group_name: Some("Dimensions".to_string()),
            ..Default::default()
        };
        let page = f
            .service
            .list(query, PageRequest::new(0, 20), Sort::default())
            .await
            .unwrap();
        assert_eq!(page.content.len(), 2);
    }

    #[tokio::test]
    async fn test_assign_to_missing_category_or_attribute() {
        let f = fixture().await;
        let color = f.service.create(create_request("Color", "string")).await.unwrap();
        let input = |id| AssignAttributesRequest {
            attributes: vec![AttributeAssignmentInput {
                attribute_id: id,
                sort_order: 0,
                inherit_to_descendants: false,
            }],
        };

        assert!(matches!(
            f.service.assign_to_category(CategoryId::new(), input(color.id)).await,
            Err(CatalogError::NotFound { resource_type: "Category", .. })
        ));
        assert!(matches!(
            f.service.assign_to_category(f.category.id, input(AttributeId::new())).await,
            Err(CatalogError::NotFound { resource_type: "Attribute", .. })
        ));
    }
}
