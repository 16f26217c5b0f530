//! Repository trait definitions and the query/statistics types they exchange.

use async_trait::async_trait;
use catalog_core::domain::{
    Attribute, AttributeType, Category, CategoryAttribute, CategoryPath, Product, ProductAttributeValue,
    ProductStatus, Role, User,
};
use catalog_core::{
    AttributeId, AttributeSortField, CatalogResult, CategoryId, Page, PageRequest, ProductId, ProductSortField,
    Sort, UserId,
};
use serde::{Deserialize, Serialize};

/// Category repository over the `ltree` hierarchy.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn find_by_id(&self, id: CategoryId) -> CatalogResult<Option<Category>>;

    async fn find_by_slug(&self, slug: &str) -> CatalogResult<Option<Category>>;

    /// All categories ordered by path, optionally active only and filtered by
    /// a name/description search term.
    async fn find_all(&self, active_only: bool, search: Option<&str>) -> CatalogResult<Vec<Category>>;

    async fn find_roots(&self) -> CatalogResult<Vec<Category>>;

    async fn find_children(&self, id: CategoryId) -> CatalogResult<Vec<Category>>;

    /// Strict descendants of `path`, ordered by path.
    async fn find_descendants(&self, path: &CategoryPath) -> CatalogResult<Vec<Category>>;

    /// Strict ancestors of `path`, root first.
    async fn find_ancestors(&self, path: &CategoryPath) -> CatalogResult<Vec<Category>>;

    async fn exists_by_slug(&self, slug: &str, exclude: Option<CategoryId>) -> CatalogResult<bool>;

    async fn save(&self, category: &Category) -> CatalogResult<Category>;

    async fn update(&self, category: &Category) -> CatalogResult<Category>;

    /// Re-parents `id` and rewrites the path of it and every descendant in
    /// one transaction.
    ///
    /// The moved row and the new parent are locked and re-read inside the
    /// transaction; moving under the category itself or one of its
    /// descendants fails with `BusinessRule`. Returns the moved subtree with
    /// its new paths, the moved category first.
    async fn move_subtree(&self, id: CategoryId, new_parent_id: Option<CategoryId>) -> CatalogResult<Vec<Category>>;

    async fn delete(&self, id: CategoryId) -> CatalogResult<bool>;

    async fn count_children(&self, id: CategoryId) -> CatalogResult<i64>;

    async fn count_products(&self, id: CategoryId) -> CatalogResult<i64>;
}

/// Filters for the plain product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatus>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Case-insensitive match over name, description and SKU.
    pub search: Option<String>,
    pub sku: Option<String>,
    pub is_featured: Option<bool>,
}

/// Criteria for product search; category ids are expanded to their subtrees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductSearchCriteria {
    pub query: Option<String>,
    pub category_ids: Vec<CategoryId>,
    pub statuses: Vec<ProductStatus>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryProductCount {
    pub category_id: CategoryId,
    pub category_name: String,
    pub product_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStatistics {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub archived: i64,
    pub featured: i64,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub average_price: Option<i64>,
    /// Top categories by product count.
    pub by_category: Vec<CategoryProductCount>,
}

/// Product repository.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Loads a product together with its attribute values.
    async fn find_by_id(&self, id: ProductId) -> CatalogResult<Option<Product>>;

    async fn find_by_sku(&self, sku: &str) -> CatalogResult<Option<Product>>;

    async fn find_by_ids(&self, ids: &[ProductId]) -> CatalogResult<Vec<Product>>;

    async fn exists_by_sku(&self, sku: &str, exclude: Option<ProductId>) -> CatalogResult<bool>;

    async fn exists_by_slug(&self, slug: &str, exclude: Option<ProductId>) -> CatalogResult<bool>;

    async fn find_all(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
        sort: Sort<ProductSortField>,
    ) -> CatalogResult<Page<Product>>;

    async fn search(
        &self,
        criteria: &ProductSearchCriteria,
        page: PageRequest,
        sort: Sort<ProductSortField>,
    ) -> CatalogResult<Page<Product>>;

    async fn find_by_category(&self, id: CategoryId, include_descendants: bool) -> CatalogResult<Vec<Product>>;

    /// Active featured products.
    async fn find_featured(&self, limit: u32) -> CatalogResult<Vec<Product>>;

    /// Inserts the product and its attribute values.
    async fn save(&self, product: &Product) -> CatalogResult<Product>;

    /// Updates product columns; attribute values are left untouched.
    async fn update(&self, product: &Product) -> CatalogResult<Product>;

    async fn delete(&self, id: ProductId) -> CatalogResult<bool>;

    async fn bulk_update_status(&self, ids: &[ProductId], status: ProductStatus) -> CatalogResult<u64>;

    async fn bulk_delete(&self, ids: &[ProductId]) -> CatalogResult<u64>;

    async fn statistics(&self) -> CatalogResult<ProductStatistics>;

    /// Replaces every attribute value of the product.
    async fn set_attribute_values(&self, id: ProductId, values: &[ProductAttributeValue]) -> CatalogResult<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeFilter {
    pub value_type: Option<AttributeType>,
    pub is_required: Option<bool>,
    pub is_filterable: Option<bool>,
    pub is_searchable: Option<bool>,
    pub is_active: Option<bool>,
    pub group_name: Option<String>,
    /// Case-insensitive match over name and description.
    pub search: Option<String>,
}

/// One attribute to attach to a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeAssignment {
    pub attribute_id: AttributeId,
    pub sort_order: i32,
    /// Descendant categories see the attribute as inherited.
    pub inherit_to_descendants: bool,
}

/// An attribute as seen from a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedAttribute {
    pub attribute: Attribute,
    pub link: CategoryAttribute,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeUsage {
    pub attribute_id: AttributeId,
    pub name: String,
    pub usage_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeStatistics {
    pub total: i64,
    /// Count per value type, keyed by the type name.
    pub by_type: Vec<(String, i64)>,
    pub required: i64,
    pub filterable: i64,
    pub searchable: i64,
    pub most_used: Vec<AttributeUsage>,
}

/// Attribute repository.
#[async_trait]
pub trait AttributeRepository: Send + Sync {
    async fn find_by_id(&self, id: AttributeId) -> CatalogResult<Option<Attribute>>;

    async fn find_by_name(&self, name: &str) -> CatalogResult<Option<Attribute>>;

    async fn find_by_slug(&self, slug: &str) -> CatalogResult<Option<Attribute>>;

    async fn find_by_ids(&self, ids: &[AttributeId]) -> CatalogResult<Vec<Attribute>>;

    async fn find_all(
        &self,
        filter: &AttributeFilter,
        page: PageRequest,
        sort: Sort<AttributeSortField>,
    ) -> CatalogResult<Page<Attribute>>;

    async fn save(&self, attribute: &Attribute) -> CatalogResult<Attribute>;

    async fn update(&self, attribute: &Attribute) -> CatalogResult<Attribute>;

    async fn delete(&self, id: AttributeId) -> CatalogResult<bool>;

    /// Number of products holding a value for the attribute.
    async fn usage_count(&self, id: AttributeId) -> CatalogResult<i64>;

    /// Every attribute ordered by group, sort order and name.
    async fn find_all_by_group(&self) -> CatalogResult<Vec<Attribute>>;

    /// Number of categories the attribute is directly assigned to.
    async fn categories_count(&self, id: AttributeId) -> CatalogResult<i64>;

    /// Upserts the assignments in one transaction.
    async fn assign_to_category(
        &self,
        category_id: CategoryId,
        assignments: &[AttributeAssignment],
    ) -> CatalogResult<()>;

    /// Removes the category's own assignment. Descendants stop inheriting it.
    async fn unassign_from_category(&self, category_id: CategoryId, attribute_id: AttributeId) -> CatalogResult<bool>;

    /// Active attributes assigned to the category itself plus those assigned
    /// to an ancestor with `inherit_to_descendants`. When several levels
    /// assign the same attribute the nearest wins. Ordered by sort order.
    async fn find_for_category(&self, category_id: CategoryId) -> CatalogResult<Vec<AssignedAttribute>>;

    async fn statistics(&self) -> CatalogResult<AttributeStatistics>;
}

/// User repository.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by ID, roles included.
    async fn find_by_id(&self, id: UserId) -> CatalogResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> CatalogResult<Option<User>>;

    /// Case-insensitive.
    async fn find_by_email(&self, email: &str) -> CatalogResult<Option<User>>;

    async fn find_by_username_or_email(&self, identifier: &str) -> CatalogResult<Option<User>>;

    async fn exists_by_username(&self, username: &str) -> CatalogResult<bool>;

    async fn exists_by_email(&self, email: &str) -> CatalogResult<bool>;

    /// Inserts the user and links the roles it carries.
    async fn save(&self, user: &User) -> CatalogResult<User>;

    async fn update(&self, user: &User) -> CatalogResult<User>;

    /// Replaces the user's roles.
    async fn assign_roles(&self, user_id: UserId, role_names: &[String]) -> CatalogResult<()>;

    /// Distinct permission names granted through the user's roles.
    async fn permissions_for(&self, user_id: UserId) -> CatalogResult<Vec<String>>;
}

/// Role repository.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_all(&self) -> CatalogResult<Vec<Role>>;

    async fn find_by_name(&self, name: &str) -> CatalogResult<Option<Role>>;
}
