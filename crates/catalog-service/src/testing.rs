//! In-memory cache and repositories shared by the service tests.

use crate::cache::CacheInterface;
use async_trait::async_trait;
use catalog_core::domain::{
    Attribute, Category, CategoryAttribute, CategoryPath, Product, ProductAttributeValue, ProductStatus, Role, RoleName,
    User,
};
use catalog_core::{
    AttributeId, AttributeSortField, CatalogError, CatalogResult, CategoryId, Page, PageRequest, ProductId,
    ProductSortField, RoleId, Sort, UserId,
};
use catalog_repository::{
    AssignedAttribute, AttributeAssignment, AttributeFilter, AttributeRepository, AttributeStatistics,
    CategoryRepository, ProductFilter, ProductRepository, ProductSearchCriteria, ProductStatistics, RoleRepository,
    UserRepository,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn page_of<T: Clone>(items: &[T], page: PageRequest) -> Page<T> {
    let content = items.iter().skip(page.offset()).take(page.limit()).cloned().collect();
    Page::new(content, page.page, page.size, items.len() as u64)
}

/// Redis-style glob: `*`, `?` and `[...]` with `^`/`!` negation.
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some(b'*') => (0..=text.len()).any(|i| glob_match(&pattern[1..], &text[i..])),
        Some(b'?') => !text.is_empty() && glob_match(&pattern[1..], &text[1..]),
        Some(b'[') => {
            let Some(end) = pattern.iter().position(|&c| c == b']') else {
                return false;
            };
            let Some(&c) = text.first() else {
                return false;
            };
            let class = &pattern[1..end];
            let (negated, class) = match class.first() {
                Some(b'^' | b'!') => (true, &class[1..]),
                _ => (false, class),
            };
            class.contains(&c) != negated && glob_match(&pattern[end + 1..], &text[1..])
        }
        Some(&p) => text.first() == Some(&p) && glob_match(&pattern[1..], &text[1..]),
    }
}

/// Cache backed by a `HashMap`; TTLs are ignored.
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every operation fail with a cache error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries.lock().unwrap().insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries.lock().unwrap().keys().filter(|k| k.starts_with(prefix)).count()
    }

    fn check(&self) -> CatalogResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CatalogError::cache("connection refused"))
        } else {
            Ok(())
        }
    }

    fn matching(&self, pattern: &str) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .keys()
            .filter(|k| glob_match(pattern.as_bytes(), k.as_bytes()))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CacheInterface for InMemoryCache {
    async fn get_raw(&self, key: &str) -> CatalogResult<Option<String>> {
        self.check()?;
        Ok(self.raw(key))
    }

    async fn set_raw(&self, key: &str, value: &str, _ttl: Duration) -> CatalogResult<()> {
        self.check()?;
        self.insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> CatalogResult<bool> {
        self.check()?;
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }

    async fn delete_many(&self, keys: &[String]) -> CatalogResult<u64> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        Ok(keys.iter().filter(|k| entries.remove(*k).is_some()).count() as u64)
    }

    async fn exists(&self, key: &str) -> CatalogResult<bool> {
        self.check()?;
        Ok(self.contains(key))
    }

    async fn delete_pattern(&self, pattern: &str) -> CatalogResult<u64> {
        self.check()?;
        let keys = self.matching(pattern);
        let mut entries = self.entries.lock().unwrap();
        Ok(keys.iter().filter(|k| entries.remove(*k).is_some()).count() as u64)
    }

    async fn count_pattern(&self, pattern: &str) -> CatalogResult<u64> {
        self.check()?;
        Ok(self.matching(pattern).len() as u64)
    }

    async fn incr(&self, key: &str) -> CatalogResult<u64> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        let next = entries.get(key).and_then(|v| v.parse::<u64>().ok()).unwrap_or(0) + 1;
        entries.insert(key.to_string(), next.to_string());
        Ok(next)
    }

    async fn get_counter(&self, key: &str) -> CatalogResult<u64> {
        self.check()?;
        Ok(self.raw(key).and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    async fn ping(&self) -> CatalogResult<()> {
        self.check()
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

// ============ Categories ============

#[derive(Default)]
pub struct InMemoryCategoryRepository {
    categories: Mutex<HashMap<CategoryId, Category>>,
    product_counts: Mutex<HashMap<CategoryId, i64>>,
    pub find_calls: AtomicUsize,
}

impl InMemoryCategoryRepository {
    pub fn set_product_count(&self, id: CategoryId, count: i64) {
        self.product_counts.lock().unwrap().insert(id, count);
    }

    pub fn get(&self, id: CategoryId) -> Option<Category> {
        self.categories.lock().unwrap().get(&id).cloned()
    }

    fn sorted(&self, filter: impl Fn(&Category) -> bool) -> Vec<Category> {
        let mut result: Vec<Category> = self
            .categories
            .lock()
            .unwrap()
            .values()
            .filter(|c| filter(c))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.path.as_str().cmp(b.path.as_str()));
        result
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: CategoryId) -> CatalogResult<Option<Category>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(id))
    }

    async fn find_by_slug(&self, slug: &str) -> CatalogResult<Option<Category>> {
        Ok(self.sorted(|c| c.slug.as_str() == slug).into_iter().next())
    }

    async fn find_all(&self, active_only: bool, search: Option<&str>) -> CatalogResult<Vec<Category>> {
        let search = search.map(str::to_lowercase);
        Ok(self.sorted(|c| {
            (!active_only || c.is_active)
                && search.as_ref().map_or(true, |s| c.name.to_lowercase().contains(s))
        }))
    }

    async fn find_roots(&self) -> CatalogResult<Vec<Category>> {
        Ok(self.sorted(|c| c.parent_id.is_none()))
    }

    async fn find_children(&self, id: CategoryId) -> CatalogResult<Vec<Category>> {
        Ok(self.sorted(|c| c.parent_id == Some(id)))
    }

    async fn find_descendants(&self, path: &CategoryPath) -> CatalogResult<Vec<Category>> {
        Ok(self.sorted(|c| c.path.is_descendant_of(path)))
    }

    async fn find_ancestors(&self, path: &CategoryPath) -> CatalogResult<Vec<Category>> {
        Ok(self.sorted(|c| c.path.is_ancestor_of(path)))
    }

    async fn exists_by_slug(&self, slug: &str, exclude: Option<CategoryId>) -> CatalogResult<bool> {
        Ok(!self.sorted(|c| c.slug.as_str() == slug && Some(c.id) != exclude).is_empty())
    }

    async fn save(&self, category: &Category) -> CatalogResult<Category> {
        if self.exists_by_slug(category.slug.as_str(), None).await? {
            return Err(CatalogError::conflict("duplicate key value violates unique constraint"));
        }
        self.categories.lock().unwrap().insert(category.id, category.clone());
        Ok(category.clone())
    }

    async fn update(&self, category: &Category) -> CatalogResult<Category> {
        let mut categories = self.categories.lock().unwrap();
        if !categories.contains_key(&category.id) {
            return Err(CatalogError::not_found("Category", category.id));
        }
        categories.insert(category.id, category.clone());
        Ok(category.clone())
    }

    async fn move_subtree(&self, id: CategoryId, new_parent_id: Option<CategoryId>) -> CatalogResult<Vec<Category>> {
        let mut categories = self.categories.lock().unwrap();
        let mut category = categories
            .get(&id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found("Category", id))?;
        let parent = match new_parent_id {
            Some(parent_id) => Some(
                categories
                    .get(&parent_id)
                    .cloned()
                    .ok_or_else(|| CatalogError::not_found("Category", parent_id))?,
            ),
            None => None,
        };

        let old_path = category.path.clone();
        category.move_under(parent.as_ref())?;

        let mut moved = Vec::new();
        for existing in categories.values_mut() {
            if existing.id == id {
                *existing = category.clone();
            } else if let Some(path) = existing.path.rebase(&old_path, &category.path) {
                existing.path = path;
            } else {
                continue;
            }
            moved.push(existing.clone());
        }
        moved.sort_by(|a, b| a.path.depth().cmp(&b.path.depth()).then_with(|| a.path.as_str().cmp(b.path.as_str())));
        Ok(moved)
    }

    async fn delete(&self, id: CategoryId) -> CatalogResult<bool> {
        Ok(self.categories.lock().unwrap().remove(&id).is_some())
    }

    async fn count_children(&self, id: CategoryId) -> CatalogResult<i64> {
        Ok(self.sorted(|c| c.parent_id == Some(id)).len() as i64)
    }

    async fn count_products(&self, id: CategoryId) -> CatalogResult<i64> {
        Ok(self.product_counts.lock().unwrap().get(&id).copied().unwrap_or(0))
    }
}

// ============ Products ============

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: Mutex<HashMap<ProductId, Product>>,
    pub find_calls: AtomicUsize,
}

impl InMemoryProductRepository {
    pub fn get(&self, id: ProductId) -> Option<Product> {
        self.products.lock().unwrap().get(&id).cloned()
    }

    fn sorted(&self, filter: impl Fn(&Product) -> bool) -> Vec<Product> {
        let mut result: Vec<Product> = self
            .products
            .lock()
            .unwrap()
            .values()
            .filter(|p| filter(p))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: ProductId) -> CatalogResult<Option<Product>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(id))
    }

    async fn find_by_sku(&self, sku: &str) -> CatalogResult<Option<Product>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.sorted(|p| p.sku.as_str() == sku).into_iter().next())
    }

    async fn find_by_ids(&self, ids: &[ProductId]) -> CatalogResult<Vec<Product>> {
        Ok(self.sorted(|p| ids.contains(&p.id)))
    }

    async fn exists_by_sku(&self, sku: &str, exclude: Option<ProductId>) -> CatalogResult<bool> {
        Ok(!self.sorted(|p| p.sku.as_str() == sku && Some(p.id) != exclude).is_empty())
    }

    async fn exists_by_slug(&self, slug: &str, exclude: Option<ProductId>) -> CatalogResult<bool> {
        Ok(!self.sorted(|p| p.slug.as_str() == slug && Some(p.id) != exclude).is_empty())
    }

    async fn find_all(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
        _sort: Sort<ProductSortField>,
    ) -> CatalogResult<Page<Product>> {
        let items = self.sorted(|p| {
            filter.category_id.map_or(true, |c| p.category_id == c)
                && filter.status.map_or(true, |s| p.status == s)
                && filter.min_price.map_or(true, |m| p.price.amount_minor >= m)
                && filter.max_price.map_or(true, |m| p.price.amount_minor <= m)
                && filter.is_featured.map_or(true, |f| p.is_featured == f)
                && filter
                    .search
                    .as_ref()
                    .map_or(true, |s| p.name.to_lowercase().contains(&s.to_lowercase()))
        });
        Ok(page_of(&items, page))
    }

    async fn search(
        &self,
        criteria: &ProductSearchCriteria,
        page: PageRequest,
        _sort: Sort<ProductSortField>,
    ) -> CatalogResult<Page<Product>> {
        let items = self.sorted(|p| {
            (criteria.category_ids.is_empty() || criteria.category_ids.contains(&p.category_id))
                && (criteria.statuses.is_empty() || criteria.statuses.contains(&p.status))
                && criteria
                    .query
                    .as_ref()
                    .map_or(true, |q| p.name.to_lowercase().contains(&q.to_lowercase()))
        });
        Ok(page_of(&items, page))
    }

    async fn find_by_category(&self, id: CategoryId, _include_descendants: bool) -> CatalogResult<Vec<Product>> {
        Ok(self.sorted(|p| p.category_id == id))
    }

    async fn find_featured(&self, limit: u32) -> CatalogResult<Vec<Product>> {
        Ok(self
            .sorted(|p| p.is_featured && p.status == ProductStatus::Active)
            .into_iter()
            .take(limit as usize)
            .collect())
    }

    async fn save(&self, product: &Product) -> CatalogResult<Product> {
        self.products.lock().unwrap().insert(product.id, product.clone());
        Ok(product.clone())
    }

    async fn update(&self, product: &Product) -> CatalogResult<Product> {
        let mut products = self.products.lock().unwrap();
        let Some(existing) = products.get(&product.id) else {
            return Err(CatalogError::not_found("Product", product.id));
        };
        let mut updated = product.clone();
        updated.attributes = existing.attributes.clone();
        products.insert(product.id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: ProductId) -> CatalogResult<bool> {
        Ok(self.products.lock().unwrap().remove(&id).is_some())
    }

    async fn bulk_update_status(&self, ids: &[ProductId], status: ProductStatus) -> CatalogResult<u64> {
        let mut products = self.products.lock().unwrap();
        let mut count = 0;
        for id in ids {
            if let Some(product) = products.get_mut(id) {
                product.status = status;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn bulk_delete(&self, ids: &[ProductId]) -> CatalogResult<u64> {
        let mut products = self.products.lock().unwrap();
        Ok(ids.iter().filter(|id| products.remove(id).is_some()).count() as u64)
    }

    async fn statistics(&self) -> CatalogResult<ProductStatistics> {
        let products = self.sorted(|_| true);
        let count = |status: ProductStatus| products.iter().filter(|p| p.status == status).count() as i64;
        Ok(ProductStatistics {
            total: products.len() as i64,
            active: count(ProductStatus::Active),
            inactive: count(ProductStatus::Inactive),
            archived: count(ProductStatus::Archived),
            featured: products.iter().filter(|p| p.is_featured).count() as i64,
            min_price: products.iter().map(|p| p.price.amount_minor).min(),
            max_price: products.iter().map(|p| p.price.amount_minor).max(),
            average_price: None,
            by_category: Vec::new(),
        })
    }

    async fn set_attribute_values(&self, id: ProductId, values: &[ProductAttributeValue]) -> CatalogResult<()> {
        let mut products = self.products.lock().unwrap();
        let product = products.get_mut(&id).ok_or_else(|| CatalogError::not_found("Product", id))?;
        product.attributes = values.to_vec();
        Ok(())
    }
}

// ============ Attributes ============

/// Own assignments only; inheritance is resolved from `categories` on read.
#[derive(Default)]
pub struct InMemoryAttributeRepository {
    attributes: Mutex<HashMap<AttributeId, Attribute>>,
    links: Mutex<Vec<CategoryAttribute>>,
    usage: Mutex<HashMap<AttributeId, i64>>,
    categories: Option<Arc<InMemoryCategoryRepository>>,
}

impl InMemoryAttributeRepository {
    /// Resolves inherited assignments through the given category tree.
    pub fn with_categories(categories: Arc<InMemoryCategoryRepository>) -> Self {
        Self {
            categories: Some(categories),
            ..Self::default()
        }
    }

    pub fn set_usage(&self, id: AttributeId, count: i64) {
        self.usage.lock().unwrap().insert(id, count);
    }

    pub fn links(&self) -> Vec<CategoryAttribute> {
        self.links.lock().unwrap().clone()
    }

    fn sorted(&self, filter: impl Fn(&Attribute) -> bool) -> Vec<Attribute> {
        let mut result: Vec<Attribute> = self
            .attributes
            .lock()
            .unwrap()
            .values()
            .filter(|a| filter(a))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        result
    }
}

#[async_trait]
impl AttributeRepository for InMemoryAttributeRepository {
    async fn find_by_id(&self, id: AttributeId) -> CatalogResult<Option<Attribute>> {
        Ok(self.attributes.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> CatalogResult<Option<Attribute>> {
        Ok(self.sorted(|a| a.name.eq_ignore_ascii_case(name)).into_iter().next())
    }

    async fn find_by_slug(&self, slug: &str) -> CatalogResult<Option<Attribute>> {
        Ok(self.sorted(|a| a.slug.as_str() == slug).into_iter().next())
    }

    async fn find_by_ids(&self, ids: &[AttributeId]) -> CatalogResult<Vec<Attribute>> {
        Ok(self.sorted(|a| ids.contains(&a.id)))
    }

    async fn find_all(
        &self,
        filter: &AttributeFilter,
        page: PageRequest,
        _sort: Sort<AttributeSortField>,
    ) -> CatalogResult<Page<Attribute>> {
        let items = self.sorted(|a| {
            filter.value_type.map_or(true, |t| a.value_type == t)
                && filter.is_required.map_or(true, |r| a.is_required == r)
                && filter.is_active.map_or(true, |r| a.is_active == r)
                && filter.group_name.as_ref().map_or(true, |g| a.group_name.as_ref() == Some(g))
        });
        Ok(page_of(&items, page))
    }

    async fn find_all_by_group(&self) -> CatalogResult<Vec<Attribute>> {
        let mut attributes = self.sorted(|_| true);
        attributes.sort_by(|a, b| {
            a.group_name
                .cmp(&b.group_name)
                .then_with(|| a.sort_order.cmp(&b.sort_order))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(attributes)
    }

    async fn save(&self, attribute: &Attribute) -> CatalogResult<Attribute> {
        self.attributes.lock().unwrap().insert(attribute.id, attribute.clone());
        Ok(attribute.clone())
    }

    async fn update(&self, attribute: &Attribute) -> CatalogResult<Attribute> {
        self.attributes.lock().unwrap().insert(attribute.id, attribute.clone());
        Ok(attribute.clone())
    }

    async fn delete(&self, id: AttributeId) -> CatalogResult<bool> {
        self.links.lock().unwrap().retain(|l| l.attribute_id != id);
        Ok(self.attributes.lock().unwrap().remove(&id).is_some())
    }

    async fn usage_count(&self, id: AttributeId) -> CatalogResult<i64> {
        Ok(self.usage.lock().unwrap().get(&id).copied().unwrap_or(0))
    }

    async fn categories_count(&self, id: AttributeId) -> CatalogResult<i64> {
        Ok(self.links.lock().unwrap().iter().filter(|l| l.attribute_id == id).count() as i64)
    }

    async fn assign_to_category(
        &self,
        category_id: CategoryId,
        assignments: &[AttributeAssignment],
    ) -> CatalogResult<()> {
        let mut links = self.links.lock().unwrap();
        for assignment in assignments {
            links.retain(|l| !(l.category_id == category_id && l.attribute_id == assignment.attribute_id));
            links.push(CategoryAttribute {
                category_id,
                attribute_id: assignment.attribute_id,
                is_inherited: false,
                inherit_to_descendants: assignment.inherit_to_descendants,
                sort_order: assignment.sort_order,
            });
        }
        Ok(())
    }

    async fn unassign_from_category(&self, category_id: CategoryId, attribute_id: AttributeId) -> CatalogResult<bool> {
        let mut links = self.links.lock().unwrap();
        let before = links.len();
        links.retain(|l| !(l.category_id == category_id && l.attribute_id == attribute_id));
        Ok(links.len() != before)
    }

    async fn find_for_category(&self, category_id: CategoryId) -> CatalogResult<Vec<AssignedAttribute>> {
        // Nearest level first: the category itself, then its parent, and so on.
        let mut levels = vec![category_id];
        if let Some(categories) = &self.categories {
            if let Some(target) = categories.get(category_id) {
                let mut ancestors = categories.find_ancestors(&target.path).await?;
                ancestors.reverse();
                levels.extend(ancestors.into_iter().map(|c| c.id));
            }
        }

        let links = self.links.lock().unwrap().clone();
        let attributes = self.attributes.lock().unwrap();
        let mut assigned: Vec<AssignedAttribute> = Vec::new();
        for (depth, level) in levels.iter().enumerate() {
            for link in links.iter().filter(|l| l.category_id == *level) {
                let inherited = depth > 0;
                if inherited && !link.inherit_to_descendants {
                    continue;
                }
                if assigned.iter().any(|a| a.attribute.id == link.attribute_id) {
                    continue;
                }
                let Some(attribute) = attributes.get(&link.attribute_id).filter(|a| a.is_active) else {
                    continue;
                };
                assigned.push(AssignedAttribute {
                    attribute: attribute.clone(),
                    link: CategoryAttribute {
                        category_id,
                        is_inherited: inherited,
                        ..link.clone()
                    },
                });
            }
        }
        assigned.sort_by(|a, b| {
            a.link
                .sort_order
                .cmp(&b.link.sort_order)
                .then_with(|| a.attribute.name.cmp(&b.attribute.name))
        });
        Ok(assigned)
    }

    async fn statistics(&self) -> CatalogResult<AttributeStatistics> {
        let attributes = self.sorted(|_| true);
        Ok(AttributeStatistics {
            total: attributes.len() as i64,
            required: attributes.iter().filter(|a| a.is_required).count() as i64,
            ..Default::default()
        })
    }
}

// ============ Users and roles ============

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn get(&self, id: UserId) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    fn find(&self, filter: impl Fn(&User) -> bool) -> Option<User> {
        self.users.lock().unwrap().values().find(|u| filter(u)).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> CatalogResult<Option<User>> {
        Ok(self.get(id))
    }

    async fn find_by_username(&self, username: &str) -> CatalogResult<Option<User>> {
        Ok(self.find(|u| u.username == username))
    }

    async fn find_by_email(&self, email: &str) -> CatalogResult<Option<User>> {
        Ok(self.find(|u| u.email.as_str().eq_ignore_ascii_case(email)))
    }

    async fn find_by_username_or_email(&self, identifier: &str) -> CatalogResult<Option<User>> {
        Ok(self.find(|u| u.username == identifier || u.email.as_str().eq_ignore_ascii_case(identifier)))
    }

    async fn exists_by_username(&self, username: &str) -> CatalogResult<bool> {
        Ok(self.find(|u| u.username == username).is_some())
    }

    async fn exists_by_email(&self, email: &str) -> CatalogResult<bool> {
        Ok(self.find(|u| u.email.as_str().eq_ignore_ascii_case(email)).is_some())
    }

    async fn save(&self, user: &User) -> CatalogResult<User> {
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> CatalogResult<User> {
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn assign_roles(&self, user_id: UserId, role_names: &[String]) -> CatalogResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&user_id).ok_or_else(|| CatalogError::not_found("User", user_id))?;
        user.roles = role_names.to_vec();
        Ok(())
    }

    async fn permissions_for(&self, user_id: UserId) -> CatalogResult<Vec<String>> {
        let roles = self.get(user_id).map(|u| u.roles).unwrap_or_default();
        let mut permissions: Vec<String> = roles
            .iter()
            .filter_map(|r| r.parse::<RoleName>().ok())
            .flat_map(|r| r.default_permissions().iter().map(ToString::to_string))
            .collect();
        permissions.sort();
        permissions.dedup();
        Ok(permissions)
    }
}

/// The five seeded roles.
pub struct InMemoryRoleRepository {
    roles: Vec<Role>,
}

impl Default for InMemoryRoleRepository {
    fn default() -> Self {
        let roles = RoleName::all()
            .into_iter()
            .map(|name| Role {
                id: RoleId::new(),
                name: name.to_string(),
                description: None,
                is_system: true,
                permissions: name.default_permissions().iter().map(ToString::to_string).collect(),
            })
            .collect();
        Self { roles }
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_all(&self) -> CatalogResult<Vec<Role>> {
        Ok(self.roles.clone())
    }

    async fn find_by_name(&self, name: &str) -> CatalogResult<Option<Role>> {
        Ok(self.roles.iter().find(|r| r.name == name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::glob_match;

    #[test]
    fn test_glob_match() {
        assert!(glob_match(b"catalog:*", b"catalog:product:prod:1"));
        assert!(glob_match(b"catalog:product:prod:*", b"catalog:product:prod:1"));
        assert!(!glob_match(b"catalog:product:prod:*", b"catalog:product:sku:1"));
        assert!(glob_match(b"catalog:*:[^g]*", b"catalog:category:tree:g1:full"));
        assert!(!glob_match(b"catalog:*:[^g]*", b"catalog:category:gen"));
        assert!(glob_match(b"a?c", b"abc"));
    }
}
