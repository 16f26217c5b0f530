//! Category service: hierarchy management with cache-aside reads.

use crate::cache::{cache_keys, CacheCoordinator, CacheNamespace};
use crate::dto::{
    BreadcrumbItem, CategoryListQuery, CategoryResponse, CategoryTreeNode, CreateCategoryRequest,
    MoveCategoryRequest, UpdateCategoryRequest,
};
use crate::support::resolve_slug;
use async_trait::async_trait;
use catalog_core::domain::{Category, SeoData};
use catalog_core::{CatalogError, CatalogResult, CategoryId, ValidateExt};
use catalog_repository::CategoryRepository;
use std::sync::Arc;
use tracing::{debug, info};

/// Category use cases.
#[cfg_attr(feature = "mocks", mockall::automock)]
#[async_trait]
pub trait CategoryService: Send + Sync {
    async fn create(&self, request: CreateCategoryRequest) -> CatalogResult<CategoryResponse>;

    async fn get(&self, id: CategoryId) -> CatalogResult<CategoryResponse>;

    async fn get_by_slug(&self, slug: &str) -> CatalogResult<CategoryResponse>;

    async fn list(&self, query: CategoryListQuery) -> CatalogResult<Vec<CategoryResponse>>;

    async fn roots(&self) -> CatalogResult<Vec<CategoryResponse>>;

    async fn children(&self, id: CategoryId) -> CatalogResult<Vec<CategoryResponse>>;

    /// Whole hierarchy as nested nodes.
    async fn tree(&self) -> CatalogResult<Vec<CategoryTreeNode>>;

    /// Ancestors from the root down, followed by the category itself.
    async fn breadcrumbs(&self, id: CategoryId) -> CatalogResult<Vec<BreadcrumbItem>>;

    async fn update(&self, id: CategoryId, request: UpdateCategoryRequest) -> CatalogResult<CategoryResponse>;

    /// Re-parents a category together with its subtree.
    async fn move_category(&self, id: CategoryId, request: MoveCategoryRequest) -> CatalogResult<CategoryResponse>;

    async fn delete(&self, id: CategoryId) -> CatalogResult<()>;
}

pub struct CategoryServiceImpl {
    repository: Arc<dyn CategoryRepository>,
    cache: Arc<CacheCoordinator>,
}

impl CategoryServiceImpl {
    pub fn new(repository: Arc<dyn CategoryRepository>, cache: Arc<CacheCoordinator>) -> Self {
        Self { repository, cache }
    }

    async fn load(&self, id: CategoryId) -> CatalogResult<Category> {
        let repository = &self.repository;
        self.cache
            .cached(
                CacheNamespace::Category,
                &cache_keys::category_by_id(id),
                self.cache.ttls().categories,
                || async move {
                    repository
                        .find_by_id(id)
                        .await?
                        .ok_or_else(|| CatalogError::not_found("Category", id))
                },
            )
            .await
    }

    async fn load_parent(&self, parent_id: Option<CategoryId>) -> CatalogResult<Option<Category>> {
        match parent_id {
            Some(parent_id) => Ok(Some(
                self.repository
                    .find_by_id(parent_id)
                    .await?
                    .ok_or_else(|| CatalogError::not_found("Category", parent_id))?,
            )),
            None => Ok(None),
        }
    }

    async fn ensure_slug_available(&self, slug: &str, exclude: Option<CategoryId>) -> CatalogResult<()> {
        if self.repository.exists_by_slug(slug, exclude).await? {
            return Err(CatalogError::conflict(format!("Category with slug '{slug}' already exists")));
        }
        Ok(())
    }
}

fn responses(categories: Vec<Category>) -> Vec<CategoryResponse> {
    categories.into_iter().map(CategoryResponse::from).collect()
}

#[async_trait]
impl CategoryService for CategoryServiceImpl {
    async fn create(&self, request: CreateCategoryRequest) -> CatalogResult<CategoryResponse> {
        debug!("Creating category: {}", request.name);
        request.validate_request()?;

        let slug = resolve_slug(request.slug.as_deref(), &request.name)?;
        self.ensure_slug_available(slug.as_str(), None).await?;
        let parent = self.load_parent(request.parent_id).await?;

        let mut category = Category::new(
            request.name,
            slug,
            request.description,
            parent.as_ref(),
            request.sort_order,
        )?;
        let seo = SeoData {
            title: request.meta_title,
            description: request.meta_description,
            keywords: request.meta_keywords,
        };
        if let Some(violation) = seo.violation() {
            return Err(CatalogError::validation(violation));
        }
        category.seo = seo;
        if !request.is_active {
            category.deactivate();
        }

        let saved = self.repository.save(&category).await?;
        self.cache.on_category_changed(saved.id, &[saved.slug.as_str()]).await;

        info!("Category created: {} ({})", saved.id, saved.slug);
        Ok(saved.into())
    }

    async fn get(&self, id: CategoryId) -> CatalogResult<CategoryResponse> {
        self.load(id).await.map(CategoryResponse::from)
    }

    async fn get_by_slug(&self, slug: &str) -> CatalogResult<CategoryResponse> {
        let repository = &self.repository;
        let category: Category = self
            .cache
            .cached(
                CacheNamespace::Category,
                &cache_keys::category_by_slug(slug),
                self.cache.ttls().categories,
                || async move {
                    repository
                        .find_by_slug(slug)
                        .await?
                        .ok_or_else(|| CatalogError::not_found("Category", slug))
                },
            )
            .await?;
        Ok(category.into())
    }

    async fn list(&self, query: CategoryListQuery) -> CatalogResult<Vec<CategoryResponse>> {
        let gen = self.cache.generation(CacheNamespace::Category).await;
        let key = cache_keys::category_list(gen, &cache_keys::query_hash(&query)?);
        let repository = &self.repository;
        let active_only = query.active_only;
        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let categories: Vec<Category> = self
            .cache
            .cached(CacheNamespace::Category, &key, self.cache.ttls().category_tree, || async move {
                repository.find_all(active_only, search).await
            })
            .await?;
        Ok(responses(categories))
    }

    async fn roots(&self) -> CatalogResult<Vec<CategoryResponse>> {
        Ok(responses(self.repository.find_roots().await?))
    }

    async fn children(&self, id: CategoryId) -> CatalogResult<Vec<CategoryResponse>> {
        let gen = self.cache.generation(CacheNamespace::Category).await;
        let repository = &self.repository;

        let categories: Vec<Category> = self
            .cache
            .cached(
                CacheNamespace::Category,
                &cache_keys::category_children(gen, id),
                self.cache.ttls().category_tree,
                || async move {
                    if repository.find_by_id(id).await?.is_none() {
                        return Err(CatalogError::not_found("Category", id));
                    }
                    repository.find_children(id).await
                },
            )
            .await?;
        Ok(responses(categories))
    }

    async fn tree(&self) -> CatalogResult<Vec<CategoryTreeNode>> {
        let gen = self.cache.generation(CacheNamespace::Category).await;
        let repository = &self.repository;

        self.cache
            .cached(
                CacheNamespace::Category,
                &cache_keys::category_tree(gen),
                self.cache.ttls().category_tree,
                || async move {
                    let categories = repository.find_all(false, None).await?;
                    Ok(CategoryTreeNode::build(&categories))
                },
            )
            .await
    }

    async fn breadcrumbs(&self, id: CategoryId) -> CatalogResult<Vec<BreadcrumbItem>> {
        let gen = self.cache.generation(CacheNamespace::Category).await;
        let repository = &self.repository;

        let trail: Vec<Category> = self
            .cache
            .cached(
                CacheNamespace::Category,
                &cache_keys::category_path(gen, id),
                self.cache.ttls().category_tree,
                || async move {
                    let category = repository
                        .find_by_id(id)
                        .await?
                        .ok_or_else(|| CatalogError::not_found("Category", id))?;
                    let mut trail = repository.find_ancestors(&category.path).await?;
                    trail.sort_by_key(Category::depth);
                    trail.push(category);
                    Ok(trail)
                },
            )
            .await?;
        Ok(trail.iter().map(BreadcrumbItem::from).collect())
    }

    async fn update(&self, id: CategoryId, request: UpdateCategoryRequest) -> CatalogResult<CategoryResponse> {
        debug!("Updating category: {}", id);
        request.validate_request()?;

        let mut category = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Category", id))?;
        let old_slug = category.slug.clone();

        let slug = match request.slug.as_deref() {
            Some(slug) if slug != old_slug.as_str() => {
                self.ensure_slug_available(slug, Some(id)).await?;
                Some(resolve_slug(Some(slug), &category.name)?)
            }
            _ => None,
        };
        let seo = request.merged_seo(&category.seo);

        category.update(
            request.name,
            slug,
            request.description.map(Some),
            seo,
            request.sort_order,
        )?;
        match request.is_active {
            Some(true) => category.activate(),
            Some(false) => category.deactivate(),
            None => {}
        }

        let updated = self.repository.update(&category).await?;
        self.cache
            .on_category_changed(id, &[old_slug.as_str(), updated.slug.as_str()])
            .await;

        info!("Category updated: {}", id);
        Ok(updated.into())
    }

    async fn move_category(&self, id: CategoryId, request: MoveCategoryRequest) -> CatalogResult<CategoryResponse> {
        debug!("Moving category {} under {:?}", id, request.new_parent_id);

        let moved = self.repository.move_subtree(id, request.new_parent_id).await?;
        let category = moved
            .first()
            .cloned()
            .ok_or_else(|| CatalogError::not_found("Category", id))?;
        self.cache.on_categories_moved(&moved).await;

        info!("Category {} moved to {} ({} rows)", id, category.path, moved.len());
        Ok(category.into())
    }

    async fn delete(&self, id: CategoryId) -> CatalogResult<()> {
        debug!("Deleting category: {}", id);

        let category = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::not_found("Category", id))?;

        let children = self.repository.count_children(id).await?;
        if children > 0 {
            return Err(CatalogError::conflict(format!(
                "Category has {children} subcategories and cannot be deleted"
            )));
        }
        let products = self.repository.count_products(id).await?;
        if products > 0 {
            return Err(CatalogError::conflict(format!(
                "Category has {products} products and cannot be deleted"
            )));
        }

        if !self.repository.delete(id).await? {
            return Err(CatalogError::not_found("Category", id));
        }
        self.cache.on_category_changed(id, &[category.slug.as_str()]).await;

        info!("Category deleted: {}", id);
        Ok(())
    }
}

impl std::fmt::Debug for CategoryServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryServiceImpl").finish_non_exhaustive()
    }
}
