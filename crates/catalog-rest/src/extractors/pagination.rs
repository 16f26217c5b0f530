//! Pagination and sorting query parameters.

use catalog_config::PaginationConfig;
use catalog_core::{PageRequest, Sort, SortOrder};
use serde::Deserialize;
use utoipa::IntoParams;

/// `?page=&size=`; pages are 0-based.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// Page number, starting at 0.
    pub page: Option<usize>,
    /// Page size, clamped to the configured maximum.
    pub size: Option<usize>,
}

impl PaginationQuery {
    #[must_use]
    pub fn to_page_request(&self, config: &PaginationConfig) -> PageRequest {
        PageRequest::with_max(
            self.page.unwrap_or(0),
            self.size.unwrap_or(config.default_page_size as usize),
            config.max_page_size as usize,
        )
    }
}

/// `?sort_by=&sort_order=asc|desc` over a whitelisted field enum.
#[derive(Debug, Clone, Deserialize)]
pub struct SortQuery<F> {
    pub sort_by: Option<F>,
    pub sort_order: Option<SortOrder>,
}

impl<F> Default for SortQuery<F> {
    fn default() -> Self {
        Self {
            sort_by: None,
            sort_order: None,
        }
    }
}

impl<F: Default> From<SortQuery<F>> for Sort<F> {
    fn from(query: SortQuery<F>) -> Self {
        Sort::new(query.sort_by.unwrap_or_default(), query.sort_order.unwrap_or_default())
    }
}
