//! Read-side projections over [`CatalogState`].
//!
//! Selectors are plain functions so views can derive everything they render
//! without reaching into state internals. All of them borrow; none allocate
//! beyond the returned collection.

use serde::Serialize;

use crate::model::{Product, ProductId, ProductStatus};
use crate::query::{SortField, SortOrder, StatusFilter};
use crate::state::CatalogState;

/// Stock level at or below which a product counts as low-stock
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Pagination summary for the current page
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PaginationInfo {
    /// 1-based page currently displayed
    pub current_page: u32,
    /// Total pages at the current page size
    pub total_pages: u32,
    /// Size of the filtered collection
    pub total: usize,
    /// Page size, when pagination is active
    pub limit: Option<u32>,
}

/// Cache freshness summary
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheStatus {
    /// Whether the page may be served without a backend round trip
    pub cached: bool,
    /// Expiry instant of the cached page
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    /// When the page was last loaded
    pub last_updated: Option<chrono::DateTime<chrono::Utc>>,
}

/// Aggregate statistics over the current page
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CatalogStats {
    /// Products on the page
    pub count: usize,
    /// Active products
    pub active: usize,
    /// Inactive products
    pub inactive: usize,
    /// Products at or below the low-stock threshold (excluding out of stock)
    pub low_stock: usize,
    /// Products with zero stock
    pub out_of_stock: usize,
    /// Total inventory value (price times stock)
    pub inventory_value: f64,
}

/// Pagination summary for the current page
#[must_use]
pub fn pagination_info(state: &CatalogState) -> PaginationInfo {
    PaginationInfo {
        current_page: state.current_page,
        total_pages: state.total_pages,
        total: state.total,
        limit: state.filters.limit,
    }
}

/// Cache freshness summary
#[must_use]
pub fn cache_status(state: &CatalogState) -> CacheStatus {
    CacheStatus {
        cached: state.cached,
        expires_at: state.cache_expiry,
        last_updated: state.last_updated,
    }
}

/// Active products on the current page
#[must_use]
pub fn active_products(state: &CatalogState) -> Vec<&Product> {
    by_status(state, ProductStatus::Active)
}

/// Inactive products on the current page
#[must_use]
pub fn inactive_products(state: &CatalogState) -> Vec<&Product> {
    by_status(state, ProductStatus::Inactive)
}

fn by_status(state: &CatalogState, status: ProductStatus) -> Vec<&Product> {
    state
        .products
        .iter()
        .filter(|p| p.status == status)
        .collect()
}

/// Products with stock above zero but at or below the low-stock threshold
#[must_use]
pub fn low_stock_products(state: &CatalogState) -> Vec<&Product> {
    state
        .products
        .iter()
        .filter(|p| p.stock > 0 && p.stock <= LOW_STOCK_THRESHOLD)
        .collect()
}

/// Products with zero stock
#[must_use]
pub fn out_of_stock_products(state: &CatalogState) -> Vec<&Product> {
    state.products.iter().filter(|p| p.stock == 0).collect()
}

/// Aggregate statistics over the current page
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn catalog_stats(state: &CatalogState) -> CatalogStats {
    CatalogStats {
        count: state.products.len(),
        active: active_products(state).len(),
        inactive: inactive_products(state).len(),
        low_stock: low_stock_products(state).len(),
        out_of_stock: out_of_stock_products(state).len(),
        inventory_value: state
            .products
            .iter()
            .map(|p| p.price * p.stock as f64)
            .sum(),
    }
}

/// The current search term
#[must_use]
pub fn search_term(state: &CatalogState) -> &str {
    &state.filters.search
}

/// The current status filter
#[must_use]
pub fn status_filter(state: &CatalogState) -> StatusFilter {
    state.filters.status
}

/// The current sort options
#[must_use]
pub fn sort_options(state: &CatalogState) -> (Option<SortField>, SortOrder) {
    (state.filters.sort_field, state.filters.sort_order)
}

/// Finds a product on the current page by id
#[must_use]
pub fn product_by_id<'a>(state: &'a CatalogState, id: &ProductId) -> Option<&'a Product> {
    state.find_product(id)
}

/// Products on the current page that still pass the current search and
/// status filters
///
/// The page was produced by a query, but optimistic mutations can leave
/// rows that no longer match; this view re-applies both filters locally.
#[must_use]
pub fn filtered_products(state: &CatalogState) -> Vec<&Product> {
    let needle = state.filters.search.trim().to_lowercase();
    state
        .products
        .iter()
        .filter(|p| state.filters.status.matches(p.status))
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Whether the current page has any products
#[must_use]
pub fn has_products(state: &CatalogState) -> bool {
    !state.products.is_empty()
}

/// Whether the page is empty with no load in flight
#[must_use]
pub fn is_empty(state: &CatalogState) -> bool {
    state.products.is_empty() && !state.loading
}

/// Whether nothing has ever been loaded and nothing is loading
#[must_use]
pub fn is_first_load(state: &CatalogState) -> bool {
    state.last_updated.is_none() && !state.loading
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, price: f64, stock: i64, status: ProductStatus) -> Product {
        Product {
            id: ProductId::Number(id),
            name: format!("Product {id}"),
            description: None,
            price,
            stock,
            status,
            image: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn state() -> CatalogState {
        CatalogState {
            products: vec![
                product(1, 10.0, 5, ProductStatus::Active),
                product(2, 20.0, 0, ProductStatus::Active),
                product(3, 30.0, 50, ProductStatus::Inactive),
            ],
            total: 3,
            total_pages: 1,
            ..CatalogState::default()
        }
    }

    #[test]
    fn stats_partition_the_page() {
        let stats = catalog_stats(&state());
        assert_eq!(stats.count, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.inactive, 1);
        assert_eq!(stats.low_stock, 1);
        assert_eq!(stats.out_of_stock, 1);
        assert!((stats.inventory_value - 1550.0).abs() < f64::EPSILON);
    }

    #[test]
    fn low_stock_excludes_out_of_stock() {
        let state = state();
        let low = low_stock_products(&state);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, ProductId::Number(1));
    }

    #[test]
    fn pagination_info_reflects_state() {
        let info = pagination_info(&state());
        assert_eq!(info.current_page, 1);
        assert_eq!(info.total, 3);
        assert_eq!(info.limit, Some(10));
    }

    #[test]
    fn lookup_by_id() {
        let state = state();
        assert!(product_by_id(&state, &ProductId::Number(2)).is_some());
        assert!(product_by_id(&state, &ProductId::Number(99)).is_none());
    }

    #[test]
    fn filtered_view_drops_rows_that_stopped_matching() {
        let mut state = state();
        state.filters.status = crate::query::StatusFilter::Active;
        // Row 3 is inactive; an optimistic toggle could have left it here.
        let filtered = filtered_products(&state);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|p| p.status == ProductStatus::Active));

        state.filters.search = "Product 1".to_string();
        assert_eq!(filtered_products(&state).len(), 1);
    }

    #[test]
    fn emptiness_accounts_for_loading() {
        let mut state = CatalogState::default();
        assert!(is_empty(&state));
        assert!(is_first_load(&state));

        state.loading = true;
        assert!(!is_empty(&state));
        assert!(!is_first_load(&state));
    }
}
