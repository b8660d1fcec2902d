//! Catalog state: the single source of truth for the admin view.

use chrono::{DateTime, Duration, Utc};

use crate::model::{Product, ProductId};
use crate::query::ProductQuery;

/// How long a loaded page stays fresh before a reload hits the backend again
pub const CACHE_TTL_MINUTES: i64 = 5;

/// Complete catalog state
///
/// All fields are plain data; every transition happens in the reducer. The
/// `products` vector holds the current page (post-query), not the full
/// collection.
#[derive(Clone, Debug)]
pub struct CatalogState {
    /// Current page of products, in query order
    pub products: Vec<Product>,
    /// Product selected for detail display, if any
    pub selected_product: Option<Product>,
    /// Size of the filtered collection (before pagination)
    pub total: usize,
    /// 1-based page number currently displayed
    pub current_page: u32,
    /// Total pages at the current page size
    pub total_pages: u32,
    /// The query that produced the current page
    pub filters: ProductQuery,
    /// Whether a load or mutation is in flight
    pub loading: bool,
    /// Last surfaced error message, if any
    pub error: Option<String>,
    /// When the current page was loaded
    pub last_updated: Option<DateTime<Utc>>,
    /// Whether the current page may be served without hitting the backend
    pub cached: bool,
    /// Instant after which the cache no longer counts as fresh
    pub cache_expiry: Option<DateTime<Utc>>,
    /// Monotonic counter identifying the latest search input; used to drop
    /// stale debounce timers
    pub search_generation: u64,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            products: Vec::new(),
            selected_product: None,
            total: 0,
            current_page: 1,
            total_pages: 0,
            filters: ProductQuery::default(),
            loading: false,
            error: None,
            last_updated: None,
            cached: false,
            cache_expiry: None,
            search_generation: 0,
        }
    }
}

impl CatalogState {
    /// Fresh state with default filters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cached page is still fresh at the given instant
    #[must_use]
    pub fn is_cache_valid(&self, now: DateTime<Utc>) -> bool {
        self.cached && self.cache_expiry.is_some_and(|expiry| now < expiry)
    }

    /// Marks the cached page as stale without discarding it
    pub fn invalidate_cache(&mut self) {
        self.cached = false;
    }

    /// Expiry instant for a page loaded at `now`
    #[must_use]
    pub fn cache_expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::minutes(CACHE_TTL_MINUTES)
    }

    /// Finds a product on the current page by id
    #[must_use]
    pub fn find_product(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| &p.id == id)
    }
}
