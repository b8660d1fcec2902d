//! # Storekit Catalog
//!
//! Product-catalog administration built on the Storekit architecture:
//! a single [`CatalogState`] mutated only by [`CatalogReducer`], with all
//! I/O described as effects and fed back as events.
//!
//! The backend is a plain JSON collection; the full product list is fetched
//! once and queried in memory ([`query::apply_query`]) for search, status
//! filtering, sorting and pagination. Loaded pages stay fresh for five
//! minutes and mutations invalidate the cache and trigger a reload.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use storekit_catalog::{
//!     CatalogAction, CatalogEnvironment, CatalogReducer, CatalogState,
//!     HttpProductGateway, TracingNotifier,
//! };
//! use storekit_core::environment::SystemClock;
//! use storekit_runtime::Store;
//!
//! let env = CatalogEnvironment::new(
//!     Arc::new(SystemClock),
//!     Arc::new(HttpProductGateway::new("http://localhost:3000")),
//!     Arc::new(TracingNotifier),
//! );
//! let store = Store::new(CatalogState::new(), CatalogReducer::new(), env);
//! # let _ = store;
//! ```

pub mod actions;
pub mod gateway;
pub mod model;
pub mod notify;
pub mod query;
pub mod reducer;
pub mod selectors;
pub mod state;

pub use actions::CatalogAction;
pub use gateway::{GatewayError, HttpProductGateway, ProductGateway};
pub use model::{
    NewProduct, Product, ProductId, ProductStatus, ProductUpdate, validate_new_product,
};
pub use notify::{Notifier, TracingNotifier};
pub use query::{
    ProductPage, ProductQuery, QueryPatch, SortField, SortOrder, StatusFilter, apply_query,
};
pub use reducer::{CatalogEnvironment, CatalogReducer, SEARCH_DEBOUNCE};
pub use selectors::{CacheStatus, CatalogStats, PaginationInfo};
pub use state::{CACHE_TTL_MINUTES, CatalogState};
