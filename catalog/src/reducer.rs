//! The catalog reducer and its environment.
//!
//! Commands mutate state synchronously and describe any I/O as returned
//! effects; each effect resolves to exactly one event that is fed back
//! through the reducer. Orchestration rules live here too:
//!
//! - loads are served from cache while the page is fresh
//! - search reloads are debounced through a delayed timer event, with a
//!   generation counter so only the latest timer triggers a load
//! - every successful mutation invalidates the cache and schedules a reload
//! - status toggles apply optimistically and are undone by a dedicated
//!   revert event on failure, never by re-issuing the toggle command

use std::sync::Arc;
use std::time::Duration;

use storekit_core::effect::Effect;
use storekit_core::environment::Clock;
use storekit_core::reducer::Reducer;
use storekit_core::{SmallVec, smallvec};

use crate::actions::CatalogAction;
use crate::gateway::{GatewayError, ProductGateway};
use crate::model::{NewProduct, ProductId, ProductStatus, ProductUpdate, validate_new_product};
use crate::notify::Notifier;
use crate::query::{QueryPatch, apply_query};
use crate::state::CatalogState;

/// Default debounce window for search input
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Dependencies the catalog reducer needs to describe its effects
#[derive(Clone)]
pub struct CatalogEnvironment {
    /// Time source for cache bookkeeping
    pub clock: Arc<dyn Clock>,
    /// Remote product collection
    pub gateway: Arc<dyn ProductGateway>,
    /// Sink for operator notifications
    pub notifier: Arc<dyn Notifier>,
    /// Debounce window applied to search input
    pub search_debounce: Duration,
}

impl CatalogEnvironment {
    /// Build an environment with the default search debounce
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        gateway: Arc<dyn ProductGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            clock,
            gateway,
            notifier,
            search_debounce: SEARCH_DEBOUNCE,
        }
    }

    /// Override the search debounce window
    #[must_use]
    pub const fn with_search_debounce(mut self, debounce: Duration) -> Self {
        self.search_debounce = debounce;
        self
    }
}

type Effects = SmallVec<[Effect<CatalogAction>; 4]>;

/// Reducer for the product catalog
#[derive(Clone, Copy, Debug, Default)]
pub struct CatalogReducer;

impl CatalogReducer {
    /// Create a new catalog reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CatalogReducer {
    type State = CatalogState;
    type Action = CatalogAction;
    type Environment = CatalogEnvironment;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut CatalogState,
        action: CatalogAction,
        env: &CatalogEnvironment,
    ) -> Effects {
        match action {
            // -- Commands ------------------------------------------------
            CatalogAction::LoadProducts { patch } => load_products(state, patch, env),
            CatalogAction::LoadProduct { id } => load_product(state, id, env),
            CatalogAction::CreateProduct { draft } => create_product(state, draft, env),
            CatalogAction::UpdateProduct { update } => update_product(state, update, env),
            CatalogAction::DeleteProduct { id } => delete_product(state, id, env),
            CatalogAction::SetSearchFilter { search } => set_search_filter(state, search, env),
            CatalogAction::SetStatusFilter { status } => {
                state.filters.status = status;
                state.filters.page = Some(1);
                state.invalidate_cache();
                smallvec![reload()]
            },
            CatalogAction::SetSortOptions { field, order } => {
                state.filters.sort_field = Some(field);
                state.filters.sort_order = order;
                state.filters.page = Some(1);
                state.invalidate_cache();
                smallvec![reload()]
            },
            CatalogAction::SetPagination { page, limit } => {
                state.filters.page = Some(page);
                state.filters.limit = Some(limit);
                state.invalidate_cache();
                smallvec![reload()]
            },
            CatalogAction::ClearFilters => {
                state.filters = crate::query::ProductQuery::default();
                state.invalidate_cache();
                smallvec![reload()]
            },
            CatalogAction::SelectProduct { product } => {
                state.selected_product = product.map(|boxed| *boxed);
                smallvec![]
            },
            CatalogAction::ToggleProductStatus { id } => toggle_product_status(state, id, env),
            CatalogAction::BulkDeleteProducts { ids } => bulk_delete_products(state, ids, env),
            CatalogAction::RefreshProducts => {
                state.cached = false;
                state.cache_expiry = None;
                smallvec![reload()]
            },
            CatalogAction::ClearCache => {
                state.products.clear();
                state.total = 0;
                state.total_pages = 0;
                state.cached = false;
                state.cache_expiry = None;
                state.last_updated = None;
                smallvec![]
            },
            CatalogAction::ClearError => {
                state.error = None;
                smallvec![]
            },

            // -- Events --------------------------------------------------
            CatalogAction::ProductsLoaded { page } => {
                let now = env.clock.now();
                state.loading = false;
                state.products = page.products;
                state.total = page.total;
                state.current_page = page.page;
                state.total_pages = page.total_pages;
                state.error = None;
                state.last_updated = Some(now);
                state.cached = true;
                state.cache_expiry = Some(CatalogState::cache_expiry_from(now));
                smallvec![]
            },
            CatalogAction::ProductsLoadFailed { error } => {
                state.loading = false;
                state.error = Some(error);
                state.products.clear();
                state.total = 0;
                state.total_pages = 0;
                smallvec![]
            },
            CatalogAction::ProductLoaded { product } => {
                state.loading = false;
                state.selected_product = Some(*product);
                state.error = None;
                smallvec![]
            },
            CatalogAction::ProductLoadFailed { error } => {
                state.loading = false;
                state.error = Some(error);
                state.selected_product = None;
                smallvec![]
            },
            CatalogAction::ProductCreated { product } => {
                state.loading = false;
                state.products.insert(0, *product);
                state.total += 1;
                state.error = None;
                state.invalidate_cache();
                smallvec![reload()]
            },
            CatalogAction::ProductCreateFailed { error }
            | CatalogAction::ProductUpdateFailed { error }
            | CatalogAction::ProductDeleteFailed { error } => {
                state.loading = false;
                state.error = Some(error);
                smallvec![]
            },
            CatalogAction::ProductUpdated { product } => {
                state.loading = false;
                if let Some(existing) = state
                    .products
                    .iter_mut()
                    .find(|p| p.id == product.id)
                {
                    *existing = (*product).clone();
                }
                if state
                    .selected_product
                    .as_ref()
                    .is_some_and(|selected| selected.id == product.id)
                {
                    state.selected_product = Some(*product);
                }
                state.error = None;
                state.invalidate_cache();
                smallvec![reload()]
            },
            CatalogAction::ProductDeleted { id } => {
                state.loading = false;
                state.products.retain(|p| p.id != id);
                state.total = state.total.saturating_sub(1);
                if state
                    .selected_product
                    .as_ref()
                    .is_some_and(|selected| selected.id == id)
                {
                    state.selected_product = None;
                }
                state.error = None;
                state.invalidate_cache();
                smallvec![reload()]
            },
            CatalogAction::ProductStatusReverted { id } => {
                if let Some(product) = state.products.iter_mut().find(|p| p.id == id) {
                    product.status = product.status.toggled();
                }
                state.invalidate_cache();
                smallvec![]
            },
            CatalogAction::SearchDebounceElapsed { generation } => {
                if generation == state.search_generation {
                    smallvec![reload()]
                } else {
                    tracing::debug!(
                        generation,
                        current = state.search_generation,
                        "Dropping stale search debounce timer"
                    );
                    smallvec![]
                }
            },
        }
    }
}

/// Feedback effect that re-enters the load path with the current filters
fn reload() -> Effect<CatalogAction> {
    Effect::future(async move {
        Some(CatalogAction::LoadProducts {
            patch: QueryPatch::default(),
        })
    })
}

fn load_products(state: &mut CatalogState, patch: QueryPatch, env: &CatalogEnvironment) -> Effects {
    state.filters.merge(patch);
    state.error = None;

    if state.is_cache_valid(env.clock.now()) {
        tracing::debug!("Serving products from cache");
        state.loading = false;
        return smallvec![];
    }

    state.loading = true;
    let query = state.filters.clone();
    let gateway = Arc::clone(&env.gateway);
    let notifier = Arc::clone(&env.notifier);
    smallvec![Effect::future(async move {
        match gateway.fetch_all().await {
            Ok(products) => Some(CatalogAction::ProductsLoaded {
                page: apply_query(&products, &query),
            }),
            Err(err) => {
                notifier.error("Failed to load products");
                Some(CatalogAction::ProductsLoadFailed {
                    error: err.to_string(),
                })
            },
        }
    })]
}

fn load_product(state: &mut CatalogState, id: ProductId, env: &CatalogEnvironment) -> Effects {
    state.loading = true;
    state.error = None;
    let gateway = Arc::clone(&env.gateway);
    let notifier = Arc::clone(&env.notifier);
    smallvec![Effect::future(async move {
        match gateway.fetch_one(id).await {
            Ok(product) => Some(CatalogAction::ProductLoaded {
                product: Box::new(product),
            }),
            Err(err) => {
                notifier.error("Failed to load product");
                Some(CatalogAction::ProductLoadFailed {
                    error: err.to_string(),
                })
            },
        }
    })]
}

fn create_product(state: &mut CatalogState, draft: NewProduct, env: &CatalogEnvironment) -> Effects {
    if let Err(message) = validate_new_product(&draft) {
        let notifier = Arc::clone(&env.notifier);
        return smallvec![Effect::future(async move {
            notifier.error(&message);
            Some(CatalogAction::ProductCreateFailed { error: message })
        })];
    }

    state.loading = true;
    state.error = None;
    let gateway = Arc::clone(&env.gateway);
    let notifier = Arc::clone(&env.notifier);
    smallvec![Effect::future(async move {
        match gateway.create(draft).await {
            Ok(product) => {
                notifier.success("Product created successfully");
                Some(CatalogAction::ProductCreated {
                    product: Box::new(product),
                })
            },
            Err(err) => {
                notifier.error("Failed to create product");
                Some(CatalogAction::ProductCreateFailed {
                    error: err.to_string(),
                })
            },
        }
    })]
}

fn update_product(
    state: &mut CatalogState,
    update: ProductUpdate,
    env: &CatalogEnvironment,
) -> Effects {
    state.loading = true;
    state.error = None;
    let gateway = Arc::clone(&env.gateway);
    let notifier = Arc::clone(&env.notifier);
    smallvec![Effect::future(async move {
        match gateway.update(update).await {
            Ok(product) => {
                notifier.success("Product updated successfully");
                Some(CatalogAction::ProductUpdated {
                    product: Box::new(product),
                })
            },
            Err(err) => {
                notifier.error("Failed to update product");
                Some(CatalogAction::ProductUpdateFailed {
                    error: err.to_string(),
                })
            },
        }
    })]
}

fn delete_product(state: &mut CatalogState, id: ProductId, env: &CatalogEnvironment) -> Effects {
    state.loading = true;
    state.error = None;
    let gateway = Arc::clone(&env.gateway);
    let notifier = Arc::clone(&env.notifier);
    smallvec![Effect::future(async move {
        match gateway.delete(id.clone()).await {
            Ok(()) => {
                notifier.success("Product deleted successfully");
                Some(CatalogAction::ProductDeleted { id })
            },
            Err(err) => {
                notifier.error("Failed to delete product");
                Some(CatalogAction::ProductDeleteFailed {
                    error: err.to_string(),
                })
            },
        }
    })]
}

fn set_search_filter(state: &mut CatalogState, search: String, env: &CatalogEnvironment) -> Effects {
    state.filters.search = search;
    state.filters.page = Some(1);
    state.invalidate_cache();
    state.search_generation += 1;
    smallvec![Effect::Delay {
        duration: env.search_debounce,
        action: Box::new(CatalogAction::SearchDebounceElapsed {
            generation: state.search_generation,
        }),
    }]
}

fn toggle_product_status(
    state: &mut CatalogState,
    id: ProductId,
    env: &CatalogEnvironment,
) -> Effects {
    let Some(product) = state.products.iter_mut().find(|p| p.id == id) else {
        state.error = Some(GatewayError::NotFound.to_string());
        return smallvec![];
    };

    // Optimistic flip; the revert event undoes it if persistence fails.
    product.status = product.status.toggled();
    let flipped_to = product.status;
    let update = ProductUpdate::from(&*product);
    state.invalidate_cache();

    let gateway = Arc::clone(&env.gateway);
    let notifier = Arc::clone(&env.notifier);
    smallvec![Effect::future(async move {
        match gateway.update(update).await {
            Ok(product) => {
                notifier.success(match flipped_to {
                    ProductStatus::Active => "Product activated successfully",
                    ProductStatus::Inactive => "Product deactivated successfully",
                });
                Some(CatalogAction::ProductUpdated {
                    product: Box::new(product),
                })
            },
            Err(err) => {
                tracing::warn!(error = %err, %id, "Status toggle failed, reverting");
                notifier.error("Failed to update product status");
                Some(CatalogAction::ProductStatusReverted { id })
            },
        }
    })]
}

fn bulk_delete_products(
    state: &mut CatalogState,
    ids: Vec<ProductId>,
    env: &CatalogEnvironment,
) -> Effects {
    if ids.is_empty() {
        return smallvec![];
    }

    // Optimistic removal; a failed batch falls back to a full reload.
    let before = state.products.len();
    state.products.retain(|p| !ids.contains(&p.id));
    let removed = before - state.products.len();
    state.total = state.total.saturating_sub(removed);
    if state
        .selected_product
        .as_ref()
        .is_some_and(|selected| ids.contains(&selected.id))
    {
        state.selected_product = None;
    }
    state.invalidate_cache();

    let gateway = Arc::clone(&env.gateway);
    let notifier = Arc::clone(&env.notifier);
    smallvec![Effect::future(async move {
        let deletions = ids.iter().cloned().map(|id| {
            let gateway = Arc::clone(&gateway);
            async move { gateway.delete(id).await }
        });
        let results = futures::future::join_all(deletions).await;
        match results.into_iter().find_map(Result::err) {
            None => {
                notifier.success(&format!("{} products deleted successfully", ids.len()));
                Some(CatalogAction::RefreshProducts)
            },
            Some(err) => {
                notifier.error("Failed to delete some products");
                Some(CatalogAction::ProductsLoadFailed {
                    error: err.to_string(),
                })
            },
        }
    })]
}
