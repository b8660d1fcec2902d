//! Actions driving the catalog state machine.
//!
//! Commands express operator intent; events record the outcome of effects.
//! The reducer is the only consumer, and every effect future resolves to
//! exactly one event (or nothing, for dropped stale timers).

use storekit_macros::Action;

use crate::model::{NewProduct, Product, ProductId, ProductUpdate};
use crate::query::{ProductPage, QueryPatch, SortField, SortOrder, StatusFilter};

/// All catalog actions
#[derive(Action, Clone, Debug, PartialEq)]
pub enum CatalogAction {
    // -- Commands --------------------------------------------------------
    /// Load the product collection, first merging the patch into the
    /// current filters; served from cache when still fresh
    #[command]
    LoadProducts {
        /// Filter changes to apply before loading
        patch: QueryPatch,
    },

    /// Load a single product into the detail selection
    #[command]
    LoadProduct {
        /// Product to load
        id: ProductId,
    },

    /// Create a new product
    #[command]
    CreateProduct {
        /// Fields of the product to create
        draft: NewProduct,
    },

    /// Replace an existing product
    #[command]
    UpdateProduct {
        /// Full replacement payload
        update: ProductUpdate,
    },

    /// Delete a product
    #[command]
    DeleteProduct {
        /// Product to delete
        id: ProductId,
    },

    /// Change the search term; the reload is debounced
    #[command]
    SetSearchFilter {
        /// New search term
        search: String,
    },

    /// Change the status filter and reload
    #[command]
    SetStatusFilter {
        /// New status filter
        status: StatusFilter,
    },

    /// Change the sort options and reload
    #[command]
    SetSortOptions {
        /// Field to sort by
        field: SortField,
        /// Sort direction
        order: SortOrder,
    },

    /// Jump to a page at a given page size and reload
    #[command]
    SetPagination {
        /// 1-based page number
        page: u32,
        /// Page size
        limit: u32,
    },

    /// Reset all filters to their defaults and reload
    #[command]
    ClearFilters,

    /// Select (or deselect) a product for detail display
    #[command]
    SelectProduct {
        /// Product to select; `None` clears the selection
        product: Option<Box<Product>>,
    },

    /// Optimistically flip a product's status, then persist it
    #[command]
    ToggleProductStatus {
        /// Product to toggle
        id: ProductId,
    },

    /// Optimistically remove several products, then delete them remotely
    #[command]
    BulkDeleteProducts {
        /// Products to delete
        ids: Vec<ProductId>,
    },

    /// Force a reload, bypassing the cache
    #[command]
    RefreshProducts,

    /// Drop the cached page entirely
    #[command]
    ClearCache,

    /// Dismiss the current error message
    #[command]
    ClearError,

    // -- Events ----------------------------------------------------------
    /// The collection loaded and the query produced this page
    #[event]
    ProductsLoaded {
        /// Page of results
        page: ProductPage,
    },

    /// Loading the collection failed
    #[event]
    ProductsLoadFailed {
        /// Human-readable error message
        error: String,
    },

    /// A single product loaded
    #[event]
    ProductLoaded {
        /// The loaded product
        product: Box<Product>,
    },

    /// Loading a single product failed
    #[event]
    ProductLoadFailed {
        /// Human-readable error message
        error: String,
    },

    /// A product was created remotely
    #[event]
    ProductCreated {
        /// The server's view of the new product
        product: Box<Product>,
    },

    /// Creating a product failed
    #[event]
    ProductCreateFailed {
        /// Human-readable error message
        error: String,
    },

    /// A product was updated remotely
    #[event]
    ProductUpdated {
        /// The server's view of the updated product
        product: Box<Product>,
    },

    /// Updating a product failed
    #[event]
    ProductUpdateFailed {
        /// Human-readable error message
        error: String,
    },

    /// A product was deleted remotely
    #[event]
    ProductDeleted {
        /// Id of the deleted product
        id: ProductId,
    },

    /// Deleting a product failed
    #[event]
    ProductDeleteFailed {
        /// Human-readable error message
        error: String,
    },

    /// Persisting an optimistic status flip failed; re-flip the product
    /// locally without touching the backend
    #[event]
    ProductStatusReverted {
        /// Product whose status flip must be undone
        id: ProductId,
    },

    /// The search debounce timer fired
    #[event]
    SearchDebounceElapsed {
        /// Generation the timer was armed for; stale generations are inert
        generation: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_and_events_are_classified() {
        let command = CatalogAction::RefreshProducts;
        assert!(command.is_command());
        assert!(!command.is_event());

        let event = CatalogAction::ProductsLoadFailed {
            error: "boom".to_string(),
        };
        assert!(event.is_event());
        assert!(!event.is_command());
    }

    #[test]
    fn names_match_variants() {
        assert_eq!(CatalogAction::ClearError.name(), "ClearError");
        assert_eq!(
            CatalogAction::SearchDebounceElapsed { generation: 1 }.name(),
            "SearchDebounceElapsed"
        );
    }
}
