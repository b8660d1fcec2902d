//! End-to-end tests for the catalog store: cache behavior, debounced
//! search, optimistic mutations and their rollback, all through the real
//! effect feedback loop with a scripted in-memory gateway.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use storekit_catalog::gateway::GatewayFuture;
use storekit_catalog::{
    CatalogAction, CatalogEnvironment, CatalogReducer, CatalogState, GatewayError, NewProduct,
    Notifier, Product, ProductGateway, ProductId, ProductStatus, ProductUpdate, QueryPatch,
};
use storekit_runtime::Store;
use storekit_testing::mocks::test_clock;

const WAIT: Duration = Duration::from_secs(5);

/// In-memory gateway with per-call counters and scriptable failures
#[derive(Default)]
struct ScriptedGateway {
    products: Mutex<Vec<Product>>,
    fetch_all_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_fetches: AtomicBool,
    fail_updates: AtomicBool,
    fail_deletes: AtomicBool,
}

impl ScriptedGateway {
    fn seeded(products: Vec<Product>) -> Arc<Self> {
        Arc::new(Self {
            products: Mutex::new(products),
            ..Self::default()
        })
    }

    fn fetch_count(&self) -> usize {
        self.fetch_all_calls.load(Ordering::SeqCst)
    }
}

impl ProductGateway for ScriptedGateway {
    fn fetch_all(&self) -> GatewayFuture<'_, Vec<Product>> {
        Box::pin(async move {
            self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_fetches.load(Ordering::SeqCst) {
                return Err(GatewayError::ServerError);
            }
            Ok(self.products.lock().unwrap().clone())
        })
    }

    fn fetch_one(&self, id: ProductId) -> GatewayFuture<'_, Product> {
        Box::pin(async move {
            self.products
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or(GatewayError::NotFound)
        })
    }

    fn create(&self, draft: NewProduct) -> GatewayFuture<'_, Product> {
        Box::pin(async move {
            let mut products = self.products.lock().unwrap();
            let product = Product {
                id: ProductId::Number(products.len() as i64 + 1),
                name: draft.name,
                description: draft.description,
                price: draft.price,
                stock: draft.stock,
                status: draft.status,
                image: draft.image,
                created_at: Some("2025-01-01T00:00:00Z".to_string()),
                updated_at: Some("2025-01-01T00:00:00Z".to_string()),
            };
            products.push(product.clone());
            Ok(product)
        })
    }

    fn update(&self, update: ProductUpdate) -> GatewayFuture<'_, Product> {
        Box::pin(async move {
            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(GatewayError::ServerError);
            }
            let mut products = self.products.lock().unwrap();
            let existing = products
                .iter_mut()
                .find(|p| p.id == update.id)
                .ok_or(GatewayError::NotFound)?;
            existing.name = update.name;
            existing.description = update.description;
            existing.price = update.price;
            existing.stock = update.stock;
            existing.status = update.status;
            existing.image = update.image;
            Ok(existing.clone())
        })
    }

    fn delete(&self, id: ProductId) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(GatewayError::ServerError);
            }
            self.products.lock().unwrap().retain(|p| p.id != id);
            Ok(())
        })
    }
}

#[derive(Default)]
struct RecordingNotifier {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

fn product(id: i64, name: &str, status: ProductStatus) -> Product {
    Product {
        id: ProductId::Number(id),
        name: name.to_string(),
        description: None,
        price: 10.0,
        stock: 5,
        status,
        image: None,
        created_at: Some(format!("2025-01-{id:02}T00:00:00Z")),
        updated_at: None,
    }
}

type CatalogStore = Store<CatalogState, CatalogAction, CatalogEnvironment, CatalogReducer>;

fn store_with(
    gateway: Arc<ScriptedGateway>,
    notifier: Arc<RecordingNotifier>,
) -> CatalogStore {
    let env = CatalogEnvironment::new(Arc::new(test_clock()), gateway, notifier)
        .with_search_debounce(Duration::from_millis(30));
    Store::new(CatalogState::new(), CatalogReducer::new(), env)
}

fn is_load_outcome(action: &CatalogAction) -> bool {
    matches!(
        action,
        CatalogAction::ProductsLoaded { .. } | CatalogAction::ProductsLoadFailed { .. }
    )
}

async fn load(store: &CatalogStore) {
    let outcome = store
        .send_and_wait_for(
            CatalogAction::LoadProducts {
                patch: QueryPatch::default(),
            },
            is_load_outcome,
            WAIT,
        )
        .await
        .unwrap();
    assert!(matches!(outcome, CatalogAction::ProductsLoaded { .. }));
}

#[tokio::test]
async fn initial_load_populates_page() {
    let gateway = ScriptedGateway::seeded(vec![
        product(1, "Widget", ProductStatus::Active),
        product(2, "Gadget", ProductStatus::Inactive),
    ]);
    let store = store_with(Arc::clone(&gateway), Arc::default());

    load(&store).await;

    store
        .state(|state| {
            assert_eq!(state.total, 2);
            assert_eq!(state.products.len(), 2);
            assert!(state.cached);
            assert!(!state.loading);
            assert!(state.error.is_none());
        })
        .await;
    assert_eq!(gateway.fetch_count(), 1);
}

#[tokio::test]
async fn fresh_cache_serves_second_load_without_fetching() {
    let gateway = ScriptedGateway::seeded(vec![product(1, "Widget", ProductStatus::Active)]);
    let store = store_with(Arc::clone(&gateway), Arc::default());

    load(&store).await;

    let mut handle = store
        .send(CatalogAction::LoadProducts {
            patch: QueryPatch::default(),
        })
        .await
        .unwrap();
    handle.wait_with_timeout(WAIT).await.unwrap();

    assert_eq!(gateway.fetch_count(), 1);
    store.state(|state| assert!(!state.loading)).await;
}

#[tokio::test]
async fn refresh_bypasses_fresh_cache() {
    let gateway = ScriptedGateway::seeded(vec![product(1, "Widget", ProductStatus::Active)]);
    let store = store_with(Arc::clone(&gateway), Arc::default());

    load(&store).await;
    store
        .send_and_wait_for(CatalogAction::RefreshProducts, is_load_outcome, WAIT)
        .await
        .unwrap();

    assert_eq!(gateway.fetch_count(), 2);
}

#[tokio::test]
async fn create_invalidates_cache_and_reloads() {
    let gateway = ScriptedGateway::seeded(vec![product(1, "Widget", ProductStatus::Active)]);
    let notifier = Arc::new(RecordingNotifier::default());
    let store = store_with(Arc::clone(&gateway), Arc::clone(&notifier));

    load(&store).await;

    let mut actions = store.subscribe_actions();
    store
        .send(CatalogAction::CreateProduct {
            draft: NewProduct {
                name: "Gadget".to_string(),
                description: None,
                price: 25.0,
                stock: 3,
                status: ProductStatus::Active,
                image: None,
            },
        })
        .await
        .unwrap();

    // Creation feeds back a reload; wait for the page that follows it.
    let mut created = false;
    while let Ok(action) = actions.recv().await {
        match action {
            CatalogAction::ProductCreated { .. } => created = true,
            CatalogAction::ProductsLoaded { .. } if created => break,
            _ => {},
        }
    }

    assert_eq!(gateway.fetch_count(), 2);
    store
        .state(|state| {
            assert_eq!(state.total, 2);
            assert!(state.products.iter().any(|p| p.name == "Gadget"));
        })
        .await;
    assert!(
        notifier
            .successes
            .lock()
            .unwrap()
            .contains(&"Product created successfully".to_string())
    );
}

#[tokio::test]
async fn rapid_search_input_coalesces_into_one_reload() {
    let gateway = ScriptedGateway::seeded(vec![
        product(1, "Widget", ProductStatus::Active),
        product(2, "Gadget", ProductStatus::Active),
    ]);
    let store = store_with(Arc::clone(&gateway), Arc::default());

    load(&store).await;

    let mut actions = store.subscribe_actions();
    store
        .send(CatalogAction::SetSearchFilter {
            search: "w".to_string(),
        })
        .await
        .unwrap();
    store
        .send(CatalogAction::SetSearchFilter {
            search: "wid".to_string(),
        })
        .await
        .unwrap();

    while let Ok(action) = actions.recv().await {
        if matches!(action, CatalogAction::ProductsLoaded { .. }) {
            break;
        }
    }
    // Give the stale timer a chance to fire if it was going to.
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(gateway.fetch_count(), 2);
    store
        .state(|state| {
            assert_eq!(state.filters.search, "wid");
            assert_eq!(state.total, 1);
            assert_eq!(state.products[0].name, "Widget");
        })
        .await;
}

#[tokio::test]
async fn failed_toggle_reverts_the_optimistic_flip() {
    let gateway = ScriptedGateway::seeded(vec![product(1, "Widget", ProductStatus::Active)]);
    gateway.fail_updates.store(true, Ordering::SeqCst);
    let notifier = Arc::new(RecordingNotifier::default());
    let store = store_with(Arc::clone(&gateway), Arc::clone(&notifier));

    load(&store).await;

    store
        .send_and_wait_for(
            CatalogAction::ToggleProductStatus {
                id: ProductId::Number(1),
            },
            |action| matches!(action, CatalogAction::ProductStatusReverted { .. }),
            WAIT,
        )
        .await
        .unwrap();

    store
        .state(|state| {
            assert_eq!(state.products[0].status, ProductStatus::Active);
        })
        .await;
    assert!(
        notifier
            .errors
            .lock()
            .unwrap()
            .contains(&"Failed to update product status".to_string())
    );
}

#[tokio::test]
async fn successful_toggle_persists_and_reloads() {
    let gateway = ScriptedGateway::seeded(vec![product(1, "Widget", ProductStatus::Active)]);
    let notifier = Arc::new(RecordingNotifier::default());
    let store = store_with(Arc::clone(&gateway), Arc::clone(&notifier));

    load(&store).await;

    let mut actions = store.subscribe_actions();
    store
        .send(CatalogAction::ToggleProductStatus {
            id: ProductId::Number(1),
        })
        .await
        .unwrap();

    let mut updated = false;
    while let Ok(action) = actions.recv().await {
        match action {
            CatalogAction::ProductUpdated { .. } => updated = true,
            CatalogAction::ProductsLoaded { .. } if updated => break,
            _ => {},
        }
    }

    store
        .state(|state| {
            assert_eq!(state.products[0].status, ProductStatus::Inactive);
        })
        .await;
    assert!(
        notifier
            .successes
            .lock()
            .unwrap()
            .contains(&"Product deactivated successfully".to_string())
    );
}

#[tokio::test]
async fn bulk_delete_removes_everything_then_refreshes() {
    let gateway = ScriptedGateway::seeded(vec![
        product(1, "Widget", ProductStatus::Active),
        product(2, "Gadget", ProductStatus::Active),
        product(3, "Doohickey", ProductStatus::Active),
    ]);
    let notifier = Arc::new(RecordingNotifier::default());
    let store = store_with(Arc::clone(&gateway), Arc::clone(&notifier));

    load(&store).await;

    let mut actions = store.subscribe_actions();
    store
        .send(CatalogAction::BulkDeleteProducts {
            ids: vec![ProductId::Number(1), ProductId::Number(3)],
        })
        .await
        .unwrap();

    let mut refreshed = false;
    while let Ok(action) = actions.recv().await {
        match action {
            CatalogAction::RefreshProducts => refreshed = true,
            CatalogAction::ProductsLoaded { .. } if refreshed => break,
            _ => {},
        }
    }

    assert_eq!(gateway.delete_calls.load(Ordering::SeqCst), 2);
    store
        .state(|state| {
            assert_eq!(state.total, 1);
            assert_eq!(state.products[0].name, "Gadget");
        })
        .await;
    assert!(
        notifier
            .successes
            .lock()
            .unwrap()
            .contains(&"2 products deleted successfully".to_string())
    );
}

#[tokio::test]
async fn load_failure_surfaces_human_message_and_clears_page() {
    let gateway = ScriptedGateway::seeded(vec![product(1, "Widget", ProductStatus::Active)]);
    let notifier = Arc::new(RecordingNotifier::default());
    let store = store_with(Arc::clone(&gateway), Arc::clone(&notifier));

    load(&store).await;
    gateway.fail_fetches.store(true, Ordering::SeqCst);

    let outcome = store
        .send_and_wait_for(CatalogAction::RefreshProducts, is_load_outcome, WAIT)
        .await
        .unwrap();
    assert!(matches!(outcome, CatalogAction::ProductsLoadFailed { .. }));

    store
        .state(|state| {
            assert_eq!(state.error.as_deref(), Some("Internal server error"));
            assert!(state.products.is_empty());
            assert_eq!(state.total, 0);
            assert!(!state.loading);
        })
        .await;
    assert!(
        notifier
            .errors
            .lock()
            .unwrap()
            .contains(&"Failed to load products".to_string())
    );
}

#[tokio::test]
async fn delete_of_selected_product_clears_selection() {
    let selected = product(1, "Widget", ProductStatus::Active);
    let gateway = ScriptedGateway::seeded(vec![
        selected.clone(),
        product(2, "Gadget", ProductStatus::Active),
    ]);
    let store = store_with(Arc::clone(&gateway), Arc::default());

    load(&store).await;
    store
        .send(CatalogAction::SelectProduct {
            product: Some(Box::new(selected)),
        })
        .await
        .unwrap();

    store
        .send_and_wait_for(
            CatalogAction::DeleteProduct {
                id: ProductId::Number(1),
            },
            |action| matches!(action, CatalogAction::ProductDeleted { .. }),
            WAIT,
        )
        .await
        .unwrap();

    store
        .state(|state| {
            assert!(state.selected_product.is_none());
            assert!(state.products.iter().all(|p| p.id != ProductId::Number(1)));
        })
        .await;
}
