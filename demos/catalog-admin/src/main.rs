//! CLI demo for the product catalog.
//!
//! Talks to a JSON collection backend (a `json-server` style API works) at
//! `STOREKIT_API_URL` or `http://localhost:3000`, loads the first page,
//! narrows it down with a search, and prints catalog statistics.

use std::sync::Arc;
use std::time::Duration;

use storekit_catalog::{
    CatalogAction, CatalogEnvironment, CatalogReducer, CatalogState, HttpProductGateway,
    QueryPatch, TracingNotifier, selectors,
};
use storekit_core::environment::SystemClock;
use storekit_runtime::Store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let base_url =
        std::env::var("STOREKIT_API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    tracing::info!(%base_url, "Starting catalog admin demo");

    let env = CatalogEnvironment::new(
        Arc::new(SystemClock),
        Arc::new(HttpProductGateway::new(base_url)),
        Arc::new(TracingNotifier),
    );
    let store = Store::new(CatalogState::new(), CatalogReducer::new(), env);

    println!("=== Catalog Admin ===\n");

    // Load the first page
    let outcome = store
        .send_and_wait_for(
            CatalogAction::LoadProducts {
                patch: QueryPatch::default(),
            },
            |action| {
                matches!(
                    action,
                    CatalogAction::ProductsLoaded { .. } | CatalogAction::ProductsLoadFailed { .. }
                )
            },
            Duration::from_secs(10),
        )
        .await?;

    if let CatalogAction::ProductsLoadFailed { error } = outcome {
        eprintln!("Could not load products: {error}");
        store.shutdown(Duration::from_secs(5)).await?;
        return Ok(());
    }

    store
        .state(|state| {
            let info = selectors::pagination_info(state);
            println!(
                "Page {}/{} ({} products total):",
                info.current_page, info.total_pages, info.total
            );
            for product in &state.products {
                println!(
                    "  [{}] {:30} {:>8.2}  stock {:>4}  {}",
                    product.id, product.name, product.price, product.stock, product.status
                );
            }
        })
        .await;

    // Narrow down with a search; the reload is debounced
    println!("\nSearching for \"pro\"...");
    store
        .send(CatalogAction::SetSearchFilter {
            search: "pro".to_string(),
        })
        .await?;

    let mut actions = store.subscribe_actions();
    while let Ok(action) = actions.recv().await {
        if matches!(
            action,
            CatalogAction::ProductsLoaded { .. } | CatalogAction::ProductsLoadFailed { .. }
        ) {
            break;
        }
    }

    store
        .state(|state| {
            println!("Matches: {}", state.total);
            for product in &state.products {
                println!("  {}", product.name);
            }

            let stats = selectors::catalog_stats(state);
            println!(
                "\nStats: {} shown, {} active, {} inactive, {} low stock, {} out of stock",
                stats.count, stats.active, stats.inactive, stats.low_stock, stats.out_of_stock
            );
            println!("Inventory value: {:.2}", stats.inventory_value);
        })
        .await;

    store.shutdown(Duration::from_secs(5)).await?;
    Ok(())
}
