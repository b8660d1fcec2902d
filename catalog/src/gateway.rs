//! Remote collection gateway for the product backend.
//!
//! The backend is a plain JSON REST collection at `{base_url}/products`.
//! Every error is folded into a small set of human-readable messages so the
//! state layer can surface them directly. Reads are retried on transient
//! failures; mutations are sent exactly once so a retried POST can never
//! create a duplicate record.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use storekit_core::environment::{Clock, SystemClock};
use storekit_runtime::retry::{RetryPolicy, retry_if};

use crate::model::{NewProduct, Product, ProductId, ProductUpdate};

/// Errors surfaced by the product gateway
///
/// The display strings are the exact messages shown to operators, so they
/// are part of the contract and covered by tests.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// Transport-level failure (connection refused, timeout, bad payload)
    #[error("An unexpected error occurred")]
    Network,

    /// The requested product does not exist
    #[error("Product not found")]
    NotFound,

    /// The server rejected the payload
    #[error("Invalid product data")]
    InvalidData,

    /// A product with the same name already exists
    #[error("Product with this name already exists")]
    Conflict,

    /// The server failed internally
    #[error("Internal server error")]
    ServerError,

    /// Any other HTTP error
    #[error("Server returned code: {status}, error message is: {message}")]
    Unexpected {
        /// HTTP status code
        status: u16,
        /// Status text or body excerpt
        message: String,
    },
}

impl GatewayError {
    /// Whether a retry could plausibly succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            GatewayError::Network | GatewayError::ServerError => true,
            GatewayError::Unexpected { status, .. } => *status >= 500,
            GatewayError::NotFound | GatewayError::InvalidData | GatewayError::Conflict => false,
        }
    }
}

/// Boxed future returned by gateway operations
pub type GatewayFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Access to the remote product collection
///
/// Boxed futures keep the trait dyn-compatible so the environment can hold
/// an `Arc<dyn ProductGateway>` and tests can substitute scripted fakes.
pub trait ProductGateway: Send + Sync {
    /// Fetch the entire product collection
    fn fetch_all(&self) -> GatewayFuture<'_, Vec<Product>>;

    /// Fetch a single product by id
    fn fetch_one(&self, id: ProductId) -> GatewayFuture<'_, Product>;

    /// Create a product; the server assigns id and timestamps
    fn create(&self, draft: NewProduct) -> GatewayFuture<'_, Product>;

    /// Replace an existing product
    fn update(&self, update: ProductUpdate) -> GatewayFuture<'_, Product>;

    /// Delete a product by id
    fn delete(&self, id: ProductId) -> GatewayFuture<'_, ()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBody<'a> {
    #[serde(flatten)]
    draft: &'a NewProduct,
    created_at: String,
    updated_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody<'a> {
    #[serde(flatten)]
    update: &'a ProductUpdate,
    updated_at: String,
}

/// HTTP implementation of [`ProductGateway`] backed by `reqwest`
///
/// Reads go through [`retry_if`] with two extra attempts for
/// transient errors. Timestamps on writes are stamped from the injected
/// clock so request bodies stay deterministic under test.
pub struct HttpProductGateway {
    client: reqwest::Client,
    base_url: String,
    clock: Arc<dyn Clock>,
    read_retry: RetryPolicy,
}

impl HttpProductGateway {
    /// Create a gateway against the given base URL (no trailing slash)
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            clock: Arc::new(SystemClock),
            read_retry: RetryPolicy::new(2).with_initial_delay(Duration::from_millis(200)),
        }
    }

    /// Use a preconfigured `reqwest` client
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Override the clock used to stamp write timestamps
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Override the read retry policy
    #[must_use]
    pub fn with_read_retry(mut self, policy: RetryPolicy) -> Self {
        self.read_retry = policy;
        self
    }

    fn collection_url(&self) -> String {
        format!("{}/products", self.base_url)
    }

    fn item_url(&self, id: &ProductId) -> String {
        format!("{}/products/{id}", self.base_url)
    }

    fn now_rfc3339(&self) -> String {
        self.clock
            .now()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
        let response = Self::check_status(response).await?;
        response.json::<T>().await.map_err(|err| {
            tracing::warn!(error = %err, "Failed to decode response body");
            GatewayError::Network
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(match status.as_u16() {
            404 => GatewayError::NotFound,
            400 => GatewayError::InvalidData,
            409 => GatewayError::Conflict,
            500 => GatewayError::ServerError,
            code => {
                let message = response.text().await.unwrap_or_else(|_| {
                    status.canonical_reason().unwrap_or("Unknown").to_string()
                });
                GatewayError::Unexpected {
                    status: code,
                    message,
                }
            },
        })
    }

    async fn fetch_all_once(&self) -> Result<Vec<Product>, GatewayError> {
        let response = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, "Product collection request failed");
                GatewayError::Network
            })?;
        let products: Vec<Product> = Self::decode(response).await?;
        Ok(products.into_iter().map(Product::normalized).collect())
    }

    async fn fetch_one_once(&self, id: &ProductId) -> Result<Product, GatewayError> {
        let response = self
            .client
            .get(self.item_url(id))
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(error = %err, %id, "Product request failed");
                GatewayError::Network
            })?;
        let product: Product = Self::decode(response).await?;
        Ok(product.normalized())
    }
}

impl ProductGateway for HttpProductGateway {
    fn fetch_all(&self) -> GatewayFuture<'_, Vec<Product>> {
        Box::pin(async move {
            retry_if(
                &self.read_retry,
                || self.fetch_all_once(),
                GatewayError::is_transient,
            )
            .await
        })
    }

    fn fetch_one(&self, id: ProductId) -> GatewayFuture<'_, Product> {
        Box::pin(async move {
            retry_if(
                &self.read_retry,
                || self.fetch_one_once(&id),
                GatewayError::is_transient,
            )
            .await
        })
    }

    fn create(&self, draft: NewProduct) -> GatewayFuture<'_, Product> {
        Box::pin(async move {
            let now = self.now_rfc3339();
            let body = CreateBody {
                draft: &draft,
                created_at: now.clone(),
                updated_at: now,
            };
            let response = self
                .client
                .post(self.collection_url())
                .json(&body)
                .send()
                .await
                .map_err(|err| {
                    tracing::warn!(error = %err, "Product create request failed");
                    GatewayError::Network
                })?;
            let product: Product = Self::decode(response).await?;
            Ok(product.normalized())
        })
    }

    fn update(&self, update: ProductUpdate) -> GatewayFuture<'_, Product> {
        Box::pin(async move {
            let body = UpdateBody {
                update: &update,
                updated_at: self.now_rfc3339(),
            };
            let response = self
                .client
                .put(self.item_url(&update.id))
                .json(&body)
                .send()
                .await
                .map_err(|err| {
                    tracing::warn!(error = %err, id = %update.id, "Product update request failed");
                    GatewayError::Network
                })?;
            let product: Product = Self::decode(response).await?;
            Ok(product.normalized())
        })
    }

    fn delete(&self, id: ProductId) -> GatewayFuture<'_, ()> {
        Box::pin(async move {
            let response = self
                .client
                .delete(self.item_url(&id))
                .send()
                .await
                .map_err(|err| {
                    tracing::warn!(error = %err, %id, "Product delete request failed");
                    GatewayError::Network
                })?;
            Self::check_status(response).await?;
            Ok(())
        })
    }
}
