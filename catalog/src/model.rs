//! Domain types for the product catalog.
//!
//! The product shape mirrors the backend's JSON contract: identifiers may be
//! numeric or opaque string tokens, timestamps are server-assigned ISO-8601
//! strings, and the image field carries a data URI when present.

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier for a product - numeric or opaque string token
///
/// The backend is loose about id types: some records carry numbers, some
/// carry numeric strings, some carry tokens like `"SKU-42"`. To keep
/// equality comparisons against in-memory selection state stable, every id
/// is normalized on deserialization: a string of only ASCII digits becomes
/// a number, any other string stays verbatim. Normalization is idempotent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ProductId {
    /// Numeric identifier
    Number(i64),
    /// Opaque string token (e.g. `"SKU-42"`)
    Token(String),
}

impl ProductId {
    /// Build an id from a raw string token, normalizing digit-only strings
    ///
    /// Digit strings that overflow `i64` are kept verbatim so that
    /// normalization stays total.
    #[must_use]
    pub fn from_token(token: String) -> Self {
        if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
            token
                .parse::<i64>()
                .map_or(ProductId::Token(token), ProductId::Number)
        } else {
            ProductId::Token(token)
        }
    }

    /// Normalize this id
    ///
    /// Numbers pass through; tokens are re-examined so that digit-only
    /// strings become numbers. Applying this twice yields the same value.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            ProductId::Number(n) => ProductId::Number(n),
            ProductId::Token(token) => Self::from_token(token),
        }
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Token(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => ProductId::Number(n),
            RawId::Token(token) => ProductId::from_token(token),
        })
    }
}

impl From<i64> for ProductId {
    fn from(n: i64) -> Self {
        ProductId::Number(n)
    }
}

impl From<&str> for ProductId {
    fn from(token: &str) -> Self {
        ProductId::from_token(token.to_string())
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductId::Number(n) => write!(f, "{n}"),
            ProductId::Token(token) => write!(f, "{token}"),
        }
    }
}

/// Availability status of a product
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// Product is visible and purchasable
    Active,
    /// Product is hidden from the storefront
    Inactive,
}

impl ProductStatus {
    /// Returns the opposite status
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            ProductStatus::Active => ProductStatus::Inactive,
            ProductStatus::Inactive => ProductStatus::Active,
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductStatus::Active => write!(f, "active"),
            ProductStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// A product record as owned by the backend
///
/// The store holds transient, possibly-stale copies; the backend remains the
/// source of truth and assigns id and timestamps on write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (normalized on every read path)
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Optional free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price
    pub price: f64,
    /// Units in stock
    pub stock: i64,
    /// Availability status
    pub status: ProductStatus,
    /// Optional image reference (data URI)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Server-assigned creation timestamp (ISO-8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Server-assigned update timestamp (ISO-8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Product {
    /// Returns a copy of this product with its id normalized
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.id = self.id.normalized();
        self
    }
}

/// Fields for creating a new product (the server assigns id and timestamps)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    /// Display name
    pub name: String,
    /// Optional free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price
    pub price: f64,
    /// Units in stock
    pub stock: i64,
    /// Availability status
    pub status: ProductStatus,
    /// Optional image reference (data URI)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Full update payload for an existing product
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    /// Identifier of the product to update
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Optional free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price
    pub price: f64,
    /// Units in stock
    pub stock: i64,
    /// Availability status
    pub status: ProductStatus,
    /// Optional image reference (data URI)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&Product> for ProductUpdate {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            status: product.status,
            image: product.image.clone(),
        }
    }
}

/// Validation rule constants shared with the presentation layer
pub mod rules {
    /// Minimum name length after trimming
    pub const NAME_MIN_LEN: usize = 3;
    /// Maximum name length
    pub const NAME_MAX_LEN: usize = 100;
    /// Minimum price
    pub const PRICE_MIN: f64 = 0.01;
    /// Minimum stock level
    pub const STOCK_MIN: i64 = 0;
    /// Maximum description length
    pub const DESCRIPTION_MAX_LEN: usize = 500;
}

/// Validates a create payload against the catalog rules
///
/// # Errors
///
/// Returns a human-readable message for the first violated rule.
pub fn validate_new_product(draft: &NewProduct) -> Result<(), String> {
    let name = draft.name.trim();
    if name.len() < rules::NAME_MIN_LEN {
        return Err(format!(
            "Product name must be at least {} characters",
            rules::NAME_MIN_LEN
        ));
    }
    if name.len() > rules::NAME_MAX_LEN {
        return Err(format!(
            "Product name must be at most {} characters",
            rules::NAME_MAX_LEN
        ));
    }
    if draft.price < rules::PRICE_MIN {
        return Err(format!("Price must be at least {}", rules::PRICE_MIN));
    }
    if draft.stock < rules::STOCK_MIN {
        return Err("Stock cannot be negative".to_string());
    }
    if let Some(description) = &draft.description {
        if description.len() > rules::DESCRIPTION_MAX_LEN {
            return Err(format!(
                "Description must be at most {} characters",
                rules::DESCRIPTION_MAX_LEN
            ));
        }
    }
    Ok(())
}
