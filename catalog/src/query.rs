//! In-memory query engine over the product collection.
//!
//! The backend returns the full collection; searching, filtering, sorting
//! and pagination all happen client-side in [`apply_query`]. The function is
//! pure so that the same collection and query always produce the same page.
//!
//! Steps run in a fixed order: search, status filter, sort, total count,
//! pagination. The total therefore reflects the filtered collection before
//! it is cut into pages.

use serde::{Deserialize, Serialize};

use crate::model::{Product, ProductStatus};

/// Status filter applied during queries
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    /// Keep every product regardless of status
    #[default]
    All,
    /// Keep only active products
    Active,
    /// Keep only inactive products
    Inactive,
}

impl StatusFilter {
    /// Whether a product with the given status passes this filter
    #[must_use]
    pub const fn matches(self, status: ProductStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => matches!(status, ProductStatus::Active),
            StatusFilter::Inactive => matches!(status, ProductStatus::Inactive),
        }
    }
}

/// Field a query sorts by
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    /// Sort by display name
    #[default]
    Name,
    /// Sort by unit price
    Price,
    /// Sort by stock level
    Stock,
    /// Sort by creation timestamp
    CreatedAt,
}

/// Sort direction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

/// Page size used for total-page computation when no limit is set
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Complete query over the product collection
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    /// Case-insensitive substring matched against name and description
    pub search: String,
    /// Status filter
    pub status: StatusFilter,
    /// Sort field; when `None` the collection keeps its incoming order
    pub sort_field: Option<SortField>,
    /// Sort direction (only meaningful when a sort field is set)
    pub sort_order: SortOrder,
    /// 1-based page number; pagination applies only when both page and
    /// limit are set
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: StatusFilter::All,
            sort_field: Some(SortField::Name),
            sort_order: SortOrder::Asc,
            page: Some(1),
            limit: Some(DEFAULT_PAGE_SIZE),
        }
    }
}

impl ProductQuery {
    /// Merge a partial update into this query, field by field
    pub fn merge(&mut self, patch: QueryPatch) {
        if let Some(search) = patch.search {
            self.search = search;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(sort_field) = patch.sort_field {
            self.sort_field = Some(sort_field);
        }
        if let Some(sort_order) = patch.sort_order {
            self.sort_order = sort_order;
        }
        if let Some(page) = patch.page {
            self.page = Some(page);
        }
        if let Some(limit) = patch.limit {
            self.limit = Some(limit);
        }
    }
}

/// Partial query update; `None` fields leave the current value untouched
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPatch {
    /// New search term
    pub search: Option<String>,
    /// New status filter
    pub status: Option<StatusFilter>,
    /// New sort field
    pub sort_field: Option<SortField>,
    /// New sort direction
    pub sort_order: Option<SortOrder>,
    /// New page number
    pub page: Option<u32>,
    /// New page size
    pub limit: Option<u32>,
}

impl QueryPatch {
    /// Patch that only changes the page number
    #[must_use]
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    /// Patch that only changes the search term
    #[must_use]
    pub fn search(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
            ..Self::default()
        }
    }

    /// Patch that only changes the status filter
    #[must_use]
    pub fn status(status: StatusFilter) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// One page of query results
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    /// Products on this page, in query order
    pub products: Vec<Product>,
    /// Size of the filtered collection before pagination
    pub total: usize,
    /// 1-based page number this slice represents
    pub page: u32,
    /// Total pages at the effective page size
    pub total_pages: u32,
}

/// Runs a query against the full collection and returns the requested page
///
/// Search matches case-insensitively against name and description (a missing
/// description never matches). Sorting is stable, string fields compare
/// case-insensitively, and prices compare by total order so NaN cannot
/// poison the sort. A page past the end yields an empty slice while `total`
/// still reflects the filtered collection.
#[must_use]
pub fn apply_query(products: &[Product], query: &ProductQuery) -> ProductPage {
    let needle = query.search.trim().to_lowercase();

    let mut rows: Vec<Product> = products
        .iter()
        .filter(|p| matches_search(p, &needle))
        .filter(|p| query.status.matches(p.status))
        .cloned()
        .collect();

    if let Some(field) = query.sort_field {
        rows.sort_by(|a, b| {
            let ordering = compare_by_field(a, b, field);
            match query.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    let total = rows.len();
    let effective_limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let total_pages = u32::try_from(total.div_ceil(effective_limit as usize)).unwrap_or(u32::MAX);

    if let (Some(page), Some(limit)) = (query.page, query.limit) {
        let start = (page.max(1) as usize - 1).saturating_mul(limit as usize);
        rows = rows.into_iter().skip(start).take(limit as usize).collect();
    }

    ProductPage {
        products: rows,
        total,
        page: query.page.unwrap_or(1),
        total_pages,
    }
}

fn matches_search(product: &Product, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if product.name.to_lowercase().contains(needle) {
        return true;
    }
    product
        .description
        .as_deref()
        .is_some_and(|d| d.to_lowercase().contains(needle))
}

fn compare_by_field(a: &Product, b: &Product, field: SortField) -> std::cmp::Ordering {
    match field {
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Price => a.price.total_cmp(&b.price),
        SortField::Stock => a.stock.cmp(&b.stock),
        SortField::CreatedAt => {
            let left = a.created_at.as_deref().unwrap_or("");
            let right = b.created_at.as_deref().unwrap_or("");
            left.cmp(right)
        },
    }
}
