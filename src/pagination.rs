use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// PageMeta
///
/// Page-oriented metadata derived from an offset/limit window over a counted
/// collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    pub page: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Converts a `(total_count, skip, limit)` triple into page metadata.
///
/// - `page = skip / limit + 1` when `limit > 0`, else `1`.
/// - `total_pages = ceil(total_count / limit)` when `limit > 0`, floored at 1
///   so an empty collection still reports a single (empty) page.
/// - `limit = 0` is defined to short-circuit to page 1 / total_pages 1 rather
///   than dividing by zero. This is contract, not an accidental omission.
///
/// Pure function; holds for all non-negative `skip` and `total_count`.
pub fn page_metadata(total_count: i64, skip: i64, limit: i64) -> PageMeta {
    let page = if limit > 0 { skip / limit + 1 } else { 1 };
    let total_pages = if limit > 0 {
        ((total_count + limit - 1) / limit).max(1)
    } else {
        1
    };

    PageMeta {
        page,
        total_pages,
        has_next: page < total_pages,
        has_previous: page > 1,
    }
}

/// Paginated
///
/// Generic paginated response envelope for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    /// Items for the current page.
    pub items: Vec<T>,
    /// Total number of items available across all pages.
    pub total_count: i64,
    /// Current page number (1-based, derived from skip/limit).
    pub page: i64,
    /// Requested page size.
    pub page_size: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Paginated<T> {
    /// Assembles the envelope for one page of `items` out of `total_count`.
    pub fn new(items: Vec<T>, total_count: i64, skip: i64, limit: i64) -> Self {
        let meta = page_metadata(total_count, skip, limit);
        Self {
            items,
            total_count,
            page: meta.page,
            page_size: limit,
            total_pages: meta.total_pages,
            has_next: meta.has_next,
            has_previous: meta.has_previous,
        }
    }
}
