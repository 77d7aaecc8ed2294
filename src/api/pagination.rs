//! Pagination primitives shared by the list/search endpoints.

use serde::{Deserialize, Serialize};

/// Query parameters accepted by paginated endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    /// Page number (0-indexed).
    #[serde(default)]
    pub page: usize,
    /// Page size (default 10, capped at 100).
    #[serde(default = "default_page_size")]
    pub size: usize,
    /// Sort field; each endpoint whitelists its own fields and falls back
    /// to its default for unknown values.
    pub sort: Option<String>,
    /// Sort direction: `asc` (default) or `desc`.
    pub direction: Option<String>,
}

const fn default_page_size() -> usize {
    10
}

impl PageQuery {
    /// Page size clamped to `1..=100`.
    #[must_use]
    pub fn effective_size(&self) -> usize {
        self.size.clamp(1, 100)
    }

    /// Whether results should be sorted descending.
    #[must_use]
    pub fn is_descending(&self) -> bool {
        self.direction
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case("desc"))
    }

    /// The requested sort field, if any.
    #[must_use]
    pub fn sort_field(&self) -> Option<&str> {
        self.sort.as_deref()
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_page_size(),
            sort: None,
            direction: None,
        }
    }
}

/// A page of results plus the bookkeeping clients need to iterate.
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    /// The page's items.
    pub content: Vec<T>,
    /// The page that was returned (0-indexed).
    pub current_page: usize,
    /// The effective page size.
    pub page_size: usize,
    /// Total items across all pages.
    pub total_elements: usize,
    /// Total number of pages.
    pub total_pages: usize,
}

impl<T> PageResponse<T> {
    /// Slice an already sorted collection into the requested page.
    #[must_use]
    pub fn paginate(items: Vec<T>, query: &PageQuery) -> Self {
        let size = query.effective_size();
        let total_elements = items.len();
        let total_pages = total_elements.div_ceil(size);
        let content: Vec<T> = items
            .into_iter()
            .skip(query.page.saturating_mul(size))
            .take(size)
            .collect();
        Self {
            content,
            current_page: query.page,
            page_size: size,
            total_elements,
            total_pages,
        }
    }
}
