//! Offset pagination shared by every query backend.
//!
//! A [`PageRequest`] is translated into a backend offset and size; the
//! backend's total hit count is turned back into [`Pagination`] metadata.

use serde::Serialize;

use crate::document::QueryResult;
use crate::errors::PaginationError;

/// Default number of results per page.
pub const DEFAULT_PER_PAGE: u64 = 10;

/// A validated request for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    per_page: u64,
}

impl PageRequest {
    /// Create a page request. Pages are numbered from 1.
    pub fn new(page: u64, per_page: u64) -> Result<Self, PaginationError> {
        if page == 0 {
            return Err(PaginationError::InvalidPage(page));
        }
        if per_page == 0 {
            return Err(PaginationError::InvalidPerPage(per_page));
        }
        Ok(Self { page, per_page })
    }

    /// The first page with the given size.
    pub fn first(per_page: u64) -> Result<Self, PaginationError> {
        Self::new(1, per_page)
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Zero-based number of hits to skip: `(page - 1) * per_page`.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// How many hits this page should hold when `total` hits match.
    pub fn expected_len(&self, total: u64) -> u64 {
        total.saturating_sub(self.offset()).min(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Pagination metadata derived from a total count and a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub pages: u64,
    pub next_page: Option<u64>,
    pub previous_page: Option<u64>,
}

impl Pagination {
    /// Derive metadata from the backend's reported total.
    pub fn from_count(request: &PageRequest, total: u64) -> Self {
        let pages = total.div_ceil(request.per_page);
        let page = request.page;

        Self {
            page,
            per_page: request.per_page,
            total,
            pages,
            next_page: (page < pages).then(|| page + 1),
            previous_page: (page > 1).then(|| page - 1),
        }
    }

    pub fn has_next(&self) -> bool {
        self.next_page.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous_page.is_some()
    }

    /// True when no page follows this one.
    pub fn is_last_page(&self) -> bool {
        !self.has_next()
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPage {
    pub results: Vec<QueryResult>,
    pub pagination: Pagination,
}

impl QueryPage {
    /// An empty page for the given request.
    pub fn empty(request: &PageRequest) -> Self {
        Self {
            results: Vec::new(),
            pagination: Pagination::from_count(request, 0),
        }
    }
}
