//! Page-number pagination for list endpoints.
//!
//! `page` is 1-based. `page_size` is a number (clamped to 1..=100) or the
//! literal `all`, which disables pagination.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSize {
    All,
    Limit(i64),
}

/// Query parameters for paginated list endpoints.
#[derive(Debug, Deserialize, Default)]
pub struct PaginationQuery {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<String>,
}

/// A resolved LIMIT/OFFSET pair. SQLite treats a negative LIMIT as unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: i64,
    pub offset: i64,
}

impl PaginationQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> Result<PageSize> {
        match self.page_size.as_deref().map(str::trim) {
            None | Some("") => Ok(PageSize::Limit(DEFAULT_PAGE_SIZE)),
            Some("all") => Ok(PageSize::All),
            Some(raw) => raw
                .parse::<i64>()
                .map(|n| PageSize::Limit(n.clamp(1, MAX_PAGE_SIZE)))
                .map_err(|_| {
                    AppError::BadRequest(format!(
                        "page_size must be a number or 'all', got '{}'",
                        raw
                    ))
                }),
        }
    }

    pub fn window(&self) -> Result<Window> {
        Ok(match self.page_size()? {
            PageSize::All => Window {
                limit: -1,
                offset: 0,
            },
            PageSize::Limit(size) => Window {
                limit: size,
                offset: (self.page() - 1).checked_mul(size).ok_or_else(|| {
                    AppError::BadRequest(format!("page {} is out of range", self.page()))
                })?,
            },
        })
    }
}

/// Paginated response wrapper for list endpoints.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    /// Total number of items across all pages
    pub count: i64,
    /// Next page number, if any
    pub next: Option<i64>,
    /// Previous page number, if any
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(results: Vec<T>, count: i64, query: &PaginationQuery, window: Window) -> Self {
        let (next, previous) = if window.limit < 0 {
            (None, None)
        } else {
            let page = query.page();
            let next = window
                .offset
                .checked_add(window.limit)
                .filter(|end| *end < count)
                .and_then(|_| page.checked_add(1));
            let previous = (page > 1).then_some(page - 1);
            (next, previous)
        };

        Self {
            count,
            next,
            previous,
            results,
        }
    }
}
