//! Pagination cursor bookkeeping.
//!
//! The cursor is the single authority on which page to fetch next and
//! whether a fetch is already in flight. Every request it hands out is
//! stamped with the cursor's generation; a response whose generation no
//! longer matches (the term changed while it was in flight) is stale and
//! must be dropped by the caller.

use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::types::Image;

/// Default number of images per search page.
pub const DEFAULT_PAGE_SIZE: u32 = 40;

/// Maximum page size accepted from configuration.
pub const MAX_PAGE_SIZE: u32 = 500;

/// A page fetch handed out by [`Cursor::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub term: String,
    pub page: u32,
    pub limit: u32,
    pub generation: u64,
}

/// Result of reconciling a response with the current cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// The response belongs to the current search and was recorded.
    Applied,
    /// The term changed since the request went out; drop the response.
    Stale,
}

#[derive(Debug, Clone)]
pub struct Cursor {
    term: String,
    /// Next page to request (1-based).
    page: u32,
    limit: u32,
    has_more: bool,
    loading: bool,
    generation: u64,
}

impl Cursor {
    pub fn new(limit: u32) -> Self {
        Self {
            term: String::new(),
            page: 1,
            limit: limit.max(1),
            has_more: true,
            loading: false,
            generation: 0,
        }
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new search session for `term`.
    ///
    /// Any request still in flight becomes stale.
    pub fn reset(&mut self, term: impl Into<String>) {
        self.term = term.into();
        self.page = 1;
        self.has_more = true;
        self.loading = false;
        self.generation += 1;
    }

    /// Claim the next page fetch.
    ///
    /// Returns `None` while a fetch is in flight or once the server has
    /// reported no more pages.
    pub fn begin(&mut self) -> Option<PageRequest> {
        if self.loading || !self.has_more {
            return None;
        }
        self.loading = true;
        Some(PageRequest {
            term: self.term.clone(),
            page: self.page,
            limit: self.limit,
            generation: self.generation,
        })
    }

    /// Record a successful response for `request`.
    pub fn complete(&mut self, request: &PageRequest, has_more: bool) -> Reconcile {
        if !self.is_current(request) {
            return Reconcile::Stale;
        }
        self.loading = false;
        self.page += 1;
        self.has_more = has_more;
        Reconcile::Applied
    }

    /// Record a failed fetch. The page is not advanced so the same page
    /// is fetched again on the next trigger.
    pub fn fail(&mut self, request: &PageRequest) -> Reconcile {
        if !self.is_current(request) {
            return Reconcile::Stale;
        }
        self.loading = false;
        Reconcile::Applied
    }

    /// Mark the session as fully loaded (used after a full listing).
    pub fn exhaust(&mut self) {
        self.loading = false;
        self.has_more = false;
    }

    fn is_current(&self, request: &PageRequest) -> bool {
        request.generation == self.generation && request.page == self.page && self.loading
    }
}

/// Decide whether more pages exist after `request`.
///
/// An empty page always ends the session. Otherwise an explicit
/// `has_more` flag wins, then a `total` count; with neither a full page
/// is taken to mean there may be more.
pub fn resolve_has_more(
    request: &PageRequest,
    has_more: Option<bool>,
    total: Option<u64>,
    received: usize,
) -> bool {
    if received == 0 {
        return false;
    }
    if let Some(flag) = has_more {
        return flag;
    }
    if let Some(total) = total {
        return u64::from(request.page) * u64::from(request.limit) < total;
    }
    received as u64 >= u64::from(request.limit)
}

/// Drop images already present in `catalog` or repeated within `page`.
///
/// Returns the distinct images and how many were removed.
pub fn distinct_page(catalog: &Catalog, page: Vec<Image>) -> (Vec<Image>, usize) {
    let mut seen: HashSet<String> = catalog.read().iter().map(|i| i.id.clone()).collect();
    let before = page.len();
    let kept: Vec<Image> = page
        .into_iter()
        .filter(|image| seen.insert(image.id.clone()))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}
