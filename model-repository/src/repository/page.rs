//! Paged query results
//!
//! A [`Page`] is what [`QueryTarget::paginate`](super::QueryTarget::paginate)
//! produces: one slice of the matching records plus the metadata needed to
//! navigate the rest. The caller's request query parameters ride along on the
//! page so that links to neighbouring pages keep the caller's other filters.
//!
//! # Example
//!
//! ```rust
//! use model_repository::repository::{Page, PageRequest};
//!
//! let request = PageRequest::from_query([("page", "2"), ("status", "active")]);
//! let page = Page::new(vec!["c", "d"], 2, request.page(), 5)
//!     .with_path("/users")
//!     .appends(request.query().clone());
//!
//! assert_eq!(page.last_page, 3);
//! assert_eq!(page.url(3), "/users?status=active&page=3");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One page of records with navigation metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    /// The records on this page
    pub items: Vec<T>,
    /// Number of items per page
    pub per_page: u64,
    /// Current page number (1-indexed)
    pub current_page: u64,
    /// Total number of matching records across all pages
    pub total: u64,
    /// Number of the last page (at least 1)
    pub last_page: u64,
    /// Base path used when rendering page links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Query parameters carried into every page link
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
}

impl<T> Page<T> {
    /// Create a page, computing `last_page` from `total` and `per_page`
    #[must_use]
    pub fn new(items: Vec<T>, per_page: u64, current_page: u64, total: u64) -> Self {
        let per_page = per_page.max(1);
        Self {
            items,
            per_page,
            current_page: current_page.max(1),
            total,
            last_page: calculate_last_page(total, per_page),
            path: None,
            query: BTreeMap::new(),
        }
    }

    /// Set the base path used by [`Page::url`]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Carry query parameters into every page link
    ///
    /// A `page` parameter is ignored; the link target decides it.
    #[must_use]
    pub fn appends<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in params {
            let key = key.into();
            if key != PAGE_PARAM {
                self.query.insert(key, value.into());
            }
        }
        self
    }

    /// Whether a page follows this one
    #[must_use]
    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page
    }

    /// Whether this page holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 1-indexed position of the first item on this page, if any
    #[must_use]
    pub fn first_item(&self) -> Option<u64> {
        if self.items.is_empty() {
            return None;
        }
        Some((self.current_page - 1) * self.per_page + 1)
    }

    /// 1-indexed position of the last item on this page, if any
    #[must_use]
    pub fn last_item(&self) -> Option<u64> {
        self.first_item().map(|first| first + self.items.len() as u64 - 1)
    }

    /// Render the link for `page`, keeping the appended query parameters
    #[must_use]
    pub fn url(&self, page: u64) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.query {
            serializer.append_pair(key, value);
        }
        serializer.append_pair(PAGE_PARAM, &page.max(1).to_string());

        format!("{}?{}", self.path.as_deref().unwrap_or(""), serializer.finish())
    }

    /// Link to the next page, if there is one
    #[must_use]
    pub fn next_page_url(&self) -> Option<String> {
        self.has_more_pages().then(|| self.url(self.current_page + 1))
    }

    /// Link to the previous page, if there is one
    #[must_use]
    pub fn previous_page_url(&self) -> Option<String> {
        (self.current_page > 1).then(|| self.url(self.current_page - 1))
    }

    /// Transform the items, keeping the metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            per_page: self.per_page,
            current_page: self.current_page,
            total: self.total,
            last_page: self.last_page,
            path: self.path,
            query: self.query,
        }
    }
}

const PAGE_PARAM: &str = "page";

fn calculate_last_page(total: u64, per_page: u64) -> u64 {
    // Ceiling division, never below one page
    let pages = total.saturating_add(per_page).saturating_sub(1) / per_page;
    pages.max(1)
}

/// Caller-supplied request context for a paginated read
///
/// Holds the requested page number and the remaining query parameters of
/// the incoming request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    page: Option<u64>,
    query: BTreeMap<String, String>,
    path: Option<String>,
}

impl PageRequest {
    /// A request for the given page with no extra parameters
    #[must_use]
    pub fn page_number(page: u64) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    /// Build from raw query pairs
    ///
    /// A `page` pair that is not a positive integer falls back to page 1.
    pub fn from_query<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut request = Self::default();
        for (key, value) in pairs {
            let key = key.into();
            let value = value.into();
            if key == PAGE_PARAM {
                request.page = value.trim().parse().ok().filter(|page: &u64| *page > 0);
            } else {
                request.query.insert(key, value);
            }
        }
        request
    }

    /// Set the base path for page links
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// The requested page, defaulting to 1
    #[must_use]
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    /// The request's other query parameters
    #[must_use]
    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// The base path for page links, if any
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_page_calculation() {
        assert_eq!(Page::new(Vec::<u8>::new(), 10, 1, 0).last_page, 1);
        assert_eq!(Page::new(Vec::<u8>::new(), 10, 1, 10).last_page, 1);
        assert_eq!(Page::new(Vec::<u8>::new(), 10, 1, 11).last_page, 2);
    }

    #[test]
    fn test_zero_per_page_is_clamped() {
        let page = Page::new(vec![1], 0, 0, 3);
        assert_eq!(page.per_page, 1);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.last_page, 3);
    }

    #[test]
    fn test_item_positions() {
        let page = Page::new(vec!["k", "l"], 10, 2, 12);
        assert_eq!(page.first_item(), Some(11));
        assert_eq!(page.last_item(), Some(12));
        assert!(!page.has_more_pages());

        let empty = Page::new(Vec::<&str>::new(), 10, 3, 12);
        assert_eq!(empty.first_item(), None);
    }

    #[test]
    fn test_urls_keep_appended_parameters() {
        let page = Page::new(vec![1, 2], 2, 2, 6)
            .with_path("/posts")
            .appends([("q", "rust & co"), ("page", "9")]);

        assert_eq!(page.url(1), "/posts?q=rust+%26+co&page=1");
        assert_eq!(page.next_page_url().as_deref(), Some("/posts?q=rust+%26+co&page=3"));
        assert_eq!(
            page.previous_page_url().as_deref(),
            Some("/posts?q=rust+%26+co&page=1")
        );
    }

    #[test]
    fn test_page_request_from_query() {
        let request = PageRequest::from_query([("page", "3"), ("sort", "name")]);
        assert_eq!(request.page(), 3);
        assert_eq!(request.query().get("sort").map(String::as_str), Some("name"));
        assert!(!request.query().contains_key("page"));

        assert_eq!(PageRequest::from_query([("page", "zero")]).page(), 1);
        assert_eq!(PageRequest::from_query([("page", "0")]).page(), 1);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::new(vec![1, 2], 2, 1, 4).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20]);
        assert_eq!(page.total, 4);
        assert_eq!(page.last_page, 2);
    }

    #[test]
    fn test_page_serializes_without_empty_link_fields() {
        let json = serde_json::to_value(Page::new(vec![1], 10, 1, 1)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "items": [1],
                "per_page": 10,
                "current_page": 1,
                "total": 1,
                "last_page": 1
            })
        );
    }
}
