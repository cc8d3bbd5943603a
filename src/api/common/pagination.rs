//
//  scm-bitbucket
//  api/common/pagination.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Pagination Types for Bitbucket Cloud Responses
//!
//! Bitbucket Cloud list endpoints return a page envelope with `values`,
//! `page`, `pagelen` and an optional `next` link. The adapter walks pages by
//! explicit page number rather than by following `next`: a page holding
//! exactly `pagelen` items means another page may follow, a shorter page is
//! the last one.
//!
//! # Example
//!
//! ```rust
//! use scm_bitbucket::api::common::{page_path, PaginatedResponse};
//!
//! let json = r#"{"values": [{"name": "main"}], "page": 1, "pagelen": 100}"#;
//! let page: PaginatedResponse<serde_json::Value> = serde_json::from_str(json).unwrap();
//!
//! assert!(!page.is_full(100));
//! assert_eq!(
//!     page_path("/repositories/batman/test/refs/branches", 2, 100),
//!     "/repositories/batman/test/refs/branches?pagelen=100&page=2"
//! );
//! ```

use serde::{Deserialize, Serialize};

/// Paginated response from Bitbucket Cloud API.
///
/// # Type Parameters
///
/// - `T` - The type of items contained in the `values` array
///
/// # Fields
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `values` | `Vec<T>` | Array of items in the current page |
/// | `page` | `Option<u32>` | Current page number (1-indexed) |
/// | `pagelen` | `Option<u32>` | Number of items per page |
/// | `size` | `Option<u32>` | Total number of items across all pages |
/// | `next` | `Option<String>` | URL to fetch the next page |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// Array of items in the current page.
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,

    /// Current page number (1-indexed).
    #[serde(default)]
    pub page: Option<u32>,

    /// Number of items per page.
    #[serde(default)]
    pub pagelen: Option<u32>,

    /// Total number of items across all pages, when Bitbucket reports it.
    #[serde(default)]
    pub size: Option<u32>,

    /// URL to fetch the next page of results.
    #[serde(default)]
    pub next: Option<String>,
}

impl<T> PaginatedResponse<T> {
    /// Checks whether this page was filled to the requested page size.
    ///
    /// A full page is the continuation signal used by every paginated walk
    /// in the adapter: the next page is requested only when this returns
    /// `true`.
    pub fn is_full(&self, pagelen: u32) -> bool {
        self.values.len() >= pagelen as usize
    }
}

/// Appends `pagelen` and `page` query parameters to an API path.
///
/// Paths that already carry a query string get the parameters appended
/// with `&`.
pub fn page_path(path: &str, page: u32, pagelen: u32) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}pagelen={}&page={}", path, separator, pagelen, page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_path_appends_to_existing_query() {
        assert_eq!(
            page_path("/repositories/batman?q=uuid", 1, 30),
            "/repositories/batman?q=uuid&pagelen=30&page=1"
        );
    }

    #[test]
    fn test_missing_values_is_empty_page() {
        let page: PaginatedResponse<String> = serde_json::from_str("{}").unwrap();
        assert!(page.values.is_empty());
        assert!(!page.is_full(30));
    }
}
