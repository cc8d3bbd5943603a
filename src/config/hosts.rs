//
//  scm-bitbucket
//  config/hosts.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Host Helpers
//!
//! Constants for the Bitbucket Cloud endpoints and the host comparison
//! helpers used when checking checkout URLs and webhook payloads against the
//! configured host.
//!
//! ## Usage
//!
//! ```rust
//! use scm_bitbucket::config::{host_of_url, normalize_host};
//!
//! assert_eq!(normalize_host("https://BITBUCKET.ORG/"), "bitbucket.org");
//! assert_eq!(
//!     host_of_url("https://bitbucket.org/batman/test").as_deref(),
//!     Some("bitbucket.org")
//! );
//! ```

use url::Url;

/// Web hostname of Bitbucket Cloud.
pub const BITBUCKET_CLOUD: &str = "bitbucket.org";

/// Base URL of the Bitbucket Cloud REST API v2.
pub const BITBUCKET_API_URL: &str = "https://api.bitbucket.org/2.0";

/// OAuth 2.0 token endpoint of Bitbucket Cloud.
pub const BITBUCKET_TOKEN_URL: &str = "https://bitbucket.org/site/oauth2/access_token";

/// Normalizes a host string for comparison.
///
/// Strips protocol prefixes and trailing slashes and lowercases the result.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = host.strip_prefix("https://").unwrap_or(host);
    let host = host.strip_prefix("http://").unwrap_or(host);
    let host = host.strip_suffix('/').unwrap_or(host);
    host.to_lowercase()
}

/// Extracts the lowercased host of an absolute URL.
///
/// Returns `None` when the string is not a URL or has no host.
pub fn host_of_url(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
}

/// Checks whether two host strings name the same host.
pub fn same_host(left: &str, right: &str) -> bool {
    normalize_host(left) == normalize_host(right)
}
