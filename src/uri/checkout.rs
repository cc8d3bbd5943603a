//
//  scm-bitbucket
//  uri/checkout.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Checkout URL Parsing
//!
//! Parses the human-facing git URLs users configure for their pipelines.
//!
//! ## Supported URL Formats
//!
//! - SSH: `git@bitbucket.org:batman/test.git`
//! - HTTPS: `https://bitbucket.org/batman/test.git`
//! - HTTPS with user: `https://batman@bitbucket.org/batman/test.git`
//!
//! Any of these may carry a `#branch` or `#branch:path/to/dir` suffix
//! naming the branch and the source directory inside the repository.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::common::{Result, ScmError};

/// Pattern for checkout URLs.
///
/// # Capture Groups
/// 1. Host (e.g., "bitbucket.org")
/// 2. Owner/workspace (e.g., "batman")
/// 3. Repository slug (e.g., "test")
/// 4. Optional fragment including the `#` (e.g., "#main:src/app")
static CHECKOUT_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:https://(?:[^@/:\s]+@)?)|git@)([^/:\s]+)(?:/|:)([^/:\s]+)/([^\s]+?)(?:\.git)(#[^\s]*)?$",
    )
    .unwrap()
});

/// Components of a checkout URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutUrlInfo {
    pub hostname: String,
    /// Workspace that owns the repository.
    pub owner: String,
    /// Repository slug.
    pub repo: String,
    pub branch: Option<String>,
    pub root_dir: Option<String>,
}

impl CheckoutUrlInfo {
    /// `owner/repo`, the path segment used by the repository endpoints.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Returns whether `url` follows the checkout URL grammar.
pub fn is_checkout_url(url: &str) -> bool {
    CHECKOUT_URL_PATTERN.is_match(url)
}

/// Parses a checkout URL.
///
/// `root_dir` overrides the directory named in the URL fragment when it is
/// set and non-empty.
///
/// # Errors
///
/// Returns [`ScmError::InvalidUrl`] when the URL does not match the grammar.
///
/// # Example
///
/// ```rust
/// use scm_bitbucket::uri::parse_checkout_url;
///
/// let info = parse_checkout_url("git@bitbucket.org:batman/test.git#main:app", None).unwrap();
/// assert_eq!(info.hostname, "bitbucket.org");
/// assert_eq!(info.full_name(), "batman/test");
/// assert_eq!(info.branch.as_deref(), Some("main"));
/// assert_eq!(info.root_dir.as_deref(), Some("app"));
/// ```
pub fn parse_checkout_url(url: &str, root_dir: Option<&str>) -> Result<CheckoutUrlInfo> {
    let caps = CHECKOUT_URL_PATTERN
        .captures(url)
        .ok_or_else(|| ScmError::InvalidUrl(url.to_string()))?;

    let fragment = caps
        .get(4)
        .map(|m| m.as_str().trim_start_matches('#'))
        .unwrap_or_default();
    let (branch, fragment_dir) = match fragment.split_once(':') {
        Some((branch, dir)) => (branch, dir),
        None => (fragment, ""),
    };

    let root_dir = root_dir
        .filter(|dir| !dir.is_empty())
        .or_else(|| non_empty(fragment_dir));

    Ok(CheckoutUrlInfo {
        hostname: caps[1].to_string(),
        owner: caps[2].to_string(),
        repo: caps[3].to_string(),
        branch: non_empty(branch).map(String::from),
        root_dir: root_dir.map(String::from),
    })
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssh_url() {
        let info = parse_checkout_url("git@bitbucket.org:batman/test.git", None).unwrap();
        assert_eq!(info.hostname, "bitbucket.org");
        assert_eq!(info.owner, "batman");
        assert_eq!(info.repo, "test");
        assert_eq!(info.branch, None);
        assert_eq!(info.root_dir, None);
    }

    #[test]
    fn test_https_url_with_user_and_fragment() {
        let info = parse_checkout_url(
            "https://batman@bitbucket.org/batman/test.git#feature/x:lib/core",
            None,
        )
        .unwrap();
        assert_eq!(info.hostname, "bitbucket.org");
        assert_eq!(info.full_name(), "batman/test");
        assert_eq!(info.branch.as_deref(), Some("feature/x"));
        assert_eq!(info.root_dir.as_deref(), Some("lib/core"));
    }

    #[test]
    fn test_branch_only_fragment() {
        let info = parse_checkout_url("https://bitbucket.org/batman/test.git#develop", None).unwrap();
        assert_eq!(info.branch.as_deref(), Some("develop"));
        assert_eq!(info.root_dir, None);
    }

    #[test]
    fn test_root_dir_override_wins() {
        let info =
            parse_checkout_url("git@bitbucket.org:batman/test.git#main:from-url", Some("override"))
                .unwrap();
        assert_eq!(info.root_dir.as_deref(), Some("override"));

        let info =
            parse_checkout_url("git@bitbucket.org:batman/test.git#main:from-url", Some("")).unwrap();
        assert_eq!(info.root_dir.as_deref(), Some("from-url"));
    }

    #[test]
    fn test_empty_fragment_branch_is_absent() {
        let info = parse_checkout_url("git@bitbucket.org:batman/test.git#:docs", None).unwrap();
        assert_eq!(info.branch, None);
        assert_eq!(info.root_dir.as_deref(), Some("docs"));
    }

    #[test]
    fn test_invalid_urls() {
        for url in [
            "bitbucket.org/batman/test.git",
            "https://bitbucket.org/batman/test",
            "http://bitbucket.org/batman/test.git",
            "git@bitbucket.org:test.git",
        ] {
            let err = parse_checkout_url(url, None).unwrap_err();
            assert!(matches!(err, ScmError::InvalidUrl(_)), "{} should be rejected", url);
        }
    }

    #[test]
    fn test_is_checkout_url() {
        assert!(is_checkout_url("git@bitbucket.org:batman/test.git#main:screwdriver.yaml"));
        assert!(!is_checkout_url("screwdriver.yaml"));
    }
}
