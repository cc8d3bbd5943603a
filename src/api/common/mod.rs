//
//  scm-bitbucket
//  api/common/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Common API Types for the Bitbucket adapter
//!
//! This module provides the error type shared by every layer of the adapter,
//! together with the small link types that appear in most Bitbucket Cloud
//! resources.
//!
//! # Overview
//!
//! - [`ScmError`] - Unified error type for all adapter operations
//! - [`Link`] - HATEOAS-style link representation
//! - Pagination types (re-exported from [`pagination`] submodule)
//!
//! # Example
//!
//! ```rust
//! use scm_bitbucket::api::common::ScmError;
//!
//! fn describe(result: Result<String, ScmError>) -> String {
//!     match result {
//!         Ok(content) => content,
//!         Err(err) if err.is_status(404) => "missing".to_string(),
//!         Err(err) => format!("failed: {}", err),
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod pagination;

pub use pagination::*;

/// Errors raised by the adapter.
///
/// Variants map onto the orchestrator's error taxonomy: configuration
/// problems are fatal at construction, URL and host problems are reported as
/// `400`, and provider failures keep the status code Bitbucket returned.
#[derive(Error, Debug)]
pub enum ScmError {
    /// The adapter configuration failed validation.
    #[error("Invalid configuration: {0}")]
    Validation(String),

    /// A checkout URL did not match the supported grammar.
    #[error("Invalid scmUrl: {0}")]
    InvalidUrl(String),

    /// A checkout URL points at a host other than the configured one.
    #[error("This checkoutUrl is not supported for your current login host: {0}")]
    UnsupportedHost(String),

    /// A webhook payload came from a host other than the configured one.
    #[error("Incorrect checkout host: {0}")]
    HostMismatch(String),

    /// A webhook payload or its headers are missing required fields.
    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),

    /// Bitbucket answered with a non-success status.
    #[error("{message}")]
    Http {
        /// HTTP status code of the failed response.
        status: u16,
        /// Message extracted from the Bitbucket error body.
        message: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The circuit breaker is open and the request was not attempted.
    #[error("Circuit breaker is open, refusing request to {0}")]
    CircuitOpen(String),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, ScmError>;

impl ScmError {
    /// Builds an [`ScmError::Http`] from a failed response.
    ///
    /// Bitbucket Cloud returns errors in the format:
    /// ```json
    /// {"type": "error", "error": {"message": "Human readable message"}}
    /// ```
    ///
    /// Some endpoints (the OAuth endpoint in particular) use
    /// `{"error": "...", "error_description": "..."}` or a bare
    /// `{"message": "..."}`. When none of those shapes parse, the raw body is
    /// kept in the message.
    pub fn http(status: u16, body: &str) -> Self {
        let message = extract_error_message(body)
            .unwrap_or_else(|| format!("API error ({}): {}", status, body.trim()));

        Self::Http { status, message }
    }

    /// Returns the status code associated with this error, if any.
    ///
    /// URL, host and payload problems report `400` so callers can surface
    /// them as bad requests; transport-level failures have no status.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::InvalidUrl(_)
            | Self::UnsupportedHost(_)
            | Self::HostMismatch(_)
            | Self::MalformedPayload(_) => Some(400),
            Self::Http { status, .. } => Some(*status),
            Self::Network(err) => err.status().map(|s| s.as_u16()),
            Self::Validation(_) | Self::CircuitOpen(_) | Self::Decode(_) => None,
        }
    }

    /// Checks whether this error carries the given status code.
    pub fn is_status(&self, status: u16) -> bool {
        self.status_code() == Some(status)
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;

    // Cloud format: {"type": "error", "error": {"message": "..."}}
    if let Some(message) = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Some(message.to_string());
    }

    // Alternative Cloud format: {"error": {"detail": "..."}}
    if let Some(detail) = json
        .get("error")
        .and_then(|e| e.get("detail"))
        .and_then(|m| m.as_str())
    {
        return Some(detail.to_string());
    }

    // OAuth format: {"error": "invalid_grant", "error_description": "..."}
    if let Some(description) = json.get("error_description").and_then(|m| m.as_str()) {
        return Some(description.to_string());
    }

    // Server format: {"errors": [{"message": "..."}]}
    if let Some(message) = json
        .get("errors")
        .and_then(|e| e.as_array())
        .and_then(|arr| arr.first())
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Some(message.to_string());
    }

    json.get("message")
        .and_then(|m| m.as_str())
        .map(String::from)
}

/// A hyperlink as embedded in Bitbucket resources (`links.html`, `links.avatar`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,

    #[serde(default)]
    pub name: Option<String>,
}

/// Percent-encodes a branch name or file path for use in a request path.
///
/// Each `/`-separated segment is encoded on its own, so nested paths and
/// branches like `feature/login` keep their slashes while `#`, `?` and `%`
/// stay part of the name.
///
/// ```rust
/// use scm_bitbucket::api::common::encode_path;
///
/// assert_eq!(encode_path("fix#12"), "fix%2312");
/// assert_eq!(encode_path("docs/read me.md"), "docs/read%20me.md");
/// ```
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_path_keeps_separators() {
        assert_eq!(encode_path("feature/login"), "feature/login");
        assert_eq!(encode_path("release/1.0?rc=1"), "release/1.0%3Frc%3D1");
        assert_eq!(encode_path("100%"), "100%25");
        assert_eq!(encode_path(""), "");
    }

    #[test]
    fn test_http_error_cloud_format() {
        let err = ScmError::http(404, r#"{"type":"error","error":{"message":"Repository not found"}}"#);
        assert_eq!(err.to_string(), "Repository not found");
        assert!(err.is_status(404));
    }

    #[test]
    fn test_http_error_oauth_format() {
        let err = ScmError::http(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid refresh_token"}"#,
        );
        assert_eq!(err.to_string(), "Invalid refresh_token");
    }

    #[test]
    fn test_http_error_raw_body() {
        let err = ScmError::http(502, "Bad Gateway");
        assert_eq!(err.to_string(), "API error (502): Bad Gateway");
        assert_eq!(err.status_code(), Some(502));
    }

    #[test]
    fn test_url_errors_are_bad_requests() {
        assert!(ScmError::InvalidUrl("x".into()).is_status(400));
        assert!(ScmError::UnsupportedHost("x".into()).is_status(400));
        assert!(ScmError::HostMismatch("x".into()).is_status(400));
        assert_eq!(ScmError::Validation("x".into()).status_code(), None);
    }
}
