//
//  scm-bitbucket
//  api/client.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Bitbucket Cloud API Client
//!
//! [`BitbucketClient`] turns API paths into transport requests: it prefixes
//! the configured base URL, attaches the bearer token and deserializes the
//! response. It holds no credentials itself; every call receives the token
//! the caller obtained from the token manager.
//!
//! ## Features
//!
//! - JSON and plain-text GET helpers
//! - JSON POST/PUT helpers
//! - Page-number pagination helper ([`get_page`](BitbucketClient::get_page))
//! - Cheap to clone; clones share the underlying transport

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::common::{page_path, PaginatedResponse, Result};
use super::transport::{HttpRequest, ResponseType, Transport};

/// HTTP client for the Bitbucket Cloud REST API v2.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use scm_bitbucket::api::{BitbucketClient, FuseboxTransport};
/// use scm_bitbucket::config::FuseboxConfig;
///
/// # async fn example() -> scm_bitbucket::Result<()> {
/// let transport = Arc::new(FuseboxTransport::new(&FuseboxConfig::default())?);
/// let client = BitbucketClient::new("https://api.bitbucket.org/2.0", transport);
///
/// let repo: serde_json::Value = client.get("/repositories/batman/test", "token").await?;
/// println!("Repository: {}", repo["full_name"]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BitbucketClient {
    /// The transport performing the requests
    transport: Arc<dyn Transport>,
    /// Base URL without trailing slash (e.g. "https://api.bitbucket.org/2.0")
    base_url: String,
}

impl BitbucketClient {
    /// Creates a client for the given API base URL.
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
        }
    }

    /// Returns the base URL for API requests.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the transport this client sends requests through.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Builds the absolute URL for an API path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Makes a GET request and deserializes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport fails, the response status is not
    /// successful, or the body cannot be deserialized to `T`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T> {
        debug!(path, "GET");
        let request = HttpRequest::get(self.url(path)).with_token(token);
        self.transport.perform(request).await?.json()
    }

    /// Makes a GET request and returns the raw response body.
    pub async fn get_text(&self, path: &str, token: &str) -> Result<String> {
        debug!(path, "GET (text)");
        let request = HttpRequest::get(self.url(path))
            .with_token(token)
            .with_response_type(ResponseType::Text);
        Ok(self.transport.perform(request).await?.body)
    }

    /// Makes a POST request with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<T> {
        debug!(path, "POST");
        let request = HttpRequest::post(self.url(path))
            .with_token(token)
            .with_json(body)?;
        self.transport.perform(request).await?.json()
    }

    /// Makes a PUT request with a JSON body.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<T> {
        debug!(path, "PUT");
        let request = HttpRequest::put(self.url(path))
            .with_token(token)
            .with_json(body)?;
        self.transport.perform(request).await?.json()
    }

    /// Fetches one page of a paginated collection.
    ///
    /// `page` is 1-indexed.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        page: u32,
        pagelen: u32,
    ) -> Result<PaginatedResponse<T>> {
        self.get(&page_path(path, page, pagelen), token).await
    }
}
