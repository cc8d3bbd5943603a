//
//  scm-bitbucket
//  api/transport.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # HTTP Transport
//!
//! Every outbound request of the adapter goes through a [`Transport`]. The
//! trait is the seam between the adapter's logic and the network: the
//! default [`FuseboxTransport`] wraps `reqwest` with a retry policy and a
//! circuit breaker, and tests can plug in anything that answers requests.
//!
//! ## Retry Policy
//!
//! - Server errors (5xx) and network failures are retried with exponential
//!   backoff and a small random jitter.
//! - Client errors (4xx) are never retried; they are returned on the first
//!   attempt so callers can special-case them (404, 422, ...).
//!
//! ## Circuit Breaker
//!
//! After `failure_threshold` consecutive failed requests the breaker opens
//! and requests fail with [`ScmError::CircuitOpen`] without touching the
//! network. Once `reset_timeout_ms` has passed, one trial request is let
//! through; its outcome closes or re-opens the breaker. 4xx responses count
//! as successful round trips for the breaker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::common::{Result, ScmError};
use crate::config::{BreakerConfig, FuseboxConfig, RetryConfig};

/// HTTP method of an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// Expected body format of the response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    #[default]
    Json,
    Text,
}

/// A transport-level request.
///
/// `token` becomes a bearer `Authorization` header, `username`/`password`
/// become basic credentials. At most one of `json` and `form` is expected
/// to be set.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub token: Option<String>,
    pub json: Option<serde_json::Value>,
    pub form: Option<Vec<(String, String)>>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub response_type: ResponseType,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            token: None,
            json: None,
            form: None,
            username: None,
            password: None,
            response_type: ResponseType::Json,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::Put, url)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.json = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_form(mut self, form: Vec<(String, String)>) -> Self {
        self.form = Some(form);
        self
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }
}

/// A successful response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Deserializes the body as JSON. An empty body reads as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.trim().is_empty() {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Request counters and breaker state reported by `stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportStats {
    pub requests: RequestStats,
    pub breaker: BreakerStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStats {
    pub total: u64,
    pub success: u64,
    pub failure: u64,
    pub retries: u64,
    pub rejected: u64,
    pub average_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerStats {
    pub is_closed: bool,
}

impl Default for BreakerStats {
    fn default() -> Self {
        Self { is_closed: true }
    }
}

/// Performs HTTP requests on behalf of the adapter.
///
/// Implementations must return [`ScmError::Http`] for non-2xx responses so
/// callers can inspect the status code.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform(&self, request: HttpRequest) -> Result<HttpResponse>;

    fn stats(&self) -> TransportStats {
        TransportStats::default()
    }
}

#[derive(Debug, Default)]
struct BreakerState {
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct Counters {
    total: AtomicU64,
    success: AtomicU64,
    failure: AtomicU64,
    retries: AtomicU64,
    rejected: AtomicU64,
    elapsed_ms: AtomicU64,
}

/// `reqwest` transport with retries and a circuit breaker.
pub struct FuseboxTransport {
    http: Client,
    retry: RetryConfig,
    breaker_config: BreakerConfig,
    breaker: Mutex<BreakerState>,
    counters: Counters,
}

impl FuseboxTransport {
    pub fn new(config: &FuseboxConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(format!("scm-bitbucket/{}", crate::VERSION))
            .build()?;

        Ok(Self {
            http,
            retry: config.retry.clone(),
            breaker_config: config.breaker.clone(),
            breaker: Mutex::new(BreakerState::default()),
            counters: Counters::default(),
        })
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let base = self
            .retry
            .min_timeout_ms
            .saturating_mul(u64::from(self.retry.factor).saturating_pow(exponent));
        let capped = base.min(self.retry.max_timeout_ms);
        let jitter = rand::rng().random_range(0..=capped / 10);
        Duration::from_millis(capped + jitter)
    }

    fn breaker_allows(&self) -> bool {
        let state = self.breaker.lock().unwrap_or_else(|e| e.into_inner());
        match state.opened_at {
            Some(opened_at) => {
                opened_at.elapsed() >= Duration::from_millis(self.breaker_config.reset_timeout_ms)
            }
            None => true,
        }
    }

    fn record_outcome(&self, healthy: bool) {
        let mut state = self.breaker.lock().unwrap_or_else(|e| e.into_inner());
        if healthy {
            state.consecutive_failures = 0;
            state.opened_at = None;
            return;
        }

        state.consecutive_failures += 1;
        if state.consecutive_failures >= self.breaker_config.failure_threshold {
            if state.opened_at.is_none() {
                warn!(
                    failures = state.consecutive_failures,
                    "Opening circuit breaker"
                );
            }
            state.opened_at = Some(Instant::now());
        }
    }

    async fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.http.get(&request.url),
            Method::Post => self.http.post(&request.url),
            Method::Put => self.http.put(&request.url),
            Method::Delete => self.http.delete(&request.url),
        };

        if let Some(token) = &request.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(username) = &request.username {
            builder = builder.basic_auth(username, request.password.as_deref());
        }
        if let Some(json) = &request.json {
            builder = builder.json(json);
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }
        if request.response_type == ResponseType::Json {
            builder = builder.header(ACCEPT, "application/json");
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(ScmError::http(status.as_u16(), &body));
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}

fn is_retryable(err: &ScmError) -> bool {
    match err {
        ScmError::Http { status, .. } => *status >= 500,
        ScmError::Network(_) => true,
        _ => false,
    }
}

#[async_trait]
impl Transport for FuseboxTransport {
    async fn perform(&self, request: HttpRequest) -> Result<HttpResponse> {
        if !self.breaker_allows() {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(ScmError::CircuitOpen(request.url));
        }

        self.counters.total.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();
        let mut attempt = 0;

        let result = loop {
            debug!(method = ?request.method, url = %request.url, attempt, "Sending request");
            match self.send_once(&request).await {
                Err(err) if attempt < self.retry.retries && is_retryable(&err) => {
                    attempt += 1;
                    self.counters.retries.fetch_add(1, Ordering::Relaxed);
                    let delay = self.backoff(attempt);
                    warn!(url = %request.url, attempt, ?delay, error = %err, "Retrying request");
                    tokio::time::sleep(delay).await;
                }
                other => break other,
            }
        };

        let elapsed = started.elapsed().as_millis() as u64;
        self.counters.elapsed_ms.fetch_add(elapsed, Ordering::Relaxed);

        match &result {
            Ok(_) => {
                self.counters.success.fetch_add(1, Ordering::Relaxed);
                self.record_outcome(true);
            }
            Err(err) => {
                self.counters.failure.fetch_add(1, Ordering::Relaxed);
                self.record_outcome(!is_retryable(err));
            }
        }

        result
    }

    fn stats(&self) -> TransportStats {
        let total = self.counters.total.load(Ordering::Relaxed);
        let elapsed = self.counters.elapsed_ms.load(Ordering::Relaxed);
        let is_closed = self
            .breaker
            .lock()
            .map(|state| state.opened_at.is_none())
            .unwrap_or(false);

        TransportStats {
            requests: RequestStats {
                total,
                success: self.counters.success.load(Ordering::Relaxed),
                failure: self.counters.failure.load(Ordering::Relaxed),
                retries: self.counters.retries.load(Ordering::Relaxed),
                rejected: self.counters.rejected.load(Ordering::Relaxed),
                average_time_ms: if total == 0 { 0 } else { elapsed / total },
            },
            breaker: BreakerStats { is_closed },
        }
    }
}
