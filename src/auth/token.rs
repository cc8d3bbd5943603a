//
//  scm-bitbucket
//  auth/token.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Token Lifecycle
//!
//! [`TokenManager`] owns the adapter's single OAuth token triple and hands
//! out a valid access token on demand.
//!
//! ## States
//!
//! ```text
//! Unset ──client_credentials──▶ Acquired ──refresh_token──▶ Acquired
//! ```
//!
//! A failed refresh leaves the previous state untouched, so the next call
//! retries from the same state.
//!
//! ## Concurrency
//!
//! The state sits behind an async mutex that is held across the refresh, so
//! callers arriving while a token is being renewed wait for that renewal
//! instead of issuing their own.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::oauth::{request_token, Grant, OAuthConfig};
use crate::api::common::Result;
use crate::api::transport::Transport;

/// Tokens are renewed when they expire within this many milliseconds.
pub const EXPIRY_MARGIN_MS: i64 = 5_000;

/// The cached OAuth token triple.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenState {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry as Unix epoch milliseconds.
    pub expires_at: i64,
}

impl TokenState {
    /// Whether a token was ever acquired.
    pub fn is_acquired(&self) -> bool {
        !self.access_token.is_empty()
    }

    /// Whether the token must be renewed before use at `now_ms`.
    pub fn is_stale(&self, now_ms: i64) -> bool {
        !self.is_acquired() || self.expires_at < now_ms + EXPIRY_MARGIN_MS
    }

    /// The grant that renews this state.
    pub fn next_grant(&self) -> Grant {
        if self.is_acquired() {
            Grant::RefreshToken(self.refresh_token.clone())
        } else {
            Grant::ClientCredentials
        }
    }
}

/// Owns the OAuth token and refreshes it lazily.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use scm_bitbucket::api::FuseboxTransport;
/// use scm_bitbucket::auth::{OAuthConfig, TokenManager};
/// use scm_bitbucket::config::FuseboxConfig;
///
/// # async fn example() -> scm_bitbucket::Result<()> {
/// let transport = Arc::new(FuseboxTransport::new(&FuseboxConfig::default())?);
/// let tokens = TokenManager::new(
///     transport,
///     OAuthConfig {
///         client_id: "id".into(),
///         client_secret: "secret".into(),
///         token_url: "https://bitbucket.org/site/oauth2/access_token".into(),
///     },
/// );
///
/// let token = tokens.valid_token().await?;
/// # Ok(())
/// # }
/// ```
pub struct TokenManager {
    transport: Arc<dyn Transport>,
    oauth: OAuthConfig,
    state: Mutex<TokenState>,
}

impl TokenManager {
    pub fn new(transport: Arc<dyn Transport>, oauth: OAuthConfig) -> Self {
        Self {
            transport,
            oauth,
            state: Mutex::new(TokenState::default()),
        }
    }

    /// Seeds the manager with an existing token triple.
    pub fn with_state(self, state: TokenState) -> Self {
        Self {
            state: Mutex::new(state),
            ..self
        }
    }

    /// Returns a copy of the current token state.
    pub async fn snapshot(&self) -> TokenState {
        self.state.lock().await.clone()
    }

    /// Returns an access token that stays valid for at least
    /// [`EXPIRY_MARGIN_MS`], renewing it first when needed.
    pub async fn valid_token(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        if state.is_stale(now_ms()) {
            *state = self.fetch(&state).await?;
        }
        Ok(state.access_token.clone())
    }

    /// Renews the token unconditionally.
    pub async fn refresh(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = self.fetch(&state).await?;
        Ok(())
    }

    async fn fetch(&self, current: &TokenState) -> Result<TokenState> {
        let grant = current.next_grant();
        debug!(grant_type = grant.grant_type(), "Requesting OAuth token");

        let response = request_token(self.transport.as_ref(), &self.oauth, &grant).await?;
        let expires_at = expires_at(now_ms(), response.expires_in);
        info!(grant_type = grant.grant_type(), expires_at, "Obtained OAuth token");

        Ok(TokenState {
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .unwrap_or_else(|| current.refresh_token.clone()),
            expires_at,
        })
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Expiry in epoch milliseconds, saturating on absurd lifetimes.
fn expires_at(now_ms: i64, expires_in_secs: u64) -> i64 {
    i64::try_from(expires_in_secs)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000)
        .saturating_add(now_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::FuseboxTransport;
    use crate::config::FuseboxConfig;
    use mockito::Matcher;

    const TOKEN_PATH: &str = "/site/oauth2/access_token";

    fn manager(server_url: &str) -> TokenManager {
        let mut fusebox = FuseboxConfig::default();
        fusebox.retry.retries = 0;
        let transport = Arc::new(FuseboxTransport::new(&fusebox).unwrap());
        TokenManager::new(
            transport,
            OAuthConfig {
                client_id: "id".into(),
                client_secret: "secret".into(),
                token_url: format!("{}{}", server_url, TOKEN_PATH),
            },
        )
    }

    #[test]
    fn test_stale_with_margin() {
        let state = TokenState {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: 100_000,
        };
        assert!(!state.is_stale(90_000));
        assert!(state.is_stale(96_000));
        assert!(state.is_stale(200_000));
        assert!(TokenState::default().is_stale(0));
    }

    #[tokio::test]
    async fn test_first_acquisition_uses_client_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", TOKEN_PATH)
            .match_body(Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()))
            .with_status(200)
            .with_body(r#"{"access_token":"a1","refresh_token":"r1","expires_in":7200}"#)
            .expect(1)
            .create_async()
            .await;

        let tokens = manager(&server.url());
        assert_eq!(tokens.valid_token().await.unwrap(), "a1");
        // Cached: no second request.
        assert_eq!(tokens.valid_token().await.unwrap(), "a1");

        mock.assert_async().await;
        let state = tokens.snapshot().await;
        assert_eq!(state.refresh_token, "r1");
        assert!(state.expires_at > now_ms() + 7_000_000);
    }

    #[test]
    fn test_expiry_saturates() {
        assert_eq!(expires_at(1_000, 7200), 7_201_000);
        assert_eq!(expires_at(1_000, u64::MAX), i64::MAX);
        assert_eq!(expires_at(1_000, i64::MAX as u64 / 1000 + 1), i64::MAX);
    }

    #[tokio::test]
    async fn test_huge_lifetime_is_cached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"access_token":"a1","expires_in":18446744073709551615}"#)
            .expect(1)
            .create_async()
            .await;

        let tokens = manager(&server.url());
        assert_eq!(tokens.valid_token().await.unwrap(), "a1");
        assert_eq!(tokens.valid_token().await.unwrap(), "a1");

        mock.assert_async().await;
        assert_eq!(tokens.snapshot().await.expires_at, i64::MAX);
    }

    #[tokio::test]
    async fn test_expired_token_refreshes_once_with_refresh_grant() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", TOKEN_PATH)
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                Matcher::UrlEncoded("refresh_token".into(), "r0".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"a2","refresh_token":"r2","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;

        let tokens = manager(&server.url()).with_state(TokenState {
            access_token: "a0".into(),
            refresh_token: "r0".into(),
            expires_at: now_ms() - 60_000,
        });

        assert_eq!(tokens.valid_token().await.unwrap(), "a2");
        mock.assert_async().await;
        assert_eq!(tokens.snapshot().await.refresh_token, "r2");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_state() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", TOKEN_PATH)
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant","error_description":"Invalid refresh_token"}"#)
            .expect(1)
            .create_async()
            .await;

        let expired = TokenState {
            access_token: "a0".into(),
            refresh_token: "r0".into(),
            expires_at: now_ms() - 60_000,
        };
        let tokens = manager(&server.url()).with_state(expired.clone());

        let err = tokens.valid_token().await.unwrap_err();
        mock.assert_async().await;
        assert!(err.is_status(400));
        assert_eq!(tokens.snapshot().await, expired);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", TOKEN_PATH)
            .with_status(200)
            .with_body(r#"{"access_token":"a1","refresh_token":"r1","expires_in":7200}"#)
            .expect(1)
            .create_async()
            .await;

        let tokens = manager(&server.url());
        let (first, second) = tokio::join!(tokens.valid_token(), tokens.valid_token());

        mock.assert_async().await;
        assert_eq!(first.unwrap(), "a1");
        assert_eq!(second.unwrap(), "a1");
    }

    #[tokio::test]
    async fn test_fresh_token_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", TOKEN_PATH)
            .expect(0)
            .create_async()
            .await;

        let tokens = manager(&server.url()).with_state(TokenState {
            access_token: "a0".into(),
            refresh_token: "r0".into(),
            expires_at: now_ms() + 3_600_000,
        });

        assert_eq!(tokens.valid_token().await.unwrap(), "a0");
        mock.assert_async().await;
    }
}
