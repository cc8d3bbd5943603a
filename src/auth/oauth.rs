//
//  scm-bitbucket
//  auth/oauth.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # OAuth 2.0 Token Endpoint
//!
//! The adapter authenticates as an OAuth consumer. It never runs an
//! interactive flow: the first token comes from the `client_credentials`
//! grant and every later one from the `refresh_token` grant.
//!
//! Both grants POST a form to the token endpoint with the consumer key and
//! secret as HTTP basic credentials:
//!
//! ```text
//! POST https://bitbucket.org/site/oauth2/access_token
//! Authorization: Basic base64(client_id:client_secret)
//!
//! grant_type=refresh_token&refresh_token=...
//! ```

use serde::Deserialize;

use crate::api::common::Result;
use crate::api::transport::{HttpRequest, Transport};

/// OAuth grant used to obtain an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// First acquisition, using only the consumer credentials.
    ClientCredentials,
    /// Renewal with a previously issued refresh token.
    RefreshToken(String),
}

impl Grant {
    /// The `grant_type` form value.
    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken(_) => "refresh_token",
        }
    }

    fn form(&self) -> Vec<(String, String)> {
        let mut form = vec![("grant_type".to_string(), self.grant_type().to_string())];
        if let Self::RefreshToken(token) = self {
            form.push(("refresh_token".to_string(), token.clone()));
        }
        form
    }
}

/// OAuth consumer credentials and endpoint.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
}

/// Response from the OAuth token endpoint.
#[derive(Debug, Clone)]
pub struct OAuthTokenResponse {
    /// The access token for API requests.
    pub access_token: String,

    /// Refresh token, when the endpoint issued one.
    pub refresh_token: Option<String>,

    /// Lifetime of the access token in seconds.
    pub expires_in: u64,

    /// Granted scopes.
    pub scopes: Vec<String>,
}

#[derive(Deserialize)]
struct TokenResponseRaw {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    scopes: Option<String>,
}

impl From<TokenResponseRaw> for OAuthTokenResponse {
    fn from(raw: TokenResponseRaw) -> Self {
        let scopes = raw
            .scopes
            .map(|s| s.split_whitespace().map(String::from).collect())
            .unwrap_or_default();

        Self {
            access_token: raw.access_token,
            refresh_token: raw.refresh_token,
            expires_in: raw.expires_in.unwrap_or(0),
            scopes,
        }
    }
}

/// Requests a token from the OAuth endpoint.
///
/// # Errors
///
/// Returns the transport error unchanged (an [`ScmError::Http`](crate::ScmError::Http)
/// for a rejected grant).
pub async fn request_token(
    transport: &dyn Transport,
    config: &OAuthConfig,
    grant: &Grant,
) -> Result<OAuthTokenResponse> {
    let request = HttpRequest::post(&config.token_url)
        .with_basic_auth(&config.client_id, &config.client_secret)
        .with_form(grant.form());

    let response = transport.perform(request).await?;
    let raw: TokenResponseRaw = response.json()?;

    Ok(raw.into())
}
