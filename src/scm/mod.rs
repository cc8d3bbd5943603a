//
//  scm-bitbucket
//  scm/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Bitbucket SCM Provider
//!
//! [`BitbucketScm`] ties the pieces together: it decodes repository URIs,
//! obtains a token from the [`TokenManager`], performs the requests through
//! the [`BitbucketClient`] and reshapes the responses.
//!
//! ## Module Structure
//!
//! - [`provider`]: The [`ScmProvider`] trait
//! - [`types`]: Operation inputs and outputs
//! - `repository`: Files, decorations, commits, permissions, branches
//! - `pullrequests`: Pull request lookups
//! - `status`: Commit build statuses
//! - [`checkout`]: The checkout shell step
//!
//! ## Example
//!
//! ```rust,no_run
//! use scm_bitbucket::{AdapterConfig, BitbucketScm, ScmProvider};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let scm = BitbucketScm::new(AdapterConfig::new("client-id", "client-secret"))?;
//!
//! let uri = scm.parse_url("git@bitbucket.org:batman/test.git#main", None).await?;
//! let branches = scm.get_branch_list(&uri).await?;
//! println!("{} branches", branches.len());
//! # Ok(())
//! # }
//! ```

pub mod checkout;
pub mod provider;
mod pullrequests;
mod repository;
mod status;
pub mod types;

pub use checkout::build_checkout_command;
pub use provider::ScmProvider;
pub use pullrequests::OPEN_PR_PAGE_SIZE;
pub use repository::BRANCH_PAGE_SIZE;
pub use status::{status_context, status_key};
pub use types::*;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use tracing::{error, info};

use crate::api::client::BitbucketClient;
use crate::api::cloud::Webhook;
use crate::api::common::Result;
use crate::api::transport::{FuseboxTransport, Transport, TransportStats};
use crate::auth::{OAuthConfig, TokenManager, TokenState};
use crate::config::AdapterConfig;
use crate::uri::{self, ScmUri};
use crate::webhook::{CanonicalEvent, EventNormalizer, WebhookManager};

/// Bitbucket Cloud implementation of [`ScmProvider`].
pub struct BitbucketScm {
    config: AdapterConfig,
    client: BitbucketClient,
    tokens: TokenManager,
    webhooks: WebhookManager,
    events: EventNormalizer,
}

impl BitbucketScm {
    /// Validates the configuration and builds the adapter with the default
    /// retrying transport.
    ///
    /// # Errors
    ///
    /// Returns [`ScmError::Validation`](crate::ScmError::Validation) for an
    /// invalid configuration.
    pub fn new(config: AdapterConfig) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(FuseboxTransport::new(&config.fusebox)?);
        Self::with_transport(config, transport)
    }

    /// Builds the adapter on a caller-supplied transport.
    pub fn with_transport(config: AdapterConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let client = BitbucketClient::new(config.api_url.clone(), transport.clone());
        let tokens = TokenManager::new(
            transport,
            OAuthConfig {
                client_id: config.oauth_client_id.clone(),
                client_secret: config.oauth_client_secret.clone(),
                token_url: config.oauth_token_url.clone(),
            },
        );
        info!(hostname = %config.hostname, api_url = %config.api_url, "Bitbucket adapter ready");

        Ok(Self {
            webhooks: WebhookManager::new(client.clone()),
            events: EventNormalizer::new(config.hostname.clone()),
            client,
            tokens,
            config,
        })
    }

    /// Seeds the OAuth token state.
    pub fn with_token(self, state: TokenState) -> Self {
        Self {
            tokens: self.tokens.with_state(state),
            ..self
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    async fn token(&self) -> Result<String> {
        self.tokens.valid_token().await
    }

    /// Resolves a checkout URL into an encoded repository URI.
    pub async fn parse_url(&self, checkout_url: &str, root_dir: Option<&str>) -> Result<String> {
        let token = self.token().await?;
        let uri = uri::resolve(
            &self.client,
            &token,
            &self.config.hostname,
            checkout_url,
            root_dir,
        )
        .await?;
        Ok(uri.to_string())
    }

    pub async fn add_webhook(&self, scm_uri: &str, url: &str, actions: &[String]) -> Result<Webhook> {
        let token = self.token().await?;
        self.webhooks
            .add_webhook(&ScmUri::decode(scm_uri), url, actions, &token)
            .await
    }

    pub fn get_scm_contexts(&self) -> Vec<String> {
        vec![self.config.scm_context()]
    }

    pub fn get_bell_configuration(&self) -> BTreeMap<String, BellConfig> {
        let bell = BellConfig {
            provider: "bitbucket".to_string(),
            client_id: self.config.oauth_client_id.clone(),
            client_secret: self.config.oauth_client_secret.clone(),
            is_secure: self.config.https,
            force_https: false,
        };
        BTreeMap::from([(self.config.scm_context(), bell)])
    }

    pub fn stats(&self) -> BTreeMap<String, TransportStats> {
        BTreeMap::from([(self.config.scm_context(), self.client.transport().stats())])
    }
}

#[async_trait]
impl ScmProvider for BitbucketScm {
    async fn parse_url(&self, checkout_url: &str, root_dir: Option<&str>) -> Result<String> {
        Self::parse_url(self, checkout_url, root_dir)
            .await
            .inspect_err(|err| error!(checkout_url, error = %err, "Failed to parse url"))
    }

    fn parse_hook(
        &self,
        headers: &HeaderMap,
        payload: &serde_json::Value,
    ) -> Result<Option<CanonicalEvent>> {
        self.events
            .parse_hook(headers, payload)
            .inspect_err(|err| error!(error = %err, "Failed to parse webhook"))
    }

    fn can_handle_webhook(&self, headers: &HeaderMap, payload: &serde_json::Value) -> bool {
        self.events.can_handle(headers, payload)
    }

    async fn decorate_author(&self, username: &str) -> Result<Author> {
        Self::decorate_author(self, username)
            .await
            .inspect_err(|err| error!(username, error = %err, "Failed to decorate author"))
    }

    async fn decorate_url(&self, scm_uri: &str) -> Result<RepoDisplay> {
        Self::decorate_url(self, scm_uri)
            .await
            .inspect_err(|err| error!(scm_uri, error = %err, "Failed to decorate url"))
    }

    async fn decorate_commit(&self, scm_uri: &str, sha: &str) -> Result<CommitInfo> {
        Self::decorate_commit(self, scm_uri, sha)
            .await
            .inspect_err(|err| error!(scm_uri, sha, error = %err, "Failed to decorate commit"))
    }

    async fn get_commit_sha(&self, scm_uri: &str, pr_num: Option<u64>) -> Result<String> {
        Self::get_commit_sha(self, scm_uri, pr_num)
            .await
            .inspect_err(|err| error!(scm_uri, ?pr_num, error = %err, "Failed to get commit sha"))
    }

    async fn get_file(&self, request: &FileRequest) -> Result<String> {
        Self::get_file(self, request).await.inspect_err(|err| {
            error!(scm_uri = %request.scm_uri, path = %request.path, error = %err, "Failed to fetch file")
        })
    }

    fn get_changed_files(&self, _payload: &serde_json::Value) -> Option<Vec<String>> {
        None
    }

    async fn get_permissions(&self, scm_uri: &str) -> Result<PermissionSet> {
        Self::get_permissions(self, scm_uri)
            .await
            .inspect_err(|err| error!(scm_uri, error = %err, "Failed to get permissions"))
    }

    async fn update_commit_status(&self, update: &StatusUpdate) -> Result<()> {
        Self::update_commit_status(self, update).await.inspect_err(|err| {
            error!(scm_uri = %update.scm_uri, sha = %update.sha, error = %err, "Failed to update commit status")
        })
    }

    fn get_bell_configuration(&self) -> BTreeMap<String, BellConfig> {
        Self::get_bell_configuration(self)
    }

    fn get_checkout_command(&self, config: &CheckoutConfig) -> CheckoutCommand {
        build_checkout_command(&self.config, config)
    }

    async fn get_opened_prs(&self, scm_uri: &str) -> Result<Vec<PullRequestInfo>> {
        Self::get_opened_prs(self, scm_uri)
            .await
            .inspect_err(|err| error!(scm_uri, error = %err, "Failed to list pull requests"))
    }

    async fn get_pr_info(&self, scm_uri: &str, pr_num: u64) -> Result<PullRequestInfo> {
        Self::get_pr_info(self, scm_uri, pr_num)
            .await
            .inspect_err(|err| error!(scm_uri, pr_num, error = %err, "Failed to get pull request"))
    }

    fn get_scm_contexts(&self) -> Vec<String> {
        Self::get_scm_contexts(self)
    }

    async fn get_branch_list(&self, scm_uri: &str) -> Result<Vec<BranchInfo>> {
        Self::get_branch_list(self, scm_uri)
            .await
            .inspect_err(|err| error!(scm_uri, error = %err, "Failed to list branches"))
    }

    async fn add_webhook(&self, scm_uri: &str, url: &str, actions: &[String]) -> Result<Webhook> {
        Self::add_webhook(self, scm_uri, url, actions)
            .await
            .inspect_err(|err| error!(scm_uri, url, error = %err, "Failed to add webhook"))
    }

    fn stats(&self) -> BTreeMap<String, TransportStats> {
        Self::stats(self)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub const UUID: &str = "de7d7695-1196-46a1-b87d-371b7b2945ab";
    pub const SCM_URI: &str = "bitbucket.org:batman/de7d7695-1196-46a1-b87d-371b7b2945ab:main";
    pub const REPO_PATH: &str = "/repositories/batman/de7d7695-1196-46a1-b87d-371b7b2945ab";

    pub fn config(server_url: &str) -> AdapterConfig {
        let mut config = AdapterConfig::new("id", "secret");
        config.api_url = server_url.to_string();
        config.oauth_token_url = format!("{}/site/oauth2/access_token", server_url);
        config.fusebox.retry.retries = 0;
        config
    }

    /// Adapter against a mock server, holding a token valid for an hour.
    pub fn scm(server_url: &str) -> BitbucketScm {
        BitbucketScm::new(config(server_url)).unwrap().with_token(TokenState {
            access_token: "token".into(),
            refresh_token: "refresh".into(),
            expires_at: chrono::Utc::now().timestamp_millis() + 3_600_000,
        })
    }
}
