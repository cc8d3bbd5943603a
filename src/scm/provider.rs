//
//  scm-bitbucket
//  scm/provider.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! The operation surface an SCM provider exposes to the orchestrator.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use super::types::{
    Author, BellConfig, BranchInfo, CheckoutCommand, CheckoutConfig, CommitInfo, FileRequest,
    PermissionSet, PullRequestInfo, RepoDisplay, StatusUpdate,
};
use crate::api::cloud::Webhook;
use crate::api::common::Result;
use crate::api::transport::TransportStats;
use crate::webhook::CanonicalEvent;

/// Operations every SCM provider offers.
///
/// Repositories are addressed by their encoded URI (see
/// [`ScmUri`](crate::uri::ScmUri)).
#[async_trait]
pub trait ScmProvider: Send + Sync {
    /// Resolves a checkout URL into an encoded repository URI.
    async fn parse_url(&self, checkout_url: &str, root_dir: Option<&str>) -> Result<String>;

    /// Parses a webhook delivery. `Ok(None)` means the event is ignored.
    fn parse_hook(
        &self,
        headers: &HeaderMap,
        payload: &serde_json::Value,
    ) -> Result<Option<CanonicalEvent>>;

    fn can_handle_webhook(&self, headers: &HeaderMap, payload: &serde_json::Value) -> bool;

    async fn decorate_author(&self, username: &str) -> Result<Author>;

    async fn decorate_url(&self, scm_uri: &str) -> Result<RepoDisplay>;

    async fn decorate_commit(&self, scm_uri: &str, sha: &str) -> Result<CommitInfo>;

    /// Head commit of a pull request, or of the URI's branch.
    async fn get_commit_sha(&self, scm_uri: &str, pr_num: Option<u64>) -> Result<String>;

    /// File contents; empty when the file does not exist.
    async fn get_file(&self, request: &FileRequest) -> Result<String>;

    /// Files changed by an event, `None` when the provider cannot tell.
    fn get_changed_files(&self, payload: &serde_json::Value) -> Option<Vec<String>>;

    async fn get_permissions(&self, scm_uri: &str) -> Result<PermissionSet>;

    async fn update_commit_status(&self, update: &StatusUpdate) -> Result<()>;

    /// OAuth application settings keyed by SCM context.
    fn get_bell_configuration(&self) -> BTreeMap<String, BellConfig>;

    fn get_checkout_command(&self, config: &CheckoutConfig) -> CheckoutCommand;

    async fn get_opened_prs(&self, scm_uri: &str) -> Result<Vec<PullRequestInfo>>;

    async fn get_pr_info(&self, scm_uri: &str, pr_num: u64) -> Result<PullRequestInfo>;

    fn get_scm_contexts(&self) -> Vec<String>;

    async fn get_branch_list(&self, scm_uri: &str) -> Result<Vec<BranchInfo>>;

    /// Registers or updates the webhook pointing at `url`.
    async fn add_webhook(&self, scm_uri: &str, url: &str, actions: &[String]) -> Result<Webhook>;

    /// Transport counters keyed by SCM context.
    fn stats(&self) -> BTreeMap<String, TransportStats>;
}
