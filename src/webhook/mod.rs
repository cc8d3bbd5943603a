//
//  scm-bitbucket
//  webhook/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Webhooks
//!
//! Registration of the orchestrator's webhook on a repository and
//! normalization of the events Bitbucket delivers to it.
//!
//! ## Registration
//!
//! [`WebhookManager::add_webhook`] is idempotent: it looks for an existing
//! hook with the same target URL and updates it in place, creating one only
//! when none exists.
//!
//! ```text
//! GET  /repositories/{owner}/{uuid}/hooks?pagelen=30&page=1   (while pages are full)
//! POST /repositories/{owner}/{uuid}/hooks                     (no match)
//! PUT  /repositories/{owner}/{uuid}/hooks/{hook_uuid}         (match)
//! ```
//!
//! ## Submodules
//!
//! - [`event`]: Canonical events parsed from inbound webhook deliveries

mod event;

pub use event::*;

use tracing::{debug, info};

use crate::api::client::BitbucketClient;
use crate::api::cloud::{Webhook, WebhookRequest};
use crate::api::common::{PaginatedResponse, Result};
use crate::uri::ScmUri;

/// Hooks fetched per page while searching for an existing hook.
pub const WEBHOOK_PAGE_SIZE: u32 = 30;

/// Description attached to every hook this adapter registers.
pub const WEBHOOK_DESCRIPTION: &str = "Screwdriver-CD build trigger";

/// Events subscribed to when the caller names none.
pub const DEFAULT_WEBHOOK_EVENTS: [&str; 5] = [
    "repo:push",
    "pullrequest:created",
    "pullrequest:fulfilled",
    "pullrequest:rejected",
    "pullrequest:updated",
];

/// Finds, creates and updates repository webhooks.
#[derive(Clone)]
pub struct WebhookManager {
    client: BitbucketClient,
}

impl WebhookManager {
    pub fn new(client: BitbucketClient) -> Self {
        Self { client }
    }

    /// Finds the hook whose URL equals `url`.
    ///
    /// Pages are walked in ascending order; the walk stops at the first match
    /// or at the first page that is not full.
    pub async fn find_webhook(&self, repo_id: &str, url: &str, token: &str) -> Result<Option<Webhook>> {
        let path = format!("/repositories/{}/hooks", repo_id);
        let mut page = 1;

        loop {
            let hooks: PaginatedResponse<Webhook> = self
                .client
                .get_page(&path, token, page, WEBHOOK_PAGE_SIZE)
                .await?;
            debug!(repo_id, page, count = hooks.values.len(), "Fetched webhook page");

            let full = hooks.is_full(WEBHOOK_PAGE_SIZE);
            if let Some(hook) = hooks.values.into_iter().find(|hook| hook.url == url) {
                return Ok(Some(hook));
            }
            if !full {
                return Ok(None);
            }
            page += 1;
        }
    }

    /// Creates a hook, or updates `existing` in place.
    ///
    /// An empty `actions` list subscribes to [`DEFAULT_WEBHOOK_EVENTS`].
    pub async fn create_or_update_webhook(
        &self,
        existing: Option<&Webhook>,
        repo_id: &str,
        url: &str,
        actions: &[String],
        token: &str,
    ) -> Result<Webhook> {
        let events = if actions.is_empty() {
            DEFAULT_WEBHOOK_EVENTS.iter().map(|e| e.to_string()).collect()
        } else {
            actions.to_vec()
        };
        let body = WebhookRequest {
            description: WEBHOOK_DESCRIPTION.to_string(),
            url: url.to_string(),
            active: true,
            events,
        };

        let path = format!("/repositories/{}/hooks", repo_id);
        match existing {
            Some(hook) => {
                info!(repo_id, hook = %hook.uuid, "Updating webhook");
                self.client
                    .put(&format!("{}/{}", path, hook.uuid), token, &body)
                    .await
            }
            None => {
                info!(repo_id, url, "Creating webhook");
                self.client.post(&path, token, &body).await
            }
        }
    }

    /// Registers `url` as a webhook on the repository, updating an existing
    /// hook with the same URL.
    pub async fn add_webhook(
        &self,
        scm_uri: &ScmUri,
        url: &str,
        actions: &[String],
        token: &str,
    ) -> Result<Webhook> {
        let existing = self.find_webhook(&scm_uri.repo_id, url, token).await?;
        self.create_or_update_webhook(existing.as_ref(), &scm_uri.repo_id, url, actions, token)
            .await
    }
}
