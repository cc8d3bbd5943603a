//
//  scm-bitbucket
//  cli/hook.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Webhook commands
//!
//! ## Examples
//!
//! ```bash
//! # Normalize a saved delivery (offline)
//! scm-bitbucket parse-hook --event-key repo:push --request-uuid 1e8d4e8e payload.json
//!
//! # Read the payload from stdin
//! cat payload.json | scm-bitbucket parse-hook --event-key pullrequest:created -
//!
//! # Register the pipeline webhook
//! scm-bitbucket add-webhook 'bitbucket.org:batman/{de7d7695}:main' https://api.example.com/v4/webhooks
//! ```
//!
//! `parse-hook` prints `null` for deliveries that do not start a build.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::webhook::{EventNormalizer, EVENT_KEY_HEADER, REQUEST_UUID_HEADER};

use super::GlobalOptions;

/// Normalize a webhook delivery
#[derive(Args, Debug)]
pub struct ParseHookArgs {
    /// Value of the `x-event-key` header, e.g. `repo:push`
    #[arg(long)]
    pub event_key: String,

    /// Value of the `x-request-uuid` header
    #[arg(long)]
    pub request_uuid: Option<String>,

    /// Payload file, `-` for stdin
    pub payload: PathBuf,
}

impl ParseHookArgs {
    pub fn run(&self, global: &GlobalOptions) -> Result<()> {
        let config = global.adapter_config()?;
        let payload = self.read_payload()?;
        let headers = self.headers()?;

        let event = EventNormalizer::new(config.hostname).parse_hook(&headers, &payload)?;
        global.output().write(&event)
    }

    fn read_payload(&self) -> Result<serde_json::Value> {
        let content = if self.payload.as_os_str() == "-" {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read payload from stdin")?;
            content
        } else {
            std::fs::read_to_string(&self.payload)
                .with_context(|| format!("Failed to read payload {}", self.payload.display()))?
        };

        serde_json::from_str(&content).context("Payload is not valid JSON")
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(EVENT_KEY_HEADER),
            HeaderValue::from_str(&self.event_key).context("Invalid event key")?,
        );
        if let Some(uuid) = &self.request_uuid {
            headers.insert(
                HeaderName::from_static(REQUEST_UUID_HEADER),
                HeaderValue::from_str(uuid).context("Invalid request uuid")?,
            );
        }
        Ok(headers)
    }
}

/// Register the pipeline webhook on a repository
#[derive(Args, Debug)]
pub struct AddWebhookArgs {
    /// Repository URI
    pub scm_uri: String,

    /// Endpoint receiving the deliveries
    pub url: String,

    /// Events to subscribe to, defaults to push and pull request events
    #[arg(long = "event", value_delimiter = ',')]
    pub events: Vec<String>,
}

impl AddWebhookArgs {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let scm = global.scm()?;
        let hook = scm.add_webhook(&self.scm_uri, &self.url, &self.events).await?;
        global.output().write(&hook)
    }
}
