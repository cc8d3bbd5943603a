//
//  scm-bitbucket
//  api/cloud/hooks.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud repository webhook types.

use serde::{Deserialize, Serialize};

/// A repository webhook (`/repositories/{workspace}/{repo}/hooks`).
///
/// The adapter identifies its own hook by `url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(default)]
    pub uuid: String,

    pub url: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub events: Vec<String>,
}

/// Body for creating or replacing a webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookRequest {
    pub description: String,
    pub url: String,
    pub active: bool,
    pub events: Vec<String>,
}
