//
//  scm-bitbucket
//  api/cloud/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Bitbucket Cloud API v2.0 types.
//!
//! Serde bindings for the Bitbucket Cloud resources the adapter reads and
//! writes, organized by resource type.
//!
//! # Module Organization
//!
//! - [`repositories`] - Repositories, branches and repository references
//! - [`commits`] - Commits and commit build statuses
//! - [`pullrequests`] - Pull requests
//! - [`users`] - User accounts
//! - [`hooks`] - Repository webhooks
//!
//! # Notes
//!
//! - All timestamps are in ISO 8601 format
//! - UUIDs are returned with curly braces (e.g., `{123e4567-e89b-...}`)

pub mod commits;
pub mod hooks;
pub mod pullrequests;
pub mod repositories;
pub mod users;

// Re-export common types
pub use commits::{BuildStatusRequest, Commit};
pub use hooks::{Webhook, WebhookRequest};
pub use pullrequests::PullRequest;
pub use repositories::*;
pub use users::User;
