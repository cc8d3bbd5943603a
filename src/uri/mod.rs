//
//  scm-bitbucket
//  uri/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Repository URIs
//!
//! The orchestrator stores repositories as an opaque, colon-delimited
//! string:
//!
//! ```text
//! hostname:owner/uuid:branch[:rootDir]
//! bitbucket.org:batman/de7d7695-1196-46a1-b87d-371b7b2945ab:main:app
//! ```
//!
//! The repository id embeds the repository UUID instead of its slug so the
//! URI survives renames.
//!
//! ## Module Structure
//!
//! - [`checkout`]: Parsing of human checkout URLs (`git@...`, `https://...`)
//! - [`ScmUri`]: Encoding and decoding of the stored form
//! - [`resolve`]: Turns a checkout URL into an [`ScmUri`] with one or two
//!   API lookups

mod checkout;

pub use checkout::*;

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::api::client::BitbucketClient;
use crate::api::cloud::{BranchRef, Repository};
use crate::api::common::{encode_path, Result, ScmError};
use crate::config::same_host;

/// Decoded repository URI.
///
/// Decoding never fails: missing segments come back empty (or `None` for
/// the root directory), matching what the orchestrator has always stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmUri {
    pub hostname: String,
    /// `owner/uuid`.
    pub repo_id: String,
    /// Empty when unspecified.
    pub branch: String,
    pub root_dir: Option<String>,
}

impl ScmUri {
    pub fn new(
        hostname: impl Into<String>,
        repo_id: impl Into<String>,
        branch: impl Into<String>,
        root_dir: Option<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            repo_id: repo_id.into(),
            branch: branch.into(),
            root_dir: root_dir.filter(|dir| !dir.is_empty()),
        }
    }

    /// Decodes the stored form.
    ///
    /// The root directory keeps any further colons.
    ///
    /// ```rust
    /// use scm_bitbucket::uri::ScmUri;
    ///
    /// let uri = ScmUri::decode("bitbucket.org:batman/1234:main:app");
    /// assert_eq!(uri.owner(), "batman");
    /// assert_eq!(uri.uuid(), "1234");
    /// assert_eq!(uri.root_dir.as_deref(), Some("app"));
    ///
    /// let partial = ScmUri::decode("bitbucket.org");
    /// assert_eq!(partial.repo_id, "");
    /// ```
    pub fn decode(value: &str) -> Self {
        let mut parts = value.splitn(4, ':');
        let hostname = parts.next().unwrap_or_default();
        let repo_id = parts.next().unwrap_or_default();
        let branch = parts.next().unwrap_or_default();
        let root_dir = parts.next().map(String::from);

        Self::new(hostname, repo_id, branch, root_dir)
    }

    /// Workspace part of the repository id.
    pub fn owner(&self) -> &str {
        self.repo_id
            .split_once('/')
            .map(|(owner, _)| owner)
            .unwrap_or(self.repo_id.as_str())
    }

    /// UUID part of the repository id, empty when absent.
    pub fn uuid(&self) -> &str {
        self.repo_id
            .split_once('/')
            .map(|(_, uuid)| uuid)
            .unwrap_or_default()
    }

    /// Returns a copy pointing at another branch.
    pub fn with_branch(&self, branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for ScmUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.hostname, self.repo_id, self.branch)?;
        if let Some(root_dir) = &self.root_dir {
            write!(f, ":{}", root_dir)?;
        }
        Ok(())
    }
}

/// Resolves a checkout URL into an [`ScmUri`].
///
/// When the URL names no branch, the repository's main branch is used. The
/// branch lookup supplies the repository UUID.
///
/// # Errors
///
/// - [`ScmError::InvalidUrl`] if the URL cannot be parsed
/// - [`ScmError::UnsupportedHost`] if it belongs to another host (no request
///   is made)
/// - Any transport error from the lookups, unchanged
pub async fn resolve(
    client: &BitbucketClient,
    token: &str,
    hostname: &str,
    checkout_url: &str,
    root_dir: Option<&str>,
) -> Result<ScmUri> {
    let info = parse_checkout_url(checkout_url, root_dir)?;
    if !same_host(&info.hostname, hostname) {
        return Err(ScmError::UnsupportedHost(info.hostname));
    }

    let repo_path = format!("/repositories/{}", info.full_name());
    let branch = match info.branch {
        Some(branch) => branch,
        None => {
            let repo: Repository = client.get(&repo_path, token).await?;
            let branch = repo.mainbranch.map(|b| b.name).unwrap_or_default();
            debug!(repo = %info.full_name(), branch = %branch, "Using main branch");
            branch
        }
    };

    let branch_ref: BranchRef = client
        .get(
            &format!("{}/refs/branches/{}", repo_path, encode_path(&branch)),
            token,
        )
        .await?;
    let uuid = branch_ref
        .target
        .repository
        .map(|r| r.uuid)
        .ok_or_else(|| ScmError::InvalidUrl(checkout_url.to_string()))?;

    Ok(ScmUri::new(
        hostname,
        format!("{}/{}", info.owner, uuid),
        branch,
        info.root_dir,
    ))
}
