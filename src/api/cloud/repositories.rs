//
//  scm-bitbucket
//  api/cloud/repositories.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud repository and branch types.
//!
//! Only the fields the adapter reads are modelled; everything else in the
//! Bitbucket payloads is ignored during deserialization.
//!
//! # Notes
//!
//! - UUIDs are returned with curly braces (e.g., `{123e4567-e89b-...}`)
//! - The `full_name` field follows the format `{workspace}/{repo_slug}`

use serde::{Deserialize, Serialize};

use crate::api::common::Link;

/// Represents a Bitbucket Cloud repository.
///
/// # Fields
///
/// * `uuid` - Immutable identifier for the repository (includes curly braces)
/// * `name` - Human-readable name of the repository
/// * `full_name` - Full path in format `{workspace_slug}/{repo_slug}`
/// * `mainbranch` - Reference to the main/default branch
/// * `links` - Web links; `links.html.href` is the browse URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Unique identifier for the repository (e.g., `{123e4567-e89b-...}`).
    #[serde(default)]
    pub uuid: String,

    /// Human-readable name of the repository.
    #[serde(default)]
    pub name: String,

    /// Full path in format `{workspace_slug}/{repo_slug}`.
    #[serde(default)]
    pub full_name: String,

    /// Reference to the main/default branch of the repository.
    #[serde(default)]
    pub mainbranch: Option<Branch>,

    #[serde(default)]
    pub links: RepositoryLinks,
}

/// Links embedded in a repository resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryLinks {
    #[serde(default)]
    pub html: Option<Link>,
}

/// A branch name reference, as embedded in `mainbranch` and pull requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    /// The name of the branch.
    pub name: String,
}

/// A lightweight repository reference holding only the UUID.
///
/// Returned by the repository search used for permission checks, and
/// embedded in commit targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub uuid: String,
}

/// A branch as returned by `/refs/branches`.
///
/// # Example
///
/// ```rust
/// use scm_bitbucket::api::cloud::BranchRef;
///
/// let json = r#"{
///     "name": "main",
///     "target": {"hash": "abc123", "repository": {"uuid": "{repo-uuid}"}}
/// }"#;
///
/// let branch: BranchRef = serde_json::from_str(json).unwrap();
/// assert_eq!(branch.target.hash, "abc123");
/// assert_eq!(branch.target.repository.unwrap().uuid, "{repo-uuid}");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchRef {
    pub name: String,

    /// The head commit of the branch.
    pub target: CommitTarget,
}

/// Head commit of a branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitTarget {
    pub hash: String,

    #[serde(default)]
    pub repository: Option<RepositoryRef>,
}
