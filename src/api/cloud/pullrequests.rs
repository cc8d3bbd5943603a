//
//  scm-bitbucket
//  api/cloud/pullrequests.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud pull request types.
//!
//! The same shape is used for the REST resource and for the `pullrequest`
//! object inside webhook payloads.
//!
//! # Example
//!
//! ```rust
//! use scm_bitbucket::api::cloud::pullrequests::PullRequest;
//!
//! let json = r#"{
//!     "id": 7,
//!     "title": "Fix the bat signal",
//!     "state": "OPEN",
//!     "source": {"branch": {"name": "fix"}, "commit": {"hash": "abc"}},
//!     "destination": {"branch": {"name": "main"}, "commit": {"hash": "def"}}
//! }"#;
//!
//! let pr: PullRequest = serde_json::from_str(json).unwrap();
//! assert_eq!(pr.source.branch.name, "fix");
//! assert_eq!(pr.destination.branch.name, "main");
//! ```

use serde::{Deserialize, Serialize};

use super::repositories::Branch;
use super::users::User;
use crate::api::common::Link;

/// A Bitbucket Cloud pull request.
///
/// # State Values
///
/// - `OPEN` - Pull request is open and can be merged
/// - `MERGED` - Pull request has been merged
/// - `DECLINED` - Pull request was declined
/// - `SUPERSEDED` - Pull request was superseded by another
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: u64,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub state: String,

    #[serde(default)]
    pub created_on: Option<String>,

    #[serde(default)]
    pub author: User,

    pub source: PullRequestEndpoint,

    pub destination: PullRequestEndpoint,

    #[serde(default)]
    pub links: PullRequestLinks,
}

/// Source or destination of a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestEndpoint {
    pub branch: Branch,

    #[serde(default)]
    pub commit: Option<CommitHash>,
}

impl PullRequestEndpoint {
    /// The endpoint commit hash, empty when Bitbucket omitted it.
    pub fn hash(&self) -> String {
        self.commit.as_ref().map(|c| c.hash.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitHash {
    pub hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequestLinks {
    #[serde(default)]
    pub html: Option<Link>,
}

impl PullRequest {
    /// Browse URL of the pull request, empty when Bitbucket omitted it.
    pub fn html_url(&self) -> String {
        self.links.html.as_ref().map(|l| l.href.clone()).unwrap_or_default()
    }
}
