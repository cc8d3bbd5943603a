//
//  scm-bitbucket
//  api/cloud/commits.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud commit and commit build status types.

use serde::{Deserialize, Serialize};

use super::users::User;
use crate::api::common::Link;

/// A commit as returned by `/repositories/{workspace}/{repo}/commit/{sha}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub author: CommitAuthor,

    #[serde(default)]
    pub links: CommitLinks,
}

/// Author of a commit.
///
/// `raw` is the git author line (`Name <email>`); `user` is present only
/// when Bitbucket could link the author to an account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub raw: String,

    #[serde(default)]
    pub user: Option<User>,
}

impl CommitAuthor {
    /// The name part of the raw author line.
    pub fn raw_name(&self) -> &str {
        self.raw
            .split_once('<')
            .map(|(name, _)| name.trim())
            .unwrap_or_else(|| self.raw.trim())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitLinks {
    #[serde(default)]
    pub html: Option<Link>,
}

/// Request body for `POST .../commit/{sha}/statuses/build`.
///
/// # Fields
///
/// * `key` - Identifies the status; posting the same key again updates it
/// * `name` - Title shown in the Bitbucket UI
/// * `url` - Link to the build
/// * `state` - One of `SUCCESSFUL`, `INPROGRESS`, `FAILED`, `STOPPED`
/// * `description` - Free-form description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildStatusRequest {
    pub key: String,
    pub name: String,
    pub url: String,
    pub state: String,
    pub description: String,
}
