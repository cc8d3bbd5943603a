//
//  scm-bitbucket
//  scm/types.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Request and response shapes of the provider operations.
//!
//! Everything here serializes in the orchestrator's camelCase vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::cloud::PullRequest;

/// A decorated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub url: String,
    pub name: String,
    pub username: String,
    pub avatar: String,
}

impl Author {
    /// Minimal record for a user Bitbucket cannot resolve.
    pub fn placeholder(hostname: &str, username: &str) -> Self {
        Self {
            id: username.to_string(),
            url: format!("https://{}/", hostname),
            name: username.to_string(),
            username: username.to_string(),
            avatar: format!("https://{}/account/{}/avatar/32/", hostname, username),
        }
    }
}

/// A decorated commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub url: String,
    pub message: String,
    pub author: Author,
}

/// Display form of a repository URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoDisplay {
    pub branch: String,
    /// `owner/slug`.
    pub name: String,
    /// Browse URL of the branch.
    pub url: String,
    /// Empty when the URI names no directory.
    pub root_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestInfo {
    /// `PR-<number>`.
    pub name: String,
    /// Source branch.
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: String,
    pub url: String,
    pub base_branch: String,
    /// UUID of the author.
    pub username: String,
    pub title: String,
    pub create_time: String,
    pub user_profile: String,
}

impl From<PullRequest> for PullRequestInfo {
    fn from(pr: PullRequest) -> Self {
        Self {
            name: format!("PR-{}", pr.id),
            sha: pr.source.hash(),
            url: pr.html_url(),
            user_profile: pr.author.html_url(),
            git_ref: pr.source.branch.name,
            base_branch: pr.destination.branch.name,
            username: pr.author.uuid,
            title: pr.title,
            create_time: pr.created_on.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchInfo {
    pub name: String,
}

/// Repository permissions of the authenticated identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PermissionSet {
    pub admin: bool,
    pub push: bool,
    pub pull: bool,
}

/// OAuth application settings for the orchestrator's login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BellConfig {
    pub provider: String,
    pub client_id: String,
    pub client_secret: String,
    pub is_secure: bool,
    pub force_https: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutCommand {
    pub name: String,
    pub command: String,
}

/// Parameters of a file fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRequest {
    pub scm_uri: String,
    /// Path relative to the URI's root directory, or a full checkout URL
    /// of the form `git@host:owner/repo.git#branch:path/to/file`.
    pub path: String,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
}

/// Build states reported by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    Success,
    Running,
    Queued,
    Failure,
    Aborted,
    Created,
    Blocked,
    Frozen,
    Unstable,
    Collapsed,
}

impl BuildStatus {
    /// Bitbucket commit status state.
    pub fn bitbucket_state(self) -> &'static str {
        match self {
            Self::Success => "SUCCESSFUL",
            Self::Running | Self::Queued | Self::Created | Self::Blocked | Self::Frozen => {
                "INPROGRESS"
            }
            Self::Failure | Self::Unstable => "FAILED",
            Self::Aborted | Self::Collapsed => "STOPPED",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Running => "RUNNING",
            Self::Queued => "QUEUED",
            Self::Failure => "FAILURE",
            Self::Aborted => "ABORTED",
            Self::Created => "CREATED",
            Self::Blocked => "BLOCKED",
            Self::Frozen => "FROZEN",
            Self::Unstable => "UNSTABLE",
            Self::Collapsed => "COLLAPSED",
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SUCCESS" => Ok(Self::Success),
            "RUNNING" => Ok(Self::Running),
            "QUEUED" => Ok(Self::Queued),
            "FAILURE" => Ok(Self::Failure),
            "ABORTED" => Ok(Self::Aborted),
            "CREATED" => Ok(Self::Created),
            "BLOCKED" => Ok(Self::Blocked),
            "FROZEN" => Ok(Self::Frozen),
            "UNSTABLE" => Ok(Self::Unstable),
            "COLLAPSED" => Ok(Self::Collapsed),
            other => Err(format!("unknown build status '{}'", other)),
        }
    }
}

/// Parameters of a commit status update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub scm_uri: String,
    pub sha: String,
    pub build_status: BuildStatus,
    pub job_name: String,
    /// Build page linked from the status.
    pub url: String,
    pub pipeline_id: u64,
}

/// Parameters of the checkout script.
///
/// All values come from the orchestrator's own pipeline records and are
/// interpolated into the script as-is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutConfig {
    pub branch: String,
    /// Branch to clone when it differs from `branch`.
    #[serde(default)]
    pub commit_branch: Option<String>,
    pub host: String,
    pub org: String,
    pub repo: String,
    pub sha: String,
    /// Pull request source ref; set for PR builds.
    #[serde(default)]
    pub pr_ref: Option<String>,
    #[serde(default)]
    pub root_dir: Option<String>,
    #[serde(default)]
    pub parent_config: Option<ParentConfig>,
    /// Merge the PR head into the base branch instead of checking it out.
    #[serde(default = "default_merge_pr")]
    pub merge_pr: bool,
}

fn default_merge_pr() -> bool {
    true
}

/// Repository holding the configuration of a child pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentConfig {
    pub branch: String,
    pub host: String,
    pub org: String,
    pub repo: String,
    pub sha: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_status_states() {
        assert_eq!(BuildStatus::Success.bitbucket_state(), "SUCCESSFUL");
        assert_eq!(BuildStatus::Running.bitbucket_state(), "INPROGRESS");
        assert_eq!(BuildStatus::Queued.bitbucket_state(), "INPROGRESS");
        assert_eq!(BuildStatus::Failure.bitbucket_state(), "FAILED");
        assert_eq!(BuildStatus::Aborted.bitbucket_state(), "STOPPED");
        assert_eq!(BuildStatus::Unstable.bitbucket_state(), "FAILED");
    }

    #[test]
    fn test_build_status_parsing() {
        assert_eq!("success".parse::<BuildStatus>().unwrap(), BuildStatus::Success);
        assert!("DONE".parse::<BuildStatus>().is_err());

        let status: BuildStatus = serde_json::from_str("\"ABORTED\"").unwrap();
        assert_eq!(status, BuildStatus::Aborted);
        assert_eq!(status.to_string(), "ABORTED");
    }

    #[test]
    fn test_checkout_config_defaults() {
        let config: CheckoutConfig = serde_json::from_str(
            r#"{"branch":"main","host":"bitbucket.org","org":"batman","repo":"test","sha":"abc"}"#,
        )
        .unwrap();
        assert!(config.merge_pr);
        assert_eq!(config.pr_ref, None);
    }

    #[test]
    fn test_pull_request_info_serializes_ref() {
        let info = PullRequestInfo {
            name: "PR-1".into(),
            git_ref: "feature".into(),
            sha: "abc".into(),
            url: "https://bitbucket.org/batman/test/pull-requests/1".into(),
            base_branch: "main".into(),
            username: "{user}".into(),
            title: "Title".into(),
            create_time: "2026-01-12T10:00:00+00:00".into(),
            user_profile: "https://bitbucket.org/%7Buser%7D/".into(),
        };
        let value = serde_json::to_value(info).unwrap();
        assert_eq!(value["ref"], "feature");
        assert_eq!(value["baseBranch"], "main");
        assert_eq!(value["createTime"], "2026-01-12T10:00:00+00:00");
    }
}
