//
//  scm-bitbucket
//  scm/status.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Commit build statuses.
//!
//! Each job reports under its own context:
//!
//! ```text
//! Screwdriver/<pipelineId>/<jobName>    # branch jobs
//! Screwdriver/<pipelineId>/PR           # every PR-* job
//! ```

use tracing::debug;

use super::types::StatusUpdate;
use super::BitbucketScm;
use crate::api::cloud::BuildStatusRequest;
use crate::api::common::Result;
use crate::uri::ScmUri;

/// Status context of a job.
pub fn status_context(pipeline_id: u64, job_name: &str) -> String {
    let job = if job_name.starts_with("PR") { "PR" } else { job_name };
    format!("Screwdriver/{}/{}", pipeline_id, job)
}

/// Status key, unique per context and commit.
pub fn status_key(context: &str, sha: &str) -> String {
    format!("{}:{}", context, sha)
}

impl BitbucketScm {
    /// Reports a build state on a commit.
    ///
    /// Bitbucket rejects some repeated updates with `422`; those are treated
    /// as applied.
    pub async fn update_commit_status(&self, update: &StatusUpdate) -> Result<()> {
        let token = self.token().await?;
        let uri = ScmUri::decode(&update.scm_uri);

        let context = status_context(update.pipeline_id, &update.job_name);
        let body = BuildStatusRequest {
            key: status_key(&context, &update.sha),
            name: context.clone(),
            url: update.url.clone(),
            state: update.build_status.bitbucket_state().to_string(),
            description: context,
        };

        let path = format!(
            "/repositories/{}/commit/{}/statuses/build",
            uri.repo_id, update.sha
        );
        match self
            .client
            .post::<serde_json::Value, _>(&path, &token, &body)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if err.is_status(422) => {
                debug!(sha = %update.sha, error = %err, "Status update rejected as unprocessable");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
