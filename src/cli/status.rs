//
//  scm-bitbucket
//  cli/status.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Build status command
//!
//! ```bash
//! scm-bitbucket status 'bitbucket.org:batman/{de7d7695}:main' 40171b678527 \
//!     --state SUCCESS --job main --pipeline-id 123 \
//!     --url https://cd.example.com/pipelines/123/builds/1
//! ```

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::scm::{status_context, status_key, BuildStatus, StatusUpdate};

use super::GlobalOptions;

/// Report a build status on a commit
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Repository URI
    pub scm_uri: String,

    /// Commit the status is attached to
    pub sha: String,

    /// Build state: SUCCESS, RUNNING, QUEUED, FAILURE, ABORTED, ...
    #[arg(long)]
    pub state: BuildStatus,

    /// Job name; every PR-* job shares one status
    #[arg(long)]
    pub job: String,

    /// Pipeline id
    #[arg(long)]
    pub pipeline_id: u64,

    /// Build page linked from the status
    #[arg(long)]
    pub url: String,
}

impl StatusArgs {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let scm = global.scm()?;
        scm.update_commit_status(&StatusUpdate {
            scm_uri: self.scm_uri.clone(),
            sha: self.sha.clone(),
            build_status: self.state,
            job_name: self.job.clone(),
            url: self.url.clone(),
            pipeline_id: self.pipeline_id,
        })
        .await?;

        let context = status_context(self.pipeline_id, &self.job);
        global.output().write(&StatusReport {
            key: status_key(&context, &self.sha),
            state: self.state.bitbucket_state(),
            context,
        })
    }
}

#[derive(Serialize)]
struct StatusReport {
    context: String,
    key: String,
    state: &'static str,
}
