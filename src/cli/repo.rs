//
//  scm-bitbucket
//  cli/repo.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Repository commands
//!
//! All of these talk to Bitbucket and need OAuth credentials.
//!
//! ## Examples
//!
//! ```bash
//! scm-bitbucket branches 'bitbucket.org:batman/{de7d7695}:main'
//! scm-bitbucket file 'bitbucket.org:batman/{de7d7695}:main' screwdriver.yaml --raw
//! scm-bitbucket permissions 'bitbucket.org:batman/{de7d7695}:main'
//! scm-bitbucket commit-sha 'bitbucket.org:batman/{de7d7695}:main' --pr 3
//! scm-bitbucket decorate author batman
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::scm::FileRequest;

use super::GlobalOptions;

/// List branches
#[derive(Args, Debug)]
pub struct BranchesArgs {
    /// Repository URI
    pub scm_uri: String,
}

impl BranchesArgs {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let branches = global.scm()?.get_branch_list(&self.scm_uri).await?;
        global.output().write(&branches)
    }
}

/// Print the contents of a file
#[derive(Args, Debug)]
pub struct FileArgs {
    /// Repository URI
    pub scm_uri: String,

    /// Path relative to the URI's root directory, or a checkout URL
    /// with a `#branch:path` fragment
    pub path: String,

    /// Branch, tag or commit to read from
    #[arg(long = "ref")]
    pub git_ref: Option<String>,

    /// Print the contents as-is instead of a JSON document
    #[arg(long)]
    pub raw: bool,
}

impl FileArgs {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let contents = global
            .scm()?
            .get_file(&FileRequest {
                scm_uri: self.scm_uri.clone(),
                path: self.path.clone(),
                git_ref: self.git_ref.clone(),
            })
            .await?;

        if self.raw {
            print!("{}", contents);
            return Ok(());
        }
        global.output().write(&FileContents {
            path: &self.path,
            contents,
        })
    }
}

#[derive(Serialize)]
struct FileContents<'a> {
    path: &'a str,
    contents: String,
}

/// Show the token owner's permissions on a repository
#[derive(Args, Debug)]
pub struct PermissionsArgs {
    /// Repository URI
    pub scm_uri: String,
}

impl PermissionsArgs {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let permissions = global.scm()?.get_permissions(&self.scm_uri).await?;
        global.output().write(&permissions)
    }
}

/// Resolve the head commit of a branch or pull request
#[derive(Args, Debug)]
pub struct CommitShaArgs {
    /// Repository URI
    pub scm_uri: String,

    /// Pull request number, the URI's branch otherwise
    #[arg(long)]
    pub pr: Option<u64>,
}

impl CommitShaArgs {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let sha = global.scm()?.get_commit_sha(&self.scm_uri, self.pr).await?;
        global.output().write(&serde_json::json!({ "sha": sha }))
    }
}

/// Decorate an author, repository or commit for display
#[derive(Args, Debug)]
pub struct DecorateCommand {
    #[command(subcommand)]
    pub command: DecorateSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum DecorateSubcommand {
    /// Look up a user by username or uuid
    Author {
        username: String,
    },

    /// Describe the repository behind a URI
    Url {
        scm_uri: String,
    },

    /// Describe a commit
    Commit {
        scm_uri: String,
        sha: String,
    },
}

impl DecorateCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let scm = global.scm()?;
        let output = global.output();

        match &self.command {
            DecorateSubcommand::Author { username } => {
                output.write(&scm.decorate_author(username).await?)
            }
            DecorateSubcommand::Url { scm_uri } => output.write(&scm.decorate_url(scm_uri).await?),
            DecorateSubcommand::Commit { scm_uri, sha } => {
                output.write(&scm.decorate_commit(scm_uri, sha).await?)
            }
        }
    }
}
