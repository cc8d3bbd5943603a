//
//  scm-bitbucket
//  cli/pr.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use anyhow::Result;
use clap::Args;

use super::GlobalOptions;

/// List open pull requests
#[derive(Args, Debug)]
pub struct PrsArgs {
    /// Repository URI
    pub scm_uri: String,
}

impl PrsArgs {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let prs = global.scm()?.get_opened_prs(&self.scm_uri).await?;
        global.output().write(&prs)
    }
}

/// Show a pull request
#[derive(Args, Debug)]
pub struct PrArgs {
    /// Repository URI
    pub scm_uri: String,

    /// Pull request number
    pub number: u64,
}

impl PrArgs {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let pr = global.scm()?.get_pr_info(&self.scm_uri, self.number).await?;
        global.output().write(&pr)
    }
}
