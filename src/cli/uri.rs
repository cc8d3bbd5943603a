//
//  scm-bitbucket
//  cli/uri.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Repository URI commands
//!
//! ```bash
//! # Resolve a checkout URL (talks to Bitbucket)
//! scm-bitbucket parse-url git@bitbucket.org:batman/test.git#main
//!
//! # Split a stored URI (offline)
//! scm-bitbucket decode-uri 'bitbucket.org:batman/{de7d7695}:main:app'
//! ```

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::uri::ScmUri;

use super::GlobalOptions;

/// Resolve a checkout URL into a repository URI
#[derive(Args, Debug)]
pub struct ParseUrlArgs {
    /// Checkout URL, optionally with a `#branch[:rootDir]` fragment
    pub checkout_url: String,

    /// Subdirectory of the repository, overrides the fragment
    #[arg(long)]
    pub root_dir: Option<String>,
}

impl ParseUrlArgs {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        let scm = global.scm()?;
        let uri = scm
            .parse_url(&self.checkout_url, self.root_dir.as_deref())
            .await?;

        global.output().write(&ParsedUrl { scm_uri: uri })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParsedUrl {
    scm_uri: String,
}

/// Split a repository URI into its parts
#[derive(Args, Debug)]
pub struct DecodeUriArgs {
    /// URI in `hostname:owner/uuid:branch[:rootDir]` form
    pub scm_uri: String,
}

impl DecodeUriArgs {
    pub fn run(&self, global: &GlobalOptions) -> Result<()> {
        global.output().write(&ScmUri::decode(&self.scm_uri))
    }
}
