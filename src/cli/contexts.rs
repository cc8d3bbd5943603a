//
//  scm-bitbucket
//  cli/contexts.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use std::collections::BTreeMap;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::scm::BellConfig;

use super::GlobalOptions;

/// Show the adapter's SCM contexts
#[derive(Args, Debug)]
pub struct ContextsArgs {
    /// Also print the login provider configuration (includes the secret)
    #[arg(long)]
    pub bell: bool,
}

impl ContextsArgs {
    pub fn run(&self, global: &GlobalOptions) -> Result<()> {
        if self.bell {
            let scm = global.scm()?;
            return global.output().write(&ContextsWithBell {
                contexts: scm.get_scm_contexts(),
                bell: scm.get_bell_configuration(),
            });
        }

        let config = global.adapter_config()?;
        global.output().write(&vec![config.scm_context()])
    }
}

#[derive(Serialize)]
struct ContextsWithBell {
    contexts: Vec<String>,
    bell: BTreeMap<String, BellConfig>,
}
