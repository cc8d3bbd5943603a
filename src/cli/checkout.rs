//
//  scm-bitbucket
//  cli/checkout.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Checkout step command
//!
//! Reads the build's checkout parameters as JSON and prints the step the
//! build container runs. No credentials are needed.
//!
//! ```bash
//! echo '{"branch":"main","host":"bitbucket.org","org":"batman","repo":"test","sha":"40171b6"}' \
//!     | scm-bitbucket checkout-command -
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::scm::{build_checkout_command, CheckoutConfig};

use super::GlobalOptions;

/// Print the checkout step for a build
#[derive(Args, Debug)]
pub struct CheckoutCommandArgs {
    /// JSON file with branch, host, org, repo, sha and optional prRef,
    /// commitBranch, rootDir, parentConfig and mergePr; `-` for stdin
    pub input: PathBuf,

    /// Print only the shell command
    #[arg(long)]
    pub script: bool,
}

impl CheckoutCommandArgs {
    pub fn run(&self, global: &GlobalOptions) -> Result<()> {
        let adapter = global.adapter_config()?;
        let config = self.read_config()?;
        let command = build_checkout_command(&adapter, &config);

        if self.script {
            println!("{}", command.command);
            return Ok(());
        }
        global.output().write(&command)
    }

    fn read_config(&self) -> Result<CheckoutConfig> {
        let content = if self.input.as_os_str() == "-" {
            let mut content = String::new();
            std::io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read checkout config from stdin")?;
            content
        } else {
            std::fs::read_to_string(&self.input)
                .with_context(|| format!("Failed to read checkout config {}", self.input.display()))?
        };

        serde_json::from_str(&content).context("Invalid checkout config")
    }
}
