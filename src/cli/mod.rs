//
//  scm-bitbucket
//  cli/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! CLI command definitions using clap derive macros

mod checkout;
mod contexts;
mod hook;
mod pr;
mod repo;
mod status;
mod uri;

pub use checkout::CheckoutCommandArgs;
pub use contexts::ContextsArgs;
pub use hook::{AddWebhookArgs, ParseHookArgs};
pub use pr::{PrArgs, PrsArgs};
pub use repo::{BranchesArgs, CommitShaArgs, DecorateCommand, FileArgs, PermissionsArgs};
pub use status::StatusArgs;
pub use uri::{DecodeUriArgs, ParseUrlArgs};

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::AdapterConfig;
use crate::output::{OutputFormat, OutputWriter};
use crate::scm::BitbucketScm;

/// scm-bitbucket - Bitbucket Cloud adapter for CI/CD pipelines
#[derive(Parser, Debug)]
#[command(
    name = "scm-bitbucket",
    version,
    about = "Bitbucket Cloud adapter for CI/CD pipelines",
    long_about = "scm-bitbucket resolves repositories, reads files and branches, reports \
                  build statuses, registers webhooks and normalizes webhook deliveries \
                  for Bitbucket Cloud.\n\nEvery command prints JSON on stdout.",
    propagate_version = true,
    after_help = "Use 'scm-bitbucket <command> --help' for more information about a command."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Adapter configuration file (TOML)
    #[arg(long, global = true, env = "SCM_BITBUCKET_CONFIG")]
    pub config: Option<PathBuf>,

    /// OAuth consumer key, overrides the configuration file
    #[arg(long, global = true, env = "SCM_BITBUCKET_CLIENT_ID", hide_env_values = true)]
    pub client_id: Option<String>,

    /// OAuth consumer secret, overrides the configuration file
    #[arg(long, global = true, env = "SCM_BITBUCKET_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    pub compact: bool,
}

impl GlobalOptions {
    /// Loads the adapter configuration and applies command-line overrides.
    ///
    /// The result is not validated; commands that never talk to Bitbucket
    /// run without credentials.
    pub fn adapter_config(&self) -> Result<AdapterConfig> {
        let mut config = AdapterConfig::load_or_default(self.config.as_deref())?;
        if let Some(client_id) = &self.client_id {
            config.oauth_client_id = client_id.clone();
        }
        if let Some(client_secret) = &self.client_secret {
            config.oauth_client_secret = client_secret.clone();
        }
        Ok(config)
    }

    /// Builds an adapter from the validated configuration.
    pub fn scm(&self) -> Result<BitbucketScm> {
        Ok(BitbucketScm::new(self.adapter_config()?)?)
    }

    pub fn output(&self) -> OutputWriter {
        OutputWriter::new(if self.compact {
            OutputFormat::Compact
        } else {
            OutputFormat::Pretty
        })
    }
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a checkout URL into a repository URI
    ParseUrl(ParseUrlArgs),

    /// Split a repository URI into its parts
    DecodeUri(DecodeUriArgs),

    /// Normalize a webhook delivery
    ParseHook(ParseHookArgs),

    /// Print the checkout step for a build
    CheckoutCommand(CheckoutCommandArgs),

    /// List branches
    Branches(BranchesArgs),

    /// Print the contents of a file
    File(FileArgs),

    /// Show the token owner's permissions on a repository
    #[command(visible_alias = "perms")]
    Permissions(PermissionsArgs),

    /// List open pull requests
    Prs(PrsArgs),

    /// Show a pull request
    Pr(PrArgs),

    /// Resolve the head commit of a branch or pull request
    CommitSha(CommitShaArgs),

    /// Decorate an author, repository or commit for display
    Decorate(DecorateCommand),

    /// Report a build status on a commit
    Status(StatusArgs),

    /// Register the pipeline webhook on a repository
    AddWebhook(AddWebhookArgs),

    /// Show the adapter's SCM contexts
    Contexts(ContextsArgs),
}

impl Commands {
    /// Runs the selected command.
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        match self {
            Self::ParseUrl(cmd) => cmd.run(global).await,
            Self::DecodeUri(cmd) => cmd.run(global),
            Self::ParseHook(cmd) => cmd.run(global),
            Self::CheckoutCommand(cmd) => cmd.run(global),
            Self::Branches(cmd) => cmd.run(global).await,
            Self::File(cmd) => cmd.run(global).await,
            Self::Permissions(cmd) => cmd.run(global).await,
            Self::Prs(cmd) => cmd.run(global).await,
            Self::Pr(cmd) => cmd.run(global).await,
            Self::CommitSha(cmd) => cmd.run(global).await,
            Self::Decorate(cmd) => cmd.run(global).await,
            Self::Status(cmd) => cmd.run(global).await,
            Self::AddWebhook(cmd) => cmd.run(global).await,
            Self::Contexts(cmd) => cmd.run(global),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "oauth_client_id = \"file-id\"\noauth_client_secret = \"file-secret\"\nhostname = \"bitbucket.example.com\"\n",
        )
        .unwrap();

        let global = GlobalOptions {
            config: Some(path),
            client_id: Some("flag-id".into()),
            ..GlobalOptions::default()
        };
        let config = global.adapter_config().unwrap();

        assert_eq!(config.oauth_client_id, "flag-id");
        assert_eq!(config.oauth_client_secret, "file-secret");
        assert_eq!(config.hostname, "bitbucket.example.com");
    }

    #[test]
    fn test_scm_requires_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "hostname = \"bitbucket.org\"\n").unwrap();

        let global = GlobalOptions {
            config: Some(path),
            ..GlobalOptions::default()
        };
        assert!(global.scm().is_err());
    }

    #[test]
    fn test_output_format() {
        let global = GlobalOptions {
            compact: true,
            ..GlobalOptions::default()
        };
        assert_eq!(global.output().format(), OutputFormat::Compact);
        assert_eq!(GlobalOptions::default().output().format(), OutputFormat::Pretty);
    }
}
