//
//  scm-bitbucket
//  lib.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # scm-bitbucket
//!
//! Bitbucket Cloud adapter for a CI/CD orchestrator. The orchestrator talks
//! to source control through [`ScmProvider`]; [`BitbucketScm`] implements it
//! against the Bitbucket Cloud 2.0 REST API.
//!
//! ## Features
//!
//! - **Repository URIs**: checkout URLs resolve to stable
//!   `hostname:owner/{uuid}:branch[:rootDir]` identifiers
//! - **OAuth**: one client-credentials token per adapter, refreshed lazily
//! - **Webhooks**: idempotent registration and normalization of push and
//!   pull request deliveries
//! - **Builds**: commit statuses and the shell checkout step
//! - **Resilience**: retries with backoff and a circuit breaker on every request
//!
//! ## Module Structure
//!
//! - [`scm`]: the adapter facade and its canonical types
//! - [`uri`]: checkout URL parsing and repository URI encoding
//! - [`auth`]: OAuth grants and the token lifecycle
//! - [`webhook`]: webhook registration and event normalization
//! - [`api`]: REST client, transport and Bitbucket response models
//! - [`config`]: adapter configuration
//! - [`cli`] and [`output`]: the `scm-bitbucket` binary
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use scm_bitbucket::{AdapterConfig, BitbucketScm, ScmProvider};
//!
//! # async fn example() -> scm_bitbucket::Result<()> {
//! let scm = BitbucketScm::new(AdapterConfig::new("client-id", "client-secret"))?;
//!
//! let uri = scm.parse_url("git@bitbucket.org:batman/test.git#main", None).await?;
//! let branches = scm.get_branch_list(&uri).await?;
//! # Ok(())
//! # }
//! ```

/// REST client for the Bitbucket Cloud 2.0 API.
///
/// Holds the transport (retries and circuit breaker), pagination helpers,
/// the error type and the response models.
pub mod api;

/// OAuth client-credentials grants and the cached token.
pub mod auth;

/// Command-line interface definitions.
pub mod cli;

/// Adapter configuration.
///
/// Loaded from TOML. The default location is platform-specific:
/// - Linux: `~/.config/scm-bitbucket/config.toml`
/// - macOS: `~/Library/Application Support/scm-bitbucket/config.toml`
pub mod config;

/// JSON output of the binary.
pub mod output;

/// The [`ScmProvider`] contract and its Bitbucket implementation.
pub mod scm;

/// Checkout URLs and repository URIs.
pub mod uri;

/// Webhook registration and delivery normalization.
pub mod webhook;

pub use api::common::{Result, ScmError};
pub use cli::Cli;
pub use config::AdapterConfig;
pub use scm::{BitbucketScm, ScmProvider};
pub use uri::ScmUri;

/// Application version, from Cargo.toml.
///
/// ```rust
/// use scm_bitbucket::VERSION;
///
/// println!("scm-bitbucket version {}", VERSION);
/// ```
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit codes for the CLI.
///
/// # Example
///
/// ```rust,no_run
/// use scm_bitbucket::exit_codes;
/// use std::process;
///
/// process::exit(exit_codes::ERROR);
/// ```
pub mod exit_codes {
    /// The command completed without errors.
    pub const SUCCESS: i32 = 0;

    /// An error occurred during execution. Check stderr for details.
    pub const ERROR: i32 = 1;

    /// Invalid arguments or options. Use `--help` to see correct usage.
    pub const USAGE: i32 = 2;
}
