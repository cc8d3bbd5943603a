//
//  scm-bitbucket
//  scm/checkout.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Checkout Script
//!
//! Builds the shell step that clones the repository inside a build
//! container. The adapter never runs git itself.
//!
//! The script reads these variables from the build environment:
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `GIT_RECURSIVE_CLONE` | `false` disables `--recursive` |
//! | `GIT_SPARSE_CHECKOUT_PATH` | enables sparse checkout of these paths |
//! | `SCM_CLONE_TYPE` | `ssh` clones over ssh |
//! | `SCM_USERNAME`, `SCM_ACCESS_TOKEN` | https clone credentials (read-only mode falls back to `read_only.username`/`access_token`) |
//! | `SD_SOURCE_DIR`, `SD_ROOT_DIR` | clone destinations |
//!
//! Branch names, hosts and paths are interpolated verbatim. They come from
//! the orchestrator's pipeline records, never from webhook payloads.

use super::types::{CheckoutCommand, CheckoutConfig};
use crate::config::{AdapterConfig, CloneType};

/// Step name of the checkout command.
pub const CHECKOUT_STEP_NAME: &str = "sd-checkout-code";

/// Runs git directly when available, through the git step otherwise.
const GIT_WRAPPER: &str =
    "$(if git --version > /dev/null 2>&1; then echo 'eval'; else echo 'sd-step exec core/git'; fi)";

const EXTERNAL_CONFIG_DIR: &str = "$SD_ROOT_DIR/config";

/// Builds the checkout step for a build.
pub fn build_checkout_command(adapter: &AdapterConfig, config: &CheckoutConfig) -> CheckoutCommand {
    let checkout_url = format!("{}/{}/{}", config.host, config.org, config.repo);
    let ssh_checkout_url = format!("git@{}:{}/{}", config.host, config.org, config.repo);
    let branch = config.commit_branch.as_deref().unwrap_or(config.branch.as_str());
    let git = |args: &str| format!("{} \"git {}\"", GIT_WRAPPER, args);

    let mut command = vec![
        "if [ ! -z $GIT_RECURSIVE_CLONE ] && [ $GIT_RECURSIVE_CLONE = false ]; \
         then export GIT_RECURSIVE_OPTION=\"\"; \
         else export GIT_RECURSIVE_OPTION=\"--recursive\"; fi"
            .to_string(),
        "if [ ! -z \"$GIT_SPARSE_CHECKOUT_PATH\" ]; \
         then export GIT_SPARSE_OPTION=\"--no-checkout\"; \
         else export GIT_SPARSE_OPTION=\"\"; fi"
            .to_string(),
        "echo 'Exporting environment variables'".to_string(),
        scm_url_statement(adapter, &checkout_url, &ssh_checkout_url),
        "export GIT_URL=$SCM_URL.git".to_string(),
        "export GIT_MERGE_AUTOEDIT=no".to_string(),
        git(&format!("config --global user.name '{}'", adapter.username)),
        git(&format!("config --global user.email '{}'", adapter.email)),
    ];

    if let Some(parent) = &config.parent_config {
        let parent_url = format!("{}/{}/{}", parent.host, parent.org, parent.repo);
        command.push(format!("echo 'Cloning external config repo {}'", parent_url));
        command.push(git(&format!(
            "clone $GIT_RECURSIVE_OPTION --quiet --progress --branch '{}' https://{} {}",
            parent.branch, parent_url, EXTERNAL_CONFIG_DIR
        )));
        command.push(git(&format!(
            "-C {} reset --hard '{}' --",
            EXTERNAL_CONFIG_DIR, parent.sha
        )));
        command.push(format!("echo 'Reset external config repo to {}'", parent.sha));
    }

    command.push(format!("echo 'Cloning {}, on branch {}'", checkout_url, branch));
    command.push(git(&format!(
        "clone $GIT_SPARSE_OPTION $GIT_RECURSIVE_OPTION --quiet --progress --branch '{}' $GIT_URL $SD_SOURCE_DIR",
        branch
    )));
    command.push("cd $SD_SOURCE_DIR".to_string());
    command.push(format!(
        "if [ ! -z \"$GIT_SPARSE_CHECKOUT_PATH\" ]; then {}; {}; fi",
        git("sparse-checkout set $GIT_SPARSE_CHECKOUT_PATH"),
        git(&format!("checkout '{}'", branch))
    ));

    match &config.pr_ref {
        Some(pr_ref) => {
            command.push(git(&format!("reset --hard '{}' --", branch)));
            command.push(format!("echo 'Reset to {}'", branch));
            command.push(format!("echo 'Fetching PR {}'", pr_ref));
            command.push(git(&format!("fetch origin '{}'", pr_ref)));
            if config.merge_pr {
                command.push(format!("echo 'Merging {} into {}'", config.sha, branch));
                command.push(git(&format!("merge '{}'", config.sha)));
            } else {
                command.push(format!("echo 'Checking out {}'", config.sha));
                command.push(git(&format!("checkout '{}'", config.sha)));
            }
        }
        None => {
            command.push(git(&format!("reset --hard '{}' --", config.sha)));
            command.push(format!("echo 'Reset to {}'", config.sha));
        }
    }

    if let Some(root_dir) = config.root_dir.as_deref().filter(|dir| !dir.is_empty()) {
        command.push(format!("cd {}", root_dir));
    }

    CheckoutCommand {
        name: CHECKOUT_STEP_NAME.to_string(),
        command: command.join(" && "),
    }
}

/// Selects the clone URL.
///
/// Read-only mode fixes the protocol; over https the configured read-only
/// credentials stand in for missing build variables. Otherwise
/// `SCM_CLONE_TYPE=ssh` wins, then exported credentials, then anonymous
/// https.
fn scm_url_statement(adapter: &AdapterConfig, checkout_url: &str, ssh_checkout_url: &str) -> String {
    let with_credentials = format!(
        "export SCM_URL=https://$SCM_USERNAME:$SCM_ACCESS_TOKEN@{}",
        checkout_url
    );
    let anonymous = format!("export SCM_URL=https://{}", checkout_url);
    let ssh = format!("export SCM_URL={}", ssh_checkout_url);

    if adapter.read_only.enabled {
        return match adapter.read_only.clone_type {
            CloneType::Ssh => ssh,
            CloneType::Https => {
                let fallback = configured_credentials(adapter)
                    .map(|(username, token)| {
                        format!("export SCM_URL=https://{}:{}@{}", username, token, checkout_url)
                    })
                    .unwrap_or(anonymous);
                format!(
                    "if [ ! -z $SCM_USERNAME ] && [ ! -z $SCM_ACCESS_TOKEN ]; then {}; else {}; fi",
                    with_credentials, fallback
                )
            }
        };
    }

    format!(
        "if [ ! -z $SCM_CLONE_TYPE ] && [ $SCM_CLONE_TYPE = ssh ]; then {}; \
         elif [ ! -z $SCM_USERNAME ] && [ ! -z $SCM_ACCESS_TOKEN ]; then {}; \
         else {}; fi",
        ssh, with_credentials, anonymous
    )
}

/// Configured read-only credentials, encoded for the URL userinfo.
fn configured_credentials(adapter: &AdapterConfig) -> Option<(String, String)> {
    let read_only = &adapter.read_only;
    if read_only.username.is_empty() || read_only.access_token.is_empty() {
        return None;
    }
    Some((
        urlencoding::encode(&read_only.username).into_owned(),
        urlencoding::encode(&read_only.access_token).into_owned(),
    ))
}
