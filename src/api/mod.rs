//
//  scm-bitbucket
//  api/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # API Client Layer
//!
//! This module provides the HTTP plumbing for talking to Bitbucket Cloud's
//! REST API v2.0 at `api.bitbucket.org`.
//!
//! ## Architecture
//!
//! - [`transport`]: The [`Transport`] seam and the retrying, circuit-breaking
//!   [`FuseboxTransport`]
//! - [`client`]: Path-based request helpers with bearer authentication
//! - [`cloud`]: Serde types for Bitbucket Cloud resources
//! - [`common`]: Shared types (errors, pagination, links)
//!
//! ## Error Handling
//!
//! Failures are returned as [`ScmError`] variants. Non-success responses
//! become [`ScmError::Http`] carrying the original status code, which
//! callers use to special-case `404` and `422`.

/// HTTP client for Bitbucket Cloud API paths.
pub mod client;

/// Bitbucket Cloud API v2.0 resource types.
pub mod cloud;

/// Common types shared by every API module.
pub mod common;

/// Transport trait and the default `reqwest` implementation.
pub mod transport;

pub use client::BitbucketClient;
pub use common::{Result, ScmError};
pub use transport::{FuseboxTransport, HttpRequest, HttpResponse, Transport, TransportStats};
