//
//  scm-bitbucket
//  auth/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Authentication Module
//!
//! OAuth 2.0 consumer authentication for Bitbucket Cloud.
//!
//! ## Module Structure
//!
//! - [`oauth`]: Token endpoint requests (`client_credentials` and
//!   `refresh_token` grants)
//! - [`token`]: The cached token triple and its lazy-refresh lifecycle
//!
//! ## Example
//!
//! ```rust
//! use scm_bitbucket::auth::{Grant, TokenState};
//!
//! let state = TokenState::default();
//! assert_eq!(state.next_grant(), Grant::ClientCredentials);
//!
//! let state = TokenState {
//!     access_token: "access".into(),
//!     refresh_token: "refresh".into(),
//!     expires_at: 0,
//! };
//! assert_eq!(state.next_grant(), Grant::RefreshToken("refresh".into()));
//! ```

mod oauth;
mod token;

pub use oauth::*;
pub use token::*;
