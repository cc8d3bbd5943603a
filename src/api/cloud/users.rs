//
//  scm-bitbucket
//  api/cloud/users.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Cloud user types.

use serde::{Deserialize, Serialize};

use crate::api::common::Link;

/// A Bitbucket Cloud account, as returned by `/users/{selected_user}` and
/// embedded in commits and pull requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    /// Account UUID (e.g., `{123e4567-e89b-...}`).
    #[serde(default)]
    pub uuid: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub nickname: Option<String>,

    #[serde(default)]
    pub links: UserLinks,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserLinks {
    #[serde(default)]
    pub html: Option<Link>,

    #[serde(default)]
    pub avatar: Option<Link>,
}

impl User {
    /// Browse URL of the profile, empty when Bitbucket omitted it.
    pub fn html_url(&self) -> String {
        self.links.html.as_ref().map(|l| l.href.clone()).unwrap_or_default()
    }

    /// Avatar URL, empty when Bitbucket omitted it.
    pub fn avatar_url(&self) -> String {
        self.links
            .avatar
            .as_ref()
            .map(|l| l.href.clone())
            .unwrap_or_default()
    }
}
