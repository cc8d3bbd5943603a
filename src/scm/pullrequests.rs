//
//  scm-bitbucket
//  scm/pullrequests.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Pull request lookups.

use tracing::debug;

use super::types::PullRequestInfo;
use super::BitbucketScm;
use crate::api::cloud::PullRequest;
use crate::api::common::{PaginatedResponse, Result};
use crate::uri::ScmUri;

/// Open pull requests fetched per page.
pub const OPEN_PR_PAGE_SIZE: u32 = 50;

impl BitbucketScm {
    /// Lists every open pull request of the repository.
    pub async fn get_opened_prs(&self, scm_uri: &str) -> Result<Vec<PullRequestInfo>> {
        let token = self.token().await?;
        let uri = ScmUri::decode(scm_uri);
        let path = format!("/repositories/{}/pullrequests?state=OPEN", uri.repo_id);

        let mut prs = Vec::new();
        let mut page = 1;
        loop {
            let response: PaginatedResponse<PullRequest> = self
                .client
                .get_page(&path, &token, page, OPEN_PR_PAGE_SIZE)
                .await?;
            debug!(page, count = response.values.len(), "Fetched pull request page");

            let full = response.is_full(OPEN_PR_PAGE_SIZE);
            prs.extend(response.values.into_iter().map(PullRequestInfo::from));
            if !full {
                return Ok(prs);
            }
            page += 1;
        }
    }

    pub async fn get_pr_info(&self, scm_uri: &str, pr_num: u64) -> Result<PullRequestInfo> {
        let token = self.token().await?;
        let uri = ScmUri::decode(scm_uri);

        let pr: PullRequest = self
            .client
            .get(
                &format!("/repositories/{}/pullrequests/{}", uri.repo_id, pr_num),
                &token,
            )
            .await?;

        Ok(pr.into())
    }
}
