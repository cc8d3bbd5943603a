//
//  scm-bitbucket
//  scm/repository.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Repository, commit, user and branch operations.

use serde::Deserialize;
use tracing::debug;
use url::form_urlencoded;

use super::types::{Author, BranchInfo, CommitInfo, FileRequest, PermissionSet, RepoDisplay};
use super::BitbucketScm;
use crate::api::cloud::{BranchRef, Commit, Repository, User};
use crate::api::common::{encode_path, PaginatedResponse, Result, ScmError};
use crate::uri::{is_checkout_url, parse_checkout_url, ScmUri};

/// Branches fetched per page.
pub const BRANCH_PAGE_SIZE: u32 = 100;

/// Repository roles checked by [`BitbucketScm::get_permissions`], in
/// `admin`, `push`, `pull` order.
const PERMISSION_ROLES: [&str; 3] = ["admin", "contributor", "member"];

#[derive(Debug, Deserialize)]
struct RepositoryId {
    #[serde(default)]
    uuid: String,
}

impl BitbucketScm {
    /// Fetches a file.
    ///
    /// A path that is itself a checkout URL (`...repo.git#branch:path`)
    /// names the repository, branch and file directly. Otherwise the path is
    /// taken relative to the URI's root directory, at `ref` or the URI's
    /// branch. A missing file yields an empty string.
    pub async fn get_file(&self, request: &FileRequest) -> Result<String> {
        let token = self.token().await?;
        let uri = ScmUri::decode(&request.scm_uri);

        let path = if is_checkout_url(&request.path) {
            let info = parse_checkout_url(&request.path, None)?;
            let file = info
                .root_dir
                .clone()
                .ok_or_else(|| ScmError::InvalidUrl(request.path.clone()))?;
            let git_ref = info
                .branch
                .clone()
                .or_else(|| request.git_ref.clone())
                .unwrap_or_else(|| uri.branch.clone());
            format!(
                "/repositories/{}/src/{}/{}",
                info.full_name(),
                encode_path(&git_ref),
                encode_path(&file)
            )
        } else {
            let file = match &uri.root_dir {
                Some(root_dir) => format!("{}/{}", root_dir, request.path),
                None => request.path.clone(),
            };
            let git_ref = request.git_ref.as_deref().unwrap_or(uri.branch.as_str());
            format!(
                "/repositories/{}/src/{}/{}",
                uri.repo_id,
                encode_path(git_ref),
                encode_path(&file)
            )
        };

        match self.client.get_text(&path, &token).await {
            Ok(content) => Ok(content),
            Err(err) if err.is_status(404) => {
                debug!(path = %path, "File not found");
                Ok(String::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Looks up a user by UUID or account name.
    ///
    /// Users Bitbucket no longer resolves get a placeholder record.
    pub async fn decorate_author(&self, username: &str) -> Result<Author> {
        let token = self.token().await?;
        let encoded: String = form_urlencoded::byte_serialize(username.as_bytes()).collect();

        match self.client.get::<User>(&format!("/users/{}", encoded), &token).await {
            Ok(user) => Ok(Author {
                id: user.uuid.clone(),
                url: user.html_url(),
                avatar: user.avatar_url(),
                name: user.display_name,
                username: user.uuid,
            }),
            Err(err) if err.is_status(404) => {
                debug!(username, "Unknown user, using placeholder");
                Ok(Author::placeholder(&self.config.hostname, username))
            }
            Err(err) => Err(err),
        }
    }

    /// Describes the repository and branch of a URI.
    pub async fn decorate_url(&self, scm_uri: &str) -> Result<RepoDisplay> {
        let token = self.token().await?;
        let uri = ScmUri::decode(scm_uri);

        let repo: Repository = self
            .client
            .get(&format!("/repositories/{}", uri.repo_id), &token)
            .await?;
        let html = repo.links.html.map(|l| l.href).unwrap_or_default();

        Ok(RepoDisplay {
            url: format!("{}/src/{}", html, encode_path(&uri.branch)),
            branch: uri.branch,
            name: repo.full_name,
            root_dir: uri.root_dir.unwrap_or_default(),
        })
    }

    /// Describes a commit and its author.
    ///
    /// Authors without a linked Bitbucket account are described from the
    /// raw author line without a user lookup.
    pub async fn decorate_commit(&self, scm_uri: &str, sha: &str) -> Result<CommitInfo> {
        let token = self.token().await?;
        let uri = ScmUri::decode(scm_uri);

        let commit: Commit = self
            .client
            .get(&format!("/repositories/{}/commit/{}", uri.repo_id, sha), &token)
            .await?;

        let author = match commit.author.user.as_ref().filter(|u| !u.uuid.is_empty()) {
            Some(user) => self.decorate_author(&user.uuid).await?,
            None => Author::placeholder(&self.config.hostname, commit.author.raw_name()),
        };

        Ok(CommitInfo {
            url: commit.links.html.map(|l| l.href).unwrap_or_default(),
            message: commit.message,
            author,
        })
    }

    /// Head commit of a pull request, or of the URI's branch.
    pub async fn get_commit_sha(&self, scm_uri: &str, pr_num: Option<u64>) -> Result<String> {
        if let Some(pr_num) = pr_num {
            return Ok(self.get_pr_info(scm_uri, pr_num).await?.sha);
        }

        let token = self.token().await?;
        let uri = ScmUri::decode(scm_uri);
        let branch: BranchRef = self
            .client
            .get(
                &format!(
                    "/repositories/{}/refs/branches/{}",
                    uri.repo_id,
                    encode_path(&uri.branch)
                ),
                &token,
            )
            .await?;

        Ok(branch.target.hash)
    }

    /// Computes the permissions of the authenticated identity.
    ///
    /// The repository lookup runs first so a missing repository surfaces as
    /// its own error; the three role lookups then run concurrently.
    pub async fn get_permissions(&self, scm_uri: &str) -> Result<PermissionSet> {
        let token = self.token().await?;
        let uri = ScmUri::decode(scm_uri);

        let _: Repository = self
            .client
            .get(&format!("/repositories/{}", uri.repo_id), &token)
            .await?;

        let [admin_role, push_role, pull_role] = PERMISSION_ROLES;
        let (admin, push, pull) = tokio::try_join!(
            self.has_role(&uri, admin_role, &token),
            self.has_role(&uri, push_role, &token),
            self.has_role(&uri, pull_role, &token),
        )?;

        Ok(PermissionSet { admin, push, pull })
    }

    async fn has_role(&self, uri: &ScmUri, role: &str, token: &str) -> Result<bool> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("q", &format!("uuid=\"{}\"", uri.uuid()))
            .append_pair("role", role)
            .finish();

        let repos: PaginatedResponse<RepositoryId> = self
            .client
            .get(&format!("/repositories/{}?{}", uri.owner(), query), token)
            .await?;

        Ok(repos.values.iter().any(|repo| repo.uuid == uri.uuid()))
    }

    /// Lists every branch of the repository.
    pub async fn get_branch_list(&self, scm_uri: &str) -> Result<Vec<BranchInfo>> {
        let token = self.token().await?;
        let uri = ScmUri::decode(scm_uri);
        let path = format!("/repositories/{}/refs/branches", uri.repo_id);

        let mut branches = Vec::new();
        let mut page = 1;
        loop {
            let response: PaginatedResponse<BranchRef> = self
                .client
                .get_page(&path, &token, page, BRANCH_PAGE_SIZE)
                .await?;
            debug!(page, count = response.values.len(), "Fetched branch page");

            let full = response.is_full(BRANCH_PAGE_SIZE);
            branches.extend(
                response
                    .values
                    .into_iter()
                    .map(|branch| BranchInfo { name: branch.name }),
            );
            if !full {
                return Ok(branches);
            }
            page += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;
    use serde_json::json;

    use super::*;
    use crate::scm::test_support::{scm, REPO_PATH, SCM_URI, UUID};

    #[tokio::test]
    async fn test_get_file_relative_to_root_dir() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", format!("{}/src/main/app/screwdriver.yaml", REPO_PATH).as_str())
            .match_header("authorization", "Bearer token")
            .with_status(200)
            .with_body("jobs:\n  main: {}\n")
            .create_async()
            .await;

        let content = scm(&server.url())
            .get_file(&FileRequest {
                scm_uri: format!("{}:app", SCM_URI),
                path: "screwdriver.yaml".into(),
                git_ref: None,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(content, "jobs:\n  main: {}\n");
    }

    #[tokio::test]
    async fn test_get_file_at_ref() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", format!("{}/src/40171b678527/screwdriver.yaml", REPO_PATH).as_str())
            .with_status(200)
            .with_body("shared: {}")
            .create_async()
            .await;

        let content = scm(&server.url())
            .get_file(&FileRequest {
                scm_uri: SCM_URI.into(),
                path: "screwdriver.yaml".into(),
                git_ref: Some("40171b678527".into()),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(content, "shared: {}");
    }

    #[tokio::test]
    async fn test_get_file_from_checkout_url_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/repositories/robin/config/src/release/pipelines/sd.yaml")
            .with_status(200)
            .with_body("external")
            .create_async()
            .await;

        let content = scm(&server.url())
            .get_file(&FileRequest {
                scm_uri: SCM_URI.into(),
                path: "git@bitbucket.org:robin/config.git#release:pipelines/sd.yaml".into(),
                git_ref: None,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(content, "external");
    }

    #[tokio::test]
    async fn test_get_file_not_found_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{}/src/main/screwdriver.yaml", REPO_PATH).as_str())
            .with_status(404)
            .with_body(r#"{"type":"error","error":{"message":"No such file"}}"#)
            .create_async()
            .await;

        let content = scm(&server.url())
            .get_file(&FileRequest {
                scm_uri: SCM_URI.into(),
                path: "screwdriver.yaml".into(),
                git_ref: None,
            })
            .await
            .unwrap();

        assert_eq!(content, "");
    }

    #[tokio::test]
    async fn test_get_file_propagates_other_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{}/src/main/screwdriver.yaml", REPO_PATH).as_str())
            .with_status(403)
            .with_body(r#"{"type":"error","error":{"message":"Access denied"}}"#)
            .create_async()
            .await;

        let err = scm(&server.url())
            .get_file(&FileRequest {
                scm_uri: SCM_URI.into(),
                path: "screwdriver.yaml".into(),
                git_ref: None,
            })
            .await
            .unwrap_err();

        assert!(err.is_status(403));
        assert_eq!(err.to_string(), "Access denied");
    }

    #[tokio::test]
    async fn test_decorate_author() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/batman")
            .with_status(200)
            .with_body(
                json!({
                    "uuid": "{4f1a9b70}",
                    "display_name": "Batman",
                    "links": {
                        "html": { "href": "https://bitbucket.org/%7B4f1a9b70%7D/" },
                        "avatar": { "href": "https://avatar.example/batman.png" }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let author = scm(&server.url()).decorate_author("batman").await.unwrap();

        assert_eq!(
            author,
            Author {
                id: "{4f1a9b70}".into(),
                url: "https://bitbucket.org/%7B4f1a9b70%7D/".into(),
                name: "Batman".into(),
                username: "{4f1a9b70}".into(),
                avatar: "https://avatar.example/batman.png".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_decorate_author_not_found_uses_placeholder() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/robin")
            .with_status(404)
            .with_body(r#"{"type":"error","error":{"message":"robin not found"}}"#)
            .create_async()
            .await;

        let author = scm(&server.url()).decorate_author("robin").await.unwrap();

        assert_eq!(author.name, "robin");
        assert_eq!(author.url, "https://bitbucket.org/");
        assert_eq!(author.avatar, "https://bitbucket.org/account/robin/avatar/32/");
    }

    #[tokio::test]
    async fn test_decorate_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", REPO_PATH)
            .with_status(200)
            .with_body(
                json!({
                    "uuid": UUID,
                    "full_name": "batman/test",
                    "links": { "html": { "href": "https://bitbucket.org/batman/test" } }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let display = scm(&server.url())
            .decorate_url(&format!("{}:lib", SCM_URI))
            .await
            .unwrap();

        assert_eq!(
            display,
            RepoDisplay {
                branch: "main".into(),
                name: "batman/test".into(),
                url: "https://bitbucket.org/batman/test/src/main".into(),
                root_dir: "lib".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_decorate_commit_with_linked_user() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{}/commit/40171b678527", REPO_PATH).as_str())
            .with_status(200)
            .with_body(
                json!({
                    "hash": "40171b678527",
                    "message": "Fix the thing",
                    "author": { "raw": "Batman <batman@example.com>", "user": { "uuid": "batman-uuid" } },
                    "links": { "html": { "href": "https://bitbucket.org/batman/test/commits/40171b678527" } }
                })
                .to_string(),
            )
            .create_async()
            .await;
        let user = server
            .mock("GET", "/users/batman-uuid")
            .with_status(200)
            .with_body(r#"{"uuid":"batman-uuid","display_name":"Batman"}"#)
            .expect(1)
            .create_async()
            .await;

        let commit = scm(&server.url())
            .decorate_commit(SCM_URI, "40171b678527")
            .await
            .unwrap();

        user.assert_async().await;
        assert_eq!(commit.message, "Fix the thing");
        assert_eq!(commit.url, "https://bitbucket.org/batman/test/commits/40171b678527");
        assert_eq!(commit.author.name, "Batman");
    }

    #[tokio::test]
    async fn test_decorate_commit_without_linked_user() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{}/commit/40171b678527", REPO_PATH).as_str())
            .with_status(200)
            .with_body(r#"{"hash":"40171b678527","message":"msg","author":{"raw":"Alfred <alfred@example.com>"}}"#)
            .create_async()
            .await;
        let users = server
            .mock("GET", Matcher::Regex("^/users/".into()))
            .expect(0)
            .create_async()
            .await;

        let commit = scm(&server.url())
            .decorate_commit(SCM_URI, "40171b678527")
            .await
            .unwrap();

        users.assert_async().await;
        assert_eq!(commit.author.name, "Alfred");
        assert_eq!(commit.author.avatar, "https://bitbucket.org/account/Alfred/avatar/32/");
    }

    #[tokio::test]
    async fn test_get_commit_sha_for_branch() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{}/refs/branches/main", REPO_PATH).as_str())
            .with_status(200)
            .with_body(r#"{"name":"main","target":{"hash":"hashForMain"}}"#)
            .create_async()
            .await;

        let sha = scm(&server.url()).get_commit_sha(SCM_URI, None).await.unwrap();
        assert_eq!(sha, "hashForMain");
    }

    #[tokio::test]
    async fn test_get_commit_sha_keeps_hash_in_branch_name() {
        let mut server = mockito::Server::new_async().await;
        let encoded = server
            .mock("GET", format!("{}/refs/branches/fix%2312", REPO_PATH).as_str())
            .with_status(200)
            .with_body(r#"{"name":"fix#12","target":{"hash":"hashForFix12"}}"#)
            .expect(1)
            .create_async()
            .await;
        let truncated = server
            .mock("GET", format!("{}/refs/branches/fix", REPO_PATH).as_str())
            .with_status(200)
            .with_body(r#"{"name":"fix","target":{"hash":"hashForFix"}}"#)
            .expect(0)
            .create_async()
            .await;

        let uri = format!("bitbucket.org:batman/{}:fix#12", UUID);
        let sha = scm(&server.url()).get_commit_sha(&uri, None).await.unwrap();

        assert_eq!(sha, "hashForFix12");
        encoded.assert_async().await;
        truncated.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_file_encodes_ref_and_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                format!("{}/src/feature/v2%3Frc/docs/read%20me.md", REPO_PATH).as_str(),
            )
            .with_status(200)
            .with_body("notes")
            .expect(1)
            .create_async()
            .await;

        let content = scm(&server.url())
            .get_file(&FileRequest {
                scm_uri: SCM_URI.into(),
                path: "docs/read me.md".into(),
                git_ref: Some("feature/v2?rc".into()),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(content, "notes");
    }

    fn role_query(role: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), format!("uuid=\"{}\"", UUID)),
            Matcher::UrlEncoded("role".into(), role.into()),
        ])
    }

    #[tokio::test]
    async fn test_get_permissions_checks_each_role() {
        let mut server = mockito::Server::new_async().await;
        let repo = server
            .mock("GET", REPO_PATH)
            .with_status(200)
            .with_body(json!({ "uuid": UUID, "full_name": "batman/test" }).to_string())
            .expect(1)
            .create_async()
            .await;
        let admin = server
            .mock("GET", "/repositories/batman")
            .match_query(role_query("admin"))
            .with_status(200)
            .with_body(r#"{"values":[]}"#)
            .expect(1)
            .create_async()
            .await;
        let contributor = server
            .mock("GET", "/repositories/batman")
            .match_query(role_query("contributor"))
            .with_status(200)
            .with_body(json!({ "values": [{ "uuid": UUID }] }).to_string())
            .expect(1)
            .create_async()
            .await;
        let member = server
            .mock("GET", "/repositories/batman")
            .match_query(role_query("member"))
            .with_status(200)
            .with_body(json!({ "values": [{ "uuid": "other" }, { "uuid": UUID }] }).to_string())
            .expect(1)
            .create_async()
            .await;

        let permissions = scm(&server.url()).get_permissions(SCM_URI).await.unwrap();

        repo.assert_async().await;
        admin.assert_async().await;
        contributor.assert_async().await;
        member.assert_async().await;
        assert_eq!(
            permissions,
            PermissionSet {
                admin: false,
                push: true,
                pull: true
            }
        );
    }

    #[tokio::test]
    async fn test_get_permissions_missing_repository() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", REPO_PATH)
            .with_status(404)
            .with_body(r#"{"type":"error","error":{"message":"Repository not found"}}"#)
            .create_async()
            .await;

        let err = scm(&server.url()).get_permissions(SCM_URI).await.unwrap_err();
        assert!(err.is_status(404));
    }

    fn branch_page(page: u32, count: usize) -> String {
        let values: Vec<_> = (0..count)
            .map(|i| json!({ "name": format!("branch-{}-{}", page, i), "target": { "hash": "abc" } }))
            .collect();
        json!({ "values": values, "page": page, "pagelen": BRANCH_PAGE_SIZE }).to_string()
    }

    #[tokio::test]
    async fn test_get_branch_list_walks_full_pages() {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        for (page, count) in [(1, 100), (2, 100), (3, 100), (4, 0)] {
            let mock = server
                .mock("GET", format!("{}/refs/branches", REPO_PATH).as_str())
                .match_query(Matcher::AllOf(vec![
                    Matcher::UrlEncoded("pagelen".into(), "100".into()),
                    Matcher::UrlEncoded("page".into(), page.to_string()),
                ]))
                .with_status(200)
                .with_body(branch_page(page, count))
                .expect(1)
                .create_async()
                .await;
            mocks.push(mock);
        }

        let branches = scm(&server.url()).get_branch_list(SCM_URI).await.unwrap();

        for mock in &mocks {
            mock.assert_async().await;
        }
        assert_eq!(branches.len(), 300);
        assert_eq!(branches[0].name, "branch-1-0");
        assert_eq!(branches[299].name, "branch-3-99");
    }
}
