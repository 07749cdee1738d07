//! HTTP client for the GitHub REST API, scoped to one repository

use std::time::Duration;

use async_trait::async_trait;
use repo_git::{Commit, GitDataStore, NewTreeEntry, Sha, Tree};
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::webhook::{Hook, HookApi, HookSpec};
use crate::{Error, Result};

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const HOOKS_PER_PAGE: usize = 100;

/// GitHub client bound to `owner/name`.
pub struct GithubClient {
    client: Client,
    base_url: String,
    token: String,
    owner: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct GitObject {
    sha: Sha,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: GitObject,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: Sha,
    tree: GitObject,
    #[serde(default)]
    parents: Vec<GitObject>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct CreateTreeRequest<'a> {
    tree: &'a [NewTreeEntry],
}

#[derive(Debug, Serialize)]
struct CreateCommitRequest<'a> {
    message: &'a str,
    tree: &'a Sha,
    parents: &'a [Sha],
}

#[derive(Debug, Serialize)]
struct UpdateRefRequest<'a> {
    sha: &'a Sha,
    force: bool,
}

/// Path of a ref below `git/ref(s)/`, without the leading `refs/`.
fn ref_path(name: &str) -> &str {
    name.strip_prefix("refs/").unwrap_or(name)
}

impl GithubClient {
    /// Create a client for `owner/name` on the API at `base_url`.
    pub fn new(base_url: &str, token: &str, owner: &str, name: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("repo-policy/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!(
            "{}/repos/{}/{}{}",
            self.base_url, self.owner, self.name, path
        );
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/vnd.github+json")
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_string();
        let message = response.text().await.unwrap_or_default();
        if status == StatusCode::NOT_FOUND {
            Err(Error::NotFound(url))
        } else {
            Err(Error::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl GitDataStore for GithubClient {
    async fn get_ref(&self, name: &str) -> repo_git::Result<Sha> {
        let path = format!("/git/ref/{}", ref_path(name));
        match self.send::<RefResponse>(self.request(Method::GET, &path)).await {
            Ok(reference) => Ok(reference.object.sha),
            Err(Error::NotFound(_)) => Err(repo_git::Error::RefNotFound {
                name: name.to_string(),
            }),
            Err(e) => Err(repo_git::Error::backend(e)),
        }
    }

    async fn get_commit(&self, sha: &Sha) -> repo_git::Result<Commit> {
        let path = format!("/git/commits/{sha}");
        let commit: CommitResponse = self
            .send(self.request(Method::GET, &path))
            .await
            .map_err(repo_git::Error::backend)?;

        Ok(Commit {
            sha: commit.sha,
            tree: commit.tree.sha,
            parents: commit.parents.into_iter().map(|p| p.sha).collect(),
            message: commit.message,
        })
    }

    async fn get_tree(&self, sha: &Sha, recursive: bool) -> repo_git::Result<Tree> {
        let mut request = self.request(Method::GET, &format!("/git/trees/{sha}"));
        if recursive {
            request = request.query(&[("recursive", "1")]);
        }
        self.send(request).await.map_err(repo_git::Error::backend)
    }

    async fn create_tree(&self, entries: &[NewTreeEntry]) -> repo_git::Result<Sha> {
        let request = self
            .request(Method::POST, "/git/trees")
            .json(&CreateTreeRequest { tree: entries });
        let created: GitObject = self.send(request).await.map_err(repo_git::Error::backend)?;
        Ok(created.sha)
    }

    async fn create_commit(&self, message: &str, tree: &Sha, parents: &[Sha]) -> repo_git::Result<Sha> {
        let request = self
            .request(Method::POST, "/git/commits")
            .json(&CreateCommitRequest {
                message,
                tree,
                parents,
            });
        let created: GitObject = self.send(request).await.map_err(repo_git::Error::backend)?;
        Ok(created.sha)
    }

    async fn update_ref(&self, name: &str, sha: &Sha) -> repo_git::Result<()> {
        let path = format!("/git/refs/{}", ref_path(name));
        let request = self
            .request(Method::PATCH, &path)
            .json(&UpdateRefRequest { sha, force: false });
        self.send_empty(request)
            .await
            .map_err(repo_git::Error::backend)
    }
}

#[async_trait]
impl HookApi for GithubClient {
    async fn list_hooks(&self) -> Result<Vec<Hook>> {
        let mut hooks = Vec::new();
        for page in 1.. {
            let request = self.request(Method::GET, "/hooks").query(&[
                ("per_page", HOOKS_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ]);
            let batch: Vec<Hook> = self.send(request).await?;
            let last = batch.len() < HOOKS_PER_PAGE;
            hooks.extend(batch);
            if last {
                break;
            }
        }
        Ok(hooks)
    }

    async fn create_hook(&self, spec: &HookSpec) -> Result<Hook> {
        self.send(self.request(Method::POST, "/hooks").json(spec))
            .await
    }

    async fn update_hook(&self, id: u64, spec: &HookSpec) -> Result<Hook> {
        self.send(self.request(Method::PATCH, &format!("/hooks/{id}")).json(spec))
            .await
    }

    async fn delete_hook(&self, id: u64) -> Result<()> {
        self.send_empty(self.request(Method::DELETE, &format!("/hooks/{id}")))
            .await
    }
}
