//! HTTP client for the Travis CI API, bound to one registered repository

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::env_var::{EnvVar, EnvVarApi, EnvVarSpec};
use crate::settings::{RepositorySettings, SettingsApi};
use crate::{Error, Result};

/// Endpoint for private repositories.
pub const PRO_API_URL: &str = "https://api.travis-ci.com";
/// Endpoint for public repositories.
pub const ORG_API_URL: &str = "https://api.travis-ci.org";

const MEDIA_TYPE: &str = "application/vnd.travis-ci.2+json";

/// Travis client bound to the numeric id of `owner/name`.
pub struct TravisClient {
    client: Client,
    base_url: String,
    token: String,
    repository_id: u64,
}

#[derive(Debug, Deserialize)]
struct RepoEnvelope {
    repo: RepoBody,
}

#[derive(Debug, Deserialize)]
struct RepoBody {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct EnvVarList {
    env_vars: Vec<EnvVar>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EnvVarEnvelope<T> {
    env_var: T,
}

#[derive(Debug, Serialize)]
struct SettingsEnvelope<'a> {
    settings: &'a RepositorySettings,
}

impl TravisClient {
    /// Resolve `owner/name` on the API at `base_url` and bind to its id.
    ///
    /// # Errors
    ///
    /// Fails if the token is rejected or the repository is not known to
    /// this endpoint.
    pub async fn connect(base_url: &str, token: &str, owner: &str, name: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("repo-policy/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        let mut travis = Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            repository_id: 0,
        };
        let found: RepoEnvelope = travis
            .send(travis.request(Method::GET, &format!("/repos/{owner}/{name}")))
            .await?;
        travis.repository_id = found.repo.id;
        Ok(travis)
    }

    /// Numeric id of the bound repository.
    pub fn repository_id(&self) -> u64 {
        self.repository_id
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(AUTHORIZATION, format!("token \"{}\"", self.token))
            .header(ACCEPT, MEDIA_TYPE)
    }

    fn env_var_request(&self, method: Method, id: Option<&str>) -> RequestBuilder {
        let path = match id {
            Some(id) => format!("/settings/env_vars/{id}"),
            None => "/settings/env_vars".to_string(),
        };
        self.request(method, &path)
            .query(&[("repository_id", self.repository_id)])
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
impl EnvVarApi for TravisClient {
    async fn list_env_vars(&self) -> Result<Vec<EnvVar>> {
        let listed: EnvVarList = self.send(self.env_var_request(Method::GET, None)).await?;
        Ok(listed.env_vars)
    }

    async fn create_env_var(&self, spec: &EnvVarSpec) -> Result<EnvVar> {
        let request = self
            .env_var_request(Method::POST, None)
            .json(&EnvVarEnvelope { env_var: spec });
        let created: EnvVarEnvelope<EnvVar> = self.send(request).await?;
        Ok(created.env_var)
    }

    async fn update_env_var(&self, id: &str, spec: &EnvVarSpec) -> Result<EnvVar> {
        let request = self
            .env_var_request(Method::PATCH, Some(id))
            .json(&EnvVarEnvelope { env_var: spec });
        let updated: EnvVarEnvelope<EnvVar> = self.send(request).await?;
        Ok(updated.env_var)
    }

    async fn delete_env_var(&self, id: &str) -> Result<()> {
        self.send_empty(self.env_var_request(Method::DELETE, Some(id)))
            .await
    }
}

#[async_trait]
impl SettingsApi for TravisClient {
    async fn update_settings(&self, settings: &RepositorySettings) -> Result<()> {
        let path = format!("/repos/{}/settings", self.repository_id);
        let request = self
            .request(Method::PATCH, &path)
            .json(&SettingsEnvelope { settings });
        self.send_empty(request).await
    }
}
