//! Project service client - wire types and HTTP access to the backend
//!
//! This module provides the typed HTTP client for the project service that
//! owns the repository catalogue and the project entries derived from it.
//! The [`ProjectService`] trait is the seam consumed by the reconciler so
//! that tests can substitute the transport.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, info, warn};

use crate::config::{AuthConfig, Config};

/// A GitHub repository as reported by the project service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// Stable identifier, unique per session
    pub id: String,

    /// Repository name
    pub name: String,

    /// One-line description shown in the table
    #[serde(default)]
    pub short_description: String,

    /// Browser URL of the repository
    pub url: String,

    /// Linked project id, if a project entry exists for this repository
    #[serde(default)]
    pub project_id: Option<String>,
}

impl Repository {
    /// Whether a project entry exists for this repository
    pub fn is_linked(&self) -> bool {
        self.project_id.is_some()
    }
}

/// A project entry descriptor returned from create/delete calls
///
/// Projects are owned by the service; the client only ever reads these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub repository_id: String,
}

/// Project service operations consumed by the reconciler
#[async_trait]
pub trait ProjectService: Send + Sync {
    /// Fetch the full repository catalogue
    async fn fetch_repositories(&self) -> Result<Vec<Repository>>;

    /// Create one project entry for a repository
    async fn create_project(&self, repo: &Repository) -> Result<Project>;

    /// Delete one project entry by project id
    async fn delete_project(&self, project_id: &str) -> Result<Project>;

    /// Create project entries for a batch of repositories
    ///
    /// The returned list may be shorter than the request on partial failure.
    async fn create_projects(&self, repos: &[Repository]) -> Result<Vec<Project>>;

    /// Delete a batch of project entries by project id
    ///
    /// Same partial-failure shape as [`ProjectService::create_projects`].
    async fn delete_projects(&self, project_ids: &[String]) -> Result<Vec<Project>>;
}

/// Bearer credential sources
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Token written directly into the configuration
    Inline,
    /// Token read from an environment variable
    Environment,
    /// Token read from a file
    TokenFile,
}

/// Batched create request body
#[derive(Serialize)]
struct CreateManyRequest<'a> {
    repos: &'a [Repository],
}

/// HTTP implementation of [`ProjectService`] backed by reqwest
pub struct HttpProjectService {
    client: reqwest::Client,
    base_url: String,
    auth: AuthConfig,
}

impl HttpProjectService {
    /// Create a client from the application configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.backend.base_url.trim_end_matches('/').to_string(),
            auth: config.auth.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Resolve the bearer credential for a single request
    ///
    /// The credential is re-read every call so a rotated token or changed
    /// environment takes effect without restarting.
    pub fn bearer_token(&self) -> Result<(CredentialSource, String)> {
        match self.auth.method.as_str() {
            "auto" => {
                // Inline first, then environment, then token file
                if let Ok(token) = Self::try_inline_token(&self.auth) {
                    Ok((CredentialSource::Inline, token))
                } else if let Ok(token) = Self::try_environment_token(&self.auth) {
                    Ok((CredentialSource::Environment, token))
                } else if let Ok(token) = Self::try_token_file(&self.auth) {
                    Ok((CredentialSource::TokenFile, token))
                } else {
                    Err(anyhow!(
                        "No project service credential found. Please either:\n\
                         1. Set the {} environment variable\n\
                         2. Point auth.token_file at a file containing the token\n\
                         3. Set auth.token in the configuration",
                        self.auth.token_env
                    ))
                }
            }
            "inline" => {
                let token = Self::try_inline_token(&self.auth)
                    .context("auth.method is \"inline\" but auth.token is not set")?;
                Ok((CredentialSource::Inline, token))
            }
            "env" => {
                let token = Self::try_environment_token(&self.auth).with_context(|| {
                    format!("{} environment variable not found or empty", self.auth.token_env)
                })?;
                Ok((CredentialSource::Environment, token))
            }
            "file" => {
                let token = Self::try_token_file(&self.auth)
                    .context("auth.method is \"file\" but the token file could not be read")?;
                Ok((CredentialSource::TokenFile, token))
            }
            other => Err(anyhow!("Unknown auth method: {}", other)),
        }
    }

    /// Try the inline configuration token
    fn try_inline_token(auth: &AuthConfig) -> Result<String> {
        let token = auth
            .token
            .clone()
            .ok_or_else(|| anyhow!("auth.token is not set"))?;

        if token.is_empty() {
            return Err(anyhow!("auth.token is empty"));
        }

        Ok(token)
    }

    /// Try to get the token from the configured environment variable
    fn try_environment_token(auth: &AuthConfig) -> Result<String> {
        debug!("Attempting environment variable credential: {}", auth.token_env);

        let token = env::var(&auth.token_env)
            .with_context(|| format!("{} environment variable not set", auth.token_env))?;

        if token.is_empty() {
            return Err(anyhow!("{} is empty", auth.token_env));
        }

        Ok(token)
    }

    /// Try to read the token from the configured file
    fn try_token_file(auth: &AuthConfig) -> Result<String> {
        let path = auth
            .token_file
            .as_ref()
            .ok_or_else(|| anyhow!("auth.token_file is not set"))?;

        debug!("Attempting token file credential: {}", path);

        let token = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read token file: {}", path))?
            .trim()
            .to_string();

        if token.is_empty() {
            return Err(anyhow!("Token file {} is empty", path));
        }

        Ok(token)
    }
}

#[async_trait]
impl ProjectService for HttpProjectService {
    async fn fetch_repositories(&self) -> Result<Vec<Repository>> {
        let (_, token) = self.bearer_token()?;

        debug!("Fetching repository catalogue from {}", self.base_url);

        let repos = self
            .client
            .get(self.url("/repos"))
            .bearer_auth(&token)
            .send()
            .await
            .context("Failed to reach the project service")?
            .error_for_status()
            .context("Repository listing was rejected by the project service")?
            .json::<Vec<Repository>>()
            .await
            .context("Failed to decode the repository listing")?;

        let linked = repos.iter().filter(|r| r.is_linked()).count();
        info!("Fetched {} repositories ({} linked)", repos.len(), linked);

        Ok(repos)
    }

    async fn create_project(&self, repo: &Repository) -> Result<Project> {
        let (_, token) = self.bearer_token()?;

        debug!("Creating project for repository {}", repo.name);

        let project = self
            .client
            .post(self.url("/project"))
            .bearer_auth(&token)
            .json(repo)
            .send()
            .await
            .context("Failed to reach the project service")?
            .error_for_status()
            .context("Project creation was rejected by the project service")?
            .json::<Project>()
            .await
            .context("Failed to decode the created project")?;

        info!("Created project {} for repository {}", project.id, repo.name);
        Ok(project)
    }

    async fn delete_project(&self, project_id: &str) -> Result<Project> {
        let (_, token) = self.bearer_token()?;

        debug!("Deleting project {}", project_id);

        let project = self
            .client
            .delete(self.url(&format!("/project/{}", project_id)))
            .bearer_auth(&token)
            .send()
            .await
            .context("Failed to reach the project service")?
            .error_for_status()
            .context("Project deletion was rejected by the project service")?
            .json::<Project>()
            .await
            .context("Failed to decode the deleted project")?;

        info!("Deleted project {}", project.id);
        Ok(project)
    }

    async fn create_projects(&self, repos: &[Repository]) -> Result<Vec<Project>> {
        let (_, token) = self.bearer_token()?;

        debug!("Creating projects for {} repositories", repos.len());

        let created = self
            .client
            .post(self.url("/projects"))
            .bearer_auth(&token)
            .json(&CreateManyRequest { repos })
            .send()
            .await
            .context("Failed to reach the project service")?
            .error_for_status()
            .context("Bulk project creation was rejected by the project service")?
            .json::<Vec<Project>>()
            .await
            .context("Failed to decode the created projects")?;

        if created.len() < repos.len() {
            warn!(
                "Bulk create returned {} of {} requested projects",
                created.len(),
                repos.len()
            );
        }

        Ok(created)
    }

    async fn delete_projects(&self, project_ids: &[String]) -> Result<Vec<Project>> {
        let (_, token) = self.bearer_token()?;

        debug!("Deleting {} projects", project_ids.len());

        let params: Vec<(&str, &str)> = project_ids
            .iter()
            .map(|id| ("projectIds", id.as_str()))
            .collect();

        let deleted = self
            .client
            .delete(self.url("/projects"))
            .bearer_auth(&token)
            .query(&params)
            .send()
            .await
            .context("Failed to reach the project service")?
            .error_for_status()
            .context("Bulk project deletion was rejected by the project service")?
            .json::<Vec<Project>>()
            .await
            .context("Failed to decode the deleted projects")?;

        if deleted.len() < project_ids.len() {
            warn!(
                "Bulk delete returned {} of {} requested projects",
                deleted.len(),
                project_ids.len()
            );
        }

        Ok(deleted)
    }
}
