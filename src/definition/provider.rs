use super::VersionProvider;
use crate::error::{Error, Result};
use crate::model::{SoftwarePackage, SoftwareVersion};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;

/// Maximum page size accepted by the GitHub tags endpoint.
const PAGE_SIZE: usize = 100;

const GITHUB_API_URL: &str = "https://api.github.com";

/// Provider returning a fixed list of version labels.
pub struct StaticProvider {
    labels: Vec<String>,
}

impl StaticProvider {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl VersionProvider for StaticProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn get_versions(&self, package: &SoftwarePackage) -> Result<HashSet<SoftwareVersion>> {
        Ok(self
            .labels
            .iter()
            .map(|label| SoftwareVersion::new(package.clone(), label.as_str()))
            .collect())
    }
}

/// Provider listing the tags of a GitHub repository.
pub struct GitHubTagsProvider {
    client: reqwest::Client,
    api_url: String,
    repository: String,
    tag_prefix: Option<String>,
    token: Option<String>,
}

#[derive(Deserialize)]
struct GitHubTag {
    name: String,
}

impl GitHubTagsProvider {
    /// Creates a provider for `owner/repo`.
    ///
    /// A token in `GITHUB_TOKEN` is sent along to raise the rate limit.
    pub fn new(client: reqwest::Client, repository: impl Into<String>) -> Self {
        Self {
            client,
            api_url: GITHUB_API_URL.to_string(),
            repository: repository.into(),
            tag_prefix: None,
            token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }

    /// Only tags starting with `prefix` are versions; the prefix is stripped.
    pub fn with_tag_prefix(mut self, prefix: Option<String>) -> Self {
        self.tag_prefix = prefix.filter(|p| !p.is_empty());
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn label_for(&self, tag: &str) -> Option<String> {
        let label = match &self.tag_prefix {
            Some(prefix) => tag.strip_prefix(prefix.as_str())?,
            None => tag,
        };
        let label = label.trim();
        if label.is_empty() {
            None
        } else {
            Some(label.to_string())
        }
    }

    async fn fetch_page(&self, package: &SoftwarePackage, page: usize) -> Result<Vec<GitHubTag>> {
        let url = format!(
            "{}/repos/{}/tags?per_page={}&page={}",
            self.api_url, self.repository, PAGE_SIZE, page
        );
        let provider_error = |reason: String| Error::Provider {
            package: package.name.clone(),
            reason,
        };

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| provider_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(provider_error(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| provider_error(e.to_string()))
    }
}

#[async_trait]
impl VersionProvider for GitHubTagsProvider {
    fn name(&self) -> &'static str {
        "github_tags"
    }

    async fn get_versions(&self, package: &SoftwarePackage) -> Result<HashSet<SoftwareVersion>> {
        let mut versions = HashSet::new();
        let mut page = 1;

        loop {
            let tags = self.fetch_page(package, page).await?;
            let last_page = tags.len() < PAGE_SIZE;

            versions.extend(
                tags.iter()
                    .filter_map(|tag| self.label_for(&tag.name))
                    .map(|label| SoftwareVersion::new(package.clone(), label)),
            );

            if last_page {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            package = %package,
            repository = %self.repository,
            count = versions.len(),
            "listed upstream tags"
        );

        Ok(versions)
    }
}
