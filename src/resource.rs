//! Lazily fetched network resources.
//!
//! A [`Resource`] wraps a URL and fetches its content on first access
//! through a [`Fetcher`]. The outcome of that single fetch is cached for
//! the lifetime of the instance, whether it succeeded or failed.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use webprint::resource::{HttpFetcher, Resource};
//!
//! #[tokio::main]
//! async fn main() -> webprint::Result<()> {
//!     let fetcher = Arc::new(HttpFetcher::new()?);
//!     let resource = Resource::new("https://wordpress.org/", fetcher);
//!
//!     let content = resource.content().await?;
//!     println!("{} bytes from {}", content.len(), resource);
//!     assert!(resource.retrieved().await);
//!     Ok(())
//! }
//! ```

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Default timeout for a single request.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Retrieves the raw bytes behind a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a fetcher with the default timeout and user agent.
    pub fn new() -> Result<Self> {
        Self::with_options(
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concat!("webprint/", env!("CARGO_PKG_VERSION")),
        )
    }

    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// The underlying client, for callers that need to issue their own requests.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(url, e))?;

        let response = response
            .error_for_status()
            .map_err(|e| Error::fetch(url, e))?;

        response.bytes().await.map_err(|e| Error::fetch(url, e))
    }
}

/// Cached outcome of a resource fetch.
#[derive(Debug, Clone)]
enum FetchState {
    NotFetched,
    Fetched(Bytes),
    Failed(String),
}

/// Any file which can be retrieved from a URL.
pub struct Resource {
    url: String,
    fetcher: Arc<dyn Fetcher>,
    state: Mutex<FetchState>,
}

impl Resource {
    pub fn new(url: impl Into<String>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            url: url.into(),
            fetcher,
            state: Mutex::new(FetchState::NotFetched),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the content, fetching it on first access.
    ///
    /// Concurrent callers wait on the same fetch. A failed fetch is not
    /// retried; later calls return the same error.
    pub async fn content(&self) -> Result<Bytes> {
        let mut state = self.state.lock().await;

        match &*state {
            FetchState::Fetched(content) => return Ok(content.clone()),
            FetchState::Failed(reason) => return Err(Error::fetch(&self.url, reason)),
            FetchState::NotFetched => {}
        }

        tracing::info!(url = %self.url, "retrieving resource");

        match self.fetcher.fetch(&self.url).await {
            Ok(content) => {
                *state = FetchState::Fetched(content.clone());
                Ok(content)
            }
            Err(err) => {
                let reason = match &err {
                    Error::Fetch { reason, .. } => reason.clone(),
                    other => other.to_string(),
                };
                *state = FetchState::Failed(reason);
                Err(err)
            }
        }
    }

    /// Whether the content has already been fetched successfully.
    pub async fn retrieved(&self) -> bool {
        matches!(&*self.state.lock().await, FetchState::Fetched(_))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Resource '{}'>", self.url)
    }
}
