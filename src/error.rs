//! Error types shared across the crate.
//!
//! Every failure inside the indexing core surfaces as an [`Error`] and aborts
//! the pass that triggered it. A low-confidence fingerprint is not an error;
//! it is an empty candidate set.

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Retrieving a resource over the network failed.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// A store, retrieve or mark operation on the backend failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// A version provider could not enumerate upstream versions.
    #[error("version provider for {package} failed: {reason}")]
    Provider { package: String, reason: String },

    /// A static file collector failed for one version.
    #[error("collecting static files for {package} {version} failed: {reason}")]
    Collector {
        package: String,
        version: String,
        reason: String,
    },

    /// A worker task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// The convergence loop ran more passes than allowed.
    #[error("no fixpoint reached after {0} passes")]
    PassLimit(usize),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn fetch(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message() {
        let err = Error::fetch("https://example.org/", "connection refused");
        assert_eq!(
            err.to_string(),
            "failed to fetch https://example.org/: connection refused"
        );
    }

    #[test]
    fn test_collector_error_message() {
        let err = Error::Collector {
            package: "WordPress".to_string(),
            version: "5.4".to_string(),
            reason: "404".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "collecting static files for WordPress 5.4 failed: 404"
        );
    }
}
