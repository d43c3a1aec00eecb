//! Configuration file handling.
//!
//! This module provides loading and saving of webprint configuration
//! from a TOML file.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/webprint/config.toml`
//! - macOS: `~/Library/Application Support/webprint/config.toml`
//! - Windows: `%APPDATA%\webprint\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! max_workers = 4
//! step_limit = 10
//! index_marking = "last"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//!
//! [[definitions]]
//! name = "WordPress"
//! provider = { kind = "github_tags", repository = "WordPress/WordPress" }
//!
//! [definitions.collector]
//! kind = "url_template"
//! url = "https://raw.githubusercontent.com/WordPress/WordPress/{version}/{path}"
//! files = ["wp-includes/js/wp-emoji-release.min.js"]
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use crate::error::Error;
use crate::logging::LogFormat;

/// Which processed versions get marked indexed at the end of a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMarking {
    /// Only the last version processed per definition is marked. Other
    /// processed versions stay in the backlog and are processed again.
    #[default]
    Last,
    /// Every processed version is marked.
    All,
}

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use webprint::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Workers: {}", config.max_workers);
/// println!("Definitions: {}", config.definitions.len());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of definitions indexed in parallel.
    ///
    /// Default: 4
    pub max_workers: usize,

    /// Maximum number of versions processed per definition in one pass.
    ///
    /// Default: 10
    pub step_limit: usize,

    /// Which processed versions are marked indexed after a pass.
    ///
    /// Default: "last"
    pub index_marking: IndexMarking,

    /// Abort after this many passes without reaching a fixpoint.
    ///
    /// Default: 0 (unlimited)
    pub max_passes: usize,

    /// Location of the JSON store.
    pub store_path: PathBuf,

    /// Timeout for a single HTTP request, in seconds.
    ///
    /// Default: 30
    pub request_timeout_secs: u64,

    /// User agent sent with every request.
    pub user_agent: String,

    pub logging: LoggingConfig,

    /// Tracked software definitions.
    pub definitions: Vec<DefinitionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level filter, overridden by `RUST_LOG`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// One tracked package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionConfig {
    pub name: String,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// A fixed list of version labels.
    Static { versions: Vec<String> },
    /// Tags of a GitHub repository (`owner/repo`).
    GithubTags {
        repository: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tag_prefix: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectorConfig {
    #[default]
    None,
    /// Fetch `files` through a URL template with `{version}` and `{path}`.
    UrlTemplate { url: String, files: Vec<String> },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_workers: 4,
            step_limit: 10,
            index_marking: IndexMarking::Last,
            max_passes: 0,
            store_path: Self::default_store_path(),
            request_timeout_secs: 30,
            user_agent: concat!("webprint/", env!("CARGO_PKG_VERSION")).to_string(),
            logging: LoggingConfig::default(),
            definitions: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read,
    /// parsed, or fails validation.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> std::result::Result<(), Error> {
        if self.max_workers == 0 {
            return Err(Error::Config("max_workers must be at least 1".to_string()));
        }
        if self.step_limit == 0 {
            return Err(Error::Config("step_limit must be at least 1".to_string()));
        }

        let mut seen = HashSet::new();
        for definition in &self.definitions {
            if definition.name.trim().is_empty() {
                return Err(Error::Config("definition name must not be empty".to_string()));
            }
            if !seen.insert(definition.name.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate definition '{}'",
                    definition.name
                )));
            }
        }

        Ok(())
    }

    /// Saves the configuration to the default config file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Saves the configuration to `path`, creating its parent directory.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use webprint::Config;
    ///
    /// let path = Config::config_path();
    /// println!("Config file: {}", path.display());
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("webprint")
            .join("config.toml")
    }

    fn default_store_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("webprint")
            .join("store.json")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.max_workers, 4);
        assert_eq!(config.step_limit, 10);
        assert_eq!(config.index_marking, IndexMarking::Last);
        assert_eq!(config.max_passes, 0);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(config.definitions.is_empty());
        assert!(config.store_path.ends_with("webprint/store.json"));
    }

    #[test]
    fn test_parse_definitions() {
        let config: Config = toml::from_str(
            r#"
            step_limit = 2
            index_marking = "all"

            [logging]
            format = "json"

            [[definitions]]
            name = "WordPress"
            provider = { kind = "github_tags", repository = "WordPress/WordPress" }
            collector = { kind = "url_template", url = "https://a.test/{version}/{path}", files = ["readme.html"] }

            [[definitions]]
            name = "Example"
            provider = { kind = "static", versions = ["1.0", "1.1"] }
            "#,
        )
        .unwrap();

        assert_eq!(config.step_limit, 2);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.index_marking, IndexMarking::All);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.definitions.len(), 2);
        assert!(matches!(
            config.definitions[0].provider,
            ProviderConfig::GithubTags { ref repository, tag_prefix: None } if repository == "WordPress/WordPress"
        ));
        assert!(matches!(config.definitions[1].collector, CollectorConfig::None));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = Config {
            max_workers: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_step_limit() {
        let config = Config {
            step_limit: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_definitions() {
        let definition = DefinitionConfig {
            name: "WordPress".to_string(),
            provider: ProviderConfig::Static { versions: vec![] },
            collector: CollectorConfig::None,
        };
        let config = Config {
            definitions: vec![definition.clone(), definition],
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate definition 'WordPress'"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.max_workers, 4);
    }

    #[test]
    fn test_load_invalid_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_workers = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_save_to_explicit_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("webprint.toml");

        let config = Config {
            step_limit: 3,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.step_limit, 3);
    }

    #[test]
    fn test_default_config_roundtrips() {
        let text = Config::generate_default_config();
        let config: Config = toml::from_str(&text).unwrap();
        assert_eq!(config.step_limit, 10);
    }
}
