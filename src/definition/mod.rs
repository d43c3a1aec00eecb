//! Tracked software definitions.
//!
//! A [`SoftwareDefinition`] pairs a [`SoftwarePackage`] with a
//! [`VersionProvider`] that enumerates upstream releases and a
//! [`StaticFileCollector`] that gathers the static assets of one release.
//!
//! # Available Capabilities
//!
//! | Type | Capability | Source |
//! |------|------------|--------|
//! | [`StaticProvider`] | Versions | Fixed list from config |
//! | [`GitHubTagsProvider`] | Versions | GitHub repository tags |
//! | [`UrlTemplateCollector`] | Static files | URL template per file |
//! | [`NoopCollector`] | Static files | Nothing |

mod collector;
mod provider;
mod registry;

pub use collector::{NoopCollector, UrlTemplateCollector};
pub use provider::{GitHubTagsProvider, StaticProvider};
pub use registry::build_definitions;

use crate::error::Result;
use crate::model::{SoftwarePackage, SoftwareVersion, StaticFile};
use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Enumerates every version of a package currently available upstream.
///
/// The answer reflects upstream state at call time and may grow between
/// calls.
#[async_trait]
pub trait VersionProvider: Send + Sync {
    /// Returns a short description used in logs and listings.
    fn name(&self) -> &'static str;

    async fn get_versions(&self, package: &SoftwarePackage) -> Result<HashSet<SoftwareVersion>>;
}

/// Gathers the static files shipped with one version.
#[async_trait]
pub trait StaticFileCollector: Send + Sync {
    fn name(&self) -> &'static str;

    async fn collect_static_files(
        &self,
        definition: &SoftwareDefinition,
        version: &SoftwareVersion,
    ) -> Result<HashSet<StaticFile>>;
}

/// A tracked package with its provider and collector.
#[derive(Clone)]
pub struct SoftwareDefinition {
    pub software_package: SoftwarePackage,
    pub provider: Arc<dyn VersionProvider>,
    pub collector: Arc<dyn StaticFileCollector>,
}

impl SoftwareDefinition {
    pub fn new(
        software_package: SoftwarePackage,
        provider: Arc<dyn VersionProvider>,
        collector: Arc<dyn StaticFileCollector>,
    ) -> Self {
        Self {
            software_package,
            provider,
            collector,
        }
    }

    pub async fn get_versions(&self) -> Result<HashSet<SoftwareVersion>> {
        self.provider.get_versions(&self.software_package).await
    }

    pub async fn collect_static_files(&self, version: &SoftwareVersion) -> Result<HashSet<StaticFile>> {
        self.collector.collect_static_files(self, version).await
    }
}

impl fmt::Debug for SoftwareDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareDefinition")
            .field("software_package", &self.software_package)
            .field("provider", &self.provider.name())
            .field("collector", &self.collector.name())
            .finish()
    }
}
