use super::{SoftwareDefinition, StaticFileCollector};
use crate::error::{Error, Result};
use crate::model::{SoftwareVersion, StaticFile};
use crate::resource::{Fetcher, Resource};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Collector that never finds any files.
pub struct NoopCollector;

#[async_trait]
impl StaticFileCollector for NoopCollector {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn collect_static_files(
        &self,
        _definition: &SoftwareDefinition,
        _version: &SoftwareVersion,
    ) -> Result<HashSet<StaticFile>> {
        Ok(HashSet::new())
    }
}

/// Collector fetching a fixed list of files per version.
///
/// The URL of each file is built from a template in which `{version}` is
/// replaced by the version label and `{path}` by the file's relative path.
pub struct UrlTemplateCollector {
    url_template: String,
    files: Vec<String>,
    fetcher: Arc<dyn Fetcher>,
}

impl UrlTemplateCollector {
    pub fn new(url_template: impl Into<String>, files: Vec<String>, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let url_template = url_template.into();
        if !url_template.contains("{path}") {
            return Err(Error::Config(format!(
                "url template '{}' must contain {{path}}",
                url_template
            )));
        }

        Ok(Self {
            url_template,
            files,
            fetcher,
        })
    }

    fn url_for(&self, version: &SoftwareVersion, path: &str) -> String {
        self.url_template
            .replace("{version}", &version.name)
            .replace("{path}", path.trim_start_matches('/'))
    }
}

#[async_trait]
impl StaticFileCollector for UrlTemplateCollector {
    fn name(&self) -> &'static str {
        "url_template"
    }

    async fn collect_static_files(
        &self,
        definition: &SoftwareDefinition,
        version: &SoftwareVersion,
    ) -> Result<HashSet<StaticFile>> {
        let mut files = HashSet::new();

        for path in &self.files {
            let resource = Resource::new(self.url_for(version, path), self.fetcher.clone());
            let content = resource.content().await.map_err(|e| Error::Collector {
                package: definition.software_package.name.clone(),
                version: version.name.clone(),
                reason: e.to_string(),
            })?;

            files.insert(StaticFile::new(
                version.clone(),
                path.as_str(),
                resource.url(),
                &content,
            ));
        }

        Ok(files)
    }
}
