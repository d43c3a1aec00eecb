use super::{
    GitHubTagsProvider, NoopCollector, SoftwareDefinition, StaticFileCollector, StaticProvider,
    UrlTemplateCollector, VersionProvider,
};
use crate::config::{CollectorConfig, DefinitionConfig, ProviderConfig};
use crate::error::Result;
use crate::model::SoftwarePackage;
use crate::resource::Fetcher;
use std::sync::Arc;

/// Builds the tracked definitions described by the configuration.
///
/// All network-backed capabilities share `client` and `fetcher`.
pub fn build_definitions(
    configs: &[DefinitionConfig],
    client: &reqwest::Client,
    fetcher: Arc<dyn Fetcher>,
) -> Result<Vec<SoftwareDefinition>> {
    configs
        .iter()
        .map(|config| build_definition(config, client, fetcher.clone()))
        .collect()
}

fn build_definition(
    config: &DefinitionConfig,
    client: &reqwest::Client,
    fetcher: Arc<dyn Fetcher>,
) -> Result<SoftwareDefinition> {
    let provider: Arc<dyn VersionProvider> = match &config.provider {
        ProviderConfig::Static { versions } => Arc::new(StaticProvider::new(versions.iter().cloned())),
        ProviderConfig::GithubTags {
            repository,
            tag_prefix,
        } => Arc::new(
            GitHubTagsProvider::new(client.clone(), repository.as_str())
                .with_tag_prefix(tag_prefix.clone()),
        ),
    };

    let collector: Arc<dyn StaticFileCollector> = match &config.collector {
        CollectorConfig::None => Arc::new(NoopCollector),
        CollectorConfig::UrlTemplate { url, files } => {
            Arc::new(UrlTemplateCollector::new(url.as_str(), files.clone(), fetcher)?)
        }
    };

    Ok(SoftwareDefinition::new(
        SoftwarePackage::new(config.name.as_str()),
        provider,
        collector,
    ))
}
