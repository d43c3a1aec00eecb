//! Per-definition incremental indexing.
//!
//! One call to [`index_definition`] is one unit of work in a pass: it asks
//! the provider for upstream versions, subtracts what the backend already
//! considers indexed, and collects static files for at most `step_limit`
//! of the remaining versions. Nothing is written to the backend here.

use crate::definition::SoftwareDefinition;
use crate::error::Result;
use crate::model::{SoftwareVersion, StoreObject};
use std::collections::HashSet;

/// Result of indexing one definition for one pass.
#[derive(Debug, Default)]
pub struct IndexOutcome {
    /// Versions and static files to persist.
    pub objects: HashSet<StoreObject>,
    /// Versions processed, in processing order.
    pub processed: Vec<SoftwareVersion>,
    /// Backlog size before processing.
    pub backlog: usize,
}

impl IndexOutcome {
    /// The version processed last, if any.
    pub fn last_processed(&self) -> Option<&SoftwareVersion> {
        self.processed.last()
    }
}

/// Versions available upstream that are not yet indexed, oldest first.
pub fn backlog(
    available: HashSet<SoftwareVersion>,
    indexed: &HashSet<SoftwareVersion>,
) -> Vec<SoftwareVersion> {
    let mut missing: Vec<_> = available
        .into_iter()
        .filter(|version| !indexed.contains(version))
        .collect();
    missing.sort();
    missing
}

/// Indexes up to `step_limit` unindexed versions of `definition`.
pub async fn index_definition(
    definition: &SoftwareDefinition,
    indexed: &HashSet<SoftwareVersion>,
    step_limit: usize,
) -> Result<IndexOutcome> {
    let package = &definition.software_package;
    tracing::info!(package = %package, "handling software package");

    let available = definition.get_versions().await?;
    let missing = backlog(available, indexed);
    tracing::info!(package = %package, "{} versions not yet indexed", missing.len());

    let mut outcome = IndexOutcome {
        backlog: missing.len(),
        ..IndexOutcome::default()
    };

    for version in missing.into_iter().take(step_limit) {
        let static_files = definition.collect_static_files(&version).await?;
        tracing::info!(
            package = %package,
            version = %version.name,
            "indexing {} static files",
            static_files.len()
        );

        outcome.objects.insert(StoreObject::from(version.clone()));
        outcome
            .objects
            .extend(static_files.into_iter().map(StoreObject::from));
        outcome.processed.push(version);
    }

    Ok(outcome)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::definition::{NoopCollector, StaticFileCollector, StaticProvider, VersionProvider};
    use crate::error::Error;
    use crate::model::{SoftwarePackage, StaticFile};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Collector yielding one `readme.html` per version and counting calls.
    #[derive(Default)]
    pub(crate) struct ReadmeCollector {
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl StaticFileCollector for ReadmeCollector {
        fn name(&self) -> &'static str {
            "readme"
        }

        async fn collect_static_files(
            &self,
            _definition: &SoftwareDefinition,
            version: &SoftwareVersion,
        ) -> Result<HashSet<StaticFile>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let url = format!("https://a.test/{}/readme.html", version.name);
            Ok(HashSet::from([StaticFile::new(
                version.clone(),
                "readme.html",
                url,
                version.name.as_bytes(),
            )]))
        }
    }

    /// Provider that always fails.
    pub(crate) struct FailingProvider;

    #[async_trait]
    impl VersionProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn get_versions(&self, package: &SoftwarePackage) -> Result<HashSet<SoftwareVersion>> {
            Err(Error::Provider {
                package: package.name.clone(),
                reason: "upstream unavailable".to_string(),
            })
        }
    }

    pub(crate) fn static_definition(
        name: &str,
        labels: &[&str],
        collector: Arc<dyn StaticFileCollector>,
    ) -> SoftwareDefinition {
        SoftwareDefinition::new(
            SoftwarePackage::new(name),
            Arc::new(StaticProvider::new(labels.iter().copied())),
            collector,
        )
    }

    fn version(label: &str) -> SoftwareVersion {
        SoftwareVersion::new(SoftwarePackage::new("Example"), label)
    }

    #[test]
    fn test_backlog_is_set_difference() {
        let available = HashSet::from([version("1.0"), version("1.1"), version("2.0")]);
        let indexed = HashSet::from([version("1.1"), version("0.9")]);

        assert_eq!(backlog(available, &indexed), vec![version("1.0"), version("2.0")]);
    }

    #[tokio::test]
    async fn test_step_limit_caps_processing() {
        let labels: Vec<String> = (0..25).map(|i| format!("1.{}", i)).collect();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        let collector = Arc::new(ReadmeCollector::default());
        let definition = static_definition("Example", &labels, collector.clone());

        for limit in [1, 7, 25, 100] {
            let outcome = index_definition(&definition, &HashSet::new(), limit)
                .await
                .unwrap();
            let expected = limit.min(25);
            assert_eq!(outcome.processed.len(), expected);
            assert_eq!(outcome.backlog, 25);
            // One version plus one readme each
            assert_eq!(outcome.objects.len(), expected * 2);
        }

        assert_eq!(collector.calls.load(Ordering::SeqCst), 1 + 7 + 25 + 25);
    }

    #[tokio::test]
    async fn test_processes_oldest_first() {
        let definition = static_definition("Example", &["2.0", "1.10", "1.9"], Arc::new(NoopCollector));

        let outcome = index_definition(&definition, &HashSet::new(), 2).await.unwrap();
        assert_eq!(outcome.processed, vec![version("1.9"), version("1.10")]);
        assert_eq!(outcome.last_processed(), Some(&version("1.10")));
    }

    #[tokio::test]
    async fn test_nothing_to_do() {
        let definition = static_definition("Example", &["1.0"], Arc::new(NoopCollector));
        let indexed = HashSet::from([version("1.0")]);

        let outcome = index_definition(&definition, &indexed, 10).await.unwrap();
        assert!(outcome.objects.is_empty());
        assert_eq!(outcome.last_processed(), None);
        assert_eq!(outcome.backlog, 0);
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let definition = SoftwareDefinition::new(
            SoftwarePackage::new("Example"),
            Arc::new(FailingProvider),
            Arc::new(NoopCollector),
        );

        let err = index_definition(&definition, &HashSet::new(), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
    }
}
