use super::Backend;
use crate::error::{Error, Result};
use crate::model::{SoftwarePackage, SoftwareVersion, StaticFile, StoreObject};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Contents of a store, shared by the memory and file backends.
#[derive(Debug, Default)]
pub(crate) struct StoreState {
    packages: HashSet<SoftwarePackage>,
    versions: HashMap<SoftwareVersion, Option<DateTime<Utc>>>,
    static_files: HashSet<StaticFile>,
}

/// Serialized form of a [`StoreState`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    packages: Vec<SoftwarePackage>,
    versions: Vec<VersionRecord>,
    static_files: Vec<StaticFile>,
}

#[derive(Debug, Serialize, Deserialize)]
struct VersionRecord {
    #[serde(flatten)]
    version: SoftwareVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    indexed_at: Option<DateTime<Utc>>,
}

impl StoreState {
    pub(crate) fn store(&mut self, object: &StoreObject) {
        match object {
            StoreObject::Package(package) => {
                self.packages.insert(package.clone());
            }
            StoreObject::Version(version) => {
                self.packages.insert(version.package.clone());
                self.versions.entry(version.clone()).or_insert(None);
            }
            StoreObject::StaticFile(file) => {
                self.packages.insert(file.version.package.clone());
                self.versions.entry(file.version.clone()).or_insert(None);
                self.static_files.replace(file.clone());
            }
        }
    }

    pub(crate) fn indexed_versions(&self, package: &SoftwarePackage) -> HashSet<SoftwareVersion> {
        self.versions
            .iter()
            .filter(|(version, indexed_at)| &version.package == package && indexed_at.is_some())
            .map(|(version, _)| version.clone())
            .collect()
    }

    pub(crate) fn packages_by_name(&self, name: &str) -> HashSet<SoftwarePackage> {
        let needle = name.to_lowercase();
        self.packages
            .iter()
            .filter(|package| package.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub(crate) fn mark_indexed(&mut self, version: &SoftwareVersion) {
        self.packages.insert(version.package.clone());
        let indexed_at = self.versions.entry(version.clone()).or_insert(None);
        if indexed_at.is_none() {
            *indexed_at = Some(Utc::now());
        }
    }

    pub(crate) fn static_files(&self) -> &HashSet<StaticFile> {
        &self.static_files
    }

    pub(crate) fn to_snapshot(&self) -> Snapshot {
        let mut packages: Vec<_> = self.packages.iter().cloned().collect();
        packages.sort();

        let mut versions: Vec<_> = self
            .versions
            .iter()
            .map(|(version, indexed_at)| VersionRecord {
                version: version.clone(),
                indexed_at: *indexed_at,
            })
            .collect();
        versions.sort_by(|a, b| a.version.cmp(&b.version));

        let mut static_files: Vec<_> = self.static_files.iter().cloned().collect();
        static_files.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.path.cmp(&b.path)));

        Snapshot {
            packages,
            versions,
            static_files,
        }
    }

    pub(crate) fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            packages: snapshot.packages.into_iter().collect(),
            versions: snapshot
                .versions
                .into_iter()
                .map(|record| (record.version, record.indexed_at))
                .collect(),
            static_files: snapshot.static_files.into_iter().collect(),
        }
    }
}

/// Backend holding everything in process memory.
///
/// # Example
///
/// ```
/// use webprint::backend::{Backend, MemoryBackend};
/// use webprint::{SoftwarePackage, SoftwareVersion, StoreObject};
///
/// #[tokio::main]
/// async fn main() -> webprint::Result<()> {
///     let backend = MemoryBackend::new();
///     let version = SoftwareVersion::new(SoftwarePackage::new("WordPress"), "5.4");
///
///     backend.store(&StoreObject::from(version.clone())).await?;
///     backend.mark_indexed(&version).await?;
///
///     let indexed = backend.retrieve_versions(&version.package).await?;
///     assert!(indexed.contains(&version));
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<StoreState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of static files stored so far.
    pub fn static_file_count(&self) -> Result<usize> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.static_files().len())
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Backend("store lock poisoned".to_string())
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn store(&self, object: &StoreObject) -> Result<()> {
        self.state.write().map_err(poisoned)?.store(object);
        Ok(())
    }

    async fn store_all(&self, objects: &[StoreObject]) -> Result<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        for object in objects {
            state.store(object);
        }
        Ok(())
    }

    async fn retrieve_versions(&self, package: &SoftwarePackage) -> Result<HashSet<SoftwareVersion>> {
        Ok(self.state.read().map_err(poisoned)?.indexed_versions(package))
    }

    async fn retrieve_packages_by_name(&self, name: &str) -> Result<HashSet<SoftwarePackage>> {
        Ok(self.state.read().map_err(poisoned)?.packages_by_name(name))
    }

    async fn mark_indexed(&self, version: &SoftwareVersion) -> Result<()> {
        self.state.write().map_err(poisoned)?.mark_indexed(version);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(label: &str) -> SoftwareVersion {
        SoftwareVersion::new(SoftwarePackage::new("WordPress"), label)
    }

    #[tokio::test]
    async fn test_stored_versions_are_not_indexed() {
        let backend = MemoryBackend::new();
        backend.store(&wp("5.4").into()).await.unwrap();

        let indexed = backend
            .retrieve_versions(&SoftwarePackage::new("WordPress"))
            .await
            .unwrap();
        assert!(indexed.is_empty());
    }

    #[tokio::test]
    async fn test_mark_indexed_is_monotonic() {
        let backend = MemoryBackend::new();
        let package = SoftwarePackage::new("WordPress");

        backend.mark_indexed(&wp("5.4")).await.unwrap();
        // Re-storing must not clear the mark
        backend.store(&wp("5.4").into()).await.unwrap();
        backend.store(&package.clone().into()).await.unwrap();

        let indexed = backend.retrieve_versions(&package).await.unwrap();
        assert_eq!(indexed, HashSet::from([wp("5.4")]));
    }

    #[tokio::test]
    async fn test_retrieve_versions_filters_by_package() {
        let backend = MemoryBackend::new();
        let drupal = SoftwareVersion::new(SoftwarePackage::new("Drupal"), "9.0");
        backend.mark_indexed(&wp("5.4")).await.unwrap();
        backend.mark_indexed(&drupal).await.unwrap();

        let indexed = backend
            .retrieve_versions(&SoftwarePackage::new("Drupal"))
            .await
            .unwrap();
        assert_eq!(indexed, HashSet::from([drupal]));
    }

    #[tokio::test]
    async fn test_packages_by_name_case_insensitive_substring() {
        let backend = MemoryBackend::new();
        for name in ["WordPress", "WordPress MU", "Drupal"] {
            backend
                .store(&SoftwarePackage::new(name).into())
                .await
                .unwrap();
        }

        let matches = backend.retrieve_packages_by_name("wordpress").await.unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches.contains(&SoftwarePackage::new("WordPress MU")));

        let matches = backend.retrieve_packages_by_name("Joomla").await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_static_file_implies_version_and_package() {
        let backend = MemoryBackend::new();
        let file = StaticFile::new(wp("5.4"), "readme.html", "https://a.test/readme.html", b"x");
        backend.store(&file.into()).await.unwrap();

        assert_eq!(backend.static_file_count().unwrap(), 1);
        let packages = backend.retrieve_packages_by_name("WordPress").await.unwrap();
        assert_eq!(packages.len(), 1);
    }

    #[test]
    fn test_snapshot_roundtrip_keeps_marks() {
        let mut state = StoreState::default();
        state.store(&wp("5.3").into());
        state.mark_indexed(&wp("5.4"));

        let json = serde_json::to_string(&state.to_snapshot()).unwrap();
        let restored = StoreState::from_snapshot(serde_json::from_str(&json).unwrap());

        let indexed = restored.indexed_versions(&SoftwarePackage::new("WordPress"));
        assert_eq!(indexed, HashSet::from([wp("5.4")]));
        assert_eq!(restored.to_snapshot().versions.len(), 2);
    }
}
