use super::memory::{Snapshot, StoreState};
use super::Backend;
use crate::error::Result;
use crate::model::{SoftwarePackage, SoftwareVersion, StoreObject};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Backend persisted as a single JSON file.
///
/// The whole store is loaded on open and rewritten once per write call,
/// so batches should go through [`Backend::store_all`] and
/// [`Backend::mark_all_indexed`]. A missing file is an empty store.
pub struct FileBackend {
    path: PathBuf,
    state: Mutex<StoreState>,
    #[cfg(test)]
    flushes: std::sync::atomic::AtomicUsize,
}

impl FileBackend {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let state = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let snapshot: Snapshot = serde_json::from_str(&content)?;
                StoreState::from_snapshot(snapshot)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), "opened file backend");

        Ok(Self {
            path,
            state: Mutex::new(state),
            #[cfg(test)]
            flushes: std::sync::atomic::AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the state to a temporary sibling and renames it over the store.
    async fn flush(&self, state: &StoreState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(&state.to_snapshot())?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        #[cfg(test)]
        self.flushes
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    #[cfg(test)]
    fn flush_count(&self) -> usize {
        self.flushes.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for FileBackend {
    async fn store(&self, object: &StoreObject) -> Result<()> {
        let mut state = self.state.lock().await;
        state.store(object);
        self.flush(&state).await
    }

    async fn store_all(&self, objects: &[StoreObject]) -> Result<()> {
        if objects.is_empty() {
            return Ok(());
        }

        let mut state = self.state.lock().await;
        for object in objects {
            state.store(object);
        }
        self.flush(&state).await
    }

    async fn retrieve_versions(&self, package: &SoftwarePackage) -> Result<HashSet<SoftwareVersion>> {
        Ok(self.state.lock().await.indexed_versions(package))
    }

    async fn retrieve_packages_by_name(&self, name: &str) -> Result<HashSet<SoftwarePackage>> {
        Ok(self.state.lock().await.packages_by_name(name))
    }

    async fn mark_indexed(&self, version: &SoftwareVersion) -> Result<()> {
        let mut state = self.state.lock().await;
        state.mark_indexed(version);
        self.flush(&state).await
    }

    async fn mark_all_indexed(&self, versions: &[SoftwareVersion]) -> Result<()> {
        if versions.is_empty() {
            return Ok(());
        }

        let mut state = self.state.lock().await;
        for version in versions {
            state.mark_indexed(version);
        }
        self.flush(&state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StaticFile;
    use tempfile::TempDir;

    fn wp(label: &str) -> SoftwareVersion {
        SoftwareVersion::new(SoftwarePackage::new("WordPress"), label)
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::open(dir.path().join("store.json")).await.unwrap();

        let packages = backend.retrieve_packages_by_name("").await.unwrap();
        assert!(packages.is_empty());
        assert!(!backend.path().exists());
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");

        {
            let backend = FileBackend::open(&path).await.unwrap();
            backend.store(&wp("5.3").into()).await.unwrap();
            let file = StaticFile::new(wp("5.4"), "readme.html", "https://a.test/readme.html", b"x");
            backend.store(&file.into()).await.unwrap();
            backend.mark_indexed(&wp("5.4")).await.unwrap();
        }

        let backend = FileBackend::open(&path).await.unwrap();
        let indexed = backend
            .retrieve_versions(&SoftwarePackage::new("WordPress"))
            .await
            .unwrap();
        assert_eq!(indexed, HashSet::from([wp("5.4")]));

        let packages = backend.retrieve_packages_by_name("press").await.unwrap();
        assert_eq!(packages, HashSet::from([SoftwarePackage::new("WordPress")]));
    }

    #[tokio::test]
    async fn test_batch_is_written_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let backend = FileBackend::open(&path).await.unwrap();

        let objects: Vec<StoreObject> = (0..500)
            .map(|i| {
                let url = format!("https://a.test/5.4/file{}.js", i);
                StaticFile::new(wp("5.4"), format!("file{}.js", i), url, b"x").into()
            })
            .collect();
        backend.store_all(&objects).await.unwrap();
        assert_eq!(backend.flush_count(), 1);

        let versions = vec![wp("5.3"), wp("5.4")];
        backend.mark_all_indexed(&versions).await.unwrap();
        assert_eq!(backend.flush_count(), 2);

        // Empty batches leave the file alone
        backend.store_all(&[]).await.unwrap();
        backend.mark_all_indexed(&[]).await.unwrap();
        assert_eq!(backend.flush_count(), 2);

        let reopened = FileBackend::open(&path).await.unwrap();
        let indexed = reopened
            .retrieve_versions(&SoftwarePackage::new("WordPress"))
            .await
            .unwrap();
        assert_eq!(indexed, versions.into_iter().collect());
        assert_eq!(reopened.state.lock().await.static_files().len(), 500);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(FileBackend::open(&path).await.is_err());
    }
}
