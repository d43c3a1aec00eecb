use super::{SoftwarePackage, SoftwareVersion};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A static asset shipped with a specific release.
///
/// Two files are the same file when they belong to the same version and
/// live at the same relative path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticFile {
    pub version: SoftwareVersion,
    pub path: String,
    pub url: String,
    pub checksum: String,
}

impl StaticFile {
    pub fn new(
        version: SoftwareVersion,
        path: impl Into<String>,
        url: impl Into<String>,
        content: &[u8],
    ) -> Self {
        Self {
            version,
            path: path.into(),
            url: url.into(),
            checksum: hex::encode(Sha256::digest(content)),
        }
    }
}

impl PartialEq for StaticFile {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.path == other.path
    }
}

impl Eq for StaticFile {}

impl std::hash::Hash for StaticFile {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.version.hash(state);
        self.path.hash(state);
    }
}

/// Anything a backend can store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "object", rename_all = "snake_case")]
pub enum StoreObject {
    Package(SoftwarePackage),
    Version(SoftwareVersion),
    StaticFile(StaticFile),
}

impl From<SoftwarePackage> for StoreObject {
    fn from(package: SoftwarePackage) -> Self {
        StoreObject::Package(package)
    }
}

impl From<SoftwareVersion> for StoreObject {
    fn from(version: SoftwareVersion) -> Self {
        StoreObject::Version(version)
    }
}

impl From<StaticFile> for StoreObject {
    fn from(file: StaticFile) -> Self {
        StoreObject::StaticFile(file)
    }
}
