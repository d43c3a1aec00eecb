//! Package and version stores.
//!
//! The [`Backend`] trait is the only state shared between concurrently
//! indexed definitions. Implementations synchronise internally; callers
//! never lock around backend calls.
//!
//! | Backend | Persistence |
//! |---------|-------------|
//! | [`MemoryBackend`] | None, process lifetime only |
//! | [`FileBackend`] | JSON snapshot rewritten once per write call |

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use crate::error::Result;
use crate::model::{SoftwarePackage, SoftwareVersion, StoreObject};
use async_trait::async_trait;
use std::collections::HashSet;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Inserts or updates an object. Storing an existing object is a no-op
    /// apart from refreshing its content; it never clears an indexed mark.
    async fn store(&self, object: &StoreObject) -> Result<()>;

    /// Stores a batch of objects. Backends with a per-write cost override
    /// this to apply the whole batch at once.
    async fn store_all(&self, objects: &[StoreObject]) -> Result<()> {
        for object in objects {
            self.store(object).await?;
        }
        Ok(())
    }

    /// Returns the versions of `package` that are marked indexed.
    async fn retrieve_versions(&self, package: &SoftwarePackage) -> Result<HashSet<SoftwareVersion>>;

    /// Returns the packages whose name contains `name`, ignoring case.
    async fn retrieve_packages_by_name(&self, name: &str) -> Result<HashSet<SoftwarePackage>>;

    /// Marks a version as indexed. Marks are never removed.
    async fn mark_indexed(&self, version: &SoftwareVersion) -> Result<()>;

    /// Marks every version in `versions` as indexed.
    async fn mark_all_indexed(&self, versions: &[SoftwareVersion]) -> Result<()> {
        for version in versions {
            self.mark_indexed(version).await?;
        }
        Ok(())
    }
}
