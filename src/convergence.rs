//! The convergence loop driving incremental indexing.
//!
//! A pass dispatches one [`index_definition`] unit per tracked definition
//! onto a bounded worker pool, waits for all of them, then persists their
//! results. Passes repeat until one stores nothing.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use webprint::backend::MemoryBackend;
//! use webprint::convergence::{ConvergenceLoop, IndexSettings};
//! use webprint::definition::{NoopCollector, SoftwareDefinition, StaticProvider};
//! use webprint::SoftwarePackage;
//!
//! #[tokio::main]
//! async fn main() -> webprint::Result<()> {
//!     let definition = SoftwareDefinition::new(
//!         SoftwarePackage::new("Example"),
//!         Arc::new(StaticProvider::new(["1.0", "1.1"])),
//!         Arc::new(NoopCollector),
//!     );
//!     let settings = IndexSettings {
//!         index_marking: webprint::IndexMarking::All,
//!         ..IndexSettings::default()
//!     };
//!
//!     let driver = ConvergenceLoop::new(Arc::new(MemoryBackend::new()), vec![definition], settings);
//!     let report = driver.run().await?;
//!     assert_eq!(report.passes, 2);
//!     Ok(())
//! }
//! ```

use crate::backend::Backend;
use crate::config::{Config, IndexMarking};
use crate::definition::SoftwareDefinition;
use crate::error::{Error, Result};
use crate::indexer::{index_definition, IndexOutcome};
use crate::model::{SoftwareVersion, StoreObject};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Knobs of the convergence loop.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    /// Definitions indexed in parallel.
    pub max_workers: usize,
    /// Versions processed per definition per pass.
    pub step_limit: usize,
    pub index_marking: IndexMarking,
    /// Zero means unlimited.
    pub max_passes: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for IndexSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_workers: config.max_workers,
            step_limit: config.step_limit,
            index_marking: config.index_marking,
            max_passes: config.max_passes,
        }
    }
}

/// What a single pass did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassSummary {
    pub pass: usize,
    pub changed: bool,
    pub objects_stored: usize,
    pub versions_processed: usize,
    pub versions_marked: usize,
}

/// What a full run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConvergenceReport {
    pub passes: usize,
    pub objects_stored: usize,
    pub versions_marked: usize,
    pub history: Vec<PassSummary>,
}

impl ConvergenceReport {
    fn record(&mut self, summary: PassSummary) {
        self.passes = summary.pass;
        self.objects_stored += summary.objects_stored;
        self.versions_marked += summary.versions_marked;
        self.history.push(summary);
    }
}

pub struct ConvergenceLoop {
    backend: Arc<dyn Backend>,
    definitions: Vec<SoftwareDefinition>,
    settings: IndexSettings,
}

impl ConvergenceLoop {
    pub fn new(
        backend: Arc<dyn Backend>,
        definitions: Vec<SoftwareDefinition>,
        settings: IndexSettings,
    ) -> Self {
        Self {
            backend,
            definitions,
            settings,
        }
    }

    /// Runs passes until one of them changes nothing.
    ///
    /// # Errors
    ///
    /// The first failing pass ends the run with its error. Objects stored
    /// by earlier passes stay in the backend.
    pub async fn run(&self) -> Result<ConvergenceReport> {
        let mut report = ConvergenceReport::default();

        loop {
            let pass = report.passes + 1;
            if self.settings.max_passes > 0 && pass > self.settings.max_passes {
                return Err(Error::PassLimit(self.settings.max_passes));
            }

            let summary = self.run_pass(pass).await?;
            let changed = summary.changed;
            report.record(summary);

            if !changed {
                tracing::info!(passes = report.passes, "index is up to date");
                return Ok(report);
            }
        }
    }

    /// Runs one pass over every definition.
    pub async fn run_pass(&self, pass: usize) -> Result<PassSummary> {
        tracing::info!(pass, definitions = self.definitions.len(), "starting pass");

        let outcomes = self.dispatch().await?;

        let mut summary = PassSummary {
            pass,
            ..PassSummary::default()
        };

        for outcome in outcomes {
            summary.versions_processed += outcome.processed.len();

            if !outcome.objects.is_empty() {
                summary.changed = true;
                summary.objects_stored += self.persist(&outcome).await?;
            }

            summary.versions_marked += self.mark(&outcome).await?;
        }

        tracing::info!(
            pass,
            changed = summary.changed,
            stored = summary.objects_stored,
            "finished pass"
        );

        Ok(summary)
    }

    /// Dispatches one unit per definition and waits for all of them.
    ///
    /// Outcomes are returned in definition order.
    async fn dispatch(&self) -> Result<Vec<IndexOutcome>> {
        let workers = Arc::new(Semaphore::new(self.settings.max_workers.max(1)));
        let mut tasks = JoinSet::new();

        for (slot, definition) in self.definitions.iter().enumerate() {
            // Ensure that the software package is in the backend
            let package = StoreObject::from(definition.software_package.clone());
            self.backend.store(&package).await?;
            let indexed = self
                .backend
                .retrieve_versions(&definition.software_package)
                .await?;

            let definition = definition.clone();
            let workers = workers.clone();
            let step_limit = self.settings.step_limit;

            tasks.spawn(async move {
                let _permit = workers
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::Worker(e.to_string()))?;
                let outcome = index_definition(&definition, &indexed, step_limit).await?;
                Ok::<_, Error>((slot, outcome))
            });
        }

        let mut outcomes = Vec::with_capacity(self.definitions.len());
        // Returning early drops the set, which aborts the remaining tasks
        while let Some(joined) = tasks.join_next().await {
            let (slot, outcome) = joined.map_err(|e| Error::Worker(e.to_string()))??;
            outcomes.push((slot, outcome));
        }

        outcomes.sort_by_key(|(slot, _)| *slot);
        Ok(outcomes.into_iter().map(|(_, outcome)| outcome).collect())
    }

    async fn persist(&self, outcome: &IndexOutcome) -> Result<usize> {
        tracing::info!("storing {} elements to backend", outcome.objects.len());
        let objects: Vec<StoreObject> = outcome.objects.iter().cloned().collect();
        self.backend.store_all(&objects).await?;
        Ok(outcome.objects.len())
    }

    async fn mark(&self, outcome: &IndexOutcome) -> Result<usize> {
        let versions: Vec<SoftwareVersion> = match self.settings.index_marking {
            IndexMarking::Last => outcome.last_processed().into_iter().cloned().collect(),
            IndexMarking::All => outcome.processed.clone(),
        };

        self.backend.mark_all_indexed(&versions).await?;
        Ok(versions.len())
    }
}
