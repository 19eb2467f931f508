//! One watched entity: fetch → extract → diff → commit → notify.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{ChangeSet, Mapping, Scope};
use crate::services::{Extractor, NotifyReport, Services};
use crate::storage::{CommitMetadata, SnapshotStore};

use super::changes::build_change_set;
use super::diff::DiffCalculator;

/// What one successful cycle of a watcher did.
#[derive(Debug)]
pub struct CycleReport {
    pub scope: Scope,
    /// Mapping extracted from this cycle's fetch
    pub mapping: Mapping,
    pub changes: ChangeSet,
    /// Present only when the change set was non-empty
    pub commit: Option<CommitMetadata>,
    /// Present only when the change set was non-empty
    pub delivery: Option<NotifyReport>,
}

impl CycleReport {
    pub fn notify_failures(&self) -> usize {
        self.delivery.as_ref().map_or(0, |d| d.failures.len())
    }
}

/// Watches one source document through its own snapshot slot.
pub struct EntityWatcher {
    scope: Scope,
    source_url: String,
    extractor: Arc<dyn Extractor>,
    store: Arc<dyn SnapshotStore>,
    services: Services,
    calculator: DiffCalculator,
}

impl EntityWatcher {
    pub fn new(
        scope: Scope,
        source_url: impl Into<String>,
        extractor: Arc<dyn Extractor>,
        store: Arc<dyn SnapshotStore>,
        services: Services,
    ) -> Self {
        Self {
            scope,
            source_url: source_url.into(),
            extractor,
            store,
            services,
            calculator: DiffCalculator::new(),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Run one cycle.
    ///
    /// Fetch, extract and storage failures end the cycle with an error and
    /// leave the previous snapshot untouched. Delivery failures are only
    /// recorded in the report: the commit has already happened by then.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        log::debug!("[{}] Fetching {}", self.scope, self.source_url);
        let raw = self.services.fetcher.fetch(&self.source_url).await?;
        let current = self.extractor.extract(&raw)?;

        let previous = match self.store.load_previous().await? {
            Some(prev_raw) => self.extractor.extract(&prev_raw)?,
            None => {
                log::info!("[{}] No previous snapshot, treating as empty", self.scope);
                Mapping::new()
            }
        };

        let diff = self.calculator.calculate(&previous, &current);
        let changes = build_change_set(self.scope.clone(), &diff);

        self.store.save_current(&raw).await?;

        if changes.is_empty() {
            log::debug!(
                "[{}] No changes across {} entries",
                self.scope,
                current.len()
            );
            return Ok(CycleReport {
                scope: self.scope.clone(),
                mapping: current,
                changes,
                commit: None,
                delivery: None,
            });
        }

        log::info!(
            "[{}] Diff: {} added, {} removed, {} modified",
            self.scope,
            changes.added(),
            changes.removed(),
            changes.modified()
        );

        let commit = self.store.commit(now).await?;
        if let Some(key) = &commit.backup {
            log::info!("[{}] Previous snapshot backed up as {}", self.scope, key);
        }

        let delivery = self.deliver(&changes).await;

        Ok(CycleReport {
            scope: self.scope.clone(),
            mapping: current,
            changes,
            commit: Some(commit),
            delivery: Some(delivery),
        })
    }

    async fn deliver(&self, changes: &ChangeSet) -> NotifyReport {
        let destinations = &self.services.destinations;
        if destinations.is_empty() {
            for record in changes.iter() {
                log::info!("[{}] {:?}", self.scope, record);
            }
        }

        let report = self.services.notifier.notify(changes, destinations).await;
        for failure in &report.failures {
            log::warn!("[{}] {}", self.scope, failure);
        }
        report
    }
}
