//! Full watch cycle: release listing → reconcile → per-release JEP lists.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;

use crate::error::{AppError, Result};
use crate::models::{Config, Scope};
use crate::services::{
    DiscordNotifier, Extractor, HttpFetcher, ItemExtractor, ListingExtractor, Services,
};
use crate::storage::LocalStorage;
use crate::utils::http::create_async_client;
use crate::utils::{as_directory, resolve};

use super::registry::{WatcherFactory, WatcherRegistry};
use super::watcher::EntityWatcher;

/// Builds release watchers: page at `listing_url` + id, slot under
/// `projects/`.
pub struct ProjectWatcherFactory {
    listing_url: String,
    extractor: Arc<dyn Extractor>,
    storage: LocalStorage,
    services: Services,
}

impl ProjectWatcherFactory {
    pub fn new(
        listing_url: impl Into<String>,
        extractor: Arc<dyn Extractor>,
        storage: LocalStorage,
        services: Services,
    ) -> Self {
        let listing_url: String = listing_url.into();
        Self {
            listing_url: as_directory(&listing_url),
            extractor,
            storage,
            services,
        }
    }
}

impl WatcherFactory for ProjectWatcherFactory {
    fn create(&self, id: &str) -> EntityWatcher {
        EntityWatcher::new(
            Scope::Project(id.to_string()),
            resolve(&self.listing_url, id),
            Arc::clone(&self.extractor),
            Arc::new(self.storage.project_slot(id)),
            self.services.clone(),
        )
    }
}

/// Tallies for one full cycle.
#[derive(Debug, Default)]
pub struct CycleSummary {
    /// Listing changes, `None` when the listing cycle failed
    pub listing_changes: Option<usize>,
    pub listing_error: Option<AppError>,
    pub created: Vec<String>,
    pub pruned: Vec<String>,
    pub projects_checked: usize,
    pub projects_failed: usize,
    pub project_changes: usize,
    pub notify_failures: usize,
}

impl CycleSummary {
    pub fn listing_ok(&self) -> bool {
        self.listing_error.is_none()
    }

    pub fn total_changes(&self) -> usize {
        self.listing_changes.unwrap_or(0) + self.project_changes
    }
}

/// Owns the listing watcher and the registry of release watchers.
pub struct Monitor {
    listing: EntityWatcher,
    registry: WatcherRegistry,
}

impl Monitor {
    pub fn new(listing: EntityWatcher, registry: WatcherRegistry) -> Self {
        Self { listing, registry }
    }

    /// Wire the HTTP, extraction, notification and storage collaborators
    /// described by `config`, with slots under `cache_dir`.
    pub fn from_config(config: &Config, cache_dir: &Path) -> Result<Self> {
        let client = create_async_client(&config.watcher)?;
        let services = Services::new(
            Arc::new(HttpFetcher::new(client.clone())),
            Arc::new(DiscordNotifier::new(
                client,
                config.notify.clone(),
                &config.source,
            )),
            config.notify.webhooks.clone(),
        );
        let storage = LocalStorage::new(cache_dir);

        let listing = EntityWatcher::new(
            Scope::Listing,
            config.source.listing_url.clone(),
            Arc::new(ListingExtractor::new(&config.extract.listing_selector)?),
            Arc::new(storage.listing_slot()),
            services.clone(),
        );

        let factory = ProjectWatcherFactory::new(
            config.source.listing_url.clone(),
            Arc::new(ItemExtractor::new(config.extract.item_selectors.as_slice())?),
            storage,
            services,
        );

        Ok(Self::new(
            listing,
            WatcherRegistry::new(factory, config.watcher.max_concurrent),
        ))
    }

    pub fn registry(&self) -> &WatcherRegistry {
        &self.registry
    }

    pub async fn run_cycle(&mut self) -> CycleSummary {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one complete cycle keyed by `now`.
    ///
    /// Errors are contained per watcher. When the listing itself fails the
    /// current release watchers are kept and still refreshed.
    pub async fn run_cycle_at(&mut self, now: DateTime<Utc>) -> CycleSummary {
        let mut summary = CycleSummary::default();

        match self.listing.run_cycle(now).await {
            Ok(report) => {
                summary.listing_changes = Some(report.changes.len());
                summary.notify_failures += report.notify_failures();

                let reconciliation = self.registry.reconcile(report.mapping.ids());
                summary.created = reconciliation.created;
                summary.pruned = reconciliation.pruned;
            }
            Err(e) => {
                log::error!(
                    "[{}] {} failure, keeping {} release watchers: {}",
                    self.listing.scope(),
                    e.kind(),
                    self.registry.len(),
                    e
                );
                summary.listing_error = Some(e);
            }
        }

        for (id, result) in self.registry.run_all(now).await {
            summary.projects_checked += 1;
            match result {
                Ok(report) => {
                    summary.project_changes += report.changes.len();
                    summary.notify_failures += report.notify_failures();
                }
                Err(e) => {
                    summary.projects_failed += 1;
                    if matches!(e, AppError::Storage { .. }) {
                        log::error!(
                            "[project {}] Snapshot not advanced, changes will be reported again: {}",
                            id,
                            e
                        );
                    } else if e.is_transient() {
                        log::warn!("[project {}] {} failure, retrying next cycle: {}", id, e.kind(), e);
                    } else {
                        log::error!("[project {}] {} failure: {}", id, e.kind(), e);
                    }
                }
            }
        }

        log::info!(
            "Cycle done: {} changes, {}/{} releases ok, {} notify failures",
            summary.total_changes(),
            summary.projects_checked - summary.projects_failed,
            summary.projects_checked,
            summary.notify_failures
        );
        summary
    }

    /// Run cycles every `interval` until `shutdown` resolves.
    ///
    /// A cycle always runs to completion; shutdown is only observed
    /// between cycles. Cycles never overlap: a cycle that overruns the
    /// interval delays the next tick.
    pub async fn run(&mut self, interval: Duration, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => {
                    log::info!("Shutdown requested, stopping watcher");
                    break;
                }
            }
            log::info!("Running update...");
            self.run_cycle().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeFetcher, LineExtractor, RecordingNotifier, page, services};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const LISTING: &str = "https://openjdk.test/projects/jdk/";

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, secs).unwrap()
    }

    fn url(id: &str) -> String {
        format!("{LISTING}{id}")
    }

    struct Harness {
        tmp: TempDir,
        fetcher: Arc<FakeFetcher>,
        notifier: Arc<RecordingNotifier>,
        monitor: Monitor,
    }

    fn harness() -> Harness {
        let tmp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new();
        let notifier = RecordingNotifier::new();
        let services = services(fetcher.clone(), notifier.clone());
        let storage = LocalStorage::new(tmp.path());

        let listing = EntityWatcher::new(
            Scope::Listing,
            LISTING,
            Arc::new(LineExtractor),
            Arc::new(storage.listing_slot()),
            services.clone(),
        );
        let factory =
            ProjectWatcherFactory::new(LISTING, Arc::new(LineExtractor), storage, services);

        Harness {
            tmp,
            fetcher,
            notifier,
            monitor: Monitor::new(listing, WatcherRegistry::new(factory, 4)),
        }
    }

    #[tokio::test]
    async fn test_first_cycle_reports_everything() {
        let mut h = harness();
        h.fetcher.set(LISTING, page(&[("21", "GA"), ("22", "Dev")]));
        h.fetcher.set(&url("21"), page(&[("444", "Virtual Threads")]));
        h.fetcher.set(&url("22"), page(&[("454", "FFM API"), ("456", "Unnamed")]));

        let summary = h.monitor.run_cycle_at(at(0)).await;

        assert_eq!(summary.listing_changes, Some(2));
        assert_eq!(summary.created, vec!["21", "22"]);
        assert_eq!(summary.projects_checked, 2);
        assert_eq!(summary.project_changes, 3);

        // Releases run concurrently, so only the listing's position is fixed.
        let scopes: Vec<_> = h.notifier.sent().into_iter().map(|c| c.scope).collect();
        assert_eq!(scopes.len(), 3);
        assert_eq!(scopes[0], Scope::Listing);
        assert!(scopes.contains(&Scope::Project("21".into())));
        assert!(scopes.contains(&Scope::Project("22".into())));
        assert!(h.tmp.path().join("projects/22/prev.html").exists());
    }

    #[tokio::test]
    async fn test_identical_cycles_are_silent() {
        let mut h = harness();
        h.fetcher.set(LISTING, page(&[("21", "GA")]));
        h.fetcher.set(&url("21"), page(&[("444", "Virtual Threads")]));
        h.monitor.run_cycle_at(at(0)).await;
        let sent_after_first = h.notifier.sent().len();

        for secs in 1..3 {
            let summary = h.monitor.run_cycle_at(at(secs)).await;
            assert_eq!(summary.total_changes(), 0);
        }

        assert_eq!(h.notifier.sent().len(), sent_after_first);
        assert!(!h.tmp.path().join("listing/backups").exists());
        assert!(!h.tmp.path().join("projects/21/backups").exists());
    }

    #[tokio::test]
    async fn test_removed_release_is_pruned_before_children_run() {
        let mut h = harness();
        h.fetcher.set(LISTING, page(&[("21", "GA"), ("22", "Dev")]));
        h.fetcher.set(&url("21"), page(&[("444", "Virtual Threads")]));
        h.fetcher.set(&url("22"), page(&[("454", "FFM API")]));
        h.monitor.run_cycle_at(at(0)).await;
        h.fetcher.clear_calls();

        h.fetcher.set(LISTING, page(&[("22", "Dev")]));
        let summary = h.monitor.run_cycle_at(at(1)).await;

        assert_eq!(summary.pruned, vec!["21"]);
        assert_eq!(h.monitor.registry().ids().collect::<Vec<_>>(), vec!["22"]);
        assert!(!h.fetcher.calls().contains(&url("21")));
        assert_eq!(h.fetcher.calls(), vec![LISTING.to_string(), url("22")]);
    }

    #[tokio::test]
    async fn test_failing_release_does_not_stop_siblings() {
        let mut h = harness();
        h.fetcher.set(LISTING, page(&[("21", "GA"), ("22", "Dev")]));
        h.fetcher.fail(&url("21"));
        h.fetcher.set(&url("22"), page(&[("454", "FFM API")]));

        let summary = h.monitor.run_cycle_at(at(0)).await;

        assert!(summary.listing_ok());
        assert_eq!(summary.projects_failed, 1);
        assert_eq!(summary.project_changes, 1);
        assert_eq!(h.monitor.registry().len(), 2);
    }

    #[tokio::test]
    async fn test_listing_failure_keeps_existing_watchers() {
        let mut h = harness();
        h.fetcher.set(LISTING, page(&[("21", "GA")]));
        h.fetcher.set(&url("21"), page(&[("444", "Virtual Threads")]));
        h.monitor.run_cycle_at(at(0)).await;

        h.fetcher.fail(LISTING);
        h.fetcher.set(&url("21"), page(&[("444", "Virtual Threads"), ("445", "Unnamed Classes")]));
        let summary = h.monitor.run_cycle_at(at(1)).await;

        assert!(!summary.listing_ok());
        assert_eq!(summary.listing_changes, None);
        assert!(summary.pruned.is_empty());
        assert_eq!(summary.projects_checked, 1);
        assert_eq!(summary.project_changes, 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_between_cycles() {
        let mut h = harness();
        h.fetcher.set(LISTING, page(&[("21", "GA")]));
        h.fetcher.set(&url("21"), page(&[("444", "Virtual Threads")]));

        h.monitor
            .run(
                Duration::from_secs(3600),
                tokio::time::sleep(Duration::from_millis(50)),
            )
            .await;

        let listing_calls = h.fetcher.calls().iter().filter(|u| *u == LISTING).count();
        assert_eq!(listing_calls, 1);
    }

    #[test]
    fn test_release_url_appends_to_listing_without_slash() {
        let tmp = TempDir::new().unwrap();
        let factory = ProjectWatcherFactory::new(
            "https://openjdk.test/projects/jdk",
            Arc::new(LineExtractor),
            LocalStorage::new(tmp.path()),
            services(FakeFetcher::new(), RecordingNotifier::new()),
        );

        let watcher = factory.create("21");
        assert_eq!(watcher.source_url(), "https://openjdk.test/projects/jdk/21");
    }

    #[test]
    fn test_from_config_wires_default_config() {
        let tmp = TempDir::new().unwrap();
        let monitor = Monitor::from_config(&Config::default(), tmp.path()).unwrap();
        assert!(monitor.registry().is_empty());
    }
}
