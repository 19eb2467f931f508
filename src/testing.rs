//! Fakes for collaborator traits, shared by the pipeline tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{ChangeSet, Mapping};
use crate::services::{Extractor, Fetcher, Notifier, NotifyReport, Services};
use crate::storage::{CommitMetadata, LocalSnapshotStore, SnapshotStore};

/// Serves canned pages by URL and records every request.
#[derive(Default)]
pub struct FakeFetcher {
    pages: Mutex<HashMap<String, Option<String>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, url: &str, body: impl Into<String>) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Some(body.into()));
    }

    pub fn fail(&self, url: &str) {
        self.pages.lock().unwrap().insert(url.to_string(), None);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.pages.lock().unwrap().get(url) {
            Some(Some(body)) => Ok(body.clone()),
            Some(None) => Err(AppError::fetch(url, "HTTP 503 Service Unavailable")),
            None => Err(AppError::fetch(url, "HTTP 404 Not Found")),
        }
    }
}

/// Parses `id=description` lines; a line starting with `!` is malformed.
pub struct LineExtractor;

impl Extractor for LineExtractor {
    fn extract(&self, raw: &str) -> Result<Mapping> {
        let mut mapping = Mapping::new();
        for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if line.starts_with('!') {
                return Err(AppError::extract("line document", format!("malformed line '{line}'")));
            }
            let (id, desc) = line.split_once('=').unwrap_or((line, ""));
            mapping.insert(id, desc);
        }
        Ok(mapping)
    }
}

/// Render pairs in the `LineExtractor` format.
pub fn page(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(id, desc)| format!("{id}={desc}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Records every change set it is handed; optionally fails every destination.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<ChangeSet>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn sent(&self) -> Vec<ChangeSet> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, changes: &ChangeSet, destinations: &[String]) -> NotifyReport {
        self.sent.lock().unwrap().push(changes.clone());
        let mut report = NotifyReport::default();
        for destination in destinations {
            if self.fail {
                report
                    .failures
                    .push(AppError::notify(destination.clone(), "HTTP 500"));
            } else {
                report.delivered += 1;
            }
        }
        report
    }
}

/// Local slot whose commits always fail.
pub struct FailingCommitStore(pub LocalSnapshotStore);

#[async_trait]
impl SnapshotStore for FailingCommitStore {
    async fn load_previous(&self) -> Result<Option<String>> {
        self.0.load_previous().await
    }

    async fn load_current(&self) -> Result<Option<String>> {
        self.0.load_current().await
    }

    async fn save_current(&self, raw: &str) -> Result<()> {
        self.0.save_current(raw).await
    }

    async fn commit(&self, _timestamp: DateTime<Utc>) -> Result<CommitMetadata> {
        Err(AppError::storage(self.0.location(), "disk full"))
    }

    async fn list_backups(&self) -> Result<Vec<String>> {
        self.0.list_backups().await
    }

    fn location(&self) -> String {
        self.0.location()
    }
}

pub fn services(fetcher: Arc<FakeFetcher>, notifier: Arc<RecordingNotifier>) -> Services {
    Services::new(fetcher, notifier, vec!["https://discord.test/api/webhooks/1/t".to_string()])
}
