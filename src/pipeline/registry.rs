//! Child watchers keyed by top-level id.
//!
//! The child set is rebuilt from the latest top-level ids on every
//! reconciliation: surviving ids keep their watcher (and with it their
//! snapshot slot), new ids get a fresh watcher, and everything else is
//! dropped before children run.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use indexmap::IndexMap;

use crate::error::Result;

use super::watcher::{CycleReport, EntityWatcher};

/// Builds the child watcher for a newly observed top-level id.
pub trait WatcherFactory: Send + Sync {
    fn create(&self, id: &str) -> EntityWatcher;
}

/// What a reconciliation changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub created: Vec<String>,
    pub pruned: Vec<String>,
}

impl Reconciliation {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.pruned.is_empty()
    }
}

pub struct WatcherRegistry {
    children: IndexMap<String, EntityWatcher>,
    factory: Box<dyn WatcherFactory>,
    max_concurrent: usize,
}

impl WatcherRegistry {
    pub fn new(factory: impl WatcherFactory + 'static, max_concurrent: usize) -> Self {
        Self {
            children: IndexMap::new(),
            factory: Box::new(factory),
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Make the child set equal to `ids`, in `ids` order.
    pub fn reconcile<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> Reconciliation {
        let mut previous = std::mem::take(&mut self.children);
        let mut next = IndexMap::with_capacity(previous.len());
        let mut created = Vec::new();

        for id in ids {
            if next.contains_key(id) {
                continue;
            }
            let watcher = match previous.shift_remove(id) {
                Some(existing) => existing,
                None => {
                    created.push(id.to_string());
                    self.factory.create(id)
                }
            };
            next.insert(id.to_string(), watcher);
        }

        let pruned: Vec<String> = previous.into_keys().collect();
        self.children = next;

        for id in &created {
            log::info!("Watching new project {}", id);
        }
        for id in &pruned {
            log::info!("Dropped watcher for removed project {}", id);
        }

        Reconciliation { created, pruned }
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    pub fn get(&self, id: &str) -> Option<&EntityWatcher> {
        self.children.get(id)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Run every child once, up to `max_concurrent` at a time.
    ///
    /// Children own disjoint slots, so a failing child never affects its
    /// siblings. Results come back in registry order.
    pub async fn run_all(&self, now: DateTime<Utc>) -> Vec<(String, Result<CycleReport>)> {
        stream::iter(self.children.iter())
            .map(|(id, watcher)| async move { (id.clone(), watcher.run_cycle(now).await) })
            .buffered(self.max_concurrent)
            .collect()
            .await
    }
}
