// src/models/change.rs

//! Change records handed to the notifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which watcher a change set came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Scope {
    /// The top-level release listing
    Listing,
    /// The JEP list of one release
    Project(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Listing => write!(f, "listing"),
            Scope::Project(id) => write!(f, "project {id}"),
        }
    }
}

/// A single entity's transition between two mappings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ChangeRecord {
    Added {
        id: String,
        description: String,
    },
    Removed {
        id: String,
        description: String,
    },
    Modified {
        id: String,
        old_description: String,
        new_description: String,
    },
}

impl ChangeRecord {
    pub fn id(&self) -> &str {
        match self {
            ChangeRecord::Added { id, .. }
            | ChangeRecord::Removed { id, .. }
            | ChangeRecord::Modified { id, .. } => id,
        }
    }

    /// Description before the change, if the entity existed.
    pub fn before(&self) -> Option<&str> {
        match self {
            ChangeRecord::Added { .. } => None,
            ChangeRecord::Removed { description, .. } => Some(description),
            ChangeRecord::Modified {
                old_description, ..
            } => Some(old_description),
        }
    }

    /// Description after the change, if the entity still exists.
    pub fn after(&self) -> Option<&str> {
        match self {
            ChangeRecord::Added { description, .. } => Some(description),
            ChangeRecord::Removed { .. } => None,
            ChangeRecord::Modified {
                new_description, ..
            } => Some(new_description),
        }
    }
}

/// All changes one watcher observed in one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub scope: Scope,
    pub records: Vec<ChangeRecord>,
}

impl ChangeSet {
    pub fn empty(scope: Scope) -> Self {
        Self {
            scope,
            records: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.iter()
    }

    pub fn added(&self) -> usize {
        self.count(|r| matches!(r, ChangeRecord::Added { .. }))
    }

    pub fn removed(&self) -> usize {
        self.count(|r| matches!(r, ChangeRecord::Removed { .. }))
    }

    pub fn modified(&self) -> usize {
        self.count(|r| matches!(r, ChangeRecord::Modified { .. }))
    }

    fn count(&self, pred: impl Fn(&ChangeRecord) -> bool) -> usize {
        self.records.iter().filter(|r| pred(r)).count()
    }
}
