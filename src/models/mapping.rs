// src/models/mapping.rs

//! Entity and ordered id → description mapping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single tracked identity (a release or a JEP).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub description: String,
}

impl Entity {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

/// Ordered id → description mapping produced by one extraction.
///
/// Iteration follows first-insertion order. Inserting an id twice keeps
/// its original position and replaces the description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mapping {
    entries: IndexMap<String, String>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity, returning the description it replaced.
    pub fn insert(&mut self, id: impl Into<String>, description: impl Into<String>) -> Option<String> {
        self.entries.insert(id.into(), description.into())
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Ids in mapping order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(id, description)` pairs in mapping order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(id, desc)| (id.as_str(), desc.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (id, desc) in iter {
            mapping.insert(id, desc);
        }
        mapping
    }
}
