//! Diff calculation between two mappings.
//!
//! Classifies every id into added, removed, or modified. The result is
//! semantically a set per class; the order within each class follows the
//! mapping it was read from so output is reproducible.

use serde::{Deserialize, Serialize};

use crate::models::{Entity, Mapping};

/// A description change for an id present on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    pub id: String,
    pub old_description: String,
    pub new_description: String,
}

/// Three-way classification of two mappings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffResult {
    /// In new but not in old, in new-mapping order
    pub added: Vec<Entity>,
    /// In old but not in new, in old-mapping order
    pub removed: Vec<Entity>,
    /// In both with differing descriptions, in old-mapping order
    pub modified: Vec<Modification>,
}

impl DiffResult {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || !self.modified.is_empty()
    }

    /// Get the total number of changes.
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

/// Calculator for computing diffs between mappings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffCalculator;

impl DiffCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Calculate the diff between the previous and current mappings.
    ///
    /// A missing previous snapshot is passed as an empty mapping, which
    /// turns every current id into an addition.
    pub fn calculate(&self, previous: &Mapping, current: &Mapping) -> DiffResult {
        let added = current
            .iter()
            .filter(|(id, _)| !previous.contains(id))
            .map(|(id, desc)| Entity::new(id, desc))
            .collect();

        let mut removed = Vec::new();
        let mut modified = Vec::new();
        for (id, old_desc) in previous.iter() {
            match current.get(id) {
                None => removed.push(Entity::new(id, old_desc)),
                Some(new_desc) if new_desc != old_desc => modified.push(Modification {
                    id: id.to_string(),
                    old_description: old_desc.to_string(),
                    new_description: new_desc.to_string(),
                }),
                Some(_) => {}
            }
        }

        DiffResult {
            added,
            removed,
            modified,
        }
    }
}

/// Convenience function to calculate diff.
pub fn calculate_diff(previous: &Mapping, current: &Mapping) -> DiffResult {
    DiffCalculator::new().calculate(previous, current)
}
