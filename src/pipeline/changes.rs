//! Turns a diff into the change set consumed by notifiers.

use crate::models::{ChangeRecord, ChangeSet, Scope};

use super::diff::DiffResult;

/// Build the notifier-facing change set: additions, then removals, then
/// modifications, each in diff order.
pub fn build_change_set(scope: Scope, diff: &DiffResult) -> ChangeSet {
    let mut records = Vec::with_capacity(diff.change_count());

    records.extend(diff.added.iter().map(|e| ChangeRecord::Added {
        id: e.id.clone(),
        description: e.description.clone(),
    }));
    records.extend(diff.removed.iter().map(|e| ChangeRecord::Removed {
        id: e.id.clone(),
        description: e.description.clone(),
    }));
    records.extend(diff.modified.iter().map(|m| ChangeRecord::Modified {
        id: m.id.clone(),
        old_description: m.old_description.clone(),
        new_description: m.new_description.clone(),
    }));

    ChangeSet { scope, records }
}
