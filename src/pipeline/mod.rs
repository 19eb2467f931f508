//! Watch pipeline: diff → change set → per-entity cycle → full monitor cycle.
//!
//! - `EntityWatcher`: one fetch/extract/diff/commit/notify cycle for one slot
//! - `WatcherRegistry`: the release watchers derived from the listing
//! - `Monitor`: listing cycle, reconciliation, then every release

pub mod changes;
pub mod diff;
pub mod monitor;
pub mod registry;
pub mod watcher;

pub use changes::build_change_set;
pub use diff::{DiffCalculator, DiffResult, Modification, calculate_diff};
pub use monitor::{CycleSummary, Monitor, ProjectWatcherFactory};
pub use registry::{Reconciliation, WatcherFactory, WatcherRegistry};
pub use watcher::{CycleReport, EntityWatcher};
