//! Snapshot storage for watched entities.
//!
//! Each watched entity owns one slot holding the raw document from the
//! latest fetch (`current`), the raw document of the last cycle that
//! produced changes (`previous`), and timestamped backups of superseded
//! previous documents.
//!
//! ## Directory Structure
//!
//! ```text
//! {cache_dir}/
//! ├── listing/                  # Release listing slot
//! │   ├── curr.html
//! │   ├── prev.html
//! │   └── backups/
//! │       └── 20261019T120000.000000Z.html
//! └── projects/
//!     ├── 21/                   # One slot per release id
//!     │   ├── curr.html
//!     │   └── prev.html
//!     └── 22/
//! ```

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

// Re-export for convenience
pub use local::{LocalSnapshotStore, LocalStorage};

/// Outcome of promoting `current` to `previous`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMetadata {
    /// Key of the backup created from the superseded previous snapshot
    pub backup: Option<String>,
    /// Timestamp the commit was keyed by
    pub timestamp: DateTime<Utc>,
}

/// Current/previous/backup slot for one watched entity.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Raw previous snapshot, `None` before the first committed change.
    async fn load_previous(&self) -> Result<Option<String>>;

    /// Raw content of the most recent successful fetch.
    async fn load_current(&self) -> Result<Option<String>>;

    /// Store freshly fetched content as `current`.
    async fn save_current(&self, raw: &str) -> Result<()>;

    /// Back up `previous` (if any) under `timestamp` and promote `current`.
    ///
    /// Only called for cycles whose diff was non-empty.
    async fn commit(&self, timestamp: DateTime<Utc>) -> Result<CommitMetadata>;

    /// Backup keys in chronological order.
    async fn list_backups(&self) -> Result<Vec<String>>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}
