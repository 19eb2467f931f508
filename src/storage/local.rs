//! Local filesystem storage implementation.
//!
//! ## Slot Layout
//!
//! ```text
//! {slot}/
//! ├── curr.html             # Latest fetch, overwritten every cycle
//! ├── prev.html             # Baseline for the next diff
//! └── backups/
//!     └── {timestamp}.html  # Superseded baselines, never overwritten
//! ```
//!
//! A commit copies `curr.html` to `prev.part`, renames it to `prev.tmp`,
//! moves `prev.html` into `backups/` and finally renames `prev.tmp` to
//! `prev.html`. A complete `prev.tmp` next to a missing `prev.html` means
//! the last commit was interrupted; it is promoted on the next load.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::storage::{CommitMetadata, SnapshotStore};
use crate::utils::slot_key;

const CURRENT_FILE: &str = "curr.html";
const PREVIOUS_FILE: &str = "prev.html";
const BACKUP_DIR: &str = "backups";
const BACKUP_EXT: &str = "html";

const LISTING_DIR: &str = "listing";
const PROJECTS_DIR: &str = "projects";

/// UTC, fixed width, microsecond precision: sorts lexicographically in
/// wall-clock order.
const BACKUP_KEY_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";

/// Root of all snapshot slots.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Slot for the top-level release listing.
    pub fn listing_slot(&self) -> LocalSnapshotStore {
        LocalSnapshotStore::new(self.root_dir.join(LISTING_DIR))
    }

    /// Slot for one release, derived only from its id so a release that
    /// disappears and comes back picks up its old snapshots.
    pub fn project_slot(&self, id: &str) -> LocalSnapshotStore {
        LocalSnapshotStore::new(self.root_dir.join(PROJECTS_DIR).join(slot_key(id)))
    }

    /// Project slots present on disk, keyed by directory name.
    pub async fn project_slots(&self) -> Result<Vec<(String, LocalSnapshotStore)>> {
        let dir = self.root_dir.join(PROJECTS_DIR);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut slots = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
            if entry.file_type().await.map_err(|e| io_error(&dir, e))?.is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                slots.push((name, LocalSnapshotStore::new(entry.path())));
            }
        }
        slots.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(slots)
    }
}

/// Filesystem-backed slot for one watched entity.
#[derive(Debug, Clone)]
pub struct LocalSnapshotStore {
    dir: PathBuf,
    // Serializes writers that share this slot handle.
    lock: Arc<Mutex<()>>,
}

impl LocalSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn backup_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(BACKUP_DIR)
            .join(format!("{key}.{BACKUP_EXT}"))
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
        Ok(())
    }

    async fn exists(path: &Path) -> Result<bool> {
        tokio::fs::try_exists(path)
            .await
            .map_err(|e| io_error(path, e))
    }

    /// Read a file, returning None if it doesn't exist.
    async fn read_string(&self, name: &str) -> Result<Option<String>> {
        let path = self.path(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(name);
        Self::ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        file.write_all(bytes).await.map_err(|e| io_error(&tmp, e))?;
        file.flush().await.map_err(|e| io_error(&tmp, e))?;
        drop(file);

        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(&path, e))
    }

    /// Finish a commit that stopped after `prev.html` was backed up but
    /// before the staged copy was promoted.
    async fn recover_staged_previous(&self) -> Result<()> {
        let _guard = self.lock.lock().await;

        let prev = self.path(PREVIOUS_FILE);
        let staged = prev.with_extension("tmp");
        if Self::exists(&prev).await? || !Self::exists(&staged).await? {
            return Ok(());
        }

        log::warn!(
            "Promoting staged snapshot left by an interrupted commit in {}",
            self.dir.display()
        );
        tokio::fs::rename(&staged, &prev)
            .await
            .map_err(|e| io_error(&prev, e))
    }

    /// First free backup key for `timestamp`; same-instant commits get a
    /// zero-padded `-NNNN` suffix instead of overwriting.
    async fn free_backup_key(&self, timestamp: DateTime<Utc>) -> Result<String> {
        let base = timestamp.format(BACKUP_KEY_FORMAT).to_string();
        let mut key = base.clone();
        let mut n = 1;
        while Self::exists(&self.backup_path(&key)).await? {
            key = format!("{base}-{n:04}");
            n += 1;
        }
        Ok(key)
    }
}

#[async_trait]
impl SnapshotStore for LocalSnapshotStore {
    async fn load_previous(&self) -> Result<Option<String>> {
        self.recover_staged_previous().await?;
        self.read_string(PREVIOUS_FILE).await
    }

    async fn load_current(&self) -> Result<Option<String>> {
        self.read_string(CURRENT_FILE).await
    }

    async fn save_current(&self, raw: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_bytes(CURRENT_FILE, raw.as_bytes()).await
    }

    async fn commit(&self, timestamp: DateTime<Utc>) -> Result<CommitMetadata> {
        let _guard = self.lock.lock().await;

        let curr = self.path(CURRENT_FILE);
        let prev = self.path(PREVIOUS_FILE);
        if !Self::exists(&curr).await? {
            return Err(AppError::storage(
                curr.display().to_string(),
                "no current snapshot to promote",
            ));
        }

        // Stage the new baseline first so a failed copy leaves prev.html intact.
        let partial = prev.with_extension("part");
        let staged = prev.with_extension("tmp");
        tokio::fs::copy(&curr, &partial)
            .await
            .map_err(|e| io_error(&partial, e))?;
        tokio::fs::rename(&partial, &staged)
            .await
            .map_err(|e| io_error(&staged, e))?;

        let backup = if Self::exists(&prev).await? {
            let key = self.free_backup_key(timestamp).await?;
            let dest = self.backup_path(&key);
            Self::ensure_dir(&dest).await?;
            tokio::fs::rename(&prev, &dest)
                .await
                .map_err(|e| io_error(&dest, e))?;
            Some((key, dest))
        } else {
            None
        };

        if let Err(e) = tokio::fs::rename(&staged, &prev).await {
            if let Some((_, dest)) = &backup {
                if let Err(restore) = tokio::fs::rename(dest, &prev).await {
                    log::error!(
                        "Could not restore {} after failed promote: {}",
                        prev.display(),
                        restore
                    );
                }
            }
            return Err(io_error(&prev, e));
        }

        Ok(CommitMetadata {
            backup: backup.map(|(key, _)| key),
            timestamp,
        })
    }

    async fn list_backups(&self) -> Result<Vec<String>> {
        let dir = self.dir.join(BACKUP_DIR);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == BACKUP_EXT) {
                if let Some(stem) = path.file_stem() {
                    keys.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}

fn io_error(path: &Path, e: std::io::Error) -> AppError {
    AppError::storage(path.display().to_string(), e)
}
