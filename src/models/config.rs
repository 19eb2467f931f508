//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and scheduling behavior settings
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Where the listing and JEP pages live
    #[serde(default)]
    pub source: SourceConfig,

    /// CSS selectors used by the extractors
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Snapshot storage location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Webhook destinations and message presentation
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("{}: {e}", path.display())))?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.watcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("watcher.user_agent is empty"));
        }
        if self.watcher.timeout_secs == 0 {
            return Err(AppError::validation("watcher.timeout_secs must be > 0"));
        }
        if self.watcher.interval_secs == 0 {
            return Err(AppError::validation("watcher.interval_secs must be > 0"));
        }
        if self.watcher.max_concurrent == 0 {
            return Err(AppError::validation("watcher.max_concurrent must be > 0"));
        }
        Url::parse(&self.source.listing_url)
            .map_err(|e| AppError::validation(format!("source.listing_url: {e}")))?;
        Url::parse(&self.source.item_link_base)
            .map_err(|e| AppError::validation(format!("source.item_link_base: {e}")))?;
        if self.extract.listing_selector.trim().is_empty() {
            return Err(AppError::validation("extract.listing_selector is empty"));
        }
        if self.extract.item_selectors.iter().all(|s| s.trim().is_empty()) {
            return Err(AppError::validation("No extract.item_selectors defined"));
        }
        for webhook in &self.notify.webhooks {
            Url::parse(webhook)
                .map_err(|e| AppError::validation(format!("notify.webhooks entry: {e}")))?;
        }
        Ok(())
    }

    /// Cache directory, relative paths resolved against `base`.
    pub fn cache_dir(&self, base: &Path) -> PathBuf {
        let dir = Path::new(&self.storage.cache_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            base.join(dir)
        }
    }
}

/// HTTP client and scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds, applied to fetches and webhook posts
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Seconds between the start of two cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Maximum number of project watchers refreshed at once
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            interval_secs: defaults::interval(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Source locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Release listing page; project pages are `listing_url` + release id
    #[serde(default = "defaults::listing_url")]
    pub listing_url: String,

    /// Base for JEP links in notifications
    #[serde(default = "defaults::item_link_base")]
    pub item_link_base: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            listing_url: defaults::listing_url(),
            item_link_base: defaults::item_link_base(),
        }
    }
}

/// Selectors for the listing and project extractors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Selector for the `ul` holding one `li` per release
    #[serde(default = "defaults::listing_selector")]
    pub listing_selector: String,

    /// JEP link selectors, tried in order until one matches
    #[serde(default = "defaults::item_selectors")]
    pub item_selectors: Vec<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            listing_selector: defaults::listing_selector(),
            item_selectors: defaults::item_selectors(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for snapshot slots and backups
    #[serde(default = "defaults::cache_dir")]
    pub cache_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_dir: defaults::cache_dir(),
        }
    }
}

/// Webhook destinations and message presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Discord webhook URLs; empty means changes are only logged
    #[serde(default)]
    pub webhooks: Vec<String>,

    #[serde(default = "defaults::avatar_url")]
    pub avatar_url: String,

    #[serde(default = "defaults::listing_username")]
    pub listing_username: String,

    /// Username for project messages; `{id}` is replaced by the release id
    #[serde(default = "defaults::project_username")]
    pub project_username: String,

    #[serde(default = "defaults::listing_title")]
    pub listing_title: String,

    #[serde(default = "defaults::project_title")]
    pub project_title: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhooks: Vec::new(),
            avatar_url: defaults::avatar_url(),
            listing_username: defaults::listing_username(),
            project_username: defaults::project_username(),
            listing_title: defaults::listing_title(),
            project_title: defaults::project_title(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Watcher defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; projectwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        300
    }
    pub fn interval() -> u64 {
        30 * 60
    }
    pub fn max_concurrent() -> usize {
        4
    }

    // Source defaults
    pub fn listing_url() -> String {
        "https://openjdk.org/projects/jdk/".into()
    }
    pub fn item_link_base() -> String {
        "https://openjdk.org/jeps/".into()
    }

    // Extract defaults
    pub fn listing_selector() -> String {
        "div#main ul".into()
    }
    pub fn item_selectors() -> Vec<String> {
        vec!["h2#Features + blockquote > a".into(), ".jeps tbody a".into()]
    }

    pub fn cache_dir() -> String {
        "cache".into()
    }

    // Notify defaults
    pub fn avatar_url() -> String {
        "https://ss.ln-k.net/3949e".into()
    }
    pub fn listing_username() -> String {
        "JDK Updates".into()
    }
    pub fn project_username() -> String {
        "JEP Updates for Release {id}".into()
    }
    pub fn listing_title() -> String {
        "JDK Project Listing".into()
    }
    pub fn project_title() -> String {
        "JEP Changes".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
