//! Service layer: the collaborators a watcher drives each cycle.
//!
//! - Document fetching (`Fetcher`, `HttpFetcher`)
//! - Mapping extraction (`Extractor`, `ListingExtractor`, `ItemExtractor`)
//! - Change delivery (`Notifier`, `DiscordNotifier`)

mod extract;
mod fetch;
mod notify;

use std::sync::Arc;

pub use extract::{Extractor, ItemExtractor, ListingExtractor};
pub use fetch::{Fetcher, HttpFetcher};
pub use notify::{DiscordNotifier, Embed, NotifyReport, Notifier, WebhookMessage};

/// Collaborators shared read-only by every watcher.
#[derive(Clone)]
pub struct Services {
    pub fetcher: Arc<dyn Fetcher>,
    pub notifier: Arc<dyn Notifier>,
    pub destinations: Arc<[String]>,
}

impl Services {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
        destinations: impl Into<Arc<[String]>>,
    ) -> Self {
        Self {
            fetcher,
            notifier,
            destinations: destinations.into(),
        }
    }
}
