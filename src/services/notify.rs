// src/services/notify.rs

//! Change delivery to Discord webhooks.
//!
//! Every destination is attempted independently; one failing webhook
//! never stops delivery to the others.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{ChangeRecord, ChangeSet, NotifyConfig, Scope, SourceConfig};
use crate::utils::{as_directory, get_domain, resolve};

/// Discord rejects embed descriptions above this many characters.
const EMBED_DESCRIPTION_LIMIT: usize = 4096;

/// Outcome of delivering one change set.
#[derive(Debug, Default)]
pub struct NotifyReport {
    /// Destinations that accepted every message
    pub delivered: usize,
    /// One `AppError::Notify` per destination that failed
    pub failures: Vec<AppError>,
}

impl NotifyReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Delivers a non-empty change set to zero or more destinations.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, changes: &ChangeSet, destinations: &[String]) -> NotifyReport;
}

/// Discord webhook execute payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WebhookMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub username: String,
    pub avatar_url: String,
    pub tts: bool,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Embed {
    pub title: String,
    pub url: String,
    pub description: String,
}

/// Renders change sets as Discord embeds and posts them.
pub struct DiscordNotifier {
    client: Client,
    settings: NotifyConfig,
    listing_url: String,
    item_link_base: String,
}

impl DiscordNotifier {
    pub fn new(client: Client, settings: NotifyConfig, source: &SourceConfig) -> Self {
        Self {
            client,
            settings,
            listing_url: as_directory(&source.listing_url),
            item_link_base: as_directory(&source.item_link_base),
        }
    }

    /// Render a change set into one or more webhook messages.
    pub fn render(&self, changes: &ChangeSet) -> Vec<WebhookMessage> {
        let (username, title, header) = match &changes.scope {
            Scope::Listing => (
                self.settings.listing_username.clone(),
                self.settings.listing_title.clone(),
                "The following Project versions have changed:",
            ),
            Scope::Project(id) => (
                self.settings.project_username.replace("{id}", id),
                self.settings.project_title.clone(),
                "The following JEPs have changed:",
            ),
        };

        let lines: Vec<String> = changes
            .iter()
            .map(|record| self.render_line(&changes.scope, record))
            .collect();

        chunk_lines(header, &lines, EMBED_DESCRIPTION_LIMIT)
            .into_iter()
            .map(|description| WebhookMessage {
                content: None,
                username: username.clone(),
                avatar_url: self.settings.avatar_url.clone(),
                tts: false,
                embeds: vec![Embed {
                    title: title.clone(),
                    url: self.listing_url.clone(),
                    description,
                }],
            })
            .collect()
    }

    fn render_line(&self, scope: &Scope, record: &ChangeRecord) -> String {
        let id = record.id();
        match scope {
            Scope::Listing => format!(
                "- Release [{id}]({}) {} -> {}",
                resolve(&self.listing_url, id),
                quoted_or_none(record.before()),
                quoted_or_none(record.after()),
            ),
            Scope::Project(_) => {
                let link = resolve(&self.item_link_base, id);
                match record {
                    ChangeRecord::Added { description, .. } => {
                        format!("Added: [{id}]({link}) - {description}")
                    }
                    ChangeRecord::Removed { description, .. } => {
                        format!("Removed: [{id}]({link}) - {description}")
                    }
                    ChangeRecord::Modified {
                        old_description,
                        new_description,
                        ..
                    } => format!(
                        "Modified: [{id}]({link}) `{old_description}` -> `{new_description}`"
                    ),
                }
            }
        }
    }

    async fn deliver(&self, destination: &str, message: &WebhookMessage) -> Result<()> {
        self.client
            .post(destination)
            .json(message)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::notify(destination_label(destination), e))?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, changes: &ChangeSet, destinations: &[String]) -> NotifyReport {
        let mut report = NotifyReport::default();
        if changes.is_empty() || destinations.is_empty() {
            return report;
        }

        let messages = self.render(changes);
        for destination in destinations {
            let mut result = Ok(());
            for message in &messages {
                result = self.deliver(destination, message).await;
                if result.is_err() {
                    break;
                }
            }

            match result {
                Ok(()) => {
                    log::debug!(
                        "Delivered {} changes for {} to {}",
                        changes.len(),
                        changes.scope,
                        destination_label(destination)
                    );
                    report.delivered += 1;
                }
                Err(e) => report.failures.push(e),
            }
        }
        report
    }
}

/// Webhook URLs carry their token in the path; log the host only.
fn destination_label(destination: &str) -> String {
    get_domain(destination).unwrap_or_else(|| "webhook".to_string())
}

fn quoted_or_none(desc: Option<&str>) -> String {
    desc.map_or_else(|| "(none)".to_string(), |d| format!("`{d}`"))
}

/// Pack lines under a header into descriptions of at most `limit` chars.
fn chunk_lines(header: &str, lines: &[String], limit: usize) -> Vec<String> {
    let header_len = header.chars().count();
    let max_line = limit.saturating_sub(header_len + 1).max(1);

    let mut chunks = Vec::new();
    let mut current = header.to_string();
    let mut current_len = header_len;
    let mut has_lines = false;

    for line in lines {
        let line = truncate(line, max_line);
        let line_len = line.chars().count();
        if has_lines && current_len + 1 + line_len > limit {
            chunks.push(std::mem::replace(&mut current, header.to_string()));
            current_len = header_len;
        }
        current.push('\n');
        current.push_str(&line);
        current_len += 1 + line_len;
        has_lines = true;
    }

    if has_lines {
        chunks.push(current);
    }
    chunks
}

fn truncate(line: &str, max_chars: usize) -> String {
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let mut out: String = line.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
