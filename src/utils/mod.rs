//! Utility functions and helpers.

pub mod http;

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use url::Url;

static UNSAFE_PATH_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid path regex"));

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a URL string against a base URL string.
///
/// Falls back to plain concatenation when the base does not parse.
pub fn resolve(base_url: &str, href: &str) -> String {
    match Url::parse(base_url) {
        Ok(base) => resolve_url(&base, href),
        Err(_) => format!("{base_url}{href}"),
    }
}

/// Base URL with a trailing slash, so ids joined onto it are appended
/// rather than replacing its last path segment.
pub fn as_directory(base_url: &str) -> String {
    if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    }
}

/// Extract the domain from a URL string.
pub fn get_domain(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Directory name for an entity id.
///
/// Safe ids are used verbatim. Anything else is sanitized and suffixed
/// with a short SHA-256 of the original id so distinct ids never share
/// a slot.
pub fn slot_key(id: &str) -> String {
    let safe = !id.is_empty() && id != "." && id != ".." && !UNSAFE_PATH_CHARS.is_match(id);
    if safe {
        return id.to_string();
    }

    let sanitized = UNSAFE_PATH_CHARS.replace_all(id, "_");
    let digest = Sha256::digest(id.as_bytes());
    format!("{}-{}", sanitized, &hex::encode(digest)[..8])
}
