// src/services/extract.rs

//! Turns raw listing and release pages into id → description mappings.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::Mapping;
use crate::utils::normalize_whitespace;

/// Extracts an ordered mapping from a raw document.
///
/// Finding nothing is an empty mapping, not an error.
pub trait Extractor: Send + Sync {
    fn extract(&self, raw: &str) -> Result<Mapping>;
}

/// Extracts releases from the JDK project listing.
///
/// Each `li` of the first matching list becomes one entity: the text of
/// its first link is the id, the remaining text (minus one pair of
/// surrounding parentheses) is the description.
pub struct ListingExtractor {
    list: Selector,
    entry: Selector,
    link: Selector,
}

impl ListingExtractor {
    pub fn new(list_selector: &str) -> Result<Self> {
        Ok(Self {
            list: parse_selector(list_selector)?,
            entry: parse_selector("li")?,
            link: parse_selector("a")?,
        })
    }

    fn parse_entry(&self, li: ElementRef<'_>) -> Option<(String, String)> {
        let link = li.select(&self.link).next()?;
        let id = element_text(link);
        if id.is_empty() {
            return None;
        }

        let text = element_text(li);
        let rest = text.replacen(&id, "", 1);
        let rest = rest.trim();
        let rest = rest.strip_prefix('(').unwrap_or(rest);
        let rest = rest.strip_suffix(')').unwrap_or(rest);
        Some((id, rest.to_string()))
    }
}

impl Extractor for ListingExtractor {
    fn extract(&self, raw: &str) -> Result<Mapping> {
        let document = Html::parse_document(raw);
        let mut mapping = Mapping::new();

        let Some(list) = document.select(&self.list).next() else {
            log::debug!("No release list found in listing document");
            return Ok(mapping);
        };

        for li in list.select(&self.entry) {
            if let Some((id, desc)) = self.parse_entry(li) {
                if mapping.insert(id.clone(), desc).is_some() {
                    log::debug!("Duplicate release id '{}' in listing", id);
                }
            }
        }
        Ok(mapping)
    }
}

/// Extracts JEPs from a release page.
///
/// Selectors are tried in order and the first one matching any link
/// wins. The id is the last path segment of the link target.
pub struct ItemExtractor {
    selectors: Vec<Selector>,
}

impl ItemExtractor {
    pub fn new<S: AsRef<str>>(selectors: &[S]) -> Result<Self> {
        let selectors = selectors
            .iter()
            .map(|s| AsRef::<str>::as_ref(s))
            .filter(|s| !s.trim().is_empty())
            .map(parse_selector)
            .collect::<Result<Vec<_>>>()?;

        if selectors.is_empty() {
            return Err(AppError::extract("item selectors", "no selectors configured"));
        }
        Ok(Self { selectors })
    }
}

impl Extractor for ItemExtractor {
    fn extract(&self, raw: &str) -> Result<Mapping> {
        let document = Html::parse_document(raw);
        let mut mapping = Mapping::new();

        for selector in &self.selectors {
            let links: Vec<_> = document.select(selector).collect();
            if links.is_empty() {
                continue;
            }

            for link in links {
                let href = link.value().attr("href").unwrap_or("");
                let Some(id) = last_segment(href) else {
                    continue;
                };
                if mapping.insert(id, element_text(link)).is_some() {
                    log::debug!("Duplicate JEP id '{}' on release page", id);
                }
            }
            break;
        }
        Ok(mapping)
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::extract(format!("selector '{s}'"), format!("{e:?}")))
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn last_segment(href: &str) -> Option<&str> {
    let path = href.split(['?', '#']).next().unwrap_or("");
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
}
