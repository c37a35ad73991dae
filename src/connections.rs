//! Per-document reference extraction.
//!
//! A deliberately lightweight, line-oriented scanner: two patterns (a bare `---` delimiter line
//! and a `[[word]]` wikilink token), no markup grammar. Front-matter list items are taken
//! verbatim; wikilinks are case-folded. Wikilinks whose target contains anything other than
//! ASCII alphanumerics or underscores are not recognised.

use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{config::RelevanceConfig, corpus::Corpus};

static DELIMITER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^---$").expect("valid regex"));
static WIKILINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([A-Za-z0-9_]+)\]\]").expect("valid regex"));
static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z0-9_]+)://([A-Za-z0-9_]+)\.([A-Za-z0-9_]+)").expect("valid regex")
});
/// Where a connector was found: zero-based line, byte span within that raw line.
/// Where a connector was found: zero-based line, byte span within the trimmed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    pub match_text: String,
    pub location: Option<Location>,
}

impl Connector {
    pub fn new(match_text: impl Into<String>) -> Self {
        Connector {
            match_text: match_text.into(),
            location: None,
        }
    }

    pub fn at(mut self, line: usize, start: usize, end: usize) -> Self {
        self.location = Some(Location { line, start, end });
        self
    }
}

/// Every extracted reference of one document.
///
/// `links` is part of the record but no extractor populates it; `urls` is populated only when
/// URL extraction is enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTracker {
    pub path: String,
    pub tags: Vec<Connector>,
    pub links: Vec<Connector>,
    pub urls: Vec<Connector>,
}

impl ConnectionTracker {
    pub fn new(path: impl Into<String>) -> Self {
        ConnectionTracker {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.links.is_empty() && self.urls.is_empty()
    }

    pub fn tag_texts(&self) -> Vec<&str> {
        self.tags.iter().map(|c| c.match_text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionExtractor {
    pub extract_urls: bool,
}

impl From<&RelevanceConfig> for ConnectionExtractor {
    fn from(config: &RelevanceConfig) -> Self {
        ConnectionExtractor {
            extract_urls: config.extract_urls,
        }
    }
}

impl ConnectionExtractor {
    pub fn extract(&self, path: &str, raw_content: &str) -> ConnectionTracker {
        let mut connections = ConnectionTracker::new(path);
        let mut in_front_matter = false;

        for (idx, raw_line) in raw_content.lines().enumerate() {
            let line = raw_line.trim();
            let indent = raw_line.len() - raw_line.trim_start().len();
            if idx == 0 && DELIMITER_RE.is_match(line) {
                in_front_matter = true;
                continue;
            }
            if in_front_matter {
                if DELIMITER_RE.is_match(line) {
                    in_front_matter = false;
                } else if let Some(item) = line.strip_prefix("- ") {
                    let tag = item.trim();
                    let start = indent + 2 + (item.len() - item.trim_start().len());
                    connections
                        .tags
                        .push(Connector::new(tag).at(idx, start, start + tag.len()));
                }
                continue;
            }

            for caps in WIKILINK_RE.captures_iter(line) {
                // Group 1 always participates in a match.
                let Some(target) = caps.get(1) else {
                    continue;
                };
                connections.tags.push(
                    Connector::new(target.as_str().to_lowercase()).at(
                        idx,
                        indent + target.start(),
                        indent + target.end(),
                    ),
                );
            }

            if self.extract_urls {
                for found in URL_RE.find_iter(line) {
                    match Url::parse(found.as_str()) {
                        Ok(url) => connections.urls.push(
                            Connector::new(url.as_str()).at(
                                idx,
                                indent + found.start(),
                                indent + found.end(),
                            ),
                        ),
                        Err(e) => {
                            tracing::debug!("{path}:{idx}: skipping '{}': {e}", found.as_str())
                        }
                    }
                }
            }
        }
        connections
    }
}

/// Extracts connectors with the default extractor (no URL extraction).
pub fn extract_connections(path: &str, raw_content: &str) -> ConnectionTracker {
    ConnectionExtractor::default().extract(path, raw_content)
}

/// Reads every document of the corpus and extracts its connections.
///
/// Unreadable documents are logged and left out; the output keeps corpus order.
#[tracing::instrument(skip_all)]
pub async fn get_all_connections<C: Corpus>(
    corpus: &C,
    extractor: ConnectionExtractor,
) -> Vec<ConnectionTracker> {
    let documents = corpus.documents();
    let reads = documents.iter().map(|doc| async move {
        match corpus.read(&doc.path).await {
            Ok(content) => Some(extractor.extract(&doc.path, &content)),
            Err(e) => {
                tracing::warn!("Excluding document from connection tracking: {e}");
                None
            }
        }
    });
    let trackers: Vec<ConnectionTracker> = join_all(reads).await.into_iter().flatten().collect();
    tracing::debug!(
        "Extracted connections for {} of {} documents",
        trackers.len(),
        documents.len()
    );
    trackers
}
