//! The host's navigation surface and the highlight helpers that feed it.

use parking_lot::Mutex;
use regex::RegexBuilder;

use crate::{corpus::Corpus, error::RelevanceError};

/// Half-open byte range `[start, end)` within a document's text.
pub type MatchRange = (usize, usize);

/// Opens documents in the host. Calls are fire-and-forget.
pub trait NavigationSink: Send + Sync {
    fn open(&self, path: &str, highlight: Option<Vec<MatchRange>>);

    /// Selects the nodes of an opened container whose text matches `pattern`.
    fn select_container_nodes(&self, _container_path: &str, _pattern: &str) {}
}

/// A sink that only remembers what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingSink {
    opened: Mutex<Vec<(String, Option<Vec<MatchRange>>)>>,
    selections: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn opened(&self) -> Vec<(String, Option<Vec<MatchRange>>)> {
        self.opened.lock().clone()
    }

    pub fn selections(&self) -> Vec<(String, String)> {
        self.selections.lock().clone()
    }
}

impl NavigationSink for RecordingSink {
    fn open(&self, path: &str, highlight: Option<Vec<MatchRange>>) {
        self.opened.lock().push((path.to_string(), highlight));
    }

    fn select_container_nodes(&self, container_path: &str, pattern: &str) {
        self.selections
            .lock()
            .push((container_path.to_string(), pattern.to_string()));
    }
}

/// Every non-empty, case-insensitive match of `pattern` in `text`.
pub fn find_match_ranges(text: &str, pattern: &str) -> Result<Vec<MatchRange>, RelevanceError> {
    let re = RegexBuilder::new(pattern).case_insensitive(true).build()?;
    Ok(re
        .find_iter(text)
        .filter(|m| !m.is_empty())
        .map(|m| (m.start(), m.end()))
        .collect())
}

/// Opens `path` with every match of `pattern` highlighted. Returns the number of matches.
pub async fn open_and_highlight_text_matches<C: Corpus>(
    corpus: &C,
    sink: &dyn NavigationSink,
    path: &str,
    pattern: &str,
) -> Result<usize, RelevanceError> {
    let content = corpus.read(path).await?;
    let ranges = find_match_ranges(&content, pattern)?;
    let count = ranges.len();
    tracing::debug!("Highlighting {count} match(es) of '{pattern}' in {path}");
    sink.open(path, Some(ranges));
    Ok(count)
}
