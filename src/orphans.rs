//! Orphan detection.
//!
//! For every tracked document three sets are collected:
//!
//! - `canvas_nodes`: containers listed in the node mapping under the document's own path, i.e.
//!   containers holding a node whose key (text, else file reference) is literally that path;
//! - `tags`: the match texts of the document's tag connectors;
//! - `links`: the match texts of the document's link connectors.
//!
//! A document is an orphan when all three are empty. The connection extractor never fills
//! `links`, so in practice only `canvas_nodes` and `tags` decide. Note that `tags` and `links`
//! count the connectors a document *contains*, not the ones pointing at it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::{
    canvas::{get_all_canvas_node_mappings, NodeCanvasMapping},
    config::RelevanceConfig,
    connections::{get_all_connections, ConnectionExtractor, ConnectionTracker},
    corpus::Corpus,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerAttributes {
    pub canvas_nodes: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub links: BTreeSet<String>,
}

impl TrackerAttributes {
    pub fn from_tracker(tracker: &ConnectionTracker, mapping: &NodeCanvasMapping) -> Self {
        TrackerAttributes {
            canvas_nodes: mapping
                .get(&tracker.path)
                .map(|canvases| canvases.iter().cloned().collect())
                .unwrap_or_default(),
            tags: tracker.tags.iter().map(|c| c.match_text.clone()).collect(),
            links: tracker.links.iter().map(|c| c.match_text.clone()).collect(),
        }
    }

    pub fn is_orphan(&self) -> bool {
        self.canvas_nodes.is_empty() && self.tags.is_empty() && self.links.is_empty()
    }
}

/// One row of the orphan report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orphan {
    pub path: String,
    pub canvas_nodes: usize,
    pub links: usize,
    pub tags: usize,
}

/// Orphans among the tracked documents, in corpus order. Documents without a tracker (for
/// instance because they could not be read) are never reported.
pub fn find_orphans<C: Corpus>(
    corpus: &C,
    mapping: &NodeCanvasMapping,
    trackers: &[ConnectionTracker],
) -> Vec<Orphan> {
    let lookup: HashMap<&str, TrackerAttributes> = trackers
        .iter()
        .map(|tracker| {
            (
                tracker.path.as_str(),
                TrackerAttributes::from_tracker(tracker, mapping),
            )
        })
        .collect();

    corpus
        .documents()
        .into_iter()
        .filter_map(|doc| {
            let attrs = lookup.get(doc.path.as_str())?;
            attrs.is_orphan().then(|| Orphan {
                canvas_nodes: attrs.canvas_nodes.len(),
                links: attrs.links.len(),
                tags: attrs.tags.len(),
                path: doc.path,
            })
        })
        .collect()
}

/// Recomputes the container mapping and every tracker from storage, then reports orphans.
#[tracing::instrument(skip_all)]
pub async fn analyze_orphans<C: Corpus>(corpus: &C, config: &RelevanceConfig) -> Vec<Orphan> {
    let mapping = get_all_canvas_node_mappings(corpus, &config.container_extension).await;
    let trackers = get_all_connections(corpus, ConnectionExtractor::from(config)).await;
    let orphans = find_orphans(corpus, &mapping, &trackers);
    tracing::info!(
        "{} orphan(s) among {} tracked document(s)",
        orphans.len(),
        trackers.len()
    );
    orphans
}
