//! Container documents: node/edge graphs stored as JSON.
//!
//! A container references a document when one of its nodes carries that document's path as its
//! file reference. This module parses containers, indexes them across the corpus, and offers the
//! small graph queries the canvas search panel needs.
//!
//! Every corpus-wide operation reads containers concurrently and isolates failures: a container
//! that cannot be read or parsed is logged and contributes nothing, the others are unaffected.

use futures::future::join_all;
use petgraph::{graph::NodeIndex, Direction, Graph};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{corpus::Corpus, error::RelevanceError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    /// Fields this crate does not interpret (`type`, `color`, ...), kept for re-emission.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CanvasNode {
    /// The index key of a node: its inline text, or its file reference when it has no text.
    pub fn key(&self) -> Option<&str> {
        match (self.text.as_deref(), self.file.as_deref()) {
            (Some(text), _) if !text.is_empty() => Some(text),
            (_, Some(file)) if !file.is_empty() => Some(file),
            _ => None,
        }
    }

    /// Bounding box used to frame a node: the node expanded by its own size on every side.
    pub fn zoom_bbox(&self) -> BoundingBox {
        BoundingBox {
            min_x: self.x - self.width,
            min_y: self.y - self.height,
            max_x: self.x + self.width,
            max_y: self.y + self.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: String,
    pub from_node: String,
    pub to_node: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasData {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CanvasData {
    pub fn parse(path: &str, content: &str) -> Result<Self, RelevanceError> {
        serde_json::from_str(content).map_err(|e| RelevanceError::parse(path, e))
    }

    pub fn to_json(&self) -> Result<String, RelevanceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn node(&self, id: &str) -> Option<&CanvasNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The first node whose file reference equals `target`, with the ids of every edge touching
    /// it. Later nodes referencing the same file are not considered.
    pub fn first_reference(&self, target: &str) -> Option<(&CanvasNode, Vec<String>)> {
        let node = self
            .nodes
            .iter()
            .find(|n| n.file.as_deref() == Some(target))?;
        let edge_ids = self
            .edges
            .iter()
            .filter(|e| e.from_node == node.id || e.to_node == node.id)
            .map(|e| e.id.clone())
            .collect();
        Some((node, edge_ids))
    }

    /// True when some node's text or file reference contains `query` (case-sensitive).
    pub fn mentions(&self, query: &str) -> bool {
        self.nodes.iter().any(|node| {
            node.text.as_deref().is_some_and(|t| t.contains(query))
                || node.file.as_deref().is_some_and(|f| f.contains(query))
        })
    }

    /// Nodes whose text (or file reference, for nodes without text) matches `pattern`
    /// case-insensitively.
    pub fn nodes_matching(&self, pattern: &str) -> Result<Vec<&CanvasNode>, RelevanceError> {
        let re = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(self
            .nodes
            .iter()
            .filter(|node| node.key().is_some_and(|k| re.is_match(k)))
            .collect())
    }

    pub fn graph(&self) -> CanvasGraph<'_> {
        CanvasGraph::new(self)
    }
}

/// Directed view of a canvas: node ids as vertices, edges pointing `fromNode -> toNode`.
pub struct CanvasGraph<'a> {
    graph: Graph<&'a str, &'a str>,
    index: HashMap<&'a str, NodeIndex>,
}

impl<'a> CanvasGraph<'a> {
    fn new(data: &'a CanvasData) -> Self {
        let mut graph = Graph::new();
        let mut index = HashMap::new();
        for node in data.nodes.iter() {
            index.insert(node.id.as_str(), graph.add_node(node.id.as_str()));
        }
        for edge in data.edges.iter() {
            match (
                index.get(edge.from_node.as_str()),
                index.get(edge.to_node.as_str()),
            ) {
                (Some(from), Some(to)) => {
                    graph.add_edge(*from, *to, edge.id.as_str());
                }
                _ => tracing::debug!("Edge {} references a missing node", edge.id),
            }
        }
        CanvasGraph { graph, index }
    }

    fn neighbors<'b, I>(&self, ids: I, direction: Direction) -> BTreeSet<&'a str>
    where
        I: IntoIterator<Item = &'b str>,
    {
        ids.into_iter()
            .filter_map(|id| self.index.get(id))
            .flat_map(|idx| self.graph.neighbors_directed(*idx, direction))
            .map(|idx| self.graph[idx])
            .collect()
    }

    /// Nodes with an edge into any of `ids`.
    pub fn parents_of<'b, I>(&self, ids: I) -> BTreeSet<&'a str>
    where
        I: IntoIterator<Item = &'b str>,
    {
        self.neighbors(ids, Direction::Incoming)
    }

    /// Nodes reached by an edge out of any of `ids`.
    pub fn children_of<'b, I>(&self, ids: I) -> BTreeSet<&'a str>
    where
        I: IntoIterator<Item = &'b str>,
    {
        self.neighbors(ids, Direction::Outgoing)
    }
}

/// node key -> paths of the containers holding a node with that key.
pub type NodeCanvasMapping = BTreeMap<String, Vec<String>>;

/// A container that references a target document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasReference {
    pub canvas_path: String,
    pub node_id: String,
    pub edge_ids: Vec<String>,
}

/// Reads and parses every container of the corpus, in corpus order, dropping the ones that fail.
pub async fn load_canvases<C: Corpus>(corpus: &C, extension: &str) -> Vec<(String, CanvasData)> {
    let containers = corpus.containers(extension);
    let loads = containers.into_iter().map(|doc| async move {
        let content = corpus.read(&doc.path).await?;
        let data = CanvasData::parse(&doc.path, &content)?;
        Ok::<_, RelevanceError>((doc.path, data))
    });
    join_all(loads)
        .await
        .into_iter()
        .filter_map(|loaded| match loaded {
            Ok(loaded) => Some(loaded),
            Err(e) => {
                tracing::warn!("Skipping container: {e}");
                None
            }
        })
        .collect()
}

/// Builds the key -> containers index over every container in the corpus.
///
/// A container appears once per node carrying the key, so a key repeated within one container
/// lists that container repeatedly. Nodes with neither text nor file reference are not indexed.
#[tracing::instrument(skip_all)]
pub async fn get_all_canvas_node_mappings<C: Corpus>(
    corpus: &C,
    extension: &str,
) -> NodeCanvasMapping {
    let mut out = NodeCanvasMapping::new();
    for (canvas_path, data) in load_canvases(corpus, extension).await {
        for node in data.nodes.iter() {
            match node.key() {
                Some(key) => out
                    .entry(key.to_string())
                    .or_default()
                    .push(canvas_path.clone()),
                None => tracing::trace!("{canvas_path}: node {} has no key", node.id),
            }
        }
    }
    out
}

/// Every container with a node whose file reference is `target`.
#[tracing::instrument(skip(corpus))]
pub async fn find_canvas_references<C: Corpus>(
    corpus: &C,
    extension: &str,
    target: &str,
) -> Vec<CanvasReference> {
    load_canvases(corpus, extension)
        .await
        .into_iter()
        .filter_map(|(canvas_path, data)| {
            data.first_reference(target)
                .map(|(node, edge_ids)| CanvasReference {
                    canvas_path: canvas_path.clone(),
                    node_id: node.id.clone(),
                    edge_ids,
                })
        })
        .collect()
}
