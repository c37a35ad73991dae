//! Relevance engines.
//!
//! The engine family is closed: every engine has an [`EngineId`], and the [`MatcherRegistry`]
//! maps identifiers to [`Matcher`] implementations. Each engine takes the corpus and a query and
//! resolves, independently of the others, to an ordered list of [`MatchResult`]s.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    future::Future,
};

use crate::{
    canvas::{find_canvas_references, load_canvases},
    config::{is_container_path, RelevanceConfig},
    corpus::Corpus,
    navigation::{MatchRange, NavigationSink},
};

/// Engine identifiers. Result blocks in the store are ordered by [`EngineId::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EngineId {
    /// Free-text search across container nodes.
    ContainerText,
    /// Containers referencing the focused document.
    FocusedContainer,
}

impl EngineId {
    pub const ALL: [EngineId; 2] = [EngineId::ContainerText, EngineId::FocusedContainer];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineId::ContainerText => "OpenableSearchResult",
            EngineId::FocusedContainer => "CanvasMatch",
        }
    }
}

impl Display for EngineId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A container whose nodes mention the free-text query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerTextMatch {
    pub link: String,
    pub match_display_text: String,
    pub match_string: String,
    pub from_index: usize,
    pub to_index: usize,
}

/// A container holding a node that references the focused document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusedContainerMatch {
    /// The focused document.
    pub link: String,
    pub match_display_text: String,
    pub canvas_file: String,
    pub node_id: String,
    pub edge_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    ContainerText(ContainerTextMatch),
    FocusedContainer(FocusedContainerMatch),
}

impl MatchResult {
    pub fn engine(&self) -> EngineId {
        match self {
            MatchResult::ContainerText(_) => EngineId::ContainerText,
            MatchResult::FocusedContainer(_) => EngineId::FocusedContainer,
        }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine().as_str()
    }

    pub fn link(&self) -> &str {
        match self {
            MatchResult::ContainerText(m) => &m.link,
            MatchResult::FocusedContainer(m) => &m.link,
        }
    }

    pub fn match_display_text(&self) -> &str {
        match self {
            MatchResult::ContainerText(m) => &m.match_display_text,
            MatchResult::FocusedContainer(m) => &m.match_display_text,
        }
    }

    /// Sends the host to whatever this result points at.
    pub fn open(&self, sink: &dyn NavigationSink, container_extension: &str) {
        match self {
            MatchResult::ContainerText(m) => {
                if is_container_path(&m.link, container_extension) {
                    sink.open(&m.link, None);
                } else {
                    let range: MatchRange = (m.from_index, m.to_index);
                    sink.open(&m.link, Some(vec![range]));
                }
            }
            MatchResult::FocusedContainer(m) => {
                sink.open(&m.canvas_file, None);
                sink.select_container_nodes(&m.canvas_file, &m.link);
            }
        }
    }
}

impl Display for MatchResult {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            MatchResult::ContainerText(m) => write!(
                f,
                "[{}] {} appears in {}",
                self.engine_name(),
                m.match_string,
                m.match_display_text
            ),
            MatchResult::FocusedContainer(m) => {
                write!(f, "[{}] {}", self.engine_name(), m.match_display_text)
            }
        }
    }
}

/// Returns one [`MatchResult::ContainerText`] per container with a node whose text or file
/// reference contains the query.
#[derive(Debug, Clone)]
pub struct ContainerTextMatcher {
    pub container_extension: String,
}

impl ContainerTextMatcher {
    pub async fn get_matches<C: Corpus>(&self, corpus: &C, query: &str) -> Vec<MatchResult> {
        if query.is_empty() {
            return Vec::new();
        }
        load_canvases(corpus, &self.container_extension)
            .await
            .into_iter()
            .filter(|(_, data)| data.mentions(query))
            .map(|(canvas_path, _)| {
                MatchResult::ContainerText(ContainerTextMatch {
                    link: canvas_path.clone(),
                    match_display_text: canvas_path,
                    match_string: query.to_string(),
                    from_index: 0,
                    to_index: 1,
                })
            })
            .collect()
    }
}

/// Returns one [`MatchResult::FocusedContainer`] per container referencing the focused path.
#[derive(Debug, Clone)]
pub struct FocusedContainerMatcher {
    pub container_extension: String,
}

impl FocusedContainerMatcher {
    pub async fn get_matches<C: Corpus>(&self, corpus: &C, focused_path: &str) -> Vec<MatchResult> {
        if focused_path.is_empty() {
            return Vec::new();
        }
        find_canvas_references(corpus, &self.container_extension, focused_path)
            .await
            .into_iter()
            .map(|reference| {
                MatchResult::FocusedContainer(FocusedContainerMatch {
                    link: focused_path.to_string(),
                    match_display_text: format!(
                        "{focused_path} is in {}",
                        reference.canvas_path
                    ),
                    canvas_file: reference.canvas_path,
                    node_id: reference.node_id,
                    edge_ids: reference.edge_ids,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum Matcher {
    ContainerText(ContainerTextMatcher),
    FocusedContainer(FocusedContainerMatcher),
}

impl Matcher {
    pub fn engine(&self) -> EngineId {
        match self {
            Matcher::ContainerText(_) => EngineId::ContainerText,
            Matcher::FocusedContainer(_) => EngineId::FocusedContainer,
        }
    }

    pub fn get_matches<'a, C: Corpus>(
        &'a self,
        corpus: &'a C,
        query: &'a str,
    ) -> impl Future<Output = Vec<MatchResult>> + 'a {
        async move {
            match self {
                Matcher::ContainerText(m) => m.get_matches(corpus, query).await,
                Matcher::FocusedContainer(m) => m.get_matches(corpus, query).await,
            }
        }
    }
}

/// The fixed set of engines, keyed by identifier.
#[derive(Debug, Clone)]
pub struct MatcherRegistry(BTreeMap<EngineId, Matcher>);

impl MatcherRegistry {
    pub fn new(config: &RelevanceConfig) -> Self {
        let extension = config.container_extension.clone();
        MatcherRegistry(BTreeMap::from([
            (
                EngineId::ContainerText,
                Matcher::ContainerText(ContainerTextMatcher {
                    container_extension: extension.clone(),
                }),
            ),
            (
                EngineId::FocusedContainer,
                Matcher::FocusedContainer(FocusedContainerMatcher {
                    container_extension: extension,
                }),
            ),
        ]))
    }

    pub fn get(&self, engine: EngineId) -> Option<&Matcher> {
        self.0.get(&engine)
    }

    pub fn engines(&self) -> impl Iterator<Item = EngineId> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EngineId, &Matcher)> {
        self.0.iter()
    }
}
