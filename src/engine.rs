//! Dispatching the relevance engines and merging their results.
//!
//! A run fires every applicable engine at once and polls them together on the calling task.
//! Whenever one engine resolves, its block in the [`ResultStore`] is replaced and subscribers are
//! notified; the other engines keep running. Consumers therefore see intermediate states that
//! hold results from only some engines; a run is complete once no engine is marked running.
//!
//! Runs are not cancelled when the focus moves. By default a late engine still merges its
//! results into whatever state is current. With `gate_stale_results` set, results are merged only
//! if the store is still focused on the document the run was started for.

use futures::stream::{FuturesUnordered, StreamExt};

use crate::{
    canvas::{CanvasData, CanvasNode},
    config::RelevanceConfig,
    corpus::Corpus,
    error::RelevanceError,
    matcher::{EngineId, MatchResult, MatcherRegistry},
    store::{RelevanceState, ResultStore},
};

/// View-local search state, kept apart from the shared store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchView {
    pub query: String,
    focused_node_offset: usize,
}

impl SearchView {
    pub fn new(query: impl Into<String>) -> Self {
        SearchView {
            query: query.into(),
            focused_node_offset: 0,
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Nodes of `canvas` matching the current query. Restarts the focus cycle.
    pub fn search_canvas<'a>(
        &mut self,
        canvas: &'a CanvasData,
    ) -> Result<Vec<&'a CanvasNode>, RelevanceError> {
        self.focused_node_offset = 0;
        if self.query.is_empty() {
            return Ok(Vec::new());
        }
        canvas.nodes_matching(&self.query)
    }

    /// Index of the next node to focus within a selection of `selection_len` nodes, cycling.
    pub fn next_focus_index(&mut self, selection_len: usize) -> Option<usize> {
        if selection_len == 0 {
            return None;
        }
        let idx = self.focused_node_offset % selection_len;
        self.focused_node_offset += 1;
        Some(idx)
    }
}

pub struct RelevanceSession {
    config: RelevanceConfig,
    registry: MatcherRegistry,
    store: ResultStore,
}

impl RelevanceSession {
    pub fn new(config: RelevanceConfig) -> Self {
        let registry = MatcherRegistry::new(&config);
        let store = ResultStore::new(RelevanceState::reset(None, registry.engines()));
        RelevanceSession {
            config,
            registry,
            store,
        }
    }

    pub fn config(&self) -> &RelevanceConfig {
        &self.config
    }

    pub fn registry(&self) -> &MatcherRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Resets the store for a newly focused document: no matches, every engine running.
    pub fn on_focus_changed(&self, path: Option<String>) {
        tracing::debug!("Focus changed to {:?}", path);
        self.store
            .set_state(RelevanceState::reset(path, self.registry.engines()));
    }

    /// Runs every applicable engine for `active_path` and merges each result set into the store
    /// as it arrives. Returns the engines that were dispatched.
    ///
    /// The free-text engine only runs for a non-empty query. Nothing runs without a focused
    /// document. Registered engines that are not dispatched are marked as not running, so the
    /// run is settled once the dispatched ones have merged.
    #[tracing::instrument(skip(self, corpus, view))]
    pub async fn run_relevance_engines<C: Corpus>(
        &self,
        corpus: &C,
        active_path: Option<&str>,
        view: &SearchView,
    ) -> Vec<EngineId> {
        let Some(active_path) = active_path else {
            tracing::info!("No active file path");
            return Vec::new();
        };

        let mut queries: Vec<(EngineId, String)> = Vec::new();
        if !view.query.is_empty() {
            queries.push((EngineId::ContainerText, view.query.clone()));
        }
        queries.push((EngineId::FocusedContainer, active_path.to_string()));

        let mut pending = FuturesUnordered::new();
        let mut dispatched = Vec::new();
        for (engine, query) in queries {
            let Some(matcher) = self.registry.get(engine) else {
                tracing::warn!("Engine {engine} is not registered");
                continue;
            };
            dispatched.push(engine);
            pending.push(async move {
                let matches = matcher.get_matches(corpus, &query).await;
                (engine, matches)
            });
        }

        // Focus the run's document and clear the running flag of every engine left out of it, in
        // one replacement, before any engine resolves.
        self.store.replace_if(|prev| {
            let mut next = prev.clone();
            next.current_focused_path = Some(active_path.to_string());
            for (engine, running) in next.running_engines.iter_mut() {
                if !dispatched.contains(engine) {
                    *running = false;
                }
            }
            (next != *prev).then_some(next)
        });

        while let Some((engine, matches)) = pending.next().await {
            self.merge_engine_results(engine, active_path, matches);
        }
        dispatched
    }

    fn merge_engine_results(&self, engine: EngineId, queried_for: &str, matches: Vec<MatchResult>) {
        let gate = self.config.gate_stale_results;
        let found = matches.len();
        let merged = self.store.replace_if(|prev| {
            if gate && prev.current_focused_path.as_deref() != Some(queried_for) {
                return None;
            }
            Some(prev.with_engine_results(engine, matches))
        });
        if merged {
            tracing::debug!("{engine} finished with {found} result(s)");
        } else {
            tracing::debug!("Dropping {found} stale {engine} result(s) for {queried_for}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_cycle_wraps_around_the_selection() {
        let mut view = SearchView::new("idea");
        assert_eq!(view.next_focus_index(0), None);
        let picks: Vec<Option<usize>> = (0..4).map(|_| view.next_focus_index(3)).collect();
        assert_eq!(picks, vec![Some(0), Some(1), Some(2), Some(0)]);
    }

    #[test]
    fn searching_a_canvas_restarts_the_cycle() {
        let canvas = CanvasData::parse(
            "board.canvas",
            r#"{"nodes":[
                {"id":"a","text":"First idea","x":0,"y":0,"width":1,"height":1},
                {"id":"b","file":"ideas/second.md","x":0,"y":0,"width":1,"height":1},
                {"id":"c","text":"unrelated","x":0,"y":0,"width":1,"height":1}]}"#,
        )
        .unwrap();
        let mut view = SearchView::new("IDEA");
        view.next_focus_index(5);
        let found: Vec<&str> = view
            .search_canvas(&canvas)
            .unwrap()
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(found, vec!["a", "b"]);
        assert_eq!(view.next_focus_index(2), Some(0));

        view.set_query("");
        assert!(view.search_canvas(&canvas).unwrap().is_empty());
    }

    #[tokio::test]
    async fn nothing_runs_without_a_focused_document() {
        let session = RelevanceSession::new(RelevanceConfig::default());
        let corpus = crate::corpus::MemoryCorpus::new();
        let ran = session
            .run_relevance_engines(&corpus, None, &SearchView::new("x"))
            .await;
        assert!(ran.is_empty());
        assert_eq!(session.store().get_state().current_focused_path, None);
    }
}
