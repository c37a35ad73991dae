//! Observable state shared between the relevance engines and their consumers.
//!
//! [`ResultStore`] holds exactly one [`RelevanceState`]. Writers always hand over a complete new
//! state; there is no partial-field update. Every replacement notifies the subscribers
//! synchronously, in registration order, with `(new, previous)`.
//!
//! The store does not serialize writers beyond the replacement itself: two writers that each
//! build a new state from a snapshot they read earlier can overwrite each other. Writers that
//! derive the new state from the previous one should use [`ResultStore::replace`], which hands the
//! closure the state current at the moment of replacement.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::{
    error::RelevanceError,
    matcher::{EngineId, MatchResult},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceState {
    pub current_focused_path: Option<String>,
    /// Partitioned by engine; blocks ordered by engine name.
    pub matches_to_display: Vec<MatchResult>,
    pub running_engines: BTreeMap<EngineId, bool>,
}

impl RelevanceState {
    /// A fresh state for `focus` with every engine of `engines` marked running.
    pub fn reset<I>(focus: Option<String>, engines: I) -> Self
    where
        I: IntoIterator<Item = EngineId>,
    {
        RelevanceState {
            current_focused_path: focus,
            matches_to_display: Vec::new(),
            running_engines: engines.into_iter().map(|e| (e, true)).collect(),
        }
    }

    pub fn matches_for(&self, engine: EngineId) -> impl Iterator<Item = &MatchResult> {
        self.matches_to_display
            .iter()
            .filter(move |m| m.engine() == engine)
    }

    pub fn is_running(&self, engine: EngineId) -> bool {
        self.running_engines.get(&engine).copied().unwrap_or(false)
    }

    pub fn any_running(&self) -> bool {
        self.running_engines.values().any(|running| *running)
    }

    /// A copy of this state with `engine`'s block replaced by `matches` and the engine marked
    /// finished. Blocks are stably sorted by engine name, so results within a block keep the
    /// order the engine produced them in.
    pub fn with_engine_results(&self, engine: EngineId, matches: Vec<MatchResult>) -> Self {
        let mut next = self.clone();
        next.matches_to_display.retain(|m| m.engine() != engine);
        next.matches_to_display.extend(matches);
        next.matches_to_display.sort_by_key(|m| m.engine_name());
        next.running_engines.insert(engine, false);
        next
    }
}

impl Display for RelevanceState {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{} ({} connections)",
            self.current_focused_path.as_deref().unwrap_or("<none>"),
            self.matches_to_display.len()
        )
    }
}

/// Receives `(new, previous)` on every replacement.
pub type Listener =
    Arc<dyn Fn(&RelevanceState, &RelevanceState) -> Result<(), RelevanceError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct StoreInner {
    state: Mutex<Arc<RelevanceState>>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
}

#[derive(Clone, Default)]
pub struct ResultStore(Arc<StoreInner>);

impl ResultStore {
    pub fn new(initial: RelevanceState) -> Self {
        let store = ResultStore::default();
        *store.0.state.lock() = Arc::new(initial);
        store
    }

    pub fn get_state(&self) -> Arc<RelevanceState> {
        self.0.state.lock().clone()
    }

    /// Replaces the state with `new_state` and notifies subscribers.
    pub fn set_state(&self, new_state: RelevanceState) {
        self.replace(|_| new_state);
    }

    /// Replaces the state with the one `update` builds from the current state, then notifies
    /// subscribers. Subscriber errors are logged and do not affect other subscribers or later
    /// replacements.
    pub fn replace<F>(&self, update: F)
    where
        F: FnOnce(&RelevanceState) -> RelevanceState,
    {
        self.replace_if(|current| Some(update(current)));
    }

    /// Like [`replace`](Self::replace), but `update` may decline by returning `None`, in which case
    /// the state is left alone and nobody is notified. The decision is taken against the state
    /// current at the moment of replacement. Returns whether a replacement happened.
    pub fn replace_if<F>(&self, update: F) -> bool
    where
        F: FnOnce(&RelevanceState) -> Option<RelevanceState>,
    {
        let (next, previous) = {
            let mut guard = self.0.state.lock();
            let Some(next) = update(&**guard) else {
                return false;
            };
            let next = Arc::new(next);
            let previous = std::mem::replace(&mut *guard, next.clone());
            (next, previous)
        };
        let listeners: Vec<(SubscriptionId, Listener)> = self.0.listeners.lock().clone();
        for (id, listener) in listeners {
            if let Err(e) = listener(&next, &previous) {
                tracing::warn!("Subscriber {id:?} failed on state update: {e}");
            }
        }
        true
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&RelevanceState, &RelevanceState) -> Result<(), RelevanceError>
            + Send
            + Sync
            + 'static,
    {
        let id = SubscriptionId(self.0.next_id.fetch_add(1, Ordering::Relaxed));
        self.0.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.0.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{ContainerTextMatch, FocusedContainerMatch};

    fn text_match(path: &str) -> MatchResult {
        MatchResult::ContainerText(ContainerTextMatch {
            link: path.to_string(),
            match_display_text: path.to_string(),
            match_string: "q".to_string(),
            from_index: 0,
            to_index: 1,
        })
    }

    fn focused_match(canvas: &str) -> MatchResult {
        MatchResult::FocusedContainer(FocusedContainerMatch {
            link: "doc.md".to_string(),
            match_display_text: format!("doc.md is in {canvas}"),
            canvas_file: canvas.to_string(),
            node_id: "n".to_string(),
            edge_ids: vec![],
        })
    }

    #[test]
    fn subscribers_receive_paired_states_in_order() {
        let store = ResultStore::new(RelevanceState::default());
        let seen: Arc<Mutex<Vec<(usize, usize)>>> = Arc::default();
        let log = seen.clone();
        store.subscribe(move |new, prev| {
            log.lock()
                .push((new.matches_to_display.len(), prev.matches_to_display.len()));
            Ok(())
        });

        store.replace(|prev| RelevanceState {
            matches_to_display: vec![text_match("a.canvas")],
            ..prev.clone()
        });
        store.replace(|prev| RelevanceState {
            matches_to_display: vec![text_match("a.canvas"), text_match("b.canvas")],
            ..prev.clone()
        });

        assert_eq!(*seen.lock(), vec![(1, 0), (2, 1)]);
    }

    #[test]
    fn failing_subscriber_does_not_block_later_notifications() {
        let store = ResultStore::default();
        let calls = Arc::new(AtomicU64::new(0));
        let failing_calls = calls.clone();
        store.subscribe(move |_, _| {
            if failing_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(RelevanceError::Custom("first update rejected".to_string()))
            } else {
                Ok(())
            }
        });
        let after = Arc::new(AtomicU64::new(0));
        let after_calls = after.clone();
        store.subscribe(move |_, _| {
            after_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        store.set_state(RelevanceState::reset(Some("a.md".to_string()), EngineId::ALL));
        store.set_state(RelevanceState::reset(Some("b.md".to_string()), EngineId::ALL));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(after.load(Ordering::SeqCst), 2);
        assert_eq!(
            store.get_state().current_focused_path.as_deref(),
            Some("b.md")
        );
    }

    #[test]
    fn unsubscribed_listeners_are_not_called() {
        let store = ResultStore::default();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        let id = store.subscribe(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        store.set_state(RelevanceState::default());
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set_state(RelevanceState::default());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listeners_may_read_the_store() {
        let store = ResultStore::default();
        let reader = store.clone();
        let agreed = Arc::new(AtomicU64::new(0));
        let agreed_count = agreed.clone();
        store.subscribe(move |new, _| {
            if *reader.get_state() == *new {
                agreed_count.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        });
        store.set_state(RelevanceState::reset(None, EngineId::ALL));
        assert_eq!(agreed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn engine_results_replace_their_block_and_sort_by_engine_name() {
        let state = RelevanceState::reset(Some("doc.md".to_string()), EngineId::ALL)
            .with_engine_results(EngineId::ContainerText, vec![text_match("z.canvas")])
            .with_engine_results(
                EngineId::FocusedContainer,
                vec![focused_match("b.canvas"), focused_match("a.canvas")],
            )
            .with_engine_results(
                EngineId::ContainerText,
                vec![text_match("x.canvas"), text_match("y.canvas")],
            );

        let links: Vec<String> = state
            .matches_to_display
            .iter()
            .map(|m| match m {
                MatchResult::ContainerText(t) => t.link.clone(),
                MatchResult::FocusedContainer(c) => c.canvas_file.clone(),
            })
            .collect();
        assert_eq!(links, vec!["b.canvas", "a.canvas", "x.canvas", "y.canvas"]);
        assert!(!state.any_running());
        assert_eq!(state.to_string(), "doc.md (4 connections)");
    }

    #[test]
    fn merging_leaves_the_previous_state_untouched() {
        let before = RelevanceState::reset(None, EngineId::ALL)
            .with_engine_results(EngineId::ContainerText, vec![text_match("a.canvas")]);
        let after = before.with_engine_results(EngineId::ContainerText, vec![]);
        assert_eq!(before.matches_to_display.len(), 1);
        assert!(after.matches_to_display.is_empty());
        assert!(before.is_running(EngineId::FocusedContainer));
    }

    #[test]
    fn declined_replacements_keep_the_state_and_stay_silent() {
        let store = ResultStore::new(RelevanceState::reset(
            Some("a.md".to_string()),
            EngineId::ALL,
        ));
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        store.subscribe(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let replaced = store.replace_if(|current| {
            (current.current_focused_path.as_deref() == Some("b.md")).then(RelevanceState::default)
        });
        assert!(!replaced);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.get_state().current_focused_path.as_deref(), Some("a.md"));

        assert!(store.replace_if(|current| {
            Some(current.with_engine_results(EngineId::ContainerText, vec![]))
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!store.get_state().is_running(EngineId::ContainerText));
    }
}
