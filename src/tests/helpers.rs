//! Shared test utilities for corpus-level tests

use std::{collections::HashMap, future::Future, time::Duration};

use crate::{
    corpus::{Corpus, Document, MemoryCorpus},
    error::RelevanceError,
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Canvas JSON with one file node per entry of `files` and no edges.
pub fn canvas_with_files(files: &[&str]) -> String {
    let nodes: Vec<String> = files
        .iter()
        .enumerate()
        .map(|(idx, file)| {
            format!(
                r#"{{"id":"f{idx}","type":"file","file":"{file}","x":0,"y":0,"width":10,"height":10}}"#
            )
        })
        .collect();
    format!(r#"{{"nodes":[{}],"edges":[]}}"#, nodes.join(","))
}

/// Canvas JSON with one text node per entry of `texts`.
pub fn canvas_with_texts(texts: &[&str]) -> String {
    let nodes: Vec<String> = texts
        .iter()
        .enumerate()
        .map(|(idx, text)| {
            format!(
                r#"{{"id":"t{idx}","type":"text","text":"{text}","x":0,"y":0,"width":10,"height":10}}"#
            )
        })
        .collect();
    format!(r#"{{"nodes":[{}],"edges":[]}}"#, nodes.join(","))
}

/// Wraps a [`MemoryCorpus`], delaying reads of selected paths.
#[derive(Clone, Default)]
pub struct DelayedCorpus {
    pub inner: MemoryCorpus,
    pub delays: HashMap<String, Duration>,
}

impl DelayedCorpus {
    pub fn new(inner: MemoryCorpus) -> Self {
        DelayedCorpus {
            inner,
            delays: HashMap::new(),
        }
    }

    pub fn delay(mut self, path: &str, millis: u64) -> Self {
        self.delays
            .insert(path.to_string(), Duration::from_millis(millis));
        self
    }
}

impl Corpus for DelayedCorpus {
    fn documents(&self) -> Vec<Document> {
        self.inner.documents()
    }

    fn read(&self, path: &str) -> impl Future<Output = Result<String, RelevanceError>> + Send {
        let delay = self.delays.get(path).copied();
        let read = self.inner.read(path);
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            read.await
        }
    }
}
