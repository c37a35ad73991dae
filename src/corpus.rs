//! Access to the document corpus.
//!
//! The engine never owns documents. It enumerates them through a [`Corpus`] and reads content on
//! demand; nothing is cached between queries, so every analysis sees the current storage state.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryCorpus`] - an ordered in-memory map, used by hosts that already hold content and by
//!   tests (entries can be marked unreadable to exercise per-document failure isolation).
//! - [`FsCorpus`] - a directory tree walked with `walkdir` and read with `tokio::fs`.

use parking_lot::RwLock;
use std::{
    collections::BTreeMap,
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};
use walkdir::WalkDir;

use crate::{config::is_container_path, error::RelevanceError};

/// A corpus text unit. The path is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Document {
    pub path: String,
}

impl Document {
    pub fn new(path: impl Into<String>) -> Self {
        Document { path: path.into() }
    }
}

pub trait Corpus: Sync {
    /// All documents in natural iteration order.
    fn documents(&self) -> Vec<Document>;

    /// Raw text of a document. Fails with [`RelevanceError::Read`] if missing or unreadable.
    fn read(&self, path: &str) -> impl Future<Output = Result<String, RelevanceError>> + Send;

    /// Documents whose extension marks them as containers.
    fn containers(&self, extension: &str) -> Vec<Document> {
        self.documents()
            .into_iter()
            .filter(|doc| is_container_path(&doc.path, extension))
            .collect()
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Text(String),
    Unreadable(String),
}

/// In-memory corpus, iterated in path order.
///
/// Cloning shares the underlying storage, so a test can mutate the corpus while an engine run
/// holds a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus(Arc<RwLock<BTreeMap<String, Entry>>>);

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents<I, P, T>(docs: I) -> Self
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<String>,
        T: Into<String>,
    {
        let corpus = Self::new();
        for (path, text) in docs {
            corpus.insert(path, text);
        }
        corpus
    }

    pub fn insert(&self, path: impl Into<String>, text: impl Into<String>) {
        self.0.write().insert(path.into(), Entry::Text(text.into()));
    }

    /// Registers a document that is enumerated but fails every read.
    pub fn insert_unreadable(&self, path: impl Into<String>, reason: impl Into<String>) {
        self.0
            .write()
            .insert(path.into(), Entry::Unreadable(reason.into()));
    }

    pub fn remove(&self, path: &str) -> bool {
        self.0.write().remove(path).is_some()
    }
}

impl Corpus for MemoryCorpus {
    fn documents(&self) -> Vec<Document> {
        self.0.read().keys().map(Document::new).collect()
    }

    fn read(&self, path: &str) -> impl Future<Output = Result<String, RelevanceError>> + Send {
        let result = match self.0.read().get(path) {
            Some(Entry::Text(text)) => Ok(text.clone()),
            Some(Entry::Unreadable(reason)) => Err(RelevanceError::read(path, reason)),
            None => Err(RelevanceError::read(path, "no such document")),
        };
        async move { result }
    }
}

/// A corpus rooted at a directory. Paths are root-relative and `/`-separated.
#[derive(Debug, Clone)]
pub struct FsCorpus {
    root: PathBuf,
}

impl FsCorpus {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, RelevanceError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(RelevanceError::NotFound(format!(
                "Corpus root is not a directory: {root:?}"
            )));
        }
        Ok(FsCorpus { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative_path(&self, path: &Path) -> Result<String, RelevanceError> {
        let rel = path.strip_prefix(&self.root)?;
        Ok(rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"))
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
}

impl Corpus for FsCorpus {
    fn documents(&self) -> Vec<Document> {
        let mut docs = Vec::new();
        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable corpus entry: {}", RelevanceError::from(e));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match self.relative_path(entry.path()) {
                Ok(path) => docs.push(Document::new(path)),
                Err(e) => tracing::warn!("Skipping {:?}: {}", entry.path(), e),
            }
        }
        docs
    }

    fn read(&self, path: &str) -> impl Future<Output = Result<String, RelevanceError>> + Send {
        let full_path = self.root.join(path);
        let path = path.to_string();
        async move {
            tracing::debug!("Reading {:?}", full_path);
            tokio::fs::read_to_string(&full_path)
                .await
                .map_err(|e| RelevanceError::read(path, e))
        }
    }
}
