//! # relevance-core
//!
//! A connection-graph engine for note corpora.
//!
//! ## Overview
//!
//! relevance-core indexes the relationships among the documents of a corpus and the canvas
//! files (node/edge graphs) that arrange them. On top of that index it offers:
//!
//! - **Connection extraction**: front-matter list items and `[[wikilinks]]` per document
//! - **Container indexing**: which canvases mention a key, which canvases reference a document
//! - **Relevance engines**: independent asynchronous matchers whose results merge into a shared,
//!   observable [`store::ResultStore`]
//! - **Orphan analysis**: documents that nothing structurally connects
//!
//! ## Architecture
//!
//! - **[`corpus`]**: the [`corpus::Corpus`] seam (enumerate, read on demand) with in-memory and
//!   filesystem implementations
//! - **[`connections`]**: per-document [`connections::ConnectionTracker`]s
//! - **[`canvas`]**: container format, node mapping and reference lookup
//! - **[`matcher`]**: [`matcher::MatchResult`], the engines and their registry
//! - **[`store`]**: [`store::RelevanceState`] and the subscriber-notifying store
//! - **[`engine`]**: [`engine::RelevanceSession`], which runs the engines against the store
//! - **[`orphans`]**: orphan detection
//! - **[`navigation`]**: the host navigation sink and highlight helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relevance_core::{
//!     config::RelevanceConfig,
//!     corpus::FsCorpus,
//!     engine::{RelevanceSession, SearchView},
//!     orphans::analyze_orphans,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let corpus = FsCorpus::new("./vault")?;
//!     let session = RelevanceSession::new(RelevanceConfig::default());
//!
//!     session.store().subscribe(|new, _previous| {
//!         println!("{new}");
//!         Ok(())
//!     });
//!
//!     let view = SearchView::new("roadmap");
//!     session
//!         .run_relevance_engines(&corpus, Some("projects/roadmap.md"), &view)
//!         .await;
//!
//!     for orphan in analyze_orphans(&corpus, session.config()).await {
//!         println!("orphan: {}", orphan.path);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Model
//!
//! Reads and container parses fail per document. A failing document or canvas is logged and left
//! out of the aggregate; it never aborts the surrounding fan-out and never reaches the store.

pub mod canvas;
pub mod config;
pub mod connections;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod navigation;
pub mod orphans;
pub mod store;
#[cfg(test)]
mod tests;

pub use error::*;
