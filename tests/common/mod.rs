//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Create a small vault:
///
/// ```text
/// vault/
///   ├── boards/planning.canvas  -> file nodes for projects/Foo.md and notes/hub.md, one text node
///   ├── boards/archive.canvas   -> file node for projects/Foo.md
///   ├── boards/sketch.canvas    -> a text node only
///   ├── boards/broken.canvas    -> not JSON
///   ├── notes/hub.md            -> front-matter tags and a wikilink
///   ├── notes/stray.md          -> nothing
///   └── projects/Foo.md         -> a wikilink
/// ```
///
/// Returns the vault root.
#[allow(dead_code)]
pub fn create_test_vault(temp_dir: &TempDir) -> PathBuf {
    let root = temp_dir.path().join("vault");
    std::fs::create_dir(&root).unwrap();

    write(
        &root,
        "boards/planning.canvas",
        r#"{
  "nodes": [
    {"id": "p1", "type": "file", "file": "projects/Foo.md", "x": 0, "y": 0, "width": 400, "height": 300},
    {"id": "p2", "type": "file", "file": "notes/hub.md", "x": 500, "y": 0, "width": 400, "height": 300},
    {"id": "p3", "type": "text", "text": "Quarterly goals", "x": 0, "y": 400, "width": 250, "height": 60}
  ],
  "edges": [
    {"id": "pe1", "fromNode": "p3", "toNode": "p1", "toSide": "top"},
    {"id": "pe2", "fromNode": "p1", "toNode": "p2"}
  ]
}"#,
    );
    write(
        &root,
        "boards/archive.canvas",
        r#"{"nodes":[{"id":"a1","type":"file","file":"projects/Foo.md","x":0,"y":0,"width":400,"height":300}],"edges":[]}"#,
    );
    write(
        &root,
        "boards/sketch.canvas",
        r#"{"nodes":[{"id":"s1","type":"text","text":"loose thought","x":0,"y":0,"width":100,"height":100}],"edges":[]}"#,
    );
    write(&root, "boards/broken.canvas", "{ this is not json");
    write(
        &root,
        "notes/hub.md",
        "---\n- planning\n- weekly\n---\n# Hub\n\nSee [[Foo]] and [[Roadmap]].\n",
    );
    write(&root, "notes/stray.md", "# Stray\n\nNothing links here.\n");
    write(&root, "projects/Foo.md", "# Foo\n\nBack to [[hub]].\n");

    root
}
