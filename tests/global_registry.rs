// The process-wide registry lives in its own test binary: the first
// initialization wins for the rest of the process.

#![cfg(not(feature = "static-grammar"))]

mod common;

use std::path::PathBuf;
use tree_sitter_phpx::{GrammarConfig, GrammarRegistry, LinkError};

#[test]
fn test_failed_global_load_is_cached() {
    common::tracing::init_tracing_from_env();

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("libtree-sitter-phpx-missing.so");
    let config = GrammarConfig {
        library: Some(missing.clone()),
        ..Default::default()
    };

    let expected = LinkError::LibraryNotFound(vec![missing]);
    assert_eq!(GrammarRegistry::init_global(&config).unwrap_err(), expected);

    // Later callers see the first outcome, whatever config they pass
    let other = GrammarConfig {
        library: Some(PathBuf::from("/elsewhere/libtree-sitter-phpx.so")),
        ..Default::default()
    };
    assert_eq!(GrammarRegistry::init_global(&other).unwrap_err(), expected);
    assert_eq!(GrammarRegistry::global().unwrap_err(), expected);
}
