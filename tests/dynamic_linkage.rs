// Dynamic linkage against real shared libraries built by the tests

#![cfg(unix)]

mod common;

use common::fixture;
use tree_sitter_phpx::linkage::DynamicLinkage;
use tree_sitter_phpx::{GrammarConfig, GrammarRegistry, GrammarVariant, LinkError};

#[test]
fn test_open_resolves_both_entry_points() {
    common::tracing::init_tracing_from_env();
    let dir = tempfile::tempdir().unwrap();
    let path = fixture::grammar_library(dir.path(), "phpx-both");

    let linkage = DynamicLinkage::open(&path).unwrap();
    assert_eq!(linkage.path(), path.as_path());

    let registry = GrammarRegistry::load(Box::new(linkage)).unwrap();
    let phpx = registry.get(GrammarVariant::Phpx).handle;
    let phpx_only = registry.get(GrammarVariant::PhpxOnly).handle;
    assert!(!phpx.as_ptr().is_null());
    assert!(!phpx_only.as_ptr().is_null());
    assert_ne!(phpx, phpx_only);

    assert_eq!(
        registry.language(GrammarVariant::Phpx).abi_version(),
        fixture::PHPX_ABI
    );
    assert_eq!(
        registry.language(GrammarVariant::PhpxOnly).abi_version(),
        fixture::PHPX_ONLY_ABI
    );
}

#[test]
fn test_missing_entry_point_is_missing_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture::phpx_only_missing_library(dir.path(), "phpx-partial");

    match DynamicLinkage::open(&path) {
        Err(LinkError::MissingSymbol { symbol, .. }) => {
            assert_eq!(symbol, "tree_sitter_phpx_only");
        }
        Err(other) => panic!("expected MissingSymbol, got {}", other),
        Ok(_) => panic!("library without tree_sitter_phpx_only should not link"),
    }
}

#[test]
fn test_languages_outlive_the_registry() {
    let dir = tempfile::tempdir().unwrap();
    let path = fixture::grammar_library(dir.path(), "phpx-outlive");

    let registry = GrammarRegistry::load(Box::new(DynamicLinkage::open(&path).unwrap())).unwrap();
    let language = registry.language(GrammarVariant::Phpx);
    let exports = registry.exports().unwrap();
    let handle = registry.get(GrammarVariant::PhpxOnly).handle;
    drop(registry);

    assert_eq!(language.abi_version(), fixture::PHPX_ABI);
    assert_eq!(exports.language("phpx_only").unwrap(), handle);
    // SAFETY: the fixture's languages are u32 tables; the library stays mapped.
    let abi = unsafe { *(handle.as_ptr() as *const u32) };
    assert_eq!(abi as usize, fixture::PHPX_ONLY_ABI);
}

#[cfg(not(feature = "static-grammar"))]
#[test]
fn test_registry_from_config_finds_library_in_search_path() {
    let dir = tempfile::tempdir().unwrap();
    fixture::grammar_library(dir.path(), "phpx-searched");

    let config = GrammarConfig {
        search_paths: vec![dir.path().to_path_buf()],
        library_name: "phpx-searched".to_string(),
        ..Default::default()
    };
    let registry = GrammarRegistry::from_config(&config).unwrap();
    assert!(registry.describe().contains("phpx-searched"));
    assert_eq!(registry.exports().unwrap().len(), 2);
}
