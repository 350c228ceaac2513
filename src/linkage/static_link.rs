//! Grammars compiled into this crate by the build script.

use tree_sitter_language::LanguageFn;

use super::{GrammarLinkage, LinkError};
use crate::language::{GrammarFn, GrammarVariant};

extern "C" {
    fn tree_sitter_phpx() -> *const ();
    fn tree_sitter_phpx_only() -> *const ();
}

/// The tree-sitter [`LanguageFn`] for PHPX.
pub const LANGUAGE_PHPX: LanguageFn = unsafe { LanguageFn::from_raw(tree_sitter_phpx) };

/// The tree-sitter [`LanguageFn`] for PHPX-Only.
pub const LANGUAGE_PHPX_ONLY: LanguageFn = unsafe { LanguageFn::from_raw(tree_sitter_phpx_only) };

/// Linkage against the statically linked grammar symbols.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLinkage;

// SAFETY: the symbols are the generated parsers compiled in by the build
// script; their languages are static data of this binary.
unsafe impl GrammarLinkage for StaticLinkage {
    fn resolve(&self, variant: GrammarVariant) -> Result<GrammarFn, LinkError> {
        let entry: GrammarFn = match variant {
            GrammarVariant::Phpx => tree_sitter_phpx,
            GrammarVariant::PhpxOnly => tree_sitter_phpx_only,
        };
        Ok(entry)
    }

    fn describe(&self) -> String {
        "statically linked grammar".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phpx_grammar() {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&LANGUAGE_PHPX.into())
            .expect("Error loading PHPX parser");

        let code = r#"<?php echo "Hello, World!";"#;

        let tree = parser.parse(code, None).unwrap();
        assert!(!tree.root_node().has_error());
    }

    #[test]
    fn test_phpx_only_grammar() {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&LANGUAGE_PHPX_ONLY.into())
            .expect("Error loading PHPX-Only parser");

        let code = r#"echo "Hello, World!";"#;

        let tree = parser.parse(code, None).unwrap();
        assert!(!tree.root_node().has_error());
    }
}
