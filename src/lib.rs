//! phpx grammars for tree-sitter hosts.
//!
//! The crate resolves the two compiled phpx grammars (`phpx` and the
//! PHP-only `phpx_only`), wraps them as opaque handles and publishes them
//! into host export objects, each stamped with [`LANGUAGE_TYPE_TAG`] so a
//! host can check a value really is a grammar before using it.
//!
//! ```no_run
//! use tree_sitter_phpx::{GrammarRegistry, GrammarVariant};
//!
//! let registry = GrammarRegistry::global()?;
//! let mut parser = tree_sitter::Parser::new();
//! parser
//!     .set_language(&registry.language(GrammarVariant::Phpx))
//!     .expect("Error loading phpx grammar");
//! let tree = parser.parse("<?php echo 1;", None).unwrap();
//! assert!(!tree.root_node().has_error());
//! # Ok::<(), tree_sitter_phpx::LinkError>(())
//! ```

pub mod config;
pub mod host;
pub mod language;
pub mod linkage;
pub mod registry;
pub mod type_tag;

#[cfg(feature = "runtime")]
pub mod tracing_setup;

pub use config::{ConfigError, GrammarConfig};
pub use host::{language_from_external, ExportTarget, External, HostError, HostObject, HostValue};
pub use language::{GrammarFn, GrammarVariant, LanguageHandle, NamedGrammarEntry};
pub use linkage::{EntryPointLinkage, GrammarLinkage, LinkError};
pub use registry::GrammarRegistry;
pub use type_tag::{TypeTag, LANGUAGE_TYPE_TAG};

#[cfg(feature = "static-grammar")]
pub use linkage::{LANGUAGE_PHPX, LANGUAGE_PHPX_ONLY};
