//! Grammar entry points resolved from a shared library with dlopen.
//!
//! Lets the registry work with a grammar built separately (for example by
//! `tree-sitter build`) without linking it into the binary.

use libloading::{Library, Symbol};
use std::mem::ManuallyDrop;
use std::path::{Path, PathBuf};

use super::{GrammarLinkage, LinkError};
use crate::config::GrammarConfig;
use crate::language::{GrammarFn, GrammarVariant};

/// A loaded grammar library and its resolved entry points.
///
/// The library is never unloaded. Handles, exported externals and
/// `tree_sitter::Language` values built from it are plain pointers into its
/// data, so it stays mapped for the rest of the process even after the
/// linkage (or the registry owning it) is dropped.
pub struct DynamicLinkage {
    path: PathBuf,
    phpx: GrammarFn,
    phpx_only: GrammarFn,
    _library: ManuallyDrop<Library>,
}

impl DynamicLinkage {
    /// Open the library at `path` and resolve both grammar entry points.
    pub fn open(path: &Path) -> Result<Self, LinkError> {
        tracing::debug!("Loading grammar library {:?}", path);

        // SAFETY: loading a tree-sitter grammar runs no initialization code
        // beyond the C runtime's.
        let library = unsafe { Library::new(path) }.map_err(|e| LinkError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let phpx = resolve_symbol(&library, GrammarVariant::Phpx)?;
        let phpx_only = resolve_symbol(&library, GrammarVariant::PhpxOnly)?;

        tracing::debug!("Resolved grammar entry points from {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
            phpx,
            phpx_only,
            _library: ManuallyDrop::new(library),
        })
    }

    /// Locate the library through `config` and open it.
    pub fn from_config(config: &GrammarConfig) -> Result<Self, LinkError> {
        Self::open(&find_library(config)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn resolve_symbol(library: &Library, variant: GrammarVariant) -> Result<GrammarFn, LinkError> {
    let symbol = variant.symbol();

    // SAFETY: tree-sitter grammar entry points take no arguments and return
    // a `const TSLanguage *`.
    let entry: Symbol<GrammarFn> =
        unsafe { library.get(symbol.as_bytes()) }.map_err(|e| LinkError::MissingSymbol {
            symbol,
            message: e.to_string(),
        })?;
    Ok(*entry)
}

// SAFETY: the entry points are plain function pointers into a library that
// is never unloaded.
unsafe impl Send for DynamicLinkage {}
unsafe impl Sync for DynamicLinkage {}

// SAFETY: the symbols are looked up by their grammar names, which a
// tree-sitter grammar library exports as its `TSLanguage` entry points. The
// library is never unloaded, so the returned languages stay valid.
unsafe impl GrammarLinkage for DynamicLinkage {
    fn resolve(&self, variant: GrammarVariant) -> Result<GrammarFn, LinkError> {
        Ok(match variant {
            GrammarVariant::Phpx => self.phpx,
            GrammarVariant::PhpxOnly => self.phpx_only,
        })
    }

    fn describe(&self) -> String {
        format!("dynamic library {}", self.path.display())
    }
}

/// Find the grammar library.
///
/// An explicit `library` path wins; otherwise the first search directory
/// containing the platform library file name.
pub fn find_library(config: &GrammarConfig) -> Result<PathBuf, LinkError> {
    if let Some(library) = &config.library {
        if library.is_file() {
            return Ok(library.clone());
        }
        tracing::debug!("Configured grammar library {:?} does not exist", library);
        return Err(LinkError::LibraryNotFound(vec![library.clone()]));
    }

    let file_name = config.library_file_name();
    let dirs = config.grammar_search_paths();
    for dir in &dirs {
        let candidate = dir.join(&file_name);
        tracing::trace!("Trying grammar library path: {:?}", candidate);
        if candidate.is_file() {
            tracing::debug!("Found grammar library at {:?}", candidate);
            return Ok(candidate);
        }
    }

    tracing::debug!("Grammar library {:?} not found in any search path", file_name);
    Err(LinkError::LibraryNotFound(dirs))
}
