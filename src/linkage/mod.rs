//! The native linkage boundary.
//!
//! A linkage resolves the grammar entry points (`tree_sitter_phpx`,
//! `tree_sitter_phpx_only`) exported by the compiled grammar. They can come
//! from the grammar compiled into this crate (`static-grammar` feature) or
//! from a shared library opened at runtime.

mod dynamic;
#[cfg(feature = "static-grammar")]
mod static_link;

pub use dynamic::{find_library, DynamicLinkage};
#[cfg(feature = "static-grammar")]
pub use static_link::{StaticLinkage, LANGUAGE_PHPX, LANGUAGE_PHPX_ONLY};

use std::fmt;
use std::path::PathBuf;

use crate::config::GrammarConfig;
use crate::language::{GrammarFn, GrammarVariant};

/// Source of grammar entry points.
///
/// # Safety
///
/// Every function returned by `resolve` must be a tree-sitter grammar entry
/// point: callable with no arguments, without side effects, and returning
/// either null or a pointer to a `TSLanguage` that stays valid for the rest
/// of the process. The registry calls the functions and hands their results
/// to tree-sitter, so whatever backs them (a loaded library, for instance)
/// must never be unloaded.
///
/// Implementing it requires `unsafe impl`:
///
/// ```compile_fail
/// use tree_sitter_phpx::{GrammarFn, GrammarLinkage, GrammarVariant, LinkError};
///
/// struct Anything;
///
/// impl GrammarLinkage for Anything {
///     fn resolve(&self, variant: GrammarVariant) -> Result<GrammarFn, LinkError> {
///         Err(LinkError::NullLanguage(variant.symbol()))
///     }
///
///     fn describe(&self) -> String {
///         String::new()
///     }
/// }
/// ```
pub unsafe trait GrammarLinkage: Send + Sync {
    /// Resolve the entry point of a grammar variant.
    fn resolve(&self, variant: GrammarVariant) -> Result<GrammarFn, LinkError>;

    /// Human-readable description of where the grammars come from.
    fn describe(&self) -> String;
}

/// Load-time linkage failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// No grammar library in any of the searched locations.
    LibraryNotFound(Vec<PathBuf>),
    /// The library exists but could not be opened.
    Load { path: PathBuf, message: String },
    /// The library does not export a grammar entry point.
    MissingSymbol {
        symbol: &'static str,
        message: String,
    },
    /// A grammar entry point returned a null language.
    NullLanguage(&'static str),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::LibraryNotFound(searched) => {
                write!(f, "grammar library not found (searched ")?;
                for (i, path) in searched.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", path.display())?;
                }
                write!(f, ")")
            }
            LinkError::Load { path, message } => {
                write!(f, "failed to load grammar library {}: {message}", path.display())
            }
            LinkError::MissingSymbol { symbol, message } => {
                write!(f, "grammar library missing symbol {symbol}: {message}")
            }
            LinkError::NullLanguage(symbol) => {
                write!(f, "grammar entry point {symbol} returned a null language")
            }
        }
    }
}

impl std::error::Error for LinkError {}

/// Linkage over entry points the embedder already has, for instance from a
/// grammar crate linked into the final binary.
#[derive(Debug, Clone, Copy)]
pub struct EntryPointLinkage {
    phpx: GrammarFn,
    phpx_only: GrammarFn,
}

impl EntryPointLinkage {
    /// # Safety
    ///
    /// `phpx` and `phpx_only` must meet the entry point contract of
    /// [`GrammarLinkage`]: no arguments, and a null or process-lifetime
    /// `TSLanguage` pointer as result.
    ///
    /// ```compile_fail
    /// unsafe extern "C" fn entry() -> *const () {
    ///     std::ptr::null()
    /// }
    ///
    /// let _ = tree_sitter_phpx::EntryPointLinkage::new(entry, entry);
    /// ```
    pub unsafe fn new(phpx: GrammarFn, phpx_only: GrammarFn) -> Self {
        Self { phpx, phpx_only }
    }
}

// SAFETY: the entry points were vouched for by the caller of `new`.
unsafe impl GrammarLinkage for EntryPointLinkage {
    fn resolve(&self, variant: GrammarVariant) -> Result<GrammarFn, LinkError> {
        Ok(match variant {
            GrammarVariant::Phpx => self.phpx,
            GrammarVariant::PhpxOnly => self.phpx_only,
        })
    }

    fn describe(&self) -> String {
        "embedder-provided entry points".to_string()
    }
}

/// The linkage used when the caller does not pick one.
///
/// The compiled-in grammar when `static-grammar` is enabled, otherwise the
/// shared library located through `config`.
pub fn default_linkage(config: &GrammarConfig) -> Result<Box<dyn GrammarLinkage>, LinkError> {
    #[cfg(feature = "static-grammar")]
    {
        let _ = config;
        Ok(Box::new(StaticLinkage))
    }
    #[cfg(not(feature = "static-grammar"))]
    {
        let path = find_library(config)?;
        Ok(Box::new(DynamicLinkage::open(&path)?))
    }
}
