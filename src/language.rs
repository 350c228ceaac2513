//! Grammar variants and the opaque handles that point at them.

use std::fmt;
use std::ptr::NonNull;
use std::str::FromStr;

use tree_sitter_language::LanguageFn;

/// Entry point exported by a compiled grammar: returns its `TSLanguage`.
pub type GrammarFn = unsafe extern "C" fn() -> *const ();

/// The grammar variants shipped by the phpx grammar package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarVariant {
    /// PHPX embedded in templates (`<?php ... ?>` regions).
    Phpx,
    /// Bare PHPX source without the template wrapper.
    PhpxOnly,
}

impl GrammarVariant {
    /// All variants, in export order.
    pub const ALL: [GrammarVariant; 2] = [GrammarVariant::Phpx, GrammarVariant::PhpxOnly];

    /// Name under which the variant is exported.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Phpx => "phpx",
            Self::PhpxOnly => "phpx_only",
        }
    }

    /// Symbol of the grammar entry point in the native library.
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Phpx => "tree_sitter_phpx",
            Self::PhpxOnly => "tree_sitter_phpx_only",
        }
    }
}

impl fmt::Display for GrammarVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GrammarVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "phpx" => Ok(Self::Phpx),
            "phpx_only" => Ok(Self::PhpxOnly),
            _ => Err(format!("unknown grammar variant: {s}")),
        }
    }
}

/// Opaque reference to a compiled grammar owned by the native library.
///
/// The pointee is never read or copied here; the handle only carries the
/// address through to consumers that understand it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageHandle(NonNull<()>);

// SAFETY: a handle points at a grammar's static, immutable parse tables.
unsafe impl Send for LanguageHandle {}
unsafe impl Sync for LanguageHandle {}

impl LanguageHandle {
    /// Wrap a raw grammar pointer, rejecting null.
    pub fn from_raw(ptr: *const ()) -> Option<Self> {
        NonNull::new(ptr as *mut ()).map(Self)
    }

    pub fn as_ptr(self) -> *const () {
        self.0.as_ptr()
    }

    pub(crate) fn as_non_null(self) -> NonNull<()> {
        self.0
    }

    pub(crate) fn from_non_null(ptr: NonNull<()>) -> Self {
        Self(ptr)
    }
}

impl fmt::Debug for LanguageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LanguageHandle({:p})", self.0)
    }
}

/// A resolved grammar variant: its handle and the entry point it came from.
#[derive(Debug, Clone, Copy)]
pub struct NamedGrammarEntry {
    pub variant: GrammarVariant,
    pub handle: LanguageHandle,
    entry: GrammarFn,
}

impl NamedGrammarEntry {
    pub(crate) fn new(variant: GrammarVariant, handle: LanguageHandle, entry: GrammarFn) -> Self {
        Self {
            variant,
            handle,
            entry,
        }
    }

    pub fn name(&self) -> &'static str {
        self.variant.name()
    }

    /// The entry point as a tree-sitter [`LanguageFn`].
    pub fn language_fn(&self) -> LanguageFn {
        // SAFETY: `entry` came from a `GrammarLinkage`, whose contract makes it
        // a grammar entry point, and returned a non-null language at load.
        unsafe { LanguageFn::from_raw(self.entry) }
    }

    /// Build a [`tree_sitter::Language`] for use with a parser.
    pub fn language(&self) -> tree_sitter::Language {
        tree_sitter::Language::new(self.language_fn())
    }
}
