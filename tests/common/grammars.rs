//! Stand-in grammar entry points.
//!
//! Each returns the address of its own static, so tests get two distinct,
//! stable, non-null pointers without a compiled grammar.

use tree_sitter_phpx::{EntryPointLinkage, GrammarRegistry};

pub static P1: u64 = 0x5048_5058;
pub static P2: u64 = 0x5048_5058_4f4e;

pub unsafe extern "C" fn phpx_entry() -> *const () {
    &P1 as *const u64 as *const ()
}

pub unsafe extern "C" fn phpx_only_entry() -> *const () {
    &P2 as *const u64 as *const ()
}

pub unsafe extern "C" fn null_entry() -> *const () {
    std::ptr::null()
}

pub fn p1() -> *const () {
    &P1 as *const u64 as *const ()
}

pub fn p2() -> *const () {
    &P2 as *const u64 as *const ()
}

pub fn linkage() -> EntryPointLinkage {
    // SAFETY: the stand-ins return static addresses; tests only export and
    // compare them and never build a `tree_sitter::Language` from them.
    unsafe { EntryPointLinkage::new(phpx_entry, phpx_only_entry) }
}

pub fn registry() -> GrammarRegistry {
    super::tracing::init_tracing_from_env();
    GrammarRegistry::load(Box::new(linkage())).expect("stand-in grammars always load")
}
