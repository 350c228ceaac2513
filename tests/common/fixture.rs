//! Shared grammar libraries compiled on the fly.
//!
//! The languages are tables whose first field is the ABI version, which is
//! all tree-sitter reads for `Language::abi_version`.

use std::path::{Path, PathBuf};
use std::process::Command;

pub const PHPX_ABI: usize = 14;
pub const PHPX_ONLY_ABI: usize = 15;

const BOTH_ENTRY_POINTS: &str = r#"
static const unsigned int phpx_language[64] = {14};
static const unsigned int phpx_only_language[64] = {15};

const void *tree_sitter_phpx(void) { return phpx_language; }
const void *tree_sitter_phpx_only(void) { return phpx_only_language; }
"#;

const PHPX_ENTRY_POINT_ONLY: &str = r#"
static const unsigned int phpx_language[64] = {14};

const void *tree_sitter_phpx(void) { return phpx_language; }
"#;

fn target() -> String {
    let arch = std::env::consts::ARCH;
    if cfg!(target_os = "macos") {
        format!("{arch}-apple-darwin")
    } else {
        format!("{arch}-unknown-linux-gnu")
    }
}

/// Compile `source` into a shared library named `name` inside `dir`.
pub fn build_library(dir: &Path, name: &str, source: &str) -> PathBuf {
    let src = dir.join(format!("{name}.c"));
    std::fs::write(&src, source).unwrap();
    let lib_path = dir.join(libloading::library_filename(name));

    let target = target();
    let compiler = cc::Build::new()
        .opt_level(0)
        .debug(false)
        .cargo_metadata(false)
        .warnings(false)
        .host(&target)
        .target(&target)
        .get_compiler();

    let mut cmd: Command = compiler.to_command();
    cmd.args(["-shared", "-fPIC"])
        .arg("-o")
        .arg(&lib_path)
        .arg(&src);
    let output = cmd.output().expect("C compiler should run");
    assert!(
        output.status.success(),
        "compiling {} failed: {}",
        src.display(),
        String::from_utf8_lossy(&output.stderr)
    );
    lib_path
}

/// A grammar library exporting both entry points.
pub fn grammar_library(dir: &Path, name: &str) -> PathBuf {
    build_library(dir, name, BOTH_ENTRY_POINTS)
}

/// A grammar library missing `tree_sitter_phpx_only`.
pub fn phpx_only_missing_library(dir: &Path, name: &str) -> PathBuf {
    build_library(dir, name, PHPX_ENTRY_POINT_ONLY)
}
