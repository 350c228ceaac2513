fn main() {
    println!("cargo:rerun-if-env-changed=PHPX_GRAMMAR_SRC");

    #[cfg(feature = "static-grammar")]
    compile_grammars();
}

/// Compile both grammar variants into the crate.
///
/// `PHPX_GRAMMAR_SRC` points at the grammar checkout, which holds `php/src`
/// and `php_only/src`, each with a generated `parser.c` and a `scanner.c`.
#[cfg(feature = "static-grammar")]
fn compile_grammars() {
    use std::path::PathBuf;

    let root = match std::env::var_os("PHPX_GRAMMAR_SRC") {
        Some(root) => PathBuf::from(root),
        None => panic!("the static-grammar feature needs PHPX_GRAMMAR_SRC to point at the grammar sources"),
    };

    for (dir, lib) in [("php", "tree-sitter-phpx"), ("php_only", "tree-sitter-phpx-only")] {
        let src = root.join(dir).join("src");
        let mut build = cc::Build::new();
        build.std("c11").include(&src).warnings(false);
        for file in ["parser.c", "scanner.c"] {
            let path = src.join(file);
            println!("cargo:rerun-if-changed={}", path.display());
            build.file(path);
        }
        build.compile(lib);
    }
}
