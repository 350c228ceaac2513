use anyhow::{Context, Result as AnyhowResult};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tree_sitter_phpx::linkage::find_library;
use tree_sitter_phpx::tracing_setup;
use tree_sitter_phpx::{
    GrammarConfig, GrammarRegistry, GrammarVariant, HostObject, LANGUAGE_TYPE_TAG,
};

/// Inspect and exercise the phpx tree-sitter grammars
#[derive(Parser, Debug)]
#[command(name = "phpx-grammar")]
#[command(about = "Load the phpx grammars and check their tagged exports", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Grammar shared library to load, bypassing the search paths
    #[arg(long, value_name = "PATH", global = true)]
    library: Option<PathBuf>,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    /// Log resolution steps (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the export surface as JSON
    Exports,
    /// Initialize exports and tag-check every grammar handle
    Verify,
    /// Print the grammar type tag
    Tag,
    /// Print the config file location and grammar library search paths
    Paths,
    /// Print the JSON schema of the config file
    Schema,
    /// Parse a file and print its syntax tree
    Parse {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Grammar variant (phpx or phpx_only)
        #[arg(long, default_value = "phpx")]
        variant: GrammarVariant,
    },
    /// Evaluate a JavaScript expression with the grammars installed as `phpx`
    #[cfg(feature = "plugins")]
    Eval {
        #[arg(value_name = "EXPR")]
        expr: String,
    },
}

fn load_config(args: &Args) -> AnyhowResult<GrammarConfig> {
    let mut config = GrammarConfig::load(args.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load grammar config: {}", e))?;
    if let Some(library) = &args.library {
        config.library = Some(library.clone());
    }
    Ok(config)
}

fn load_registry(config: &GrammarConfig) -> AnyhowResult<GrammarRegistry> {
    GrammarRegistry::from_config(config).context("Failed to load phpx grammars")
}

fn print_exports(registry: &GrammarRegistry) -> AnyhowResult<()> {
    let exports = registry.exports().context("Failed to initialize exports")?;
    println!("{}", serde_json::to_string_pretty(&exports)?);
    Ok(())
}

fn verify(registry: &GrammarRegistry) -> AnyhowResult<()> {
    let exports = registry.exports().context("Failed to initialize exports")?;
    check_exports(registry, &exports)?;
    println!("all grammar handles carry {}", LANGUAGE_TYPE_TAG);
    Ok(())
}

fn check_exports(registry: &GrammarRegistry, exports: &HostObject) -> AnyhowResult<()> {
    let keys: Vec<&str> = exports.keys().collect();
    let expected: Vec<&str> = GrammarVariant::ALL.iter().map(|v| v.name()).collect();
    if keys != expected {
        anyhow::bail!("unexpected export keys {:?}, expected {:?}", keys, expected);
    }

    for variant in GrammarVariant::ALL {
        let entry = exports.get_object(variant.name())?;
        let name = entry.get_str("name")?;
        if name != variant.name() {
            anyhow::bail!("export {} is named {}", variant, name);
        }
        let handle = exports
            .language(variant.name())
            .with_context(|| format!("{} failed tag verification", variant))?;
        if handle != registry.get(variant).handle {
            anyhow::bail!("export {} points at the wrong grammar", variant);
        }
        println!("{}: ok ({:?})", variant, handle);
    }
    Ok(())
}

fn print_tag() {
    println!("{}", LANGUAGE_TYPE_TAG);
    println!("lower: {:#018X}", LANGUAGE_TYPE_TAG.lower);
    println!("upper: {:#018X}", LANGUAGE_TYPE_TAG.upper);
}

fn print_paths(args: &Args, config: &GrammarConfig) {
    let config_path = args.config.clone().or_else(GrammarConfig::default_path);
    match config_path {
        Some(path) => println!("config: {}", path.display()),
        None => println!("config: (none)"),
    }

    if let Some(library) = &config.library {
        println!("library: {}", library.display());
    }

    println!("search paths for {}:", config.library_file_name().display());
    for dir in config.grammar_search_paths() {
        let found = dir.join(config.library_file_name()).is_file();
        println!("  {} {}", if found { "*" } else { " " }, dir.display());
    }

    match find_library(config) {
        Ok(path) => println!("resolved: {}", path.display()),
        Err(e) => println!("resolved: {}", e),
    }
}

fn parse_file(registry: &GrammarRegistry, file: &Path, variant: GrammarVariant) -> AnyhowResult<()> {
    let source = std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&registry.language(variant))
        .with_context(|| format!("Failed to load {} grammar", variant))?;
    let tree = parser
        .parse(&source, None)
        .context("Parser returned no tree")?;

    let root = tree.root_node();
    println!("{}", root.to_sexp());
    if root.has_error() {
        anyhow::bail!("{} contains syntax errors", file.display());
    }
    Ok(())
}

#[cfg(feature = "plugins")]
fn eval(registry: &GrammarRegistry, expr: &str) -> AnyhowResult<()> {
    use rquickjs::{Context as JsContext, Runtime};
    use tree_sitter_phpx::host::quickjs;

    let runtime = Runtime::new().context("Failed to create QuickJS runtime")?;
    let context = JsContext::full(&runtime).context("Failed to create QuickJS context")?;
    context.with(|ctx| -> AnyhowResult<()> {
        quickjs::install(&ctx, registry, "phpx")?;
        let value: rquickjs::Value = ctx
            .eval(expr)
            .map_err(|e| anyhow::anyhow!("Script error: {}", e))?;
        match quickjs::language_from_value(&value) {
            Ok(handle) => println!("<Language {:?}>", handle),
            Err(_) => {
                let json = ctx
                    .json_stringify(value)
                    .and_then(|s| s.map(|s| s.to_string()).transpose())
                    .map_err(|e| anyhow::anyhow!("Failed to serialize result: {}", e))?
                    .unwrap_or_else(|| "undefined".to_string());
                println!("{}", json);
            }
        }
        Ok(())
    })
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_setup::init_global(args.log_file.as_deref(), level)
        .context("Failed to open log file")?;

    match &args.command {
        Command::Tag => {
            print_tag();
            return Ok(());
        }
        Command::Schema => {
            println!(
                "{}",
                serde_json::to_string_pretty(
                    &GrammarConfig::json_schema().context("Failed to build config schema")?
                )?
            );
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(&args)?;
    tracing::debug!("Grammar config: {:?}", config);

    match &args.command {
        Command::Paths => print_paths(&args, &config),
        Command::Exports => print_exports(&load_registry(&config)?)?,
        Command::Verify => verify(&load_registry(&config)?)?,
        Command::Parse { file, variant } => parse_file(&load_registry(&config)?, file, *variant)?,
        #[cfg(feature = "plugins")]
        Command::Eval { expr } => eval(&load_registry(&config)?, expr)?,
        Command::Tag | Command::Schema => {}
    }
    Ok(())
}
