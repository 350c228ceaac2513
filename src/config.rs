//! Grammar library configuration.
//!
//! Tells the dynamic linkage where to find the compiled phpx grammar. The
//! file is optional JSON; every field has a default, and environment
//! variables override what the file says.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Overrides [`GrammarConfig::library`].
pub const LIBRARY_ENV: &str = "PHPX_GRAMMAR_LIB";
/// Extra search directories, in the platform's path list format.
pub const SEARCH_PATH_ENV: &str = "PHPX_GRAMMAR_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GrammarConfig {
    /// Explicit path to the grammar shared library. Skips the search when set.
    #[serde(default)]
    pub library: Option<PathBuf>,

    /// Directories searched for the grammar library, before the defaults.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Library base name, without platform prefix or extension.
    #[serde(default = "default_library_name")]
    pub library_name: String,
}

fn default_library_name() -> String {
    "tree-sitter-phpx".to_string()
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            library: None,
            search_paths: Vec::new(),
            library_name: default_library_name(),
        }
    }
}

impl GrammarConfig {
    /// Default location of the config file: `<config_dir>/phpx/grammar.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("phpx").join("grammar.json"))
    }

    /// Parse a config from JSON text.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file. A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No grammar config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_json(&content)
    }

    /// Load the config from `path` (or the default location), then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load_from_file(&path)?,
            None => {
                tracing::warn!("No config directory on this platform, using defaults");
                Self::default()
            }
        };
        config.apply_env(
            std::env::var_os(LIBRARY_ENV).map(PathBuf::from),
            std::env::var_os(SEARCH_PATH_ENV)
                .map(|paths| std::env::split_paths(&paths).collect())
                .unwrap_or_default(),
        );
        Ok(config)
    }

    /// Apply environment-provided overrides. Env search paths go first.
    pub fn apply_env(&mut self, library: Option<PathBuf>, search_paths: Vec<PathBuf>) {
        if let Some(library) = library {
            self.library = Some(library);
        }
        if !search_paths.is_empty() {
            let configured = std::mem::take(&mut self.search_paths);
            self.search_paths = search_paths.into_iter().chain(configured).collect();
        }
    }

    /// Directories searched for the grammar library, in order.
    pub fn grammar_search_paths(&self) -> Vec<PathBuf> {
        let mut dirs = self.search_paths.clone();

        if let Some(config_dir) = dirs::config_dir() {
            dirs.push(config_dir.join("phpx").join("grammars"));
        }

        if let Some(data_dir) = dirs::data_local_dir() {
            dirs.push(data_dir.join("phpx").join("grammars"));
        }

        // Bundled next to the executable
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                dirs.push(exe_dir.join("grammars"));
                dirs.push(exe_dir.join("..").join("share").join("phpx").join("grammars"));
            }
        }

        dirs
    }

    /// Platform file name of the library, e.g. `libtree-sitter-phpx.so`.
    pub fn library_file_name(&self) -> PathBuf {
        PathBuf::from(libloading::library_filename(&self.library_name))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.library_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "library_name cannot be empty".to_string(),
            ));
        }
        if self
            .library_name
            .contains(|c| c == '/' || c == '\\')
        {
            return Err(ConfigError::ValidationError(format!(
                "library_name must be a bare name, got '{}'",
                self.library_name
            )));
        }
        Ok(())
    }

    /// JSON schema of the config file.
    pub fn json_schema() -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(schemars::schema_for!(GrammarConfig))
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "IO error: {msg}"),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            ConfigError::ValidationError(msg) => write!(f, "Validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
