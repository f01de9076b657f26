//! # Configuration
//!
//! Settings loaded from `larder.toml`, then overridden by environment
//! variables, then by command-line flags.
//!
//! ```toml
//! # Path to the catalog store
//! database = "larder.db"
//!
//! # Storage backend: "redb" (default) or "file"
//! backend = "redb"
//!
//! # Rows per page in list output
//! page_size = 5
//!
//! # Log format: "text" (default) or "json"
//! log_format = "text"
//! ```
//!
//! ## Environment
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `LARDER_CONFIG` | config file location |
//! | `LARDER_DB` | `database` |
//! | `LARDER_BACKEND` | `backend` |
//! | `LARDER_LOG_FORMAT` | `log_format` |

use clap::ValueEnum;
use larder_core::LarderError;
use larder_core::primitives::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given.
pub const CONFIG_FILE_NAME: &str = "larder.toml";

/// Environment variable naming the config file.
pub const ENV_CONFIG: &str = "LARDER_CONFIG";
pub const ENV_DATABASE: &str = "LARDER_DB";
pub const ENV_BACKEND: &str = "LARDER_BACKEND";
pub const ENV_LOG_FORMAT: &str = "LARDER_LOG_FORMAT";

// =============================================================================
// SETTINGS
// =============================================================================

/// Where the catalog is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// redb database (ACID)
    #[default]
    Redb,
    /// Single JSON document
    File,
}

impl Backend {
    fn parse(value: &str) -> Result<Self, LarderError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "file" => Ok(Self::File),
            other => Err(LarderError::Config(format!(
                "Invalid backend '{}'. Expected \"redb\" or \"file\".",
                other
            ))),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redb => write!(f, "redb"),
            Self::File => write!(f, "file"),
        }
    }
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Result<Self, LarderError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(LarderError::Config(format!(
                "Invalid log format '{}'. Expected \"text\" or \"json\".",
                other
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Effective application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LarderConfig {
    /// Path to the catalog store.
    #[serde(default = "default_database")]
    pub database: PathBuf,
    #[serde(default)]
    pub backend: Backend,
    /// Rows per page in list output.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_database() -> PathBuf {
    PathBuf::from("larder.db")
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for LarderConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            backend: Backend::default(),
            page_size: default_page_size(),
            log_format: LogFormat::default(),
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl LarderConfig {
    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self, LarderError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LarderError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            LarderError::Config(msg) => {
                LarderError::Config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Parse config text.
    pub fn from_toml(content: &str) -> Result<Self, LarderError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| LarderError::Config(format!("Failed to parse config: {}", e)))?;
        if config.page_size == 0 {
            return Err(LarderError::Config(
                "page_size must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }

    /// Resolve the config file and read it.
    ///
    /// An explicitly named file (flag or `LARDER_CONFIG`) must exist. The
    /// implicit `larder.toml` is optional; without it the defaults apply.
    pub fn discover(
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LarderError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = env(ENV_CONFIG) {
            return Self::from_file(Path::new(&path));
        }
        let implicit = Path::new(CONFIG_FILE_NAME);
        if implicit.is_file() {
            Self::from_file(implicit)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment overrides. `env` looks a variable up by name.
    pub fn apply_env(mut self, env: impl Fn(&str) -> Option<String>) -> Result<Self, LarderError> {
        if let Some(database) = env(ENV_DATABASE) {
            self.database = PathBuf::from(database);
        }
        if let Some(backend) = env(ENV_BACKEND) {
            self.backend = Backend::parse(&backend)?;
        }
        if let Some(format) = env(ENV_LOG_FORMAT) {
            self.log_format = LogFormat::parse(&format)?;
        }
        Ok(self)
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn apply_flags(mut self, database: Option<PathBuf>, backend: Option<Backend>) -> Self {
        if let Some(database) = database {
            self.database = database;
        }
        if let Some(backend) = backend {
            self.backend = backend;
        }
        self
    }
}

/// Look a variable up in the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
