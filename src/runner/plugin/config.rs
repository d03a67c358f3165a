//! Host configuration file parsing.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;
use serde::Deserialize;

use crate::runner::module::resolver::SearchPathList;

/// Errors raised while building the host from its configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    Io(PathBuf, String),
    /// Configuration file is not valid TOML for [`CeporaConfig`].
    Parse(String),
    /// No directory to search for modules.
    EmptySearchPath,
    /// The executable's own location is unknown and no search path was given.
    ExecutablePathUnavailable,
    InvalidLogLevel(String),
    /// The logger could not be installed (or was installed twice).
    Logger(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(path, msg) => write!(f, "Failed to read config file {}: {}", path.display(), msg),
            ConfigError::Parse(msg) => write!(f, "Invalid config: {}", msg),
            ConfigError::EmptySearchPath => write!(f, "Module search path is empty"),
            ConfigError::ExecutablePathUnavailable => {
                write!(f, "Can't retrieve executable path. Please try setting CPR_PATH.")
            }
            ConfigError::InvalidLogLevel(level) => write!(f, "Invalid log level: {}", level),
            ConfigError::Logger(msg) => write!(f, "Logger setup failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Whether `require` consults previously loaded modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Every `require` loads the module again.
    Disabled,
    /// A second `require` of the same file returns the first exports object.
    Reuse,
    /// A second `require` of the same file is a resolution error.
    Reject,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::Disabled
    }
}

/// How long a native module's library stays mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryLifetime {
    /// Closed as soon as the init function returned and exports were merged.
    /// Exported native functions must not be called afterwards.
    UnloadAfterInit,
    /// Kept open until the last reference to the exports object is dropped.
    RetainWithExports,
}

impl Default for LibraryLifetime {
    fn default() -> Self {
        LibraryLifetime::UnloadAfterInit
    }
}

/// `[modules]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ModulesConfig {
    /// Search directories, highest priority first. Empty means "derive".
    pub paths: Vec<PathBuf>,
    /// Dialect file extension -> global name of its compiler object.
    pub dialects: BTreeMap<String, String>,
    /// Overrides the platform's shared library extension.
    pub native_extension: Option<String>,
    pub cache: CachePolicy,
    pub library_lifetime: LibraryLifetime,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        let mut dialects = BTreeMap::new();
        dialects.insert("coffee".to_string(), "CoffeeScript".to_string());
        ModulesConfig {
            paths: Vec::new(),
            dialects,
            native_extension: None,
            cache: CachePolicy::default(),
            library_lifetime: LibraryLifetime::default(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    /// Write log lines here instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Complete host configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CeporaConfig {
    pub modules: ModulesConfig,
    pub log: LogConfig,
}

impl CeporaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file.
    ///
    /// Expected format:
    /// ```toml
    /// [modules]
    /// paths = ["./lib", "/usr/share/cepora"]
    /// cache = "reuse"
    /// library_lifetime = "retain_with_exports"
    ///
    /// [modules.dialects]
    /// coffee = "CoffeeScript"
    ///
    /// [log]
    /// level = "debug"
    /// file = "cepora.log"
    /// ```
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log.level).map_err(|_| ConfigError::InvalidLogLevel(self.log.level.clone()))
    }

    /// The module search path: configured directories if any, otherwise the
    /// `CPR_PATH` environment variable, otherwise the executable's directory
    /// and its resources sibling.
    pub fn search_paths(&self) -> Result<SearchPathList, ConfigError> {
        if self.modules.paths.is_empty() {
            SearchPathList::from_environment()
        } else {
            SearchPathList::new(self.modules.paths.clone())
        }
    }
}
