//! Configuration loading and config file resolution
//!
//! Every setting has a built-in default, so a missing config file is never
//! fatal. A file that exists but does not parse is reported as an error.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PARTNAV_CONFIG";

/// Navigator configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NavigatorConfig {
    /// Catalog snapshot (JSON) loaded by the command-line tool
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Search bar behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Delay after the last keystroke before a resolution fires
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Queries shorter than this (after trimming) clear the results
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,

    /// Cap on results returned by one resolution
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_query_len: default_min_query_len(),
            max_results: default_max_results(),
        }
    }
}

/// In-memory catalog provider settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    /// Artificial latency added to every provider call (0 = none)
    #[serde(default)]
    pub latency_ms: u64,
}

impl ProviderConfig {
    pub fn latency(&self) -> Option<Duration> {
        (self.latency_ms > 0).then(|| Duration::from_millis(self.latency_ms))
    }
}

/// Event bus settings
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: default_event_capacity() }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_debounce_ms() -> u64 {
    200
}

fn default_min_query_len() -> usize {
    2
}

fn default_max_results() -> usize {
    10
}

fn default_event_capacity() -> usize {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl NavigatorConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: NavigatorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve and load configuration, falling back to defaults
    ///
    /// Resolution priority:
    /// 1. Command-line argument (highest priority)
    /// 2. Environment variable `PARTNAV_CONFIG`
    /// 3. `<config dir>/partnav/config.toml`
    /// 4. Built-in defaults
    ///
    /// A missing file yields defaults (logged as a warning only when the path
    /// was given explicitly); a file that exists
    /// but fails to parse is returned as an error.
    pub fn resolve(cli_arg: Option<&Path>) -> Result<Self> {
        match locate_config(cli_arg) {
            Some((path, _)) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            Some((path, source)) if source.is_explicit() => {
                warn!(
                    "Config file {} ({}) not found, using built-in defaults",
                    path.display(),
                    source
                );
                Ok(Self::default())
            }
            Some((path, _)) => {
                debug!("No config file at {}, using built-in defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.search.max_results == 0 {
            return Err(Error::Config("search.max_results must be at least 1".to_string()));
        }
        if self.events.capacity == 0 {
            return Err(Error::Config("events.capacity must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Pick the config file location following the resolution priority
///
/// Returns `None` only when no explicit location was given and the platform
/// has no config directory.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    locate_config(cli_arg).map(|(path, _)| path)
}

/// Where a config path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine,
    Environment,
    DefaultLocation,
}

impl ConfigSource {
    /// True when the user named the file
    pub fn is_explicit(self) -> bool {
        !matches!(self, ConfigSource::DefaultLocation)
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CommandLine => write!(f, "command line"),
            ConfigSource::Environment => write!(f, "{}", CONFIG_ENV_VAR),
            ConfigSource::DefaultLocation => write!(f, "default location"),
        }
    }
}

/// Config file location and its source, following the resolution priority
pub fn locate_config(cli_arg: Option<&Path>) -> Option<(PathBuf, ConfigSource)> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some((path.to_path_buf(), ConfigSource::CommandLine));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some((PathBuf::from(path), ConfigSource::Environment));
        }
    }

    // Priority 3: Platform config directory
    dirs::config_dir().map(|d| (d.join("partnav").join("config.toml"), ConfigSource::DefaultLocation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config = NavigatorConfig::from_toml_str("").unwrap();
        assert_eq!(config.search.debounce_ms, 200);
        assert_eq!(config.search.min_query_len, 2);
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.events.capacity, 100);
        assert_eq!(config.logging.level, "info");
        assert!(config.provider.latency().is_none());
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = NavigatorConfig::from_toml_str(
            r#"
            catalog_path = "data/catalog.json"

            [search]
            debounce_ms = 50

            [provider]
            latency_ms = 120
            "#,
        )
        .unwrap();

        assert_eq!(config.search.debounce(), Duration::from_millis(50));
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.provider.latency(), Some(Duration::from_millis(120)));
        assert_eq!(config.catalog_path, Some(PathBuf::from("data/catalog.json")));
    }

    #[test]
    fn test_zero_max_results_rejected() {
        let err = NavigatorConfig::from_toml_str("[search]\nmax_results = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let err = NavigatorConfig::from_toml_str("[search\n").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }
}
