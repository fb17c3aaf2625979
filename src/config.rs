//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::descriptor::CodecKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub journal: JournalConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where index entries are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "sqlite" => Ok(StoreBackend::Sqlite),
            other => Err(ConfigError::Invalid(format!("Unknown backend: {}", other))),
        }
    }
}

/// Temporal index configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database file for the sqlite backend
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    #[serde(default)]
    pub codec: CodecKind,
}

fn default_sqlite_path() -> String {
    dirs::cache_dir()
        .map(|p| {
            p.join("journal-index")
                .join("journal_index.db")
                .to_string_lossy()
                .to_string()
        })
        .unwrap_or_else(|| "./journal_index.db".to_string())
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            sqlite_path: default_sqlite_path(),
            codec: CodecKind::default(),
        }
    }
}

/// Journal directory configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    #[serde(default = "default_journal_dir")]
    pub dir: String,

    #[serde(default = "default_extension")]
    pub extension: String,

    #[serde(default = "default_skip_invalid")]
    pub skip_invalid: bool,
}

fn default_journal_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("journal-index").join("journals").to_string_lossy().to_string())
        .unwrap_or_else(|| "./journals".to_string())
}

fn default_extension() -> String {
    "jnl".to_string()
}

fn default_skip_invalid() -> bool {
    true
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            dir: default_journal_dir(),
            extension: default_extension(),
            skip_invalid: default_skip_invalid(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::Parse { error, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            error: e.to_string(),
        })?;
        config.expand_home_paths();
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Result<Self, ConfigError> {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("journal-index").join("config.toml")),
            Some(PathBuf::from("/etc/journal-index/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        // Fall back to environment-only config
        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Journal overrides
        if let Some(dir) = lookup("JOURNAL_INDEX_DIR") {
            self.journal.dir = dir;
        }

        // Index overrides
        if let Some(backend) = lookup("JOURNAL_INDEX_BACKEND") {
            self.index.backend = backend.parse()?;
        }
        if let Some(path) = lookup("JOURNAL_INDEX_SQLITE_PATH") {
            self.index.sqlite_path = path;
        }
        if let Some(codec) = lookup("JOURNAL_INDEX_CODEC") {
            self.index.codec = codec
                .parse()
                .map_err(|e: crate::error::IndexError| ConfigError::Invalid(e.to_string()))?;
        }

        // Logging overrides
        if let Some(level) = lookup("JOURNAL_INDEX_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("JOURNAL_INDEX_LOG_FORMAT") {
            self.logging.format = format;
        }

        self.expand_home_paths();
        Ok(())
    }

    /// Resolve a leading `~` in path settings against the home directory
    fn expand_home_paths(&mut self) {
        self.journal.dir = expand_home(&self.journal.dir);
        self.index.sqlite_path = expand_home(&self.index.sqlite_path);
    }
}

fn expand_home(path: &str) -> String {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return path.to_string(),
    };

    match dirs::home_dir() {
        Some(home) if rest.is_empty() => home.to_string_lossy().to_string(),
        Some(home) => home.join(rest).to_string_lossy().to_string(),
        None => path.to_string(),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

impl From<ConfigError> for crate::error::IndexError {
    fn from(err: ConfigError) -> Self {
        crate::error::IndexError::Config(err.to_string())
    }
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Journal Index Configuration
#
# Environment variables override these settings:
# - JOURNAL_INDEX_DIR
# - JOURNAL_INDEX_BACKEND
# - JOURNAL_INDEX_SQLITE_PATH
# - JOURNAL_INDEX_CODEC
# - JOURNAL_INDEX_LOG_LEVEL
# - JOURNAL_INDEX_LOG_FORMAT

[index]
# Where index entries live: memory or sqlite
backend = "memory"

# Database file for the sqlite backend (rebuilt on every start)
# Defaults to the user cache directory
# sqlite_path = "~/.cache/journal-index/journal_index.db"

# Descriptor encoding: bincode or json
codec = "bincode"

[journal]
# Directory scanned for journal files
# Defaults to the user data directory
# dir = "~/.local/share/journal-index/journals"

# Journal file extension
extension = "jnl"

# Skip unreadable journal files instead of failing the scan
skip_invalid = true

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.index.backend, StoreBackend::Memory);
        assert_eq!(config.index.codec, CodecKind::Bincode);
        assert_eq!(config.journal.extension, "jnl");
        assert!(config.journal.skip_invalid);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_default_config_paths_are_usable() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert!(!config.journal.dir.starts_with('~'));
        assert!(!config.index.sqlite_path.starts_with('~'));
        assert_eq!(config.journal.dir, JournalConfig::default().dir);
    }

    #[test]
    fn test_home_paths_are_expanded() {
        let config = Config::parse(
            r#"
            [index]
            sqlite_path = "~/cache/index.db"

            [journal]
            dir = "~/journals"
            "#,
        )
        .unwrap();

        if let Some(home) = dirs::home_dir() {
            assert_eq!(PathBuf::from(&config.journal.dir), home.join("journals"));
            assert_eq!(
                PathBuf::from(&config.index.sqlite_path),
                home.join("cache").join("index.db")
            );
        }

        // Only a leading `~/` is special
        assert_eq!(expand_home("~user/journals"), "~user/journals");
        assert_eq!(expand_home("/srv/~/journals"), "/srv/~/journals");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse(
            r#"
            [index]
            backend = "sqlite"
            codec = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.index.backend, StoreBackend::Sqlite);
        assert_eq!(config.index.codec, CodecKind::Json);
        assert_eq!(config.journal.extension, "jnl");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[index]\nbackend = \"btree\"\n").unwrap();

        match Config::load(&path) {
            Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected parse error, got {:?}", other),
        }

        assert!(matches!(
            Config::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("JOURNAL_INDEX_DIR", "/srv/journals"),
            ("JOURNAL_INDEX_BACKEND", "sqlite"),
            ("JOURNAL_INDEX_CODEC", "json"),
            ("JOURNAL_INDEX_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.journal.dir, "/srv/journals");
        assert_eq!(config.index.backend, StoreBackend::Sqlite);
        assert_eq!(config.index.codec, CodecKind::Json);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_override() {
        let mut config = Config::default();
        let result = config.apply_overrides(|name| {
            (name == "JOURNAL_INDEX_BACKEND").then(|| "btree".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
