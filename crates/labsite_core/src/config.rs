//! Runtime configuration.
//!
//! # Responsibility
//! - Load `labsite.toml` with every field defaulted.
//! - Apply `LABSITE_*` environment overrides on top of file values.
//!
//! # Invariants
//! - A loaded config has passed `validate`.

use crate::model::page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DB_PATH: &str = "LABSITE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "LABSITE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "LABSITE_LOG_DIR";

const VALID_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Errors raised while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("labsite.sqlite3"),
            busy_timeout_ms: 5_000,
        }
    }
}

impl DatabaseSettings {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    /// Rolling log directory. File logging stays off when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    pub default_size: u32,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Top-level `labsite.toml` contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabsiteConfig {
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub pagination: PaginationSettings,
}

impl LabsiteConfig {
    /// Reads and validates a TOML config file.
    ///
    /// Environment overrides are applied separately via `apply_overrides`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LabsiteConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `LABSITE_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides resolved through `lookup`, then re-validates.
    ///
    /// Blank values are ignored.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let lookup = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        if let Some(path) = lookup(ENV_DB_PATH) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level.to_ascii_lowercase();
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            self.logging.dir = Some(PathBuf::from(dir));
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path cannot be empty".to_string()));
        }
        let level = self.logging.level.trim().to_ascii_lowercase();
        if !VALID_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unsupported log level `{}`; expected {}",
                self.logging.level,
                VALID_LEVELS.join("|")
            )));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.pagination.default_size) {
            return Err(ConfigError::Invalid(format!(
                "pagination.default_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.pagination.default_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, LabsiteConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn empty_file_uses_defaults() {
        let config = LabsiteConfig::from_toml_str("").expect("empty config should load");
        assert_eq!(config, LabsiteConfig::default());
        assert_eq!(config.database.busy_timeout(), Duration::from_secs(5));
        assert_eq!(config.pagination.default_size, 10);
    }

    #[test]
    fn sections_override_defaults() {
        let config = LabsiteConfig::from_toml_str(
            r#"
            [database]
            path = "/var/lib/labsite/site.db"

            [logging]
            level = "warn"
            dir = "/var/log/labsite"

            [pagination]
            default_size = 25
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.database.path, PathBuf::from("/var/lib/labsite/site.db"));
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.dir, Some(PathBuf::from("/var/log/labsite")));
        assert_eq!(config.pagination.default_size, 25);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let level = LabsiteConfig::from_toml_str("[logging]\nlevel = \"loud\"\n")
            .expect_err("unknown level should fail");
        assert!(matches!(level, ConfigError::Invalid(_)));

        let size = LabsiteConfig::from_toml_str("[pagination]\ndefault_size = 500\n")
            .expect_err("oversized page should fail");
        assert!(size.to_string().contains("default_size"));

        let parse = LabsiteConfig::from_toml_str("[database\n").expect_err("bad toml");
        assert!(matches!(parse, ConfigError::Parse(_)));
    }

    #[test]
    fn overrides_replace_file_values_and_skip_blanks() {
        let vars = HashMap::from([
            (ENV_DB_PATH, "/tmp/override.db"),
            (ENV_LOG_LEVEL, "DEBUG"),
            (ENV_LOG_DIR, "  "),
        ]);
        let mut config = LabsiteConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|value| value.to_string()))
            .expect("overrides should apply");

        assert_eq!(config.database.path, PathBuf::from("/tmp/override.db"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.dir, None);
    }
}
