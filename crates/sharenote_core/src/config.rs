//! Runtime configuration for hosts embedding the note core.
//!
//! Values come from environment variables (hosts may load a `.env` file
//! first); anything unset falls back to `defaults`.

use crate::logging::{default_log_level, LogLevel};
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Environment variable names.
pub mod env_vars {
    pub const DB_PATH: &str = "SHARENOTE_DB_PATH";
    pub const LOG_LEVEL: &str = "SHARENOTE_LOG_LEVEL";
    /// Absolute directory for rolling log files. File logging is off when unset.
    pub const LOG_DIR: &str = "SHARENOTE_LOG_DIR";
}

/// Default values.
pub mod defaults {
    pub const DB_PATH: &str = "./sharenote.sqlite3";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    EmptyValue(&'static str),
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyValue(name) => write!(f, "`{name}` is set but empty"),
            Self::InvalidLogLevel(value) => write!(
                f,
                "unsupported log level `{value}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeLogDir(path) => write!(
                f,
                "`{}` must be an absolute path, got `{}`",
                env_vars::LOG_DIR,
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(defaults::DB_PATH),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(env_vars::DB_PATH) {
            config.db_path = PathBuf::from(non_empty(env_vars::DB_PATH, &value)?);
        }

        if let Some(value) = lookup(env_vars::LOG_LEVEL) {
            let value = non_empty(env_vars::LOG_LEVEL, &value)?;
            config.log_level = LogLevel::parse(value)
                .ok_or_else(|| ConfigError::InvalidLogLevel(value.to_string()))?;
        }

        if let Some(value) = lookup(env_vars::LOG_DIR) {
            let dir = PathBuf::from(non_empty(env_vars::LOG_DIR, &value)?);
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir));
            }
            config.log_dir = Some(dir);
        }

        Ok(config)
    }
}

fn non_empty<'v>(name: &'static str, value: &'v str) -> Result<&'v str, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyValue(name));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::{env_vars, ConfigError, CoreConfig};
    use crate::logging::LogLevel;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = CoreConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_all_values() {
        let dir = std::env::temp_dir();
        let dir_text = dir.to_str().unwrap().to_string();
        let config = CoreConfig::from_lookup(lookup_from(&[
            (env_vars::DB_PATH, "/var/lib/sharenote.db"),
            (env_vars::LOG_LEVEL, "Warning"),
            (env_vars::LOG_DIR, dir_text.as_str()),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/sharenote.db"));
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.log_dir, Some(dir));
    }

    #[test]
    fn rejects_bad_values() {
        let err = CoreConfig::from_lookup(lookup_from(&[(env_vars::LOG_LEVEL, "loud")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidLogLevel("loud".to_string()));

        let err =
            CoreConfig::from_lookup(lookup_from(&[(env_vars::LOG_DIR, "logs")])).unwrap_err();
        assert!(matches!(err, ConfigError::RelativeLogDir(_)));

        let err = CoreConfig::from_lookup(lookup_from(&[(env_vars::DB_PATH, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::EmptyValue(env_vars::DB_PATH));
    }
}
