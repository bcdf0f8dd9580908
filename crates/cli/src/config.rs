//! Configuration loading from toolgate.toml.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Trust ledger location.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Audit log location.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Log filter and output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct LedgerConfig {
    /// Path to the ledger document. Defaults to `<data dir>/trust.json`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditConfig {
    /// Path to the audit database. Defaults to `<data dir>/audit.db`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when neither TOOLGATE_LOG nor RUST_LOG is set.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format for stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve the ledger path. `env_override` wins over the config file.
    pub fn ledger_path(&self, env_override: Option<PathBuf>, data_dir: &Path) -> PathBuf {
        env_override
            .or_else(|| self.ledger.path.clone())
            .unwrap_or_else(|| data_dir.join("trust.json"))
    }

    pub fn audit_path(&self, data_dir: &Path) -> PathBuf {
        self.audit
            .path
            .clone()
            .unwrap_or_else(|| data_dir.join("audit.db"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        let data = Path::new("/data/toolgate");
        assert_eq!(config.ledger_path(None, data), data.join("trust.json"));
        assert_eq!(config.audit_path(data), data.join("audit.db"));
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn parse_full_config() {
        let config = Config::parse(
            r#"
[ledger]
path = "/srv/trust.json"

[audit]
path = "/srv/audit.db"

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();
        let data = Path::new("/unused");
        assert_eq!(config.ledger_path(None, data), PathBuf::from("/srv/trust.json"));
        assert_eq!(config.audit_path(data), PathBuf::from("/srv/audit.db"));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn env_override_wins() {
        let config = Config::parse("[ledger]\npath = \"/srv/trust.json\"").unwrap();
        let path = config.ledger_path(Some("/tmp/other.json".into()), Path::new("/data"));
        assert_eq!(path, PathBuf::from("/tmp/other.json"));
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(matches!(
            Config::parse("[logging]\nformat = \"xml\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
