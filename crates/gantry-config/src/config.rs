//! Configuration of the extractor itself.
//!
//! This is not label configuration: it controls which namespace labels are
//! read from and how the tooling around the decoders logs.

use gantry_core::{Namespace, DEFAULT_NAMESPACE};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Root configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use gantry_config::ExtractorConfig;
///
/// let config = ExtractorConfig::default();
/// assert_eq!(config.labels.namespace, "gantry");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ExtractorConfig {
    /// Label selection.
    #[serde(default)]
    pub labels: LabelSettings,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ExtractorConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the namespace is not a usable
    /// label prefix or the log level is unknown.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.namespace()?;

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown level {:?}, expected one of {}", self.logging.level, LOG_LEVELS.join(", ")),
            ));
        }

        Ok(())
    }

    /// The configured namespace, parsed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the token is empty or contains
    /// a separator or whitespace.
    pub fn namespace(&self) -> Result<Namespace, ConfigError> {
        Namespace::new(self.labels.namespace.as_str())
            .map_err(|err| ConfigError::invalid_value("labels.namespace", err.to_string()))
    }

    /// Preset for local runs: pretty, coloured, debug-level logs.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config
    }

    /// Preset for unattended runs: JSON logs at info level.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;
        config
    }
}

/// Label selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LabelSettings {
    /// Namespace token; only labels starting with `<namespace>.` are read.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

impl LogFormat {
    /// Lowercase name, as written in files and labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI colour codes.
    #[serde(default)]
    pub ansi_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExtractorConfig::default();
        assert_eq!(config.labels.namespace, "gantry");
        assert!(config.logging.enabled);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let dev = ExtractorConfig::development();
        assert_eq!(dev.logging.format, LogFormat::Pretty);
        assert!(dev.logging.ansi_enabled);
        assert_eq!(dev.logging.level, "debug");

        let prod = ExtractorConfig::production();
        assert_eq!(prod.logging.format, LogFormat::Json);
        assert!(!prod.logging.ansi_enabled);
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
        assert!(serde_json::from_str::<LogFormat>(r#""xml""#).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_namespace() {
        let mut config = ExtractorConfig::default();
        config.labels.namespace = "com.example".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("labels.namespace"));
    }

    #[test]
    fn test_validate_rejects_unknown_level() {
        let mut config = ExtractorConfig::default();
        config.logging.level = "verbose".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn test_level_is_case_insensitive() {
        let mut config = ExtractorConfig::default();
        config.logging.level = "WARN".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<ExtractorConfig, _> = toml::from_str("[labels]\nprefix = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_namespace_parsed() {
        let mut config = ExtractorConfig::default();
        config.labels.namespace = "watchtower".to_string();
        assert_eq!(config.namespace().unwrap().as_str(), "watchtower");
    }
}
