//! Configuration schema sections.
//!
//! Every section rejects unknown fields and fills missing ones with defaults,
//! so a file only needs the values it changes.

use dynconf_core::{ClusterState, Version};
use dynconf_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON structured output.
    #[default]
    Json,
    /// Human-readable output.
    Pretty,
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive, e.g. `info` or `dynconf_model=trace`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Color pretty output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include file and line in log events.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// Converts this section into the subscriber settings.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            span_events: false,
            file_line_info: self.include_location,
            include_target: true,
            ansi: self.ansi_enabled,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// How topologies are written back to properties.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Properties format version.
    #[serde(default)]
    pub version: Version,

    /// Write map settings one key per line.
    #[serde(default)]
    pub expanded: bool,

    /// Write settings left at their default.
    #[serde(default = "default_true")]
    pub include_defaults: bool,

    /// Write hidden settings such as UIDs and the lock context.
    #[serde(default)]
    pub include_hidden: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            version: Version::CURRENT,
            expanded: false,
            include_defaults: true,
            include_hidden: false,
        }
    }
}

/// Checks run when loading clusters and changes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ValidationConfig {
    /// Run the whole-cluster validator after building a cluster from a file.
    #[serde(default = "default_true")]
    pub validate_cluster: bool,

    /// State changes are validated against.
    #[serde(default = "default_state")]
    pub state: ClusterState,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            validate_cluster: true,
            state: default_state(),
        }
    }
}

fn default_state() -> ClusterState {
    ClusterState::Configuring
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }

    #[test]
    fn test_logging_to_log_config() {
        let section = LoggingConfig {
            format: LogFormat::Pretty,
            include_location: true,
            ..LoggingConfig::default()
        };
        let config = section.to_log_config();
        assert!(!config.json_format);
        assert!(config.file_line_info);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_export_config_deserialize() {
        let config: ExportConfig = toml::from_str(
            r#"
            version = "1"
            expanded = true
        "#,
        )
        .unwrap();
        assert_eq!(config.version, Version::V1);
        assert!(config.expanded);
        assert!(config.include_defaults);
        assert!(!config.include_hidden);
    }

    #[test]
    fn test_validation_state_deserialize() {
        let config: ValidationConfig = toml::from_str(r#"state = "activated""#).unwrap();
        assert_eq!(config.state, ClusterState::Activated);
        assert!(config.validate_cluster);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ExportConfig, _> = toml::from_str("compressed = true");
        assert!(result.is_err());
    }
}
