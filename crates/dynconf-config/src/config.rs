//! Top-level engine configuration.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ExportConfig, LogFormat, LoggingConfig, ValidationConfig};

/// Engine configuration.
///
/// # Example
///
/// ```
/// use dynconf_config::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.logging.level, "info");
/// assert!(config.validation.validate_cluster);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Logging section.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Export section.
    #[serde(default)]
    pub export: ExportConfig,

    /// Validation section.
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl EngineConfig {
    /// Checks values serde cannot check.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the log filter does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.enabled {
            if self.logging.level.trim().is_empty() {
                return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
            }
            dynconf_telemetry::logging::create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }
        Ok(())
    }

    /// Pretty debug logging with locations.
    ///
    /// ```
    /// use dynconf_config::{EngineConfig, LogFormat};
    ///
    /// let config = EngineConfig::development();
    /// assert_eq!(config.logging.format, LogFormat::Pretty);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;
        config.export.include_hidden = true;
        config
    }

    /// JSON logging at info; changes validated against an activated cluster.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;
        config.logging.ansi_enabled = false;
        config.validation.validate_cluster = true;
        config.validation.state = dynconf_core::ClusterState::Activated;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynconf_core::{ClusterState, Version};

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::development().validate().is_ok());
        assert!(EngineConfig::production().validate().is_ok());
    }

    #[test]
    fn test_production_preset() {
        let config = EngineConfig::production();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.validation.state, ClusterState::Activated);
        assert_eq!(config.export.version, Version::V2);
    }

    #[test]
    fn test_empty_level_rejected() {
        let mut config = EngineConfig::default();
        config.logging.level = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_bad_filter_ignored_when_logging_disabled() {
        let mut config = EngineConfig::default();
        config.logging.enabled = false;
        config.logging.level = "x=nope".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<EngineConfig, _> = toml::from_str("[server]\nport = 1\n");
        assert!(result.is_err());
    }
}
