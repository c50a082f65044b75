//! Layered configuration loader.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use dynconf_core::{ClusterState, Version};

use crate::{ConfigError, EngineConfig, LogFormat};

/// Default prefix for environment overrides.
pub const ENV_PREFIX: &str = "DYNCONF";

/// Loads an [`EngineConfig`] from layered sources.
///
/// Later layers override earlier ones:
/// 1. Defaults (or a preset)
/// 2. A TOML or JSON file
/// 3. Environment variables `PREFIX__SECTION__KEY`
///
/// # Example
///
/// ```no_run
/// use dynconf_config::ConfigLoader;
///
/// # fn main() -> Result<(), dynconf_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_production()
///     .with_optional_file("dynconf.toml")?
///     .with_env_prefix("DYNCONF")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: EngineConfig,
    env_prefix: Option<String>,
    file_loaded: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader starting from defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            env_prefix: None,
            file_loaded: false,
        }
    }

    /// Resets to default values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = EngineConfig::default();
        self
    }

    /// Starts from the development preset.
    ///
    /// ```
    /// use dynconf_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = EngineConfig::development();
        self
    }

    /// Starts from the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = EngineConfig::production();
        self
    }

    /// Loads a file, picking the format from its extension (`.toml` or `.json`).
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, unreadable, malformed or has unknown fields.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        self.config = Self::parse_file(&content, path)?;
        self.file_loaded = true;
        tracing::debug!(path = %path.display(), "Loaded engine configuration file");
        Ok(self)
    }

    /// Loads a file if it exists.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration text in the given format (`toml` or `json`).
    ///
    /// ```
    /// use dynconf_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string("[export]\nexpanded = true\n", "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    /// assert!(config.export.expanded);
    /// ```
    ///
    /// # Errors
    ///
    /// Fails on an unsupported format or malformed content.
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = match format.to_lowercase().as_str() {
            "toml" => toml::from_str(content)?,
            "json" => serde_json::from_str(content)?,
            _ => {
                return Err(ConfigError::validation_error(format!(
                    "unsupported configuration format: {format}"
                )))
            }
        };
        Ok(self)
    }

    /// Enables environment overrides under `prefix`.
    ///
    /// With prefix `DYNCONF`, `DYNCONF__EXPORT__VERSION=1` sets `export.version`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Loads variables from a `.env` file in the working directory, if present.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::validation_error(format!("invalid .env file: {e}"))),
        }
        Ok(self)
    }

    /// Returns `true` once a file layer has been loaded.
    pub fn file_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Applies environment overrides, then validates.
    ///
    /// # Errors
    ///
    /// Fails on an unparsable override or an invalid final configuration.
    pub fn load(mut self) -> Result<EngineConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }
        self.config.validate()?;
        Ok(self.config)
    }

    /// Returns the configuration without overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> EngineConfig {
        self.config
    }

    fn parse_file(content: &str, path: &Path) -> Result<EngineConfig, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(toml::from_str(content)?),
            Some("json") => Ok(serde_json::from_str(content)?),
            _ => Err(ConfigError::validation_error(format!(
                "unsupported configuration file format: {}",
                path.display()
            ))),
        }
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let env_vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let bool_value = || {
            parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
        };

        match parts.as_slice() {
            ["LOGGING", "ENABLED"] => self.config.logging.enabled = bool_value()?,
            ["LOGGING", "LEVEL"] => self.config.logging.level = value.to_string(),
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }
            ["LOGGING", "ANSI_ENABLED"] => self.config.logging.ansi_enabled = bool_value()?,
            ["LOGGING", "INCLUDE_LOCATION"] => {
                self.config.logging.include_location = bool_value()?;
            }

            ["EXPORT", "VERSION"] => {
                self.config.export.version = value
                    .parse::<Version>()
                    .map_err(|e| ConfigError::env_parse_error(key, e))?;
            }
            ["EXPORT", "EXPANDED"] => self.config.export.expanded = bool_value()?,
            ["EXPORT", "INCLUDE_DEFAULTS"] => self.config.export.include_defaults = bool_value()?,
            ["EXPORT", "INCLUDE_HIDDEN"] => self.config.export.include_hidden = bool_value()?,

            ["VALIDATION", "VALIDATE_CLUSTER"] => {
                self.config.validation.validate_cluster = bool_value()?;
            }
            ["VALIDATION", "STATE"] => {
                self.config.validation.state = match value.to_lowercase().as_str() {
                    "configuring" => ClusterState::Configuring,
                    "activated" => ClusterState::Activated,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'configuring' or 'activated'",
                        ))
                    }
                };
            }

            _ => tracing::debug!(var = key, "Ignoring unknown configuration override"),
        }
        Ok(())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
