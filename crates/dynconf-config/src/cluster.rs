//! Reading and writing cluster properties files.
//!
//! [`ClusterLoader`] ties an [`EngineConfig`] to the model: it builds clusters
//! from `.properties` files, exports them with the configured format, and
//! validates changes against the configured cluster state.

use std::fs;
use std::path::Path;

use dynconf_core::Operation;
use dynconf_model::{Cluster, ClusterFactory, Configuration, ParsedCluster, Properties};

use crate::{ConfigError, EngineConfig};

/// Loads, exports and changes clusters according to an [`EngineConfig`].
///
/// # Example
///
/// ```
/// use dynconf_config::{ClusterLoader, EngineConfig};
///
/// let config = EngineConfig::default();
/// let loader = ClusterLoader::new(&config);
/// let parsed = loader
///     .load_str(
///         "failover-priority=availability\n\
///          stripe.1.node.1.name=node-1\n\
///          stripe.1.node.1.hostname=localhost\n",
///     )
///     .unwrap();
/// assert_eq!(parsed.cluster.node_count(), 1);
/// assert!(!parsed.defaults_added.is_empty());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ClusterLoader<'a> {
    config: &'a EngineConfig,
    factory: ClusterFactory,
}

impl<'a> ClusterLoader<'a> {
    /// Creates a loader using `config`.
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            factory: ClusterFactory::new(),
        }
    }

    /// Builds a cluster from a `.properties` file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or describes an invalid cluster.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<ParsedCluster, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let text = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        let parsed = self.load_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            stripes = parsed.cluster.stripe_count(),
            nodes = parsed.cluster.node_count(),
            "Loaded cluster file"
        );
        Ok(parsed)
    }

    /// Builds a cluster from `.properties` text.
    ///
    /// Runs the whole-cluster validator unless `validation.validate_cluster`
    /// is off.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Cluster`] when the cluster is rejected.
    pub fn load_str(&self, text: &str) -> Result<ParsedCluster, ConfigError> {
        let properties = Properties::parse(text);
        let parsed = if self.config.validation.validate_cluster {
            self.factory.create(&properties)?
        } else {
            self.factory.parse(&properties)?
        };
        for added in &parsed.defaults_added {
            tracing::debug!(input = %added, "Default added");
        }
        Ok(parsed)
    }

    /// Exports a cluster with the configured export options.
    ///
    /// # Errors
    ///
    /// Fails only if the setting registry cannot be built.
    pub fn export(&self, cluster: &Cluster) -> Result<Properties, ConfigError> {
        let export = &self.config.export;
        Ok(cluster.to_properties(
            export.expanded,
            export.include_defaults,
            export.include_hidden,
            export.version,
        )?)
    }

    /// Writes a cluster to a `.properties` file, replacing its contents.
    ///
    /// # Errors
    ///
    /// Fails if the export fails or the file cannot be written.
    pub fn export_to_file<P: AsRef<Path>>(
        &self,
        cluster: &Cluster,
        path: P,
    ) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let properties = self.export(cluster)?;
        fs::write(path, properties.to_string()).map_err(|e| ConfigError::write_error(path, e))?;
        tracing::debug!(path = %path.display(), properties = properties.len(), "Exported cluster");
        Ok(())
    }

    /// Parses a change, validates it against `validation.state` and applies it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Cluster`] if the change is malformed, illegal in
    /// the configured state, or targets a missing stripe or node.
    pub fn apply(
        &self,
        cluster: &mut Cluster,
        input: &str,
        operation: Operation,
    ) -> Result<Configuration, ConfigError> {
        let configuration = Configuration::value_of(input)?;
        configuration.validate(self.config.validation.state, operation)?;
        configuration.apply(cluster)?;
        Ok(configuration)
    }
}
