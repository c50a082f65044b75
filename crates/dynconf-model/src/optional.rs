//! Configured-or-absent values carrying their setting's default.

/// A setting value as seen on a topology entity.
///
/// `is_configured` only reports explicit configuration. `or_default` falls
/// back to the setting's static default when nothing was configured. Export
/// filtering and cluster validation both depend on telling the two apart.
///
/// # Example
///
/// ```
/// use dynconf_model::OptionalConfig;
///
/// let port = OptionalConfig::new("port", None, Some(9410_u16));
/// assert!(!port.is_configured());
/// assert_eq!(port.or_default(), Some(&9410));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalConfig<T> {
    setting: &'static str,
    value: Option<T>,
    default: Option<T>,
}

impl<T> OptionalConfig<T> {
    /// Wraps a value and the default of the named setting.
    pub fn new(setting: &'static str, value: Option<T>, default: Option<T>) -> Self {
        Self {
            setting,
            value,
            default,
        }
    }

    /// Returns the name of the setting this value belongs to.
    pub fn setting_name(&self) -> &'static str {
        self.setting
    }

    /// Returns `true` if a value was explicitly configured.
    pub fn is_configured(&self) -> bool {
        self.value.is_some()
    }

    /// Returns `true` if a value is configured or a default exists.
    pub fn is_present(&self) -> bool {
        self.value.is_some() || self.default.is_some()
    }

    /// Returns the configured value only.
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Returns the configured value, or the default.
    pub fn or_default(&self) -> Option<&T> {
        self.value.as_ref().or(self.default.as_ref())
    }

    /// Returns the default value.
    pub fn default_value(&self) -> Option<&T> {
        self.default.as_ref()
    }

    /// Consumes the wrapper, returning the configured value only.
    pub fn into_configured(self) -> Option<T> {
        self.value
    }
}

impl<T: PartialEq> OptionalConfig<T> {
    /// Returns `true` if the effective value equals `other`.
    pub fn is(&self, other: &T) -> bool {
        self.or_default() == Some(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_value_wins() {
        let c = OptionalConfig::new("group-port", Some(1000_u16), Some(9430));
        assert!(c.is_configured());
        assert_eq!(c.get(), Some(&1000));
        assert_eq!(c.or_default(), Some(&1000));
        assert!(c.is(&1000));
        assert_eq!(c.setting_name(), "group-port");
    }

    #[test]
    fn test_absent_without_default() {
        let c: OptionalConfig<String> = OptionalConfig::new("backup-dir", None, None);
        assert!(!c.is_configured());
        assert!(!c.is_present());
        assert!(c.or_default().is_none());
        assert!(c.into_configured().is_none());
    }

    #[test]
    fn test_default_is_not_configuration() {
        let c = OptionalConfig::new("ssl-tls", None, Some(false));
        assert!(!c.is_configured());
        assert!(c.is_present());
        assert!(c.is(&false));
        assert_eq!(c.default_value(), Some(&false));
    }
}
