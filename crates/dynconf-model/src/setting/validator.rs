//! Value validators referenced by the setting table.
//!
//! Every validator runs [`default`] first. Callers skip validation entirely
//! for values still holding placeholders, except where noted.

use super::{AllowedUnits, Setting};
use crate::failover::FailoverPriority;
use crate::lock::LockContext;
use dynconf_core::{
    contains_placeholders, DynConfigError, DynConfigResult, Measure, MemoryUnit, TimeUnit, Uid,
    Unit,
};
use regex::Regex;
use std::net::IpAddr;
use std::sync::OnceLock;

/// Logger levels accepted by `logger-overrides`.
pub(crate) const LOGGER_LEVELS: &[&str] = &["ALL", "TRACE", "DEBUG", "INFO", "WARN", "ERROR", "OFF"];

const HOSTNAME_PATTERN: &str = r"^(([a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9\-]*[a-zA-Z0-9])\.)*([a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9\-]*[a-zA-Z0-9])$";

fn invalid<T>(setting: &Setting, reason: impl Into<String>) -> DynConfigResult<T> {
    Err(DynConfigError::invalid_value(setting.name(), reason))
}

/// Key only on maps, no blank mandatory value, allowed literal values.
pub(crate) fn default(setting: &Setting, key: Option<&str>, value: &str) -> DynConfigResult<()> {
    if key.is_some() && !setting.is_map() {
        return invalid(setting, format!("{setting} is not a map"));
    }
    if value.trim().is_empty() {
        if setting.must_be_present() {
            return invalid(setting, format!("{setting} cannot be null or empty"));
        }
        return Ok(());
    }
    if !setting.allows_value(value) {
        return invalid(
            setting,
            format!(
                "{setting} should be one of: [{}]",
                setting.allowed_values().join(", ")
            ),
        );
    }
    Ok(())
}

/// Names never hold placeholders.
pub(crate) fn name(setting: &Setting, key: Option<&str>, value: &str) -> DynConfigResult<()> {
    default(setting, key, value)?;
    if contains_placeholders(value) {
        return invalid(setting, format!("{setting} cannot contain substitution parameters"));
    }
    Ok(())
}

/// An IP address or an RFC 1123 hostname.
pub(crate) fn host(setting: &Setting, key: Option<&str>, value: &str) -> DynConfigResult<()> {
    default(setting, key, value)?;
    if contains_placeholders(value) || is_ip(value) || is_hostname(value) {
        Ok(())
    } else {
        invalid(setting, format!("<address> specified in {setting}=<address> must be a valid hostname or IP address"))
    }
}

/// An IP address only.
pub(crate) fn address(setting: &Setting, key: Option<&str>, value: &str) -> DynConfigResult<()> {
    default(setting, key, value)?;
    if contains_placeholders(value) || is_ip(value) {
        Ok(())
    } else {
        invalid(setting, format!("<address> specified in {setting}=<address> must be a valid IP address"))
    }
}

/// A port between 1 and 65535.
pub(crate) fn port(setting: &Setting, key: Option<&str>, value: &str) -> DynConfigResult<()> {
    default(setting, key, value)?;
    match value.parse::<u16>() {
        Ok(port) if port > 0 => Ok(()),
        _ => invalid(
            setting,
            format!("<port> specified in {setting}=<port> must be an integer between 1 and 65535"),
        ),
    }
}

/// A syntactically valid path. Nothing is checked on disk.
pub(crate) fn path(setting: &Setting, key: Option<&str>, value: &str) -> DynConfigResult<()> {
    default(setting, key, value)?;
    check_path(setting, value)
}

/// A duration in one of the setting's units.
pub(crate) fn time(setting: &Setting, key: Option<&str>, value: &str) -> DynConfigResult<()> {
    default(setting, key, value)?;
    let units = match setting.units() {
        AllowedUnits::Time(units) => units,
        _ => TimeUnit::ALL,
    };
    Measure::parse_with(value, units)
        .map(|_| ())
        .map_err(|e| DynConfigError::invalid_value(setting.name(), e.to_string()))
}

/// `failover-priority` values.
pub(crate) fn failover(setting: &Setting, key: Option<&str>, value: &str) -> DynConfigResult<()> {
    default(setting, key, value)?;
    value.parse::<FailoverPriority>().map(|_| ())
}

/// `lock-context` values.
pub(crate) fn lock(setting: &Setting, key: Option<&str>, value: &str) -> DynConfigResult<()> {
    default(setting, key, value)?;
    value.parse::<LockContext>().map(|_| ())
}

/// UID text forms.
pub(crate) fn uid(setting: &Setting, key: Option<&str>, value: &str) -> DynConfigResult<()> {
    default(setting, key, value)?;
    value
        .parse::<Uid>()
        .map(|_| ())
        .map_err(|e| DynConfigError::invalid_value(setting.name(), e.to_string()))
}

/// `offheap-resources`: `name:size` entries.
pub(crate) fn offheap(setting: &Setting, key: Option<&str>, value: &str) -> DynConfigResult<()> {
    mapping(setting, key, value, false, |setting, _, size| {
        let units = match setting.units() {
            AllowedUnits::Memory(units) => units,
            _ => MemoryUnit::ALL,
        };
        Measure::parse_with(size, units)
            .map(|_| ())
            .map_err(|e| DynConfigError::invalid_value(setting.name(), e.to_string()))
    })
}

/// `data-dirs`: `name:path` entries. Paths may contain colons.
pub(crate) fn data_dirs(setting: &Setting, key: Option<&str>, value: &str) -> DynConfigResult<()> {
    mapping(setting, key, value, true, |setting, _, path| {
        check_path(setting, path)
    })
}

/// `tc-properties`: free-form `key:value` entries.
pub(crate) fn properties(setting: &Setting, key: Option<&str>, value: &str) -> DynConfigResult<()> {
    mapping(setting, key, value, true, |_, _, _| Ok(()))
}

/// `logger-overrides`: `logger:LEVEL` entries.
pub(crate) fn logger_overrides(setting: &Setting, key: Option<&str>, value: &str) -> DynConfigResult<()> {
    mapping(setting, key, value, false, |setting, _, level| {
        if LOGGER_LEVELS.contains(&level.to_ascii_uppercase().as_str()) {
            Ok(())
        } else {
            invalid(
                setting,
                format!(
                    "Illegal level: {level}. Supported levels: {}",
                    LOGGER_LEVELS.join(", ")
                ),
            )
        }
    })
}

fn mapping(
    setting: &Setting,
    key: Option<&str>,
    value: &str,
    path_values: bool,
    entry: fn(&Setting, &str, &str) -> DynConfigResult<()>,
) -> DynConfigResult<()> {
    default(setting, key, value)?;
    if let Some(key) = key {
        if key.trim().is_empty() {
            return invalid(setting, format!("{setting} has an empty key"));
        }
        return if value.is_empty() {
            Ok(())
        } else {
            entry(setting, key, value)
        };
    }
    if value.is_empty() {
        return Ok(());
    }
    for pair in value.split(',') {
        let parts: Vec<&str> = pair.split(':').collect();
        let well_formed = if path_values {
            parts.len() >= 2
        } else {
            parts.len() == 2
        };
        let Some((k, v)) = pair.split_once(':').filter(|(k, v)| {
            well_formed && !k.trim().is_empty() && !v.trim().is_empty()
        }) else {
            return invalid(
                setting,
                format!(
                    "{setting} should be specified in the format <key>:<value>,<key>:<value>..."
                ),
            );
        };
        entry(setting, k.trim(), v.trim())?;
    }
    Ok(())
}

fn check_path(setting: &Setting, value: &str) -> DynConfigResult<()> {
    if value.trim().is_empty() || value.contains('\0') {
        invalid(setting, format!("Invalid path specified for setting {setting}: {value}"))
    } else {
        Ok(())
    }
}

fn is_ip(value: &str) -> bool {
    let bare = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .unwrap_or(value);
    bare.parse::<IpAddr>().is_ok()
}

fn is_hostname(value: &str) -> bool {
    static HOSTNAME: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    HOSTNAME
        .get_or_init(|| Regex::new(HOSTNAME_PATTERN))
        .as_ref()
        .is_ok_and(|re| value.len() <= 253 && re.is_match(value))
}
