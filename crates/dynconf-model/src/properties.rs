//! Ordered `key=value` mapping used to export and import topologies.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered mapping of property keys to values.
///
/// Insertion order is preserved so exports follow the registry order and the
/// `stripe.<n>.node.<m>.` layout of the cluster.
///
/// # Example
///
/// ```
/// use dynconf_model::Properties;
///
/// let props = Properties::parse("# exported\nname=node-1\nhostname = localhost\n");
/// assert_eq!(props.get("hostname"), Some("localhost"));
/// assert_eq!(props.to_string(), "name=node-1\nhostname=localhost\n");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties {
    entries: IndexMap<String, String>,
}

impl Properties {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `.properties` text.
    ///
    /// Blank lines and lines starting with `#` or `!` are skipped. Each other
    /// line is split at its first `=`; keys and values are trimmed. A line
    /// without `=` is a key with an empty value. Later keys replace earlier
    /// ones.
    pub fn parse(text: &str) -> Self {
        let mut props = Self::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key, value) = line.split_once('=').unwrap_or((line, ""));
            props.insert(key.trim(), value.trim());
        }
        props
    }

    /// Inserts or replaces a property, keeping the original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Returns the value of a property.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Removes a property, keeping the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    /// Returns `true` if the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there is no property.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the properties in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copies every property of `other` with `prefix` prepended to its key.
    pub fn extend_prefixed(&mut self, prefix: &str, other: Properties) {
        for (key, value) in other.entries {
            self.entries.insert(format!("{prefix}{key}"), value);
        }
    }

    /// Sorts the properties by key.
    pub fn sort(&mut self) {
        self.entries.sort_keys();
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

impl IntoIterator for Properties {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_keeps_colons() {
        let props = Properties::parse(
            "! header\n\n# comment\noffheap-resources=main:512MB,second:1GB\nstripe.1.node.1.backup-dir=\nflag\n",
        );
        assert_eq!(props.len(), 3);
        assert_eq!(
            props.get("offheap-resources"),
            Some("main:512MB,second:1GB")
        );
        assert_eq!(props.get("stripe.1.node.1.backup-dir"), Some(""));
        assert_eq!(props.get("flag"), Some(""));
    }

    #[test]
    fn test_value_keeps_later_equals_signs() {
        let props = Properties::parse("tc-properties.a=b=c");
        assert_eq!(props.get("tc-properties.a"), Some("b=c"));
    }

    #[test]
    fn test_prefix_and_order() {
        let mut inner = Properties::new();
        inner.insert("name", "n1");
        inner.insert("hostname", "h1");

        let mut outer = Properties::new();
        outer.insert("cluster-name", "c");
        outer.extend_prefixed("stripe.1.node.1.", inner);

        let keys: Vec<&str> = outer.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["cluster-name", "stripe.1.node.1.name", "stripe.1.node.1.hostname"]
        );
        assert_eq!(outer.remove("cluster-name").as_deref(), Some("c"));
        assert!(!outer.contains_key("cluster-name"));
    }

    #[test]
    fn test_sort_and_collect() {
        let mut props: Properties = vec![("b", "2"), ("a", "1")].into_iter().collect();
        props.sort();
        assert_eq!(props.to_string(), "a=1\nb=2\n");
    }

    #[test]
    fn test_json_is_a_flat_object() {
        let props: Properties = vec![("name", "n1")].into_iter().collect();
        let json = serde_json::to_string(&props).expect("serialization should work");
        assert_eq!(json, r#"{"name":"n1"}"#);
    }
}
