//! Administrative lock held over a cluster's configuration.

use crate::setting::names;
use dynconf_core::DynConfigError;
use std::fmt;
use std::str::FromStr;

/// Who currently holds the configuration lock.
///
/// The model only stores and exposes this value. Enforcing it is the job of
/// whoever serializes changes to the topology. The text form is
/// `token;owner-name;owner-tags`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockContext {
    token: String,
    owner_name: String,
    owner_tags: String,
}

impl LockContext {
    /// Creates a lock context.
    pub fn new(token: impl Into<String>, owner_name: impl Into<String>, owner_tags: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            owner_name: owner_name.into(),
            owner_tags: owner_tags.into(),
        }
    }

    /// Returns the lock token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the name of the lock owner.
    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    /// Returns the tags of the lock owner.
    pub fn owner_tags(&self) -> &str {
        &self.owner_tags
    }
}

impl fmt::Display for LockContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{}", self.token, self.owner_name, self.owner_tags)
    }
}

impl FromStr for LockContext {
    type Err = DynConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(';').collect();
        match parts.as_slice() {
            [token, owner, tags] if !token.is_empty() && !owner.is_empty() => {
                Ok(Self::new(*token, *owner, *tags))
            }
            _ => Err(DynConfigError::invalid_value(
                names::LOCK_CONTEXT,
                format!("Expected <token>;<owner-name>;<owner-tags>, but was: '{s}'"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let lock: LockContext = "abc123;ops-console;admin".parse().unwrap();
        assert_eq!(lock.token(), "abc123");
        assert_eq!(lock.owner_name(), "ops-console");
        assert_eq!(lock.owner_tags(), "admin");
        assert_eq!(lock.to_string(), "abc123;ops-console;admin");

        let untagged: LockContext = "abc;me;".parse().unwrap();
        assert_eq!(untagged.owner_tags(), "");
    }

    #[test]
    fn test_malformed() {
        assert!("abc".parse::<LockContext>().is_err());
        assert!(";me;tags".parse::<LockContext>().is_err());
        assert!("a;b;c;d".parse::<LockContext>().is_err());
    }
}
