//! Failover priority of a cluster.

use crate::setting::names;
use dynconf_core::DynConfigError;
use std::fmt;
use std::str::FromStr;

/// How a stripe behaves when its active node cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailoverPriority {
    /// Prefer staying available, at the risk of split brain.
    Availability,
    /// Prefer consistency, optionally helped by external voters.
    Consistency {
        /// Number of external voters, 0 when none.
        voters: u32,
    },
}

impl FailoverPriority {
    /// Consistency without external voters.
    pub const fn consistency() -> Self {
        Self::Consistency { voters: 0 }
    }

    /// Returns the number of external voters.
    pub const fn voters(&self) -> u32 {
        match self {
            Self::Availability => 0,
            Self::Consistency { voters } => *voters,
        }
    }

    /// Returns `true` for the consistency priority, with or without voters.
    pub const fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency { .. })
    }
}

impl fmt::Display for FailoverPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Availability => f.write_str("availability"),
            Self::Consistency { voters: 0 } => f.write_str("consistency"),
            Self::Consistency { voters } => write!(f, "consistency:{voters}"),
        }
    }
}

impl FromStr for FailoverPriority {
    type Err = DynConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            DynConfigError::invalid_value(
                names::FAILOVER_PRIORITY,
                format!(
                    "{} should be either 'availability', 'consistency', or 'consistency:N' \
                     (where 'N' is the voter count expressed as a positive integer), but was: '{s}'",
                    names::FAILOVER_PRIORITY
                ),
            )
        };
        match s.trim().split_once(':') {
            None if s.trim() == "availability" => Ok(Self::Availability),
            None if s.trim() == "consistency" => Ok(Self::consistency()),
            Some(("consistency", voters)) => match voters.trim().parse::<u32>() {
                Ok(voters) if voters > 0 => Ok(Self::Consistency { voters }),
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for text in ["availability", "consistency", "consistency:2"] {
            let fp: FailoverPriority = text.parse().unwrap();
            assert_eq!(fp.to_string(), text);
        }
        assert_eq!(
            "consistency:3".parse::<FailoverPriority>().unwrap().voters(),
            3
        );
        assert!(FailoverPriority::consistency().is_consistency());
        assert!(!FailoverPriority::Availability.is_consistency());
    }

    #[test]
    fn test_invalid_priorities() {
        for text in ["", "available", "consistency:", "consistency:0", "consistency:-1", "availability:1"] {
            assert!(text.parse::<FailoverPriority>().is_err(), "{text:?} should fail");
        }
    }
}
