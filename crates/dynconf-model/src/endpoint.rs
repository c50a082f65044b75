//! Socket addresses and resolved node endpoints.
//!
//! Matching is purely textual: hostnames are compared case-insensitively and
//! nothing is ever resolved through DNS.

use dynconf_core::{DynConfigError, DynConfigResult, Uid};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A `host:port` pair as configured.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostPort {
    host: String,
    port: u16,
}

impl HostPort {
    /// Creates an address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the host part.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns `true` for `0.0.0.0`, `::` and their spellings.
    pub fn is_wildcard(&self) -> bool {
        is_wildcard_host(&self.host)
    }

    /// Returns `true` if both addresses designate the same host and port.
    pub fn matches(&self, other: &HostPort) -> bool {
        self.port == other.port
            && strip_brackets(&self.host).eq_ignore_ascii_case(strip_brackets(&other.host))
    }
}

/// Returns `true` if the host is a wildcard bind address.
pub fn is_wildcard_host(host: &str) -> bool {
    match strip_brackets(host).parse::<std::net::IpAddr>() {
        Ok(ip) => ip.is_unspecified(),
        Err(_) => false,
    }
}

fn strip_brackets(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

impl fmt::Display for HostPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = strip_brackets(&self.host);
        if host.contains(':') {
            write!(f, "[{}]:{}", host, self.port)
        } else {
            write!(f, "{}:{}", host, self.port)
        }
    }
}

impl FromStr for HostPort {
    type Err = DynConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DynConfigError::syntax(s, "Expected <host>:<port>");
        let s = s.trim();
        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
            (host, tail.strip_prefix(':').ok_or_else(invalid)?)
        } else {
            s.rsplit_once(':').ok_or_else(invalid)?
        };
        if host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        Ok(Self::new(host, port))
    }
}

/// Which configured address an endpoint comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
    /// The node's `hostname:port`.
    Internal,
    /// The node's `public-hostname:public-port`.
    Public,
    /// The node's `bind-address:port`, when not a wildcard.
    Bind,
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Internal => "internal",
            Self::Public => "public",
            Self::Bind => "bind",
        })
    }
}

/// A resolved way to reach a node.
///
/// Equality and hashing use the node UID only: the same logical endpoint keeps
/// its identity when the node's addresses change.
#[derive(Debug, Clone)]
pub struct Endpoint {
    node_uid: Uid,
    node_name: String,
    kind: EndpointKind,
    address: HostPort,
}

impl Endpoint {
    /// Creates an endpoint.
    pub fn new(node_uid: Uid, node_name: impl Into<String>, kind: EndpointKind, address: HostPort) -> Self {
        Self {
            node_uid,
            node_name: node_name.into(),
            kind,
            address,
        }
    }

    /// Returns the UID of the node.
    pub const fn node_uid(&self) -> Uid {
        self.node_uid
    }

    /// Returns the name of the node.
    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    /// Returns where the address comes from.
    pub const fn kind(&self) -> EndpointKind {
        self.kind
    }

    /// Returns the socket address.
    pub fn address(&self) -> &HostPort {
        &self.address
    }

    /// Parses a `host:port` string into a validated address.
    pub fn parse_address(input: &str) -> DynConfigResult<HostPort> {
        input.parse()
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.node_uid == other.node_uid
    }
}

impl Eq for Endpoint {}

impl Hash for Endpoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.node_uid.hash(state);
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.node_name, self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_port_parsing() {
        let hp: HostPort = "localhost:9410".parse().unwrap();
        assert_eq!(hp.host(), "localhost");
        assert_eq!(hp.port(), 9410);

        let v6: HostPort = "[::1]:9410".parse().unwrap();
        assert_eq!(v6.host(), "::1");
        assert_eq!(v6.to_string(), "[::1]:9410");

        assert!("localhost".parse::<HostPort>().is_err());
        assert!(":9410".parse::<HostPort>().is_err());
        assert!("host:99999".parse::<HostPort>().is_err());
    }

    #[test]
    fn test_matching_is_textual() {
        let a = HostPort::new("Node-1.example.com", 9410);
        assert!(a.matches(&HostPort::new("node-1.example.com", 9410)));
        assert!(!a.matches(&HostPort::new("node-1.example.com", 9411)));
        assert!(!a.matches(&HostPort::new("10.0.0.1", 9410)));
        assert!(HostPort::new("[::1]", 1).matches(&HostPort::new("::1", 1)));
    }

    #[test]
    fn test_wildcards() {
        assert!(HostPort::new("0.0.0.0", 9410).is_wildcard());
        assert!(HostPort::new("::", 9410).is_wildcard());
        assert!(HostPort::new("[::]", 9410).is_wildcard());
        assert!(!HostPort::new("127.0.0.1", 9410).is_wildcard());
        assert!(!HostPort::new("localhost", 9410).is_wildcard());
    }

    #[test]
    fn test_endpoint_identity_is_node_uid() {
        let uid = Uid::new_uid();
        let a = Endpoint::new(uid, "n1", EndpointKind::Internal, HostPort::new("a", 1));
        let b = Endpoint::new(uid, "renamed", EndpointKind::Public, HostPort::new("b", 2));
        assert_eq!(a, b);
        assert_ne!(a, Endpoint::new(Uid::new_uid(), "n1", EndpointKind::Internal, HostPort::new("a", 1)));
        assert_eq!(a.to_string(), "n1@a:1");
    }
}
