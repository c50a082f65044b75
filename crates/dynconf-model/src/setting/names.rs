//! Configuration key names.

/// Node UID.
pub const NODE_UID: &str = "node-uid";
/// Node name.
pub const NODE_NAME: &str = "name";
/// Node internal hostname.
pub const HOSTNAME: &str = "hostname";
/// Node port.
pub const PORT: &str = "port";
/// Node public hostname.
pub const PUBLIC_HOSTNAME: &str = "public-hostname";
/// Node public port.
pub const PUBLIC_PORT: &str = "public-port";
/// Node group port.
pub const GROUP_PORT: &str = "group-port";
/// Node bind address.
pub const BIND_ADDRESS: &str = "bind-address";
/// Node group bind address.
pub const GROUP_BIND_ADDRESS: &str = "group-bind-address";
/// Node metadata directory.
pub const METADATA_DIR: &str = "metadata-dir";
/// Node log directory.
pub const LOG_DIR: &str = "log-dir";
/// Node backup directory.
pub const BACKUP_DIR: &str = "backup-dir";
/// Node security directory.
pub const SECURITY_DIR: &str = "security-dir";
/// Node security audit log directory.
pub const AUDIT_LOG_DIR: &str = "audit-log-dir";
/// Node data directories.
pub const DATA_DIRS: &str = "data-dirs";
/// Node off-heap resources.
pub const OFFHEAP_RESOURCES: &str = "offheap-resources";
/// Raw server properties.
pub const TC_PROPERTIES: &str = "tc-properties";
/// Logger level overrides.
pub const LOGGER_OVERRIDES: &str = "logger-overrides";

/// Cluster UID.
pub const CLUSTER_UID: &str = "cluster-uid";
/// Cluster name.
pub const CLUSTER_NAME: &str = "cluster-name";
/// Configuration lock holder.
pub const LOCK_CONTEXT: &str = "lock-context";
/// Client reconnect window.
pub const CLIENT_RECONNECT_WINDOW: &str = "client-reconnect-window";
/// Client lease duration.
pub const CLIENT_LEASE_DURATION: &str = "client-lease-duration";
/// Failover priority.
pub const FAILOVER_PRIORITY: &str = "failover-priority";
/// License file to install.
pub const LICENSE_FILE: &str = "license-file";
/// Authentication scheme.
pub const SECURITY_AUTHC: &str = "authc";
/// SSL/TLS switch.
pub const SECURITY_SSL_TLS: &str = "ssl-tls";
/// IP whitelist switch.
pub const SECURITY_WHITELIST: &str = "whitelist";

/// Stripe name, exported with the stripe but not a setting.
pub const STRIPE_NAME: &str = "stripe-name";
/// Stripe UID, exported with the stripe but not a setting.
pub const STRIPE_UID: &str = "stripe-uid";
