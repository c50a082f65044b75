//! Default values applied when a setting is not configured.

use dynconf_core::{Measure, MemoryUnit, RawPath, TimeUnit, Uid};
use std::collections::BTreeMap;

/// Default node port.
pub const PORT: u16 = 9410;
/// Default node group port.
pub const GROUP_PORT: u16 = 9430;
/// Default bind address (wildcard).
pub const BIND_ADDRESS: &str = "0.0.0.0";
/// Default group bind address (wildcard).
pub const GROUP_BIND_ADDRESS: &str = "0.0.0.0";
/// Default hostname: the local hostname placeholder.
pub const HOSTNAME: &str = "%h";
/// Default metadata directory.
pub const METADATA_DIR: &str = "%H/terracotta/metadata";
/// Default log directory.
pub const LOG_DIR: &str = "%H/terracotta/logs";
/// Name of the default data directory and off-heap resource.
pub const MAIN: &str = "main";
/// Default path of the `main` data directory.
pub const MAIN_DATA_DIR: &str = "%H/terracotta/user-data/main";
/// Default size of the `main` off-heap resource, in megabytes.
pub const MAIN_OFFHEAP_MB: u64 = 512;
/// Default client reconnect window, in seconds.
pub const CLIENT_RECONNECT_WINDOW_SECS: u64 = 120;
/// Default client lease duration, in seconds.
pub const CLIENT_LEASE_DURATION_SECS: u64 = 150;

/// A freshly generated node name.
pub fn node_name() -> String {
    format!("node-{}", Uid::new_uid())
}

/// A freshly generated stripe name.
pub fn stripe_name() -> String {
    format!("stripe-{}", Uid::new_uid())
}

/// Default data directories.
pub fn data_dirs() -> BTreeMap<String, RawPath> {
    BTreeMap::from([(MAIN.to_string(), RawPath::new(MAIN_DATA_DIR))])
}

/// Default off-heap resources.
pub fn offheap_resources() -> BTreeMap<String, Measure<MemoryUnit>> {
    BTreeMap::from([(
        MAIN.to_string(),
        Measure::of(MAIN_OFFHEAP_MB, MemoryUnit::MB),
    )])
}

/// Default client reconnect window.
pub fn client_reconnect_window() -> Measure<TimeUnit> {
    Measure::of(CLIENT_RECONNECT_WINDOW_SECS, TimeUnit::Seconds)
}

/// Default client lease duration.
pub fn client_lease_duration() -> Measure<TimeUnit> {
    Measure::of(CLIENT_LEASE_DURATION_SECS, TimeUnit::Seconds)
}
