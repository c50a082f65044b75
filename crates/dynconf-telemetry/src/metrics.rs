//! Metric names emitted by the engine.
//!
//! The engine records through the `metrics` facade only. Whoever embeds it
//! installs a recorder, then calls [`describe_metrics`] once.

use metrics::describe_counter;

/// Counter of parsed configuration inputs, labeled by `outcome`.
pub const CONFIGURATIONS_PARSED: &str = "dynconf_configurations_parsed_total";

/// Counter of applied configurations, labeled by `setting`.
pub const CONFIGURATIONS_APPLIED: &str = "dynconf_configurations_applied_total";

/// Registers descriptions for every engine metric with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        CONFIGURATIONS_PARSED,
        "Configuration inputs parsed, by outcome (ok or error)"
    );
    describe_counter!(
        CONFIGURATIONS_APPLIED,
        "Configurations applied to a cluster or node, by setting"
    );
}
