use crate::platform::types::{AlertFields, Severity};

/// Only pip alerts are remediated; Poetry is the sole supported tool.
pub const TARGET_ECOSYSTEM: &str = "pip";

/// Accept open pip alerts at or above `threshold`. Unknown severities rank
/// below every threshold.
pub fn passes_filters(fields: &AlertFields, threshold: Severity) -> bool {
    if fields.state != "open" {
        return false;
    }
    if fields.ecosystem != TARGET_ECOSYSTEM {
        return false;
    }
    fields
        .severity
        .parse::<Severity>()
        .is_ok_and(|severity| severity >= threshold)
}
