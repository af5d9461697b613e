// src/host/instance.rs

use tracing::{info, warn};

use super::HostEnvironment;

/// Index of the current instance, from the host's instance identifier.
pub fn current_instance_index(host: &dyn HostEnvironment) -> usize {
    let id = host.instance_id();
    let index = parse_instance_index(&id);
    info!(instance_id = %id, index, "resolved instance index");
    index
}

/// Trailing integer of an instance identifier.
///
/// Tries the text after the last `_`, then after the last `.`. If neither
/// parses, logs a warning and returns 0.
pub fn parse_instance_index(instance_id: &str) -> usize {
    let after = |delim: char| {
        let start = instance_id.rfind(delim).map(|i| i + 1).unwrap_or(0);
        instance_id[start..].parse::<usize>().ok()
    };

    match after('_').or_else(|| after('.')) {
        Some(index) => index,
        None => {
            warn!(
                instance_id = %instance_id,
                "instance index not found in identifier; defaulting to 0"
            );
            0
        }
    }
}
