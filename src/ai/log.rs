//! Leveled AI log sink on top of `tracing`

use crate::core::types::FactionIndex;

/// Emit an AI log line when `level` is within the configured verbosity
///
/// Levels 1-2 are routine decisions, 3 is per-rule execution, 4 and
/// above is chatter such as base stability checks.
pub fn print_log(faction: FactionIndex, verbosity: u8, level: u8, message: &str) {
    if level > verbosity {
        return;
    }
    match level {
        0..=2 => tracing::info!(faction, level, "{}", message),
        3 => tracing::debug!(faction, level, "{}", message),
        _ => tracing::trace!(faction, level, "{}", message),
    }
}
