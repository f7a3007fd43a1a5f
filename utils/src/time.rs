//! Duration formatting helpers.

use std::time::Duration;

/// Format a duration compactly for terminal output: `850ms`, `4.2s`,
/// `2m 05s`.
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis < 1_000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        let secs = d.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}
