//! Rendering of protocol windows for log fields.

use std::time::Duration;

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Render `window` with its two largest non-zero units, e.g. `"1h 30m"`.
/// Sub-second windows are shown in milliseconds.
pub fn format_duration(window: Duration) -> String {
    let mut rest = window.as_secs();
    if rest == 0 {
        return format!("{}ms", window.subsec_millis());
    }
    let mut parts = Vec::with_capacity(2);
    for (size, unit) in UNITS {
        if parts.len() == 2 {
            break;
        }
        let count = rest / size;
        rest %= size;
        if count > 0 {
            parts.push(format!("{count}{unit}"));
        } else if !parts.is_empty() {
            break;
        }
    }
    parts.join(" ")
}
