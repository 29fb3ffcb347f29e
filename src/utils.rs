use crate::prelude::Duration;

/// Converts a [Duration] to a [std::time::Duration], negative
/// durations saturating to zero.
pub fn std_duration(dt: Duration) -> std::time::Duration {
    std::time::Duration::from_secs_f64(dt.to_seconds().max(0.0))
}

/// Renders a signed integer padded with zeros to `width` characters,
/// the sign (when any) taking the first position. Values wider than
/// `width` are rendered untouched.
pub fn zero_fill(value: i64, width: usize) -> String {
    let digits = value.unsigned_abs().to_string();
    if value < 0 {
        format!("-{:0>w$}", digits, w = width.saturating_sub(1))
    } else {
        format!("{:0>w$}", digits, w = width)
    }
}
