//! Formatting helpers shared by the report and the CLI.

/// Format an optional day count as "3.2d", or "n/a" when undefined.
pub fn fmt_days(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}d", v),
        None => "n/a".to_string(),
    }
}

/// Format a percentage to one decimal, e.g. "12.5%".
pub fn fmt_pct(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Format a story-point total to one decimal, e.g. "21.0".
pub fn fmt_points(value: f64) -> String {
    format!("{:.1}", value)
}
