//! Shared Markdown formatting helpers for gatherer reports.

use chrono::{DateTime, Utc};

use research_core::GatherRequest;

/// Compact money/quantity formatting: `$1.2B`, `-$340.5M`, `1.5K`.
pub fn format_number(value: f64, prefix: &str) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let v = value.abs();

    let formatted = if v >= 1e12 {
        format!("{:.1}T", v / 1e12)
    } else if v >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if v >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if v >= 1e3 {
        format!("{:.1}K", v / 1e3)
    } else {
        format!("{:.2}", v)
    };

    format!("{sign}{prefix}{formatted}")
}

/// Year-over-year trend suffix, empty when either value is missing or the
/// base is zero.
pub fn trend_suffix(prev: Option<f64>, curr: Option<f64>) -> String {
    let (prev, curr) = match (prev, curr) {
        (Some(p), Some(c)) if p != 0.0 => (p, c),
        _ => return String::new(),
    };

    let pct = (curr - prev) / prev.abs() * 100.0;
    let arrow = if pct > 0.0 {
        "↑"
    } else if pct < 0.0 {
        "↓"
    } else {
        "→"
    };
    format!(" {} {:+.1}% YoY", arrow, pct)
}

/// Standard report header: title, generation timestamp, and the optional
/// theme/directive context lines.
pub fn report_header(
    title: &str,
    request: &GatherRequest,
    generated_at: DateTime<Utc>,
    extra: &[String],
) -> String {
    let mut lines = vec![
        format!("# {}: ${} ({})", title, request.ticker, request.company),
        format!("*Generated: {}*", generated_at.to_rfc3339()),
    ];
    for line in extra {
        lines.push(format!("*{}*", line));
    }
    if let Some(theme) = &request.theme {
        lines.push(format!("*Theme: {}*", theme));
    }
    if let Some(directive) = &request.directive {
        lines.push(format!("*Directive: {}*", directive));
    }
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());
    lines.join("\n")
}
