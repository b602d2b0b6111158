use std::sync::OnceLock;

use regex::Regex;

fn size_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(tb|gb|gib|g|mb|mib|m|kb|k)?\b").expect("static regex")
    })
}

/// Normalize a size string to gigabytes ("800 MB" -> 0.8, "2,5 GB" -> 2.5).
///
/// Units are decimal (1 GB = 1000 MB). A bare number is read as gigabytes.
pub fn parse_size_gb(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    let caps = size_re().captures(&normalized)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_default();
    let gb = match unit.as_str() {
        "tb" => value * 1000.0,
        "mb" | "mib" | "m" => value / 1000.0,
        "kb" | "k" => value / 1_000_000.0,
        _ => value,
    };
    Some((gb * 1000.0).round() / 1000.0)
}
