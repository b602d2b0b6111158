//! Plausibility checks applied to every enriched value before it is merged.
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use super::fields::EnrichField;
use crate::catalog::record::display_date;
use crate::catalog::Requirements;
use crate::normalization::{clamp_score, parse_date, parse_size_gb};

/// Idle RAM (MB) by desktop keyword; checked in order by containment.
pub static RAM_RANGES: &[(&str, (u32, u32))] = &[
    ("gnome", (900, 1600)),
    ("kde plasma", (800, 1400)),
    ("kde", (800, 1400)),
    ("plasma", (800, 1400)),
    ("xfce", (400, 700)),
    ("lxqt", (350, 600)),
    ("lxde", (300, 550)),
    ("mate", (600, 900)),
    ("cinnamon", (700, 1000)),
    ("budgie", (700, 1000)),
    ("i3", (300, 500)),
    ("sway", (300, 500)),
    ("openbox", (300, 500)),
    ("pantheon", (800, 1200)),
    ("deepin", (900, 1300)),
];

pub const DEFAULT_RAM_RANGE: (u32, u32) = (300, 2000);

/// Distributions that never idle light, whatever desktop is reported.
pub static HEAVY_DISTROS: &[&str] = &[
    "ubuntu",
    "fedora",
    "zorin",
    "deepin",
    "pop!_os",
    "opensuse",
    "kde neon",
    "nobara",
    "garuda",
    "elementary",
];

pub const HEAVY_RAM_FLOOR: u32 = 1000;
pub const DEFAULT_RAM_MB: u32 = 800;
pub const DEFAULT_SCORE: f64 = 7.0;

fn decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("static regex"))
}

/// Megabytes from a free-form RAM answer ("~550MB", "1.5 GB", "700").
/// Gigabytes convert at 1 GB = 1000 MB, matching `parse_size_gb`; a bare
/// number is already megabytes.
fn parse_ram_mb(raw: &str) -> Option<u32> {
    let lower = raw.to_ascii_lowercase();
    let mb = if lower.contains("gb") || lower.contains("gib") {
        parse_size_gb(raw)? * 1000.0
    } else {
        decimal_re()
            .find(&lower.replace(',', "."))?
            .as_str()
            .parse::<f64>()
            .ok()?
    };
    mb.is_finite().then(|| mb.round().max(0.0) as u32)
}

fn is_heavy(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    HEAVY_DISTROS.iter().any(|h| lower.starts_with(h))
}

/// `[min, max]` MB for the desktop; unknown desktops get the wide default,
/// raised to the heavy floor for known heavyweight distributions.
pub fn ram_range(name: &str, desktop: Option<&str>) -> (u32, u32) {
    let lower = desktop.map(|d| d.trim().to_lowercase()).unwrap_or_default();
    if !lower.is_empty() {
        if let Some((_, range)) = RAM_RANGES.iter().find(|(key, _)| lower.contains(key)) {
            return *range;
        }
    }
    let (min, max) = DEFAULT_RAM_RANGE;
    if is_heavy(name) {
        (min.max(HEAVY_RAM_FLOOR), max)
    } else {
        (min, max)
    }
}

pub fn clamp_idle_ram(name: &str, desktop: Option<&str>, raw: &Value) -> u32 {
    let parsed = match raw {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(|v| v.round().max(0.0) as u32),
        Value::String(s) => parse_ram_mb(s),
        _ => None,
    };
    let value = parsed.unwrap_or_else(|| {
        warn!(name, raw = %raw, fallback = DEFAULT_RAM_MB, "enrich: invalid RAM value");
        DEFAULT_RAM_MB
    });
    let (min, max) = ram_range(name, desktop);
    let clamped = value.clamp(min, max);
    if clamped != value {
        warn!(
            name,
            desktop = desktop.unwrap_or("-"),
            raw = value,
            clamped,
            "enrich: RAM outside plausible range"
        );
    }
    clamped
}

pub fn coerce_score(raw: &Value) -> f64 {
    let parsed = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    };
    match parsed.filter(|v| v.is_finite()) {
        Some(v) => clamp_score(v),
        None => DEFAULT_SCORE,
    }
}

fn text(raw: &Value) -> Option<String> {
    let s = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Null => return None,
        Value::Array(items) => items
            .iter()
            .filter_map(text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    };
    (!s.is_empty()).then_some(s)
}

/// Context the per-field rules need.
pub struct FieldContext<'a> {
    pub name: &'a str,
    pub desktop: Option<&'a str>,
}

/// Normalized value for one field, or `None` when there is nothing usable and no default.
pub fn validate_field(field: EnrichField, raw: &Value, ctx: &FieldContext<'_>) -> Option<Value> {
    match field {
        EnrichField::IdleRamUsage => Some(Value::from(clamp_idle_ram(ctx.name, ctx.desktop, raw))),
        EnrichField::CpuScore | EnrichField::IoScore => Some(Value::from(coerce_score(raw))),
        EnrichField::Requirements => {
            let tier = text(raw)
                .and_then(|s| Requirements::parse(&s))
                .unwrap_or_default();
            Some(serde_json::to_value(tier).unwrap_or(Value::Null))
        }
        EnrichField::ImageSize => match raw {
            Value::Number(n) => n.as_f64().filter(|v| *v > 0.0).map(Value::from),
            _ => text(raw).and_then(|s| parse_size_gb(&s)).map(Value::from),
        },
        EnrichField::LatestRelease => text(raw)
            .and_then(|s| parse_date(&s))
            .map(|d| Value::from(d.format(display_date::FORMAT).to_string())),
        EnrichField::Unknown => None,
        _ => text(raw).map(Value::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(name: &'a str, desktop: Option<&'a str>) -> FieldContext<'a> {
        FieldContext { name, desktop }
    }

    #[test]
    fn gnome_floor_applies_to_low_values() {
        assert_eq!(clamp_idle_ram("Ubuntu", Some("GNOME"), &Value::from(250)), 900);
        assert_eq!(clamp_idle_ram("Ubuntu", Some("GNOME 46"), &Value::from("3000 MB")), 1600);
        assert_eq!(clamp_idle_ram("Mint", Some("Xfce"), &Value::from("~550MB")), 550);
    }

    #[test]
    fn fractional_gigabytes_convert_before_clamping() {
        assert_eq!(clamp_idle_ram("Ubuntu", Some("GNOME"), &Value::from("1.5 GB")), 1500);
        assert_eq!(clamp_idle_ram("Ubuntu", Some("GNOME"), &Value::from("1,2GB")), 1200);
        assert_eq!(clamp_idle_ram("Ubuntu", Some("GNOME"), &Value::from("about 2 GB")), 1600);
        assert_eq!(clamp_idle_ram("Mint", Some("Xfce"), &Value::from("612.6 MB")), 613);
        assert_eq!(parse_ram_mb("no idea"), None);
    }

    #[test]
    fn unknown_desktop_uses_default_and_heavy_floor() {
        assert_eq!(ram_range("Alpine", None), DEFAULT_RAM_RANGE);
        assert_eq!(ram_range("Fedora Workstation", Some("Hyprland")), (1000, 2000));
        assert_eq!(clamp_idle_ram("Fedora", None, &Value::from(400)), 1000);
    }

    #[test]
    fn invalid_ram_falls_back_to_default() {
        assert_eq!(clamp_idle_ram("Alpine", None, &Value::from("unknown")), DEFAULT_RAM_MB);
        assert_eq!(clamp_idle_ram("Alpine", Some("lxqt"), &Value::Null), 600);
    }

    #[test]
    fn scores_are_clamped_and_defaulted() {
        assert_eq!(coerce_score(&Value::from(-3)), 1.0);
        assert_eq!(coerce_score(&Value::from(15)), 10.0);
        assert_eq!(coerce_score(&Value::from(7.5)), 7.5);
        assert_eq!(coerce_score(&Value::from("8,26")), 8.3);
        assert_eq!(coerce_score(&Value::from("fast")), DEFAULT_SCORE);
    }

    #[test]
    fn categorical_and_text_fields() {
        let c = ctx("Arch", None);
        assert_eq!(
            validate_field(EnrichField::Requirements, &Value::from("Leve"), &c),
            Some(Value::from("Light"))
        );
        assert_eq!(
            validate_field(EnrichField::Requirements, &Value::from(3), &c),
            Some(Value::from("Medium"))
        );
        assert_eq!(
            validate_field(EnrichField::ImageSize, &Value::from("800 MB"), &c),
            Some(Value::from(0.8))
        );
        assert_eq!(validate_field(EnrichField::ImageSize, &Value::from("n/a"), &c), None);
        assert_eq!(
            validate_field(EnrichField::LatestRelease, &Value::from("2025-03-01"), &c),
            Some(Value::from("01/03/2025"))
        );
        assert_eq!(
            validate_field(EnrichField::OfficeSuite, &Value::from("  LibreOffice "), &c),
            Some(Value::from("LibreOffice"))
        );
        assert_eq!(validate_field(EnrichField::Origin, &Value::from(""), &c), None);
    }
}
