use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Strategy describing how to interpret a rating field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatingStrategy {
    /// Visitor score already on a 0-10 scale.
    ZeroToTen,
    /// Score column on a 0-100 scale.
    ZeroToHundred,
    /// Price-like free text ("R$ 49,90", "Free"); the first number is read as a 0-100 rating.
    PriceText,
}

impl RatingStrategy {
    fn ceiling(&self) -> f64 {
        match self {
            RatingStrategy::ZeroToTen => 10.0,
            RatingStrategy::ZeroToHundred | RatingStrategy::PriceText => 100.0,
        }
    }
}

/// Normalize a raw rating string under the given strategy, clamping into the strategy's range.
pub fn normalize_rating(raw: &str, strategy: RatingStrategy) -> Option<f64> {
    let value = first_number(raw)?;
    Some(value.clamp(0.0, strategy.ceiling()))
}

/// Same as [`normalize_rating`] for JSON payload values (numbers or strings).
pub fn normalize_rating_value(value: &Value, strategy: RatingStrategy) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().map(|v| v.clamp(0.0, strategy.ceiling())),
        Value::String(s) => normalize_rating(s, strategy),
        _ => None,
    }
}

/// Performance scores live in [1.0, 10.0] with one decimal place.
pub fn clamp_score(value: f64) -> f64 {
    (value.clamp(1.0, 10.0) * 10.0).round() / 10.0
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("static regex"))
}

/// First decimal number in the text; a comma is accepted as the decimal separator.
pub(crate) fn first_number(input: &str) -> Option<f64> {
    let normalized = input.replace(',', ".");
    number_re()
        .find(&normalized)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
