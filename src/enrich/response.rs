//! Pulling a flat JSON object out of free-form model output.
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

fn think_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("static regex"))
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json)?").expect("static regex"))
}

/// Drops `<think>` blocks and code fences.
pub fn strip_reasoning(text: &str) -> String {
    let without_think = think_re().replace_all(text, "");
    fence_re().replace_all(&without_think, "").trim().to_string()
}

/// The first balanced `{...}` span, skipping braces inside string literals.
/// Both quote styles count as strings so single-quoted pseudo-JSON balances too.
pub fn outermost_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        let mut depth = 0usize;
        let mut in_string: Option<u8> = None;
        let mut escaped = false;
        for (i, &b) in bytes.iter().enumerate().skip(start) {
            if let Some(quote) = in_string {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == quote {
                    in_string = None;
                }
                continue;
            }
            match b {
                b'"' | b'\'' => in_string = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[start..=i]);
                    }
                }
                _ => {}
            }
        }
        search_from = start + 1;
    }
    None
}

/// Decode the object embedded in a completion. Errors are human-readable reasons.
pub fn parse_object(completion: &str) -> Result<Map<String, Value>, String> {
    let cleaned = strip_reasoning(completion);
    let candidate = outermost_object(&cleaned).ok_or_else(|| "no JSON object in response".to_string())?;
    let value: Value = match serde_json::from_str(candidate) {
        Ok(v) => v,
        Err(first) => serde_json::from_str(&candidate.replace('\'', "\""))
            .map_err(|_| format!("unparsable JSON object: {first}"))?,
    };
    match value {
        Value::Object(map) => Ok(map),
        other => Err(format!("expected an object, got {other}")),
    }
}
