//! Forgiving deserializers for model-generated JSON
//!
//! Generated objects use whatever shapes the model felt like: numbers as
//! strings, lists as comma-separated strings, `null` for unknown. These
//! helpers coerce the common variants and treat anything else as absent.

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::LazyLock;

static AMOUNT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(억|천만|백만|만|천)?").unwrap());

/// Parse a KRW amount such as `"150만원"`, `"1,200,000원"` or `"2.5백만"`
///
/// Returns `None` when no number is present.
pub fn parse_amount(text: &str) -> Option<u64> {
    let cleaned = text.replace([',', ' '], "");
    let caps = AMOUNT_REGEX.captures(&cleaned)?;

    let number: f64 = caps.get(1)?.as_str().parse().ok()?;
    let unit = match caps.get(2).map(|m| m.as_str()) {
        Some("억") => 100_000_000.0,
        Some("천만") => 10_000_000.0,
        Some("백만") => 1_000_000.0,
        Some("만") => 10_000.0,
        Some("천") => 1_000.0,
        _ => 1.0,
    };

    let amount = (number * unit).round();
    (amount.is_finite() && amount >= 0.0).then_some(amount as u64)
}

fn value_to_amount(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_to_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null | Value::Object(_) => String::new(),
    };
    (!text.is_empty()).then_some(text)
}

fn value_to_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(value_to_text).collect(),
        Value::String(s) => s
            .split([',', '/', '·'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        other => value_to_text(other).into_iter().collect(),
    }
}

fn value_to_score(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok()?,
        _ => return None,
    };
    // 0-100 scales show up often enough to be worth normalizing
    let score = if raw > 1.0 && raw <= 100.0 { raw / 100.0 } else { raw };
    score.is_finite().then_some(score.clamp(0.0, 1.0))
}

/// KRW amount; zero reads as unknown
pub fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?
        .as_ref()
        .and_then(value_to_amount)
        .filter(|amount| *amount > 0))
}

pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<Value>::deserialize(d)?
        .as_ref()
        .and_then(value_to_text)
        .unwrap_or_default())
}

pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(value_to_text))
}

pub fn list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?
        .as_ref()
        .map(value_to_list)
        .unwrap_or_default())
}

pub fn score<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(value_to_score))
}
