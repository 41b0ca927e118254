//! Tolerant field decoders for model-produced JSON.
//!
//! Models drift from the requested schema: a list comes back as a single
//! string, a count as `"2"`, a checklist as bare strings. These decoders
//! accept the common drifts instead of rejecting the whole object.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::types::{AnalysisMode, ChecklistItem, MissionCategory};

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?).unwrap_or_default())
}

pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
        Value::String(s) if s.trim().is_empty() => Vec::new(),
        other => scalar_text(other).into_iter().collect(),
    };
    Ok(list)
}

/// Non-negative integer from a number or numeric string; 0 otherwise.
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = number(&Value::deserialize(deserializer)?).unwrap_or(0.0);
    Ok(if n.is_finite() && n > 0.0 { n.round().min(u32::MAX as f64) as u32 } else { 0 })
}

pub fn category<'de, D>(deserializer: D) -> Result<Option<MissionCategory>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s.parse().ok(),
        _ => None,
    })
}

pub fn mode<'de, D>(deserializer: D) -> Result<AnalysisMode, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// List of objects; entries that do not decode are skipped.
pub fn objects<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect(),
        _ => Vec::new(),
    })
}

pub fn checklist<'de, D>(deserializer: D) -> Result<Vec<ChecklistItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };

    let mut checklist = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(text) => checklist.push(ChecklistItem {
                item: text,
                evidence_hint: String::new(),
            }),
            obj @ Value::Object(_) => {
                checklist.push(serde_json::from_value(obj).map_err(serde::de::Error::custom)?)
            }
            _ => {}
        }
    }
    Ok(checklist)
}

/// Coerce a JSON value to a float the way a lenient reader would:
/// numbers as-is, numeric strings (an optional trailing `%` allowed) parsed.
/// Infinities and NaN are rejected.
pub fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}
