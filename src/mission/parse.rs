//! Stage results and JSON extraction from model text.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one pipeline stage.
///
/// Serializes to the stage object itself, `{"_raw": text}` when the model
/// answer could not be read as the expected object, or `{"error": text}` when
/// the stage refused to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageOutput<T> {
    Failed {
        error: String,
    },
    Malformed {
        #[serde(rename = "_raw")]
        raw: String,
    },
    Parsed(T),
}

impl<T> StageOutput<T> {
    pub fn failed(error: impl Into<String>) -> Self {
        StageOutput::Failed {
            error: error.into(),
        }
    }

    pub fn malformed(raw: impl Into<String>) -> Self {
        StageOutput::Malformed { raw: raw.into() }
    }

    pub fn parsed(&self) -> Option<&T> {
        match self {
            StageOutput::Parsed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, StageOutput::Parsed(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StageOutput::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StageOutput<U> {
        match self {
            StageOutput::Parsed(value) => StageOutput::Parsed(f(value)),
            StageOutput::Malformed { raw } => StageOutput::Malformed { raw },
            StageOutput::Failed { error } => StageOutput::Failed { error },
        }
    }
}

impl<T: Serialize> StageOutput<T> {
    /// Compact JSON used when embedding a stage result into the next prompt.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Indented JSON for terminal output and audit files.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Pull a JSON value out of model text.
///
/// Accepts bare JSON, JSON inside a Markdown code fence, and JSON embedded in
/// surrounding prose (first `{` through last `}`).
pub fn extract_json(text: &str) -> Option<Value> {
    let body = strip_code_fence(text.trim());
    if let Ok(value) = serde_json::from_str(body) {
        return Some(value);
    }

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&body[start..=end]).ok()
}

/// Parse model text as a stage object, falling back to `Malformed`.
pub fn parse_stage<T: DeserializeOwned>(text: &str) -> StageOutput<T> {
    match extract_json(text) {
        Some(value @ Value::Object(_)) => match serde_json::from_value(value) {
            Ok(parsed) => StageOutput::Parsed(parsed),
            Err(e) => {
                tracing::debug!("Model JSON did not match the expected shape: {}", e);
                StageOutput::malformed(text.trim())
            }
        },
        _ => StageOutput::malformed(text.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::{MissionSpec, ObservationReport};
    use serde_json::json;

    #[test]
    fn test_extract_bare_and_fenced() {
        assert_eq!(extract_json(r#"{"a": 1}"#), Some(json!({ "a": 1 })));
        assert_eq!(extract_json("```json\n{\"a\": 1}\n```"), Some(json!({ "a": 1 })));
        assert_eq!(extract_json("```\n{\"a\": 1}\n```"), Some(json!({ "a": 1 })));
        assert_eq!(
            extract_json("Here you go: {\"a\": {\"b\": 2}} hope it helps"),
            Some(json!({ "a": { "b": 2 } }))
        );
        assert_eq!(extract_json("I cannot comply"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn test_non_json_becomes_raw() {
        let out: StageOutput<MissionSpec> = parse_stage("  I cannot comply \n");
        assert_eq!(out, StageOutput::malformed("I cannot comply"));
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({ "_raw": "I cannot comply" })
        );
    }

    #[test]
    fn test_non_object_json_becomes_raw() {
        let out: StageOutput<ObservationReport> = parse_stage("[1, 2, 3]");
        assert!(matches!(out, StageOutput::Malformed { .. }));
    }

    #[test]
    fn test_failed_serializes_as_error_object() {
        let out: StageOutput<ObservationReport> = StageOutput::failed("photo_paths is empty");
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({ "error": "photo_paths is empty" })
        );
        assert_eq!(out.error(), Some("photo_paths is empty"));
    }

    #[test]
    fn test_untagged_deserialize_picks_variant() {
        let failed: StageOutput<MissionSpec> =
            serde_json::from_value(json!({ "error": "boom" })).unwrap();
        let raw: StageOutput<MissionSpec> =
            serde_json::from_value(json!({ "_raw": "text" })).unwrap();
        let parsed: StageOutput<MissionSpec> =
            serde_json::from_value(json!({ "mission_summary": "tidy" })).unwrap();

        assert!(failed.error().is_some());
        assert_eq!(raw, StageOutput::malformed("text"));
        assert_eq!(parsed.parsed().unwrap().mission_summary, "tidy");
    }
}
