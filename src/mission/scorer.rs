//! Completion Scorer - grades the mission and decides pass/fail.
//!
//! The model proposes a completion percent; the pass flag is always
//! recomputed here from the clamped percent.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::lenient;
use super::parse::{parse_stage, StageOutput};
use super::prompts::{checklist_json, grading_prompt};
use super::types::{ItemGrade, MissionSpec, ObservationReport, Verdict};

/// Gap between the item-grade average and the reported percent worth a warning.
const ITEM_GRADE_TOLERANCE: f64 = 30.0;
use crate::agent::{LLMProvider, Prompt};
use crate::config::DEFAULT_MODEL;
use crate::error::JudgeResult;
use crate::utils::preview;

/// Verdict exactly as the model wrote it, before clamping.
#[derive(Debug, Default, Deserialize)]
struct RawVerdict {
    #[serde(default)]
    completion_percent: Value,
    #[serde(default)]
    pass: Value,
    #[serde(default, deserialize_with = "lenient::string_list")]
    reason_summary: Vec<String>,
    #[serde(default, deserialize_with = "lenient::objects")]
    item_grades: Vec<ItemGrade>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    missing_or_unclear: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    next_request_to_child: Vec<String>,
}

impl RawVerdict {
    fn into_verdict(self) -> Verdict {
        let percent = lenient::number(&self.completion_percent).unwrap_or(0.0);
        let model_pass = match self.pass {
            Value::Bool(b) => Some(b),
            Value::String(ref s) => s.trim().parse::<bool>().ok(),
            _ => None,
        };

        Verdict {
            reason_summary: self.reason_summary,
            item_grades: self.item_grades,
            missing_or_unclear: self.missing_or_unclear,
            next_request_to_child: self.next_request_to_child,
            model_pass,
            ..Verdict::from_percent(percent)
        }
    }
}

pub struct CompletionScorer {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl CompletionScorer {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Grade the observations against the checklist.
    ///
    /// Upstream stages that did not parse are still passed along as their
    /// raw/error objects so the model can grade conservatively.
    pub async fn score(
        &self,
        mission: &StageOutput<MissionSpec>,
        report: &StageOutput<ObservationReport>,
    ) -> JudgeResult<StageOutput<Verdict>> {
        let checklist = match mission {
            StageOutput::Parsed(spec) => checklist_json(&spec.checklist),
            other => other.to_prompt_json(),
        };
        info!(report_parsed = report.is_parsed(), "Scoring mission completion");

        let prompt = grading_prompt(&checklist, &report.to_prompt_json());
        let content = self.provider.generate(&self.model, Prompt::text(prompt)).await?;
        debug!("Grading response: {}", preview(&content));

        let output = parse_stage::<RawVerdict>(&content).map(RawVerdict::into_verdict);
        if let StageOutput::Parsed(verdict) = &output {
            if let Some(model_pass) = verdict.disagreement() {
                warn!(
                    model_pass,
                    pass = verdict.pass,
                    percent = verdict.completion_percent,
                    "Model pass flag disagrees with completion percent; using recomputed flag"
                );
            }
            if let Some(items) = verdict.item_grade_percent() {
                if (items - verdict.completion_percent).abs() > ITEM_GRADE_TOLERANCE {
                    warn!(
                        item_percent = items,
                        percent = verdict.completion_percent,
                        "Item grades do not match the completion percent"
                    );
                }
            }
        }
        Ok(output)
    }
}
