//! Checklist Generator - turns a parent's request into a mission checklist.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::parse::{parse_stage, StageOutput};
use super::prompts::checklist_prompt;
use super::types::{MissionCategory, MissionSpec};
use crate::agent::{LLMProvider, Prompt};
use crate::config::DEFAULT_MODEL;
use crate::error::{JudgeError, JudgeResult};
use crate::utils::preview;

pub struct ChecklistGenerator {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl ChecklistGenerator {
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

    /// Generate the mission summary, checklist and upload guidance.
    ///
    /// Unparseable model output comes back as [`StageOutput::Malformed`]; only
    /// empty details or a failed model call are errors.
    pub async fn generate(
        &self,
        category: MissionCategory,
        details: &str,
        policy: &str,
    ) -> JudgeResult<StageOutput<MissionSpec>> {
        if details.trim().is_empty() {
            return Err(JudgeError::InvalidInput("mission details are empty".into()));
        }
        info!(%category, "Generating mission checklist");

        let prompt = checklist_prompt(category, details, policy);
        let content = self.provider.generate(&self.model, Prompt::text(prompt)).await?;
        debug!("Checklist response: {}", preview(&content));

        let output = parse_stage::<MissionSpec>(&content).map(|mut spec| {
            spec.category = Some(category);
            spec
        });

        match &output {
            StageOutput::Parsed(spec) => {
                debug!(items = spec.checklist.len(), "Checklist parsed");
            }
            _ => warn!("Checklist response was not valid JSON; keeping raw text"),
        }
        Ok(output)
    }
}
