//! Scripted provider for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{LLMProvider, Prompt};
use crate::error::{JudgeError, JudgeResult};

#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<JudgeResult<String>>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        for r in responses {
            provider.push_ok(r);
        }
        provider
    }

    pub fn push_ok(&self, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn push_err(&self, err: JudgeError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn generate(&self, _model: &str, prompt: Prompt) -> JudgeResult<String> {
        self.prompts.lock().unwrap().push(prompt);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(JudgeError::Provider("script exhausted".into())))
    }
}
