use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::ImageAttachment;
use crate::error::{JudgeError, JudgeResult};
use crate::utils::{truncate_text, TruncationPolicy};

/// Prompt used to check that the configured credential is accepted.
pub const PROBE_PROMPT: &str = "Reply with OK.";

const ERROR_BODY_BUDGET: TruncationPolicy = TruncationPolicy::Bytes(512);

/// A single user turn: instruction text followed by labelled images.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
    pub images: Vec<ImageAttachment>,
}

impl Prompt {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            images: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<ImageAttachment>) -> Self {
        self.images = images;
        self
    }
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(&self, model: &str, prompt: Prompt) -> JudgeResult<String>;

    /// Issue one trivial call so a bad credential fails before any real work.
    async fn probe(&self, model: &str) -> JudgeResult<()> {
        self.generate(model, Prompt::text(PROBE_PROMPT)).await.map(|_| ())
    }
}

async fn read_json(res: reqwest::Response) -> JudgeResult<Value> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(JudgeError::Status {
            status: status.as_u16(),
            body: truncate_text(&body, ERROR_BODY_BUDGET),
        });
    }
    Ok(res.json().await?)
}

fn http_client(timeout: Duration) -> JudgeResult<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

pub struct OllamaProvider {
    client: ollama_rs::Ollama,
}

impl OllamaProvider {
    pub fn new(client: ollama_rs::Ollama) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LLMProvider for OllamaProvider {
    async fn generate(&self, model: &str, prompt: Prompt) -> JudgeResult<String> {
        use ollama_rs::generation::chat::{request::ChatMessageRequest, ChatMessage};
        use ollama_rs::generation::images::Image;

        // Ollama takes images per message, so the labels are folded into the text.
        let mut text = prompt.text;
        for img in &prompt.images {
            text.push('\n');
            text.push_str(&img.label);
        }

        let mut message = ChatMessage::user(text);
        if !prompt.images.is_empty() {
            let images = prompt.images.iter().map(|img| Image::from_base64(&img.data)).collect();
            message = message.with_images(images);
        }

        let res = self
            .client
            .send_chat_messages(ChatMessageRequest::new(model.to_string(), vec![message]))
            .await
            .map_err(|e| JudgeError::Provider(e.to_string()))?;

        if res.message.content.trim().is_empty() {
            return Err(JudgeError::EmptyResponse);
        }
        Ok(res.message.content)
    }
}

pub struct OpenAICompatibleProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAICompatibleProvider {
    pub fn new(base_url: String, api_key: Option<String>, timeout: Duration) -> JudgeResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url,
            api_key,
        })
    }

    fn request_body(model: &str, prompt: &Prompt) -> Value {
        let mut content = vec![json!({ "type": "text", "text": prompt.text })];
        for img in &prompt.images {
            content.push(json!({ "type": "text", "text": img.label }));
            content.push(json!({ "type": "image_url", "image_url": { "url": img.data_url() } }));
        }

        json!({
            "model": model,
            "messages": [{ "role": "user", "content": content }],
            "temperature": 0.0,
        })
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn generate(&self, model: &str, prompt: Prompt) -> JudgeResult<String> {
        let body = Self::request_body(model, &prompt);

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .json(&body);

        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let json = read_json(request.send().await?).await?;

        json["choices"][0]["message"]["content"]
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .ok_or(JudgeError::EmptyResponse)
    }
}

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini through the Generative Language REST API.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(base_url: Option<String>, api_key: String, timeout: Duration) -> JudgeResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            api_key,
        })
    }

    fn request_body(prompt: &Prompt) -> Value {
        let mut parts = vec![json!({ "text": prompt.text })];
        for img in &prompt.images {
            parts.push(json!({ "text": img.label }));
            parts.push(json!({
                "inline_data": { "mime_type": img.mime_type, "data": img.data }
            }));
        }

        json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": { "temperature": 0.0 },
        })
    }

    fn response_text(json: &Value) -> Option<String> {
        let parts = json["candidates"][0]["content"]["parts"].as_array()?;
        let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn generate(&self, model: &str, prompt: Prompt) -> JudgeResult<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );
        debug!(model, images = prompt.images.len(), "Sending Gemini request");

        let res = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(&prompt))
            .send()
            .await?;

        let json = read_json(res).await?;
        Self::response_text(&json).ok_or(JudgeError::EmptyResponse)
    }
}
