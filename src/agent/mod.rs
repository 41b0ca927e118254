//! Agent Module
//!
//! Model backends behind a single `generate(model, prompt)` seam, plus the
//! retry wrapper and image attachment helpers.

mod attachment;
mod provider;
mod retry;
#[cfg(test)]
pub(crate) mod testing;

pub use attachment::{mime_for_path, ImageAttachment, DEFAULT_IMAGE_MIME};
pub use provider::{
    GeminiProvider, LLMProvider, OllamaProvider, OpenAICompatibleProvider, Prompt,
    GEMINI_BASE_URL, PROBE_PROMPT,
};
pub use retry::{RetryPolicy, RetryingProvider};
