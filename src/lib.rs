//! Mission Judge
//!
//! Turns a parent's mission description into a checklist, reads the photos a
//! child submits as evidence, and grades how much of the mission was done:
//! - Checklist generation from category + free-text details
//! - Vision analysis of up to ten photos (before/after for cleaning)
//! - Completion percent with a fixed 60% pass line
//! - Gemini, OpenAI-compatible and Ollama backends with retry

pub mod agent;
pub mod config;
pub mod error;
pub mod mission;
pub mod orchestrator;
pub mod utils;

// Re-exports for convenience
pub use agent::LLMProvider;
pub use config::{ConfigManager, JudgeConfig};
pub use error::{JudgeError, JudgeResult};
pub use mission::{MissionCategory, StageOutput, Verdict};
pub use orchestrator::{MissionJudge, Session};
