//! Error types shared by the judging pipeline.

use thiserror::Error;

/// Errors that can stop a judging stage.
///
/// Malformed model output is *not* an error: it is carried forward as
/// [`crate::mission::StageOutput::Malformed`]. These variants cover the cases
/// where no usable answer was obtained at all.
#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model backend returned no text")]
    EmptyResponse,

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JudgeError {
    /// Whether a retry has a reasonable chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            JudgeError::Http(e) => e.is_timeout() || e.is_connect(),
            JudgeError::Status { status, .. } => *status == 429 || (500..600).contains(status),
            JudgeError::EmptyResponse => true,
            _ => false,
        }
    }
}

pub type JudgeResult<T> = Result<T, JudgeError>;
