pub mod client;
pub mod generator;
pub mod prompt;
pub mod report;
pub mod retry;

pub use client::{ChatClient, ChatMessage, ChatRequest, HttpChatClient};
pub use generator::{AdvisoryGenerator, FALLBACK_PREFIX, degraded_advisory};
pub use report::AdvisoryReport;
pub use retry::RetryPolicy;

use std::time::Duration;

#[derive(Debug, Clone, thiserror::Error)]
pub enum AdvisoryError {
    #[error("API key not configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("service returned no content")]
    EmptyResponse,
    #[error("advisory missing or empty section: {0}")]
    Malformed(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("advisory task failed: {0}")]
    Task(String),
}

impl AdvisoryError {
    /// Client errors other than 408/429 will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            AdvisoryError::MissingApiKey | AdvisoryError::Task(_) => false,
            AdvisoryError::Status { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            _ => true,
        }
    }
}
