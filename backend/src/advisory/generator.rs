use std::sync::Arc;
use std::time::Duration;

use shared::RiskLevel;

use super::client::{ChatClient, ChatMessage, ChatRequest};
use super::prompt::{SYSTEM_PROMPT, build_prompt};
use super::report::AdvisoryReport;
use super::retry::RetryPolicy;
use super::AdvisoryError;
use crate::config::AdvisoryConfig;
use crate::inference::risk;

/// Every degraded advisory starts with this.
pub const FALLBACK_PREFIX: &str = "LLM generation error:";

pub fn degraded_advisory(err: &AdvisoryError) -> String {
    format!("{} {}", FALLBACK_PREFIX, err)
}

pub struct AdvisoryGenerator {
    client: Arc<dyn ChatClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    retry: RetryPolicy,
    total_timeout: Duration,
}

impl AdvisoryGenerator {
    pub fn new(client: Arc<dyn ChatClient>, config: &AdvisoryConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            retry: RetryPolicy::from(&config.retry),
            total_timeout: Duration::from_secs(config.total_timeout_secs),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_total_timeout(mut self, total_timeout: Duration) -> Self {
        self.total_timeout = total_timeout;
        self
    }

    pub fn build_request(&self, disease: &str, confidence: f32) -> ChatRequest {
        let risk: RiskLevel = risk::classify(confidence);
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(build_prompt(disease, confidence, risk)),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Always yields text: the validated advisory, or a degraded message that
    /// starts with [`FALLBACK_PREFIX`].
    pub async fn generate(&self, disease: &str, confidence: f32) -> String {
        let request = self.build_request(disease, confidence);
        let outcome = tokio::time::timeout(self.total_timeout, self.generate_report(&request))
            .await
            .unwrap_or(Err(AdvisoryError::Timeout(self.total_timeout)));

        match outcome {
            Ok(report) => {
                log::debug!(
                    "Advisory for {}: {} sections, {} chars",
                    disease,
                    report.sections().len(),
                    report.text().len()
                );
                report.into_text()
            }
            Err(err) => {
                log::warn!("Falling back to degraded advisory for {}: {}", disease, err);
                degraded_advisory(&err)
            }
        }
    }

    async fn generate_report(&self, request: &ChatRequest) -> Result<AdvisoryReport, AdvisoryError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self
                .client
                .complete(request)
                .await
                .and_then(|text| AdvisoryReport::parse(&text));

            match result {
                Ok(report) => return Ok(report),
                Err(err) if err.is_retryable() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_for(attempt);
                    log::warn!(
                        "Advisory attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        self.retry.max_attempts,
                        err,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
