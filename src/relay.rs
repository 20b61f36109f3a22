//! The retryable generation call sitting behind `POST /api/generate`.

use serde::Deserialize;

use crate::error::RelayError;
use crate::provider::{Provider, ProviderRequest};
use crate::retry::{RetryDecision, RetryPolicy};

pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant. Provide clear, concise, and helpful responses.";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1000;

/// Characters of the prompt echoed into logs.
const PROMPT_LOG_PREVIEW: usize = 100;

/// Body of `POST /api/generate`.
#[derive(Debug, Default, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

pub type GenerationResult = Result<String, RelayError>;

/// Fixed sampling parameters applied to every attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub model: String,
    pub system_instruction: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

impl SamplingParams {
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

/// Reject absent, empty and whitespace-only prompts.
pub fn validate_prompt(prompt: Option<&str>) -> Result<&str, RelayError> {
    match prompt {
        Some(p) if !p.trim().is_empty() => Ok(p),
        _ => Err(RelayError::InvalidInput),
    }
}

/// Forwards prompts to a provider with bounded, classified retries.
pub struct Relay<P> {
    provider: P,
    sampling: SamplingParams,
    policy: RetryPolicy,
}

impl<P: Provider> Relay<P> {
    pub fn new(provider: P, sampling: SamplingParams, policy: RetryPolicy) -> Self {
        Self {
            provider,
            sampling,
            policy,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn sampling(&self) -> &SamplingParams {
        &self.sampling
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Generate text for `prompt`.
    ///
    /// Attempts are strictly sequential: attempt N+1 starts only after attempt
    /// N's backoff has elapsed. The returned error is always the last one
    /// observed; callers map it with [`RelayError::user_message`].
    pub async fn generate(&self, prompt: Option<&str>) -> GenerationResult {
        let prompt = validate_prompt(prompt)?;

        let preview: String = prompt.chars().take(PROMPT_LOG_PREVIEW).collect();
        tracing::info!(provider = self.provider.name(), "generating response for prompt: {preview}");

        let req = ProviderRequest {
            prompt: prompt.to_string(),
            model: self.sampling.model.clone(),
            system_instruction: self.sampling.system_instruction.clone(),
            temperature: self.sampling.temperature,
            max_output_tokens: self.sampling.max_output_tokens,
        };

        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            tracing::debug!("attempt {attempt}/{max_attempts}");

            let err = match self.provider.generate(&req).await {
                Ok(text) if !text.is_empty() => {
                    tracing::info!(attempt, "response generated");
                    return Ok(text);
                }
                Ok(_) => RelayError::EmptyResponse {
                    provider: self.provider.name().to_string(),
                },
                Err(e) => e,
            };

            let class = err.classify();
            tracing::warn!(attempt, class = class.as_str(), "attempt failed: {err}");

            match self.policy.decide(attempt, class) {
                RetryDecision::RetryAfter(delay) => {
                    tracing::info!(
                        "{} - waiting {}ms before retry",
                        class.as_str(),
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::GiveUp => {
                    tracing::error!(attempt, class = class.as_str(), "giving up: {err}");
                    return Err(err);
                }
            }
        }
    }
}
