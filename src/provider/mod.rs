pub mod gemini;
pub mod openai;

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;

use crate::config::{Config, ProviderKind};
use crate::error::RelayError;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

pub const MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024; // 2MB

/// Upper bound on a single upstream call. Generation with a 1000 token cap
/// finishes well inside this.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Internal per-attempt request. Every provider accepts this.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub prompt: String,
    pub model: String,
    /// Sent as a system message (OpenAI) or `systemInstruction` (Gemini).
    pub system_instruction: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
}

/// A text generation backend.
///
/// Implementations are built once at startup and shared across requests,
/// so they must not carry per-request state.
pub trait Provider: Send + Sync {
    /// Short vendor name used in logs and error context.
    fn name(&self) -> &'static str;

    /// One upstream call. No retries happen here.
    fn generate(
        &self,
        req: &ProviderRequest,
    ) -> impl Future<Output = Result<String, RelayError>> + Send;
}

/// Provider selected by configuration at process start.
pub enum AnyProvider {
    OpenAi(OpenAiProvider),
    Gemini(GeminiProvider),
}

impl AnyProvider {
    pub fn from_config(config: &Config) -> Result<Self, RelayError> {
        let client = build_client()?;
        let provider = match config.provider {
            ProviderKind::OpenAi => Self::OpenAi(OpenAiProvider::new(
                client,
                &config.base_url,
                &config.api_key,
            )),
            ProviderKind::Gemini => Self::Gemini(GeminiProvider::new(
                client,
                &config.base_url,
                &config.api_key,
            )),
        };
        Ok(provider)
    }
}

impl Provider for AnyProvider {
    fn name(&self) -> &'static str {
        match self {
            Self::OpenAi(p) => p.name(),
            Self::Gemini(p) => p.name(),
        }
    }

    async fn generate(&self, req: &ProviderRequest) -> Result<String, RelayError> {
        match self {
            Self::OpenAi(p) => p.generate(req).await,
            Self::Gemini(p) => p.generate(req).await,
        }
    }
}

/// Shared HTTP client with connection pooling.
pub fn build_client() -> Result<Client, RelayError> {
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(REQUEST_TIMEOUT)
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(4)
        .build()?;
    Ok(client)
}

/// Error envelope used by both OpenAI and Gemini:
/// `{"error": {"message": "...", ...}}`.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Send a JSON request and return the raw success body.
///
/// Non-2xx statuses become `Upstream` errors carrying the status code and the
/// vendor's own message when the body follows the usual error envelope.
pub(crate) async fn send_json(
    request: RequestBuilder,
    provider: &str,
) -> Result<Vec<u8>, RelayError> {
    let response = request.send().await?;
    let status = response.status();

    // Cap error body reads to MAX_RESPONSE_BYTES to prevent memory exhaustion
    if !status.is_success() {
        let error_bytes = response.bytes().await.unwrap_or_default();
        let truncated = &error_bytes[..error_bytes.len().min(MAX_RESPONSE_BYTES)];
        let message = serde_json::from_slice::<ErrorEnvelope>(truncated)
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or_else(|| format!("{status}: {}", String::from_utf8_lossy(truncated)));
        return Err(RelayError::upstream(provider, Some(status.as_u16()), message));
    }

    let bytes = response.bytes().await.map_err(|e| {
        RelayError::upstream(provider, None, format!("failed to read response body: {e}"))
    })?;

    if bytes.len() > MAX_RESPONSE_BYTES {
        return Err(RelayError::upstream(
            provider,
            None,
            format!(
                "response too large: {} bytes (max {})",
                bytes.len(),
                MAX_RESPONSE_BYTES
            ),
        ));
    }

    Ok(bytes.to_vec())
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
