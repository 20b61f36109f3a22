use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::provider::{Provider, ProviderRequest, endpoint, send_json};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Google Gemini `models/{model}:generateContent`.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiProvider {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url_for(&self, model: &str) -> String {
        endpoint(
            &self.base_url,
            &format!("/v1beta/models/{model}:generateContent"),
        )
    }
}

impl Provider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, req: &ProviderRequest) -> Result<String, RelayError> {
        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: [Part {
                    text: &req.system_instruction,
                }],
            },
            contents: [Content {
                role: Some("user"),
                parts: [Part { text: &req.prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: req.temperature,
                max_output_tokens: req.max_output_tokens,
            },
        };

        let request = self
            .client
            .post(self.url_for(&req.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let bytes = send_json(request, self.name()).await?;

        let response: GenerateContentResponse = serde_json::from_slice(&bytes)
            .map_err(|e| RelayError::SchemaParse(format!("failed to parse response: {e}")))?;

        // Blocked prompts come back with no candidates (only promptFeedback).
        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(RelayError::EmptyResponse {
                provider: self.name().to_string(),
            });
        }
        Ok(text)
    }
}
