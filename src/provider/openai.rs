use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::RelayError;
use crate::provider::{Provider, ProviderRequest, endpoint, send_json};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// OpenAI Chat Completions (`/v1/chat/completions`).
pub struct OpenAiProvider {
    client: Client,
    url: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            url: endpoint(base_url, "/v1/chat/completions"),
            api_key: api_key.to_string(),
        }
    }
}

impl Provider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, req: &ProviderRequest) -> Result<String, RelayError> {
        let body = ChatRequest {
            model: &req.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &req.system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &req.prompt,
                },
            ],
            max_tokens: req.max_output_tokens,
            temperature: req.temperature,
        };

        let request = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body);

        let bytes = send_json(request, self.name()).await?;

        let completion: ChatCompletion = serde_json::from_slice(&bytes)
            .map_err(|e| RelayError::SchemaParse(format!("failed to parse response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| RelayError::EmptyResponse {
                provider: self.name().to_string(),
            })
    }
}
