use thiserror::Error;

use crate::retry::ErrorClass;

/// Cap on how much of an upstream error body is kept in logs.
const MAX_ERROR_DETAIL_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("prompt is required")]
    InvalidInput,

    #[error("upstream error from {provider}: {message}")]
    Upstream {
        provider: String,
        message: String,
        status: Option<u16>,
    },

    #[error("no response content received from {provider}")]
    EmptyResponse { provider: String },

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("schema parse error: {0}")]
    SchemaParse(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl RelayError {
    /// Build an `Upstream` error, bounding the message so a huge vendor body
    /// never ends up verbatim in the logs.
    pub fn upstream(provider: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        let message: String = message.into();
        let message = if message.chars().count() > MAX_ERROR_DETAIL_CHARS {
            let head: String = message.chars().take(MAX_ERROR_DETAIL_CHARS).collect();
            format!("{head}...")
        } else {
            message
        };
        Self::Upstream {
            provider: provider.to_string(),
            message,
            status,
        }
    }

    /// Status code reported by the vendor, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => *status,
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Classify into a retry/user-message bucket.
    /// `InvalidInput` and `Config` never reach the retry loop and land in `Other`.
    pub fn classify(&self) -> ErrorClass {
        match self {
            Self::Upstream { status, message, .. } => ErrorClass::from_parts(*status, message),
            Self::Request(e) => ErrorClass::from_parts(self.status(), &e.to_string()),
            _ => ErrorClass::Other,
        }
    }

    /// Returns true for transient errors that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        self.classify().is_retryable()
    }

    /// Produce a sanitized error message safe for returning to browser clients.
    /// Never includes vendor bodies, URLs or key material.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidInput => "Prompt is required",
            Self::Config(_) => "An unexpected error occurred. Please try again.",
            _ => self.classify().user_message(),
        }
    }
}
