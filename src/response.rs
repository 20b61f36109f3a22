use serde::{Deserialize, Serialize};

/// `GET /api/test` body.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub message: String,
    /// RFC 3339, millisecond precision, UTC (`2024-05-01T12:00:00.000Z`).
    pub timestamp: String,
}

/// Successful `POST /api/generate` body. `response` is the provider's text,
/// unmodified.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

/// Every error the browser sees has this shape. `error` is one of a small set
/// of fixed messages and never carries upstream detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
