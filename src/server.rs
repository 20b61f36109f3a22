use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::error::RelayError;
use crate::provider::Provider;
use crate::relay::{GenerationRequest, Relay};
use crate::response::{ErrorBody, GenerateResponse, HealthResponse};

/// JSON bodies larger than this are rejected before reaching the handler.
pub const MAX_BODY_BYTES: usize = 100 * 1024;

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match self {
            RelayError::InvalidInput => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody::new(self.user_message()))).into_response()
    }
}

/// Build the API router. When `frontend_dir` is set, unmatched paths serve
/// static files from it and fall back to its `index.html`.
pub fn router<P>(relay: Arc<Relay<P>>, frontend_dir: Option<&Path>) -> Router
where
    P: Provider + 'static,
{
    let api = Router::new()
        .route("/api/test", get(health))
        .route("/api/generate", post(generate::<P>))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(relay);

    let app = match frontend_dir {
        Some(dir) => {
            let index = ServeFile::new(dir.join("index.html"));
            api.fallback_service(ServeDir::new(dir).fallback(index))
        }
        None => api,
    };

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "API is working!".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

async fn generate<P>(
    State(relay): State<Arc<Relay<P>>>,
    body: Result<Json<GenerationRequest>, JsonRejection>,
) -> Response
where
    P: Provider + 'static,
{
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::warn!("rejected generate body: {rejection}");
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ErrorBody::new("Prompt is too long")),
            )
                .into_response();
        }
        Err(rejection) => {
            tracing::warn!("rejected generate body: {rejection}");
            return RelayError::InvalidInput.into_response();
        }
    };

    match relay.generate(req.prompt.as_deref()).await {
        Ok(response) => Json(GenerateResponse { response }).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Resolves when Ctrl-C or SIGTERM arrives.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
