#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use promptrelay::error::RelayError;
use promptrelay::provider::{Provider, ProviderRequest};

/// Provider that replays a fixed script of outcomes and records every call.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, RelayError>>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, RelayError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Provider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(&self, req: &ProviderRequest) -> Result<String, RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(req.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RelayError::upstream("scripted", None, "script exhausted")))
    }
}

/// Upstream failure with the given HTTP status.
pub fn status_err(code: u16) -> Result<String, RelayError> {
    Err(RelayError::upstream(
        "scripted",
        Some(code),
        format!("HTTP {code} from upstream, request id req_8f2c"),
    ))
}

pub fn ok(text: &str) -> Result<String, RelayError> {
    Ok(text.to_string())
}
