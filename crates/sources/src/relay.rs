//! Client for the remote text-generation relay.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::transport::{BoxFuture, HttpRequest, HttpTransport, TransportError};

#[derive(Debug)]
pub enum RelayError {
    NoEndpoint,
    Transport(TransportError),
    Status { status: u16, body: String },
    Malformed(String),
    /// The body parsed but had no `content`, `response` or `text` string.
    MissingAnswer,
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::NoEndpoint => write!(f, "no relay endpoint configured"),
            RelayError::Transport(e) => write!(f, "relay unreachable: {e}"),
            RelayError::Status { status, .. } => write!(f, "relay returned HTTP {status}"),
            RelayError::Malformed(m) => write!(f, "relay response is not JSON: {m}"),
            RelayError::MissingAnswer => write!(f, "unexpected relay response format"),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// Sends a prompt to a text-generation model and returns its answer.
pub trait TextRelay: Send + Sync {
    fn generate(&self, prompt: String) -> BoxFuture<'_, Result<String, RelayError>>;
}

/// Answer field of a relay body. Deployments disagree on the field name, so
/// `content`, `response` and `text` are tried in that order.
pub fn extract_answer(body: &Value) -> Option<&str> {
    ["content", "response", "text"]
        .iter()
        .find_map(|field| body.get(field).and_then(Value::as_str))
}

/// HTTP relay that spreads requests randomly over its endpoints.
pub struct HttpRelay {
    transport: Arc<dyn HttpTransport>,
    endpoints: Vec<String>,
    model: String,
    rng: Mutex<StdRng>,
}

impl HttpRelay {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoints: Vec<String>, model: String) -> Self {
        Self {
            transport,
            endpoints,
            model,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Fixes endpoint selection for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    fn pick_endpoint(&self) -> Option<String> {
        if self.endpoints.is_empty() {
            return None;
        }
        let idx = self.rng.lock().gen_range(0..self.endpoints.len());
        self.endpoints.get(idx).cloned()
    }
}

impl TextRelay for HttpRelay {
    fn generate(&self, prompt: String) -> BoxFuture<'_, Result<String, RelayError>> {
        Box::pin(async move {
            let endpoint = self.pick_endpoint().ok_or(RelayError::NoEndpoint)?;
            debug!(%endpoint, prompt_len = prompt.len(), "calling relay");
            let body = json!({ "prompt": prompt, "model": self.model });
            let resp = self
                .transport
                .send(HttpRequest::post_json(endpoint.as_str(), body))
                .await
                .map_err(RelayError::Transport)?;
            if !resp.is_success() {
                warn!(%endpoint, status = resp.status, "relay request failed");
                return Err(RelayError::Status {
                    status: resp.status,
                    body: resp.text(),
                });
            }
            let value: Value = resp
                .json()
                .map_err(|e| RelayError::Malformed(e.to_string()))?;
            extract_answer(&value)
                .map(str::to_string)
                .ok_or(RelayError::MissingAnswer)
        })
    }
}

/// Scripted relay for tests and offline runs.
///
/// Replies are consumed in order; the last one repeats. `None` means fail.
pub struct StaticRelay {
    replies: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl StaticRelay {
    pub fn new(replies: Vec<Option<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Some(text.to_string())])
    }

    pub fn failing() -> Self {
        Self::new(vec![None])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    fn next_reply(&self) -> Option<String> {
        let mut replies = self.replies.lock();
        if replies.len() > 1 {
            replies.pop_front().flatten()
        } else {
            replies.front().cloned().flatten()
        }
    }
}

impl TextRelay for StaticRelay {
    fn generate(&self, prompt: String) -> BoxFuture<'_, Result<String, RelayError>> {
        self.prompts.lock().push(prompt);
        let reply = self.next_reply();
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            reply.ok_or_else(|| RelayError::Status {
                status: 500,
                body: "scripted failure".to_string(),
            })
        })
    }
}
