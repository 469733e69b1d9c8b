//! Text-generation backends behind the relay routes.

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

#[derive(Debug)]
pub enum ModelError {
    /// No API key was configured, so the backend cannot be called.
    MissingApiKey,
    Request(String),
    Status { status: u16, body: String },
    /// The backend answered without any text candidate.
    EmptyResponse,
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::MissingApiKey => write!(f, "GEMINI_API_KEY is not configured"),
            ModelError::Request(message) => write!(f, "model request failed: {message}"),
            ModelError::Status { status, body } => {
                write!(f, "model backend returned {status}: {body}")
            }
            ModelError::EmptyResponse => write!(f, "model returned no text"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Something that turns a prompt into text.
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> &str;

    fn generate(&self, prompt: String) -> BoxFuture<'_, Result<String, ModelError>>;
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
    pub timeout: Duration,
    pub generation: GenerationConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_url: DEFAULT_GEMINI_API_URL.to_string(),
            timeout: Duration::from_secs(30),
            generation: GenerationConfig::default(),
        }
    }
}

/// Gemini `generateContent` over REST.
pub struct GeminiBackend {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Request(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn call(&self, prompt: String) -> Result<String, ModelError> {
        let key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ModelError::MissingApiKey)?;
        let url = self.endpoint();
        debug!(%url, chars = prompt.len(), "calling model");
        let resp = self
            .http
            .post(&url)
            .query(&[("key", key)])
            .json(&request_body(&prompt, &self.config.generation))
            .send()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "model backend error");
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| ModelError::Request(e.to_string()))?;
        candidate_text(&body).ok_or(ModelError::EmptyResponse)
    }
}

impl ModelBackend for GeminiBackend {
    fn name(&self) -> &str {
        &self.config.model
    }

    fn generate(&self, prompt: String) -> BoxFuture<'_, Result<String, ModelError>> {
        Box::pin(self.call(prompt))
    }
}

pub fn request_body(prompt: &str, generation: &GenerationConfig) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": generation,
    })
}

/// Concatenated text parts of the first candidate.
pub fn candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
