//! HTTP transport seam.
//!
//! Fetchers never talk to `reqwest` directly; they go through
//! [`HttpTransport`], which has a network implementation and an in-memory
//! one for tests and offline runs.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL};
use serde::de::DeserializeOwned;

use crate::error::FetchError;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug)]
pub struct TransportError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            body: None,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            body: Some(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json_ok(value: &serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one HTTP request.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// Non-2xx statuses are returned as responses, not errors.
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>>;
}

/// Network transport backed by `reqwest`.
///
/// Every request carries `Accept: application/json` and
/// `Cache-Control: no-store`; nothing is cached between calls.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::with_source("failed to build HTTP client", e))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        Box::pin(async move {
            let builder = match request.method {
                Method::Get => self.client.get(&request.url),
                Method::Post => self.client.post(&request.url),
            };
            let builder = match &request.body {
                Some(body) => builder.json(body),
                None => builder,
            };
            let resp = builder
                .send()
                .await
                .map_err(|e| TransportError::with_source("HTTP request failed", e))?;
            let status = resp.status().as_u16();
            let body = resp
                .bytes()
                .await
                .map_err(|e| TransportError::with_source("failed to read response", e))?;
            Ok(HttpResponse::new(status, body.to_vec()))
        })
    }
}

/// GETs `url` and decodes a JSON body, mapping every failure to [`FetchError`].
pub async fn get_json<T: DeserializeOwned>(
    transport: &dyn HttpTransport,
    url: &str,
) -> Result<T, FetchError> {
    let resp = transport.send(HttpRequest::get(url)).await?;
    if !resp.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: resp.status,
        });
    }
    resp.json().map_err(|e| FetchError::Malformed {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// A scripted reply for [`StaticTransport`].
#[derive(Debug, Clone)]
pub enum StaticReply {
    Respond(HttpResponse),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Route {
    replies: VecDeque<StaticReply>,
    delay: Option<Duration>,
}

/// In-memory transport keyed by exact URL.
///
/// Each route replays its scripted replies in order and repeats the last
/// one. Unknown URLs answer 404. Every request is recorded.
#[derive(Default)]
pub struct StaticTransport {
    routes: Mutex<HashMap<String, Route>>,
    log: Mutex<Vec<HttpRequest>>,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: impl Into<String>, reply: StaticReply) -> Self {
        {
            let mut routes = self.routes.lock();
            let route = routes.entry(url.into()).or_insert_with(|| Route {
                replies: VecDeque::new(),
                delay: None,
            });
            route.replies.push_back(reply);
        }
        self
    }

    pub fn json(self, url: impl Into<String>, value: serde_json::Value) -> Self {
        self.route(url, StaticReply::Respond(HttpResponse::json_ok(&value)))
    }

    pub fn status(self, url: impl Into<String>, status: u16, body: &str) -> Self {
        self.route(url, StaticReply::Respond(HttpResponse::new(status, body)))
    }

    pub fn fail(self, url: impl Into<String>, message: &str) -> Self {
        self.route(url, StaticReply::Fail(message.to_string()))
    }

    /// Delays every reply on `url` (uses the tokio clock).
    pub fn delay(self, url: impl Into<String>, delay: Duration) -> Self {
        {
            let mut routes = self.routes.lock();
            let route = routes.entry(url.into()).or_insert_with(|| Route {
                replies: VecDeque::new(),
                delay: None,
            });
            route.delay = Some(delay);
        }
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.log.lock().clone()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.log.lock().iter().map(|r| r.url.clone()).collect()
    }

    fn next_reply(&self, url: &str) -> (Option<StaticReply>, Option<Duration>) {
        let mut routes = self.routes.lock();
        match routes.get_mut(url) {
            Some(route) => {
                let reply = if route.replies.len() > 1 {
                    route.replies.pop_front()
                } else {
                    route.replies.front().cloned()
                };
                (reply, route.delay)
            }
            None => (None, None),
        }
    }
}

impl HttpTransport for StaticTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        self.log.lock().push(request.clone());
        let (reply, delay) = self.next_reply(&request.url);
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match reply {
                Some(StaticReply::Respond(resp)) => Ok(resp),
                Some(StaticReply::Fail(message)) => Err(TransportError::new(message)),
                None => Ok(HttpResponse::new(404, "not found")),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{HttpRequest, HttpTransport, StaticTransport};
    use serde_json::json;

    #[tokio::test]
    async fn static_transport_replays_then_repeats_last() {
        let t = StaticTransport::new()
            .status("http://x/a", 500, "boom")
            .json("http://x/a", json!({"ok": true}));

        let first = t.send(HttpRequest::get("http://x/a")).await.unwrap();
        assert_eq!(first.status, 500);
        let second = t.send(HttpRequest::get("http://x/a")).await.unwrap();
        assert!(second.is_success());
        let third = t.send(HttpRequest::get("http://x/a")).await.unwrap();
        assert_eq!(third.text(), r#"{"ok":true}"#);
        assert_eq!(t.requested_urls().len(), 3);
    }

    #[tokio::test]
    async fn unknown_url_is_not_found_and_failures_are_errors() {
        let t = StaticTransport::new().fail("http://x/down", "connection refused");
        let missing = t.send(HttpRequest::get("http://x/nope")).await.unwrap();
        assert_eq!(missing.status, 404);
        let err = t.send(HttpRequest::get("http://x/down")).await.unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
    }
}
