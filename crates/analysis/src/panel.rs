//! Per-panel state and provenance of panel data.

use serde::Serialize;
use sources::TextRelay;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PanelKind {
    Conflict,
    Insight,
    Routes,
    Alerts,
}

impl PanelKind {
    pub const ALL: [PanelKind; 4] = [
        PanelKind::Conflict,
        PanelKind::Insight,
        PanelKind::Routes,
        PanelKind::Alerts,
    ];

    pub fn title(self) -> &'static str {
        match self {
            PanelKind::Conflict => "Conflict Analysis",
            PanelKind::Insight => "AI Insights",
            PanelKind::Routes => "Route Optimization",
            PanelKind::Alerts => "Alerts",
        }
    }
}

impl std::fmt::Display for PanelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// Where panel data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// At least one field was taken from the relay's answer.
    Relay,
    /// Entirely local default.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Produced<T> {
    pub data: T,
    pub origin: Origin,
}

impl<T> Produced<T> {
    pub fn relay(data: T) -> Self {
        Self {
            data,
            origin: Origin::Relay,
        }
    }

    pub fn fallback(data: T) -> Self {
        Self {
            data,
            origin: Origin::Fallback,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Produced<U> {
        Produced {
            data: f(self.data),
            origin: self.origin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PanelState<T> {
    Idle,
    Loading,
    Ready {
        data: T,
        origin: Origin,
    },
    Failed {
        error: String,
    },
}

impl<T> Default for PanelState<T> {
    fn default() -> Self {
        PanelState::Idle
    }
}

impl<T> PanelState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, PanelState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            PanelState::Ready { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn origin(&self) -> Option<Origin> {
        match self {
            PanelState::Ready { origin, .. } => Some(*origin),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PanelState::Failed { error } => Some(error),
            _ => None,
        }
    }
}

impl<T> From<Produced<T>> for PanelState<T> {
    fn from(p: Produced<T>) -> Self {
        PanelState::Ready {
            data: p.data,
            origin: p.origin,
        }
    }
}

/// Asks the relay and returns its trimmed answer, or `None` on any failure.
pub(crate) async fn ask_relay(relay: &dyn TextRelay, prompt: String, task: &'static str) -> Option<String> {
    match relay.generate(prompt).await {
        Ok(answer) => {
            debug!(task, chars = answer.len(), "relay answered");
            Some(answer.trim().to_string())
        }
        Err(error) => {
            warn!(task, %error, "relay failed; using local default");
            None
        }
    }
}

/// Non-empty and strictly shorter than `max_chars`.
pub(crate) fn fits(text: &str, max_chars: usize) -> bool {
    let n = text.chars().count();
    n > 0 && n < max_chars
}
