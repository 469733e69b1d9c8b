use selection::DataKey;
use serde::Serialize;
use sources::TextRelay;

use crate::panel::{Produced, ask_relay};
use crate::prompts::insight_prompt;

pub const DEFAULT_INSIGHT: &str = "Current migration pattern shows higher concentration in the mid-Atlantic than previous years. Recommend shifting southern shipping lanes 8nm north to reduce collision risk by 65%.";
pub const INSIGHT_CONFIDENCE: &str = "92%";
pub const INSIGHT_DATA_SOURCES: &str = "NOAA, AIS, Satellite";
pub const INSIGHT_LAST_UPDATED: &str = "March 29, 2025";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiInsight {
    pub insight: String,
    pub confidence: String,
    pub data_sources: String,
    pub last_updated: String,
}

impl AiInsight {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            insight: text.into(),
            confidence: INSIGHT_CONFIDENCE.to_string(),
            data_sources: INSIGHT_DATA_SOURCES.to_string(),
            last_updated: INSIGHT_LAST_UPDATED.to_string(),
        }
    }
}

impl Default for AiInsight {
    fn default() -> Self {
        Self::with_text(DEFAULT_INSIGHT)
    }
}

/// Relay insight; any relay failure (or a blank answer) yields the static
/// default.
pub async fn ai_insight(relay: &dyn TextRelay, key: &DataKey) -> Produced<AiInsight> {
    match ask_relay(relay, insight_prompt(key), "insight").await {
        Some(text) if !text.is_empty() => Produced::relay(AiInsight::with_text(text)),
        _ => Produced::fallback(AiInsight::default()),
    }
}
