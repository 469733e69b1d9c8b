use std::env;
use std::time::Duration;

pub const DEFAULT_DATA_URL: &str = "https://flaskapi-shiphappens.azurewebsites.net";
pub const DEFAULT_OBIS_URL: &str = "https://api.obis.org/v3";
pub const SECONDARY_RELAY_URL: &str = "https://v0-gemini-api-deployment.vercel.app/api/gemini";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Where the fetchers and the relay client point.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub data_url: String,
    pub obis_url: String,
    pub relay_urls: Vec<String>,
    pub model: String,
    pub timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            obis_url: DEFAULT_OBIS_URL.to_string(),
            relay_urls: vec![
                format!("{DEFAULT_DATA_URL}/generate"),
                SECONDARY_RELAY_URL.to_string(),
            ],
            model: DEFAULT_MODEL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl SourceConfig {
    /// Reads `MIGRATEWATCH_*` variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let relay_urls = env::var("MIGRATEWATCH_RELAY_URLS")
            .ok()
            .map(|v| split_list(&v))
            .filter(|urls| !urls.is_empty())
            .unwrap_or(defaults.relay_urls);
        Self {
            data_url: env_var_string("MIGRATEWATCH_DATA_URL", &defaults.data_url),
            obis_url: env_var_string("MIGRATEWATCH_OBIS_URL", &defaults.obis_url),
            relay_urls,
            model: env_var_string("MIGRATEWATCH_MODEL", &defaults.model),
            timeout_ms: env_var_u64("MIGRATEWATCH_TIMEOUT_MS", defaults.timeout_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Comma-separated list; blanks are dropped.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_var_string(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
