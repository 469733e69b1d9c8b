//! OBIS occurrence records.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::query::occurrence_url;
use crate::transport::{HttpRequest, HttpTransport, TransportError};

/// One observation. OBIS omits most fields on most records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceRecord {
    #[serde(rename = "scientificName", default)]
    pub scientific_name: Option<String>,
    #[serde(rename = "decimalLatitude", default)]
    pub decimal_latitude: Option<f64>,
    #[serde(rename = "decimalLongitude", default)]
    pub decimal_longitude: Option<f64>,
    #[serde(default)]
    pub depth: Option<f64>,
    /// Sea surface temperature (°C).
    #[serde(default)]
    pub sst: Option<f64>,
    /// Sea surface salinity (PSU).
    #[serde(default)]
    pub sss: Option<f64>,
    #[serde(default)]
    pub date_year: Option<i32>,
    /// Distance from shore (m).
    #[serde(default)]
    pub shoredistance: Option<f64>,
    #[serde(rename = "eventDate", default)]
    pub event_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceResponse {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub results: Vec<OccurrenceRecord>,
}

#[derive(Debug)]
pub enum OccurrenceError {
    InvalidUrl(String),
    Transport(TransportError),
    Status(u16),
    Malformed(String),
    /// The query succeeded but matched nothing.
    NoData,
}

impl std::fmt::Display for OccurrenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OccurrenceError::InvalidUrl(m) => write!(f, "invalid occurrence url: {m}"),
            OccurrenceError::Transport(e) => write!(f, "failed to fetch data: {e}"),
            OccurrenceError::Status(s) => write!(f, "failed to fetch data: HTTP {s}"),
            OccurrenceError::Malformed(m) => write!(f, "unexpected occurrence response: {m}"),
            OccurrenceError::NoData => write!(f, "No data found for this species"),
        }
    }
}

impl std::error::Error for OccurrenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OccurrenceError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// Queries occurrences for `scientific_name`.
///
/// Unlike map-data fetches, failures and empty results are returned to the
/// caller.
pub async fn fetch_occurrences(
    transport: &dyn HttpTransport,
    obis_base: &str,
    scientific_name: &str,
) -> Result<OccurrenceResponse, OccurrenceError> {
    let url = occurrence_url(obis_base, scientific_name)
        .map_err(|e| OccurrenceError::InvalidUrl(e.to_string()))?;
    debug!(%url, "fetching occurrences");
    let resp = transport
        .send(HttpRequest::get(url.as_str()))
        .await
        .map_err(OccurrenceError::Transport)?;
    if !resp.is_success() {
        return Err(OccurrenceError::Status(resp.status));
    }
    let data: OccurrenceResponse = resp
        .json()
        .map_err(|e| OccurrenceError::Malformed(e.to_string()))?;
    if data.results.is_empty() {
        return Err(OccurrenceError::NoData);
    }
    info!(
        species = scientific_name,
        total = data.total,
        returned = data.results.len(),
        "occurrences received"
    );
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::{fetch_occurrences, OccurrenceError};
    use crate::transport::StaticTransport;
    use serde_json::json;

    const OBIS: &str = "https://obis.example.org/v3";
    const COD: &str = "https://obis.example.org/v3/occurrence?scientificname=Gadus+morhua";

    #[tokio::test]
    async fn decodes_sparse_records() {
        let t = StaticTransport::new().json(
            COD,
            json!({"total": 2, "results": [
                {"scientificName": "Gadus morhua", "depth": 120.5, "date_year": 2004},
                {"decimalLatitude": 44.1, "decimalLongitude": -60.2, "sst": 7.5}
            ]}),
        );
        let resp = fetch_occurrences(&t, OBIS, "Gadus morhua").await.unwrap();
        assert_eq!(resp.total, 2);
        assert_eq!(resp.results[0].depth, Some(120.5));
        assert_eq!(resp.results[1].decimal_longitude, Some(-60.2));
    }

    #[tokio::test]
    async fn empty_results_are_an_error() {
        let t = StaticTransport::new().json(COD, json!({"total": 0, "results": []}));
        let err = fetch_occurrences(&t, OBIS, "Gadus morhua").await.unwrap_err();
        assert!(matches!(err, OccurrenceError::NoData));
        assert_eq!(err.to_string(), "No data found for this species");
    }

    #[tokio::test]
    async fn status_is_surfaced() {
        let t = StaticTransport::new().status(COD, 502, "bad gateway");
        let err = fetch_occurrences(&t, OBIS, "Gadus morhua").await.unwrap_err();
        assert!(matches!(err, OccurrenceError::Status(502)));
    }
}
