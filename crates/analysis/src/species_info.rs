//! Species-info report: OBIS observations, summary statistics and a relay
//! analysis split into sections.

use foundation::{GeoBounds, GeoPoint};
use serde::Serialize;
use sources::{DataClient, OccurrenceError, OccurrenceRecord, OccurrenceResponse, RelayError, TextRelay};
use tracing::{info, warn};

use crate::prompts::species_analysis_prompt;
use crate::statistics::Statistics;

/// Observations embedded in the analysis prompt.
pub const PROMPT_RECORD_LIMIT: usize = 50;

#[derive(Debug)]
pub enum SpeciesInfoError {
    Fetch(OccurrenceError),
    Encode(serde_json::Error),
    Analysis(RelayError),
}

impl std::fmt::Display for SpeciesInfoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeciesInfoError::Fetch(e) => write!(f, "{e}"),
            SpeciesInfoError::Encode(e) => write!(f, "failed to encode observations: {e}"),
            SpeciesInfoError::Analysis(_) => write!(f, "Failed to analyze species data"),
        }
    }
}

impl std::error::Error for SpeciesInfoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SpeciesInfoError::Fetch(e) => Some(e),
            SpeciesInfoError::Encode(e) => Some(e),
            SpeciesInfoError::Analysis(e) => Some(e),
        }
    }
}

impl From<OccurrenceError> for SpeciesInfoError {
    fn from(e: OccurrenceError) -> Self {
        SpeciesInfoError::Fetch(e)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesStats {
    pub total_observations: u64,
    /// Meters, one decimal.
    pub avg_depth: Option<f64>,
    /// Sea surface temperature `(min, max)` in °C, one decimal.
    pub temperature_range: Option<(f64, f64)>,
    /// PSU, two decimals.
    pub avg_salinity: Option<f64>,
    pub year_range: Option<(i32, i32)>,
    /// Meters, whole.
    pub avg_shore_distance: Option<f64>,
    pub bounds: Option<GeoBounds>,
}

// Zero readings are treated as absent, matching how the upstream page counts them.
fn readings(records: &[OccurrenceRecord], field: impl Fn(&OccurrenceRecord) -> Option<f64>) -> Vec<f64> {
    records
        .iter()
        .filter_map(field)
        .filter(|v| v.is_finite() && *v != 0.0)
        .collect()
}

impl SpeciesStats {
    pub fn from_response(response: &OccurrenceResponse) -> Self {
        let records = &response.results;
        let total_observations = if response.total > 0 {
            response.total
        } else {
            records.len() as u64
        };

        let depths = readings(records, |r| r.depth);
        let temps = readings(records, |r| r.sst);
        let salinities = readings(records, |r| r.sss);
        let shore = readings(records, |r| r.shoredistance);
        let years: Vec<i32> = records.iter().filter_map(|r| r.date_year).filter(|y| *y != 0).collect();
        let positions: Vec<GeoPoint> = records
            .iter()
            .filter_map(|r| Some(GeoPoint::new(r.decimal_longitude?, r.decimal_latitude?)))
            .filter(GeoPoint::is_finite)
            .collect();

        Self {
            total_observations,
            avg_depth: Statistics::mean(&depths).map(|v| Statistics::round_to(v, 1)),
            temperature_range: Statistics::min_max(&temps)
                .map(|(lo, hi)| (Statistics::round_to(lo, 1), Statistics::round_to(hi, 1))),
            avg_salinity: Statistics::mean(&salinities).map(|v| Statistics::round_to(v, 2)),
            year_range: Statistics::min_max(&years),
            avg_shore_distance: Statistics::mean(&shore).map(|v| Statistics::round_to(v, 0)),
            bounds: GeoBounds::from_points(&positions),
        }
    }

    pub fn temperature_label(&self) -> String {
        match self.temperature_range {
            Some((lo, hi)) => format!("{lo:.1} - {hi:.1}°C"),
            None => "N/A".to_string(),
        }
    }

    pub fn year_range_label(&self) -> String {
        match self.year_range {
            Some((lo, hi)) => format!("{lo} - {hi}"),
            None => "N/A".to_string(),
        }
    }
}

/// Relay analysis text grouped by topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSections {
    pub overview: String,
    pub distribution: String,
    pub temporal: String,
    pub habitat: String,
    pub conservation: String,
}

impl AnalysisSections {
    /// Lines go to the section named by the most recent heading-like line.
    /// Text before any heading belongs to the overview.
    pub fn parse(text: &str) -> Self {
        let mut sections = Self::default();
        let mut current = 0usize;
        for line in text.split('\n') {
            let lower = line.to_lowercase();
            if lower.contains("species identification") || lower.contains("species:") || lower.contains("overview") {
                current = 0;
            } else if lower.contains("distribution") {
                current = 1;
            } else if lower.contains("temporal") {
                current = 2;
            } else if lower.contains("habitat") {
                current = 3;
            } else if lower.contains("conservation") {
                current = 4;
            }
            let target = match current {
                0 => &mut sections.overview,
                1 => &mut sections.distribution,
                2 => &mut sections.temporal,
                3 => &mut sections.habitat,
                _ => &mut sections.conservation,
            };
            target.push_str(line);
            target.push('\n');
        }
        sections
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesInfo {
    pub scientific_name: String,
    pub stats: SpeciesStats,
    pub analysis: String,
    pub sections: AnalysisSections,
}

/// Builds the species-info report. Unlike the dashboard panels, every
/// failure here is returned to the caller.
pub async fn fetch_species_info(
    client: &DataClient,
    relay: &dyn TextRelay,
    scientific_name: &str,
) -> Result<SpeciesInfo, SpeciesInfoError> {
    let response = client.occurrences(scientific_name).await?;
    let stats = SpeciesStats::from_response(&response);
    info!(species = scientific_name, observations = stats.total_observations, "occurrences loaded");

    let excerpt = OccurrenceResponse {
        total: response.total,
        results: response.results.iter().take(PROMPT_RECORD_LIMIT).cloned().collect(),
    };
    let json = serde_json::to_string(&excerpt).map_err(SpeciesInfoError::Encode)?;
    let analysis = relay.generate(species_analysis_prompt(&json)).await.map_err(|e| {
        warn!(species = scientific_name, error = %e, "species analysis failed");
        SpeciesInfoError::Analysis(e)
    })?;

    Ok(SpeciesInfo {
        scientific_name: scientific_name.to_string(),
        stats,
        sections: AnalysisSections::parse(&analysis),
        analysis,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{AnalysisSections, SpeciesInfoError, SpeciesStats, fetch_species_info};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sources::{DataClient, OccurrenceError, OccurrenceResponse, SourceConfig, StaticRelay, StaticTransport};

    const OBIS: &str = "http://obis.test";

    fn client(transport: StaticTransport) -> DataClient {
        let config = SourceConfig {
            obis_url: OBIS.to_string(),
            ..SourceConfig::default()
        };
        DataClient::new(Arc::new(transport), config)
    }

    fn sample() -> serde_json::Value {
        json!({
            "total": 1200,
            "results": [
                {"scientificName": "Gadus morhua", "decimalLatitude": 44.0, "decimalLongitude": -60.0,
                 "depth": 10.0, "sst": 4.26, "sss": 31.5, "date_year": 2001, "shoredistance": 1500.0},
                {"decimalLatitude": 47.5, "decimalLongitude": -52.0,
                 "depth": 25.0, "sst": 9.04, "sss": 32.25, "date_year": 2019, "shoredistance": 2001.0},
                {"decimalLatitude": 46.0, "decimalLongitude": -55.0, "depth": 0.0, "sst": 0.0, "date_year": 1998}
            ]
        })
    }

    #[test]
    fn stats_skip_zero_readings_and_round() {
        let response: OccurrenceResponse = serde_json::from_value(sample()).unwrap();
        let stats = SpeciesStats::from_response(&response);
        assert_eq!(stats.total_observations, 1200);
        assert_eq!(stats.avg_depth, Some(17.5));
        assert_eq!(stats.temperature_range, Some((4.3, 9.0)));
        assert_eq!(stats.avg_salinity, Some(31.88));
        assert_eq!(stats.year_range, Some((1998, 2019)));
        assert_eq!(stats.avg_shore_distance, Some(1751.0));
        assert_eq!(stats.temperature_label(), "4.3 - 9.0°C");
        assert_eq!(stats.year_range_label(), "1998 - 2019");

        let bounds = stats.bounds.unwrap();
        assert_eq!((bounds.min.lon, bounds.max.lon), (-60.0, -52.0));
        assert_eq!((bounds.min.lat, bounds.max.lat), (44.0, 47.5));
    }

    #[test]
    fn total_falls_back_to_result_count() {
        let response: OccurrenceResponse =
            serde_json::from_value(json!({"results": [{"depth": 3.0}]})).unwrap();
        let stats = SpeciesStats::from_response(&response);
        assert_eq!(stats.total_observations, 1);
        assert_eq!(stats.temperature_label(), "N/A");
    }

    #[test]
    fn sections_follow_headings() {
        let text = "Intro line\n**Geographic Distribution**\nNorth Atlantic\n3. Temporal patterns\n1998-2019\nHabitat: shelf\nConservation status: vulnerable";
        let s = AnalysisSections::parse(text);
        assert_eq!(
            s,
            AnalysisSections {
                overview: "Intro line\n".to_string(),
                distribution: "**Geographic Distribution**\nNorth Atlantic\n".to_string(),
                temporal: "3. Temporal patterns\n1998-2019\n".to_string(),
                habitat: "Habitat: shelf\n".to_string(),
                conservation: "Conservation status: vulnerable\n".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn report_combines_stats_and_analysis() {
        let transport = StaticTransport::new().json(format!("{OBIS}/occurrence?scientificname=Gadus+morhua"), sample());
        let relay = StaticRelay::replying("Species: Atlantic cod\nDistribution: shelf seas");
        let info = fetch_species_info(&client(transport), &relay, "Gadus morhua").await.unwrap();
        assert_eq!(info.sections.overview, "Species: Atlantic cod\n");
        assert_eq!(info.sections.distribution, "Distribution: shelf seas\n");
        assert_eq!(info.stats.total_observations, 1200);
        assert!(relay.prompts()[0].contains("\"date_year\":2019"));
    }

    #[tokio::test]
    async fn empty_results_and_relay_failure_are_errors() {
        let transport = StaticTransport::new().json(
            format!("{OBIS}/occurrence?scientificname=Gadus+morhua"),
            json!({"total": 0, "results": []}),
        );
        let err = fetch_species_info(&client(transport), &StaticRelay::replying("x"), "Gadus morhua")
            .await
            .unwrap_err();
        assert!(matches!(err, SpeciesInfoError::Fetch(OccurrenceError::NoData)));
        assert_eq!(err.to_string(), "No data found for this species");

        let transport = StaticTransport::new().json(format!("{OBIS}/occurrence?scientificname=Gadus+morhua"), sample());
        let err = fetch_species_info(&client(transport), &StaticRelay::failing(), "Gadus morhua")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to analyze species data");
    }
}
