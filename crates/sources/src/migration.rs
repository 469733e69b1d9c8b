use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::query::data_url;
use crate::series::{from_rows, CoordinateSeries};
use crate::species::{resolve_species, SpeciesResolution};
use crate::transport::{get_json, HttpTransport};

#[derive(Debug, Deserialize)]
struct MigrationPayload {
    #[serde(default)]
    coordinates: Vec<Vec<f64>>,
}

/// Result of a migration fetch, including how the species name was resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationFetch {
    /// The supported scientific name actually queried.
    pub species: &'static str,
    pub resolution: SpeciesResolution,
    pub series: CoordinateSeries,
}

/// Fetches the migration path for `species_name`.
///
/// Never fails: transport errors, non-2xx statuses, malformed bodies and
/// empty coordinate lists are logged and returned as a no-data series.
pub async fn fetch_migration_series(
    transport: &dyn HttpTransport,
    base_url: &str,
    species_name: &str,
    year: Option<&str>,
    month: Option<&str>,
) -> MigrationFetch {
    let (species, resolution) = resolve_species(species_name);
    let series = match try_fetch_migration(transport, base_url, species, year, month).await {
        Ok(series) => series,
        Err(e) => {
            warn!(species, error = %e, "migration fetch degraded to no data");
            CoordinateSeries::no_data()
        }
    };
    MigrationFetch {
        species,
        resolution,
        series,
    }
}

async fn try_fetch_migration(
    transport: &dyn HttpTransport,
    base_url: &str,
    species: &str,
    year: Option<&str>,
    month: Option<&str>,
) -> Result<CoordinateSeries, FetchError> {
    let url = data_url(base_url, species, year, month)?;
    debug!(%url, "fetching migration series");
    let payload: MigrationPayload = get_json(transport, url.as_str()).await?;
    let points = from_rows(&payload.coordinates);
    if points.is_empty() {
        return Err(FetchError::Empty {
            url: url.to_string(),
        });
    }
    Ok(CoordinateSeries::from_points(points))
}

#[cfg(test)]
mod tests {
    use super::fetch_migration_series;
    use crate::species::SpeciesResolution;
    use crate::transport::StaticTransport;
    use foundation::geo::GeoPoint;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const BASE: &str = "https://data.example.net";
    const COD: &str = "https://data.example.net/data/Gadus%20morhua";

    #[tokio::test]
    async fn parses_coordinates() {
        let t = StaticTransport::new().json(COD, json!({"coordinates": [[-70.1, 41.2], [-69.0, 42.5]]}));
        let fetch = fetch_migration_series(&t, BASE, "Gadus morhua", None, None).await;
        assert_eq!(fetch.species, "Gadus morhua");
        assert_eq!(fetch.resolution, SpeciesResolution::Exact);
        assert!(!fetch.series.no_data_found);
        assert_eq!(
            fetch.series.points,
            vec![GeoPoint::new(-70.1, 41.2), GeoPoint::new(-69.0, 42.5)]
        );
    }

    #[tokio::test]
    async fn every_failure_mode_is_the_same_no_data() {
        let cases = [
            StaticTransport::new().fail(COD, "connection reset"),
            StaticTransport::new().status(COD, 404, "missing"),
            StaticTransport::new().status(COD, 503, "unavailable"),
            StaticTransport::new().json(COD, json!({"coordinates": []})),
            StaticTransport::new().json(COD, json!({})),
            StaticTransport::new().status(COD, 200, "<html>oops</html>"),
        ];
        for t in cases {
            let fetch = fetch_migration_series(&t, BASE, "Gadus morhua", None, None).await;
            assert_eq!(fetch.series, crate::series::CoordinateSeries::no_data());
        }
    }

    #[tokio::test]
    async fn period_and_substitution_shape_the_url() {
        let t = StaticTransport::new();
        let fetch =
            fetch_migration_series(&t, BASE, "Nessie", Some("2021"), Some("all")).await;
        assert!(fetch.resolution.is_substituted());
        assert_eq!(
            t.requested_urls(),
            vec!["https://data.example.net/data/Clupea%20pallasii/2021".to_string()]
        );
    }
}
