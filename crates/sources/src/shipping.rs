use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::query::data_url;
use crate::series::{pair_flat, CoordinateSeries};
use crate::transport::{get_json, HttpTransport};

/// Status value the data service uses for a usable lane.
pub const SHIPPING_OK: &str = "1";

#[derive(Debug, Deserialize)]
struct ShippingPayload {
    status: Option<String>,
    #[serde(default)]
    lane: Vec<f64>,
}

/// Fetches the shipping lane for the given period.
///
/// Same degrade-to-empty policy as migration fetches; additionally any
/// `status` other than `"1"` is no-data.
pub async fn fetch_shipping_lane_series(
    transport: &dyn HttpTransport,
    base_url: &str,
    year: Option<&str>,
    month: Option<&str>,
) -> CoordinateSeries {
    match try_fetch_shipping(transport, base_url, year, month).await {
        Ok(series) => series,
        Err(e) => {
            warn!(error = %e, "shipping fetch degraded to no data");
            CoordinateSeries::no_data()
        }
    }
}

async fn try_fetch_shipping(
    transport: &dyn HttpTransport,
    base_url: &str,
    year: Option<&str>,
    month: Option<&str>,
) -> Result<CoordinateSeries, FetchError> {
    let url = data_url(base_url, "shipping", year, month)?;
    debug!(%url, "fetching shipping lane");
    let payload: ShippingPayload = get_json(transport, url.as_str()).await?;
    if payload.status.as_deref() != Some(SHIPPING_OK) {
        debug!(status = ?payload.status, "shipping lane unavailable");
        return Err(FetchError::Empty {
            url: url.to_string(),
        });
    }
    let points = pair_flat(&payload.lane);
    if points.is_empty() {
        return Err(FetchError::Empty {
            url: url.to_string(),
        });
    }
    Ok(CoordinateSeries::from_points(points))
}

#[cfg(test)]
mod tests {
    use super::fetch_shipping_lane_series;
    use crate::series::CoordinateSeries;
    use crate::transport::StaticTransport;
    use foundation::geo::GeoPoint;
    use serde_json::json;

    const BASE: &str = "https://data.example.net";
    const LANE: &str = "https://data.example.net/data/shipping";

    #[tokio::test]
    async fn no_period_hits_bare_shipping_url() {
        let t = StaticTransport::new().json(LANE, json!({"status": "0"}));
        let series = fetch_shipping_lane_series(&t, BASE, None, None).await;
        assert_eq!(series, CoordinateSeries::no_data());
        assert_eq!(t.requested_urls(), vec![LANE.to_string()]);
    }

    #[tokio::test]
    async fn pairs_flat_lane() {
        let url = "https://data.example.net/data/shipping/5/2022";
        let t = StaticTransport::new().json(
            url,
            json!({"status": "1", "lane": [-71.0, 40.0, -70.0, 41.0, -69.0]}),
        );
        let series = fetch_shipping_lane_series(&t, BASE, Some("2022"), Some("5")).await;
        assert_eq!(
            series.points,
            vec![GeoPoint::new(-71.0, 40.0), GeoPoint::new(-70.0, 41.0)]
        );
    }

    #[tokio::test]
    async fn empty_lane_and_numeric_status_are_no_data() {
        for body in [json!({"status": "1", "lane": []}), json!({"status": 1, "lane": [1.0, 2.0]})] {
            let t = StaticTransport::new().json(LANE, body);
            assert!(fetch_shipping_lane_series(&t, BASE, None, None)
                .await
                .no_data_found);
        }
    }
}
