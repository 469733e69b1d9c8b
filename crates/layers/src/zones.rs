use foundation::geo::GeoPoint;
use serde::Serialize;

/// Clicks farther than this (in degrees) from every zone centre hit nothing.
pub const CLICK_THRESHOLD_DEG: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictZone {
    pub center_lat: f64,
    pub center_lon: f64,
    pub radius_m: f64,
    pub risk_label: &'static str,
    pub risk_percent: u8,
}

impl ConflictZone {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(self.center_lon, self.center_lat)
    }

    pub fn caption(&self) -> String {
        format!("Risk: {} ({}%)", self.risk_label, self.risk_percent)
    }
}

/// The fixed demo zone set.
pub fn conflict_zones() -> Vec<ConflictZone> {
    vec![
        ConflictZone {
            center_lat: 42.0,
            center_lon: -69.5,
            radius_m: 50_000.0,
            risk_label: "High",
            risk_percent: 87,
        },
        ConflictZone {
            center_lat: 38.5,
            center_lon: -74.0,
            radius_m: 70_000.0,
            risk_label: "Medium",
            risk_percent: 62,
        },
    ]
}

/// Index of the zone nearest to `click` in degree space, if it lies within
/// [`CLICK_THRESHOLD_DEG`]. Ties go to the lower index.
pub fn pick_zone(click: GeoPoint, zones: &[ConflictZone]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, zone) in zones.iter().enumerate() {
        let d = click.degree_distance(zone.center());
        if d >= CLICK_THRESHOLD_DEG {
            continue;
        }
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((idx, d));
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::{ConflictZone, conflict_zones, pick_zone};
    use foundation::geo::GeoPoint;

    #[test]
    fn picks_zone_within_threshold() {
        let zones = conflict_zones();
        assert_eq!(pick_zone(GeoPoint::new(-69.0, 42.5), &zones), Some(0));
        assert_eq!(pick_zone(GeoPoint::new(-73.0, 39.0), &zones), Some(1));
        assert_eq!(pick_zone(GeoPoint::new(-50.0, 30.0), &zones), None);
    }

    #[test]
    fn threshold_is_exclusive() {
        let zones = conflict_zones();
        assert_eq!(pick_zone(GeoPoint::new(-69.5, 44.0), &zones), None);
        assert_eq!(pick_zone(GeoPoint::new(-69.5, 43.999), &zones), Some(0));
    }

    #[test]
    fn nearest_wins_and_ties_go_low() {
        let zone = |lon: f64| ConflictZone {
            center_lat: 0.0,
            center_lon: lon,
            radius_m: 1.0,
            risk_label: "Low",
            risk_percent: 1,
        };
        let zones = vec![zone(0.0), zone(1.0), zone(2.0)];
        assert_eq!(pick_zone(GeoPoint::new(1.9, 0.0), &zones), Some(2));
        assert_eq!(pick_zone(GeoPoint::new(0.5, 0.0), &zones), Some(0));
    }

    #[test]
    fn caption_formats_risk() {
        assert_eq!(conflict_zones()[0].caption(), "Risk: High (87%)");
    }
}
