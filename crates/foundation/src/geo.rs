use serde::{Deserialize, Serialize};

/// Mean Earth radius used for great-circle distances (kilometers).
pub const EARTH_RADIUS_KM: f64 = 6_371.008_8;

/// Rough kilometers per degree of latitude, used for degree-space buffers.
pub const KM_PER_DEGREE: f64 = 111.32;

/// A geographic position in degrees.
///
/// Field order follows the upstream wire format, which is `[lon, lat]`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    /// Euclidean distance in degree space (not great-circle).
    pub fn degree_distance(&self, other: GeoPoint) -> f64 {
        let dlon = self.lon - other.lon;
        let dlat = self.lat - other.lat;
        (dlon * dlon + dlat * dlat).sqrt()
    }

    /// Great-circle distance in kilometers (haversine on a spherical Earth).
    pub fn haversine_km(&self, other: GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// Closest point to `p` on the segment `a..b`, computed in degree space.
pub fn nearest_on_segment(p: GeoPoint, a: GeoPoint, b: GeoPoint) -> GeoPoint {
    let dx = b.lon - a.lon;
    let dy = b.lat - a.lat;
    let len2 = dx * dx + dy * dy;
    if len2 <= 0.0 {
        return a;
    }
    let t = (((p.lon - a.lon) * dx + (p.lat - a.lat) * dy) / len2).clamp(0.0, 1.0);
    GeoPoint::new(a.lon + t * dx, a.lat + t * dy)
}

/// Closest point to `p` on a polyline, computed in degree space.
///
/// A single-vertex line degenerates to that vertex. Returns `None` for an
/// empty line.
pub fn nearest_on_polyline(p: GeoPoint, line: &[GeoPoint]) -> Option<GeoPoint> {
    match line {
        [] => None,
        [only] => Some(*only),
        _ => {
            let mut best: Option<(f64, GeoPoint)> = None;
            for w in line.windows(2) {
                let q = nearest_on_segment(p, w[0], w[1]);
                let d = p.degree_distance(q);
                if best.map(|(bd, _)| d < bd).unwrap_or(true) {
                    best = Some((d, q));
                }
            }
            best.map(|(_, q)| q)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GeoPoint, nearest_on_polyline, nearest_on_segment};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn degree_distance_is_euclidean() {
        let a = GeoPoint::new(-69.5, 42.0);
        let b = GeoPoint::new(-66.5, 46.0);
        assert_close(a.degree_distance(b), 5.0, 1e-12);
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 1.0);
        assert_close(a.haversine_km(b), 111.195, 0.01);
    }

    #[test]
    fn segment_projection_clamps_to_endpoints() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(10.0, 0.0);
        assert_eq!(nearest_on_segment(GeoPoint::new(5.0, 3.0), a, b), GeoPoint::new(5.0, 0.0));
        assert_eq!(nearest_on_segment(GeoPoint::new(-4.0, 1.0), a, b), a);
        assert_eq!(nearest_on_segment(GeoPoint::new(14.0, 1.0), a, b), b);
    }

    #[test]
    fn polyline_picks_closest_segment() {
        let line = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(10.0, 0.0),
            GeoPoint::new(10.0, 10.0),
        ];
        let q = nearest_on_polyline(GeoPoint::new(12.0, 6.0), &line).unwrap();
        assert_eq!(q, GeoPoint::new(10.0, 6.0));
        assert!(nearest_on_polyline(GeoPoint::new(0.0, 0.0), &[]).is_none());
    }
}
