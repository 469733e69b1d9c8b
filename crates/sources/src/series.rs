use foundation::bounds::GeoBounds;
use foundation::geo::GeoPoint;
use serde::Serialize;

/// An ordered run of positions: a migration path or a shipping lane.
///
/// Produced once per fetch and replaced, never mutated, by the next one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateSeries {
    pub points: Vec<GeoPoint>,
    pub no_data_found: bool,
}

impl CoordinateSeries {
    /// The sentinel every failed or empty fetch collapses to.
    pub fn no_data() -> Self {
        Self {
            points: Vec::new(),
            no_data_found: true,
        }
    }

    /// Wraps `points`; an empty set is no-data.
    pub fn from_points(points: Vec<GeoPoint>) -> Self {
        let no_data_found = points.is_empty();
        Self {
            points,
            no_data_found,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.no_data_found || self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_points(&self.points)
    }
}

/// Pairs a flat `[lon0, lat0, lon1, lat1, ...]` array.
///
/// A trailing odd value is dropped, as are pairs with non-finite values.
pub fn pair_flat(values: &[f64]) -> Vec<GeoPoint> {
    values
        .chunks_exact(2)
        .map(|pair| GeoPoint::new(pair[0], pair[1]))
        .filter(GeoPoint::is_finite)
        .collect()
}

/// Converts `[[lon, lat], ...]` rows, skipping rows shorter than two values.
pub fn from_rows(rows: &[Vec<f64>]) -> Vec<GeoPoint> {
    rows.iter()
        .filter(|row| row.len() >= 2)
        .map(|row| GeoPoint::new(row[0], row[1]))
        .filter(GeoPoint::is_finite)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{from_rows, pair_flat, CoordinateSeries};
    use foundation::geo::GeoPoint;

    #[test]
    fn pairs_and_drops_trailing_value() {
        let points = pair_flat(&[-70.0, 41.0, -69.0, 42.0, -68.0]);
        assert_eq!(
            points,
            vec![GeoPoint::new(-70.0, 41.0), GeoPoint::new(-69.0, 42.0)]
        );
    }

    #[test]
    fn rows_skip_short_entries() {
        let rows = vec![vec![1.0, 2.0], vec![3.0], vec![4.0, 5.0, 9.0]];
        assert_eq!(
            from_rows(&rows),
            vec![GeoPoint::new(1.0, 2.0), GeoPoint::new(4.0, 5.0)]
        );
    }

    #[test]
    fn empty_points_are_no_data() {
        assert!(CoordinateSeries::from_points(Vec::new()).no_data_found);
        assert!(CoordinateSeries::no_data().is_empty());
        let s = CoordinateSeries::from_points(vec![GeoPoint::new(0.0, 0.0)]);
        assert!(!s.is_empty());
        assert_eq!(s.len(), 1);
    }
}
