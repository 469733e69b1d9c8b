use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Axis-aligned bounds in lon/lat degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min: GeoPoint,
    pub max: GeoPoint,
}

impl GeoBounds {
    pub fn new(min: GeoPoint, max: GeoPoint) -> Self {
        GeoBounds { min, max }
    }

    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        let first = *points.first()?;
        let mut b = GeoBounds::new(first, first);
        for p in points.iter().skip(1) {
            b.include(*p);
        }
        Some(b)
    }

    pub fn include(&mut self, p: GeoPoint) {
        self.min.lon = self.min.lon.min(p.lon);
        self.min.lat = self.min.lat.min(p.lat);
        self.max.lon = self.max.lon.max(p.lon);
        self.max.lat = self.max.lat.max(p.lat);
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        out.include(other.min);
        out.include(other.max);
        out
    }

    /// Grows the box by `margin` degrees on every side.
    pub fn padded(&self, margin: f64) -> Self {
        GeoBounds::new(
            GeoPoint::new(self.min.lon - margin, self.min.lat - margin),
            GeoPoint::new(self.max.lon + margin, self.max.lat + margin),
        )
    }

    pub fn width(&self) -> f64 {
        self.max.lon - self.min.lon
    }

    pub fn height(&self) -> f64 {
        self.max.lat - self.min.lat
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min.lon + self.max.lon) / 2.0,
            (self.min.lat + self.max.lat) / 2.0,
        )
    }

    pub fn contains(&self, p: GeoPoint) -> bool {
        p.lon >= self.min.lon && p.lon <= self.max.lon && p.lat >= self.min.lat && p.lat <= self.max.lat
    }
}
