//! Conflict detection between species observations and shipping lanes.
//!
//! Observations are clustered with DBSCAN over great-circle distance; each
//! cluster centre is then compared against every lane. Lane geometry is
//! evaluated in degree space and the resulting gap converted to kilometers.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use foundation::{GeoPoint, KM_PER_DEGREE, nearest_on_polyline};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::statistics::Statistics;

pub const DEFAULT_EPS_KM: f64 = 50.0;
pub const DEFAULT_MIN_SAMPLES: usize = 5;
pub const DEFAULT_CONFLICT_THRESHOLD_KM: f64 = 10.0;
pub const DEFAULT_BUFFER_KM: f64 = 20.0;
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub position: GeoPoint,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub year: Option<i32>,
}

impl Observation {
    pub fn at(lon: f64, lat: f64) -> Self {
        Self {
            position: GeoPoint::new(lon, lat),
            species: None,
            month: None,
            year: None,
        }
    }

    pub fn species(mut self, name: &str) -> Self {
        self.species = Some(name.to_string());
        self
    }

    pub fn during(mut self, month: u32, year: i32) -> Self {
        self.month = Some(month);
        self.year = Some(year);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingLane {
    #[serde(default)]
    pub name: Option<String>,
    pub path: Vec<GeoPoint>,
}

impl ShippingLane {
    pub fn new(path: Vec<GeoPoint>) -> Self {
        Self { name: None, path }
    }

    fn display_name(&self, id: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("Lane {id}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    NotDetected,
    InvalidLane(usize),
    EmptyLane(usize),
}

impl std::fmt::Display for DetectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionError::NotDetected => write!(f, "conflict zones not available"),
            DetectionError::InvalidLane(id) => write!(f, "invalid lane id: {id}"),
            DetectionError::EmptyLane(id) => write!(f, "no coordinates for lane id: {id}"),
        }
    }
}

impl std::error::Error for DetectionError {}

/// DBSCAN labels (`None` is noise). A point's own position counts toward
/// `min_samples`, and neighbours are those within `eps_km` inclusive.
pub fn dbscan(points: &[GeoPoint], eps_km: f64, min_samples: usize) -> Vec<Option<usize>> {
    let n = points.len();
    let neighbours = |i: usize| -> Vec<usize> {
        (0..n)
            .filter(|&j| points[i].haversine_km(points[j]) <= eps_km)
            .collect()
    };

    let mut labels = vec![None; n];
    let mut visited = vec![false; n];
    let mut next_cluster = 0;
    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        let seeds = neighbours(i);
        if seeds.len() < min_samples {
            continue;
        }
        let cluster = next_cluster;
        next_cluster += 1;
        labels[i] = Some(cluster);

        let mut queue: VecDeque<usize> = seeds.into();
        while let Some(j) = queue.pop_front() {
            if labels[j].is_none() {
                labels[j] = Some(cluster);
            }
            if visited[j] {
                continue;
            }
            visited[j] = true;
            let reach = neighbours(j);
            if reach.len() >= min_samples {
                queue.extend(reach);
            }
        }
    }
    labels
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConflictRecord {
    pub cluster_id: usize,
    pub cluster_center: GeoPoint,
    /// `[first, last]` as `month/year`, or `Unknown` without dates.
    pub time_range: [String; 2],
    pub shipping_lane_id: usize,
    pub shipping_lane_name: String,
    pub distance_km: f64,
    /// 0..=100, higher when the cluster sits closer to the lane.
    pub risk_level: f64,
    pub species: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConflictSummary {
    pub total_conflicts: usize,
    pub avg_risk_level: f64,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
    pub species_affected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyConflicts {
    /// `month/year`.
    pub period: String,
    pub conflict_count: usize,
    pub avg_risk_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSuggestion {
    pub lane_id: usize,
    pub lane_name: String,
    pub original_route: Vec<GeoPoint>,
    pub suggested_route: Vec<GeoPoint>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts_avoided: Option<usize>,
}

pub struct ConflictDetector {
    observations: Vec<Observation>,
    lanes: Vec<ShippingLane>,
    labels: Option<Vec<Option<usize>>>,
    conflicts: Option<Vec<ConflictRecord>>,
}

impl ConflictDetector {
    pub fn new(observations: Vec<Observation>, lanes: Vec<ShippingLane>) -> Self {
        Self {
            observations,
            lanes,
            labels: None,
            conflicts: None,
        }
    }

    pub fn lanes(&self) -> &[ShippingLane] {
        &self.lanes
    }

    /// Clusters the observations; returns the number of clusters found.
    pub fn identify_clusters(&mut self, eps_km: f64, min_samples: usize) -> usize {
        let points: Vec<GeoPoint> = self.observations.iter().map(|o| o.position).collect();
        let labels = dbscan(&points, eps_km, min_samples);
        let clusters = labels.iter().flatten().collect::<BTreeSet<_>>().len();
        info!(observations = points.len(), clusters, "migration clusters identified");
        self.labels = Some(labels);
        self.conflicts = None;
        clusters
    }

    pub fn labels(&self) -> Option<&[Option<usize>]> {
        self.labels.as_deref()
    }

    fn members(&self) -> BTreeMap<usize, Vec<&Observation>> {
        let mut members: BTreeMap<usize, Vec<&Observation>> = BTreeMap::new();
        if let Some(labels) = &self.labels {
            for (obs, label) in self.observations.iter().zip(labels) {
                if let Some(cluster) = label {
                    members.entry(*cluster).or_default().push(obs);
                }
            }
        }
        members
    }

    /// Records every (cluster, lane) pair whose gap is within
    /// `threshold_km`, highest risk first. Clusters with the default
    /// parameters first if that has not happened yet.
    pub fn detect_conflicts(&mut self, threshold_km: f64) -> &[ConflictRecord] {
        if self.labels.is_none() {
            self.identify_clusters(DEFAULT_EPS_KM, DEFAULT_MIN_SAMPLES);
        }

        let mut conflicts = Vec::new();
        for (cluster_id, members) in self.members() {
            let lons: Vec<f64> = members.iter().map(|o| o.position.lon).collect();
            let lats: Vec<f64> = members.iter().map(|o| o.position.lat).collect();
            let (Some(lon), Some(lat)) = (Statistics::mean(&lons), Statistics::mean(&lats)) else {
                continue;
            };
            let center = GeoPoint::new(lon, lat);
            let time_range = time_range(&members);
            let species = members
                .first()
                .and_then(|o| o.species.clone())
                .unwrap_or_else(|| UNKNOWN.to_string());

            for (lane_id, lane) in self.lanes.iter().enumerate() {
                let Some(nearest) = nearest_on_polyline(center, &lane.path) else {
                    continue;
                };
                let distance_km = center.haversine_km(nearest);
                if distance_km > threshold_km {
                    continue;
                }
                let risk_level = (100.0 * (1.0 - distance_km / threshold_km)).clamp(0.0, 100.0);
                debug!(cluster_id, lane_id, distance_km, risk_level, "conflict");
                conflicts.push(ConflictRecord {
                    cluster_id,
                    cluster_center: center,
                    time_range: time_range.clone(),
                    shipping_lane_id: lane_id,
                    shipping_lane_name: lane.display_name(lane_id),
                    distance_km,
                    risk_level,
                    species: species.clone(),
                    count: members.len(),
                });
            }
        }
        conflicts.sort_by(|a, b| b.risk_level.total_cmp(&a.risk_level));
        info!(conflicts = conflicts.len(), threshold_km, "conflict detection finished");
        self.conflicts.insert(conflicts)
    }

    pub fn conflicts(&self) -> Result<&[ConflictRecord], DetectionError> {
        self.conflicts.as_deref().ok_or(DetectionError::NotDetected)
    }

    pub fn summary(&self) -> Result<ConflictSummary, DetectionError> {
        let conflicts = self.conflicts()?;
        if conflicts.is_empty() {
            return Ok(ConflictSummary::default());
        }
        let risks: Vec<f64> = conflicts.iter().map(|c| c.risk_level).collect();
        let species: BTreeSet<&str> = conflicts
            .iter()
            .map(|c| c.species.as_str())
            .filter(|s| *s != UNKNOWN)
            .collect();
        Ok(ConflictSummary {
            total_conflicts: conflicts.len(),
            avg_risk_level: Statistics::mean(&risks).unwrap_or(0.0),
            high_risk_count: risks.iter().filter(|r| **r >= 70.0).count(),
            medium_risk_count: risks.iter().filter(|r| (30.0..70.0).contains(*r)).count(),
            low_risk_count: risks.iter().filter(|r| **r < 30.0).count(),
            species_affected: species.len(),
        })
    }

    /// Conflicts per distinct `month/year` among each conflicting cluster's
    /// observations, in calendar order.
    pub fn monthly_stats(&self) -> Result<Vec<MonthlyConflicts>, DetectionError> {
        let conflicts = self.conflicts()?;
        let members = self.members();
        let mut by_month: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
        for conflict in conflicts {
            let periods: BTreeSet<(i32, u32)> = members
                .get(&conflict.cluster_id)
                .into_iter()
                .flatten()
                .filter_map(|o| Some((o.year?, o.month?)))
                .collect();
            for period in periods {
                by_month.entry(period).or_default().push(conflict.risk_level);
            }
        }
        Ok(by_month
            .into_iter()
            .map(|((year, month), risks)| MonthlyConflicts {
                period: format!("{month}/{year}"),
                conflict_count: risks.len(),
                avg_risk_level: Statistics::mean(&risks).unwrap_or(0.0),
            })
            .collect())
    }

    /// Pushes the lane vertex nearest to each conflicting cluster
    /// `buffer_km` away from it.
    pub fn suggest_route_modifications(
        &self,
        lane_id: usize,
        buffer_km: f64,
    ) -> Result<RouteSuggestion, DetectionError> {
        let conflicts = self.conflicts()?;
        let lane = self.lanes.get(lane_id).ok_or(DetectionError::InvalidLane(lane_id))?;
        if lane.path.is_empty() {
            return Err(DetectionError::EmptyLane(lane_id));
        }
        let unchanged = |message: &str| RouteSuggestion {
            lane_id,
            lane_name: lane.display_name(lane_id),
            original_route: lane.path.clone(),
            suggested_route: lane.path.clone(),
            message: message.to_string(),
            conflicts_avoided: None,
        };

        let centers: Vec<GeoPoint> = conflicts
            .iter()
            .filter(|c| c.shipping_lane_id == lane_id)
            .map(|c| c.cluster_center)
            .collect();
        if centers.is_empty() {
            return Ok(unchanged("No conflicts detected for this lane"));
        }

        let buffer_deg = buffer_km / KM_PER_DEGREE;
        let intersects = centers.iter().any(|c| {
            nearest_on_polyline(*c, &lane.path).is_some_and(|q| c.degree_distance(q) <= buffer_deg)
        });
        if !intersects {
            return Ok(unchanged("Lane already avoids conflict zones"));
        }

        let mut route = lane.path.clone();
        for center in &centers {
            let mut nearest: Option<(usize, f64)> = None;
            for (i, p) in route.iter().enumerate() {
                let d = center.degree_distance(*p);
                if nearest.map(|(_, best)| d < best).unwrap_or(true) {
                    nearest = Some((i, d));
                }
            }
            let Some((idx, mag)) = nearest else { continue };
            if mag > 0.0 {
                let vertex = &mut route[idx];
                vertex.lon += (vertex.lon - center.lon) / mag * buffer_deg;
                vertex.lat += (vertex.lat - center.lat) / mag * buffer_deg;
            }
        }

        Ok(RouteSuggestion {
            message: format!("Modified route to avoid {} conflict zones", centers.len()),
            conflicts_avoided: Some(centers.len()),
            suggested_route: route,
            ..unchanged("")
        })
    }
}

fn time_range(members: &[&Observation]) -> [String; 2] {
    let months: Vec<u32> = members.iter().filter_map(|o| o.month).collect();
    let years: Vec<i32> = members.iter().filter_map(|o| o.year).collect();
    match (Statistics::min_max(&months), Statistics::min_max(&years)) {
        (Some((m0, m1)), Some((y0, y1))) => [format!("{m0}/{y0}"), format!("{m1}/{y1}")],
        _ => [UNKNOWN.to_string(), UNKNOWN.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConflictDetector, DEFAULT_BUFFER_KM, DEFAULT_CONFLICT_THRESHOLD_KM, DetectionError, Observation,
        ShippingLane, dbscan,
    };
    use foundation::{GeoPoint, KM_PER_DEGREE};

    fn cross(lon: f64, lat: f64) -> Vec<Observation> {
        [(0.0, 0.0), (-0.01, 0.0), (0.01, 0.0), (0.0, 0.01), (0.0, -0.01)]
            .iter()
            .map(|(dx, dy)| Observation::at(lon + dx, lat + dy))
            .collect()
    }

    fn lane(points: &[(f64, f64)]) -> ShippingLane {
        ShippingLane::new(points.iter().map(|(lon, lat)| GeoPoint::new(*lon, *lat)).collect())
    }

    fn scenario() -> ConflictDetector {
        let mut obs: Vec<Observation> = cross(-70.0, 42.0)
            .into_iter()
            .map(|o| o.species("Eubalaena glacialis").during(3, 2023))
            .collect();
        obs.extend(
            cross(-60.0, 40.0)
                .into_iter()
                .enumerate()
                .map(|(i, o)| o.species("Gadus morhua").during(if i < 3 { 4 } else { 5 }, 2023)),
        );
        obs.push(Observation::at(-50.0, 30.0));
        let lanes = vec![
            lane(&[(-71.0, 42.0), (-68.0, 42.0)]),
            lane(&[(-61.0, 40.05), (-59.0, 40.05)]),
            lane(&[(-40.0, 10.0), (-39.0, 10.0)]),
        ];
        ConflictDetector::new(obs, lanes)
    }

    #[test]
    fn dbscan_separates_groups_and_noise() {
        let mut points: Vec<GeoPoint> = cross(-70.0, 42.0).iter().map(|o| o.position).collect();
        points.extend(cross(-60.0, 40.0).iter().map(|o| o.position));
        points.push(GeoPoint::new(-50.0, 30.0));
        let labels = dbscan(&points, 50.0, 5);
        assert!(labels[..5].iter().all(|l| *l == Some(0)));
        assert!(labels[5..10].iter().all(|l| *l == Some(1)));
        assert_eq!(labels[10], None);

        assert!(dbscan(&points[..4], 50.0, 5).iter().all(Option::is_none));
    }

    #[test]
    fn conflicts_sorted_by_risk() {
        let mut d = scenario();
        assert_eq!(d.conflicts().unwrap_err(), DetectionError::NotDetected);
        let conflicts = d.detect_conflicts(DEFAULT_CONFLICT_THRESHOLD_KM).to_vec();
        assert_eq!(conflicts.len(), 2);

        assert_eq!(conflicts[0].shipping_lane_id, 0);
        assert_eq!(conflicts[0].shipping_lane_name, "Lane 0");
        assert!(conflicts[0].risk_level > 99.9);
        assert_eq!(conflicts[0].species, "Eubalaena glacialis");
        assert_eq!(conflicts[0].count, 5);
        assert_eq!(conflicts[0].time_range, ["3/2023".to_string(), "3/2023".to_string()]);

        assert_eq!(conflicts[1].shipping_lane_id, 1);
        assert!((conflicts[1].distance_km - 5.56).abs() < 0.05);
        assert!(conflicts[1].risk_level > 40.0 && conflicts[1].risk_level < 50.0);
        assert_eq!(conflicts[1].time_range, ["4/2023".to_string(), "5/2023".to_string()]);
    }

    #[test]
    fn summary_buckets() {
        let mut d = scenario();
        d.detect_conflicts(DEFAULT_CONFLICT_THRESHOLD_KM);
        let s = d.summary().unwrap();
        assert_eq!(s.total_conflicts, 2);
        assert_eq!((s.high_risk_count, s.medium_risk_count, s.low_risk_count), (1, 1, 0));
        assert_eq!(s.species_affected, 2);
        assert!(s.avg_risk_level > 70.0 && s.avg_risk_level < 75.0);
    }

    #[test]
    fn monthly_stats_in_calendar_order() {
        let mut d = scenario();
        d.detect_conflicts(DEFAULT_CONFLICT_THRESHOLD_KM);
        let monthly = d.monthly_stats().unwrap();
        let periods: Vec<&str> = monthly.iter().map(|m| m.period.as_str()).collect();
        assert_eq!(periods, vec!["3/2023", "4/2023", "5/2023"]);
        assert!(monthly.iter().all(|m| m.conflict_count == 1));
    }

    #[test]
    fn route_suggestions() {
        let mut d = scenario();
        d.detect_conflicts(DEFAULT_CONFLICT_THRESHOLD_KM);

        let moved = d.suggest_route_modifications(0, DEFAULT_BUFFER_KM).unwrap();
        assert_eq!(moved.message, "Modified route to avoid 1 conflict zones");
        assert_eq!(moved.conflicts_avoided, Some(1));
        let shift = DEFAULT_BUFFER_KM / KM_PER_DEGREE;
        assert!((moved.suggested_route[0].lon - (-71.0 - shift)).abs() < 1e-6);
        assert!((moved.suggested_route[0].lat - 42.0).abs() < 1e-6);
        assert_eq!(moved.suggested_route[1], GeoPoint::new(-68.0, 42.0));
        assert_eq!(moved.original_route[0], GeoPoint::new(-71.0, 42.0));

        let quiet = d.suggest_route_modifications(2, DEFAULT_BUFFER_KM).unwrap();
        assert_eq!(quiet.message, "No conflicts detected for this lane");
        assert_eq!(quiet.suggested_route, quiet.original_route);

        assert_eq!(
            d.suggest_route_modifications(9, DEFAULT_BUFFER_KM).unwrap_err(),
            DetectionError::InvalidLane(9)
        );
    }

    #[test]
    fn wide_threshold_conflict_can_already_clear_the_buffer() {
        let obs = cross(-70.0, 42.0);
        let lanes = vec![lane(&[(-71.0, 42.2), (-69.0, 42.2)])];
        let mut d = ConflictDetector::new(obs, lanes);
        assert_eq!(d.detect_conflicts(30.0).len(), 1);
        let s = d.suggest_route_modifications(0, DEFAULT_BUFFER_KM).unwrap();
        assert_eq!(s.message, "Lane already avoids conflict zones");
        assert_eq!(s.conflicts_avoided, None);
    }
}
