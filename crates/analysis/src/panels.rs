//! The four analysis panels keyed by the current selection.
//!
//! `AnalysisPanels` only holds state. Callers obtain [`PanelJob`]s from
//! [`AnalysisPanels::begin`] or [`AnalysisPanels::retry`], run them however
//! they like (see [`run_panel`]), and hand outcomes back through
//! [`AnalysisPanels::deliver`], which drops anything issued for an older key.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use selection::DataKey;
use serde::Serialize;
use sources::TextRelay;
use tracing::{debug, info};

use crate::alerts::{Alerts, alerts};
use crate::conflict::{ConflictAnalysis, conflict_analysis};
use crate::insight::{AiInsight, ai_insight};
use crate::panel::{PanelKind, PanelState, Produced};
use crate::routes::{RouteOptimizations, route_optimizations};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum PanelData {
    Conflict(ConflictAnalysis),
    Insight(AiInsight),
    Routes(RouteOptimizations),
    Alerts(Alerts),
}

impl PanelData {
    pub fn kind(&self) -> PanelKind {
        match self {
            PanelData::Conflict(_) => PanelKind::Conflict,
            PanelData::Insight(_) => PanelKind::Insight,
            PanelData::Routes(_) => PanelKind::Routes,
            PanelData::Alerts(_) => PanelKind::Alerts,
        }
    }
}

/// A panel task that did not produce data (it panicked or was torn down).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelError {
    pub kind: PanelKind,
    pub message: String,
}

impl PanelError {
    pub fn new(kind: PanelKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PanelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.kind, self.message)
    }
}

impl std::error::Error for PanelError {}

pub type PanelOutcome = Result<Produced<PanelData>, PanelError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelJob {
    pub kind: PanelKind,
    pub key: DataKey,
}

/// Runs one analysis operation. Relay problems become local defaults, so
/// this never fails.
pub async fn run_panel<R: Rng>(
    kind: PanelKind,
    relay: &dyn TextRelay,
    key: &DataKey,
    rng: &mut R,
) -> Produced<PanelData> {
    match kind {
        PanelKind::Conflict => conflict_analysis(relay, key, rng).await.map(PanelData::Conflict),
        PanelKind::Insight => ai_insight(relay, key).await.map(PanelData::Insight),
        PanelKind::Routes => route_optimizations(relay, key, rng).await.map(PanelData::Routes),
        PanelKind::Alerts => alerts(relay, key, rng).await.map(PanelData::Alerts),
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPanels {
    key: Option<DataKey>,
    conflict: PanelState<ConflictAnalysis>,
    insight: PanelState<AiInsight>,
    routes: PanelState<RouteOptimizations>,
    alerts: PanelState<Alerts>,
}

impl AnalysisPanels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&self) -> Option<&DataKey> {
        self.key.as_ref()
    }

    pub fn conflict(&self) -> &PanelState<ConflictAnalysis> {
        &self.conflict
    }

    pub fn insight(&self) -> &PanelState<AiInsight> {
        &self.insight
    }

    pub fn routes(&self) -> &PanelState<RouteOptimizations> {
        &self.routes
    }

    pub fn alerts(&self) -> &PanelState<Alerts> {
        &self.alerts
    }

    pub fn is_loading(&self, kind: PanelKind) -> bool {
        match kind {
            PanelKind::Conflict => self.conflict.is_loading(),
            PanelKind::Insight => self.insight.is_loading(),
            PanelKind::Routes => self.routes.is_loading(),
            PanelKind::Alerts => self.alerts.is_loading(),
        }
    }

    pub fn any_loading(&self) -> bool {
        PanelKind::ALL.iter().any(|k| self.is_loading(*k))
    }

    pub fn error(&self, kind: PanelKind) -> Option<&str> {
        match kind {
            PanelKind::Conflict => self.conflict.error(),
            PanelKind::Insight => self.insight.error(),
            PanelKind::Routes => self.routes.error(),
            PanelKind::Alerts => self.alerts.error(),
        }
    }

    /// Switches to `key` and puts every panel into `Loading`.
    pub fn begin(&mut self, key: DataKey) -> Vec<PanelJob> {
        info!(species = %key.species_name, year = ?key.year, month = ?key.month, "analysis requested");
        self.key = Some(key.clone());
        PanelKind::ALL
            .iter()
            .map(|kind| {
                self.set_loading(*kind);
                PanelJob {
                    kind: *kind,
                    key: key.clone(),
                }
            })
            .collect()
    }

    /// Reloads one panel for the current key. `None` when no key is set or
    /// the panel is already loading.
    pub fn retry(&mut self, kind: PanelKind) -> Option<PanelJob> {
        let key = self.key.clone()?;
        if self.is_loading(kind) {
            return None;
        }
        debug!(%kind, "retrying panel");
        self.set_loading(kind);
        Some(PanelJob { kind, key })
    }

    /// Applies an outcome. Returns `false` when the job belongs to an older
    /// key or the panel is no longer waiting for it.
    pub fn deliver(&mut self, job: &PanelJob, outcome: PanelOutcome) -> bool {
        if self.key.as_ref() != Some(&job.key) || !self.is_loading(job.kind) {
            debug!(kind = %job.kind, species = %job.key.species_name, "discarding stale panel result");
            return false;
        }
        match outcome {
            Ok(produced) if produced.data.kind() == job.kind => {
                let origin = produced.origin;
                match produced.data {
                    PanelData::Conflict(data) => self.conflict = PanelState::Ready { data, origin },
                    PanelData::Insight(data) => self.insight = PanelState::Ready { data, origin },
                    PanelData::Routes(data) => self.routes = PanelState::Ready { data, origin },
                    PanelData::Alerts(data) => self.alerts = PanelState::Ready { data, origin },
                }
            }
            Ok(produced) => {
                let error = format!("expected {} data, got {}", job.kind, produced.data.kind());
                self.set_failed(job.kind, error);
            }
            Err(e) => self.set_failed(job.kind, e.message),
        }
        true
    }

    /// Runs every job concurrently against `relay` and delivers the results.
    pub async fn load(&mut self, relay: &dyn TextRelay, key: DataKey, rng: &mut StdRng) {
        let jobs = self.begin(key);
        let outcomes = {
            let run = |job: &PanelJob, seed: u64| {
                let job = job.clone();
                async move {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let produced = run_panel(job.kind, relay, &job.key, &mut rng).await;
                    (job, produced)
                }
            };
            let mut seeds = [0u64; 4];
            seeds.iter_mut().for_each(|s| *s = rng.next_u64());
            tokio::join!(
                run(&jobs[0], seeds[0]),
                run(&jobs[1], seeds[1]),
                run(&jobs[2], seeds[2]),
                run(&jobs[3], seeds[3]),
            )
        };
        let (a, b, c, d) = outcomes;
        for (job, produced) in [a, b, c, d] {
            self.deliver(&job, Ok(produced));
        }
    }

    fn set_loading(&mut self, kind: PanelKind) {
        match kind {
            PanelKind::Conflict => self.conflict = PanelState::Loading,
            PanelKind::Insight => self.insight = PanelState::Loading,
            PanelKind::Routes => self.routes = PanelState::Loading,
            PanelKind::Alerts => self.alerts = PanelState::Loading,
        }
    }

    fn set_failed(&mut self, kind: PanelKind, error: String) {
        match kind {
            PanelKind::Conflict => self.conflict = PanelState::Failed { error },
            PanelKind::Insight => self.insight = PanelState::Failed { error },
            PanelKind::Routes => self.routes = PanelState::Failed { error },
            PanelKind::Alerts => self.alerts = PanelState::Failed { error },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{AnalysisPanels, PanelError, run_panel};
    use crate::insight::AiInsight;
    use crate::panel::{Origin, PanelKind, PanelState};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use selection::DataKey;
    use sources::StaticRelay;

    fn key(species: &str) -> DataKey {
        DataKey::new(species, Some("2023"), None)
    }

    #[tokio::test(start_paused = true)]
    async fn load_fills_every_panel_even_when_relay_fails() {
        let mut panels = AnalysisPanels::new();
        let relay = StaticRelay::failing().with_delay(Duration::from_millis(200));
        panels.load(&relay, key("Gadus morhua"), &mut StdRng::seed_from_u64(4)).await;

        assert!(!panels.any_loading());
        assert_eq!(panels.insight().data(), Some(&AiInsight::default()));
        assert_eq!(panels.conflict().origin(), Some(Origin::Fallback));
        assert_eq!(panels.alerts().data().map(|a| a.len()), Some(5));
        assert_eq!(relay.prompts().len(), 4);
    }

    #[tokio::test]
    async fn results_for_an_old_key_are_discarded() {
        let mut panels = AnalysisPanels::new();
        let relay = StaticRelay::replying("ok");
        let old_jobs = panels.begin(key("Gadus morhua"));
        let new_jobs = panels.begin(key("Thunnus thynnus"));

        let mut rng = StdRng::seed_from_u64(1);
        let stale = run_panel(PanelKind::Insight, &relay, &old_jobs[1].key, &mut rng).await;
        assert!(!panels.deliver(&old_jobs[1], Ok(stale)));
        assert!(panels.insight().is_loading());

        let fresh = run_panel(PanelKind::Insight, &relay, &new_jobs[1].key, &mut rng).await;
        assert!(panels.deliver(&new_jobs[1], Ok(fresh)));
        assert_eq!(panels.insight().data().map(|i| i.insight.as_str()), Some("ok"));
        assert!(panels.conflict().is_loading());
    }

    #[tokio::test]
    async fn failure_surfaces_and_retry_reloads_one_panel() {
        let mut panels = AnalysisPanels::new();
        assert!(panels.retry(PanelKind::Routes).is_none());

        let jobs = panels.begin(key("Gadus morhua"));
        let routes_job = jobs.iter().find(|j| j.kind == PanelKind::Routes).unwrap().clone();
        assert!(panels.retry(PanelKind::Routes).is_none());
        panels.deliver(&routes_job, Err(PanelError::new(PanelKind::Routes, "task aborted")));
        assert_eq!(panels.error(PanelKind::Routes), Some("task aborted"));

        let retry = panels.retry(PanelKind::Routes).unwrap();
        assert!(panels.routes().is_loading());
        let relay = StaticRelay::replying("Slow down near the shelf edge.");
        let produced = run_panel(retry.kind, &relay, &retry.key, &mut StdRng::seed_from_u64(8)).await;
        assert!(panels.deliver(&retry, Ok(produced)));
        assert_eq!(
            panels.routes().data().map(|r| r.summary.as_str()),
            Some("Slow down near the shelf edge.")
        );
        assert!(matches!(panels.conflict(), PanelState::Loading));
    }

    #[tokio::test]
    async fn mismatched_data_marks_failure() {
        let mut panels = AnalysisPanels::new();
        let jobs = panels.begin(key("Gadus morhua"));
        let relay = StaticRelay::failing();
        let insight = run_panel(PanelKind::Insight, &relay, &jobs[0].key, &mut StdRng::seed_from_u64(0)).await;
        assert!(panels.deliver(&jobs[0], Ok(insight)));
        assert!(panels.error(PanelKind::Conflict).is_some());
    }
}
