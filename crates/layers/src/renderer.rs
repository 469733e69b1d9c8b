use foundation::geo::GeoPoint;
use foundation::time::Millis;
use runtime::frame::{Frame, FrameLoopSlot};
use runtime::timer::Timers;
use selection::data_layers::{DataLayers, LayerKey};
use selection::selection::Selection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::canvas::{CanvasEngine, DisplayList};
use crate::engine::{EngineError, EngineFactory, EngineKind, MapEngine, Readiness};
use crate::info_card::InfoCard;
use crate::sync::{LayerSync, RenderInputs, SyncReport};
use crate::view_mode::{ViewMode, ViewModeController};
use crate::zones::{ConflictZone, conflict_zones, pick_zone};

/// A primary engine that has not signalled ready by then is replaced.
pub const ENGINE_READY_TIMEOUT_MS: u64 = 5_000;

const FRAME_DT_S: f64 = 1.0 / 60.0;
const FALLBACK_SIZE: (f64, f64) = (1280.0, 720.0);

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum RendererTimer {
    EngineReady,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "camelCase")]
pub enum FallbackReason {
    CreateFailed(String),
    ReportedFailure(String),
    ReadyTimeout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererStatus {
    pub mode: ViewMode,
    pub engine: EngineKind,
    pub ready: bool,
    pub view_changing: bool,
    pub fallback: Option<FallbackReason>,
    pub visible_layers: Vec<LayerKey>,
    pub overlay_count: usize,
    pub frame_loop_running: bool,
    pub info_card_open: bool,
}

/// Draws the selection's layers through whichever engine is active.
///
/// Owns exactly one engine at a time. Primary engines come from the injected
/// factory; when one cannot be built, reports failure, or stays silent past
/// [`ENGINE_READY_TIMEOUT_MS`], a [`CanvasEngine`] takes its place.
pub struct MapRenderer {
    factory: Box<dyn EngineFactory>,
    engine: Box<dyn MapEngine>,
    controller: ViewModeController,
    sync: LayerSync,
    zones: Vec<ConflictZone>,
    species: String,
    layers: DataLayers,
    inputs: RenderInputs,
    info_card: Option<InfoCard>,
    frame_loop: FrameLoopSlot,
    timers: Timers<RendererTimer>,
    ready: bool,
    fallback: Option<FallbackReason>,
}

impl MapRenderer {
    pub fn new(factory: Box<dyn EngineFactory>, mode: ViewMode, now: Millis) -> Self {
        let mut renderer = Self {
            factory,
            engine: fallback_engine(),
            controller: ViewModeController::new(mode),
            sync: LayerSync::new(),
            zones: conflict_zones(),
            species: String::new(),
            layers: DataLayers::default(),
            inputs: RenderInputs::default(),
            info_card: None,
            frame_loop: FrameLoopSlot::new(),
            timers: Timers::new(),
            ready: false,
            fallback: None,
        };
        renderer.install_primary(mode, now);
        renderer
    }

    pub fn mode(&self) -> ViewMode {
        self.controller.mode()
    }

    pub fn engine_kind(&self) -> EngineKind {
        self.engine.kind()
    }

    pub fn is_view_changing(&self) -> bool {
        self.controller.is_changing()
    }

    pub fn info_card(&self) -> Option<&InfoCard> {
        self.info_card.as_ref()
    }

    pub fn layer_sync(&self) -> &LayerSync {
        &self.sync
    }

    pub fn inputs(&self) -> &RenderInputs {
        &self.inputs
    }

    pub fn display_list(&self) -> Option<DisplayList> {
        self.engine.display_list()
    }

    pub fn status(&self) -> RendererStatus {
        RendererStatus {
            mode: self.mode(),
            engine: self.engine.kind(),
            ready: self.ready,
            view_changing: self.controller.is_changing(),
            fallback: self.fallback.clone(),
            visible_layers: self.sync.visible_layers(),
            overlay_count: self.engine.overlay_count(),
            frame_loop_running: self.frame_loop.is_running(),
            info_card_open: self.info_card.is_some(),
        }
    }

    /// Applies the selection's layer flags and the latest series.
    pub fn sync(
        &mut self,
        selection: &Selection,
        inputs: RenderInputs,
    ) -> Result<SyncReport, EngineError> {
        self.species = selection.species_name().to_string();
        self.layers = selection.data_layers();
        let inputs_changed = self.inputs != inputs;
        self.inputs = inputs;
        let report = self.apply_layers()?;
        if inputs_changed || !report.is_noop() {
            self.restart_frame_loop();
        }
        Ok(report)
    }

    /// Handles a map click: opens the card for the nearest zone in range, or
    /// closes any open card.
    pub fn click(&mut self, at: GeoPoint) -> Option<&InfoCard> {
        match pick_zone(at, &self.zones) {
            Some(idx) => {
                let zone = &self.zones[idx];
                let screen = self.engine.project(zone.center());
                debug!(zone = idx, "conflict zone clicked");
                self.info_card = Some(InfoCard::for_zone(idx, zone, &self.species, screen));
            }
            None => self.info_card = None,
        }
        self.info_card.as_ref()
    }

    pub fn close_info_card(&mut self) {
        self.info_card = None;
    }

    /// Drives readiness, fallback and view-change timeouts.
    pub fn poll(&mut self, now: Millis) -> RendererStatus {
        if !self.ready {
            match self.engine.poll_ready() {
                Readiness::Ready => {
                    self.ready = true;
                    self.timers.disarm(RendererTimer::EngineReady);
                    self.controller.on_ready();
                    info!(engine = ?self.engine.kind(), "map engine ready");
                }
                Readiness::Failed(reason) => {
                    self.fall_back(FallbackReason::ReportedFailure(reason));
                }
                Readiness::Pending => {
                    if self
                        .timers
                        .expire(now)
                        .contains(&RendererTimer::EngineReady)
                    {
                        self.fall_back(FallbackReason::ReadyTimeout);
                    }
                }
            }
        }
        self.controller.tick(now);
        self.status()
    }

    /// Switches 2D/3D. The outgoing engine's frame loop is cancelled and the
    /// engine destroyed before the new one is constructed.
    pub fn toggle_view_mode(&mut self, now: Millis) -> ViewMode {
        if let Some(id) = self.frame_loop.cancel() {
            debug!(?id, "frame loop cancelled for view switch");
        }
        self.teardown();
        self.info_card = None;
        let mode = self.controller.toggle(now);
        self.install_primary(mode, now);
        mode
    }

    /// Runs one frame of the active loop, if any.
    pub fn tick_frame(&mut self) -> Option<Frame> {
        let frame = self.frame_loop.advance()?;
        self.engine.on_frame(frame);
        Some(frame)
    }

    fn install_primary(&mut self, mode: ViewMode, now: Millis) {
        self.ready = false;
        self.fallback = None;
        match self.factory.create(mode) {
            Ok(engine) => {
                debug!(engine = ?engine.kind(), "map engine created");
                self.engine = engine;
                self.timers
                    .arm(RendererTimer::EngineReady, now, ENGINE_READY_TIMEOUT_MS);
                self.reapply();
            }
            Err(e) => {
                warn!(error = %e, "map engine unavailable");
                self.fall_back(FallbackReason::CreateFailed(e.to_string()));
            }
        }
    }

    fn fall_back(&mut self, reason: FallbackReason) {
        warn!(?reason, from = ?self.engine.kind(), "switching to canvas renderer");
        self.frame_loop.cancel();
        self.teardown();
        self.engine = fallback_engine();
        self.timers.disarm(RendererTimer::EngineReady);
        self.ready = true;
        self.fallback = Some(reason);
        self.controller.on_ready();
        self.reapply();
    }

    fn teardown(&mut self) {
        self.engine.destroy();
        self.sync.reset();
    }

    fn reapply(&mut self) {
        if let Err(e) = self.apply_layers() {
            warn!(error = %e, "layer sync failed on new engine");
        }
        self.restart_frame_loop();
    }

    fn apply_layers(&mut self) -> Result<SyncReport, EngineError> {
        self.sync
            .sync(self.engine.as_mut(), self.layers, &self.inputs, &self.zones)
    }

    fn restart_frame_loop(&mut self) {
        if self.sync.is_visible(LayerKey::MigrationRoutes) {
            let (id, replaced) = self.frame_loop.start(FRAME_DT_S);
            debug!(?id, ?replaced, "frame loop started");
        } else if self.frame_loop.cancel().is_some() {
            debug!("frame loop stopped; no migration route visible");
        }
    }
}

fn fallback_engine() -> Box<dyn MapEngine> {
    Box::new(CanvasEngine::new(FALLBACK_SIZE.0, FALLBACK_SIZE.1))
}

impl Drop for MapRenderer {
    fn drop(&mut self) {
        self.frame_loop.cancel();
        self.engine.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::{ENGINE_READY_TIMEOUT_MS, FallbackReason, MapRenderer};
    use crate::engine::EngineKind;
    use crate::headless::{EngineEvent, EngineScript, ScriptedFactory};
    use crate::info_card::INFO_CARD_TITLE;
    use crate::sync::RenderInputs;
    use crate::view_mode::{VIEW_CHANGE_TIMEOUT_MS, ViewMode};
    use foundation::geo::GeoPoint;
    use foundation::time::Millis;
    use selection::selection::Selection;
    use sources::series::CoordinateSeries;

    fn inputs() -> RenderInputs {
        RenderInputs {
            migration: CoordinateSeries::from_points(vec![
                GeoPoint::new(-70.0, 40.0),
                GeoPoint::new(-66.0, 44.0),
            ]),
            shipping: CoordinateSeries::no_data(),
            sea_temperature: CoordinateSeries::no_data(),
        }
    }

    #[test]
    fn create_failure_falls_back_to_canvas() {
        let factory = ScriptedFactory::new()
            .script(ViewMode::TwoD, EngineScript::FailsToCreate("script load failed".into()));
        let mut r = MapRenderer::new(Box::new(factory), ViewMode::TwoD, Millis(0));
        assert_eq!(r.engine_kind(), EngineKind::Canvas);
        let status = r.poll(Millis(1));
        assert!(status.ready);
        assert!(matches!(status.fallback, Some(FallbackReason::CreateFailed(_))));
        r.sync(&Selection::default(), inputs()).unwrap();
        assert!(r.display_list().is_some());
    }

    #[test]
    fn silent_engine_is_replaced_after_timeout() {
        let factory = ScriptedFactory::new().script(ViewMode::TwoD, EngineScript::NeverReady);
        let events = factory.clone();
        let mut r = MapRenderer::new(Box::new(factory), ViewMode::TwoD, Millis(0));
        r.sync(&Selection::default(), inputs()).unwrap();
        assert_eq!(r.poll(Millis(ENGINE_READY_TIMEOUT_MS - 1)).engine, EngineKind::Map2d);

        let status = r.poll(Millis(ENGINE_READY_TIMEOUT_MS));
        assert_eq!(status.engine, EngineKind::Canvas);
        assert_eq!(status.fallback, Some(FallbackReason::ReadyTimeout));
        // The outgoing engine was destroyed and layers were re-applied.
        assert!(events.events().contains(&EngineEvent::Destroyed(EngineKind::Map2d)));
        assert!(status.overlay_count > 0);
    }

    #[test]
    fn reported_failure_falls_back() {
        let factory = ScriptedFactory::new()
            .script(ViewMode::ThreeD, EngineScript::FailsAfterCreate("webgl lost".into()));
        let mut r = MapRenderer::new(Box::new(factory), ViewMode::ThreeD, Millis(0));
        let status = r.poll(Millis(10));
        assert_eq!(status.engine, EngineKind::Canvas);
        assert_eq!(
            status.fallback,
            Some(FallbackReason::ReportedFailure("webgl lost".into()))
        );
    }

    #[test]
    fn toggle_tears_down_before_building_and_clears_changing_on_timeout() {
        let factory = ScriptedFactory::new().script(ViewMode::ThreeD, EngineScript::NeverReady);
        let events = factory.clone();
        let mut r = MapRenderer::new(Box::new(factory), ViewMode::TwoD, Millis(0));
        r.sync(&Selection::default(), inputs()).unwrap();
        r.poll(Millis(1));
        assert!(r.status().frame_loop_running);

        assert_eq!(r.toggle_view_mode(Millis(100)), ViewMode::ThreeD);
        assert!(r.is_view_changing());
        let log = events.events();
        let destroyed = log
            .iter()
            .position(|e| *e == EngineEvent::Destroyed(EngineKind::Map2d))
            .unwrap();
        let created = log
            .iter()
            .position(|e| *e == EngineEvent::Created(EngineKind::Globe))
            .unwrap();
        assert!(destroyed < created);

        r.poll(Millis(100 + VIEW_CHANGE_TIMEOUT_MS - 1));
        assert!(r.is_view_changing());
        r.poll(Millis(100 + VIEW_CHANGE_TIMEOUT_MS));
        assert!(!r.is_view_changing());
    }

    #[test]
    fn ready_signal_clears_changing_early() {
        let factory = ScriptedFactory::new().script(ViewMode::ThreeD, EngineScript::ReadyAfter { polls: 0 });
        let mut r = MapRenderer::new(Box::new(factory), ViewMode::TwoD, Millis(0));
        r.toggle_view_mode(Millis(0));
        assert!(r.is_view_changing());
        r.poll(Millis(5));
        assert!(!r.is_view_changing());
        assert_eq!(r.engine_kind(), EngineKind::Globe);
    }

    #[test]
    fn only_one_frame_loop_ticks_after_switch() {
        let factory = ScriptedFactory::new();
        let events = factory.clone();
        let mut r = MapRenderer::new(Box::new(factory), ViewMode::TwoD, Millis(0));
        r.sync(&Selection::default(), inputs()).unwrap();
        r.tick_frame();
        r.toggle_view_mode(Millis(10));
        r.tick_frame();
        let ticks: Vec<_> = events
            .events()
            .into_iter()
            .filter(|e| matches!(e, EngineEvent::FrameLoopTick(_)))
            .collect();
        assert_eq!(
            ticks,
            vec![
                EngineEvent::FrameLoopTick(EngineKind::Map2d),
                EngineEvent::FrameLoopTick(EngineKind::Globe)
            ]
        );
    }

    #[test]
    fn click_opens_and_closes_card() {
        let mut r = MapRenderer::new(Box::new(ScriptedFactory::new()), ViewMode::TwoD, Millis(0));
        r.sync(&Selection::default(), inputs()).unwrap();
        let card = r.click(GeoPoint::new(-69.8, 41.6)).unwrap();
        assert_eq!(card.title, INFO_CARD_TITLE);
        assert_eq!(card.payload.risk_percentage, 87);
        assert_eq!(card.species, "Clupea pallasii");
        assert!(r.click(GeoPoint::new(0.0, 0.0)).is_none());
        assert!(r.info_card().is_none());
    }

    #[test]
    fn resync_with_same_inputs_keeps_overlays() {
        let mut r = MapRenderer::new(Box::new(ScriptedFactory::new()), ViewMode::TwoD, Millis(0));
        r.sync(&Selection::default(), inputs()).unwrap();
        let count = r.status().overlay_count;
        let report = r.sync(&Selection::default(), inputs()).unwrap();
        assert!(report.is_noop());
        assert_eq!(r.status().overlay_count, count);
    }
}
