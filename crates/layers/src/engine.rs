//! The map-engine capability the renderer draws through.
//!
//! Engines are created by an injected [`EngineFactory`]; nothing in this
//! crate reaches for global state.

use foundation::geo::GeoPoint;
use runtime::frame::Frame;
use serde::Serialize;

use crate::canvas::DisplayList;
use crate::layer::{Overlay, OverlayId};
use crate::view_mode::ViewMode;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EngineKind {
    /// Primary slippy-map engine.
    Map2d,
    /// 3D globe engine.
    Globe,
    /// Self-contained canvas renderer used when the others are unavailable.
    Canvas,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Pending,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine could not be constructed (missing script, no context, ...).
    Unavailable { kind: EngineKind, reason: String },
    Destroyed,
    Rejected(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Unavailable { kind, reason } => {
                write!(f, "{kind:?} engine unavailable: {reason}")
            }
            EngineError::Destroyed => write!(f, "engine already destroyed"),
            EngineError::Rejected(m) => write!(f, "overlay rejected: {m}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Pixel position inside the map viewport.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

pub trait MapEngine: Send {
    fn kind(&self) -> EngineKind;

    /// Polled by the renderer until it returns `Ready` or `Failed`.
    fn poll_ready(&mut self) -> Readiness;

    fn add_overlay(&mut self, overlay: Overlay) -> Result<OverlayId, EngineError>;

    /// Returns `true` if the overlay existed.
    fn remove_overlay(&mut self, id: OverlayId) -> bool;

    fn overlay_count(&self) -> usize;

    fn project(&self, at: GeoPoint) -> ScreenPoint;

    /// Advances per-frame animation.
    fn on_frame(&mut self, _frame: Frame) {}

    /// Flat drawing of the current state, for engines that can produce one.
    fn display_list(&self) -> Option<DisplayList> {
        None
    }

    /// Releases every resource the engine holds. Idempotent.
    fn destroy(&mut self);
}

pub trait EngineFactory: Send {
    /// Constructs the primary engine for `mode`.
    fn create(&mut self, mode: ViewMode) -> Result<Box<dyn MapEngine>, EngineError>;
}

pub fn primary_kind(mode: ViewMode) -> EngineKind {
    match mode {
        ViewMode::TwoD => EngineKind::Map2d,
        ViewMode::ThreeD => EngineKind::Globe,
    }
}
