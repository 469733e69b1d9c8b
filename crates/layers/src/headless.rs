//! Engine factories that need no display: one that always produces canvas
//! engines, and a scripted one that simulates primary-engine behavior.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use foundation::geo::GeoPoint;
use parking_lot::Mutex;
use runtime::frame::Frame;

use crate::canvas::CanvasEngine;
use crate::engine::{
    EngineError, EngineFactory, EngineKind, MapEngine, Readiness, ScreenPoint, primary_kind,
};
use crate::layer::{Overlay, OverlayId, OverlayStore};
use crate::view_mode::ViewMode;

/// Produces a [`CanvasEngine`] for every mode.
#[derive(Debug, Clone, Copy)]
pub struct HeadlessFactory {
    pub width: f64,
    pub height: f64,
}

impl Default for HeadlessFactory {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl EngineFactory for HeadlessFactory {
    fn create(&mut self, _mode: ViewMode) -> Result<Box<dyn MapEngine>, EngineError> {
        Ok(Box::new(CanvasEngine::new(self.width, self.height)))
    }
}

/// How a scripted engine behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineScript {
    /// Ready after `polls` calls to `poll_ready`.
    ReadyAfter { polls: u32 },
    /// Stays pending forever.
    NeverReady,
    /// Constructs, then reports failure on the first poll.
    FailsAfterCreate(String),
    /// Construction itself fails.
    FailsToCreate(String),
}

/// Lifecycle events observed across every engine a [`ScriptedFactory`] built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Created(EngineKind),
    FrameLoopTick(EngineKind),
    Destroyed(EngineKind),
}

/// Factory whose engines follow a per-mode script and record their
/// lifecycle into a shared log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFactory {
    scripts: HashMap<ViewMode, VecDeque<EngineScript>>,
    log: Arc<Mutex<Vec<EngineEvent>>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a script for the next engine built for `mode`. The last script
    /// for a mode repeats; modes without a script are ready immediately.
    pub fn script(mut self, mode: ViewMode, script: EngineScript) -> Self {
        self.scripts.entry(mode).or_default().push_back(script);
        self
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.log.lock().clone()
    }

    fn next_script(&mut self, mode: ViewMode) -> EngineScript {
        match self.scripts.get_mut(&mode) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or(EngineScript::ReadyAfter { polls: 0 }),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or(EngineScript::ReadyAfter { polls: 0 }),
            None => EngineScript::ReadyAfter { polls: 0 },
        }
    }
}

impl EngineFactory for ScriptedFactory {
    fn create(&mut self, mode: ViewMode) -> Result<Box<dyn MapEngine>, EngineError> {
        let kind = primary_kind(mode);
        let script = self.next_script(mode);
        if let EngineScript::FailsToCreate(reason) = script {
            return Err(EngineError::Unavailable { kind, reason });
        }
        self.log.lock().push(EngineEvent::Created(kind));
        Ok(Box::new(ScriptedEngine {
            kind,
            script,
            polls: 0,
            overlays: OverlayStore::new(),
            destroyed: false,
            log: Arc::clone(&self.log),
        }))
    }
}

struct ScriptedEngine {
    kind: EngineKind,
    script: EngineScript,
    polls: u32,
    overlays: OverlayStore,
    destroyed: bool,
    log: Arc<Mutex<Vec<EngineEvent>>>,
}

impl MapEngine for ScriptedEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn poll_ready(&mut self) -> Readiness {
        if self.destroyed {
            return Readiness::Failed("destroyed".to_string());
        }
        self.polls = self.polls.saturating_add(1);
        match &self.script {
            EngineScript::ReadyAfter { polls } if self.polls > *polls => Readiness::Ready,
            EngineScript::ReadyAfter { .. } | EngineScript::NeverReady => Readiness::Pending,
            EngineScript::FailsAfterCreate(reason) | EngineScript::FailsToCreate(reason) => {
                Readiness::Failed(reason.clone())
            }
        }
    }

    fn add_overlay(&mut self, overlay: Overlay) -> Result<OverlayId, EngineError> {
        if self.destroyed {
            return Err(EngineError::Destroyed);
        }
        Ok(self.overlays.insert(overlay))
    }

    fn remove_overlay(&mut self, id: OverlayId) -> bool {
        self.overlays.remove(id)
    }

    fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    fn project(&self, at: GeoPoint) -> ScreenPoint {
        // Plate carrée over the whole world at 1 px per 0.1 degree.
        ScreenPoint::new((at.lon + 180.0) * 10.0, (90.0 - at.lat) * 10.0)
    }

    fn on_frame(&mut self, _frame: Frame) {
        self.log.lock().push(EngineEvent::FrameLoopTick(self.kind));
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.overlays.clear();
            self.log.lock().push(EngineEvent::Destroyed(self.kind));
        }
    }
}
