use foundation::time::{Deadline, Millis};
use serde::Serialize;
use tracing::debug;

/// How long the "view changing" state may last without a ready signal.
pub const VIEW_CHANGE_TIMEOUT_MS: u64 = 3_000;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ViewMode {
    #[serde(rename = "2d")]
    TwoD,
    #[default]
    #[serde(rename = "3d")]
    ThreeD,
}

impl ViewMode {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "2d" | "two_d" | "two" | "map" => ViewMode::TwoD,
            _ => ViewMode::ThreeD,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            ViewMode::TwoD => ViewMode::ThreeD,
            ViewMode::ThreeD => ViewMode::TwoD,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::TwoD => "2d",
            ViewMode::ThreeD => "3d",
        }
    }
}

/// Tracks the active view mode and the bounded "view changing" state.
#[derive(Debug, Clone)]
pub struct ViewModeController {
    mode: ViewMode,
    changing_until: Option<Deadline>,
    timeout_ms: u64,
}

impl ViewModeController {
    pub fn new(mode: ViewMode) -> Self {
        Self {
            mode,
            changing_until: None,
            timeout_ms: VIEW_CHANGE_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn is_changing(&self) -> bool {
        self.changing_until.is_some()
    }

    /// Flips the mode and enters the changing state.
    pub fn toggle(&mut self, now: Millis) -> ViewMode {
        self.mode = self.mode.flipped();
        self.changing_until = Some(Deadline::after(now, self.timeout_ms));
        debug!(mode = self.mode.as_str(), "view mode toggled");
        self.mode
    }

    /// The new engine reported ready.
    pub fn on_ready(&mut self) {
        self.changing_until = None;
    }

    /// Clears the changing state once its deadline passes. Returns `true` if
    /// this call cleared it.
    pub fn tick(&mut self, now: Millis) -> bool {
        match self.changing_until {
            Some(deadline) if deadline.expired(now) => {
                debug!(mode = self.mode.as_str(), "view change timed out; clearing");
                self.changing_until = None;
                true
            }
            _ => false,
        }
    }
}
