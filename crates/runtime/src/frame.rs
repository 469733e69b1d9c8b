/// Deterministic frame metadata for animation loops.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Fixed delta time (seconds).
    pub dt_s: f64,
    /// Loop time at the start of the frame (seconds).
    pub time_s: f64,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time_s: index as f64 * dt_s,
        }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FrameLoopId(pub u64);

/// Holds at most one active per-frame loop.
///
/// Starting a loop always cancels the previous one first, so two loops can
/// never drive the same visual state.
#[derive(Debug, Default)]
pub struct FrameLoopSlot {
    next_id: u64,
    active: Option<(FrameLoopId, Frame)>,
}

impl FrameLoopSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new loop; returns its id and the id of the loop it replaced.
    pub fn start(&mut self, dt_s: f64) -> (FrameLoopId, Option<FrameLoopId>) {
        let replaced = self.cancel();
        let id = FrameLoopId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.active = Some((id, Frame::new(0, dt_s)));
        (id, replaced)
    }

    pub fn cancel(&mut self) -> Option<FrameLoopId> {
        self.active.take().map(|(id, _)| id)
    }

    pub fn active(&self) -> Option<FrameLoopId> {
        self.active.map(|(id, _)| id)
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Returns the frame to run for the active loop and advances it.
    pub fn advance(&mut self) -> Option<Frame> {
        let (_, frame) = self.active.as_mut()?;
        let current = *frame;
        *frame = frame.next();
        Some(current)
    }
}
