/// Millisecond timebase.
///
/// All timeouts in the workspace are expressed against an explicit `Millis`
/// supplied by the caller, so timer behavior is deterministic under test.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Millis(pub u64);

impl Millis {
    pub fn saturating_add(self, ms: u64) -> Self {
        Millis(self.0.saturating_add(ms))
    }

    pub fn since(self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// A point in time after which something is considered overdue.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Deadline {
    pub at: Millis,
}

impl Deadline {
    pub fn after(now: Millis, timeout_ms: u64) -> Self {
        Self {
            at: now.saturating_add(timeout_ms),
        }
    }

    pub fn expired(&self, now: Millis) -> bool {
        now >= self.at
    }

    pub fn remaining_ms(&self, now: Millis) -> u64 {
        self.at.since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::{Deadline, Millis};

    #[test]
    fn deadline_expires_at_boundary() {
        let d = Deadline::after(Millis(1_000), 3_000);
        assert!(!d.expired(Millis(3_999)));
        assert!(d.expired(Millis(4_000)));
        assert_eq!(d.remaining_ms(Millis(2_500)), 1_500);
        assert_eq!(d.remaining_ms(Millis(9_000)), 0);
    }
}
