use std::collections::BTreeMap;

use foundation::time::{Deadline, Millis};

/// Deterministic one-shot timers keyed by `K`.
///
/// Timers never fire on their own: the owner calls [`Timers::expire`] with
/// the current time and reacts to the keys that came due. Expired keys are
/// returned in key order so behavior is replayable.
#[derive(Debug)]
pub struct Timers<K: Ord + Copy> {
    armed: BTreeMap<K, Deadline>,
}

impl<K: Ord + Copy> Default for Timers<K> {
    fn default() -> Self {
        Self {
            armed: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> Timers<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms (or re-arms) `key` to fire `timeout_ms` after `now`.
    pub fn arm(&mut self, key: K, now: Millis, timeout_ms: u64) {
        self.armed.insert(key, Deadline::after(now, timeout_ms));
    }

    /// Returns `true` if the timer was armed.
    pub fn disarm(&mut self, key: K) -> bool {
        self.armed.remove(&key).is_some()
    }

    pub fn is_armed(&self, key: K) -> bool {
        self.armed.contains_key(&key)
    }

    pub fn deadline(&self, key: K) -> Option<Deadline> {
        self.armed.get(&key).copied()
    }

    /// Removes and returns every timer whose deadline has passed.
    pub fn expire(&mut self, now: Millis) -> Vec<K> {
        let due: Vec<K> = self
            .armed
            .iter()
            .filter(|(_, d)| d.expired(now))
            .map(|(k, _)| *k)
            .collect();
        for k in &due {
            self.armed.remove(k);
        }
        due
    }

    pub fn clear(&mut self) {
        self.armed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::Timers;
    use foundation::time::Millis;

    #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
    enum Key {
        A,
        B,
    }

    #[test]
    fn fires_once_after_deadline() {
        let mut t = Timers::new();
        t.arm(Key::A, Millis(0), 100);
        assert!(t.expire(Millis(99)).is_empty());
        assert_eq!(t.expire(Millis(100)), vec![Key::A]);
        assert!(t.expire(Millis(1_000)).is_empty());
    }

    #[test]
    fn rearm_pushes_deadline_and_disarm_cancels() {
        let mut t = Timers::new();
        t.arm(Key::A, Millis(0), 100);
        t.arm(Key::B, Millis(0), 50);
        t.arm(Key::A, Millis(80), 100);
        assert_eq!(t.expire(Millis(120)), vec![Key::B]);
        assert!(t.disarm(Key::A));
        assert!(!t.disarm(Key::A));
        assert!(t.expire(Millis(500)).is_empty());
    }
}
