/// Monotonic revision counter.
///
/// Every effective selection change produces a new generation; anything
/// computed for an older generation is stale and must be discarded.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn new(n: u64) -> Self {
        Generation(n)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Generation;

    #[test]
    fn next_is_strictly_greater() {
        let g = Generation::default();
        assert!(g.next() > g);
        assert_eq!(g.next().get(), 1);
    }
}
