//! Monotonic generation tokens for superseding async work
//!
//! Every request that may be overtaken by a later one (a debounced search, a
//! tree selection) takes the next generation before it suspends. When it resumes it applies its result only if its generation is
//! still the latest issued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared, cloneable generation counter
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    latest: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new generation, superseding every earlier one
    pub fn next(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Latest generation issued (0 before the first)
    pub fn current(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_generation_supersedes_earlier() {
        let counter = GenerationCounter::new();
        assert_eq!(counter.current(), 0);

        let first = counter.next();
        assert!(counter.is_current(first));

        let shared = counter.clone();
        let second = shared.next();
        assert!(second > first);
        assert!(!counter.is_current(first));
        assert!(counter.is_current(second));
    }
}
