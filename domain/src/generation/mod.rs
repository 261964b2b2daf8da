//! Generation guard.
//!
//! A process-lifetime counter bumped on every scenario switch. Asynchronous
//! work captures the current [`Generation`] when it starts and may only apply
//! its result if the guard still reports the same value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A captured value of the generation counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic counter invalidating stale asynchronous results
#[derive(Debug, Default)]
pub struct GenerationGuard {
    counter: AtomicU64,
}

impl GenerationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the current generation.
    pub fn current(&self) -> Generation {
        Generation(self.counter.load(Ordering::SeqCst))
    }

    /// Advance the counter and return the new generation.
    pub fn bump(&self) -> Generation {
        Generation(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether a captured generation is still the current one.
    pub fn is_current(&self, captured: Generation) -> bool {
        self.current() == captured
    }
}
