use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU64, Ordering};

/// The global version clock.
///
/// A monotonically non-decreasing counter shared by every transaction on a
/// region. Read-only transactions only sample it; committing writers bump
/// it exactly once, and the post-increment value becomes their write
/// version. Padded to a cache line of its own: every commit on the region
/// hits this word.
pub(crate) struct GlobalClock {
    ticks: CachePadded<AtomicU64>,
}

impl GlobalClock {
    pub(crate) fn new() -> Self {
        Self {
            ticks: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Current clock value. Taken at transaction begin as the read version.
    #[inline]
    pub(crate) fn sample(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Advance the clock and return the post-increment value.
    ///
    /// Called exactly once per committing writer. Strictly larger than any
    /// `sample` or `bump` that happens-before it.
    #[inline]
    pub(crate) fn bump(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::AcqRel) + 1
    }
}
