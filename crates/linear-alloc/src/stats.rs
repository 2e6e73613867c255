//! Allocator statistics tracking
//!
//! Counters are plain integers: the allocators are single-threaded and every
//! mutating call already holds `&mut self`.

/// Statistics for a linear allocator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStats {
    /// Successful allocations (including relocating resizes)
    pub allocation_count: usize,
    /// Pops and frees for the stack, checkpoint restores for the arena
    pub deallocation_count: usize,
    /// Allocations rejected for lack of capacity
    pub failed_allocations: usize,
    /// Resizes served by moving the free boundary only
    pub in_place_resizes: usize,
    /// Resizes that needed a fresh block and a copy
    pub relocating_resizes: usize,
    /// Bulk resets (`free_all`)
    pub reset_count: usize,
    /// Highest free-boundary offset observed
    pub peak_offset: usize,
}

impl AllocatorStats {
    /// Creates a new empty stats object
    pub const fn new() -> Self {
        Self {
            allocation_count: 0,
            deallocation_count: 0,
            failed_allocations: 0,
            in_place_resizes: 0,
            relocating_resizes: 0,
            reset_count: 0,
            peak_offset: 0,
        }
    }

    /// Fraction of allocation attempts that succeeded (1.0 when none were made)
    pub fn allocation_efficiency(&self) -> f64 {
        let attempts = self.allocation_count + self.failed_allocations;
        if attempts > 0 {
            self.allocation_count as f64 / attempts as f64
        } else {
            1.0
        }
    }
}

impl core::fmt::Display for AllocatorStats {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "Allocator Statistics:")?;
        writeln!(f, "  Allocations: {}", self.allocation_count)?;
        writeln!(f, "  Deallocations: {}", self.deallocation_count)?;
        writeln!(f, "  Failed allocations: {}", self.failed_allocations)?;
        writeln!(
            f,
            "  Resizes: {} in place, {} relocated",
            self.in_place_resizes, self.relocating_resizes
        )?;
        writeln!(f, "  Resets: {}", self.reset_count)?;
        writeln!(f, "  Peak offset: {} bytes", self.peak_offset)?;
        writeln!(
            f,
            "  Allocation efficiency: {:.2}%",
            self.allocation_efficiency() * 100.0
        )
    }
}

/// Stats that are only collected when enabled in the allocator config.
///
/// `peak_offset` is tracked regardless, it costs a single comparison.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct OptionalStats {
    enabled: bool,
    stats: AllocatorStats,
}

impl OptionalStats {
    pub(crate) const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stats: AllocatorStats::new(),
        }
    }

    #[inline]
    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub(crate) fn record_allocation(&mut self, offset: usize) {
        self.observe_offset(offset);
        if self.enabled {
            self.stats.allocation_count += 1;
        }
    }

    #[inline]
    pub(crate) fn record_failure(&mut self) {
        if self.enabled {
            self.stats.failed_allocations += 1;
        }
    }

    #[inline]
    pub(crate) fn record_deallocation(&mut self) {
        if self.enabled {
            self.stats.deallocation_count += 1;
        }
    }

    #[inline]
    pub(crate) fn record_in_place_resize(&mut self, offset: usize) {
        self.observe_offset(offset);
        if self.enabled {
            self.stats.in_place_resizes += 1;
        }
    }

    #[inline]
    pub(crate) fn record_relocating_resize(&mut self) {
        if self.enabled {
            self.stats.relocating_resizes += 1;
        }
    }

    #[inline]
    pub(crate) fn record_reset(&mut self) {
        if self.enabled {
            self.stats.reset_count += 1;
        }
    }

    #[inline]
    fn observe_offset(&mut self, offset: usize) {
        self.stats.peak_offset = self.stats.peak_offset.max(offset);
    }

    pub(crate) fn snapshot(&self) -> AllocatorStats {
        self.stats
    }

    pub(crate) fn reset(&mut self) {
        self.stats = AllocatorStats::new();
    }
}
