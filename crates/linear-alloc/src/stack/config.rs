//! Stack allocator configuration

use crate::align::DEFAULT_ALIGNMENT;

/// Configuration for the stack allocator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    /// Alignment used by `alloc` when none is given
    pub default_alignment: usize,

    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill patterns for debugging
    pub alloc_pattern: Option<u8>,
    pub dealloc_pattern: Option<u8>,

    /// Walk the header chain on `free_at` to confirm the block is live.
    /// Turns the check from O(1) into O(live blocks).
    pub verify_chain: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            default_alignment: DEFAULT_ALIGNMENT,
            track_stats: cfg!(debug_assertions),
            alloc_pattern: None,
            dealloc_pattern: None,
            verify_chain: cfg!(debug_assertions),
        }
    }
}

impl StackConfig {
    /// Production configuration - optimized for performance
    pub fn production() -> Self {
        Self {
            default_alignment: DEFAULT_ALIGNMENT,
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
            verify_chain: false,
        }
    }

    /// Debug configuration - optimized for debugging
    pub fn debug() -> Self {
        Self {
            default_alignment: DEFAULT_ALIGNMENT,
            track_stats: true,
            alloc_pattern: Some(0xCC),
            dealloc_pattern: Some(0xDD),
            verify_chain: true,
        }
    }

    /// Performance configuration - minimal overhead
    pub fn performance() -> Self {
        Self {
            default_alignment: core::mem::align_of::<usize>(),
            ..Self::production()
        }
    }
}
