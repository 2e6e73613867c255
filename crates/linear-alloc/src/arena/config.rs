//! Arena allocator configuration

use crate::align::DEFAULT_ALIGNMENT;

/// Configuration for the arena allocator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Alignment used by `alloc` when none is given
    pub default_alignment: usize,

    /// Enable statistics tracking
    pub track_stats: bool,

    /// Fill patterns for debugging
    pub alloc_pattern: Option<u8>,
    pub dealloc_pattern: Option<u8>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            default_alignment: DEFAULT_ALIGNMENT,
            track_stats: cfg!(debug_assertions),
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }
}

impl ArenaConfig {
    /// Production configuration - no bookkeeping beyond the offsets
    pub fn production() -> Self {
        Self {
            default_alignment: DEFAULT_ALIGNMENT,
            track_stats: false,
            alloc_pattern: None,
            dealloc_pattern: None,
        }
    }

    /// Debug configuration - stats plus fill patterns to expose stale reads
    pub fn debug() -> Self {
        Self {
            default_alignment: DEFAULT_ALIGNMENT,
            track_stats: true,
            alloc_pattern: Some(0xAA),
            dealloc_pattern: Some(0xDD),
        }
    }

    /// Performance configuration - word alignment packs small blocks tighter
    pub fn performance() -> Self {
        Self {
            default_alignment: core::mem::align_of::<usize>(),
            ..Self::production()
        }
    }
}
