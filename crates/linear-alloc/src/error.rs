//! Error types for the linear allocators
//!
//! Only recoverable conditions live here. Precondition violations (zero-size
//! requests, non-power-of-two alignments, using a destroyed allocator) are
//! programming defects and panic instead.

use thiserror::Error;
use tracing::warn;

// ============================================================================
// Main Error Type
// ============================================================================

/// Recoverable allocator errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    // --- Capacity Errors ---
    #[error(
        "out of memory: requested {requested} bytes ({required} with padding), {remaining} bytes remaining"
    )]
    OutOfMemory {
        requested: usize,
        required: usize,
        remaining: usize,
    },

    #[error("system allocation of a {capacity} byte buffer failed")]
    SystemAllocation { capacity: usize },

    // --- Pointer Domain Errors ---
    #[error("invalid block at offset {offset}: {reason}")]
    InvalidPointer { offset: usize, reason: &'static str },

    #[error("invalid checkpoint: offsets {offset}/{previous_offset} exceed capacity {capacity}")]
    InvalidCheckpoint {
        offset: usize,
        previous_offset: usize,
        capacity: usize,
    },
}

impl AllocError {
    /// Stable error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::OutOfMemory { .. } => "ALLOC:OOM",
            Self::SystemAllocation { .. } => "ALLOC:SYSTEM",
            Self::InvalidPointer { .. } => "ALLOC:POINTER",
            Self::InvalidCheckpoint { .. } => "ALLOC:CHECKPOINT",
        }
    }

    /// Whether the caller can recover by freeing memory or using a bigger buffer
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. } | Self::SystemAllocation { .. })
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create an out of memory error, logging the failed request
    pub fn out_of_memory(requested: usize, required: usize, remaining: usize) -> Self {
        warn!(
            requested,
            required, remaining, "unable to allocate {requested} bytes, only {remaining} left"
        );

        Self::OutOfMemory {
            requested,
            required,
            remaining,
        }
    }

    /// Create a system allocation error
    pub fn system_allocation(capacity: usize) -> Self {
        warn!(capacity, "failed to reserve owned buffer");

        Self::SystemAllocation { capacity }
    }

    /// Create an invalid pointer error
    pub fn invalid_pointer(offset: usize, reason: &'static str) -> Self {
        warn!(offset, reason, "rejected block handle");

        Self::InvalidPointer { offset, reason }
    }

    /// Create an invalid checkpoint error
    pub fn invalid_checkpoint(offset: usize, previous_offset: usize, capacity: usize) -> Self {
        warn!(offset, previous_offset, capacity, "rejected checkpoint");

        Self::InvalidCheckpoint {
            offset,
            previous_offset,
            capacity,
        }
    }

    /// Check if this is an out of memory error
    #[must_use]
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }

    /// Check if this is an invalid pointer error
    #[must_use]
    pub fn is_invalid_pointer(&self) -> bool {
        matches!(self, Self::InvalidPointer { .. })
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for allocator operations
pub type AllocResult<T> = core::result::Result<T, AllocError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_memory_message() {
        let error = AllocError::out_of_memory(512, 520, 100);
        let message = error.to_string();
        assert!(message.contains("512"));
        assert!(message.contains("520"));
        assert!(message.contains("100"));
    }

    #[test]
    fn test_invalid_pointer_message() {
        let error = AllocError::invalid_pointer(4096, "outside of the buffer");
        assert!(error.to_string().contains("4096"));
        assert!(error.to_string().contains("outside of the buffer"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AllocError::out_of_memory(1, 1, 0).code(), "ALLOC:OOM");
        assert_eq!(AllocError::system_allocation(8).code(), "ALLOC:SYSTEM");
        assert_eq!(AllocError::invalid_pointer(0, "freed").code(), "ALLOC:POINTER");
        assert_eq!(
            AllocError::invalid_checkpoint(9, 0, 8).code(),
            "ALLOC:CHECKPOINT"
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(AllocError::out_of_memory(1, 1, 0).is_recoverable());
        assert!(!AllocError::invalid_pointer(0, "freed").is_recoverable());
        assert!(!AllocError::invalid_checkpoint(9, 0, 8).is_recoverable());
    }

    #[test]
    fn test_predicates() {
        assert!(AllocError::out_of_memory(1, 1, 0).is_out_of_memory());
        assert!(AllocError::invalid_pointer(3, "freed").is_invalid_pointer());
        assert!(!AllocError::invalid_pointer(3, "freed").is_out_of_memory());
    }
}
