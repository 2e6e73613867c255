//! Traits shared by the arena and stack allocators

use core::alloc::Layout;

use crate::block::Block;
use crate::error::{AllocError, AllocResult};
use crate::stats::AllocatorStats;

/// Common surface of the linear allocators.
///
/// Lets generic code (benchmarks, frame-scoped helpers) target either the
/// arena or the stack. Both allocators hand out [`Block`] handles and keep the
/// same `offset` / `previous_offset` bookkeeping.
pub trait LinearAllocator {
    /// Allocates `size` bytes aligned to `alignment`.
    ///
    /// # Panics
    /// If `size` is zero, `alignment` is not a power of two, or the allocator
    /// has been destroyed.
    fn alloc_aligned(&mut self, size: usize, alignment: usize) -> AllocResult<Block>;

    /// Allocates `size` bytes with the allocator's default alignment.
    fn alloc(&mut self, size: usize) -> AllocResult<Block>;

    /// Shared view of a live block
    fn bytes(&self, block: Block) -> AllocResult<&[u8]>;

    /// Mutable view of a live block
    fn bytes_mut(&mut self, block: Block) -> AllocResult<&mut [u8]>;

    /// Capacity of the managed buffer (zero once destroyed)
    fn capacity(&self) -> usize;

    /// Offset to the start of the free space
    fn offset(&self) -> usize;

    /// Offset to the most recent block
    fn previous_offset(&self) -> usize;

    /// Whether the allocator releases its buffer on destroy
    fn owns_buffer(&self) -> bool;

    /// Releases an owned buffer and returns to the uninitialized state
    fn destroy(&mut self);

    /// Allocates a block matching `layout`.
    #[inline]
    fn alloc_layout(&mut self, layout: Layout) -> AllocResult<Block> {
        self.alloc_aligned(layout.size(), layout.align())
    }

    /// Allocates room for `count` values of `T`, aligned for `T`.
    #[inline]
    fn alloc_array<T>(&mut self, count: usize) -> AllocResult<Block> {
        match Layout::array::<T>(count) {
            Ok(layout) => self.alloc_layout(layout),
            Err(_) => {
                let requested = core::mem::size_of::<T>().saturating_mul(count);
                Err(AllocError::out_of_memory(
                    requested,
                    requested,
                    self.capacity() - self.offset(),
                ))
            },
        }
    }

    /// Copies `data` into a fresh block aligned to `alignment`.
    fn alloc_copy(&mut self, data: &[u8], alignment: usize) -> AllocResult<Block> {
        let block = self.alloc_aligned(data.len(), alignment)?;
        self.bytes_mut(block)?.copy_from_slice(data);
        Ok(block)
    }
}

/// Memory usage reporting
pub trait MemoryUsage {
    /// Bytes between the buffer start and the free boundary, padding included
    fn used_memory(&self) -> usize;

    /// Bytes left after the free boundary
    fn available_memory(&self) -> usize;

    /// Total managed bytes
    fn total_memory(&self) -> usize {
        self.used_memory() + self.available_memory()
    }

    /// Fraction of the buffer in use, 0.0 for an empty allocator
    fn usage_ratio(&self) -> f64 {
        let total = self.total_memory();
        if total == 0 {
            0.0
        } else {
            self.used_memory() as f64 / total as f64
        }
    }
}

/// Bulk reset support
pub trait Resettable {
    /// Frees every block at once. Outstanding handles become invalid.
    fn reset(&mut self);
}

/// Statistics access
pub trait StatisticsProvider {
    /// Snapshot of the current counters
    fn statistics(&self) -> AllocatorStats;

    /// Clears the counters
    fn reset_statistics(&mut self);

    /// Whether counters beyond `peak_offset` are collected
    fn statistics_enabled(&self) -> bool;
}
