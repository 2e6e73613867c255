//! Arena (bump) allocator
//!
//! Serves memory by advancing a single offset through a contiguous buffer and
//! frees everything at once by rewinding it. Only the most recent block is
//! tracked, which is enough to resize it in place.
//!
//! # Memory Layout
//! ```text
//!   |block|padding|block|        free space        |
//!   ^             ^     ^                          ^
//! start       previous  offset                   capacity
//!              offset
//! ```
//!
//! Scratch scopes ([`Scratch`]) and checkpoints ([`ArenaCheckpoint`]) save the
//! two offsets and write them back later. Nothing is copied, so bytes written
//! inside a scope survive the rewind; they only become free to overwrite.

mod config;
mod scratch;

pub use config::ArenaConfig;
pub use scratch::{ArenaCheckpoint, Scratch};

use tracing::{debug, trace};

use crate::align::{align_forward, is_power_of_two};
use crate::block::Block;
use crate::buffer::{Buffer, Region};
use crate::error::{AllocError, AllocResult};
use crate::stats::{AllocatorStats, OptionalStats};
use crate::traits::{LinearAllocator, MemoryUsage, Resettable, StatisticsProvider};

/// Bump allocator over a borrowed or owned byte buffer
pub struct ArenaAllocator<'buf> {
    region: Region<'buf>,
    config: ArenaConfig,
    stats: OptionalStats,
}

impl ArenaAllocator<'static> {
    /// Creates an arena that owns a freshly reserved buffer of `capacity` bytes.
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn create(capacity: usize) -> AllocResult<Self> {
        Self::create_with_config(capacity, ArenaConfig::default())
    }

    /// Creates an owning arena with a custom configuration
    pub fn create_with_config(capacity: usize, config: ArenaConfig) -> AllocResult<Self> {
        assert!(capacity != 0, "arena created with zero capacity");
        let buffer = Buffer::reserve(capacity)?;
        Ok(Self::with_buffer(buffer, config))
    }
}

impl<'buf> ArenaAllocator<'buf> {
    /// Wraps a caller buffer. The arena manages but never releases it.
    ///
    /// # Panics
    /// If `buffer` is empty.
    pub fn init(buffer: &'buf mut [u8]) -> Self {
        Self::init_with_config(buffer, ArenaConfig::default())
    }

    /// Wraps a caller buffer with a custom configuration
    pub fn init_with_config(buffer: &'buf mut [u8], config: ArenaConfig) -> Self {
        Self::with_buffer(Buffer::Borrowed(buffer), config)
    }

    /// Builds an arena over an already tagged buffer
    pub fn with_buffer(buffer: Buffer<'buf>, config: ArenaConfig) -> Self {
        let region = Region::new(buffer);
        debug!(
            capacity = region.capacity(),
            owned = region.owns_buffer(),
            "arena initialized"
        );
        let stats = OptionalStats::new(config.track_stats);
        Self {
            region,
            config,
            stats,
        }
    }

    /// Total capacity, zero once destroyed
    #[inline]
    pub fn capacity(&self) -> usize {
        self.region.capacity()
    }

    /// Offset to the free space
    #[inline]
    pub fn offset(&self) -> usize {
        self.region.offset
    }

    /// Offset to the most recently allocated block
    #[inline]
    pub fn previous_offset(&self) -> usize {
        self.region.previous_offset
    }

    /// Bytes left after the free boundary
    #[inline]
    pub fn remaining(&self) -> usize {
        self.region.remaining()
    }

    /// Whether a buffer is bound (false after `destroy`)
    #[inline]
    pub fn is_active(&self) -> bool {
        self.region.is_active()
    }

    /// Whether the arena releases its buffer on destroy
    #[inline]
    pub fn owns_buffer(&self) -> bool {
        self.region.owns_buffer()
    }

    /// Address of the first byte of the buffer
    #[inline]
    pub fn start_addr(&self) -> usize {
        self.region.start_addr()
    }

    /// Active configuration
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Allocates `size` bytes whose address is a multiple of `alignment`.
    ///
    /// On failure the offsets are left untouched.
    ///
    /// # Panics
    /// If `size` is zero, `alignment` is not a power of two, or the arena has
    /// been destroyed.
    pub fn alloc_aligned(&mut self, size: usize, alignment: usize) -> AllocResult<Block> {
        assert!(size != 0, "arena allocation of zero bytes");
        assert!(
            is_power_of_two(alignment),
            "arena alignment must be a power of two"
        );

        let start = self.region.start_addr();
        let offset = self.region.offset;
        let aligned_offset = align_forward(start + offset, alignment) - start;

        let end = match aligned_offset.checked_add(size) {
            Some(end) if end <= self.region.capacity() => end,
            _ => {
                self.stats.record_failure();
                return Err(AllocError::out_of_memory(
                    size,
                    (aligned_offset - offset).saturating_add(size),
                    self.region.remaining(),
                ));
            },
        };

        self.region.previous_offset = aligned_offset;
        self.region.offset = end;
        self.region
            .fill(aligned_offset..end, self.config.alloc_pattern);
        self.stats.record_allocation(end);

        trace!(offset = aligned_offset, size, alignment, "arena allocation");
        Ok(Block::new(aligned_offset, size))
    }

    /// Allocates `size` bytes with the configured default alignment.
    pub fn alloc(&mut self, size: usize) -> AllocResult<Block> {
        self.alloc_aligned(size, self.config.default_alignment)
    }

    /// Resizes `block` to `new_size` bytes.
    ///
    /// The most recent block is resized in place by moving the free boundary,
    /// growing or shrinking, without copying. Any other block is reallocated
    /// with `alignment` and its first `min(old, new)` bytes are copied; the
    /// old bytes stay behind, orphaned until the next reset.
    ///
    /// # Errors
    /// `InvalidPointer` if a block other than the most recent one is not
    /// fully inside the live region, for example after a reset or a scratch
    /// rewind. `OutOfMemory` if the new size does not fit.
    ///
    /// # Panics
    /// If `new_size` is zero, `alignment` is not a power of two, or the arena
    /// has been destroyed.
    pub fn resize(&mut self, block: Block, new_size: usize, alignment: usize) -> AllocResult<Block> {
        assert!(new_size != 0, "arena resize to zero bytes");
        assert!(
            is_power_of_two(alignment),
            "arena alignment must be a power of two"
        );

        let old_offset = self.region.check_in_buffer(block)?;
        let is_top = old_offset == self.region.previous_offset;
        if !is_top {
            self.region.check_live(block)?;
        }
        if new_size == block.len() {
            return Ok(block);
        }

        if is_top {
            let capacity = self.region.capacity();
            let new_end = match old_offset.checked_add(new_size) {
                Some(end) if end <= capacity => end,
                _ => {
                    self.stats.record_failure();
                    return Err(AllocError::out_of_memory(
                        new_size,
                        new_size,
                        capacity - old_offset,
                    ));
                },
            };

            let old_end = self.region.offset;
            if new_end < old_end {
                self.region.fill(new_end..old_end, self.config.dealloc_pattern);
            } else {
                self.region.fill(old_end..new_end, self.config.alloc_pattern);
            }
            self.region.offset = new_end;
            self.stats.record_in_place_resize(new_end);

            trace!(offset = old_offset, new_size, "arena resize in place");
            return Ok(Block::new(old_offset, new_size));
        }

        let fresh = self.alloc_aligned(new_size, alignment)?;
        let copied = block.len().min(new_size);
        self.region.buffer_mut().as_mut_slice().copy_within(
            old_offset..old_offset + copied,
            fresh.offset(),
        );
        self.stats.record_relocating_resize();

        trace!(
            from = old_offset,
            to = fresh.offset(),
            copied,
            "arena resize by relocation"
        );
        Ok(fresh)
    }

    /// Shared view of a live block
    pub fn bytes(&self, block: Block) -> AllocResult<&[u8]> {
        self.region.bytes(block)
    }

    /// Mutable view of a live block
    pub fn bytes_mut(&mut self, block: Block) -> AllocResult<&mut [u8]> {
        self.region.bytes_mut(block)
    }

    /// Frees every block by rewinding both offsets to zero.
    ///
    /// The buffer contents are left as they are unless a dealloc pattern is
    /// configured.
    pub fn free_all(&mut self) {
        self.region.rewind(self.config.dealloc_pattern);
        self.stats.record_reset();
        debug!(capacity = self.region.capacity(), "arena cleared");
    }

    /// Alias of [`free_all`](Self::free_all)
    #[inline]
    pub fn clear(&mut self) {
        self.free_all();
    }

    /// Releases an owned buffer and zeroes capacity and offsets.
    ///
    /// A borrowed buffer is detached without being touched. Calling this on
    /// an already destroyed arena does nothing.
    pub fn destroy(&mut self) {
        self.region.destroy();
    }

    /// Snapshot of the current offsets
    #[must_use = "a checkpoint is only useful if restored later"]
    pub fn checkpoint(&self) -> ArenaCheckpoint {
        self.region.ensure_active();
        ArenaCheckpoint {
            offset: self.region.offset,
            previous_offset: self.region.previous_offset,
        }
    }

    /// Writes a checkpoint's offsets back into the arena.
    ///
    /// Checkpoints are not ordered: restoring one taken after the current
    /// state moves the free boundary forward again. Only a checkpoint that
    /// does not fit this arena is rejected.
    pub fn restore(&mut self, checkpoint: ArenaCheckpoint) -> AllocResult<()> {
        self.region.ensure_active();
        let capacity = self.region.capacity();
        if checkpoint.offset > capacity || checkpoint.previous_offset > checkpoint.offset {
            return Err(AllocError::invalid_checkpoint(
                checkpoint.offset,
                checkpoint.previous_offset,
                capacity,
            ));
        }

        let current = self.region.offset;
        if checkpoint.offset < current {
            self.region
                .fill(checkpoint.offset..current, self.config.dealloc_pattern);
            self.stats.record_deallocation();
        }
        self.region.offset = checkpoint.offset;
        self.region.previous_offset = checkpoint.previous_offset;

        debug!(
            from = current,
            to = checkpoint.offset,
            "arena restored to checkpoint"
        );
        Ok(())
    }

    /// Opens a scratch scope that rewinds the arena when ended or dropped.
    pub fn scratch(&mut self) -> Scratch<'_, 'buf> {
        Scratch::start(self)
    }
}

impl core::fmt::Debug for ArenaAllocator<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ArenaAllocator")
            .field("capacity", &self.capacity())
            .field("offset", &self.offset())
            .field("previous_offset", &self.previous_offset())
            .field("owns_buffer", &self.owns_buffer())
            .finish()
    }
}

impl LinearAllocator for ArenaAllocator<'_> {
    fn alloc_aligned(&mut self, size: usize, alignment: usize) -> AllocResult<Block> {
        ArenaAllocator::alloc_aligned(self, size, alignment)
    }

    fn alloc(&mut self, size: usize) -> AllocResult<Block> {
        ArenaAllocator::alloc(self, size)
    }

    fn bytes(&self, block: Block) -> AllocResult<&[u8]> {
        ArenaAllocator::bytes(self, block)
    }

    fn bytes_mut(&mut self, block: Block) -> AllocResult<&mut [u8]> {
        ArenaAllocator::bytes_mut(self, block)
    }

    fn capacity(&self) -> usize {
        ArenaAllocator::capacity(self)
    }

    fn offset(&self) -> usize {
        ArenaAllocator::offset(self)
    }

    fn previous_offset(&self) -> usize {
        ArenaAllocator::previous_offset(self)
    }

    fn owns_buffer(&self) -> bool {
        ArenaAllocator::owns_buffer(self)
    }

    fn destroy(&mut self) {
        ArenaAllocator::destroy(self);
    }
}

impl MemoryUsage for ArenaAllocator<'_> {
    fn used_memory(&self) -> usize {
        self.offset()
    }

    fn available_memory(&self) -> usize {
        self.remaining()
    }
}

impl Resettable for ArenaAllocator<'_> {
    fn reset(&mut self) {
        self.free_all();
    }
}

impl StatisticsProvider for ArenaAllocator<'_> {
    fn statistics(&self) -> AllocatorStats {
        self.stats.snapshot()
    }

    fn reset_statistics(&mut self) {
        self.stats.reset();
    }

    fn statistics_enabled(&self) -> bool {
        self.stats.is_enabled()
    }
}
