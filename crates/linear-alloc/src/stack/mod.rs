//! Stack (LIFO) allocator
//!
//! Every block is preceded by a [`StackHeader`] recording how far the block
//! start is from its payload and where the previous payload lives. The
//! headers form a backward chain that lets the allocator pop the top block or
//! free down to any live block.
//!
//! # Memory Layout
//! ```text
//!   |pad|hdr|block 1|pad|hdr|block 2|        free space        |
//!   ^       ^               ^       ^                          ^
//! start     |         previous      offset                   capacity
//!           |          offset
//!           +------<------- hdr.previous_offset
//! ```
//!
//! Blocks must be released in reverse order of allocation. Freeing a block
//! also releases everything allocated after it.

mod config;
mod header;

pub use config::StackConfig;
pub use header::StackHeader;

use tracing::{debug, trace};

use crate::align::{is_power_of_two, padding_with_header};
use crate::block::Block;
use crate::buffer::{Buffer, Region};
use crate::error::{AllocError, AllocResult};
use crate::stats::{AllocatorStats, OptionalStats};
use crate::traits::{LinearAllocator, MemoryUsage, Resettable, StatisticsProvider};

/// LIFO allocator with in-band block headers
pub struct StackAllocator<'buf> {
    region: Region<'buf>,
    config: StackConfig,
    stats: OptionalStats,
}

impl StackAllocator<'static> {
    /// Creates a stack that owns a freshly reserved buffer of `capacity` bytes.
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn create(capacity: usize) -> AllocResult<Self> {
        Self::create_with_config(capacity, StackConfig::default())
    }

    /// Creates an owning stack with a custom configuration
    pub fn create_with_config(capacity: usize, config: StackConfig) -> AllocResult<Self> {
        assert!(capacity != 0, "stack created with zero capacity");
        let buffer = Buffer::reserve(capacity)?;
        Ok(Self::with_buffer(buffer, config))
    }

    /// Creates a production-optimized owning stack
    pub fn production(capacity: usize) -> AllocResult<Self> {
        Self::create_with_config(capacity, StackConfig::production())
    }

    /// Creates a debug-optimized owning stack
    pub fn debug(capacity: usize) -> AllocResult<Self> {
        Self::create_with_config(capacity, StackConfig::debug())
    }
}

impl<'buf> StackAllocator<'buf> {
    /// Wraps a caller buffer. The stack manages but never releases it.
    ///
    /// # Panics
    /// If `buffer` is empty.
    pub fn init(buffer: &'buf mut [u8]) -> Self {
        Self::init_with_config(buffer, StackConfig::default())
    }

    /// Wraps a caller buffer with a custom configuration
    pub fn init_with_config(buffer: &'buf mut [u8], config: StackConfig) -> Self {
        Self::with_buffer(Buffer::Borrowed(buffer), config)
    }

    /// Builds a stack over an already tagged buffer
    pub fn with_buffer(buffer: Buffer<'buf>, config: StackConfig) -> Self {
        let region = Region::new(buffer);
        debug!(
            capacity = region.capacity(),
            owned = region.owns_buffer(),
            "stack initialized"
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

    /// Payload offset of the top block (0 when empty)
    #[inline]
    pub fn previous_offset(&self) -> usize {
        self.region.previous_offset
    }

    /// Bytes left after the free boundary
    #[inline]
    pub fn remaining(&self) -> usize {
        self.region.remaining()
    }

    /// Whether nothing is allocated
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.region.offset == 0
    }

    /// Whether a buffer is bound (false after `destroy`)
    #[inline]
    pub fn is_active(&self) -> bool {
        self.region.is_active()
    }

    /// Whether the stack releases its buffer on destroy
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
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Allocates `size` bytes aligned to `alignment`, preceded by a header.
    ///
    /// On failure the offsets are left untouched.
    ///
    /// # Panics
    /// If `size` is zero, `alignment` is not a power of two, or the stack has
    /// been destroyed.
    pub fn alloc_aligned(&mut self, size: usize, alignment: usize) -> AllocResult<Block> {
        assert!(size != 0, "stack allocation of zero bytes");
        assert!(
            is_power_of_two(alignment),
            "stack alignment must be a power of two"
        );

        let offset = self.region.offset;
        let padding = padding_with_header(
            self.region.start_addr() + offset,
            alignment,
            StackHeader::SIZE,
            StackHeader::ALIGN,
        );
        let remaining = self.region.remaining();

        match padding.checked_add(size) {
            Some(required) if required <= remaining => {},
            _ => {
                self.stats.record_failure();
                return Err(AllocError::out_of_memory(
                    size,
                    padding.saturating_add(size),
                    remaining,
                ));
            },
        }

        let payload = offset + padding;
        let header = StackHeader {
            padding,
            previous_offset: self.region.previous_offset,
        };
        header.write_to(
            &mut self.region.buffer_mut().as_mut_slice()[payload - StackHeader::SIZE..payload],
        );

        let end = payload + size;
        self.region.fill(payload..end, self.config.alloc_pattern);
        self.region.previous_offset = payload;
        self.region.offset = end;
        self.stats.record_allocation(end);

        trace!(offset = payload, size, alignment, padding, "stack allocation");
        Ok(Block::new(payload, size))
    }

    /// Allocates `size` bytes with the configured default alignment.
    pub fn alloc(&mut self, size: usize) -> AllocResult<Block> {
        self.alloc_aligned(size, self.config.default_alignment)
    }

    /// Frees the top block. Returns `false` when the stack is empty.
    ///
    /// # Panics
    /// If the top block's header has been overwritten, or the stack has been
    /// destroyed.
    pub fn pop(&mut self) -> bool {
        self.region.ensure_active();
        if self.region.offset == 0 {
            return false;
        }

        let payload = self.region.previous_offset;
        let Some(header) = self.read_header(payload) else {
            panic!("stack header of the top block at offset {payload} is corrupted");
        };
        self.release(payload, header);
        true
    }

    /// Frees `block` and every block allocated after it.
    ///
    /// Fails with `InvalidPointer`, without touching the stack, when the block
    /// is outside the buffer, already free, or not preceded by a valid header.
    pub fn free_at(&mut self, block: Block) -> AllocResult<()> {
        let payload = self.region.check_in_buffer(block)?;
        if payload >= self.region.offset {
            return Err(AllocError::invalid_pointer(payload, "block is already free"));
        }

        let Some(header) = self.read_header(payload) else {
            return Err(AllocError::invalid_pointer(
                payload,
                "no valid stack header precedes the block",
            ));
        };

        if self.config.verify_chain && !self.chain().any(|(live, _)| live.offset() == payload) {
            return Err(AllocError::invalid_pointer(
                payload,
                "not the start of a live block",
            ));
        }

        self.release(payload, header);
        Ok(())
    }

    /// Header of a live block
    pub fn header(&self, block: Block) -> AllocResult<StackHeader> {
        let payload = self.region.check_in_buffer(block)?;
        if payload >= self.region.offset {
            return Err(AllocError::invalid_pointer(payload, "block is already free"));
        }
        self.read_header(payload).ok_or_else(|| {
            AllocError::invalid_pointer(payload, "no valid stack header precedes the block")
        })
    }

    /// Walks the live blocks from the top down to the bottom.
    ///
    /// Each item is the block (payload and size) with its header. The walk
    /// stops early at a header that fails validation.
    pub fn chain(&self) -> Chain<'_> {
        let bytes = self.region.buffer().as_slice();
        let next = if self.region.offset == 0 {
            None
        } else {
            Some(self.region.previous_offset)
        };
        Chain {
            bytes,
            next,
            end: self.region.offset,
        }
    }

    /// Number of live blocks
    pub fn depth(&self) -> usize {
        self.chain().count()
    }

    /// The most recent block, if any
    pub fn top(&self) -> Option<Block> {
        self.region.ensure_active();
        if self.region.offset == 0 {
            return None;
        }
        let payload = self.region.previous_offset;
        Some(Block::new(payload, self.region.offset - payload))
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
    pub fn free_all(&mut self) {
        self.region.rewind(self.config.dealloc_pattern);
        self.stats.record_reset();
        debug!(capacity = self.region.capacity(), "stack cleared");
    }

    /// Alias of [`free_all`](Self::free_all)
    #[inline]
    pub fn clear(&mut self) {
        self.free_all();
    }

    /// Releases an owned buffer and zeroes capacity and offsets.
    ///
    /// A borrowed buffer is detached without being touched. Calling this on
    /// an already destroyed stack does nothing.
    pub fn destroy(&mut self) {
        self.region.destroy();
    }

    fn read_header(&self, payload: usize) -> Option<StackHeader> {
        StackHeader::read_before(self.region.buffer().as_slice(), payload)
            .filter(|header| header.is_consistent(payload))
    }

    fn release(&mut self, payload: usize, header: StackHeader) {
        let start = header.block_start(payload);
        let end = self.region.offset;
        self.region.fill(start..end, self.config.dealloc_pattern);
        self.region.offset = start;
        self.region.previous_offset = header.previous_offset;
        self.stats.record_deallocation();

        trace!(offset = payload, released = end - start, "stack release");
    }
}

/// Iterator over the live blocks of a [`StackAllocator`], top first
#[derive(Debug, Clone)]
pub struct Chain<'a> {
    bytes: &'a [u8],
    next: Option<usize>,
    end: usize,
}

impl Iterator for Chain<'_> {
    type Item = (Block, StackHeader);

    fn next(&mut self) -> Option<Self::Item> {
        let payload = self.next.take()?;
        let header = StackHeader::read_before(self.bytes, payload)
            .filter(|header| header.is_consistent(payload) && payload < self.end)?;

        let block = Block::new(payload, self.end - payload);
        self.end = header.block_start(payload);
        if header.previous_offset != 0 {
            self.next = Some(header.previous_offset);
        }
        Some((block, header))
    }
}

impl core::iter::FusedIterator for Chain<'_> {}

impl core::fmt::Debug for StackAllocator<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StackAllocator")
            .field("capacity", &self.capacity())
            .field("offset", &self.offset())
            .field("previous_offset", &self.previous_offset())
            .field("owns_buffer", &self.owns_buffer())
            .finish()
    }
}

impl LinearAllocator for StackAllocator<'_> {
    fn alloc_aligned(&mut self, size: usize, alignment: usize) -> AllocResult<Block> {
        StackAllocator::alloc_aligned(self, size, alignment)
    }

    fn alloc(&mut self, size: usize) -> AllocResult<Block> {
        StackAllocator::alloc(self, size)
    }

    fn bytes(&self, block: Block) -> AllocResult<&[u8]> {
        StackAllocator::bytes(self, block)
    }

    fn bytes_mut(&mut self, block: Block) -> AllocResult<&mut [u8]> {
        StackAllocator::bytes_mut(self, block)
    }

    fn capacity(&self) -> usize {
        StackAllocator::capacity(self)
    }

    fn offset(&self) -> usize {
        StackAllocator::offset(self)
    }

    fn previous_offset(&self) -> usize {
        StackAllocator::previous_offset(self)
    }

    fn owns_buffer(&self) -> bool {
        StackAllocator::owns_buffer(self)
    }

    fn destroy(&mut self) {
        StackAllocator::destroy(self);
    }
}

impl MemoryUsage for StackAllocator<'_> {
    fn used_memory(&self) -> usize {
        self.offset()
    }

    fn available_memory(&self) -> usize {
        self.remaining()
    }
}

impl Resettable for StackAllocator<'_> {
    fn reset(&mut self) {
        self.free_all();
    }
}

impl StatisticsProvider for StackAllocator<'_> {
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
