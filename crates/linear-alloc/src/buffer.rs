//! Backing storage for the linear allocators
//!
//! An allocator either borrows a caller's byte slice or owns a buffer it
//! reserved itself. The distinction is a type-level tag, so releasing the
//! memory on destroy is decided by the variant and cannot be skipped.

use core::ops::Range;

use tracing::debug;

use crate::block::Block;
use crate::error::{AllocError, AllocResult};

/// Byte buffer managed by an allocator
#[derive(Debug)]
pub enum Buffer<'buf> {
    /// Buffer reserved by the allocator, released on destroy
    Owned(Box<[u8]>),
    /// Caller buffer, left untouched on destroy
    Borrowed(&'buf mut [u8]),
}

impl Buffer<'static> {
    /// Reserves an owned, zero-initialized buffer of `capacity` bytes.
    ///
    /// A failed reservation is reported instead of aborting the process.
    pub fn reserve(capacity: usize) -> AllocResult<Self> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(capacity)
            .map_err(|_| AllocError::system_allocation(capacity))?;
        bytes.resize(capacity, 0);
        Ok(Self::Owned(bytes.into_boxed_slice()))
    }
}

impl<'buf> Buffer<'buf> {
    /// Length of the buffer in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether the buffer has no bytes at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the allocator is responsible for releasing this buffer
    #[inline]
    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    /// Shared view of the bytes
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Owned(bytes) => bytes,
            Self::Borrowed(bytes) => bytes,
        }
    }

    /// Mutable view of the bytes
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            Self::Owned(bytes) => bytes,
            Self::Borrowed(bytes) => bytes,
        }
    }

    /// Address of the first byte
    #[inline]
    pub fn start_addr(&self) -> usize {
        self.as_slice().as_ptr() as usize
    }
}

impl<'buf> From<&'buf mut [u8]> for Buffer<'buf> {
    fn from(bytes: &'buf mut [u8]) -> Self {
        Self::Borrowed(bytes)
    }
}

impl From<Box<[u8]>> for Buffer<'static> {
    fn from(bytes: Box<[u8]>) -> Self {
        Self::Owned(bytes)
    }
}

/// Buffer plus the two offsets every linear allocator tracks.
///
/// `buffer` is `None` once the allocator has been destroyed. Touching a
/// destroyed region is a precondition violation and panics.
#[derive(Debug)]
pub(crate) struct Region<'buf> {
    buffer: Option<Buffer<'buf>>,
    /// Offset to the start of the free space
    pub(crate) offset: usize,
    /// Offset to the most recent block (the payload, for the stack)
    pub(crate) previous_offset: usize,
}

impl<'buf> Region<'buf> {
    pub(crate) fn new(buffer: Buffer<'buf>) -> Self {
        assert!(
            !buffer.is_empty(),
            "linear allocator initialized with a zero capacity buffer"
        );
        Self {
            buffer: Some(buffer),
            offset: 0,
            previous_offset: 0,
        }
    }

    #[inline]
    pub(crate) fn is_active(&self) -> bool {
        self.buffer.is_some()
    }

    #[inline]
    pub(crate) fn owns_buffer(&self) -> bool {
        self.buffer.as_ref().is_some_and(Buffer::is_owned)
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.buffer.as_ref().map_or(0, Buffer::len)
    }

    #[inline]
    pub(crate) fn remaining(&self) -> usize {
        self.capacity() - self.offset
    }

    #[inline]
    pub(crate) fn buffer(&self) -> &Buffer<'buf> {
        match &self.buffer {
            Some(buffer) => buffer,
            None => panic!("linear allocator used after destroy"),
        }
    }

    #[inline]
    pub(crate) fn buffer_mut(&mut self) -> &mut Buffer<'buf> {
        match &mut self.buffer {
            Some(buffer) => buffer,
            None => panic!("linear allocator used after destroy"),
        }
    }

    /// Panics when the allocator has been destroyed.
    #[inline]
    pub(crate) fn ensure_active(&self) {
        assert!(self.is_active(), "linear allocator used after destroy");
    }

    #[inline]
    pub(crate) fn start_addr(&self) -> usize {
        self.buffer().start_addr()
    }

    /// Checks that `block` starts inside the buffer and returns its offset.
    pub(crate) fn check_in_buffer(&self, block: Block) -> AllocResult<usize> {
        if block.offset() >= self.buffer().len() {
            return Err(AllocError::invalid_pointer(
                block.offset(),
                "outside of the managed buffer",
            ));
        }
        Ok(block.offset())
    }

    /// Checks that `block` lies entirely in the allocated region.
    pub(crate) fn check_live(&self, block: Block) -> AllocResult<Range<usize>> {
        self.check_in_buffer(block)?;
        if block.end() > self.offset {
            return Err(AllocError::invalid_pointer(
                block.offset(),
                "block extends into free memory",
            ));
        }
        Ok(block.offset()..block.end())
    }

    pub(crate) fn bytes(&self, block: Block) -> AllocResult<&[u8]> {
        let range = self.check_live(block)?;
        Ok(&self.buffer().as_slice()[range])
    }

    pub(crate) fn bytes_mut(&mut self, block: Block) -> AllocResult<&mut [u8]> {
        let range = self.check_live(block)?;
        Ok(&mut self.buffer_mut().as_mut_slice()[range])
    }

    /// Fills `range` with `pattern` when one is configured.
    pub(crate) fn fill(&mut self, range: Range<usize>, pattern: Option<u8>) {
        if let Some(pattern) = pattern {
            if let Some(bytes) = self.buffer_mut().as_mut_slice().get_mut(range) {
                bytes.fill(pattern);
            }
        }
    }

    /// Rewinds both offsets to the start of the buffer.
    pub(crate) fn rewind(&mut self, dealloc_pattern: Option<u8>) {
        self.ensure_active();
        let used = 0..self.offset;
        self.fill(used, dealloc_pattern);
        self.offset = 0;
        self.previous_offset = 0;
    }

    /// Releases the buffer if owned and returns to the uninitialized state.
    pub(crate) fn destroy(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            debug!(
                capacity = buffer.len(),
                owned = buffer.is_owned(),
                "destroying linear allocator"
            );
            // Dropping an owned buffer frees it; a borrowed one only ends the
            // borrow.
            drop(buffer);
        }
        self.offset = 0;
        self.previous_offset = 0;
    }
}
