//! Handles to allocated blocks

/// A block of memory handed out by a linear allocator.
///
/// A block is a plain `(offset, len)` pair relative to the start of the
/// allocator's buffer. It carries no lifetime: allocators re-validate a block
/// against their live region every time it is used, so a handle kept past a
/// `clear` or `pop` is rejected instead of aliasing reclaimed memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    offset: usize,
    len: usize,
}

impl Block {
    pub(crate) const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Rebuilds a handle from its raw parts.
    ///
    /// Useful when blocks are stored as plain offsets elsewhere. The allocator
    /// validates the result like any other handle.
    #[must_use]
    pub const fn from_raw_parts(offset: usize, len: usize) -> Self {
        Self::new(offset, len)
    }

    /// Offset of the first byte, relative to the buffer start
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Length in bytes
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the block spans zero bytes
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset one past the last byte
    #[inline]
    pub const fn end(&self) -> usize {
        self.offset.saturating_add(self.len)
    }
}
