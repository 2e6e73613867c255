//! In-band block header of the stack allocator

use core::mem::{align_of, size_of};

const WORD: usize = size_of::<usize>();

/// Header stored right before every stack payload.
///
/// ```text
///   |  free  |   padding   | header | payload |
///   ^        ^             ^        ^
/// buffer   block start     |      payload offset
///          (old offset)    payload offset - SIZE
/// ```
///
/// `padding` spans from the block start to the payload and includes the
/// header itself. `previous_offset` is the payload offset of the block below,
/// zero for the bottom block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackHeader {
    /// Bytes between the block start and its payload, header included
    pub padding: usize,
    /// Payload offset of the previous block, or 0
    pub previous_offset: usize,
}

impl StackHeader {
    /// Bytes occupied by a header in the buffer
    pub const SIZE: usize = size_of::<Self>();

    /// Alignment every header is written at
    pub const ALIGN: usize = align_of::<Self>();

    /// Offset of the first byte of the block owning this header
    #[inline]
    pub const fn block_start(&self, payload: usize) -> usize {
        payload - self.padding
    }

    /// Whether this header can belong to a payload at `payload`.
    ///
    /// Rejects headers that would rewind outside the buffer or link forward,
    /// which is what a stale or overwritten header usually looks like.
    pub(crate) fn is_consistent(&self, payload: usize) -> bool {
        if self.padding < Self::SIZE || self.padding > payload {
            return false;
        }
        let start = payload - self.padding;
        if start == 0 {
            self.previous_offset == 0
        } else {
            self.previous_offset != 0 && self.previous_offset < start
        }
    }

    pub(crate) fn write_to(&self, bytes: &mut [u8]) {
        bytes[..WORD].copy_from_slice(&self.padding.to_ne_bytes());
        bytes[WORD..Self::SIZE].copy_from_slice(&self.previous_offset.to_ne_bytes());
    }

    /// Decodes the header preceding `payload`, `None` if it does not fit.
    pub(crate) fn read_before(bytes: &[u8], payload: usize) -> Option<Self> {
        let start = payload.checked_sub(Self::SIZE)?;
        let raw = bytes.get(start..payload)?;
        let (padding, previous) = raw.split_at(WORD);
        Some(Self {
            padding: usize::from_ne_bytes(padding.try_into().ok()?),
            previous_offset: usize::from_ne_bytes(previous.try_into().ok()?),
        })
    }
}
