//! Checkpoint and scratch scope support for the arena allocator

use core::ops::{Deref, DerefMut};

use tracing::warn;

use super::ArenaAllocator;

/// Saved arena offsets, restorable with [`ArenaAllocator::restore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaCheckpoint {
    pub(super) offset: usize,
    pub(super) previous_offset: usize,
}

impl ArenaCheckpoint {
    /// Free-boundary offset at the time of the snapshot
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Most-recent-block offset at the time of the snapshot
    #[inline]
    pub fn previous_offset(&self) -> usize {
        self.previous_offset
    }
}

/// Scoped snapshot of an arena.
///
/// Everything allocated through the scratch (it derefs to the arena) is given
/// back when the scope ends, either by [`end`](Self::end) or on drop. Bytes
/// written in the meantime are not undone, they only become free to reuse.
///
/// ```
/// use linear_alloc::ArenaAllocator;
///
/// let mut arena = ArenaAllocator::create(256).unwrap();
/// arena.alloc(16).unwrap();
/// let kept = arena.offset();
/// {
///     let mut scratch = arena.scratch();
///     scratch.alloc(64).unwrap();
/// }
/// assert_eq!(arena.offset(), kept);
/// ```
pub struct Scratch<'a, 'buf> {
    arena: Option<&'a mut ArenaAllocator<'buf>>,
    saved: ArenaCheckpoint,
}

impl<'a, 'buf> Scratch<'a, 'buf> {
    /// Captures the arena's current offsets.
    pub fn start(arena: &'a mut ArenaAllocator<'buf>) -> Self {
        Self {
            saved: arena.checkpoint(),
            arena: Some(arena),
        }
    }

    /// The snapshot this scope rewinds to
    #[inline]
    pub fn checkpoint(&self) -> ArenaCheckpoint {
        self.saved
    }

    /// Writes the saved offsets back into the arena and closes the scope.
    pub fn end(mut self) {
        if let Some(arena) = self.arena.take() {
            rewind(arena, self.saved);
        }
    }

    /// Re-bases the scope onto the arena's live offsets.
    ///
    /// The returned scratch rewinds to the state at the time of this call,
    /// not to the original snapshot. The original scope is consumed without
    /// rewinding; use [`checkpoint`](Self::checkpoint) beforehand to keep its
    /// snapshot around.
    pub fn decouple(mut self) -> Self {
        match self.arena.take() {
            Some(arena) => Self::start(arena),
            None => unreachable!("scratch scope without an arena"),
        }
    }

    /// Closes the scope and keeps everything allocated inside it.
    pub fn keep(mut self) {
        self.arena = None;
    }
}

fn rewind(arena: &mut ArenaAllocator<'_>, saved: ArenaCheckpoint) {
    // A destroyed arena has nothing left to rewind.
    if arena.is_active() {
        // Fails only if the arena was replaced through `DerefMut`.
        if let Err(error) = arena.restore(saved) {
            warn!(%error, "scratch scope could not rewind its arena");
        }
    }
}

impl<'buf> Deref for Scratch<'_, 'buf> {
    type Target = ArenaAllocator<'buf>;

    fn deref(&self) -> &Self::Target {
        match &self.arena {
            Some(arena) => &**arena,
            None => unreachable!("scratch scope without an arena"),
        }
    }
}

impl DerefMut for Scratch<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.arena {
            Some(arena) => &mut **arena,
            None => unreachable!("scratch scope without an arena"),
        }
    }
}

impl Drop for Scratch<'_, '_> {
    fn drop(&mut self) {
        if let Some(arena) = self.arena.take() {
            rewind(arena, self.saved);
        }
    }
}

impl core::fmt::Debug for Scratch<'_, '_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scratch")
            .field("saved", &self.saved)
            .field("open", &self.arena.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::super::ArenaAllocator;

    #[test]
    fn end_rewinds_both_offsets() {
        let mut arena = ArenaAllocator::create(256).unwrap();
        arena.alloc_aligned(16, 8).unwrap();
        let before = (arena.offset(), arena.previous_offset());

        let mut scratch = arena.scratch();
        scratch.alloc_aligned(32, 8).unwrap();
        scratch.alloc_aligned(32, 8).unwrap();
        scratch.end();

        assert_eq!((arena.offset(), arena.previous_offset()), before);
    }

    #[test]
    fn keep_leaves_allocations() {
        let mut arena = ArenaAllocator::create(256).unwrap();
        let mut scratch = arena.scratch();
        scratch.alloc_aligned(32, 1).unwrap();
        scratch.keep();
        assert_eq!(arena.offset(), 32);
    }

    #[test]
    fn writes_survive_rewind() {
        let mut arena = ArenaAllocator::create(64).unwrap();
        let block = {
            let mut scratch = arena.scratch();
            let block = scratch.alloc_aligned(4, 4).unwrap();
            scratch.bytes_mut(block).unwrap().copy_from_slice(b"abcd");
            block
        };
        assert_eq!(arena.offset(), 0);
        // The block is no longer live, but reallocating the same spot sees the
        // old bytes.
        assert!(arena.bytes(block).is_err());
        let again = arena.alloc_aligned(4, 4).unwrap();
        assert_eq!(again, block);
        assert_eq!(arena.bytes(again).unwrap(), b"abcd");
    }

    #[test]
    fn nested_scopes_unwind_in_order() {
        let mut arena = ArenaAllocator::create(256).unwrap();
        let mut outer = arena.scratch();
        outer.alloc_aligned(16, 1).unwrap();
        {
            let mut inner = outer.scratch();
            inner.alloc_aligned(64, 1).unwrap();
            assert_eq!(inner.offset(), 80);
        }
        assert_eq!(outer.offset(), 16);
        outer.end();
        assert_eq!(arena.offset(), 0);
    }

    #[test]
    fn destroy_inside_scope_is_tolerated() {
        let mut arena = ArenaAllocator::create(64).unwrap();
        {
            let mut scratch = arena.scratch();
            scratch.alloc(8).unwrap();
            scratch.destroy();
        }
        assert!(!arena.is_active());
        assert_eq!(arena.capacity(), 0);
    }

    #[test]
    fn drop_survives_replaced_arena() {
        let mut arena = ArenaAllocator::create(256).unwrap();
        arena.alloc_aligned(32, 1).unwrap();
        {
            let mut scratch = arena.scratch();
            *scratch = ArenaAllocator::create(8).unwrap();
        }
        assert_eq!(arena.capacity(), 8);
        assert_eq!(arena.offset(), 0);
    }
}
