//! Integration tests for the arena allocator

use linear_alloc::align::align_forward;
use linear_alloc::{
    AllocError, ArenaAllocator, ArenaConfig, Block, LinearAllocator, MemoryUsage, Resettable,
    StatisticsProvider,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

#[repr(C, align(64))]
struct Aligned<const N: usize>([u8; N]);

impl<const N: usize> Aligned<N> {
    fn new() -> Self {
        Self([0; N])
    }
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

#[rstest]
#[case(1)]
#[case(2)]
#[case(8)]
#[case(16)]
#[case(64)]
#[case(256)]
fn blocks_honor_alignment_on_owned_buffers(#[case] alignment: usize) {
    let mut arena = ArenaAllocator::create(4096).expect("reserve arena");
    arena.alloc_aligned(3, 1).unwrap();

    let block = arena.alloc_aligned(24, alignment).unwrap();
    assert_eq!((arena.start_addr() + block.offset()) % alignment, 0);
    assert_eq!(arena.previous_offset(), block.offset());
    assert_eq!(arena.offset(), block.end());
}

#[test]
fn test_default_alignment_is_two_words() {
    let mut buf = Aligned::<128>::new();
    let mut arena = ArenaAllocator::init(&mut buf.0);
    arena.alloc_aligned(1, 1).unwrap();
    let block = arena.alloc(8).unwrap();
    assert_eq!(block.offset(), 2 * size_of::<usize>());
}

#[test]
fn test_out_of_memory_reports_request() {
    let mut buf = Aligned::<64>::new();
    let mut arena = ArenaAllocator::init(&mut buf.0);
    arena.alloc_aligned(30, 1).unwrap();

    // Two bytes of padding push the block past the end.
    let err = arena.alloc_aligned(34, 8).unwrap_err();
    assert_eq!(
        err,
        AllocError::OutOfMemory {
            requested: 34,
            required: 36,
            remaining: 34,
        }
    );
    assert!(err.is_recoverable());
    assert_eq!((arena.offset(), arena.previous_offset()), (30, 0));
}

#[test]
fn test_exact_fit_succeeds() {
    let mut buf = Aligned::<64>::new();
    let mut arena = ArenaAllocator::init(&mut buf.0);
    arena.alloc_aligned(64, 64).unwrap();
    assert_eq!(arena.remaining(), 0);
    assert!(arena.alloc_aligned(1, 1).is_err());
}

#[test]
fn test_trait_helpers_allocate_typed_arrays() {
    let mut buf = Aligned::<256>::new();
    let mut arena = ArenaAllocator::init(&mut buf.0);
    arena.alloc_aligned(1, 1).unwrap();

    let block = arena.alloc_array::<u64>(4).unwrap();
    assert_eq!(block.offset() % align_of::<u64>(), 0);
    assert_eq!(block.len(), 32);

    let copy = arena.alloc_copy(b"hello", 1).unwrap();
    assert_eq!(arena.bytes(copy).unwrap(), b"hello");

    let overflow = arena.alloc_array::<u64>(usize::MAX).unwrap_err();
    assert!(overflow.is_out_of_memory());
}

// ---------------------------------------------------------------------------
// Resize
// ---------------------------------------------------------------------------

#[test]
fn test_resize_in_place_keeps_contents() {
    let mut buf = Aligned::<256>::new();
    let mut arena = ArenaAllocator::init(&mut buf.0);
    let block = arena.alloc_aligned(4, 4).unwrap();
    arena.bytes_mut(block).unwrap().copy_from_slice(&[1, 2, 3, 4]);

    let grown = arena.resize(block, 12, 4).unwrap();
    assert_eq!(grown.offset(), block.offset());
    assert_eq!(&arena.bytes(grown).unwrap()[..4], &[1, 2, 3, 4]);
    assert_eq!(arena.statistics().relocating_resizes, 0);
}

#[test]
fn test_resize_relocates_older_block() {
    let mut buf = Aligned::<256>::new();
    let mut arena = ArenaAllocator::init_with_config(&mut buf.0, ArenaConfig::debug());
    let old = arena.alloc_aligned(8, 8).unwrap();
    arena.bytes_mut(old).unwrap().copy_from_slice(b"abcdefgh");
    arena.alloc_aligned(8, 8).unwrap();

    let grown = arena.resize(old, 16, 8).unwrap();
    assert_eq!(grown.offset(), 16);
    assert_eq!(&arena.bytes(grown).unwrap()[..8], b"abcdefgh");
    // The rest of the new block carries the allocation fill.
    assert!(arena.bytes(grown).unwrap()[8..].iter().all(|&b| b == 0xAA));
    // The old block is left behind unchanged.
    assert_eq!(arena.bytes(old).unwrap(), b"abcdefgh");

    let shrunk = arena.resize(old, 3, 1).unwrap();
    assert_eq!(arena.bytes(shrunk).unwrap(), b"abc");
    assert_eq!(arena.statistics().relocating_resizes, 2);
}

#[test]
fn test_resize_failure_keeps_offsets() {
    let mut buf = Aligned::<64>::new();
    let mut arena = ArenaAllocator::init(&mut buf.0);
    let old = arena.alloc_aligned(16, 8).unwrap();
    arena.alloc_aligned(32, 8).unwrap();

    let err = arena.resize(old, 32, 8).unwrap_err();
    assert!(err.is_out_of_memory());
    assert_eq!((arena.offset(), arena.previous_offset()), (48, 16));
}

#[test]
fn test_resize_rejects_block_freed_by_reset() {
    let mut arena = ArenaAllocator::create(128).unwrap();
    arena.alloc_aligned(16, 8).unwrap();
    let stale = arena.alloc_aligned(16, 8).unwrap();
    arena.bytes_mut(stale).unwrap().copy_from_slice(b"stale-stale-data");
    arena.free_all();

    let err = arena.resize(stale, 32, 8).unwrap_err();
    assert!(err.is_invalid_pointer());
    assert_eq!((arena.offset(), arena.previous_offset()), (0, 0));

    // A same-size resize of a freed block is rejected too.
    assert!(arena.resize(stale, 16, 8).unwrap_err().is_invalid_pointer());
}

#[test]
fn test_resize_rejects_block_freed_by_scratch() {
    let mut arena = ArenaAllocator::create(256).unwrap();
    arena.alloc_aligned(32, 8).unwrap();
    arena.alloc_aligned(8, 8).unwrap();
    let before = (arena.offset(), arena.previous_offset());

    let mut scratch = arena.scratch();
    let temp = scratch.alloc_aligned(24, 8).unwrap();
    scratch.alloc_aligned(8, 8).unwrap();
    scratch.end();

    let err = arena.resize(temp, 48, 8).unwrap_err();
    assert!(err.is_invalid_pointer());
    assert_eq!((arena.offset(), arena.previous_offset()), before);
}

// ---------------------------------------------------------------------------
// Reset and ownership
// ---------------------------------------------------------------------------

#[test]
fn test_clear_keeps_capacity() {
    let mut arena = ArenaAllocator::create(512).unwrap();
    arena.alloc(100).unwrap();
    arena.clear();
    assert_eq!(arena.capacity(), 512);
    assert_eq!((arena.offset(), arena.previous_offset()), (0, 0));

    arena.alloc(100).unwrap();
    arena.reset();
    assert_eq!(arena.used_memory(), 0);
    assert_eq!(arena.total_memory(), 512);
}

#[test]
fn test_destroy_owned_arena() {
    let mut arena = ArenaAllocator::create(512).unwrap();
    assert!(arena.owns_buffer());
    arena.alloc(64).unwrap();

    arena.destroy();
    assert!(!arena.is_active());
    assert_eq!(arena.capacity(), 0);
    assert_eq!((arena.offset(), arena.previous_offset()), (0, 0));

    // Second destroy is a no-op.
    arena.destroy();
    assert_eq!(arena.capacity(), 0);
}

#[test]
fn test_destroy_borrowed_arena_leaves_buffer() {
    let mut bytes = [0u8; 64];
    {
        let mut arena = ArenaAllocator::init(&mut bytes);
        assert!(!arena.owns_buffer());
        let block = arena.alloc_aligned(4, 1).unwrap();
        arena.bytes_mut(block).unwrap().copy_from_slice(b"kept");
        arena.destroy();
        assert_eq!(arena.capacity(), 0);
    }
    assert_eq!(&bytes[..4], b"kept");
}

#[test]
#[should_panic(expected = "zero capacity")]
fn test_create_zero_capacity_panics() {
    let _ = ArenaAllocator::create(0);
}

#[test]
fn test_stale_block_is_rejected_after_clear() {
    let mut arena = ArenaAllocator::create(128).unwrap();
    let block = arena.alloc(32).unwrap();
    arena.free_all();
    assert!(arena.bytes(block).unwrap_err().is_invalid_pointer());
}

#[test]
fn test_usage_ratio() {
    let mut buf = Aligned::<128>::new();
    let mut arena = ArenaAllocator::init(&mut buf.0);
    arena.alloc_aligned(32, 1).unwrap();
    assert!((arena.usage_ratio() - 0.25).abs() < f64::EPSILON);
}

// ---------------------------------------------------------------------------
// Checkpoints and scratch scopes
// ---------------------------------------------------------------------------

#[test]
fn test_checkpoint_restore_rewinds() {
    let mut buf = Aligned::<256>::new();
    let mut arena = ArenaAllocator::init(&mut buf.0);
    arena.alloc_aligned(16, 8).unwrap();
    let checkpoint = arena.checkpoint();

    arena.alloc_aligned(64, 8).unwrap();
    arena.restore(checkpoint).unwrap();
    assert_eq!(arena.offset(), checkpoint.offset());
    assert_eq!(arena.previous_offset(), checkpoint.previous_offset());

    // The top block is resizable in place again.
    let top = Block::from_raw_parts(checkpoint.previous_offset(), 16);
    let grown = arena.resize(top, 32, 8).unwrap();
    assert_eq!(grown.offset(), 0);
}

#[test]
fn test_decoupled_scratch_rewinds_to_rebased_point() {
    let mut buf = Aligned::<256>::new();
    let mut arena = ArenaAllocator::init(&mut buf.0);
    arena.alloc_aligned(16, 1).unwrap();

    let mut scratch = arena.scratch();
    scratch.alloc_aligned(32, 1).unwrap();
    assert_eq!(scratch.checkpoint().offset(), 16);

    let mut decoupled = scratch.decouple();
    assert_eq!(decoupled.checkpoint().offset(), 48);
    assert_eq!(decoupled.checkpoint().previous_offset(), 16);
    decoupled.alloc_aligned(8, 1).unwrap();
    decoupled.end();

    assert_eq!((arena.offset(), arena.previous_offset()), (48, 16));
}

#[rstest]
#[case::original_last(false, 16)]
#[case::decoupled_last(true, 48)]
fn test_both_snapshots_restore_in_either_order(
    #[case] decoupled_last: bool,
    #[case] expected_offset: usize,
) {
    let mut buf = Aligned::<256>::new();
    let mut arena = ArenaAllocator::init(&mut buf.0);
    arena.alloc_aligned(16, 1).unwrap();

    let mut scratch = arena.scratch();
    let original = scratch.checkpoint();
    scratch.alloc_aligned(32, 1).unwrap();
    let mut decoupled = scratch.decouple();
    let rebased = decoupled.checkpoint();
    decoupled.alloc_aligned(8, 1).unwrap();
    decoupled.keep();
    assert_eq!(arena.offset(), 56);

    if decoupled_last {
        arena.restore(original).unwrap();
        arena.restore(rebased).unwrap();
    } else {
        arena.restore(rebased).unwrap();
        arena.restore(original).unwrap();
    }
    assert_eq!(arena.offset(), expected_offset);
}

#[test]
fn test_scratch_drop_rewinds() {
    let mut arena = ArenaAllocator::create(256).unwrap();
    arena.alloc(8).unwrap();
    let kept = (arena.offset(), arena.previous_offset());
    {
        let mut scratch = arena.scratch();
        for _ in 0..4 {
            scratch.alloc(16).unwrap();
        }
    }
    assert_eq!((arena.offset(), arena.previous_offset()), kept);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn offset_tracks_padding_plus_size(
        requests in proptest::collection::vec((1usize..96, 0u32..7), 1..40),
    ) {
        let mut buf = Aligned::<1024>::new();
        let mut arena = ArenaAllocator::init(&mut buf.0);
        let start = arena.start_addr();
        let mut expected = 0usize;

        for (size, shift) in requests {
            let alignment = 1usize << shift;
            let before = (arena.offset(), arena.previous_offset());
            let aligned = align_forward(start + expected, alignment) - start;

            match arena.alloc_aligned(size, alignment) {
                Ok(block) => {
                    prop_assert!(aligned + size <= 1024);
                    prop_assert_eq!(block.offset(), aligned);
                    expected = aligned + size;
                    prop_assert!(arena.offset() >= before.0);
                }
                Err(err) => {
                    prop_assert!(aligned + size > 1024);
                    prop_assert!(err.is_out_of_memory());
                    prop_assert_eq!((arena.offset(), arena.previous_offset()), before);
                }
            }
            prop_assert_eq!(arena.offset(), expected);
        }
    }

    #[test]
    fn relocating_resize_preserves_prefix(old_len in 1usize..64, new_len in 1usize..64) {
        prop_assume!(old_len != new_len);
        let mut arena = ArenaAllocator::create(512).unwrap();
        let old = arena.alloc_aligned(old_len, 1).unwrap();
        for (i, byte) in arena.bytes_mut(old).unwrap().iter_mut().enumerate() {
            *byte = i as u8;
        }
        arena.alloc_aligned(1, 1).unwrap();

        let moved = arena.resize(old, new_len, 1).unwrap();
        prop_assert_ne!(moved.offset(), old.offset());
        let keep = old_len.min(new_len);
        let expected: Vec<u8> = (0..keep).map(|i| i as u8).collect();
        prop_assert_eq!(&arena.bytes(moved).unwrap()[..keep], expected.as_slice());
    }
}
