//! # linear-alloc
//!
//! Linear memory allocators over a single contiguous byte buffer.
//!
//! - [`ArenaAllocator`]: bump allocation, bulk reset, in-place resize of the
//!   most recent block and scoped snapshots ([`Scratch`]).
//! - [`StackAllocator`]: LIFO allocation with an in-band header in front of
//!   every block, so the top block can be popped or the stack freed down to
//!   any live block.
//!
//! Both allocators either borrow a caller buffer (`init`) or own a buffer
//! they reserved themselves (`create`); see [`Buffer`]. Allocations are
//! returned as [`Block`] handles, offsets into the buffer that are checked
//! against the live region on every access.
//!
//! ## Quick Start
//!
//! ```rust
//! use linear_alloc::prelude::*;
//!
//! let mut bytes = [0u8; 1024];
//! let mut arena = ArenaAllocator::init(&mut bytes);
//!
//! let block = arena.alloc_aligned(64, 8)?;
//! arena.bytes_mut(block)?.fill(1);
//!
//! {
//!     let mut scratch = arena.scratch();
//!     scratch.alloc(256)?;
//! } // rewound here
//!
//! arena.free_all();
//! assert_eq!(arena.offset(), 0);
//! # Ok::<(), linear_alloc::AllocError>(())
//! ```
//!
//! ## Features
//!
//! - `arena` (default): arena allocator and scratch scopes
//! - `stack` (default): stack allocator
//!
//! ## Error model
//!
//! Precondition violations (zero-size requests, non-power-of-two alignments,
//! zero-capacity buffers, use after `destroy`) panic. Running out of capacity
//! and handing in a foreign or freed block are reported as [`AllocError`].
//! Every error is also emitted as a `tracing` event.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
// Stats ratios convert usize counters to f64
#![allow(clippy::cast_precision_loss)]

pub mod align;
#[cfg(feature = "arena")]
#[cfg_attr(docsrs, doc(cfg(feature = "arena")))]
pub mod arena;
pub mod block;
pub mod buffer;
pub mod error;
#[cfg(feature = "stack")]
#[cfg_attr(docsrs, doc(cfg(feature = "stack")))]
pub mod stack;
pub mod stats;
pub mod traits;

pub use crate::block::Block;
pub use crate::buffer::Buffer;
pub use crate::error::{AllocError, AllocResult};
pub use crate::stats::AllocatorStats;
pub use crate::traits::{LinearAllocator, MemoryUsage, Resettable, StatisticsProvider};

#[cfg(feature = "arena")]
pub use crate::arena::{ArenaAllocator, ArenaCheckpoint, ArenaConfig, Scratch};
#[cfg(feature = "stack")]
pub use crate::stack::{StackAllocator, StackConfig, StackHeader};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::align::{DEFAULT_ALIGNMENT, align_forward, is_power_of_two};
    pub use crate::block::Block;
    pub use crate::buffer::Buffer;
    pub use crate::error::{AllocError, AllocResult};
    pub use crate::stats::AllocatorStats;
    pub use crate::traits::{LinearAllocator, MemoryUsage, Resettable, StatisticsProvider};

    #[cfg(feature = "arena")]
    pub use crate::arena::{ArenaAllocator, ArenaCheckpoint, ArenaConfig, Scratch};

    #[cfg(feature = "stack")]
    pub use crate::stack::{StackAllocator, StackConfig, StackHeader};
}
