//! Virtual-memory bump arenas, a lock-free size-class pool allocator, and
//! the POSIX synchronization primitives they are built on.
//!
//! # The allocator contract
//!
//! Everything here speaks one allocator signature, `(ptr, size, align) ->
//! ptr`, captured by the [`RawAllocator`] trait: null-pointer calls
//! allocate, positive-size calls on a live pointer reallocate, zero-size
//! calls free. Containers take a `RawAllocator` type parameter and default
//! to the pool.
//!
//! Three allocators implement the contract:
//!
//! - [`PoolAlloc`] / [`nalloc`]: the process-wide size-class pool. Freed
//!   blocks recycle through per-bucket lock-free free-lists (ABA-safe via
//!   tagged compare-and-swap); fresh blocks are carved from a private
//!   arena. This is the general-purpose allocator.
//! - [`Arena`]: a growable bump allocator over a huge virtual-memory
//!   reservation. Frees are no-ops; reclamation is bulk via reset or drop.
//! - [`ScratchAlloc`] / [`scratch_alloc`]: a process-global arena for
//!   transients, reclaimed wholesale by [`reset_scratch()`].
//!
//! # Synchronization
//!
//! [`Mutex`], [`Condition`], and [`Semaphore`] wrap the native POSIX
//! objects; [`spawn_detached()`] starts fire-and-forget threads whose
//! bookkeeping flows through the pool. These are deliberately small: enough
//! to build concurrent pipelines, nothing more.
//!
//! # Contracts, not errors
//!
//! Precondition violations (exhausted reservations, bad alignments) abort
//! the process via assertions. No error type is exposed; the OS provider is
//! treated as infallible.
//!
//! # Example
//!
//! ```rust
//! use arena_pool::{PoolAlloc, RawAllocator};
//!
//! let block: std::ptr::NonNull<u64> = PoolAlloc.alloc_array(16);
//!
//! // SAFETY: Freshly allocated storage for sixteen values.
//! unsafe {
//!     block.as_ptr().write_bytes(0, 16);
//! }
//!
//! // SAFETY: Live pool pointer, not used again.
//! unsafe { PoolAlloc.dealloc(block) };
//! ```

mod alloc;
mod arena;
mod block;
mod census;
mod condition;
mod mutex;
mod pal;
mod pool;
mod scratch;
mod semaphore;
mod spawn;

pub use alloc::RawAllocator;
pub use arena::{ARENA_RESERVATION, Arena};
pub use block::BUCKET_COUNT;
#[cfg(debug_assertions)]
pub use census::{BucketCensus, pool_census};
pub use condition::Condition;
pub use mutex::{Mutex, MutexGuard};
pub use pool::{PoolAlloc, nalloc};
pub use scratch::{ScratchAlloc, reset_scratch, scratch_alloc};
pub use semaphore::Semaphore;
pub use spawn::spawn_detached;
