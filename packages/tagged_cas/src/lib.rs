//! Double-wide tagged-pointer compare-and-swap for ABA-safe lock-free lists.
//!
//! A [`TaggedPtr<T>`] pairs a raw pointer with a monotonically increasing tag,
//! packed into a single 128-bit atomic so both halves are read and swapped
//! together. The tag is incremented on every successful swap, which defeats
//! the ABA problem in intrusive stacks and free-lists: even if a node is
//! popped, recycled, and pushed back at the same address, the tag will have
//! moved on and a stale compare-and-swap will fail.
//!
//! # Example
//!
//! ```rust
//! use tagged_cas::TaggedPtr;
//!
//! let head: TaggedPtr<u64> = TaggedPtr::null();
//!
//! let node = Box::into_raw(Box::new(42_u64));
//!
//! // Publish the node. The snapshot is refreshed in place on failure, so a
//! // plain loop retries correctly under contention.
//! let mut observed = head.load();
//! while !head.try_swap(&mut observed, node) {}
//!
//! let current = head.load();
//! assert_eq!(current.ptr(), node);
//! assert_eq!(current.tag(), 1);
//!
//! // SAFETY: We just published this pointer and nothing else owns it.
//! drop(unsafe { Box::from_raw(node) });
//! ```
//!
//! # Hardware backing
//!
//! The 128-bit atomic lowers to `cmpxchg16b` on `x86_64` and `casp` (or an
//! `ldxp`/`stxp` pair) on `aarch64` via [`portable_atomic`]. Targets without a
//! native double-wide atomic fall back to `portable_atomic`'s sequence-lock
//! emulation; the protocol is unchanged.

mod tagged_ptr;

pub use portable_atomic::{AtomicI128, AtomicU128};
pub use tagged_ptr::{Snapshot, TaggedPtr};
