//! An open-addressed hash table and a dynamic array, both parameterized by
//! the allocator contract from [`arena_pool`].
//!
//! # Hash table
//!
//! [`HashTable`] uses linear probing over a power-of-two slot array with a
//! 0.7 load-factor cap. Deletion leaves tombstones; growth and
//! [`clear_tombstones()`](HashTable::clear_tombstones) rehash **in place**
//! (no side buffer), walking displaced records through a transient marker
//! state until each settles at its home run.
//!
//! ```rust
//! use probe_table::HashTable;
//!
//! let mut counts: HashTable<u64, u64> = HashTable::new();
//! for word in [3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5] {
//!     *counts.get_or_default(word) += 1;
//! }
//!
//! assert_eq!(counts.get(&5), Some(&3));
//! assert_eq!(counts.get(&7), None);
//! assert_eq!(counts.values().sum::<u64>(), 11);
//! ```
//!
//! # Dynamic array
//!
//! [`ArrayList`] is a contiguous sequence with capacity doubling from 16,
//! dereferencing to a slice for everything `[T]` already does.
//!
//! ```rust
//! use probe_table::ArrayList;
//!
//! let mut stack: ArrayList<&str> = ArrayList::new();
//! stack.push("red");
//! stack.push("green");
//! stack.insert(1, "blue");
//!
//! assert_eq!(stack.as_slice(), &["red", "blue", "green"]);
//! ```
//!
//! # Allocators
//!
//! Both containers default to the process-wide pool ([`PoolAlloc`]) and
//! accept any [`RawAllocator`] through `with_capacity_in`, e.g. an
//! [`arena_pool::Arena`] for bulk-freed workloads.

mod array;
mod iter;
mod map;

pub use arena_pool::{PoolAlloc, RawAllocator};
pub use array::ArrayList;
pub use iter::{Iter, Keys, Values};
pub use map::HashTable;
