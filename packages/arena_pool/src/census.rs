//! Debug-build census of pool blocks, per size-class bucket.
//!
//! Compiled only with debug assertions; release builds carry no counters.

#[cfg(debug_assertions)]
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(debug_assertions)]
use crate::block::{BUCKET_COUNT, bucket_block_size};

#[cfg(debug_assertions)]
static TOTAL_BLOCKS: [AtomicUsize; BUCKET_COUNT] = [const { AtomicUsize::new(0) }; BUCKET_COUNT];

#[cfg(debug_assertions)]
static USED_BLOCKS: [AtomicUsize; BUCKET_COUNT] = [const { AtomicUsize::new(0) }; BUCKET_COUNT];

/// A fresh block was carved from the backing arena and handed out.
pub(crate) fn note_carve(bucket: usize) {
    #[cfg(debug_assertions)]
    {
        TOTAL_BLOCKS[bucket].fetch_add(1, Ordering::Relaxed);
        USED_BLOCKS[bucket].fetch_add(1, Ordering::Relaxed);
    }
    #[cfg(not(debug_assertions))]
    let _ = bucket;
}

/// A recycled block came off its free-list.
pub(crate) fn note_pop(bucket: usize) {
    #[cfg(debug_assertions)]
    USED_BLOCKS[bucket].fetch_add(1, Ordering::Relaxed);
    #[cfg(not(debug_assertions))]
    let _ = bucket;
}

/// A block returned to its free-list.
pub(crate) fn note_push(bucket: usize) {
    #[cfg(debug_assertions)]
    USED_BLOCKS[bucket].fetch_sub(1, Ordering::Relaxed);
    #[cfg(not(debug_assertions))]
    let _ = bucket;
}

/// A snapshot of one size-class bucket of the pool.
#[cfg(debug_assertions)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BucketCensus {
    /// Payload bytes per block in this bucket.
    pub block_size: usize,
    /// Blocks ever carved for this bucket (free-listed or in use).
    pub total_blocks: usize,
    /// Blocks currently handed out.
    pub used_blocks: usize,
}

/// Snapshots every bucket of the process-wide pool.
///
/// Counters are maintained with relaxed atomics, so a snapshot taken while
/// other threads allocate is a momentary view, not a fence. Quiesce the pool
/// first when exact numbers matter.
#[cfg(debug_assertions)]
#[must_use]
pub fn pool_census() -> [BucketCensus; BUCKET_COUNT] {
    let mut snapshot = [BucketCensus::default(); BUCKET_COUNT];
    for (bucket, entry) in snapshot.iter_mut().enumerate() {
        *entry = BucketCensus {
            block_size: bucket_block_size(bucket),
            total_blocks: TOTAL_BLOCKS[bucket].load(Ordering::Relaxed),
            used_blocks: USED_BLOCKS[bucket].load(Ordering::Relaxed),
        };
    }
    snapshot
}

#[cfg(all(test, debug_assertions))]
mod tests {
    use std::ptr;

    use super::*;
    use crate::block::bucket_index;
    use crate::pool::nalloc;

    #[test]
    fn used_count_returns_to_baseline_after_alloc_free_pairs() {
        // Use an unusual size so concurrent tests in other buckets cannot
        // perturb this bucket's counters.
        const SIZE: usize = (1 << 21) - 9;
        let bucket = bucket_index(SIZE, 8);

        let before = pool_census()[bucket];
        let pointers: Vec<*mut u8> = (0..16)
            // SAFETY: Allocate form.
            .map(|_| unsafe { nalloc(ptr::null_mut(), SIZE, 8) })
            .collect();

        let during = pool_census()[bucket];
        assert_eq!(during.used_blocks, before.used_blocks + 16);
        assert_eq!(during.block_size, 1 << 21);

        for ptr in pointers {
            // SAFETY: Live pool pointers, freed once each.
            unsafe { nalloc(ptr, 0, 0) };
        }

        let after = pool_census()[bucket];
        assert_eq!(after.used_blocks, before.used_blocks);
        assert!(after.total_blocks >= 16);
    }
}
