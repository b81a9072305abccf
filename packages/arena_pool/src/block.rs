//! Block header layout shared by the arena and the pool allocator.
//!
//! Every allocation carries a [`BlockHeader`] immediately before the payload
//! (`payload == header end`), recording the size and alignment the caller
//! supplied. Reallocate and free pass alignment zero; the header remembers
//! the original, which must hold for the lifetime of the pointer.

use static_assertions::const_assert;
use static_assertions::const_assert_eq;

/// Metadata stored directly before every payload pointer handed out.
///
/// `base_offset` is the distance from the start of the underlying block to
/// the header, which lets free recover the block start no matter how much
/// alignment padding sits in front of the header.
#[repr(C, align(16))]
pub(crate) struct BlockHeader {
    pub(crate) size: usize,
    pub(crate) align: u32,
    pub(crate) base_offset: u32,
}

pub(crate) const HEADER_SIZE: usize = size_of::<BlockHeader>();
pub(crate) const HEADER_ALIGN: usize = align_of::<BlockHeader>();

// The header is exactly one 16-byte unit; placement math relies on it.
const_assert_eq!(HEADER_SIZE, 16);
const_assert_eq!(HEADER_ALIGN, 16);
const_assert!(size_of::<usize>() <= 8);

/// One size-class bucket per bit of a machine word.
pub const BUCKET_COUNT: usize = usize::BITS as usize;

/// Rounds `value` up to a multiple of `align` (a power of two).
pub(crate) fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (value + (align - 1)) & !(align - 1)
}

/// `ceil(log2(value))` for `value > 0`.
pub(crate) fn ceil_log2(value: usize) -> u32 {
    debug_assert!(value > 0);
    if value == 1 {
        0
    } else {
        usize::BITS - (value - 1).leading_zeros()
    }
}

/// The size-class bucket for a request of `size` bytes at `align` alignment.
///
/// Alignments wider than the header need extra room in front of the payload,
/// so they inflate the size before bucketing. The first few buckets are
/// below the word size and never used.
pub(crate) fn bucket_index(size: usize, align: usize) -> usize {
    assert!(align.is_power_of_two(), "alignment must be a power of two");
    let padding = align.saturating_sub(HEADER_SIZE);
    let needed = size
        .checked_add(padding)
        .expect("allocation size plus alignment padding overflows");
    ceil_log2(needed.max(size_of::<usize>())) as usize
}

/// Payload bytes held by a block in `bucket`.
pub(crate) fn bucket_block_size(bucket: usize) -> usize {
    1_usize << bucket
}

/// The payload position for a block whose storage begins at `start`, such
/// that the payload is `align`-aligned and the header fits directly before
/// it.
pub(crate) fn payload_addr(start: usize, align: usize) -> usize {
    align_up(align_up(start, HEADER_ALIGN) + HEADER_SIZE, align)
}

/// The header preceding a live payload.
pub(crate) fn header_ptr(payload: usize) -> *mut BlockHeader {
    (payload - HEADER_SIZE) as *mut BlockHeader
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_log2_values() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(4), 2);
        assert_eq!(ceil_log2(5), 3);
        assert_eq!(ceil_log2(1024), 10);
        assert_eq!(ceil_log2(1025), 11);
        assert_eq!(ceil_log2(1_usize << (usize::BITS - 1)), usize::BITS - 1);
    }

    #[test]
    fn align_up_values() {
        assert_eq!(align_up(0, 16), 0);
        assert_eq!(align_up(1, 16), 16);
        assert_eq!(align_up(16, 16), 16);
        assert_eq!(align_up(17, 8), 24);
    }

    #[test]
    fn tiny_requests_share_the_word_bucket() {
        let word_bucket = ceil_log2(size_of::<usize>()) as usize;
        assert_eq!(bucket_index(1, 1), word_bucket);
        assert_eq!(bucket_index(size_of::<usize>(), 8), word_bucket);
    }

    #[test]
    fn bucket_grows_with_size() {
        assert_eq!(bucket_index(9, 8), 4);
        assert_eq!(bucket_index(16, 8), 4);
        assert_eq!(bucket_index(17, 8), 5);
        assert_eq!(bucket_index(1024, 8), 10);
        assert_eq!(bucket_index(1025, 8), 11);
    }

    #[test]
    fn wide_alignment_inflates_the_bucket() {
        // Alignment up to the header size costs nothing.
        assert_eq!(bucket_index(64, 16), bucket_index(64, 1));
        // Beyond it, the worst-case front padding is part of the request.
        assert_eq!(bucket_index(64, 64), bucket_index(64 + 48, 1));
    }

    #[test]
    fn payload_is_aligned_and_header_fits() {
        for align in [1_usize, 8, 16, 32, 64, 256] {
            for start in [0_usize, 16, 32, 48, 4096] {
                let payload = payload_addr(start, align);
                assert_eq!(payload % align.max(1), 0);
                assert!(payload >= start + HEADER_SIZE);
                assert_eq!((payload - HEADER_SIZE) % HEADER_ALIGN, 0);
            }
        }
    }

    #[test]
    fn worst_case_padding_always_fits_the_block() {
        // For any 16-aligned block start and any request that maps to bucket
        // `k`, the payload plus request must fit in the block's storage.
        for align in [1_usize, 8, 16, 32, 64, 128] {
            for size in [1_usize, 8, 24, 100, 1000] {
                let bucket = bucket_index(size, align);
                let total = bucket_block_size(bucket) + HEADER_SIZE;
                for start in (0..512).step_by(16) {
                    let payload = payload_addr(start, align);
                    assert!(
                        payload + size <= start + total,
                        "size {size} align {align} start {start} overflows a bucket-{bucket} block"
                    );
                }
            }
        }
    }
}
