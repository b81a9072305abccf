use std::ptr;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicPtr, Ordering};

use static_assertions::const_assert;
use tagged_cas::TaggedPtr;

use crate::alloc::RawAllocator;
use crate::arena::Arena;
use crate::block::{
    BUCKET_COUNT, BlockHeader, HEADER_ALIGN, HEADER_SIZE, bucket_block_size, bucket_index,
    header_ptr, payload_addr,
};
use crate::census;

/// A free block's storage doubles as its free-list link: the first word of
/// the block is reinterpreted as the pointer to the next free block in the
/// same bucket.
#[repr(transparent)]
struct FreeBlock {
    next: AtomicPtr<FreeBlock>,
}

// The link must fit in the smallest block and within the header's alignment
// so the same storage can serve both roles.
const_assert!(align_of::<AtomicPtr<FreeBlock>>() <= align_of::<BlockHeader>());
const_assert!(size_of::<AtomicPtr<FreeBlock>>() <= size_of::<usize>());

/// One lock-free LIFO free-list head per size-class bucket, shared by every
/// thread in the process.
static FREE_LISTS: [TaggedPtr<FreeBlock>; BUCKET_COUNT] =
    [const { TaggedPtr::null() }; BUCKET_COUNT];

/// The arena that backs every pool block. Blocks are carved here once and
/// recycled through the free-lists forever; the arena is never unmapped.
static BACKING: LazyLock<Arena> = LazyLock::new(Arena::new);

/// Carves a fresh block for `bucket` out of the backing arena.
fn carve_block(bucket: usize) -> usize {
    let total = bucket_block_size(bucket) + HEADER_SIZE;
    // SAFETY: Null pointer with positive size is the allocate form.
    let block = unsafe { BACKING.alloc(ptr::null_mut(), total, HEADER_ALIGN) };
    census::note_carve(bucket);
    block as usize
}

/// Pops a block from `bucket`'s free-list, carving a fresh one when the list
/// is empty.
fn pop_block(bucket: usize) -> usize {
    let head = &FREE_LISTS[bucket];
    let mut observed = head.load();
    loop {
        let top = observed.ptr();
        if top.is_null() {
            return carve_block(bucket);
        }
        // SAFETY: Pool blocks are never unmapped, so `top` is always
        // readable. If another thread popped and recycled it since our
        // snapshot, the value read here is stale garbage, but the tagged
        // swap below fails in that case and the garbage is discarded.
        let next = unsafe { (*top).next.load(Ordering::Relaxed) };
        if head.try_swap(&mut observed, next) {
            census::note_pop(bucket);
            return top as usize;
        }
    }
}

/// Pushes the block starting at `base` onto `bucket`'s free-list.
fn push_block(bucket: usize, base: usize) {
    let node = base as *mut FreeBlock;
    let head = &FREE_LISTS[bucket];
    let mut observed = head.load();
    loop {
        // SAFETY: The block is ours until the swap publishes it; its first
        // word is writable pool storage.
        unsafe {
            (*node).next.store(observed.ptr(), Ordering::Relaxed);
        }
        if head.try_swap(&mut observed, node) {
            census::note_push(bucket);
            return;
        }
    }
}

/// Claims a block in `bucket`, lays the header out so the payload is
/// `align`-aligned, and returns the payload.
fn take_block(bucket: usize, size: usize, align: usize) -> *mut u8 {
    let base = pop_block(bucket);
    let payload = payload_addr(base, align);
    debug_assert!(payload + size <= base + bucket_block_size(bucket) + HEADER_SIZE);

    let offset = payload - HEADER_SIZE - base;
    // SAFETY: The block is exclusively ours and sized for header + payload.
    unsafe {
        header_ptr(payload).write(BlockHeader {
            size,
            align: u32::try_from(align).expect("alignment does not fit the header"),
            base_offset: u32::try_from(offset).expect("padding does not fit the header"),
        });
    }
    payload as *mut u8
}

/// The process-wide size-class pool allocator behind the shared allocator
/// signature (see [`RawAllocator`] for the `ptr`/`size` forms).
///
/// Blocks live in power-of-two size classes. Freeing pushes a block onto its
/// bucket's lock-free free-list; allocating pops one, falling back to
/// carving fresh storage from a process-global arena. Reallocating within
/// the same bucket is an in-place size update.
///
/// # Panics
///
/// Panics if `align` is not a power of two on an allocation, or if the
/// backing arena's reservation is exhausted.
///
/// # Safety
///
/// A non-null `ptr` must be live storage previously returned by this
/// allocator, and must not be used after being freed or reallocated away.
pub unsafe fn nalloc(ptr: *mut u8, size: usize, align: usize) -> *mut u8 {
    if ptr.is_null() {
        assert!(align.is_power_of_two(), "alignment must be a power of two");
        return take_block(bucket_index(size, align), size, align);
    }

    // SAFETY: A live payload pointer always has its header directly in
    // front of it.
    let header = unsafe { &mut *header_ptr(ptr as usize) };
    // Alignment must stay what it was when the block was first allocated.
    let align = header.align as usize;
    let bucket = bucket_index(header.size, align);
    let base = (ptr as usize - HEADER_SIZE) - header.base_offset as usize;

    if size == 0 {
        push_block(bucket, base);
        return ptr::null_mut();
    }

    let new_bucket = bucket_index(size, align);
    if new_bucket <= bucket {
        // Shrinking (or padding slack) keeps the block; only the recorded
        // size changes.
        header.size = size;
        return ptr;
    }

    let grown = take_block(new_bucket, size, align);
    // SAFETY: Source and destination are distinct blocks; the source holds
    // `header.size` initialized bytes.
    unsafe {
        ptr::copy_nonoverlapping(ptr, grown, header.size);
    }
    push_block(bucket, base);
    grown
}

/// A zero-sized handle routing the [`RawAllocator`] contract to the
/// process-wide pool ([`nalloc`]).
///
/// This is the default allocator for containers.
///
/// # Example
///
/// ```rust
/// use arena_pool::{PoolAlloc, RawAllocator};
///
/// let values: std::ptr::NonNull<u32> = PoolAlloc.alloc_array(8);
/// // SAFETY: Freshly allocated storage for eight values.
/// unsafe { values.as_ptr().write_bytes(0, 8) };
/// // SAFETY: Live pool pointer, not used again.
/// unsafe { PoolAlloc.dealloc(values) };
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolAlloc;

// SAFETY: `nalloc` upholds the contract; the pool remembers alignment in
// each block's header and never unmaps recycled storage.
unsafe impl RawAllocator for PoolAlloc {
    unsafe fn raw_alloc(&self, ptr: *mut u8, size: usize, align: usize) -> *mut u8 {
        // SAFETY: Forwarded contract.
        unsafe { nalloc(ptr, size, align) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_aligned_to_request() {
        for align in [1_usize, 4, 16, 64, 256] {
            // SAFETY: Allocate form.
            let ptr = unsafe { nalloc(ptr::null_mut(), 40, align) };
            assert_eq!(ptr as usize % align, 0);
            // SAFETY: Live pool pointer, freed once.
            unsafe { nalloc(ptr, 0, 0) };
        }
    }

    #[test]
    fn free_then_reallocate_round_trips_contents() {
        // SAFETY: Allocate form.
        let ptr = unsafe { nalloc(ptr::null_mut(), 64, 8) };
        // SAFETY: Our block.
        unsafe { ptr.write_bytes(0x7E, 64) };

        // SAFETY: Live pointer growing to a larger bucket.
        let grown = unsafe { nalloc(ptr, 300, 0) };
        assert_ne!(grown, ptr);
        for offset in [0_usize, 31, 63] {
            // SAFETY: Copied contents are readable in the new block.
            assert_eq!(unsafe { grown.add(offset).read() }, 0x7E);
        }
        // SAFETY: Live pointer, freed once.
        unsafe { nalloc(grown, 0, 0) };
    }

    #[test]
    fn shrinking_realloc_keeps_the_pointer() {
        // SAFETY: Allocate form.
        let ptr = unsafe { nalloc(ptr::null_mut(), 1000, 8) };
        // SAFETY: Live pointer shrinking within its bucket.
        let shrunk = unsafe { nalloc(ptr, 500, 0) };
        assert_eq!(shrunk, ptr);
        // Growing back within the original bucket also stays put.
        // SAFETY: Live pointer.
        let regrown = unsafe { nalloc(shrunk, 1024, 0) };
        assert_eq!(regrown, ptr);
        // SAFETY: Live pointer, freed once.
        unsafe { nalloc(regrown, 0, 0) };
    }

    #[test]
    fn same_bucket_realloc_keeps_the_pointer() {
        // 600 and 900 both land in the 1024-byte bucket.
        // SAFETY: Allocate form.
        let ptr = unsafe { nalloc(ptr::null_mut(), 600, 8) };
        // SAFETY: Live pointer.
        let resized = unsafe { nalloc(ptr, 900, 0) };
        assert_eq!(resized, ptr);
        // SAFETY: Live pointer, freed once.
        unsafe { nalloc(resized, 0, 0) };
    }

    #[test]
    fn wide_alignment_survives_recycling() {
        // SAFETY: Allocate form.
        let first = unsafe { nalloc(ptr::null_mut(), 64, 128) };
        assert_eq!(first as usize % 128, 0);
        // SAFETY: Live pointer, freed once.
        unsafe { nalloc(first, 0, 0) };

        // The recycled block must satisfy a narrow request too, and a fresh
        // wide request must again come back aligned.
        // SAFETY: Allocate form.
        let narrow = unsafe { nalloc(ptr::null_mut(), 64 + 112, 8) };
        // SAFETY: Allocate form.
        let wide = unsafe { nalloc(ptr::null_mut(), 64, 128) };
        assert_eq!(wide as usize % 128, 0);
        // SAFETY: Live pointers, freed once each.
        unsafe {
            nalloc(narrow, 0, 0);
            nalloc(wide, 0, 0);
        }
    }

    #[test]
    fn typed_helpers_round_trip() {
        let values: ptr::NonNull<u64> = PoolAlloc.alloc_array(10);
        // SAFETY: Freshly allocated storage for ten values.
        unsafe {
            for i in 0..10 {
                values.as_ptr().add(i).write(i as u64);
            }
        }

        // SAFETY: Live array pointer; old pointer unused afterwards.
        let grown = unsafe { PoolAlloc.realloc_array(values, 1000) };
        // SAFETY: Contents were preserved.
        unsafe {
            for i in 0..10 {
                assert_eq!(grown.as_ptr().add(i).read(), i as u64);
            }
        }
        // SAFETY: Live array pointer, not used again.
        unsafe { PoolAlloc.dealloc(grown) };
    }
}
