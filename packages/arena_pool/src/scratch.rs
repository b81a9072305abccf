use std::sync::LazyLock;

use crate::alloc::RawAllocator;
use crate::arena::Arena;

/// The process-global scratch arena. Lives for the whole process; reclaimed
/// only by [`reset_scratch()`].
static SCRATCH: LazyLock<Arena> = LazyLock::new(Arena::new);

/// Allocates from the process-global scratch arena through the shared
/// allocator signature (see [`RawAllocator`] for the `ptr`/`size` forms).
///
/// Intended for per-frame or per-request transients that are thrown away in
/// bulk: individual frees are no-ops, and [`reset_scratch()`] reclaims
/// everything at once. Concurrent allocation from any number of threads is
/// fine.
///
/// # Safety
///
/// A non-null `ptr` must be live scratch storage, not used after being
/// freed, reallocated away, or invalidated by a reset.
pub unsafe fn scratch_alloc(ptr: *mut u8, size: usize, align: usize) -> *mut u8 {
    // SAFETY: Forwarded contract.
    unsafe { SCRATCH.alloc(ptr, size, align) }
}

/// Rewinds the scratch arena, invalidating every scratch allocation at once.
///
/// # Safety
///
/// This is a caller-coordinated global event: no thread may be allocating
/// from scratch concurrently, and no scratch pointer from before the reset
/// may be used after it.
pub unsafe fn reset_scratch() {
    // SAFETY: The caller vouches for process-wide quiescence.
    unsafe { SCRATCH.reset_unsynced() }
}

/// A zero-sized handle routing the [`RawAllocator`] contract to the
/// process-global scratch arena.
///
/// Handy for filling a container with transients and abandoning the storage
/// wholesale; the container's own free becomes a no-op.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScratchAlloc;

// SAFETY: The scratch arena upholds the contract exactly as `Arena` does.
unsafe impl RawAllocator for ScratchAlloc {
    unsafe fn raw_alloc(&self, ptr: *mut u8, size: usize, align: usize) -> *mut u8 {
        // SAFETY: Forwarded contract.
        unsafe { scratch_alloc(ptr, size, align) }
    }
}
