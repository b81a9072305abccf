use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::Mutex;
use crate::alloc::RawAllocator;
use crate::block::{BlockHeader, header_ptr, payload_addr};
use crate::pal::{VirtualMemory, VmFacade};

/// Address space reserved per arena. Committed memory grows into the
/// reservation on demand and the reservation itself is never moved, so every
/// pointer handed out stays valid until the arena is dropped.
#[cfg(target_pointer_width = "64")]
pub const ARENA_RESERVATION: usize = 1 << 40; // 1 TiB
/// Address space reserved per arena.
#[cfg(target_pointer_width = "32")]
pub const ARENA_RESERVATION: usize = 100 << 20; // 100 MiB

/// Committed memory grows in units of `reservation >> GROWTH_SHIFT`, keeping
/// the commit syscall rare without committing the world up front.
const GROWTH_SHIFT: u32 = 13;

/// A bump allocator over a large virtual-memory reservation.
///
/// Allocation is lock-free: the bump mark advances by compare-and-swap, and
/// a mutex is taken only on the rare path where the mark crosses the
/// committed frontier and more pages must be committed. Individual frees are
/// no-ops; memory is reclaimed in bulk by [`reset()`](Self::reset) or by
/// dropping the arena.
///
/// Reallocating the most recent allocation resizes it in place; any other
/// reallocation copies to a fresh position at the mark.
///
/// # Example
///
/// ```rust
/// use arena_pool::{Arena, RawAllocator};
///
/// let arena = Arena::new();
///
/// let values: std::ptr::NonNull<u64> = arena.alloc_array(4);
/// // SAFETY: Freshly allocated storage for four values.
/// unsafe { values.as_ptr().write_bytes(0, 4) };
///
/// // Arena frees are no-ops; the memory is reclaimed when the arena drops.
/// unsafe { arena.dealloc(values) };
/// ```
#[derive(Debug)]
pub struct Arena {
    base: usize,
    reservation: usize,
    quantum: usize,
    /// Current bump position (an address within the reservation).
    mark: AtomicUsize,
    /// End of the committed range. Never decreases.
    capacity: AtomicUsize,
    grow: Mutex,
    vm: VmFacade,
}

impl Arena {
    /// Reserves the full address range for a new arena. Nothing is committed
    /// until the first allocation needs it.
    #[must_use]
    pub fn new() -> Self {
        Self::with_vm(VmFacade::target(), ARENA_RESERVATION)
    }

    fn with_vm(vm: VmFacade, reservation: usize) -> Self {
        let quantum = (reservation >> GROWTH_SHIFT).max(1);
        let base = vm.reserve(reservation);
        Self {
            base,
            reservation,
            quantum,
            mark: AtomicUsize::new(base),
            capacity: AtomicUsize::new(base),
            grow: Mutex::new(),
            vm,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_mock_vm(vm: crate::pal::MockVirtualMemory, reservation: usize) -> Self {
        Self::with_vm(VmFacade::from_mock(vm), reservation)
    }

    /// Bytes currently spanned by allocations (base to mark).
    #[must_use]
    pub fn used(&self) -> usize {
        self.mark.load(Ordering::SeqCst) - self.base
    }

    /// Bytes of the reservation currently committed.
    #[must_use]
    pub fn committed(&self) -> usize {
        self.capacity.load(Ordering::Acquire) - self.base
    }

    /// Allocates, reallocates, or frees through the shared allocator
    /// signature.
    ///
    /// - null `ptr`, `size > 0`: allocate `size` bytes at `align`.
    /// - live `ptr`, `size > 0`: reallocate; the stored alignment is reused
    ///   and `align` is ignored. Contents are preserved up to the shorter of
    ///   the old and new sizes.
    /// - live `ptr`, `size == 0`: free (a no-op here); returns null.
    ///
    /// # Panics
    ///
    /// Panics if the reservation is exhausted.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be the most recent value returned by this
    /// arena for that allocation, and must not be used after being passed
    /// with `size == 0` or reallocated away.
    pub unsafe fn alloc(&self, ptr: *mut u8, size: usize, align: usize) -> *mut u8 {
        if size == 0 {
            return ptr::null_mut();
        }

        let mut align = align;
        let mut old_size = 0;
        if !ptr.is_null() {
            // SAFETY: A live payload pointer always has its header directly
            // in front of it.
            let header = unsafe { &*header_ptr(ptr as usize) };
            align = header.align as usize;
            old_size = header.size;
        }
        assert!(align.is_power_of_two(), "alignment must be a power of two");

        let mut old_mark = self.mark.load(Ordering::SeqCst);
        let payload = loop {
            // Reallocating the block at the tip just moves the mark.
            let at_tip = !ptr.is_null() && ptr as usize == old_mark - old_size;
            let payload = if at_tip {
                ptr as usize
            } else {
                payload_addr(old_mark, align)
            };
            let new_mark = payload + size;
            assert!(
                new_mark <= self.base + self.reservation,
                "arena reservation of {} bytes exhausted",
                self.reservation
            );

            match self.mark.compare_exchange_weak(
                old_mark,
                new_mark,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    self.ensure_committed(new_mark);
                    break payload;
                }
                Err(actual) => old_mark = actual,
            }
        };

        let header = header_ptr(payload);
        // SAFETY: The mark advance claimed [payload - HEADER_SIZE, payload +
        // size) exclusively and ensure_committed made it writable.
        unsafe {
            header.write(BlockHeader {
                size,
                align: u32::try_from(align).expect("alignment does not fit the header"),
                base_offset: 0,
            });
        }

        if !ptr.is_null() && payload != ptr as usize {
            // A shrinking move must not copy beyond the bytes the new mark
            // claimed.
            let preserved = old_size.min(size);
            // SAFETY: Old and new ranges are distinct claims on the arena;
            // the old block holds at least `preserved` readable bytes and
            // the new block was claimed for at least that many.
            unsafe {
                ptr::copy_nonoverlapping(ptr, payload as *mut u8, preserved);
            }
        }

        payload as *mut u8
    }

    /// Commits pages (under the grow mutex, double-checked) until the
    /// committed frontier covers `new_mark`.
    fn ensure_committed(&self, new_mark: usize) {
        if new_mark <= self.capacity.load(Ordering::Acquire) {
            return;
        }

        let _guard = self.grow.lock();
        let committed = self.capacity.load(Ordering::Relaxed);
        if new_mark > committed {
            let needed = new_mark - self.base;
            let rounded = needed
                .next_multiple_of(self.quantum)
                .min(self.reservation);
            let new_capacity = self.base + rounded;
            self.vm.commit(committed, new_capacity - committed);
            // Publish only after the pages exist: an allocator that observes
            // `new_mark <= capacity` may touch the memory immediately.
            self.capacity.store(new_capacity, Ordering::Release);
        }
    }

    /// Rewinds the mark to the start of the reservation, invalidating every
    /// allocation at once. Committed pages are retained for reuse.
    pub fn reset(&mut self) {
        // SAFETY: Exclusive access rules out concurrent allocation.
        unsafe { self.reset_unsynced() }
    }

    /// [`reset()`](Self::reset) through a shared reference.
    ///
    /// # Safety
    ///
    /// No other thread may be allocating from the arena, and no pointer
    /// previously returned may be used again.
    pub(crate) unsafe fn reset_unsynced(&self) {
        self.mark.store(self.base, Ordering::SeqCst);
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.vm.release(self.base, self.reservation);
    }
}

// SAFETY: `alloc` upholds the allocator contract: fresh blocks are carved by
// the CAS loop above, reallocation preserves contents, and the stored header
// keeps the original alignment.
unsafe impl RawAllocator for Arena {
    unsafe fn raw_alloc(&self, ptr: *mut u8, size: usize, align: usize) -> *mut u8 {
        // SAFETY: Forwarded contract.
        unsafe { self.alloc(ptr, size, align) }
    }
}
