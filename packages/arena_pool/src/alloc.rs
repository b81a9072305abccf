use std::ptr;
use std::ptr::NonNull;

/// The single-callback allocator contract that containers are parameterized
/// by.
///
/// One signature expresses allocate, reallocate, and free:
///
/// | `ptr`    | `size` | meaning |
/// |----------|--------|---------|
/// | null     | `> 0`  | allocate `size` bytes at least `align`-aligned |
/// | non-null | `> 0`  | reallocate, preserving `min(old, new)` bytes |
/// | non-null | `0`    | free; returns null |
/// | null     | `0`    | never called |
///
/// On reallocate and free the caller passes `align == 0`: the allocator
/// remembers the alignment supplied at allocation, and that alignment is in
/// force for the whole life of the pointer.
///
/// Allocation is infallible by contract; an implementation that cannot
/// satisfy a request aborts the process rather than returning null.
///
/// # Safety
///
/// Implementations must uphold the table above: returned pointers must be
/// valid for `size` bytes at the promised alignment, reallocation must
/// preserve contents, and a freed pointer must not be returned again while
/// any copy of it is live.
pub unsafe trait RawAllocator {
    /// The allocator callback. See the trait-level table.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must be a live pointer previously returned by this
    /// allocator, and must not be used after being freed or reallocated
    /// away.
    unsafe fn raw_alloc(&self, ptr: *mut u8, size: usize, align: usize) -> *mut u8;

    /// Allocates storage for `len` values of `T`.
    ///
    /// # Panics
    ///
    /// Panics if the byte count is zero or overflows.
    fn alloc_array<T>(&self, len: usize) -> NonNull<T> {
        let bytes = size_of::<T>()
            .checked_mul(len)
            .expect("array byte count overflows");
        assert!(bytes > 0, "cannot allocate a zero-byte array");

        // SAFETY: Null pointer with a positive size is the allocate form.
        let raw = unsafe { self.raw_alloc(ptr::null_mut(), bytes, align_of::<T>()) };
        NonNull::new(raw.cast()).expect("allocator broke the infallibility contract")
    }

    /// Grows or shrinks the array at `ptr` to `len` values, preserving
    /// contents up to the shorter length.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from `alloc_array::<T>` (or an equivalent call)
    /// on this allocator and must not be used again afterwards; only the
    /// returned pointer is live.
    unsafe fn realloc_array<T>(&self, ptr: NonNull<T>, len: usize) -> NonNull<T> {
        let bytes = size_of::<T>()
            .checked_mul(len)
            .expect("array byte count overflows");
        assert!(bytes > 0, "cannot reallocate to a zero-byte array");

        // SAFETY: Live pointer with a positive size is the reallocate form;
        // alignment zero defers to the stored header.
        let raw = unsafe { self.raw_alloc(ptr.as_ptr().cast(), bytes, 0) };
        NonNull::new(raw.cast()).expect("allocator broke the infallibility contract")
    }

    /// Returns the allocation at `ptr` to the allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from this allocator and must not be used again.
    unsafe fn dealloc<T>(&self, ptr: NonNull<T>) {
        // SAFETY: Live pointer with size zero is the free form.
        unsafe {
            self.raw_alloc(ptr.as_ptr().cast(), 0, 0);
        }
    }
}

// SAFETY: Delegation preserves the contract.
unsafe impl<A: RawAllocator + ?Sized> RawAllocator for &A {
    unsafe fn raw_alloc(&self, ptr: *mut u8, size: usize, align: usize) -> *mut u8 {
        // SAFETY: Forwarded contract.
        unsafe { (**self).raw_alloc(ptr, size, align) }
    }
}
