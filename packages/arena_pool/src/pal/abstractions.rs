use std::fmt::Debug;

/// Bindings for the virtual-memory calls the arenas are built on.
///
/// All mapping syscalls go through this trait, enabling them to be mocked.
/// Addresses cross the boundary as plain `usize` values; the allocator layer
/// above owns the conversion to and from pointers.
///
/// The provider is infallible by contract: running out of address space is a
/// precondition violation and aborts the process, consistent with the
/// assertion-based contracts used throughout these crates.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait VirtualMemory: Debug + Send + Sync + 'static {
    /// Maps `len` bytes of committed, zero-filled, read/write memory.
    fn allocate(&self, len: usize) -> usize;

    /// Reserves `len` bytes of address space without backing it. The range
    /// is addressable only after [`commit()`](Self::commit).
    fn reserve(&self, len: usize) -> usize;

    /// Promotes `len` bytes starting at `addr` (within a prior reservation)
    /// to read/write. Rounds outward to page boundaries.
    fn commit(&self, addr: usize, len: usize);

    /// Unmaps `len` bytes starting at `addr`. Rounds outward to page
    /// boundaries.
    fn release(&self, addr: usize, len: usize);
}
