//! Free-list recycling order. Kept to a single test so no other allocation
//! in the process can slip between the free and the re-allocation.

use std::ptr;

use arena_pool::nalloc;

#[test]
fn freed_block_is_reused_first() {
    // An unusual size keeps this bucket private to the test.
    const SIZE: usize = 5000;

    // SAFETY: Allocate form.
    let first = unsafe { nalloc(ptr::null_mut(), SIZE, 8) };
    // SAFETY: Live pool pointer, freed once.
    unsafe { nalloc(first, 0, 0) };

    // LIFO: the block that just came back is the first one handed out.
    // SAFETY: Allocate form.
    let second = unsafe { nalloc(ptr::null_mut(), SIZE, 8) };
    assert_eq!(second, first);

    // And the chain holds one level deeper.
    // SAFETY: Allocate form.
    let third = unsafe { nalloc(ptr::null_mut(), SIZE, 8) };
    assert_ne!(third, second);

    // SAFETY: Live pool pointers, freed once each.
    unsafe {
        nalloc(second, 0, 0);
        nalloc(third, 0, 0);
    }

    // SAFETY: Allocate form.
    let fourth = unsafe { nalloc(ptr::null_mut(), SIZE, 8) };
    assert_eq!(fourth, third, "most recently freed block pops first");
    // SAFETY: Live pool pointer, freed once.
    unsafe { nalloc(fourth, 0, 0) };
}
