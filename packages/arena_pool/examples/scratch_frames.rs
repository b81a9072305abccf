//! Per-frame scratch usage: allocate freely inside a frame, reclaim
//! everything with one reset between frames.

use std::ptr;

use arena_pool::{reset_scratch, scratch_alloc};

fn main() {
    for frame in 0..3_u8 {
        // Build a throwaway buffer for this frame.
        // SAFETY: Allocate form.
        let buffer = unsafe { scratch_alloc(ptr::null_mut(), 1024, 16) };
        // SAFETY: Freshly allocated scratch storage.
        unsafe {
            buffer.write_bytes(frame, 1024);
        }
        println!("frame {frame}: scratch buffer at {buffer:p}");

        // End of frame: every scratch pointer is abandoned at once.
        // SAFETY: Single-threaded example; no scratch pointer survives.
        unsafe { reset_scratch() };
    }
}
