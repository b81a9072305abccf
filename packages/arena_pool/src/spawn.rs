use std::ptr;

use crate::pool::nalloc;

/// Starts a detached, fire-and-forget thread running `f`.
///
/// There is no handle and no join: a thread that must be awaited signals
/// through a [`Semaphore`](crate::Semaphore) (or any other primitive) of its
/// own. The closure record travels through the pool allocator and is freed
/// by the spawned thread before `f` runs.
///
/// If the OS cannot start a thread the closure is dropped and the error is
/// discarded.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use arena_pool::{Semaphore, spawn_detached};
///
/// let done = Arc::new(Semaphore::new());
///
/// for _ in 0..4 {
///     let done = Arc::clone(&done);
///     spawn_detached(move || done.post(1));
/// }
///
/// done.wait(4);
/// ```
pub fn spawn_detached<F>(f: F)
where
    F: FnOnce() + Send + 'static,
{
    // A zero-sized closure still needs a unique record to carry through the
    // allocator, hence the one-byte floor.
    let size = size_of::<F>().max(1);
    // SAFETY: Null pointer with positive size is the allocate form.
    let record = unsafe { nalloc(ptr::null_mut(), size, align_of::<F>()) }.cast::<F>();
    // SAFETY: Freshly allocated, properly aligned storage for one `F`.
    unsafe {
        record.write(f);
    }

    // SAFETY: Zeroed attribute storage is what pthread_attr_init expects to
    // overwrite; the detach state makes the thread clean itself up.
    let result = unsafe {
        let mut attributes: libc::pthread_attr_t = std::mem::zeroed();
        libc::pthread_attr_init(&mut attributes);
        libc::pthread_attr_setdetachstate(&mut attributes, libc::PTHREAD_CREATE_DETACHED);

        let mut thread_id: libc::pthread_t = std::mem::zeroed();
        let result = libc::pthread_create(
            &mut thread_id,
            &attributes,
            trampoline::<F>,
            record.cast(),
        );
        libc::pthread_attr_destroy(&mut attributes);
        result
    };

    if result != 0 {
        // The thread never started, so the record is still ours to unwind.
        // SAFETY: We wrote `f` into the record above and nobody else saw it.
        unsafe {
            drop(record.read());
            nalloc(record.cast(), 0, 0);
        }
    }
}

extern "C" fn trampoline<F>(record: *mut libc::c_void) -> *mut libc::c_void
where
    F: FnOnce() + Send + 'static,
{
    let record = record.cast::<F>();
    // SAFETY: `spawn_detached` wrote exactly one `F` here and transferred
    // ownership to this thread.
    let f = unsafe { record.read() };
    // Free the record before running the closure, so a long-lived thread
    // does not pin a pool block.
    // SAFETY: Live pool pointer; free form; `f` has been moved out.
    unsafe {
        nalloc(record.cast(), 0, 0);
    }
    f();
    ptr::null_mut()
}
