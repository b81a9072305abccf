use std::cell::UnsafeCell;
use std::ptr;

use crate::MutexGuard;

/// A condition variable over the operating system's native object.
///
/// [`wait()`](Self::wait) consumes a [`MutexGuard`], atomically releases the
/// mutex while blocking, and hands the re-acquired guard back. As with any
/// condition variable, wakeups can be spurious; callers re-check their
/// predicate in a loop.
///
/// A condition must always be paired with the same [`Mutex`](crate::Mutex).
#[derive(Debug)]
pub struct Condition {
    inner: Box<UnsafeCell<libc::pthread_cond_t>>,
}

// SAFETY: The OS condition variable is designed for cross-thread use through
// a shared reference.
unsafe impl Send for Condition {}
// SAFETY: See above.
unsafe impl Sync for Condition {}

impl Condition {
    /// Creates a new condition variable with no waiters.
    #[must_use]
    pub fn new() -> Self {
        let inner = Box::new(UnsafeCell::new(libc::PTHREAD_COND_INITIALIZER));
        // SAFETY: Freshly created, unshared; null attributes select defaults.
        unsafe {
            libc::pthread_cond_init(inner.get(), ptr::null());
        }
        Self { inner }
    }

    /// Releases the guarded mutex, blocks until signalled (or spuriously
    /// woken), and returns with the mutex re-acquired.
    pub fn wait<'a>(&self, guard: MutexGuard<'a>) -> MutexGuard<'a> {
        // SAFETY: The guard proves the calling thread holds the mutex, which
        // is what pthread_cond_wait requires; both objects outlive the call.
        unsafe {
            libc::pthread_cond_wait(self.inner.get(), guard.mutex_raw());
        }
        guard
    }

    /// Wakes one waiter, if any.
    pub fn signal(&self) {
        // SAFETY: The condition is initialized and lives as long as `self`.
        unsafe {
            libc::pthread_cond_signal(self.inner.get());
        }
    }

    /// Wakes every waiter.
    pub fn broadcast(&self) {
        // SAFETY: The condition is initialized and lives as long as `self`.
        unsafe {
            libc::pthread_cond_broadcast(self.inner.get());
        }
    }
}

impl Default for Condition {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Condition {
    fn drop(&mut self) {
        // SAFETY: Exclusive access proves no thread is blocked on the
        // condition, so it may be destroyed.
        unsafe {
            libc::pthread_cond_destroy(self.inner.get());
        }
    }
}
