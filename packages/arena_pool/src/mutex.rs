use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ptr;

/// A non-recursive mutual-exclusion lock over the operating system's native
/// mutex.
///
/// Locking returns a [`MutexGuard`] that releases the lock when dropped. The
/// lock protects no data of its own; pair it with an [`UnsafeCell`] (or use
/// it purely for critical-section ordering) as the call site requires.
///
/// The OS mutex object is boxed so its address never changes, which the
/// native object requires once it has been used.
///
/// # Example
///
/// ```rust
/// use arena_pool::Mutex;
///
/// let mutex = Mutex::new();
///
/// let guard = mutex.lock();
/// assert!(mutex.try_lock().is_none());
/// drop(guard);
/// assert!(mutex.try_lock().is_some());
/// ```
#[derive(Debug)]
pub struct Mutex {
    inner: Box<UnsafeCell<libc::pthread_mutex_t>>,
}

// SAFETY: The OS mutex is the synchronization primitive itself; concurrent
// lock/unlock through a shared reference is its entire purpose.
unsafe impl Send for Mutex {}
// SAFETY: See above.
unsafe impl Sync for Mutex {}

impl Mutex {
    /// Creates a new unlocked mutex.
    ///
    /// Initialization cannot fail on the supported targets; the OS result is
    /// discarded, consistent with the assertion contracts used throughout.
    #[must_use]
    pub fn new() -> Self {
        let inner = Box::new(UnsafeCell::new(libc::PTHREAD_MUTEX_INITIALIZER));
        // SAFETY: The object is freshly created, not yet shared, and the
        // null attribute pointer selects the default (non-recursive) type.
        unsafe {
            libc::pthread_mutex_init(inner.get(), ptr::null());
        }
        Self { inner }
    }

    /// Blocks until the lock is acquired.
    pub fn lock(&self) -> MutexGuard<'_> {
        // SAFETY: The mutex is initialized and lives as long as `self`.
        unsafe {
            libc::pthread_mutex_lock(self.inner.get());
        }
        MutexGuard {
            mutex: self,
            _not_send: PhantomData,
        }
    }

    /// Acquires the lock only if it is free, returning `Some` guard on
    /// acquisition and `None` if another thread holds it.
    pub fn try_lock(&self) -> Option<MutexGuard<'_>> {
        // SAFETY: The mutex is initialized and lives as long as `self`.
        let acquired = unsafe { libc::pthread_mutex_trylock(self.inner.get()) } == 0;
        acquired.then_some(MutexGuard {
            mutex: self,
            _not_send: PhantomData,
        })
    }

    pub(crate) fn raw(&self) -> *mut libc::pthread_mutex_t {
        self.inner.get()
    }
}

impl Default for Mutex {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Mutex {
    fn drop(&mut self) {
        // SAFETY: Exclusive access proves no guard is outstanding, so the
        // mutex is unlocked and may be destroyed.
        unsafe {
            libc::pthread_mutex_destroy(self.inner.get());
        }
    }
}

/// Proof that the calling thread holds a [`Mutex`]; unlocks on drop.
///
/// Not `Send`: the OS requires the locking thread to be the one that
/// unlocks.
#[derive(Debug)]
pub struct MutexGuard<'a> {
    mutex: &'a Mutex,
    _not_send: PhantomData<*const ()>,
}

impl MutexGuard<'_> {
    pub(crate) fn mutex_raw(&self) -> *mut libc::pthread_mutex_t {
        self.mutex.raw()
    }
}

impl Drop for MutexGuard<'_> {
    fn drop(&mut self) {
        // SAFETY: This guard proves the current thread holds the lock.
        unsafe {
            libc::pthread_mutex_unlock(self.mutex.raw());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use super::*;

    #[test]
    fn lock_and_unlock() {
        let mutex = Mutex::new();
        drop(mutex.lock());
        drop(mutex.lock());
    }

    #[test]
    fn try_lock_reports_acquisition() {
        let mutex = Mutex::new();

        let guard = mutex.lock();
        assert!(mutex.try_lock().is_none());
        drop(guard);

        let guard = mutex.try_lock();
        assert!(guard.is_some());
    }

    #[test]
    fn try_lock_fails_while_other_thread_holds_lock() {
        let mutex = Arc::new(Mutex::new());
        let release = Arc::new(AtomicBool::new(false));

        let handle = {
            let mutex = Arc::clone(&mutex);
            let release = Arc::clone(&release);
            thread::spawn(move || {
                let _guard = mutex.lock();
                while !release.load(Ordering::Acquire) {
                    thread::yield_now();
                }
            })
        };

        // Wait until the spawned thread certainly holds the lock.
        while mutex.try_lock().is_some() {
            thread::yield_now();
        }

        assert!(mutex.try_lock().is_none());
        release.store(true, Ordering::Release);
        handle.join().unwrap();
        assert!(mutex.try_lock().is_some());
    }
}
