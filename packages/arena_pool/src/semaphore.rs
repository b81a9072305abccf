use std::cell::UnsafeCell;

use crate::{Condition, Mutex};

/// A counting semaphore composed from a [`Mutex`] and a [`Condition`].
///
/// The composite construction is what gives [`wait()`](Self::wait) its batch
/// form: a single call sleeps until `n` permits are available and takes them
/// all, rather than decrementing one permit `n` times.
///
/// # Example
///
/// ```rust
/// use arena_pool::Semaphore;
///
/// let semaphore = Semaphore::new();
/// semaphore.post(3);
/// semaphore.wait(2);
/// semaphore.wait(1);
/// ```
#[derive(Debug)]
pub struct Semaphore {
    mutex: Mutex,
    available: Condition,
    count: UnsafeCell<usize>,
}

// SAFETY: `count` is only touched while `mutex` is held.
unsafe impl Send for Semaphore {}
// SAFETY: See above.
unsafe impl Sync for Semaphore {}

impl Semaphore {
    /// Creates a semaphore with zero permits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mutex: Mutex::new(),
            available: Condition::new(),
            count: UnsafeCell::new(0),
        }
    }

    /// Blocks until at least `amount` permits are available, then takes all
    /// of them in one step.
    pub fn wait(&self, amount: usize) {
        let mut guard = self.mutex.lock();
        loop {
            // SAFETY: The guard serializes every access to `count`.
            let permits = unsafe { *self.count.get() };
            if permits >= amount {
                break;
            }
            guard = self.available.wait(guard);
        }
        // SAFETY: Still holding the guard.
        unsafe {
            *self.count.get() -= amount;
        }
        drop(guard);
    }

    /// Adds `amount` permits and wakes waiters: one for a single permit, all
    /// of them for a batch (any of which might now be satisfiable).
    pub fn post(&self, amount: usize) {
        let guard = self.mutex.lock();
        // SAFETY: The guard serializes every access to `count`.
        unsafe {
            *self.count.get() += amount;
        }
        if amount == 1 {
            self.available.signal();
        } else {
            self.available.broadcast();
        }
        drop(guard);
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new()
    }
}
