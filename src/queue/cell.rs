// Unless explicitly stated otherwise all files in this repository are licensed
// under the MIT/Apache-2.0 License, at your convenience
//
//! The atomic state cell.
//!
//! This is glue over an external primitive, not something this crate
//! re-implements: a [`parking_lot::Mutex`] already gives us "atomically
//! replace the value with a function of the old value, then run a deferred
//! action." The entire surface this module owns is the `modify` method
//! below; everything else is `parking_lot`'s.

use parking_lot::Mutex;

pub(crate) struct AtomicCell<T> {
    inner: Mutex<T>,
}

impl<T> AtomicCell<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Runs `f` against the current state under the lock, replaces the state
    /// with whatever `f` leaves behind, and returns the action `f` computed.
    ///
    /// The lock is never held across an `.await` point: `f` is a plain
    /// synchronous closure, and the returned action is only ever run by the
    /// caller after this method (and therefore the lock) has returned.
    pub(crate) fn modify<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }
}
