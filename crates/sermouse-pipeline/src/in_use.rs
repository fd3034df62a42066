//! In-use reference count for safe teardown
//!
//! Every asynchronous request carries an [`InUseGuard`] into its completion.
//! The guard is released when the completion returns, and teardown blocks in
//! [`InUseCount::wait_idle`] until none are left.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct InUseCount {
    count: AtomicUsize,
    lock: Mutex<()>,
    idle: Condvar,
}

impl InUseCount {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn acquire(self: &Arc<Self>) -> InUseGuard {
        self.count.fetch_add(1, Ordering::AcqRel);
        InUseGuard {
            owner: Arc::clone(self),
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Blocks until the count reaches zero or `timeout` passes.
    ///
    /// Returns `true` once idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock();
        while self.count() != 0 {
            if self.idle.wait_until(&mut guard, deadline).timed_out() {
                return self.count() == 0;
            }
        }
        true
    }

    fn release(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            // Taking the lock orders this wake-up after a waiter's check.
            let _guard = self.lock.lock();
            self.idle.notify_all();
        }
    }
}

/// One outstanding request. Dropping it releases the reference.
#[derive(Debug)]
pub struct InUseGuard {
    owner: Arc<InUseCount>,
}

impl Drop for InUseGuard {
    fn drop(&mut self) {
        self.owner.release();
    }
}
