//! Polling for conditions set by completions on other threads.

use std::thread;
use std::time::{Duration, Instant};

/// Polls `condition` until it holds or `timeout` passes.
///
/// Returns the last value of `condition`.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_wait_until_sees_other_thread() {
        let flag = Arc::new(AtomicBool::new(false));
        let setter = Arc::clone(&flag);
        let handle = thread::spawn(move || setter.store(true, Ordering::SeqCst));
        assert!(wait_until(Duration::from_secs(5), || flag.load(Ordering::SeqCst)));
        assert!(handle.join().is_ok());
    }

    #[test]
    fn test_wait_until_times_out() {
        assert!(!wait_until(Duration::from_millis(5), || false));
    }
}
