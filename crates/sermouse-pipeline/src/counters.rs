//! Pipeline counters
//!
//! Incremented from completion callbacks, so every method is a single
//! relaxed atomic add. Values are eventually consistent; read them through
//! [`PipelineCounters::snapshot`].

use core::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

/// Counter snapshot returned by [`PipelineCounters::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CounterSnapshot {
    /// Asynchronous reads issued
    pub reads_issued: u64,
    /// Reads whose completion ran before the issuing call returned
    pub inline_completions: u64,
    /// Bytes fed to the decoder
    pub bytes_received: u64,
    /// Bytes that arrived with a parity, framing or overrun error
    pub line_errors: u64,
    /// Packets dropped by the decoder to resynchronize
    pub sync_errors: u64,
    /// Events handed to the sink
    pub events_delivered: u64,
    /// Line-event waits issued by the removal watcher
    pub waits_issued: u64,
    /// Wake-ups with no change on the watched lines
    pub spurious_line_events: u64,
    /// Read or wait failures other than cancellation
    pub io_failures: u64,
    /// Requests that completed as cancelled
    pub cancellations: u64,
}

#[derive(Debug, Default)]
pub struct PipelineCounters {
    reads_issued: AtomicU64,
    inline_completions: AtomicU64,
    bytes_received: AtomicU64,
    line_errors: AtomicU64,
    sync_errors: AtomicU64,
    events_delivered: AtomicU64,
    waits_issued: AtomicU64,
    spurious_line_events: AtomicU64,
    io_failures: AtomicU64,
    cancellations: AtomicU64,
}

impl PipelineCounters {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            reads_issued: AtomicU64::new(0),
            inline_completions: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            line_errors: AtomicU64::new(0),
            sync_errors: AtomicU64::new(0),
            events_delivered: AtomicU64::new(0),
            waits_issued: AtomicU64::new(0),
            spurious_line_events: AtomicU64::new(0),
            io_failures: AtomicU64::new(0),
            cancellations: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn inc_read_issued(&self) {
        self.reads_issued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_inline_completion(&self) {
        self.inline_completions.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_byte_received(&self) {
        self.bytes_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_line_error(&self) {
        self.line_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_sync_errors(&self, count: u64) {
        self.sync_errors.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_event_delivered(&self) {
        self.events_delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_wait_issued(&self) {
        self.waits_issued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_spurious_line_event(&self) {
        self.spurious_line_events.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_io_failure(&self) {
        self.io_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_cancellation(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            reads_issued: self.reads_issued.load(Ordering::Relaxed),
            inline_completions: self.inline_completions.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            line_errors: self.line_errors.load(Ordering::Relaxed),
            sync_errors: self.sync_errors.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            waits_issued: self.waits_issued.load(Ordering::Relaxed),
            spurious_line_events: self.spurious_line_events.load(Ordering::Relaxed),
            io_failures: self.io_failures.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
        }
    }
}
