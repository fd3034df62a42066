//! Per-device shared state
//!
//! One [`DeviceContext`] lives behind an `Arc` for each attached port. The
//! read pump, the removal watcher and the lifecycle owner all hold clones;
//! completions hold one more for as long as their request is outstanding.
//! Fields touched from completion context are atomics. The decoder sits
//! behind a mutex that is only taken by the pump while it feeds a byte and
//! by the lifecycle owner while the pump is stopped.

use parking_lot::Mutex;
use sermouse_protocol::{Decoder, ProtocolKind};
use sermouse_transport::{LineStatus, SerialTransport, Verbosity};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use tracing::warn;

use crate::counters::PipelineCounters;
use crate::in_use::InUseCount;
use crate::interlock::IssueInterlock;
use crate::sink::InputSink;

/// Why the pipeline gave up on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// A watched status line changed from its baseline.
    LineStatusChanged,
    /// A read failed with something other than cancellation.
    ReadFailed,
    /// A line-event wait or status query failed.
    WatchFailed,
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            RemovalReason::LineStatusChanged => "line status changed",
            RemovalReason::ReadFailed => "read failed",
            RemovalReason::WatchFailed => "line watch failed",
        };
        f.write_str(text)
    }
}

pub struct DeviceContext {
    pub(crate) transport: Arc<dyn SerialTransport>,
    pub(crate) sink: Arc<dyn InputSink>,
    pub(crate) verbosity: Verbosity,
    pub(crate) decoder: Mutex<Decoder>,
    pub(crate) counters: PipelineCounters,
    pub(crate) in_use: Arc<InUseCount>,
    pub(crate) read_interlock: IssueInterlock,
    pub(crate) wait_interlock: IssueInterlock,
    enable_count: AtomicU32,
    started: AtomicBool,
    removed: AtomicBool,
    removal_notified: AtomicBool,
    pub(crate) pump_active: AtomicBool,
    pub(crate) watcher_active: AtomicBool,
    removal_baseline: AtomicU8,
    watch_mask: AtomicU8,
}

impl DeviceContext {
    pub fn new(
        transport: Arc<dyn SerialTransport>,
        sink: Arc<dyn InputSink>,
        verbosity: Verbosity,
    ) -> Arc<Self> {
        Arc::new(Self {
            transport,
            sink,
            verbosity,
            decoder: Mutex::new(Decoder::new(ProtocolKind::Mp)),
            counters: PipelineCounters::new(),
            in_use: InUseCount::new(),
            read_interlock: IssueInterlock::new(),
            wait_interlock: IssueInterlock::new(),
            enable_count: AtomicU32::new(0),
            started: AtomicBool::new(false),
            removed: AtomicBool::new(false),
            removal_notified: AtomicBool::new(false),
            pump_active: AtomicBool::new(false),
            watcher_active: AtomicBool::new(false),
            removal_baseline: AtomicU8::new(0),
            watch_mask: AtomicU8::new(0),
        })
    }

    /// Clears per-attach state. Only valid while nothing is outstanding.
    pub(crate) fn reset_for_attach(&self, kind: ProtocolKind) {
        self.decoder.lock().reinitialize(kind);
        self.removed.store(false, Ordering::SeqCst);
        self.removal_notified.store(false, Ordering::SeqCst);
        self.removal_baseline.store(0, Ordering::SeqCst);
        self.watch_mask.store(0, Ordering::SeqCst);
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn set_started(&self, started: bool) {
        self.started.store(started, Ordering::SeqCst);
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }

    pub fn enable_count(&self) -> u32 {
        self.enable_count.load(Ordering::SeqCst)
    }

    /// Returns the new count.
    pub(crate) fn inc_enable(&self) -> u32 {
        self.enable_count.fetch_add(1, Ordering::SeqCst).saturating_add(1)
    }

    /// Returns the new count, or `None` when it was already zero.
    pub(crate) fn dec_enable(&self) -> Option<u32> {
        self.enable_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| count.checked_sub(1))
            .ok()
            .map(|previous| previous.saturating_sub(1))
    }

    /// Whether the pump may issue another read.
    pub(crate) fn should_read(&self) -> bool {
        !self.is_removed() && self.is_started() && self.enable_count() > 0
    }

    /// Whether the watcher may rearm.
    pub(crate) fn should_watch(&self) -> bool {
        !self.is_removed() && self.is_started()
    }

    pub(crate) fn set_watch(&self, baseline: LineStatus, mask: LineStatus) {
        self.removal_baseline.store(baseline.bits(), Ordering::SeqCst);
        self.watch_mask.store(mask.bits(), Ordering::SeqCst);
    }

    pub fn removal_baseline(&self) -> LineStatus {
        LineStatus::from_bits_truncate(self.removal_baseline.load(Ordering::SeqCst))
    }

    pub fn watch_mask(&self) -> LineStatus {
        LineStatus::from_bits_truncate(self.watch_mask.load(Ordering::SeqCst))
    }

    /// Marks the device gone and tells the sink, once per attach.
    ///
    /// Cancels whichever of the read and the line wait is still outstanding.
    /// Safe to call from either completion, including reentrantly.
    pub(crate) fn report_removal(&self, reason: RemovalReason) {
        self.removed.store(true, Ordering::SeqCst);
        if self.removal_notified.swap(true, Ordering::SeqCst) {
            return;
        }
        warn!(%reason, "Serial mouse removed");
        self.sink.notify_removal();
        self.transport.cancel_read();
        self.transport.cancel_wait();
    }
}

impl std::fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceContext")
            .field("verbosity", &self.verbosity)
            .field("enable_count", &self.enable_count())
            .field("started", &self.is_started())
            .field("removed", &self.is_removed())
            .field("in_use", &self.in_use.count())
            .finish_non_exhaustive()
    }
}
