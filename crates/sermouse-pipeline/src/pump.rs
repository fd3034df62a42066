//! Read pump
//!
//! Keeps one single-byte read outstanding while the device is started,
//! enabled and present. Each completed byte is decoded before the next read
//! is issued. Reads that complete inside `read_byte_async` are picked up by
//! the issuing loop through [`IssueInterlock`](crate::interlock::IssueInterlock)
//! so buffered input never deepens the stack.

use sermouse_transport::{RxByte, TransportError, TransportResult};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{debug, trace};

use crate::context::{DeviceContext, RemovalReason};

/// Starts the pump unless it is already running.
pub(crate) fn start(context: &Arc<DeviceContext>) {
    if context
        .pump_active
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
    {
        if context.verbosity.lifecycle() {
            debug!("Read pump started");
        }
        issue_reads(context);
    }
}

pub(crate) fn is_running(context: &DeviceContext) -> bool {
    context.pump_active.load(Ordering::SeqCst)
}

fn issue_reads(context: &Arc<DeviceContext>) {
    loop {
        if !context.should_read() {
            if stop(context) {
                continue;
            }
            return;
        }

        context.read_interlock.begin();
        let guard = context.in_use.acquire();
        context.counters.inc_read_issued();

        let completion_context = Arc::clone(context);
        context.transport.read_byte_async(Box::new(move |result| {
            on_read_complete(&completion_context, result);
            drop(guard);
        }));

        if !context.read_interlock.end() {
            return;
        }
        context.counters.inc_inline_completion();
    }
}

/// Marks the pump idle.
///
/// Returns `true` when reading became allowed again in the meantime and
/// this caller took the pump back, so it must keep issuing.
fn stop(context: &DeviceContext) -> bool {
    context.pump_active.store(false, Ordering::SeqCst);
    context.should_read()
        && context
            .pump_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
}

fn on_read_complete(context: &Arc<DeviceContext>, result: TransportResult<RxByte>) {
    match result {
        Ok(rx) => decode(context, rx),
        Err(error) => on_read_error(context, &error),
    }
    if context.read_interlock.complete_inline() {
        return;
    }
    issue_reads(context);
}

fn decode(context: &DeviceContext, rx: RxByte) {
    let counters = &context.counters;
    counters.inc_byte_received();
    if rx.line.is_corrupt() {
        counters.inc_line_error();
    }
    if context.verbosity.bytes() {
        trace!(byte = rx.byte, line = ?rx.line, "Received byte");
    }

    let event = {
        let mut decoder = context.decoder.lock();
        let errors_before = decoder.error_count();
        let event = decoder.feed(rx.byte, rx.line);
        let new_errors = decoder.error_count().saturating_sub(errors_before);
        if new_errors > 0 {
            counters.add_sync_errors(u64::from(new_errors));
            if context.verbosity.packets() {
                trace!(byte = rx.byte, "Decoder resynchronized");
            }
        }
        event
    };

    if let Some(event) = event {
        if context.verbosity.packets() {
            trace!(
                buttons = ?event.buttons,
                dx = event.dx,
                dy = event.dy,
                wheel = event.wheel,
                "Decoded packet"
            );
        }
        context.sink.deliver(&event);
        counters.inc_event_delivered();
    }
}

/// Accounts for a failed read. The next pass through `issue_reads` stops
/// the pump, since cancellation always follows a stop condition and an I/O
/// failure marks the device removed.
fn on_read_error(context: &DeviceContext, error: &TransportError) {
    if error.is_cancellation() {
        context.counters.inc_cancellation();
        if context.verbosity.lifecycle() {
            debug!("Read cancelled");
        }
        return;
    }

    if !context.is_started() {
        debug!(%error, "Read failed during stop");
        return;
    }

    context.counters.inc_io_failure();
    debug!(%error, "Read failed");
    context.report_removal(RemovalReason::ReadFailed);
}
