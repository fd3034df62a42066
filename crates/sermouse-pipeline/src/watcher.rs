//! Removal watcher
//!
//! Records which modem status lines are asserted when the device starts and
//! waits for any of them to change. A wake-up that leaves the watched lines
//! at their baseline is spurious and the wait is rearmed. Anything else is a
//! removal, reported once. Rearming uses the same interlock as the read pump,
//! so a transport that keeps waking up inline cannot grow the stack.

use sermouse_transport::{LineStatus, TransportError, TransportResult};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{debug, trace};

use crate::PipelineResult;
use crate::context::{DeviceContext, RemovalReason};

/// Samples the baseline and arms the first wait.
///
/// Returns `false` without arming when no status line is asserted, since
/// there is nothing a disconnect could change.
///
/// # Errors
///
/// Returns an error if the status lines cannot be read.
pub(crate) fn start(context: &Arc<DeviceContext>) -> PipelineResult<bool> {
    let baseline = context.transport.line_status()?;
    if baseline.is_empty() {
        debug!("No status lines asserted, removal watcher not started");
        return Ok(false);
    }
    context.set_watch(baseline, baseline);

    if context
        .watcher_active
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Ok(true);
    }
    if context.verbosity.lifecycle() {
        debug!(baseline = ?baseline, "Removal watcher started");
    }
    arm(context);
    Ok(true)
}

pub(crate) fn is_running(context: &DeviceContext) -> bool {
    context.watcher_active.load(Ordering::SeqCst)
}

fn arm(context: &Arc<DeviceContext>) {
    loop {
        if !context.should_watch() {
            context.watcher_active.store(false, Ordering::SeqCst);
            return;
        }

        context.wait_interlock.begin();
        let guard = context.in_use.acquire();
        context.counters.inc_wait_issued();

        let completion_context = Arc::clone(context);
        context.transport.wait_line_event(
            context.watch_mask(),
            Box::new(move |result| {
                on_wait_complete(&completion_context, result);
                drop(guard);
            }),
        );

        if !context.wait_interlock.end() {
            return;
        }
    }
}

fn on_wait_complete(context: &Arc<DeviceContext>, result: TransportResult<LineStatus>) {
    match result {
        Ok(_) => check_lines(context),
        Err(error) => on_wait_error(context, &error),
    }
    if context.wait_interlock.complete_inline() {
        return;
    }
    arm(context);
}

/// Compares the watched lines against the baseline.
fn check_lines(context: &DeviceContext) {
    let current = match context.transport.line_status() {
        Ok(status) => status,
        Err(error) => {
            on_wait_error(context, &error);
            return;
        }
    };

    let mask = context.watch_mask();
    if current & mask == context.removal_baseline() & mask {
        context.counters.inc_spurious_line_event();
        if context.verbosity.bytes() {
            trace!(status = ?current, "Spurious line event");
        }
        return;
    }

    debug!(baseline = ?context.removal_baseline(), status = ?current, "Watched lines changed");
    context.report_removal(RemovalReason::LineStatusChanged);
}

fn on_wait_error(context: &DeviceContext, error: &TransportError) {
    if error.is_cancellation() {
        context.counters.inc_cancellation();
        if context.verbosity.lifecycle() {
            debug!("Line wait cancelled");
        }
        return;
    }

    if !context.is_started() {
        debug!(%error, "Line wait failed during stop");
        return;
    }

    context.counters.inc_io_failure();
    debug!(%error, "Line wait failed");
    context.report_removal(RemovalReason::WatchFailed);
}
