//! Host-facing device lifecycle
//!
//! [`SerialMouse`] ties detection, the read pump and the removal watcher to
//! the calls a host makes: attach, enable and disable, stop, remove,
//! suspend and resume. Detection only ever runs while the pump and watcher
//! are idle.

use sermouse_detect::{DetectionEngine, DetectionResult};
use sermouse_transport::{ModemControl, SerialTransport};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::MouseConfig;
use crate::context::DeviceContext;
use crate::counters::CounterSnapshot;
use crate::sink::InputSink;
use crate::{PipelineError, PipelineResult, pump, watcher};

/// Slice used while draining so stragglers reissued mid-stop get cancelled.
const DRAIN_POLL: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub struct SerialMouse {
    context: Arc<DeviceContext>,
    config: MouseConfig,
    detection: Option<DetectionResult>,
    attach_enabled: bool,
}

impl SerialMouse {
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn new(
        transport: Arc<dyn SerialTransport>,
        sink: Arc<dyn InputSink>,
        config: MouseConfig,
    ) -> PipelineResult<Self> {
        config.validate()?;
        let context = DeviceContext::new(transport, sink, config.pipeline.verbosity);
        Ok(Self {
            context,
            config,
            detection: None,
            attach_enabled: false,
        })
    }

    /// Opens the port, runs detection and starts reading.
    ///
    /// Returns `Ok(None)` and closes the port when no device answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is already started, the port cannot be
    /// opened, or the transport fails during detection.
    pub fn try_attach(&mut self) -> PipelineResult<Option<DetectionResult>> {
        if self.context.is_started() {
            return Err(PipelineError::AlreadyStarted);
        }

        let transport = Arc::clone(&self.context.transport);
        transport.open()?;

        let detected = DetectionEngine::new(&*transport, self.config.detection.clone())
            .and_then(|engine| engine.detect());
        let result = match detected {
            Ok(Some(result)) => result,
            Ok(None) => {
                if self.config.pipeline.verbosity.lifecycle() {
                    info!("No serial mouse detected");
                }
                transport.close()?;
                self.detection = None;
                return Ok(None);
            }
            Err(error) => {
                if let Err(close_error) = transport.close() {
                    debug!(error = %close_error, "Close after failed detection failed");
                }
                return Err(error.into());
            }
        };

        self.context.reset_for_attach(result.variant);
        self.context.set_started(true);
        self.detection = Some(result);

        if self.config.pipeline.watch_removal {
            if let Err(error) = watcher::start(&self.context) {
                self.shutdown(false)?;
                return Err(error);
            }
        }

        if self.config.pipeline.enable_on_attach && !self.attach_enabled {
            self.context.inc_enable();
            self.attach_enabled = true;
        }
        if self.context.enable_count() > 0 {
            pump::start(&self.context);
        }

        debug!(
            protocol = %result.variant,
            buttons = result.button_count,
            baud = result.baud_rate,
            "Serial mouse started"
        );
        Ok(Some(result))
    }

    /// Attach as the host sees it: `true` when a device was found and
    /// started. Errors are logged and count as no device.
    pub fn on_attach(&mut self) -> bool {
        match self.try_attach() {
            Ok(found) => found.is_some(),
            Err(error) => {
                warn!(%error, "Serial mouse attach failed");
                false
            }
        }
    }

    /// Takes a host reference that keeps reads flowing.
    pub fn enable(&self) {
        let count = self.context.inc_enable();
        debug!(count, "Serial mouse enabled");
        if self.context.is_started() {
            pump::start(&self.context);
        }
    }

    /// Drops a host reference. The outstanding read is cancelled when the
    /// last one goes.
    pub fn disable(&self) {
        match self.context.dec_enable() {
            Some(0) => {
                debug!("Serial mouse disabled");
                self.context.transport.cancel_read();
            }
            Some(count) => debug!(count, "Serial mouse enable reference released"),
            None => warn!("Disable without matching enable"),
        }
    }

    /// Cancels outstanding requests, waits for their completions and closes
    /// the port.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::TeardownTimeout`] if completions are still
    /// running after the configured drain timeout.
    pub fn on_stop(&mut self) -> PipelineResult<()> {
        self.shutdown(false)
    }

    /// Final teardown. Consumes the device.
    ///
    /// # Errors
    ///
    /// As [`SerialMouse::on_stop`].
    pub fn on_remove(mut self) -> PipelineResult<()> {
        self.shutdown(false)
    }

    /// Stops reading and watching, then powers the device down.
    ///
    /// The cancellations this causes are never reported as removal.
    ///
    /// # Errors
    ///
    /// As [`SerialMouse::on_stop`].
    pub fn suspend(&mut self) -> PipelineResult<()> {
        self.shutdown(true)
    }

    /// Detects the device again and restarts reading.
    ///
    /// # Errors
    ///
    /// As [`SerialMouse::try_attach`].
    pub fn resume(&mut self) -> PipelineResult<Option<DetectionResult>> {
        self.try_attach()
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.context.counters.snapshot()
    }

    pub fn detection(&self) -> Option<&DetectionResult> {
        self.detection.as_ref()
    }

    pub fn config(&self) -> &MouseConfig {
        &self.config
    }

    pub fn enable_count(&self) -> u32 {
        self.context.enable_count()
    }

    pub fn is_started(&self) -> bool {
        self.context.is_started()
    }

    pub fn is_removed(&self) -> bool {
        self.context.is_removed()
    }

    pub fn is_reading(&self) -> bool {
        pump::is_running(&self.context)
    }

    pub fn is_watching(&self) -> bool {
        watcher::is_running(&self.context)
    }

    /// Requests whose completions have not returned yet.
    pub fn in_use_count(&self) -> usize {
        self.context.in_use.count()
    }

    /// Errors the decoder absorbed since attach.
    pub fn sync_error_count(&self) -> u32 {
        self.context.decoder.lock().error_count()
    }

    fn shutdown(&mut self, power_off: bool) -> PipelineResult<()> {
        let was_started = self.context.is_started();
        self.context.set_started(false);
        if self.attach_enabled {
            if self.context.dec_enable().is_none() {
                warn!("Enable count already zero at shutdown");
            }
            self.attach_enabled = false;
        }

        let drained = self.drain();

        let transport = &self.context.transport;
        if power_off && was_started {
            if let Err(error) = transport.set_modem_control(ModemControl::POWER_OFF) {
                debug!(%error, "Power off during suspend failed");
            }
        }
        if let Err(error) = transport.close() {
            debug!(%error, "Close failed");
        }

        if was_started && self.config.pipeline.verbosity.lifecycle() {
            info!(suspended = power_off, "Serial mouse stopped");
        }
        drained
    }

    fn drain(&self) -> PipelineResult<()> {
        let timeout = self.config.pipeline.drain_timeout();
        let deadline = Instant::now() + timeout;
        loop {
            self.context.transport.cancel_read();
            self.context.transport.cancel_wait();
            let remaining = deadline.saturating_duration_since(Instant::now());
            if self.context.in_use.wait_idle(remaining.min(DRAIN_POLL)) {
                return Ok(());
            }
            if remaining.is_zero() {
                warn!(outstanding = self.context.in_use.count(), "Teardown timed out");
                return Err(PipelineError::TeardownTimeout(timeout));
            }
        }
    }
}

impl Drop for SerialMouse {
    fn drop(&mut self) {
        if self.context.is_started() {
            if let Err(error) = self.shutdown(false) {
                warn!(%error, "Serial mouse dropped while running");
            }
        }
    }
}
