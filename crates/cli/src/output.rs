//! Output formatting for CLI responses

use anyhow::Error;
use colored::*;
use serde::Serialize;
use serde_json::json;
use sermouse_detect::DetectionResult;
use sermouse_pipeline::CounterSnapshot;
use sermouse_protocol::{Buttons, InputEvent};

/// One decoded event as printed on stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventView {
    pub seq: usize,
    pub buttons: Vec<&'static str>,
    pub dx: i32,
    pub dy: i32,
    pub wheel: i16,
    pub pressed: Vec<&'static str>,
    pub released: Vec<&'static str>,
}

impl EventView {
    pub fn new(seq: usize, event: &InputEvent) -> Self {
        Self {
            seq,
            buttons: button_names(event.buttons),
            dx: event.dx,
            dy: event.dy,
            wheel: event.wheel,
            pressed: button_names(event.pressed()),
            released: button_names(event.released()),
        }
    }
}

fn button_names(buttons: Buttons) -> Vec<&'static str> {
    [
        (Buttons::LEFT, "left"),
        (Buttons::RIGHT, "right"),
        (Buttons::MIDDLE, "middle"),
    ]
    .into_iter()
    .filter(|(button, _)| buttons.contains(*button))
    .map(|(_, name)| name)
    .collect()
}

/// Print one event as a JSON line.
pub fn print_event(seq: usize, event: &InputEvent) {
    match serde_json::to_string(&EventView::new(seq, event)) {
        Ok(line) => println!("{line}"),
        Err(e) => eprintln!("Failed to format event as JSON: {e}"),
    }
}

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
        }
    });
    match serde_json::to_string(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DecodeSummary {
    pub protocol: String,
    pub bytes: usize,
    pub events: usize,
    pub sync_errors: u32,
}

pub fn print_decode_summary(summary: &DecodeSummary, json: bool) {
    if json {
        print_json(&json!({ "success": true, "summary": summary }));
        return;
    }

    eprintln!(
        "{} {} bytes, {} events",
        format!("{}:", summary.protocol).bold(),
        summary.bytes,
        summary.events
    );
    if summary.sync_errors > 0 {
        eprintln!("  {} {}", "Sync errors:".yellow(), summary.sync_errors);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub device: String,
    pub detection: DetectionResult,
    pub events: usize,
    pub removed: bool,
    pub counters: CounterSnapshot,
}

pub fn print_simulation_report(report: &SimulationReport, json: bool) {
    if json {
        print_json(&json!({ "success": true, "simulation": report }));
        return;
    }

    let detection = &report.detection;
    eprintln!(
        "{} {} detected as {} ({} buttons, {} baud)",
        "●".green(),
        report.device.bold(),
        detection.variant,
        detection.button_count,
        detection.baud_rate
    );
    eprintln!("  Events: {}", report.events);
    let counters = &report.counters;
    eprintln!(
        "  Reads: {} issued, {} completed inline",
        counters.reads_issued, counters.inline_completions
    );
    if counters.sync_errors > 0 {
        eprintln!("  {} {}", "Sync errors:".yellow(), counters.sync_errors);
    }
    if report.removed {
        eprintln!("  {}", "Device removed".red());
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format output as JSON: {e}"),
    }
}
