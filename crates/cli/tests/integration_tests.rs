//! Integration tests for the sermousectl CLI
//!
//! Each test runs the built binary and checks output shape and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use sermouse_test_helpers::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

/// Custom predicate to check that every stdout line is valid JSON
fn is_json_lines() -> impl predicates::Predicate<[u8]> {
    predicates::function::function(|s: &[u8]| {
        std::str::from_utf8(s).is_ok_and(|text| {
            text.lines()
                .all(|line| serde_json::from_str::<Value>(line).is_ok())
        })
    })
}

fn sermousectl() -> Result<Command, Box<dyn std::error::Error>> {
    Ok(Command::cargo_bin("sermousectl")?)
}

fn last_json_line(stdout: &[u8]) -> Result<Value, Box<dyn std::error::Error>> {
    let text = std::str::from_utf8(stdout)?;
    let line = text.lines().last().ok_or("no output")?;
    Ok(serde_json::from_str(line)?)
}

#[test]
fn test_help_lists_commands() -> TestResult {
    sermousectl()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("decode"))
        .stdout(predicate::str::contains("simulate"))
        .stdout(predicate::str::contains("completion"));
    Ok(())
}

#[test]
fn test_version() -> TestResult {
    sermousectl()?
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sermousectl"));
    Ok(())
}

#[test]
fn test_completion_bash() -> TestResult {
    sermousectl()?
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sermousectl"));
    Ok(())
}

#[test]
fn test_decode_binary_capture_file() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("capture.bin");
    let mut capture = packets::MM_LEFT_5_3.to_vec();
    capture.extend_from_slice(&packets::MM_NEGATIVE_2);
    fs::write(&path, &capture)?;

    sermousectl()?
        .args(["decode", "--protocol", "mm"])
        .arg(&path)
        .assert()
        .success()
        .stdout(is_json_lines())
        .stdout(predicate::str::contains("\"dx\":5"))
        .stdout(predicate::str::contains("\"seq\":1"));
    Ok(())
}

#[test]
fn test_decode_hex_from_stdin_with_json_summary() -> TestResult {
    let output = sermousectl()?
        .args(["--json", "decode", "--protocol", "z", "--hex"])
        .write_stdin("0x40 0x00 0x00 0x0F\n")
        .output()?;
    assert!(output.status.success());

    let summary = last_json_line(&output.stdout)?;
    assert_eq!(summary["success"], true);
    assert_eq!(summary["summary"]["events"], 1);
    assert_eq!(summary["summary"]["sync_errors"], 0);
    assert!(std::str::from_utf8(&output.stdout)?.contains("\"wheel\":-1"));
    Ok(())
}

#[test]
fn test_decode_counts_sync_errors() -> TestResult {
    let output = sermousectl()?
        .args(["--json", "decode", "--protocol", "mp", "--hex"])
        .write_stdin("05 53 3f 05")
        .output()?;
    assert!(output.status.success());

    let summary = last_json_line(&output.stdout)?;
    assert_eq!(summary["summary"]["events"], 1);
    assert_eq!(summary["summary"]["sync_errors"], 1);
    Ok(())
}

#[test]
fn test_decode_bad_hex_exits_with_input_error() -> TestResult {
    sermousectl()?
        .args(["decode", "--protocol", "mm", "--hex"])
        .write_stdin("84 zz")
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("bad hex byte"));
    Ok(())
}

#[test]
fn test_decode_missing_file_exits_with_io_error() -> TestResult {
    let dir = TempDir::new()?;
    sermousectl()?
        .args(["decode", "--protocol", "mm"])
        .arg(dir.path().join("absent.bin"))
        .assert()
        .failure()
        .code(5);
    Ok(())
}

#[test]
fn test_simulate_every_device() -> TestResult {
    let cases = [
        ("microsoft", "mp", 2),
        ("three-button", "mp", 3),
        ("wheel", "z", 3),
        ("ballpoint", "bp", 2),
        ("mm-series", "mm", 3),
    ];

    for (device, protocol, buttons) in cases {
        let output = sermousectl()?
            .args(["--json", "simulate", "--device", device, "-n", "12"])
            .output()?;
        assert!(output.status.success(), "{device}");

        let report = last_json_line(&output.stdout)?;
        let simulation = &report["simulation"];
        assert_eq!(simulation["detection"]["variant"], protocol, "{device}");
        assert_eq!(simulation["detection"]["button_count"], buttons, "{device}");
        assert_eq!(simulation["events"], 12, "{device}");
        assert_eq!(simulation["removed"], false, "{device}");
        assert_eq!(simulation["counters"]["sync_errors"], 0, "{device}");
    }
    Ok(())
}

#[test]
fn test_simulate_unplug_reports_removal() -> TestResult {
    let output = sermousectl()?
        .args(["--json", "simulate", "--device", "wheel", "--unplug"])
        .output()?;
    assert!(output.status.success());

    let report = last_json_line(&output.stdout)?;
    assert_eq!(report["simulation"]["removed"], true);
    assert_eq!(report["simulation"]["events"], 10);
    Ok(())
}

#[test]
fn test_config_prints_defaults() -> TestResult {
    sermousectl()?
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("baud_candidates"))
        .stdout(predicate::str::contains("drain_timeout_ms"));
    Ok(())
}

#[test]
fn test_config_file_round_trips() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("mouse.json");
    fs::write(&path, r#"{ "pipeline": { "drain_timeout_ms": 750 } }"#)?;

    sermousectl()?
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("750"));
    Ok(())
}

#[test]
fn test_invalid_config_exits_with_config_error() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("mouse.json");
    fs::write(&path, r#"{ "detection": { "default_buttons": 5 } }"#)?;

    sermousectl()?
        .arg("--config")
        .arg(&path)
        .args(["simulate", "--json"])
        .assert()
        .failure()
        .code(4)
        .stdout(predicate::str::contains("\"success\":false"));
    Ok(())
}
