use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn replay(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_midi-visualiser"))
        .env("RUST_LOG", "warn")
        .arg("replay")
        .args(args)
        .output()
        .expect("failed to run midi-visualiser replay")
}

fn field(report: &serde_json::Value, name: &str) -> f64 {
    report[name].as_f64().unwrap_or_else(|| panic!("missing {name}"))
}

#[test]
fn replay_prints_final_parameters() {
    let root = TempDir::new().unwrap();
    let capture = root.path().join("session.hex");
    fs::write(
        &capture,
        "# red up, size down, green half\nB1 0D 7F\nB1 10 00\nF8\nB1 0E 40\nB1 63 12\n",
    )
    .unwrap();

    let output = replay(&[capture.to_str().unwrap()]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(field(&report, "red"), 1.0);
    assert!((field(&report, "green") - 0.504).abs() < 1e-3);
    assert_eq!(field(&report, "blue"), 0.0);
    assert_eq!(field(&report, "size"), 0.0);
}

#[test]
fn replay_honours_config_and_status_filter() {
    let root = TempDir::new().unwrap();
    let capture = root.path().join("notes.hex");
    let config = root.path().join("config.json");
    fs::write(&capture, "91 0F 7F\n").unwrap();
    fs::write(&config, r#"{ "initial": { "red": 0.0, "size": 0.5 } }"#).unwrap();

    let strict = replay(&[
        capture.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(strict.status.success());
    let report: serde_json::Value = serde_json::from_slice(&strict.stdout).unwrap();
    assert_eq!(field(&report, "blue"), 0.0);
    assert_eq!(field(&report, "red"), 0.0);
    assert_eq!(field(&report, "size"), 0.5);

    let permissive = replay(&[
        capture.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--status-filter",
        "any-channel-voice",
    ]);
    assert!(permissive.status.success());
    let report: serde_json::Value = serde_json::from_slice(&permissive.stdout).unwrap();
    assert_eq!(field(&report, "blue"), 1.0);
}

#[test]
fn replay_rejects_malformed_capture() {
    let root = TempDir::new().unwrap();
    let capture = root.path().join("broken.hex");
    fs::write(&capture, "B0 0D 7F\nnot hex\n").unwrap();

    let output = replay(&[capture.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("line: 2"));
}
