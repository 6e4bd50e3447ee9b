// Integration tests for the `cartcheck` binary: exit codes and the
// stdout contract (JSON / CSV only on stdout, summaries on stderr).
//
// Every test passes --config or points XDG_CONFIG_HOME at a temp dir, so the
// user's settings file is never touched.

use std::process::{Command, Output};

fn cartcheck() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cartcheck"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("CARTCHECK_CONFIG");
    cmd
}

fn run(args: &[&str]) -> Output {
    let mut full = vec!["--config", "tests/fixtures/fast.toml"];
    full.extend_from_slice(args);
    cartcheck().args(&full).output().expect("run cartcheck")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {e}\nstdout:\n{stdout}"))
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ===========================================================================
// estimate
// ===========================================================================

#[test]
fn estimate_json() {
    let output = run(&["estimate", "tests/fixtures/checklist.csv", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val = stdout_json(&output);
    assert_eq!(val["fill_percent"], 14);
    assert_eq!(val["capacity_liters"], 40.0);
    let used = val["used_liters"].as_f64().unwrap();
    assert!((used - 5.46).abs() < 1e-9, "used_liters = {used}");
}

#[test]
fn estimate_human_goes_to_stderr() {
    let output = run(&["estimate", "tests/fixtures/checklist.csv"]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).contains("14%"));
}

// ===========================================================================
// reconcile
// ===========================================================================

#[test]
fn reconcile_mismatch_exits_1() {
    let output = run(&[
        "reconcile",
        "tests/fixtures/checklist.csv",
        "tests/fixtures/detections.csv",
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(1));

    let val = stdout_json(&output);
    assert_eq!(val["summary"]["all_matched"], false);
    assert_eq!(val["summary"]["total_expected"], 8);
    assert_eq!(val["summary"]["missing_units"], 2);
    assert_eq!(val["result"]["extra"][0]["id"], "extra-7f3q");

    let err = stderr(&output);
    assert!(err.contains("Scan finished. 6/8 items matched."), "stderr: {err}");
    assert!(err.contains("Missing: Basmati Rice ×1, Eggs (12) ×1"), "stderr: {err}");
    assert!(!err.contains("error:"), "mismatch is not an error: {err}");
}

#[test]
fn reconcile_clean_exits_0() {
    let output = run(&[
        "reconcile",
        "tests/fixtures/checklist.csv",
        "tests/fixtures/matching_detections.csv",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("All items matched."));
}

#[test]
fn reconcile_writes_csv_report() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("basket-scan-report.csv");

    let output = run(&[
        "reconcile",
        "tests/fixtures/checklist.csv",
        "tests/fixtures/detections.csv",
        "--csv",
        out.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let csv = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "type,id,name,qty");
    assert_eq!(lines[1], r#""matched","sku-milk","Whole Milk","2""#);
    assert!(lines.contains(&r#""matched","sku-chips","Lay's Classic, Salted","3""#));
    assert_eq!(lines.last().copied(), Some(r#""extra","extra-7f3q","Unknown Item","1""#));
    assert_eq!(lines.len(), 1 + 3 + 2 + 1);
}

#[test]
fn reconcile_missing_file_is_io_error() {
    let output = run(&["reconcile", "tests/fixtures/nope.csv", "tests/fixtures/detections.csv"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("error: cannot read"));
}

#[test]
fn reconcile_bad_quantity_is_parse_error() {
    let output = run(&["reconcile", "tests/fixtures/checklist.csv", "tests/fixtures/bad_qty.csv"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(output.stdout.is_empty());
}

#[test]
fn invalid_config_is_usage_error() {
    let output = cartcheck()
        .args([
            "--config",
            "tests/fixtures/invalid.toml",
            "estimate",
            "tests/fixtures/checklist.csv",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("scan.overlayProbability"));
}

// ===========================================================================
// simulate
// ===========================================================================

#[test]
fn simulate_is_reproducible_with_seed() {
    let args = ["simulate", "tests/fixtures/checklist.csv", "--seed", "7"];
    let a = run(&args);
    let b = run(&args);
    assert!(a.status.success());
    assert_eq!(a.stdout, b.stdout);

    // fast.toml disables misses and extras: output mirrors the checklist.
    let stdout = String::from_utf8_lossy(&a.stdout);
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("id,name,qty"));
    assert_eq!(lines.next(), Some("sku-milk,Whole Milk,2"));
    assert_eq!(stdout.lines().count(), 6);
}

// ===========================================================================
// scan
// ===========================================================================

#[test]
fn scan_runs_to_completion() {
    let output = run(&["scan", "tests/fixtures/checklist.csv", "--seed", "3", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val = stdout_json(&output);
    assert_eq!(val["summary"]["all_matched"], true);
    assert_eq!(val["summary"]["matched_units"], 8);
    assert_eq!(val["capacity"]["fill_percent"], 14);

    let err = stderr(&output);
    assert!(err.contains("scanning... 100%"), "stderr: {err}");
    assert!(err.contains("Scan finished. 8/8 items matched."), "stderr: {err}");
}

#[test]
fn scan_stop_after_finalizes_early() {
    let output = cartcheck()
        .args([
            "--config",
            "tests/fixtures/slow.toml",
            "scan",
            "tests/fixtures/checklist.csv",
            "--seed",
            "3",
            "--stop-after-ms",
            "20",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let err = stderr(&output);
    assert!(err.contains("stopping scan at 0%"), "stderr: {err}");
    assert!(err.contains("Scan finished."), "stderr: {err}");
}

#[test]
fn scan_replays_model_predictions() {
    let output = run(&[
        "scan",
        "tests/fixtures/checklist.csv",
        "--predictions",
        "tests/fixtures/predictions.csv",
        "--json",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val = stdout_json(&output);
    // The 0.40 chips row is under the default 0.5 floor.
    assert_eq!(val["summary"]["matched_units"], 6);
    assert_eq!(val["summary"]["missing_units"], 2);
    let missing: Vec<&str> = val["result"]["missing"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(missing, vec!["sku-chips", "sku-eggs"]);
    assert_eq!(val["result"]["extra"][0]["id"], "sku-mystery");
    assert_eq!(val["result"]["extra"][0]["name"], "Unknown Item");
}

#[test]
fn scan_predictions_honour_min_confidence_setting() {
    let output = cartcheck()
        .args([
            "--config",
            "tests/fixtures/strict.toml",
            "scan",
            "tests/fixtures/checklist.csv",
            "--predictions",
            "tests/fixtures/predictions.csv",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val = stdout_json(&output);
    assert_eq!(val["summary"]["matched_units"], 1);
    assert_eq!(val["result"]["matched"][0]["id"], "sku-chips");
    assert_eq!(val["result"]["extra"].as_array().unwrap().len(), 0);
}

#[test]
fn scan_missing_predictions_file_is_io_error() {
    let output = run(&[
        "scan",
        "tests/fixtures/checklist.csv",
        "--predictions",
        "tests/fixtures/nope.csv",
    ]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn scan_without_camera_exits_20() {
    let output = run(&["scan", "tests/fixtures/checklist.csv", "--camera", "none", "--json"]);
    assert_eq!(output.status.code(), Some(20));
    assert!(output.stdout.is_empty());

    let err = stderr(&output);
    assert!(err.contains("error: cannot start scan: camera unavailable"), "stderr: {err}");
    assert!(err.contains("hint:"), "stderr: {err}");
}

#[test]
fn csv_flag_without_value_uses_default_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let fixtures = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

    let output = cartcheck()
        .current_dir(dir.path())
        .args([
            "--config",
            &format!("{fixtures}/fast.toml"),
            "reconcile",
            &format!("{fixtures}/checklist.csv"),
            &format!("{fixtures}/matching_detections.csv"),
            "--csv",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let csv = std::fs::read_to_string(dir.path().join("basket-scan-report.csv")).unwrap();
    assert!(csv.starts_with("type,id,name,qty\n"));
    assert_eq!(csv.lines().count(), 6);
}

// ===========================================================================
// config
// ===========================================================================

// dirs::config_dir honours XDG_CONFIG_HOME on Linux only.
#[cfg(target_os = "linux")]
#[test]
fn config_reset_then_path_and_show() {
    let home = tempfile::tempdir().unwrap();
    let expected = home.path().join("cartcheck").join("settings.json");

    let output = cartcheck()
        .env("XDG_CONFIG_HOME", home.path())
        .args(["config", "reset"])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&expected).unwrap()).unwrap();
    assert_eq!(saved["scan.tickIntervalMs"], 400);
    assert_eq!(saved["detector.minConfidence"], 0.5);

    let output = cartcheck()
        .env("XDG_CONFIG_HOME", home.path())
        .args(["config", "path"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), expected.to_str().unwrap());

    // --config overrides what `show` reports.
    let output = cartcheck()
        .env("XDG_CONFIG_HOME", home.path())
        .args(["--config", "tests/fixtures/strict.toml", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let val = stdout_json(&output);
    assert_eq!(val["scan.tickIntervalMs"], 5);
    let min = val["detector.minConfidence"].as_f64().unwrap();
    assert!((min - 0.95).abs() < 1e-6);
}
