//! End-to-end tests of the `phpa` binary: stdin in, stdout result, exit status.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn phpa(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_phpa"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    // The binary may exit before reading stdin (e.g. on a config error).
    let _ = child.stdin.take().unwrap().write_all(stdin.as_bytes());
    child.wait_with_output().unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8(out.stdout.clone()).unwrap()
}

fn stderr(out: &Output) -> String {
    String::from_utf8(out.stderr.clone()).unwrap()
}

fn evaluations(replicas: &[u32]) -> String {
    let items: Vec<String> = replicas
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                r#"{{"id":{i},"created":"2020-02-01T00:{i:02}:00Z","val":{{"targetReplicas":{r}}}}}"#
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}

fn algorithm_input(replicas: &[u32]) -> String {
    format!(r#"{{"lookAhead":1,"evaluations":{}}}"#, evaluations(replicas))
}

fn seasonal_request(action: &str, look_ahead: u32, replicas: &[u32]) -> String {
    let dates: Vec<String> = (0..replicas.len()).map(|i| format!("\"d{i}\"")).collect();
    let values: Vec<String> = replicas.iter().map(|r| r.to_string()).collect();
    format!(
        r#"{{"action":"{action}","lookAhead":{look_ahead},"data":{{"Date":[{}],"Replicas":[{}]}}}}"#,
        dates.join(","),
        values.join(",")
    )
}

fn store_arg(dir: &Path) -> String {
    dir.join("model.redb").display().to_string()
}

fn assert_failed(out: &Output, code: i32) {
    assert_eq!(out.status.code(), Some(code), "stderr: {}", stderr(out));
    assert!(out.stdout.is_empty(), "stdout: {}", stdout(out));
    assert!(!out.stderr.is_empty());
}

// ── Input errors ──────────────────────────────────────────────────

#[test]
fn empty_stdin_is_an_input_error() {
    for cmd in ["arima", "knn", "sarima", "run"] {
        let out = phpa(&[cmd], "");
        assert_failed(&out, 1);
        assert!(stderr(&out).contains("no standard input provided"));
    }
}

#[test]
fn malformed_json_is_an_input_error() {
    let out = phpa(&["knn"], "{\"lookAhead\": 1,");
    assert_failed(&out, 1);
    assert!(stderr(&out).contains("invalid JSON provided"));
}

#[test]
fn missing_evaluations_is_an_input_error() {
    let out = phpa(&["arima"], r#"{"lookAhead":1}"#);
    assert_failed(&out, 1);
    assert!(stderr(&out).contains("invalid JSON provided"));
}

#[test]
fn invalid_config_is_rejected_before_reading_input() {
    let out = phpa(&["knn", "-k", "0"], &algorithm_input(&[5; 10]));
    assert_failed(&out, 1);
    assert!(stderr(&out).contains("knn.k"));
}

// ── Stateless forecasters ─────────────────────────────────────────

#[test]
fn knn_constant_history() {
    let out = phpa(&["knn"], &algorithm_input(&[5; 10]));
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "5");
}

#[test]
fn arima_constant_history() {
    let out = phpa(&["arima"], &algorithm_input(&[5; 10]));
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "5");

    let out = phpa(&["arima", "--mode", "ahead"], &algorithm_input(&[5; 10]));
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "5");
}

#[test]
fn arima_short_history_is_a_fit_error() {
    let out = phpa(&["arima"], &algorithm_input(&[3, 4, 5, 6]));
    assert_failed(&out, 2);
}

#[test]
fn knn_warm_up_only_history_is_a_fit_error() {
    let out = phpa(&["knn"], &algorithm_input(&[5; 3]));
    assert_failed(&out, 2);
}

// ── Seasonal forecaster ───────────────────────────────────────────

#[test]
fn sarima_train_then_predict() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_arg(dir.path());

    let out = phpa(&["--store", &store, "sarima"], &seasonal_request("train", 3, &[5; 10]));
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), r#"{"success":1}"#);

    for n in [1, 4] {
        let out = phpa(&["--store", &store, "sarima"], &seasonal_request("predict", n, &[5; 3]));
        assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
        let forecast: Vec<f64> = serde_json::from_str(&stdout(&out)).unwrap();
        assert_eq!(forecast.len(), n as usize);
        assert!(forecast.iter().all(|v| (v - 5.0).abs() < 1e-6), "{forecast:?}");
    }
}

#[test]
fn sarima_predict_without_model_is_a_store_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_arg(dir.path());
    let out = phpa(&["--store", &store, "sarima"], &seasonal_request("predict", 1, &[5; 3]));
    assert_failed(&out, 3);
}

#[test]
fn sarima_store_held_elsewhere_is_a_store_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.redb");
    let _held = phpa_state::StateStore::open(&path).unwrap();

    let store = path.display().to_string();
    let out = phpa(&["--store", &store, "sarima"], &seasonal_request("train", 3, &[5; 10]));
    assert_failed(&out, 3);
    assert!(stderr(&out).contains("locked"), "stderr: {}", stderr(&out));
}

#[test]
fn sarima_unknown_action_is_an_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_arg(dir.path());
    let out = phpa(&["--store", &store, "sarima"], &seasonal_request("refit", 1, &[5; 3]));
    assert_failed(&out, 1);
}

// ── Envelope ──────────────────────────────────────────────────────

#[test]
fn envelope_dispatches_by_algorithm() {
    let body = format!(
        r#"{{"version":1,"algorithm":"knn","lookAhead":1,"evaluations":{}}}"#,
        evaluations(&[5; 10])
    );
    let out = phpa(&["run"], &body);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "5");
}

#[test]
fn envelope_carries_seasonal_requests() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_arg(dir.path());
    let body = format!(
        r#"{{"version":1,"algorithm":"sarima","action":"train","data":{{"evaluations":{}}}}}"#,
        evaluations(&[5; 10])
    );
    let out = phpa(&["--store", &store, "run"], &body);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), r#"{"success":1}"#);
}

#[test]
fn envelope_rejects_unknown_version() {
    let body = format!(
        r#"{{"version":2,"algorithm":"knn","lookAhead":1,"evaluations":{}}}"#,
        evaluations(&[5; 10])
    );
    let out = phpa(&["run"], &body);
    assert_failed(&out, 1);
    assert!(stderr(&out).contains("version"));
}

// ── Retention ─────────────────────────────────────────────────────

#[test]
fn retain_lists_oldest_ids() {
    let out = phpa(&["retain", "--stored-values", "3"], &algorithm_input(&[1, 2, 3, 4, 5]));
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "[0,1]");
}
