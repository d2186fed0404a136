// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use shine_core::TaskRecord;
use std::time::Duration;

fn supervisor(cmd: &[&str], logs_dir: &std::path::Path, timeout: Option<Duration>) -> ProcessSupervisor {
    ProcessSupervisor::new(
        cmd.iter().map(|s| s.to_string()).collect(),
        None,
        timeout,
        HashMap::new(),
        logs_dir.to_path_buf(),
        "shine",
        Arc::new(parking_lot::Mutex::new(None)),
    )
}

#[tokio::test]
async fn a_successful_command_exits_zero_and_writes_a_log_file() {
    let dir = tempfile::tempdir().unwrap();
    let sup = supervisor(&["sh", "-c", "echo hello"], dir.path(), None);
    let code = sup.run(&TaskRecord::new("debian", 1.0)).await;
    assert_eq!(code, 0);
    let log_path = sup.last_log_path().unwrap();
    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert!(contents.contains("hello"));
}

#[tokio::test]
async fn a_failing_command_reports_its_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let sup = supervisor(&["sh", "-c", "exit 7"], dir.path(), None);
    let code = sup.run(&TaskRecord::new("debian", 1.0)).await;
    assert_eq!(code, 7);
}

#[tokio::test]
async fn stdout_and_stderr_are_merged_into_one_log() {
    let dir = tempfile::tempdir().unwrap();
    let sup = supervisor(&["sh", "-c", "echo out; echo err >&2"], dir.path(), None);
    sup.run(&TaskRecord::new("debian", 1.0)).await;
    let contents = std::fs::read_to_string(sup.last_log_path().unwrap()).unwrap();
    assert!(contents.contains("out"));
    assert!(contents.contains("err"));
}

#[tokio::test]
async fn stdin_is_fed_when_input_is_provided() {
    let dir = tempfile::tempdir().unwrap();
    let sup = ProcessSupervisor::new(
        vec!["cat".to_string()],
        Some("piped through".to_string()),
        None,
        HashMap::new(),
        dir.path().to_path_buf(),
        "shine",
        Arc::new(parking_lot::Mutex::new(None)),
    );
    sup.run(&TaskRecord::new("debian", 1.0)).await;
    let contents = std::fs::read_to_string(sup.last_log_path().unwrap()).unwrap();
    assert!(contents.contains("piped through"));
}

#[tokio::test]
async fn a_command_that_outlives_its_timeout_is_killed() {
    let dir = tempfile::tempdir().unwrap();
    let sup = supervisor(&["sh", "-c", "sleep 30"], dir.path(), Some(Duration::from_millis(50)));
    let code = sup.run(&TaskRecord::new("debian", 1.0)).await;
    assert_ne!(code, 0);
}

#[tokio::test]
async fn the_kill_slot_is_populated_during_the_run_and_cleared_after() {
    let dir = tempfile::tempdir().unwrap();
    let kill_slot = Arc::new(parking_lot::Mutex::new(None));
    let sup = ProcessSupervisor::new(
        vec!["sh".to_string(), "-c".to_string(), "echo done".to_string()],
        None,
        None,
        HashMap::new(),
        dir.path().to_path_buf(),
        "shine",
        kill_slot.clone(),
    );
    sup.run(&TaskRecord::new("debian", 1.0)).await;
    assert!(kill_slot.lock().is_none());
}

#[tokio::test]
async fn an_unspawnable_command_reports_a_failed_run() {
    let dir = tempfile::tempdir().unwrap();
    let sup = supervisor(&["/no/such/binary-shine-test"], dir.path(), None);
    let code = sup.run(&TaskRecord::new("debian", 1.0)).await;
    assert_eq!(code, -1);
}
