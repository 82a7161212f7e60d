//! Integration tests for the subprocess runner
//!
//! Spawns real `/bin/sh` processes and checks output delivery, exit
//! classification, deadlines, cancellation and cleanup.

#![cfg(unix)]

#[path = "../common/mod.rs"]
mod common;

use std::time::Duration;

use claude_code_client::ClaudeError;
use claude_code_client::transport::{LaunchSpec, ProcessRunner};

use common::{init_logging, script, wait_gone};

fn sh(body: &str) -> LaunchSpec {
    LaunchSpec::new("/bin/sh", vec!["-c".to_string(), body.to_string()])
}

#[tokio::test]
async fn test_reads_stdout_line_by_line() {
    init_logging();
    let runner = ProcessRunner::new();
    let mut handle = runner.run(sh("printf 'one\\ntwo\\n\\nthree'")).await.unwrap();

    let mut lines = Vec::new();
    while let Some(line) = handle.next_line().await.unwrap() {
        lines.push(line);
    }
    assert_eq!(lines, ["one", "two", "", "three"]);
    assert!(handle.finish(None).await.unwrap().success());
    assert_eq!(runner.processes_spawned(), 1);
}

#[tokio::test]
async fn test_stdin_is_delivered_and_closed() {
    init_logging();
    let mut spec = LaunchSpec::new("/bin/cat", Vec::new());
    spec.stdin = Some("line one\nline two\n".to_string());

    let output = ProcessRunner::new().run(spec).await.unwrap().collect_output().await.unwrap();
    assert_eq!(output, b"line one\nline two\n");
}

#[tokio::test]
async fn test_large_stdin_is_written_while_output_is_read() {
    init_logging();
    // Far larger than a pipe buffer in both directions
    let payload = "0123456789abcdef\n".repeat(128 * 1024);
    let mut spec = LaunchSpec::new("/bin/cat", Vec::new());
    spec.stdin = Some(payload.clone());

    let handle = ProcessRunner::new().run(spec).await.unwrap();
    let output = tokio::time::timeout(Duration::from_secs(10), handle.collect_output())
        .await
        .expect("echoing a large payload stalled")
        .unwrap();
    assert_eq!(output.len(), payload.len());
    assert_eq!(output, payload.as_bytes());
}

#[tokio::test]
async fn test_stdin_is_null_without_content() {
    init_logging();
    // cat would block forever on an inherited terminal
    let spec = LaunchSpec::new("/bin/cat", Vec::new());
    let output = ProcessRunner::new().run(spec).await.unwrap().collect_output().await.unwrap();
    assert!(output.is_empty());
}

#[tokio::test]
async fn test_environment_and_working_directory() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut spec = sh("pwd; echo \"$GREETING\"; echo \"${CLAUDECODE:-unset}\"");
    spec.cwd = Some(dir.path().to_path_buf());
    spec.env = vec![("GREETING".to_string(), "hi".to_string())];

    let output = ProcessRunner::new().run(spec).await.unwrap().collect_output().await.unwrap();
    let output = String::from_utf8(output).unwrap();
    let lines: Vec<_> = output.lines().collect();
    let expected_dir = dir.path().canonicalize().unwrap();
    assert_eq!(std::path::Path::new(lines[0]).canonicalize().unwrap(), expected_dir);
    assert_eq!(lines[1], "hi");
    assert_eq!(lines[2], "unset");
}

#[tokio::test]
async fn test_launch_failure_spawns_nothing() {
    init_logging();
    let runner = ProcessRunner::new();
    let err = runner
        .run(LaunchSpec::new("/nonexistent/command", Vec::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, ClaudeError::ProcessLaunch(_)), "{err}");
    assert!(err.is_runtime());
    assert_eq!(runner.processes_spawned(), 0);
}

#[tokio::test]
async fn test_missing_working_directory_is_launch_failure() {
    init_logging();
    let mut spec = sh("true");
    spec.cwd = Some("/nonexistent/dir/for/test".into());
    let err = ProcessRunner::new().run(spec).await.unwrap_err();
    match err {
        ClaudeError::ProcessLaunch(message) => assert!(message.contains("/nonexistent/dir/for/test")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_nonzero_exit_carries_stderr() {
    init_logging();
    let err = ProcessRunner::new()
        .run(sh("echo partial; echo 'something broke' >&2; exit 3"))
        .await
        .unwrap()
        .collect_output()
        .await
        .unwrap_err();

    match err {
        ClaudeError::ExecutionFailed { exit_code, stderr, .. } => {
            assert_eq!(exit_code, Some(3));
            assert!(stderr.contains("something broke"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_structured_stdout_error_wins() {
    init_logging();
    let err = ProcessRunner::new()
        .run(sh(
            r#"echo '{"type":"result","subtype":"error_during_execution","is_error":true,"result":"quota exceeded"}'; echo noise >&2; exit 1"#,
        ))
        .await
        .unwrap()
        .collect_output()
        .await
        .unwrap_err();

    match err {
        ClaudeError::ExecutionFailed { message, .. } => assert_eq!(message, "quota exceeded"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_timeout_terminates_process_group() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("grandchild.pid");
    let program = script(
        dir.path(),
        "slow",
        &format!("sleep 30 &\necho $! > {}\nwait", pid_file.display()),
    );

    let mut spec = LaunchSpec::new(program, Vec::new());
    spec.timeout = Some(Duration::from_millis(300));
    let handle = ProcessRunner::new().run(spec).await.unwrap();
    let pid = handle.pid().unwrap();

    let err = handle.collect_output().await.unwrap_err();
    assert!(matches!(err, ClaudeError::Timeout(_)), "{err}");
    assert!(wait_gone(pid, Duration::from_secs(5)).await, "leader {pid} still running");

    let grandchild: u32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
    assert!(
        wait_gone(grandchild, Duration::from_secs(5)).await,
        "grandchild {grandchild} still running"
    );
}

#[tokio::test]
async fn test_sigterm_is_escalated() {
    init_logging();
    let mut spec = sh("trap '' TERM; while :; do sleep 1; done");
    spec.timeout = Some(Duration::from_millis(200));
    let handle = ProcessRunner::new().run(spec).await.unwrap();
    let pid = handle.pid().unwrap();

    let err = handle.collect_output().await.unwrap_err();
    assert!(matches!(err, ClaudeError::Timeout(_)));
    assert!(wait_gone(pid, Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_cancellation_while_reading() {
    init_logging();
    let spec = sh("echo ready; sleep 30");
    let cancel = spec.cancel.clone();
    let mut handle = ProcessRunner::new().run(spec).await.unwrap();
    let pid = handle.pid().unwrap();

    assert_eq!(handle.next_line().await.unwrap().as_deref(), Some("ready"));
    cancel.cancel();
    let err = handle.next_line().await.unwrap_err();
    assert!(matches!(err, ClaudeError::Cancelled));
    assert!(wait_gone(pid, Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_cancelled_before_spawn() {
    init_logging();
    let runner = ProcessRunner::new();
    let spec = sh("true");
    spec.cancel.cancel();
    let err = runner.run(spec).await.unwrap_err();
    assert!(matches!(err, ClaudeError::Cancelled));
    assert_eq!(runner.processes_spawned(), 0);
}

#[tokio::test]
async fn test_drop_kills_running_process() {
    init_logging();
    let handle = ProcessRunner::new().run(sh("sleep 30")).await.unwrap();
    let pid = handle.pid().unwrap();
    drop(handle);
    assert!(wait_gone(pid, Duration::from_secs(5)).await, "{pid} survived drop");
}

fn detached_sleeper(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let pid_file = dir.join("background.pid");
    let program = script(
        dir,
        "detach",
        &format!("sleep 30 &\necho $! > {}\necho done", pid_file.display()),
    );
    (program, pid_file)
}

#[tokio::test]
async fn test_background_descendant_does_not_hold_collected_output() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let (program, pid_file) = detached_sleeper(dir.path());

    let started = std::time::Instant::now();
    let handle = ProcessRunner::new().run(LaunchSpec::new(program, Vec::new())).await.unwrap();
    let output = handle.collect_output().await.unwrap();
    assert_eq!(output, b"done\n");
    assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());

    let background: u32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
    assert!(
        wait_gone(background, Duration::from_secs(5)).await,
        "background process {background} outlived the call"
    );
}

#[tokio::test]
async fn test_background_descendant_does_not_hold_line_reading() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let (program, pid_file) = detached_sleeper(dir.path());

    let started = std::time::Instant::now();
    let mut handle = ProcessRunner::new().run(LaunchSpec::new(program, Vec::new())).await.unwrap();
    let mut lines = Vec::new();
    while let Some(line) = handle.next_line().await.unwrap() {
        lines.push(line);
    }
    assert_eq!(lines, ["done"]);
    assert!(handle.finish(None).await.unwrap().success());
    assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());

    let background: u32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
    assert!(wait_gone(background, Duration::from_secs(5)).await);
}
