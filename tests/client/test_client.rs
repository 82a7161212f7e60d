//! Integration tests for `ClaudeCodeClient`
//!
//! The CLI is replaced by shell scripts, so these tests exercise argument
//! encoding, process execution, output decoding and diagnostics end to end.

#![cfg(unix)]

#[path = "../common/mod.rs"]
mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use claude_code_client::{
    BackendKind, ClaudeCodeClient, ClaudeError, Configuration, ExecutionMethod, InvocationOptions,
    Message, OutputFormat, RuntimeLocator, StreamDelivery,
};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use common::{init_logging, script, wait_gone};

const TRANSCRIPT: &str = r#"cat <<'JSON'
{"type":"system","subtype":"init","session_id":"s1","model":"claude-test"}
this is not json

{"type":"assistant","message":{"model":"claude-test","content":[{"type":"text","text":"4"}]},"session_id":"s1"}
{"type":"result","subtype":"success","is_error":false,"session_id":"s1","total_cost_usd":0.01,"result":"4"}
JSON"#;

#[derive(Debug)]
struct NoNode;

impl RuntimeLocator for NoNode {
    fn locate(&self) -> Option<PathBuf> {
        None
    }
}

fn client_for(command: impl Into<String>) -> ClaudeCodeClient {
    ClaudeCodeClient::new(Configuration::builder().command(command).build())
}

#[tokio::test]
async fn test_missing_command_fails_before_spawn() {
    init_logging();
    let client = client_for("/nonexistent/command");

    let err = client
        .run_single_prompt("hello", OutputFormat::Text, InvocationOptions::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, ClaudeError::NotInstalled(_) | ClaudeError::ProcessLaunch(_)),
        "{err}"
    );
    assert_eq!(client.processes_spawned(), 0);
    assert!(client.last_executed_command_info().is_none());
}

#[tokio::test]
async fn test_failing_command_reports_exit() {
    init_logging();
    let client = client_for("/bin/false");

    let err = client
        .resume_conversation("session-1", Some("again".into()), OutputFormat::Json, InvocationOptions::default())
        .await
        .unwrap_err();
    match err {
        ClaudeError::ExecutionFailed { exit_code, .. } => assert_eq!(exit_code, Some(1)),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(client.processes_spawned(), 1);
}

#[tokio::test]
async fn test_echo_returns_text_verbatim() {
    init_logging();
    let client = client_for("echo");

    let result = client
        .run_single_prompt("hello world", OutputFormat::Text, InvocationOptions::default())
        .await
        .unwrap();
    assert_eq!(result.as_text(), Some("-p --output-format text -- hello world\n"));
}

#[tokio::test]
async fn test_blank_session_id_is_rejected() {
    init_logging();
    let client = client_for("echo");
    let err = client
        .resume_conversation("  ", None, OutputFormat::Text, InvocationOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(client.processes_spawned(), 0);
}

#[tokio::test]
async fn test_arguments_reach_the_process() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let args_file = dir.path().join("args.txt");
    let cli = script(
        dir.path(),
        "claude",
        &format!("for a in \"$@\"; do printf '%s\\n' \"$a\"; done > {}", args_file.display()),
    );
    let client = ClaudeCodeClient::new(
        Configuration::builder()
            .command(cli.to_string_lossy())
            .command_suffix(["--debug"])
            .build(),
    );

    let options = InvocationOptions::builder()
        .model("claude-sonnet-4-5")
        .max_turns(2)
        .allowed_tools(["Read", "Grep"])
        .build();
    client
        .continue_conversation(Some("it's \"quoted\"".into()), OutputFormat::Text, options)
        .await
        .unwrap();

    let args = std::fs::read_to_string(&args_file).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert_eq!(&args[..3], ["-p", "--output-format", "text"]);
    assert!(args.windows(2).any(|w| w == ["--model", "claude-sonnet-4-5"]));
    assert!(args.windows(2).any(|w| w == ["--max-turns", "2"]));
    assert!(args.windows(2).any(|w| w == ["--allowedTools", "Read,Grep"]));
    assert!(args.contains(&"--continue"));
    assert_eq!(&args[args.len() - 3..], ["--debug", "--", "it's \"quoted\""]);
}

#[tokio::test]
async fn test_run_with_stdin_and_command_info() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cli = script(dir.path(), "claude", "exec cat");
    let client = ClaudeCodeClient::new(
        Configuration::builder()
            .command(cli.to_string_lossy())
            .working_directory(dir.path())
            .build(),
    );

    let result = client
        .run_with_stdin("line one\nline two", OutputFormat::Text, InvocationOptions::default())
        .await
        .unwrap();
    assert_eq!(result.as_text(), Some("line one\nline two"));

    let info = client.last_executed_command_info().unwrap();
    assert_eq!(info.method, ExecutionMethod::RunWithStdin);
    assert_eq!(info.backend, BackendKind::DirectCli);
    assert_eq!(info.stdin.as_deref(), Some("line one\nline two"));
    assert_eq!(info.working_directory.as_deref(), Some(dir.path()));
    assert!(info.command_line.contains("--output-format text"));
    assert!(!info.command_line.contains("line one"));
}

#[tokio::test]
async fn test_run_with_large_stdin_through_echoing_cli() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cli = script(dir.path(), "claude", "exec cat");
    let client = client_for(cli.to_string_lossy());

    let payload = "x".repeat(2 * 1024 * 1024);
    let call = client.run_with_stdin(payload.clone(), OutputFormat::Text, InvocationOptions::default());
    let result = tokio::time::timeout(Duration::from_secs(10), call)
        .await
        .expect("large stdin payload stalled the call")
        .unwrap();
    assert_eq!(result.as_text().map(str::len), Some(payload.len()));
    assert_eq!(result.as_text(), Some(payload.as_str()));
}

#[tokio::test]
async fn test_json_output_is_one_value() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cli = script(
        dir.path(),
        "claude",
        r#"echo '{"type":"result","subtype":"success","result":"4","session_id":"s1"}'"#,
    );
    let client = client_for(cli.to_string_lossy());

    let result = client
        .run_single_prompt("2+2", OutputFormat::Json, InvocationOptions::default())
        .await
        .unwrap();
    assert_eq!(result.as_json().unwrap()["result"], "4");
}

#[tokio::test]
async fn test_live_stream_keeps_order_and_skips_bad_lines() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cli = script(dir.path(), "claude", TRANSCRIPT);
    let client = client_for(cli.to_string_lossy());

    let stream = client
        .run_single_prompt("2+2", OutputFormat::StreamJson, InvocationOptions::default())
        .await
        .unwrap()
        .into_stream()
        .unwrap();
    assert!(stream.is_live());

    let messages = stream.collect_messages().await.unwrap();
    let kinds: Vec<_> = messages.iter().map(Message::kind).collect();
    assert_eq!(kinds, ["system", "assistant", "result"]);
    assert!(messages[0].is_init());
    match &messages[1] {
        Message::Assistant { message, .. } => assert_eq!(message.text(), "4"),
        other => panic!("unexpected message: {other:?}"),
    }
    assert_eq!(messages[2].final_text(), Some("4"));
}

#[tokio::test]
async fn test_collected_stream_fails_on_bad_line() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cli = script(dir.path(), "claude", TRANSCRIPT);
    let client = client_for(cli.to_string_lossy());

    let options = InvocationOptions::builder()
        .delivery(StreamDelivery::Collected)
        .build();
    let err = client
        .run_single_prompt("2+2", OutputFormat::StreamJson, options)
        .await
        .unwrap_err();
    assert!(matches!(err, ClaudeError::Decode { .. }), "{err}");
}

#[tokio::test]
async fn test_stream_ends_with_exit_error() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cli = script(
        dir.path(),
        "claude",
        "echo '{\"type\":\"system\",\"subtype\":\"init\",\"session_id\":\"s1\"}'\necho 'API key missing' >&2\nexit 2",
    );
    let client = client_for(cli.to_string_lossy());

    let mut stream = client
        .run_single_prompt("hi", OutputFormat::StreamJson, InvocationOptions::default())
        .await
        .unwrap()
        .into_stream()
        .unwrap();

    assert!(stream.next().await.unwrap().unwrap().is_init());
    match stream.next().await.unwrap() {
        Err(ClaudeError::ExecutionFailed { exit_code, stderr, .. }) => {
            assert_eq!(exit_code, Some(2));
            assert!(stderr.contains("API key missing"));
        }
        other => panic!("unexpected item: {other:?}"),
    }
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_timeout_option() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cli = script(dir.path(), "claude", "exec sleep 30");
    let client = client_for(cli.to_string_lossy());

    let options = InvocationOptions::builder()
        .timeout(Duration::from_millis(200))
        .build();
    let err = client
        .run_single_prompt("hi", OutputFormat::Text, options)
        .await
        .unwrap_err();
    assert!(matches!(err, ClaudeError::Timeout(_)), "{err}");
}

#[tokio::test]
async fn test_live_stream_timeout_keeps_earlier_messages() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("cli.pid");
    let cli = script(
        dir.path(),
        "claude",
        &format!(
            "echo $$ > {}\necho '{{\"type\":\"system\",\"subtype\":\"init\",\"session_id\":\"s1\"}}'\nexec sleep 30",
            pid_file.display()
        ),
    );
    let client = client_for(cli.to_string_lossy());

    let options = InvocationOptions::builder()
        .timeout(Duration::from_millis(300))
        .build();
    let mut stream = client
        .run_single_prompt("hi", OutputFormat::StreamJson, options)
        .await
        .unwrap()
        .into_stream()
        .unwrap();

    assert!(stream.next().await.unwrap().unwrap().is_init());
    assert!(matches!(stream.next().await, Some(Err(ClaudeError::Timeout(_)))));
    assert!(stream.next().await.is_none());

    let pid: u32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
    assert!(wait_gone(pid, Duration::from_secs(5)).await, "{pid} outlived the timeout");
}

#[tokio::test]
async fn test_dropping_live_stream_stops_the_process() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("cli.pid");
    let cli = script(
        dir.path(),
        "claude",
        &format!(
            "echo $$ > {}\necho '{{\"type\":\"system\",\"subtype\":\"init\",\"session_id\":\"s1\"}}'\nexec sleep 30",
            pid_file.display()
        ),
    );
    let client = client_for(cli.to_string_lossy());

    let mut stream = client
        .run_single_prompt("hi", OutputFormat::StreamJson, InvocationOptions::default())
        .await
        .unwrap()
        .into_stream()
        .unwrap();
    assert!(stream.next().await.unwrap().unwrap().is_init());
    drop(stream);

    let pid: u32 = std::fs::read_to_string(&pid_file).unwrap().trim().parse().unwrap();
    assert!(wait_gone(pid, Duration::from_secs(5)).await, "{pid} outlived its stream");
}

#[tokio::test]
async fn test_client_cancel_stops_live_stream() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cli = script(
        dir.path(),
        "claude",
        "echo '{\"type\":\"system\",\"subtype\":\"init\",\"session_id\":\"s1\"}'\nexec sleep 30",
    );
    let client = client_for(cli.to_string_lossy());

    let mut stream = client
        .run_single_prompt("hi", OutputFormat::StreamJson, InvocationOptions::default())
        .await
        .unwrap()
        .into_stream()
        .unwrap();
    assert!(stream.next().await.unwrap().unwrap().is_init());

    client.cancel();
    assert!(matches!(stream.next().await, Some(Err(ClaudeError::Cancelled))));
    assert!(stream.next().await.is_none());

    // Later calls are unaffected
    client
        .update_configuration(|config| config.command = "echo".into())
        .unwrap();
    let result = client
        .run_single_prompt("after", OutputFormat::Text, InvocationOptions::default())
        .await
        .unwrap();
    assert!(result.as_text().unwrap().ends_with("after\n"));
}

#[tokio::test]
async fn test_caller_token_cancels_call() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let cli = script(dir.path(), "claude", "exec sleep 30");
    let client = client_for(cli.to_string_lossy());

    let token = CancellationToken::new();
    let options = InvocationOptions::builder().cancellation(token.clone()).build();
    let trigger = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();
    });

    let err = client
        .run_single_prompt("hi", OutputFormat::Text, options)
        .await
        .unwrap_err();
    assert!(matches!(err, ClaudeError::Cancelled), "{err}");
    trigger.await.unwrap();
}

#[tokio::test]
async fn test_backend_switch_is_rolled_back() {
    init_logging();
    let client = client_for("echo").with_locator(Arc::new(NoNode));

    let err = client.set_backend(BackendKind::BridgedRuntime).unwrap_err();
    assert!(matches!(err, ClaudeError::InvalidConfig(_)), "{err}");
    assert_eq!(client.configuration().backend, BackendKind::DirectCli);

    // The untouched CLI configuration keeps working
    client
        .run_single_prompt("still here", OutputFormat::Text, InvocationOptions::default())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_validate_is_idempotent_and_spawns_nothing() {
    init_logging();
    let client = client_for("echo");
    client.validate().unwrap();
    client.validate().unwrap();
    assert_eq!(client.processes_spawned(), 0);

    client
        .update_configuration(|config| config.command = "/nonexistent/command".into())
        .unwrap();
    assert!(matches!(client.validate(), Err(ClaudeError::NotInstalled(_))));
}

#[tokio::test]
async fn test_concurrent_calls_are_independent() {
    init_logging();
    let client = Arc::new(client_for("echo"));

    let calls = (0..4).map(|i| {
        let client = Arc::clone(&client);
        tokio::spawn(async move {
            client
                .run_single_prompt(format!("call {i}"), OutputFormat::Text, InvocationOptions::default())
                .await
        })
    });
    for (i, call) in futures::future::join_all(calls).await.into_iter().enumerate() {
        let result = call.unwrap().unwrap();
        assert!(result.as_text().unwrap().ends_with(&format!("-- call {i}\n")));
    }
    assert_eq!(client.processes_spawned(), 4);
}
