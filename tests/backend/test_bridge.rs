//! Integration tests for the bridged runtime backend
//!
//! Node.js is replaced by a shell script in a fake install prefix; the
//! script records what it was given and prints a canned transcript.

#![cfg(unix)]

#[path = "../common/mod.rs"]
mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use claude_code_client::backend::{Backend, BackendCapabilities, SDK_PATH_ENV, bridge_source};
use claude_code_client::message::BridgeRequest;
use claude_code_client::{
    BackendKind, ClaudeCodeClient, ClaudeError, Configuration, InvocationOptions, OutputFormat,
    RuntimeLocator,
};

use common::{fake_node, init_logging};

/// Locator that counts how often it is asked
#[derive(Debug, Default)]
struct CountingLocator {
    found: Option<PathBuf>,
    calls: AtomicUsize,
}

impl CountingLocator {
    fn finding(node: PathBuf) -> Self {
        Self {
            found: Some(node),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RuntimeLocator for CountingLocator {
    fn locate(&self) -> Option<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.found.clone()
    }
}

const TRANSCRIPT_NODE: &str = r#"printf '%s' "$2" > "$(dirname "$0")/request.json"
printf '%s' "$CLAUDE_AGENT_SDK_PATH" > "$(dirname "$0")/sdk-path.txt"
printf '%s' "$GREETING" > "$(dirname "$0")/greeting.txt"
echo '{"type":"system","subtype":"init","session_id":"b1"}'
echo '{"type":"assistant","message":{"content":[{"type":"text","text":"hi"}]},"session_id":"b1"}'
echo '{"type":"result","subtype":"success","session_id":"b1","result":"hi"}'"#;

fn bridge_config(node: PathBuf) -> Configuration {
    Configuration::builder()
        .backend(BackendKind::BridgedRuntime)
        .node_executable(node)
        .build()
}

#[test]
fn test_explicit_node_without_sdk_is_invalid() {
    init_logging();
    let prefix = tempfile::tempdir().unwrap();
    let node = fake_node(prefix.path(), "exit 0", false);
    let locator = Arc::new(CountingLocator::default());
    let client = ClaudeCodeClient::new(bridge_config(node)).with_locator(locator.clone());

    let err = client.validate().unwrap_err();
    match err {
        ClaudeError::InvalidConfig(message) => assert!(message.contains("node_modules"), "{message}"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(locator.calls(), 0, "explicit interpreter must not fall back");
    assert_eq!(client.processes_spawned(), 0);
}

#[test]
fn test_explicit_node_with_sdk_validates() {
    init_logging();
    let prefix = tempfile::tempdir().unwrap();
    let node = fake_node(prefix.path(), "exit 0", true);
    let locator = CountingLocator::default();

    let backend = Backend::validate(&bridge_config(node.clone()), &locator).unwrap();
    let Backend::Bridge(bridge) = &backend else {
        panic!("expected the bridge backend");
    };
    assert_eq!(bridge.node(), node);
    assert!(bridge.package().ends_with("lib/node_modules/@anthropic-ai/claude-agent-sdk"));
    assert_eq!(std::fs::read_to_string(bridge.script()).unwrap(), bridge_source());
    assert_eq!(locator.calls(), 0);
    assert!(!backend.records_command_info());
}

#[test]
fn test_fallback_to_auto_detect() {
    init_logging();
    let prefix = tempfile::tempdir().unwrap();
    let detected = fake_node(prefix.path(), "exit 0", true);
    let locator = CountingLocator::finding(detected.clone());

    let mut config = bridge_config(PathBuf::from("/nonexistent/bin/node"));
    assert!(Backend::validate(&config, &locator).unwrap_err().is_validation());
    assert_eq!(locator.calls(), 0);

    config.fallback_to_auto_detect = true;
    let backend = Backend::validate(&config, &locator).unwrap();
    assert!(matches!(backend, Backend::Bridge(ref b) if b.node() == detected));
    assert_eq!(locator.calls(), 1);
}

#[test]
fn test_no_node_anywhere_is_not_installed() {
    init_logging();
    let config = Configuration::builder()
        .backend(BackendKind::BridgedRuntime)
        .build();
    let err = Backend::validate(&config, &CountingLocator::default()).unwrap_err();
    assert!(matches!(err, ClaudeError::NotInstalled(_)), "{err}");
}

#[test]
fn test_missing_bridge_script_override() {
    init_logging();
    let prefix = tempfile::tempdir().unwrap();
    let node = fake_node(prefix.path(), "exit 0", true);
    let mut config = bridge_config(node);
    config.bridge_script = Some(prefix.path().join("missing.mjs"));

    let err = Backend::validate(&config, &CountingLocator::default()).unwrap_err();
    assert!(matches!(err, ClaudeError::InvalidConfig(_)), "{err}");
}

#[tokio::test]
async fn test_json_is_unsupported_and_spawns_nothing() {
    init_logging();
    let prefix = tempfile::tempdir().unwrap();
    let node = fake_node(prefix.path(), TRANSCRIPT_NODE, true);
    let client = ClaudeCodeClient::new(bridge_config(node));

    for format in [OutputFormat::Json, OutputFormat::Text] {
        let err = client
            .run_single_prompt("hi", format, InvocationOptions::default())
            .await
            .unwrap_err();
        assert!(
            matches!(err, ClaudeError::UnsupportedOutputFormat { backend: BackendKind::BridgedRuntime, .. }),
            "{err}"
        );
    }
    assert_eq!(client.processes_spawned(), 0);
}

#[tokio::test]
async fn test_bridge_request_reaches_the_runtime() {
    init_logging();
    let prefix = tempfile::tempdir().unwrap();
    let node = fake_node(prefix.path(), TRANSCRIPT_NODE, true);
    let client = ClaudeCodeClient::new(bridge_config(node));

    let options = InvocationOptions::builder()
        .max_turns(3)
        .allowed_tools(["Read"])
        .append_system_prompt("be brief")
        .env("GREETING", "hello from the caller")
        .build();
    let messages = client
        .resume_conversation("sess-9", Some("hello".into()), OutputFormat::StreamJson, options)
        .await
        .unwrap()
        .into_stream()
        .unwrap()
        .collect_messages()
        .await
        .unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].final_text(), Some("hi"));
    assert!(client.last_executed_command_info().is_none());

    let bin = prefix.path().join("bin");
    let request: BridgeRequest =
        serde_json::from_str(&std::fs::read_to_string(bin.join("request.json")).unwrap()).unwrap();
    assert_eq!(request.prompt, "hello");
    assert_eq!(request.options.max_turns, Some(3));
    assert_eq!(request.options.resume.as_deref(), Some("sess-9"));
    assert_eq!(request.options.allowed_tools, Some(vec!["Read".to_string()]));

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(bin.join("request.json")).unwrap()).unwrap();
    assert_eq!(raw["options"]["systemPrompt"]["preset"], "claude_code");
    assert_eq!(raw["options"]["systemPrompt"]["append"], "be brief");
    // Per-call environment travels in the process environment only
    assert!(raw["options"].get("env").is_none());
    assert_eq!(
        std::fs::read_to_string(bin.join("greeting.txt")).unwrap(),
        "hello from the caller"
    );

    let sdk_path = std::fs::read_to_string(bin.join("sdk-path.txt")).unwrap();
    assert!(sdk_path.ends_with("@anthropic-ai/claude-agent-sdk"), "{SDK_PATH_ENV}={sdk_path}");
}

#[tokio::test]
async fn test_bridge_failure_surfaces_structured_error() {
    init_logging();
    let prefix = tempfile::tempdir().unwrap();
    let node = fake_node(
        prefix.path(),
        r#"echo '{"type":"error","error":{"message":"no api key","name":"Error"}}' >&2
exit 1"#,
        true,
    );
    let client = ClaudeCodeClient::new(bridge_config(node));

    let err = client
        .run_single_prompt("hi", OutputFormat::StreamJson, InvocationOptions::default())
        .await
        .unwrap()
        .into_stream()
        .unwrap()
        .collect_messages()
        .await
        .unwrap_err();
    match err {
        ClaudeError::ExecutionFailed { exit_code, message, .. } => {
            assert_eq!(exit_code, Some(1));
            assert_eq!(message, "no api key");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_bridge_sessions_are_empty() {
    init_logging();
    let prefix = tempfile::tempdir().unwrap();
    let node = fake_node(prefix.path(), "exit 0", true);
    let client = ClaudeCodeClient::new(
        Configuration::builder()
            .command("echo")
            .node_executable(node)
            .build(),
    );

    client
        .run_single_prompt("hi", OutputFormat::Text, InvocationOptions::default())
        .await
        .unwrap();
    assert!(client.last_executed_command_info().is_some());

    client.set_backend(BackendKind::BridgedRuntime).unwrap();
    assert!(client.list_sessions().await.unwrap().is_empty());
    assert!(client.last_executed_command_info().is_none());
}
