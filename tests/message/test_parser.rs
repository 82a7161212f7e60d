//! Unit tests for message parser
//!
//! Tests decoding of stream-json records into typed Message objects

use claude_code_client::types::{ContentBlock, ErrorPayload};
use claude_code_client::{ClaudeError, Message, decode_line, parse_message};
use serde_json::json;

#[test]
fn test_parse_user_message() {
    let data = json!({
        "type": "user",
        "message": {
            "role": "user",
            "content": "Hello, Claude!"
        },
        "session_id": "abc"
    });

    let message = parse_message(data).unwrap();
    assert_eq!(message.kind(), "user");
    assert_eq!(message.session_id().map(|s| s.as_str()), Some("abc"));
}

#[test]
fn test_parse_assistant_message_blocks() {
    let data = json!({
        "type": "assistant",
        "message": {
            "model": "claude-sonnet-4-5",
            "content": [
                {"type": "thinking", "thinking": "hmm", "signature": "sig"},
                {"type": "text", "text": "Hello "},
                {"type": "tool_use", "id": "t1", "name": "Read", "input": {"file_path": "a.rs"}},
                {"type": "image", "source": {}},
                {"type": "text", "text": "world"}
            ]
        }
    });

    let Message::Assistant { message, .. } = parse_message(data).unwrap() else {
        panic!("expected an assistant message");
    };
    assert_eq!(message.text(), "Hello world");
    assert!(matches!(message.content[2], ContentBlock::ToolUse { ref name, .. } if name == "Read"));
    assert_eq!(message.content[3], ContentBlock::Other);
}

#[test]
fn test_parse_init_and_result() {
    let init = decode_line(
        br#"{"type":"system","subtype":"init","session_id":"s1","model":"m","tools":["Read"]}"#,
    )
    .unwrap();
    assert!(init.is_init());
    let Message::System { data, .. } = init else {
        panic!("expected a system message");
    };
    assert_eq!(data["model"], "m");

    let result = decode_line(
        br#"{"type":"result","subtype":"success","is_error":false,"duration_ms":10,"num_turns":1,"session_id":"s1","total_cost_usd":0.25,"result":"4"}"#,
    )
    .unwrap();
    assert!(result.is_result());
    assert_eq!(result.final_text(), Some("4"));
    assert_eq!(result.cost_usd(), Some(0.25));
    assert_eq!(result.error_message(), None);
}

#[test]
fn test_error_messages() {
    let failed = parse_message(json!({
        "type": "result",
        "subtype": "error_max_turns",
        "is_error": true
    }))
    .unwrap();
    assert_eq!(failed.error_message().as_deref(), Some("error_max_turns"));

    let bridge = parse_message(json!({
        "type": "error",
        "error": {"message": "no api key", "name": "Error"}
    }))
    .unwrap();
    assert!(matches!(bridge, Message::Error { error: Some(ErrorPayload::Detail(_)), .. }));
    assert_eq!(bridge.error_message().as_deref(), Some("no api key"));

    let plain = parse_message(json!({"type": "error", "error": "rate limited"})).unwrap();
    assert_eq!(plain.error_message().as_deref(), Some("rate limited"));
}

#[test]
fn test_parse_invalid_message() {
    let data = json!({
        "type": "invalid_type",
        "data": "some data"
    });

    let err = parse_message(data).unwrap_err();
    assert!(matches!(err, ClaudeError::Decode { .. }));
    assert!(parse_message(json!({"no_type": true})).is_err());
    assert!(parse_message(json!({"type": 7})).is_err());
}

#[test]
fn test_decode_line_keeps_offending_text() {
    let err = decode_line(b"  not json at all  ").unwrap_err();
    match err {
        ClaudeError::Decode { line, .. } => assert_eq!(line.as_deref(), Some("not json at all")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(decode_line(&[0xff, 0xfe]).is_err());
}

#[test]
fn test_decode_line_ignores_surrounding_whitespace() {
    let message = decode_line(b"\t{\"type\":\"stream_event\",\"event\":{\"type\":\"ping\"}}\r\n").unwrap();
    assert_eq!(message.kind(), "stream_event");
}
