//! Integration tests for the streaming and eager query modes
//!
//! These tests run the full client against scripted CLI processes:
//! - Message order and parsing
//! - Early abandonment
//! - Callback delivery

use claudecode::testing::{ScriptedProcess, ScriptedSpawner, fixtures};
use claudecode::{ClaudeCodeClient, ClientConfig, ContentBlock, Message, QueryRequest};
use futures::StreamExt;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio_test::assert_ok;

fn client_with(script: ScriptedProcess) -> (ClaudeCodeClient, ScriptedSpawner) {
    let spawner = ScriptedSpawner::new(script);
    let client = ClaudeCodeClient::new(ClientConfig::default())
        .expect("inside runtime")
        .with_spawner(Arc::new(spawner.clone()));
    (client, spawner)
}

fn request(prompt: &str) -> QueryRequest {
    QueryRequest::new(prompt).unwrap()
}

#[tokio::test]
async fn test_stream_yields_messages_in_write_order() {
    let (client, spawner) = client_with(ScriptedProcess::new().with_lines([
        fixtures::system_init("session-1"),
        fixtures::assistant_tool_use("tool-1", "Read", json!({"file_path": "Cargo.toml"})),
        fixtures::user_tool_result("tool-1", "[workspace]"),
        fixtures::assistant_text("The workspace has three crates."),
        fixtures::result_success("session-1", "The workspace has three crates."),
    ]));

    let mut stream = client.query_stream(request("Describe this repo"));
    let mut types = Vec::new();
    while let Some(message) = stream.next().await {
        types.push(message.unwrap().type_name());
    }

    assert_eq!(types, ["system", "assistant", "user", "assistant", "result"]);
    assert_eq!(spawner.spawn_count(), 1);
    assert!(!spawner.was_killed());
}

#[tokio::test]
async fn test_eager_query_parses_every_variant() {
    let (client, _) = client_with(ScriptedProcess::new().with_lines([
        fixtures::system_init("session-2"),
        fixtures::assistant_tool_use("tool-1", "Bash", json!({"command": "ls"})),
        fixtures::assistant_text("Done"),
        fixtures::result_success("session-2", "Done"),
    ]));

    let messages = client.query(request("List files")).await.unwrap();
    assert_eq!(messages.len(), 4);

    let Message::System(system) = &messages[0] else {
        panic!("expected system message first");
    };
    assert_eq!(system.subtype, "init");
    assert_eq!(system.get("session_id"), Some(&json!("session-2")));

    let tool_use = messages[1].as_assistant().unwrap();
    assert_eq!(tool_use.tool_use_blocks().len(), 1);
    assert!(matches!(
        tool_use.content[0],
        ContentBlock::ToolUse { ref name, .. } if name == "Bash"
    ));

    let result = messages[3].as_result().unwrap();
    assert_eq!(result.session_id, "session-2");
    assert_eq!(result.result.as_deref(), Some("Done"));
    assert_eq!(result.input_tokens(), Some(12));
}

#[tokio::test]
async fn test_noise_lines_do_not_abort_stream() {
    let (client, _) = client_with(ScriptedProcess::new().with_lines([
        fixtures::system_init("s"),
        r#"{"type":"stream_event","event":{"type":"content_block_delta"}}"#.to_string(),
        String::new(),
        json!({
            "type": "assistant",
            "message": {"content": [{"type": "text", "text": "ok"}, {"type": "server_tool"}]}
        })
        .to_string(),
        fixtures::result_success("s", "ok"),
    ]));

    let messages = client.query(request("hi")).await.unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].as_assistant().unwrap().content.len(), 1);
}

#[tokio::test]
async fn test_abandoning_stream_kills_process() {
    let (client, spawner) = client_with(
        ScriptedProcess::new()
            .with_line(fixtures::system_init("s"))
            .with_line(fixtures::assistant_text("thinking..."))
            .hanging(),
    );

    let mut stream = client.query_stream(request("long task"));
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.type_name(), "system");
    drop(stream);

    assert!(spawner.was_killed());
}

#[tokio::test]
async fn test_callback_receives_messages_as_they_arrive() {
    let (client, _) =
        client_with(ScriptedProcess::new().with_lines(fixtures::conversation("s", "4")));

    let mut texts = Vec::new();
    let delivered = client
        .query_with_callback(request("What is 2 + 2?"), |message| {
            if let Some(assistant) = message.as_assistant() {
                texts.push(assistant.text());
            }
        })
        .await;
    assert_ok!(delivered);

    assert_eq!(texts, ["4"]);
}

#[tokio::test]
async fn test_async_variants_resolve() {
    let (client, _) =
        client_with(ScriptedProcess::new().with_lines(fixtures::conversation("s", "4")));

    let task = client.query_async(request("What is 2 + 2?"));
    let outcome_task = client.query_outcome_async(request("What is 2 + 2?"));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback_task = client.query_with_callback_async(request("What is 2 + 2?"), move |m| {
        sink.lock().unwrap().push(m.type_name());
    });

    assert_eq!(task.await.unwrap().len(), 3);
    let outcome = outcome_task.await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.messages().len(), 3);
    assert_ok!(callback_task.await);
    assert_eq!(*seen.lock().unwrap(), ["system", "assistant", "result"]);
}

#[tokio::test]
async fn test_each_query_gets_its_own_process() {
    let (client, spawner) =
        client_with(ScriptedProcess::new().with_lines(fixtures::conversation("s", "4")));

    for _ in 0..3 {
        client.query(request("again")).await.unwrap();
    }
    assert_eq!(spawner.spawn_count(), 3);
}
