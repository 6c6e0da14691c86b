// Tool routing tests - internal handlers and sh-scripted external tool servers.

mod support;

use minifram_core::agent::OutputEmitter;
use minifram_core::config::ServerConfig;
use minifram_core::domain::{AgentStatus, MessageRole, OutputKind};
use minifram_core::tooling::{
    HandlerResult, ServerHealth, ToolError, ToolOrigin, ToolOutput, ToolRouter,
};
use serde_json::{Map as JsonMap, Value, json};
use support::{ScriptedProvider, harness, text, tool_call};

/// A tool server that answers every `tools/call` with the uppercased `text`
/// argument, echoing the request id.
#[cfg(unix)]
fn shouting_server(name: &str, tool: &str) -> ServerConfig {
    let script = format!(
        r#"while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
  case "$line" in
    *'"method":"initialize"'*) printf '{{"jsonrpc":"2.0","id":%s,"result":{{"serverInfo":{{"name":"{name}"}}}}}}\n' "$id" ;;
    *'"method":"tools/list"'*) printf '{{"jsonrpc":"2.0","id":%s,"result":{{"tools":[{{"name":"{tool}","description":"Shout text","inputSchema":{{"type":"object"}}}}]}}}}\n' "$id" ;;
    *'"method":"tools/call"'*)
      text=$(printf '%s' "$line" | sed -n 's/.*"text":"\([^"]*\)".*/\1/p' | tr '[:lower:]' '[:upper:]')
      printf '{{"jsonrpc":"2.0","id":%s,"result":{{"content":[{{"type":"text","text":"%s"}}],"isError":false}}}}\n' "$id" "$text" ;;
  esac
done"#
    );
    ServerConfig::new(name, "sh").with_args(["-c".to_string(), script])
}

async fn count(arguments: JsonMap<String, Value>) -> HandlerResult {
    let items = arguments
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::len)
        .unwrap_or(0);
    Ok(ToolOutput::Structured(json!({ "count": items })))
}

#[tokio::test]
async fn internal_tools_are_routed_by_name() {
    let router = ToolRouter::new();
    router
        .register_internal("count", "Count items", json!({"type": "object"}), count)
        .await
        .expect("register");

    let mut arguments = JsonMap::new();
    arguments.insert("items".into(), json!([1, 2, 3]));
    let result = router.call("count", arguments).await.expect("call");
    assert_eq!(serde_json::from_str::<Value>(&result).expect("json"), json!({"count": 3}));

    match router.call("nope", JsonMap::new()).await {
        Err(ToolError::NotFound { name, available }) => {
            assert_eq!(name, "nope");
            assert_eq!(available, vec!["count".to_string()]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn external_servers_load_and_report_failures_and_conflicts() {
    let router = ToolRouter::new();
    router
        .register_internal("count", "Count items", json!({"type": "object"}), count)
        .await
        .expect("register");

    let report = router
        .load_external(&[
            shouting_server("loud", "shout"),
            ServerConfig::new("ghost", "/definitely/not/a/binary"),
            shouting_server("echoing", "shout"),
        ])
        .await;

    assert_eq!(report.started, vec!["loud".to_string(), "echoing".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "ghost");
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].tool, "shout");
    assert_eq!(report.conflicts[0].kept, ToolOrigin::External("loud".into()));

    let names = router.tool_names().await;
    assert_eq!(names, vec!["count".to_string(), "shout".to_string()]);

    let mut arguments = JsonMap::new();
    arguments.insert("text".into(), json!("hello"));
    assert_eq!(router.call("shout", arguments.clone()).await.expect("first"), "HELLO");
    assert_eq!(router.call("shout", arguments).await.expect("second"), "HELLO");

    let statuses = router.server_status().await;
    assert_eq!(statuses.len(), 2);
    assert!(statuses.iter().all(|status| status.status == ServerHealth::Active));

    router.shutdown().await;
    assert_eq!(router.tool_names().await, vec!["count".to_string()]);
}

#[cfg(unix)]
#[tokio::test]
async fn agent_uses_external_tool_and_sees_its_result() {
    let router = ToolRouter::new();
    let report = router.load_external(&[shouting_server("loud", "shout")]).await;
    assert!(report.failed.is_empty());

    let provider = ScriptedProvider::new(vec![
        tool_call("call-1", "shout", json!({"text": "quiet please"})),
        text("[CONTRACT COMPLETE]"),
    ]);
    let h = harness(provider.clone(), router).await;

    let created = h.service.create().await;
    h.service
        .set_contract(&created.agent_id, "shout something")
        .await
        .expect("contract");
    let run = h
        .service
        .start(&created.agent_id, OutputEmitter::Recording)
        .await
        .expect("start");
    assert_eq!(run.await.expect("join"), AgentStatus::Completed);

    let view = h.service.view(&created.agent_id).await.expect("view");
    let call = view
        .output
        .iter()
        .find(|entry| entry.kind == OutputKind::ToolCall)
        .expect("tool call output");
    assert_eq!(call.tool_call.as_deref(), Some("shout text=quiet please"));
    assert!(
        view.output
            .iter()
            .any(|entry| entry.kind == OutputKind::ToolResult && entry.content == "→ QUIET PLEASE")
    );

    let requests = provider.requests();
    assert!(requests[0].tools.iter().any(|tool| tool.name == "shout"));
    let second = &requests[1].messages;
    let last = second.last().expect("tool result");
    assert_eq!(last.role(), MessageRole::Tool);
    assert_eq!(last.content(), "QUIET PLEASE");

    h.tools.shutdown().await;
}
