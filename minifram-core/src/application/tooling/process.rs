use super::error::ToolInvokeError;
use super::interface::{ContentBlock, ToolCallResult, ToolDefinition, ToolOrigin};
use crate::config::ServerConfig;
use serde_json::{Map as JsonMap, Value, json};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";
const CLIENT_NAME: &str = "minifram";
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Client side of one tool server speaking newline-delimited JSON-RPC over stdio.
///
/// Requests are strictly sequential: the reader lock is held from the moment a
/// request is written until its response line has been read. The writer has its
/// own lock, released after every write, so `close` never waits on a pending read.
#[derive(Clone)]
pub struct McpProcess {
    inner: Arc<McpProcessInner>,
}

struct McpProcessInner {
    server: ServerConfig,
    child: AsyncMutex<Option<Child>>,
    writer: AsyncMutex<Option<BufWriter<ChildStdin>>>,
    reader: AsyncMutex<Option<Lines<BufReader<ChildStdout>>>>,
    id_counter: AtomicU64,
    server_info: AsyncMutex<Option<Value>>,
    tools: AsyncMutex<Vec<ToolDefinition>>,
}

impl McpProcess {
    pub fn new(server: ServerConfig) -> Self {
        Self {
            inner: Arc::new(McpProcessInner {
                server,
                child: AsyncMutex::new(None),
                writer: AsyncMutex::new(None),
                reader: AsyncMutex::new(None),
                id_counter: AtomicU64::new(1),
                server_info: AsyncMutex::new(None),
                tools: AsyncMutex::new(Vec::new()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.server.name
    }

    /// Launch the process, perform the handshake and fetch the tool list.
    pub async fn start(&self) -> Result<(), ToolInvokeError> {
        if self.inner.child.lock().await.is_some() {
            return Ok(());
        }
        self.inner.spawn().await?;
        if let Err(err) = self.inner.handshake().await {
            self.close().await;
            return Err(err);
        }
        Ok(())
    }

    /// Tools advertised during startup. Never refreshed afterwards.
    pub async fn tools(&self) -> Vec<ToolDefinition> {
        self.inner.tools.lock().await.clone()
    }

    pub async fn server_info(&self) -> Option<Value> {
        self.inner.server_info.lock().await.clone()
    }

    pub async fn call_tool(
        &self,
        tool: &str,
        arguments: JsonMap<String, Value>,
    ) -> Result<ToolCallResult, ToolInvokeError> {
        let params = json!({
            "name": tool,
            "arguments": Value::Object(arguments),
        });
        let result = self.inner.send_request("tools/call", params).await?;
        let content = result
            .get("content")
            .and_then(Value::as_array)
            .map(|blocks| blocks.iter().cloned().map(ContentBlock::from_value).collect())
            .unwrap_or_default();
        let is_error = result
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(ToolCallResult { content, is_error })
    }

    /// True while the child process has not exited.
    pub async fn is_active(&self) -> bool {
        let mut child = self.inner.child.lock().await;
        match child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Close stdin, give the process a grace period to exit, then kill it.
    ///
    /// A call still waiting on a response fails with a transport error once the
    /// process is gone.
    pub async fn close(&self) {
        let writer = self.inner.writer.lock().await.take();
        drop(writer);

        let child = self.inner.child.lock().await.take();
        let Some(mut child) = child else {
            self.inner.reader.lock().await.take();
            return;
        };
        let server = &self.inner.server.name;
        match timeout(CLOSE_GRACE, child.wait()).await {
            Ok(Ok(status)) => debug!(server = %server, %status, "tool server exited"),
            Ok(Err(err)) => warn!(server = %server, %err, "failed to wait for tool server"),
            Err(_) => {
                warn!(server = %server, "tool server ignored shutdown; killing");
                if let Err(err) = child.kill().await {
                    debug!(server = %server, %err, "failed to kill tool server (may have already exited)");
                }
            }
        }
        self.inner.reader.lock().await.take();
    }
}

impl McpProcessInner {
    async fn spawn(&self) -> Result<(), ToolInvokeError> {
        let mut command = Command::new(&self.server.command);
        command
            .args(&self.server.args)
            .envs(&self.server.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &self.server.workdir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| ToolInvokeError::Launch {
            server: self.server.name.clone(),
            source,
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.transport_error("failed to capture server stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| self.transport_error("failed to capture server stdout"))?;

        *self.writer.lock().await = Some(BufWriter::new(stdin));
        *self.reader.lock().await = Some(BufReader::new(stdout).lines());
        *self.child.lock().await = Some(child);
        Ok(())
    }

    async fn handshake(&self) -> Result<(), ToolInvokeError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": CLIENT_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
        });
        let init = self.send_request("initialize", params).await?;
        *self.server_info.lock().await = init.get("serverInfo").cloned();

        self.send_notification("notifications/initialized").await?;

        let listing = self.send_request("tools/list", json!({})).await?;
        let tools = self.parse_tools(&listing);
        info!(
            server = %self.server.name,
            tools = tools.len(),
            "tool server ready"
        );
        *self.tools.lock().await = tools;
        Ok(())
    }

    fn parse_tools(&self, listing: &Value) -> Vec<ToolDefinition> {
        let Some(array) = listing.get("tools").and_then(Value::as_array) else {
            return Vec::new();
        };
        array
            .iter()
            .filter_map(|tool| {
                let name = tool.get("name").and_then(Value::as_str)?;
                Some(ToolDefinition {
                    name: name.to_string(),
                    description: tool
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    input_schema: tool
                        .get("inputSchema")
                        .cloned()
                        .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
                    origin: ToolOrigin::External(self.server.name.clone()),
                })
            })
            .collect()
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        let mut guard = self.reader.lock().await;
        let reader = guard.as_mut().ok_or_else(|| self.not_running())?;

        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        self.write_message(&payload).await?;

        let response = self.read_response(reader).await?;
        if !response_matches(response.get("id"), id) {
            return Err(self.protocol_error(format!(
                "expected response id {id}, got {}",
                response.get("id").cloned().unwrap_or(Value::Null)
            )));
        }
        if let Some(error) = response.get("error") {
            return Err(ToolInvokeError::Remote {
                server: self.server.name.clone(),
                code: error.get("code").and_then(Value::as_i64).unwrap_or(-32000),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn send_notification(&self, method: &str) -> Result<(), ToolInvokeError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
        });
        self.write_message(&payload).await
    }

    async fn write_message(&self, message: &Value) -> Result<(), ToolInvokeError> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or_else(|| self.not_running())?;
        let mut encoded = message.to_string();
        encoded.push('\n');
        writer
            .write_all(encoded.as_bytes())
            .await
            .map_err(|err| self.transport_error(err.to_string()))?;
        writer
            .flush()
            .await
            .map_err(|err| self.transport_error(err.to_string()))
    }

    /// Next JSON-RPC response line; blank lines and server notifications are skipped.
    async fn read_response(
        &self,
        reader: &mut Lines<BufReader<ChildStdout>>,
    ) -> Result<Value, ToolInvokeError> {
        loop {
            let line = reader
                .next_line()
                .await
                .map_err(|err| self.transport_error(err.to_string()))?
                .ok_or_else(|| self.transport_error("server closed its output stream"))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(trimmed)
                .map_err(|err| self.protocol_error(format!("undecodable line: {err}")))?;
            if value.get("id").is_none() && value.get("method").is_some() {
                debug!(
                    server = %self.server.name,
                    method = value.get("method").and_then(serde_json::Value::as_str).unwrap_or_default(),
                    "ignoring server notification"
                );
                continue;
            }
            return Ok(value);
        }
    }

    fn not_running(&self) -> ToolInvokeError {
        ToolInvokeError::NotRunning {
            server: self.server.name.clone(),
        }
    }

    fn transport_error(&self, message: impl Into<String>) -> ToolInvokeError {
        ToolInvokeError::Transport {
            server: self.server.name.clone(),
            message: message.into(),
        }
    }

    fn protocol_error(&self, message: impl Into<String>) -> ToolInvokeError {
        ToolInvokeError::Protocol {
            server: self.server.name.clone(),
            message: message.into(),
        }
    }
}

fn response_matches(id: Option<&Value>, expected: u64) -> bool {
    match id {
        Some(Value::Number(num)) => num.as_u64() == Some(expected),
        Some(Value::String(text)) => text == &expected.to_string(),
        _ => false,
    }
}

/// Shell script that answers the handshake and a single `tools/call` with canned lines.
#[cfg(all(test, unix))]
pub(crate) fn scripted_server(name: &str, call_response: &str) -> ServerConfig {
    let script = format!(
        r#"while IFS= read -r line; do
  case "$line" in
    *'"method":"initialize"'*) printf '%s\n' '{{"jsonrpc":"2.0","id":1,"result":{{"protocolVersion":"2024-11-05","serverInfo":{{"name":"fake"}}}}}}' ;;
    *'"method":"tools/list"'*) printf '%s\n' '' '{{"jsonrpc":"2.0","method":"notifications/message"}}' '{{"jsonrpc":"2.0","id":2,"result":{{"tools":[{{"name":"echo","description":"Echo text back","inputSchema":{{"type":"object","properties":{{"text":{{"type":"string"}}}}}}}}]}}}}' ;;
    *'"method":"tools/call"'*) printf '%s\n' '{call_response}' ;;
  esac
done"#
    );
    ServerConfig::new(name, "sh").with_args(["-c".to_string(), script])
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handshake_lists_tools_and_calls_them() {
        let process = McpProcess::new(scripted_server(
            "fake",
            r#"{"jsonrpc":"2.0","id":3,"result":{"content":[{"type":"text","text":"pong"}],"isError":false}}"#,
        ));
        process.start().await.expect("start");
        assert!(process.is_active().await);

        let tools = process.tools().await;
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "echo");
        assert_eq!(tools[0].origin, ToolOrigin::External("fake".into()));
        assert_eq!(
            process.server_info().await,
            Some(json!({"name": "fake"}))
        );

        let mut arguments = JsonMap::new();
        arguments.insert("text".into(), json!("ping"));
        let result = process.call_tool("echo", arguments).await.expect("call");
        assert_eq!(result.joined_text(), "pong");
        assert!(!result.is_error);

        process.close().await;
        assert!(!process.is_active().await);
        process.close().await;
    }

    #[tokio::test]
    async fn remote_errors_surface_code_and_message() {
        let process = McpProcess::new(scripted_server(
            "fake",
            r#"{"jsonrpc":"2.0","id":3,"error":{"code":-32602,"message":"bad params"}}"#,
        ));
        process.start().await.expect("start");
        let err = process
            .call_tool("echo", JsonMap::new())
            .await
            .expect_err("remote error");
        match err {
            ToolInvokeError::Remote { code, message, .. } => {
                assert_eq!(code, -32602);
                assert_eq!(message, "bad params");
            }
            other => panic!("unexpected error: {other}"),
        }
        process.close().await;
    }

    #[tokio::test]
    async fn close_does_not_wait_for_a_hung_call() {
        let process = McpProcess::new(scripted_server("hang", ""));
        process.start().await.expect("start");

        let caller = process.clone();
        let call = tokio::spawn(async move { caller.call_tool("echo", JsonMap::new()).await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        timeout(Duration::from_secs(8), process.close())
            .await
            .expect("close finished while a call was pending");
        assert!(!process.is_active().await);

        let result = timeout(Duration::from_secs(8), call)
            .await
            .expect("pending call returned")
            .expect("join");
        assert!(matches!(
            result,
            Err(ToolInvokeError::Transport { .. } | ToolInvokeError::NotRunning { .. })
        ));
    }

    #[tokio::test]
    async fn mismatched_response_id_is_a_protocol_error() {
        let process = McpProcess::new(scripted_server(
            "fake",
            r#"{"jsonrpc":"2.0","id":99,"result":{}}"#,
        ));
        process.start().await.expect("start");
        let err = process
            .call_tool("echo", JsonMap::new())
            .await
            .expect_err("protocol error");
        assert!(matches!(err, ToolInvokeError::Protocol { .. }));
        process.close().await;
    }

    #[tokio::test]
    async fn missing_binary_fails_to_launch() {
        let process = McpProcess::new(ServerConfig::new(
            "ghost",
            "/nonexistent/minifram-tool-server",
        ));
        let err = process.start().await.expect_err("launch failure");
        assert!(matches!(err, ToolInvokeError::Launch { .. }));
        assert!(!process.is_active().await);
    }

    #[tokio::test]
    async fn calls_before_start_report_not_running() {
        let process = McpProcess::new(ServerConfig::new("idle", "sh"));
        let err = process
            .call_tool("echo", JsonMap::new())
            .await
            .expect_err("not running");
        assert!(matches!(err, ToolInvokeError::NotRunning { .. }));
    }
}
