//! OpenAI-compatible client implementation

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::base::{Auth, HttpClientBase};
use crate::config::{InferenceConfig, resolve_api_key};
use crate::domain::ToolCallRequest;
use crate::infrastructure::model::adapter::MessageAdapter;
use crate::infrastructure::model::traits::ModelProvider;
use crate::infrastructure::model::types::{ModelError, ModelRequest, ModelResponse};

const PROVIDER_ID: &str = "openai-compatible";

/// OpenAI-compatible chat-completions client (llama.cpp, vLLM, LM Studio, OpenAI, ...)
#[derive(Clone)]
pub struct OpenAIClient {
    base: HttpClientBase,
}

impl OpenAIClient {
    pub fn from_config(config: &InferenceConfig) -> Self {
        let auth = match config.api_key.as_deref() {
            None => Auth::None,
            Some(env_var) => match resolve_api_key(Some(env_var)) {
                Some(key) => Auth::Bearer(key),
                None => Auth::Unresolved(env_var.to_string()),
            },
        };
        Self {
            base: HttpClientBase::new(PROVIDER_ID, config.url(), auth, config.timeout),
        }
    }

    pub fn url(&self) -> &str {
        &self.base.url
    }
}

#[async_trait]
impl ModelProvider for OpenAIClient {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        let mut payload = json!({
            "model": request.model,
            "messages": MessageAdapter::to_openai_format(&request.messages),
            "stream": false,
        });
        let with_tools = !request.tools.is_empty();
        if with_tools {
            payload["tools"] = Value::Array(MessageAdapter::tools_to_openai(&request.tools));
        }

        info!(
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending request to OpenAI-compatible provider"
        );

        let response = self.base.post_json(&payload).await?;
        let status = response.status();
        if with_tools
            && matches!(
                status,
                StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY
            )
        {
            warn!(%status, "provider rejected the request with tools attached");
            return Err(ModelError::ToolsRejected {
                provider: self.base.id.clone(),
                status,
            });
        }
        let body: OpenAIResponse = response
            .error_for_status()
            .map_err(|e| ModelError::network(&self.base.id, e))?
            .json()
            .await
            .map_err(|e| ModelError::network(&self.base.id, e))?;
        debug!("Received response from OpenAI-compatible provider");

        let message = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .ok_or_else(|| ModelError::invalid_response(&self.base.id, "missing message"))?;

        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, call)| {
                ToolCallRequest::new(
                    call.id.unwrap_or_else(|| format!("call_{index}")),
                    call.function.name,
                    call.function.arguments,
                )
            })
            .collect();

        Ok(ModelResponse::text(message.content.unwrap_or_default()).with_tool_calls(tool_calls))
    }
}

#[derive(Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Deserialize)]
struct OpenAIToolCall {
    #[serde(default)]
    id: Option<String>,
    function: OpenAIFunction,
}

#[derive(Deserialize)]
struct OpenAIFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tooling::{ToolDefinition, ToolOrigin};
    use crate::domain::{BackendMessage, MessageRole};
    use axum::Router;
    use axum::extract::State;
    use axum::http::StatusCode as HttpStatus;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Seen = Arc<Mutex<Vec<Value>>>;

    async fn spawn_backend(reject_tools: bool, reply: Value) -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let state = (seen.clone(), reject_tools, reply);
        let app = Router::new()
            .route(
                "/v1/chat/completions",
                post(
                    |State((seen, reject_tools, reply)): State<(Seen, bool, Value)>,
                     axum::Json(body): axum::Json<Value>| async move {
                        let has_tools = body.get("tools").is_some();
                        seen.lock().expect("lock").push(body);
                        if reject_tools && has_tools {
                            return (HttpStatus::BAD_REQUEST, "tools not supported").into_response();
                        }
                        axum::Json(reply).into_response()
                    },
                ),
            )
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}"), seen)
    }

    fn client_for(endpoint: String) -> OpenAIClient {
        OpenAIClient::from_config(&InferenceConfig {
            endpoint,
            api_path: "/v1/chat/completions".into(),
            model: "test-model".into(),
            api_key: None,
            timeout: Duration::from_secs(5),
        })
    }

    fn request_with_tools() -> ModelRequest {
        ModelRequest::new(
            "test-model",
            vec![BackendMessage::Chat {
                role: MessageRole::User,
                content: "hi".into(),
                tool_call_data: None,
            }],
        )
        .with_tools(vec![ToolDefinition {
            name: "echo".into(),
            description: "Echo".into(),
            input_schema: json!({"type": "object"}),
            origin: ToolOrigin::Internal,
        }])
    }

    #[tokio::test]
    async fn parses_content_and_tool_calls() {
        let reply = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [
                        {"id": "abc", "type": "function", "function": {"name": "echo", "arguments": "{\"text\":\"x\"}"}},
                        {"function": {"name": "echo", "arguments": {"text": "y"}}}
                    ]
                }
            }]
        });
        let (endpoint, seen) = spawn_backend(false, reply).await;
        let response = client_for(endpoint)
            .chat(request_with_tools())
            .await
            .expect("chat");

        assert_eq!(response.content, "");
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].id, "abc");
        assert_eq!(response.tool_calls[1].id, "call_1");
        assert_eq!(response.tool_calls[1].arguments, json!({"text": "y"}));

        let bodies = seen.lock().expect("lock");
        assert_eq!(bodies[0]["model"], "test-model");
        assert_eq!(bodies[0]["tools"][0]["function"]["name"], "echo");
    }

    #[tokio::test]
    async fn rejected_tools_map_to_tools_rejected() {
        let (endpoint, _) = spawn_backend(true, json!({})).await;
        let err = client_for(endpoint)
            .chat(request_with_tools())
            .await
            .expect_err("rejected");
        assert!(err.is_tools_rejected());
    }

    #[tokio::test]
    async fn missing_key_fails_before_sending() {
        let client = OpenAIClient::from_config(&InferenceConfig {
            api_key: Some("MINIFRAM_TEST_KEY_THAT_IS_NOT_SET".into()),
            ..InferenceConfig::default()
        });
        let err = client
            .chat(ModelRequest::new("m", Vec::new()))
            .await
            .expect_err("missing key");
        assert!(matches!(err, ModelError::MissingApiKey { .. }));
    }
}
