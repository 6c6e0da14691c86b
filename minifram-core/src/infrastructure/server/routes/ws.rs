//! Duplex channel for observing and steering one agent.
//!
//! Incoming: `{"type": "set_contract", "contract"}`, `start`, `stop`, `restart`.
//! Outgoing: `init` on connect, replies to each command, then every output and
//! status event of a run started from this socket.

use super::super::state::ServerState;
use crate::agent::{AgentEvent, AgentService, OutputEmitter};
use crate::domain::AgentStatus;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const OUTBOUND_BUFFER: usize = 256;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientCommand {
    SetContract { contract: String },
    Start,
    Stop,
    Restart,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerReply {
    Init {
        id: String,
        status: AgentStatus,
        contract: String,
    },
    ContractSet {
        contract: String,
    },
    StopRequested,
    Status {
        content: AgentStatus,
    },
    Error {
        content: String,
    },
}

pub async fn agent_socket_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, id))
}

async fn handle_socket(socket: WebSocket, state: Arc<ServerState>, id: String) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (outbound, mut outbound_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER);

    let writer = tokio::spawn(async move {
        while let Some(text) = outbound_rx.recv().await {
            if ws_sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    let service = state.service().clone();
    let agent = match service.get(&id).await {
        Ok(agent) => agent,
        Err(err) => {
            send_reply(&outbound, &ServerReply::Error {
                content: err.to_string(),
            })
            .await;
            drop(outbound);
            let _ = writer.await;
            return;
        }
    };

    let init = {
        let state = agent.lock().await;
        ServerReply::Init {
            id: state.id().to_string(),
            status: state.status(),
            contract: state.contract.clone(),
        }
    };
    send_reply(&outbound, &init).await;
    info!(agent_id = %id, "Observer attached");

    while let Some(Ok(message)) = ws_stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let command = match serde_json::from_str::<ClientCommand>(text.as_str()) {
            Ok(command) => command,
            Err(err) => {
                debug!(agent_id = %id, %err, "Ignoring malformed socket message");
                send_reply(&outbound, &ServerReply::Error {
                    content: format!("invalid message: {err}"),
                })
                .await;
                continue;
            }
        };
        let reply = handle_command(&service, &id, command, &outbound).await;
        if let Some(reply) = reply {
            send_reply(&outbound, &reply).await;
        }
    }

    info!(agent_id = %id, "Observer detached");
}

async fn handle_command(
    service: &AgentService,
    id: &str,
    command: ClientCommand,
    outbound: &mpsc::Sender<String>,
) -> Option<ServerReply> {
    match command {
        ClientCommand::SetContract { contract } => {
            match service.set_contract(id, contract.clone()).await {
                Ok(()) => Some(ServerReply::ContractSet { contract }),
                Err(err) => Some(error_reply(err)),
            }
        }
        ClientCommand::Start => {
            let (events, events_rx) = mpsc::channel::<AgentEvent>(OUTBOUND_BUFFER);
            match service.start(id, OutputEmitter::live(events)).await {
                Ok(_run) => {
                    tokio::spawn(forward_events(events_rx, outbound.clone()));
                    None
                }
                Err(err) => Some(error_reply(err)),
            }
        }
        ClientCommand::Stop => match service.stop(id).await {
            Ok(_) => Some(ServerReply::StopRequested),
            Err(err) => Some(error_reply(err)),
        },
        ClientCommand::Restart => match service.reset(id).await {
            Ok(report) => Some(ServerReply::Status {
                content: report.status,
            }),
            Err(err) => Some(error_reply(err)),
        },
    }
}

/// Relay run events to the socket writer. Ends when the run drops its emitter
/// or the socket goes away; the run itself keeps recording either way.
async fn forward_events(mut events: mpsc::Receiver<AgentEvent>, outbound: mpsc::Sender<String>) {
    while let Some(event) = events.recv().await {
        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, "Failed to encode agent event");
                continue;
            }
        };
        if outbound.send(text).await.is_err() {
            break;
        }
    }
}

fn error_reply(err: impl std::fmt::Display) -> ServerReply {
    ServerReply::Error {
        content: err.to_string(),
    }
}

async fn send_reply(outbound: &mpsc::Sender<String>, reply: &ServerReply) {
    match serde_json::to_string(reply) {
        Ok(text) => {
            let _ = outbound.send(text).await;
        }
        Err(err) => warn!(%err, "Failed to encode socket reply"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn commands_decode_from_tagged_json() {
        let command: ClientCommand =
            serde_json::from_value(json!({"type": "set_contract", "contract": "list files"}))
                .expect("decode");
        assert!(matches!(command, ClientCommand::SetContract { contract } if contract == "list files"));
        let command: ClientCommand =
            serde_json::from_value(json!({"type": "restart"})).expect("decode");
        assert!(matches!(command, ClientCommand::Restart));
        assert!(serde_json::from_value::<ClientCommand>(json!({"type": "dance"})).is_err());
    }

    #[test]
    fn init_reply_carries_agent_state() {
        let reply = ServerReply::Init {
            id: "agent-1".into(),
            status: AgentStatus::Ready,
            contract: "count".into(),
        };
        let value: Value = serde_json::to_value(&reply).expect("encode");
        assert_eq!(
            value,
            json!({"type": "init", "id": "agent-1", "status": "ready", "contract": "count"})
        );
        let value = serde_json::to_value(ServerReply::StopRequested).expect("encode");
        assert_eq!(value, json!({"type": "stop_requested"}));
    }
}
