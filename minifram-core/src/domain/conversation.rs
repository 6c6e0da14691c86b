use super::types::{Message, MessageRole};
use chrono::{DateTime, Utc};

/// Projection of one conversation message in the shape the inference backend expects.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendMessage {
    Chat {
        role: MessageRole,
        content: String,
        /// Raw tool-call annotation, carried for backend-specific reconstruction.
        tool_call_data: Option<String>,
    },
    ToolResult {
        content: String,
        tool_call_id: Option<String>,
    },
}

impl BackendMessage {
    pub fn role(&self) -> MessageRole {
        match self {
            BackendMessage::Chat { role, .. } => *role,
            BackendMessage::ToolResult { .. } => MessageRole::Tool,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            BackendMessage::Chat { content, .. } | BackendMessage::ToolResult { content, .. } => {
                content
            }
        }
    }
}

/// Append-only, causally ordered message log owned by one agent.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: String,
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn append(
        &mut self,
        role: MessageRole,
        content: impl Into<String>,
        tool_calls: Option<String>,
    ) -> &Message {
        let mut message = Message::new(role, content);
        message.tool_calls = tool_calls;
        self.push(message)
    }

    pub fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn to_backend_format(&self) -> Vec<BackendMessage> {
        self.messages
            .iter()
            .map(|message| match message.role {
                MessageRole::Tool => BackendMessage::ToolResult {
                    content: message.content.clone(),
                    tool_call_id: message.tool_call_id.clone(),
                },
                role => BackendMessage::Chat {
                    role,
                    content: message.content.clone(),
                    tool_call_data: message.tool_calls.clone(),
                },
            })
            .collect()
    }
}
