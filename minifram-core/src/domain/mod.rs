//! # Domain Module
//!
//! Plain data types shared by the tool router, the agent loop and the
//! transport adapters. Nothing in here performs I/O.

pub mod agent;
pub mod conversation;
pub mod types;

pub use agent::{Agent, AgentOutput, AgentStatus, OutputKind, Payload, TransitionError};
pub use conversation::{BackendMessage, Conversation};
pub use types::{Message, MessageRole, ToolCallRequest};
