//! # Agent Module
//!
//! Autonomous contract execution. A caller creates an agent in the
//! [`AgentStore`], gives it a contract and starts it; the [`AgentRunner`]
//! alternates inference turns with tool calls until the contract is completed
//! or failed, a stop is requested, or the run errors out.
//!
//! ## Key Types
//!
//! - [`AgentRunner`] - the turn loop
//! - [`OutputEmitter`] - live (pushed to an observer) or recording-only output
//! - [`AgentStore`] / [`AgentHandle`] - registry and per-agent state with its stop flag
//! - [`AgentService`] - lifecycle operations used by the transport layer
//! - [`CompletionTool`] - in-process tool an agent calls to finish its contract
//!
//! ## Completion
//!
//! Two conventions coexist. The completion tool flips the agent to
//! `Completed` directly; the loop notices at its next check point and wins over
//! any textual marker arriving in the same turn. Otherwise
//! `[CONTRACT COMPLETE]` / `[CONTRACT FAILED]` in assistant content end the run.

mod completion;
mod emitter;
mod errors;
mod instructions;
mod report;
mod runner;
mod service;
mod store;
mod transcript;

pub use completion::{
    COMPLETION_TOOL_DESCRIPTION, CompletionTool, complete_agent, completion_tool_schema,
    compress_payload,
};
pub use emitter::{AgentEvent, EventKind, OutputEmitter};
pub use errors::AgentError;
pub use instructions::{
    COMPLETE_MARKER, ContractSignal, FAILED_MARKER, contract_message, detect_marker,
    system_prompt,
};
pub use report::{AgentStatusReport, AgentSummary, AgentView, payload_url};
pub use runner::{AgentRunner, RESULT_PREVIEW_CHARS, RunnerSettings};
pub use service::AgentService;
pub use store::{AgentHandle, AgentStore, SharedAgent};
pub use transcript::{FileTranscriptSink, NoopTranscriptSink, TranscriptSink, render_transcript};
