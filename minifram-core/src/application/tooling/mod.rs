//! Tool routing: in-process handlers plus external tool servers reached over stdio.

mod display;
mod error;
mod interface;
mod process;
mod router;

pub use display::{DISPLAY_WIDTH, format_display, truncate};
pub use error::{HandlerError, ToolError, ToolInvokeError};
pub use interface::{
    ContentBlock, HandlerResult, INTERNAL_ORIGIN, InternalTool, ToolCallResult, ToolDefinition,
    ToolOrigin, ToolOutput,
};
pub use process::McpProcess;
pub use router::{FailedServer, LoadReport, ServerHealth, ServerStatus, ToolConflict, ToolRouter};

#[cfg(all(test, unix))]
pub(crate) use process::scripted_server;
