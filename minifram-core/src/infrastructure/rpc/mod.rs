//! JSON-RPC 2.0 surface exposing agent lifecycle operations to other agents and tools.

pub mod server;
pub mod types;

pub use types::{RpcError, RpcRequest, RpcResponse};
