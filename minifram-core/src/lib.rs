//! # minifram-core
//!
//! Runtime for autonomous agents: each agent pursues a free-text contract by
//! alternating model inference with tool calls until it signals completion or
//! failure, a caller stops it, or the run errors out.
//!
//! - [`domain`] - agents, conversations, messages
//! - [`tooling`] - routing to in-process handlers and external stdio tool servers
//! - [`agent`] - the turn loop, output emitters, agent store and lifecycle service
//! - [`model`] - inference backend client
//! - [`server`] / [`rpc`] - HTTP, WebSocket and JSON-RPC transport
//! - [`config`] - TOML configuration with environment overrides

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, tooling};
pub use config::{AppConfig, ConfigError};
pub use domain::types;
pub use infrastructure::{model, rpc, server};
