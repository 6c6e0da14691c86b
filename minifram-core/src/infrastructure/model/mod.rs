//! Model infrastructure module
//!
//! # Structure
//! - `types` - Request, Response, Error types
//! - `traits` - ModelProvider trait consumed by the agent loop
//! - `adapter` - OpenAI wire-format conversion
//! - `clients` - HTTP client implementations

pub mod adapter;
pub mod clients;
pub mod traits;
pub mod types;

pub use clients::OpenAIClient;
pub use traits::ModelProvider;
pub use types::{ModelError, ModelRequest, ModelResponse};
