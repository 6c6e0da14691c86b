//! Model traits

use super::types::{ModelError, ModelRequest, ModelResponse};
use async_trait::async_trait;

/// Inference backend consumed by the agent loop.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Request one turn for the given conversation projection and tool catalog.
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError>;
}
