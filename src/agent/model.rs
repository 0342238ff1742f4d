//! Model client interface

use async_trait::async_trait;
use thiserror::Error;

use super::message::{Message, ModelTurn};
use crate::tools::ToolSpec;

#[derive(Debug, Error)]
pub enum ModelError {
    /// The call to the model service failed (after SDK retries)
    #[error("Model request failed: {0}")]
    Request(String),

    /// The request could not be built from the conversation
    #[error("Invalid model request: {0}")]
    InvalidRequest(String),

    /// The service answered with something we cannot interpret
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),
}

/// A chat model that can request tool calls
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Identifier reported in logs
    fn model_id(&self) -> &str;

    async fn converse(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelTurn, ModelError>;
}
