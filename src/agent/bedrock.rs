//! Amazon Bedrock Converse API client
//!
//! Request signing, timeouts and retries are handled by the AWS SDK; see
//! [`crate::aws::load_sdk_config`].

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::types::{
    ContentBlock as SdkBlock, ConversationRole, InferenceConfiguration, Message as SdkMessage,
    StopReason as SdkStopReason, SystemContentBlock, Tool as SdkTool, ToolConfiguration,
    ToolInputSchema, ToolResultBlock, ToolResultContentBlock, ToolResultStatus,
    ToolSpecification, ToolUseBlock,
};
use aws_sdk_bedrockruntime::Client;
use aws_smithy_types::{Document, Number};
use serde_json::Value;

use super::message::{ContentBlock, Message, ModelTurn, Role, StopReason};
use super::model::{ModelClient, ModelError};
use crate::tools::ToolSpec;

/// Default inference profile
pub const DEFAULT_MODEL_ID: &str = "eu.anthropic.claude-sonnet-4-20250514-v1:0";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone)]
pub struct BedrockModel {
    client: Client,
    model_id: String,
    temperature: f32,
}

impl BedrockModel {
    pub fn new(client: Client, model_id: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            temperature,
        }
    }

    /// Build the runtime client from a loaded SDK configuration
    pub fn from_conf(conf: &SdkConfig, model_id: impl Into<String>, temperature: f32) -> Self {
        Self::new(Client::new(conf), model_id, temperature)
    }
}

#[async_trait]
impl ModelClient for BedrockModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn converse(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<ModelTurn, ModelError> {
        let sdk_messages = messages
            .iter()
            .map(to_sdk_message)
            .collect::<Result<Vec<_>, _>>()?;

        let mut request = self
            .client
            .converse()
            .model_id(&self.model_id)
            .system(SystemContentBlock::Text(system.to_string()))
            .set_messages(Some(sdk_messages))
            .inference_config(
                InferenceConfiguration::builder()
                    .temperature(self.temperature)
                    .build(),
            );
        if !tools.is_empty() {
            request = request.tool_config(tool_config(tools)?);
        }

        let output = request
            .send()
            .await
            .map_err(|e| ModelError::Request(DisplayErrorContext(&e).to_string()))?;

        let message = output
            .output()
            .and_then(|o| o.as_message().ok())
            .ok_or_else(|| ModelError::InvalidResponse("response has no message".into()))?;

        Ok(ModelTurn {
            message: from_sdk_message(message)?,
            stop_reason: stop_reason(output.stop_reason()),
        })
    }
}

fn tool_config(tools: &[ToolSpec]) -> Result<ToolConfiguration, ModelError> {
    let specs = tools
        .iter()
        .map(|tool| {
            ToolSpecification::builder()
                .name(&tool.name)
                .description(&tool.description)
                .input_schema(ToolInputSchema::Json(to_document(&tool.input_schema)))
                .build()
                .map(SdkTool::ToolSpec)
                .map_err(|e| ModelError::InvalidRequest(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    ToolConfiguration::builder()
        .set_tools(Some(specs))
        .build()
        .map_err(|e| ModelError::InvalidRequest(e.to_string()))
}

fn to_sdk_message(message: &Message) -> Result<SdkMessage, ModelError> {
    let role = match message.role {
        Role::User => ConversationRole::User,
        Role::Assistant => ConversationRole::Assistant,
    };

    let mut content = Vec::with_capacity(message.content.len());
    for block in &message.content {
        let sdk_block = match block {
            // Converse rejects empty text blocks
            ContentBlock::Text { text } if text.is_empty() => continue,
            ContentBlock::Text { text } => SdkBlock::Text(text.clone()),
            ContentBlock::ToolUse { id, name, input } => SdkBlock::ToolUse(
                ToolUseBlock::builder()
                    .tool_use_id(id)
                    .name(name)
                    .input(to_document(input))
                    .build()
                    .map_err(|e| ModelError::InvalidRequest(e.to_string()))?,
            ),
            ContentBlock::ToolResult {
                id,
                output,
                is_error,
            } => {
                let result = match output {
                    Value::Object(_) => ToolResultContentBlock::Json(to_document(output)),
                    Value::String(text) => ToolResultContentBlock::Text(text.clone()),
                    other => ToolResultContentBlock::Text(other.to_string()),
                };
                let status = if *is_error {
                    ToolResultStatus::Error
                } else {
                    ToolResultStatus::Success
                };
                SdkBlock::ToolResult(
                    ToolResultBlock::builder()
                        .tool_use_id(id)
                        .content(result)
                        .status(status)
                        .build()
                        .map_err(|e| ModelError::InvalidRequest(e.to_string()))?,
                )
            }
        };
        content.push(sdk_block);
    }

    SdkMessage::builder()
        .role(role)
        .set_content(Some(content))
        .build()
        .map_err(|e| ModelError::InvalidRequest(e.to_string()))
}

fn from_sdk_message(message: &SdkMessage) -> Result<Message, ModelError> {
    let role = match message.role() {
        ConversationRole::User => Role::User,
        ConversationRole::Assistant => Role::Assistant,
        other => {
            return Err(ModelError::InvalidResponse(format!(
                "unexpected role {}",
                other.as_str()
            )))
        }
    };

    // Reasoning and other block kinds are not needed by the loop
    let content = message
        .content()
        .iter()
        .filter_map(|block| match block {
            SdkBlock::Text(text) => Some(ContentBlock::Text { text: text.clone() }),
            SdkBlock::ToolUse(tool_use) => Some(ContentBlock::ToolUse {
                id: tool_use.tool_use_id().to_string(),
                name: tool_use.name().to_string(),
                input: from_document(tool_use.input()),
            }),
            _ => None,
        })
        .collect();

    Ok(Message { role, content })
}

fn stop_reason(reason: &SdkStopReason) -> StopReason {
    match reason {
        SdkStopReason::EndTurn | SdkStopReason::StopSequence => StopReason::EndTurn,
        SdkStopReason::ToolUse => StopReason::ToolUse,
        SdkStopReason::MaxTokens => StopReason::MaxTokens,
        other => StopReason::Other(other.as_str().to_string()),
    }
}

pub(crate) fn to_document(value: &Value) -> Document {
    match value {
        Value::Null => Document::Null,
        Value::Bool(b) => Document::Bool(*b),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Document::Number(Number::PosInt(u))
            } else if let Some(i) = n.as_i64() {
                Document::Number(Number::NegInt(i))
            } else {
                Document::Number(Number::Float(n.as_f64().unwrap_or_default()))
            }
        }
        Value::String(s) => Document::String(s.clone()),
        Value::Array(items) => Document::Array(items.iter().map(to_document).collect()),
        Value::Object(map) => Document::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_document(v)))
                .collect(),
        ),
    }
}

pub(crate) fn from_document(doc: &Document) -> Value {
    match doc {
        Document::Null => Value::Null,
        Document::Bool(b) => Value::Bool(*b),
        Document::Number(Number::PosInt(u)) => Value::from(*u),
        Document::Number(Number::NegInt(i)) => Value::from(*i),
        Document::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Document::String(s) => Value::String(s.clone()),
        Document::Array(items) => Value::Array(items.iter().map(from_document).collect()),
        Document::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), from_document(v)))
                .collect(),
        ),
    }
}
