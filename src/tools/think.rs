//! Think tool: lets the model reason step by step before acting.
//!
//! The thoughts are echoed back so they stay in the conversation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, Tool, ToolError, ToolOutput};

const TOOL_NAME: &str = "think";

#[derive(Debug, Deserialize)]
struct ThinkArgs {
    thoughts: String,
    #[serde(default = "default_reasoning_type")]
    reasoning_type: String,
}

fn default_reasoning_type() -> String {
    "analysis".to_string()
}

pub struct ThinkTool;

#[async_trait]
impl Tool for ThinkTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Use this tool to reflect on the weather data step by step before writing \
         the forecast. The thoughts are returned to you unchanged."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "thoughts": {
                    "type": "string",
                    "description": "Your detailed reasoning or analysis"
                },
                "reasoning_type": {
                    "type": "string",
                    "enum": ["planning", "analysis", "decision", "reflection"],
                    "default": "analysis"
                }
            },
            "required": ["thoughts"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: ThinkArgs = parse_args(TOOL_NAME, args)?;
        Ok(ToolOutput::Text(format!(
            "[{}] {}",
            args.reasoning_type.to_uppercase(),
            args.thoughts
        )))
    }
}
