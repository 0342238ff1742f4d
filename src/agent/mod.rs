//! Tool-using agent loop
//!
//! The agent sends the conversation to the model, runs whatever tools the
//! model asks for, appends the results and repeats until the model ends its
//! turn. Reasoning and tool selection are left to the model.

pub mod bedrock;
pub mod message;
pub mod model;

pub use bedrock::BedrockModel;
pub use message::{ContentBlock, Message, ModelTurn, Role, StopReason};
pub use model::{ModelClient, ModelError};

use std::fmt;

use futures::future::join_all;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::tools::{ToolOutput, Toolset};

/// Default cap on model calls per run
pub const DEFAULT_MAX_TURNS: usize = 50;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The model kept requesting tools past the turn limit
    #[error("Agent stopped after {0} turns without a final answer")]
    TurnLimit(usize),
}

/// Final answer of a run
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResult {
    /// Text of the last assistant message
    pub text: String,
    pub stop_reason: StopReason,
    /// Number of model calls made
    pub turns: usize,
    /// Number of tool invocations executed
    pub tool_calls: usize,
}

impl fmt::Display for AgentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

pub struct Agent<M: ModelClient> {
    model: M,
    system_prompt: String,
    tools: Toolset,
    max_turns: usize,
}

impl<M: ModelClient> Agent<M> {
    pub fn new(model: M, system_prompt: impl Into<String>, tools: Toolset) -> Self {
        Self {
            model,
            system_prompt: system_prompt.into(),
            tools,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn tools(&self) -> &Toolset {
        &self.tools
    }

    /// Run one prompt to completion
    pub async fn run(&self, user_prompt: &str) -> Result<AgentResult, AgentError> {
        let specs = self.tools.specs();
        let mut messages = vec![Message::user_text(user_prompt)];
        let mut tool_calls = 0;

        for turn in 1..=self.max_turns {
            debug!(turn, model = self.model.model_id(), "Calling model");
            let reply = self
                .model
                .converse(&self.system_prompt, &messages, &specs)
                .await?;

            let uses: Vec<(String, String, Value)> = reply
                .message
                .tool_uses()
                .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
                .collect();
            messages.push(reply.message);

            if reply.stop_reason != StopReason::ToolUse || uses.is_empty() {
                let text = messages.last().map(Message::text).unwrap_or_default();
                info!(turns = turn, tool_calls, "Agent finished");
                return Ok(AgentResult {
                    text,
                    stop_reason: reply.stop_reason,
                    turns: turn,
                    tool_calls,
                });
            }

            tool_calls += uses.len();
            let results = join_all(
                uses.into_iter()
                    .map(|(id, name, input)| self.call_tool(id, name, input)),
            )
            .await;

            messages.push(Message {
                role: Role::User,
                content: results,
            });
        }

        Err(AgentError::TurnLimit(self.max_turns))
    }

    /// Execute one tool request; failures become error results for the model
    async fn call_tool(&self, id: String, name: String, input: Value) -> ContentBlock {
        info!(tool = %name, "Tool call");
        match self.tools.call(&name, input).await {
            Ok(ToolOutput::Json(value)) => ContentBlock::ToolResult {
                id,
                output: value,
                is_error: false,
            },
            Ok(ToolOutput::Text(text)) => ContentBlock::ToolResult {
                id,
                output: Value::String(text),
                is_error: false,
            },
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool call failed");
                ContentBlock::ToolResult {
                    id,
                    output: Value::String(e.to_string()),
                    is_error: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{CalculatorTool, ThinkTool, ToolSpec};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted turns and records every conversation it was sent
    struct ScriptedModel {
        turns: Mutex<VecDeque<ModelTurn>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedModel {
        fn new(turns: Vec<ModelTurn>) -> Self {
            Self {
                turns: Mutex::new(turns.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        fn model_id(&self) -> &str {
            "scripted"
        }

        async fn converse(
            &self,
            _system: &str,
            messages: &[Message],
            _tools: &[ToolSpec],
        ) -> Result<ModelTurn, ModelError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.turns
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ModelError::InvalidResponse("script exhausted".into()))
        }
    }

    fn tool_use(id: &str, name: &str, input: Value) -> ModelTurn {
        ModelTurn {
            message: Message {
                role: Role::Assistant,
                content: vec![ContentBlock::ToolUse {
                    id: id.into(),
                    name: name.into(),
                    input,
                }],
            },
            stop_reason: StopReason::ToolUse,
        }
    }

    fn final_text(text: &str) -> ModelTurn {
        ModelTurn {
            message: Message::assistant_text(text),
            stop_reason: StopReason::EndTurn,
        }
    }

    #[tokio::test]
    async fn test_answer_without_tools() {
        let model = ScriptedModel::new(vec![final_text("Sunny tomorrow.")]);
        let agent = Agent::new(model, "system", Toolset::new());

        let result = agent.run("Weather tomorrow?").await.unwrap();
        assert_eq!(result.text, "Sunny tomorrow.");
        assert_eq!(result.turns, 1);
        assert_eq!(result.tool_calls, 0);
        assert_eq!(result.to_string(), "Sunny tomorrow.");
    }

    #[tokio::test]
    async fn test_tool_result_is_fed_back() {
        let model = ScriptedModel::new(vec![
            tool_use("c1", "calculator", json!({"expression": "(20 + 30) / 2"})),
            final_text("Average 25C."),
        ]);
        let agent = Agent::new(model, "system", Toolset::new().with(CalculatorTool));

        let result = agent.run("Average?").await.unwrap();
        assert_eq!(result.text, "Average 25C.");
        assert_eq!(result.turns, 2);
        assert_eq!(result.tool_calls, 1);

        let seen = agent.model.seen.lock().unwrap();
        let second_call = &seen[1];
        assert_eq!(second_call.len(), 3);
        assert_eq!(second_call[2].role, Role::User);
        assert_eq!(
            second_call[2].content[0],
            ContentBlock::ToolResult {
                id: "c1".into(),
                output: json!({"expression": "(20 + 30) / 2", "result": 25.0}),
                is_error: false,
            }
        );
    }

    #[tokio::test]
    async fn test_multiple_tool_uses_keep_order() {
        let turn = ModelTurn {
            message: Message {
                role: Role::Assistant,
                content: vec![
                    ContentBlock::Text { text: "Let me check.".into() },
                    ContentBlock::ToolUse {
                        id: "a".into(),
                        name: "think".into(),
                        input: json!({"thoughts": "first"}),
                    },
                    ContentBlock::ToolUse {
                        id: "b".into(),
                        name: "calculator".into(),
                        input: json!({"expression": "2*2"}),
                    },
                ],
            },
            stop_reason: StopReason::ToolUse,
        };
        let model = ScriptedModel::new(vec![turn, final_text("ok")]);
        let tools = Toolset::new().with(ThinkTool).with(CalculatorTool);
        let agent = Agent::new(model, "system", tools);

        let result = agent.run("go").await.unwrap();
        assert_eq!(result.tool_calls, 2);

        let seen = agent.model.seen.lock().unwrap();
        let ids: Vec<_> = seen[1][2]
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::ToolResult { id, .. } => id.clone(),
                other => panic!("unexpected block {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_tool_failure_reported_to_model() {
        let model = ScriptedModel::new(vec![
            tool_use("x", "no_such_tool", json!({})),
            final_text("Sorry."),
        ]);
        let agent = Agent::new(model, "system", Toolset::new());

        let result = agent.run("go").await.unwrap();
        assert_eq!(result.text, "Sorry.");

        let seen = agent.model.seen.lock().unwrap();
        match &seen[1][2].content[0] {
            ContentBlock::ToolResult { is_error, output, .. } => {
                assert!(*is_error);
                assert!(output.as_str().unwrap().contains("Unknown tool"));
            }
            other => panic!("unexpected block {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_turn_limit() {
        let model = ScriptedModel::new(vec![
            tool_use("1", "think", json!({"thoughts": "a"})),
            tool_use("2", "think", json!({"thoughts": "b"})),
            tool_use("3", "think", json!({"thoughts": "c"})),
        ]);
        let agent = Agent::new(model, "system", Toolset::new().with(ThinkTool)).with_max_turns(2);

        let err = agent.run("loop").await.unwrap_err();
        assert!(matches!(err, AgentError::TurnLimit(2)));
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let model = ScriptedModel::new(vec![]);
        let agent = Agent::new(model, "system", Toolset::new());

        let err = agent.run("hello").await.unwrap_err();
        assert!(matches!(err, AgentError::Model(ModelError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_max_tokens_returns_partial_text() {
        let model = ScriptedModel::new(vec![ModelTurn {
            message: Message::assistant_text("# Forecast (truncated"),
            stop_reason: StopReason::MaxTokens,
        }]);
        let agent = Agent::new(model, "system", Toolset::new());

        let result = agent.run("go").await.unwrap();
        assert_eq!(result.stop_reason, StopReason::MaxTokens);
        assert_eq!(result.text, "# Forecast (truncated");
    }
}
