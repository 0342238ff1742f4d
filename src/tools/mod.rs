//! Callable tools exposed to the model and to MCP clients
//!
//! Each tool has a name, a description and a JSON Schema for its arguments.
//! The [`Toolset`] keeps them in registration order and dispatches calls by
//! name.

pub mod calculator;
pub mod current_time;
pub mod file_write;
pub mod python_repl;
pub mod think;
pub mod weather;

pub use calculator::CalculatorTool;
pub use current_time::CurrentTimeTool;
pub use file_write::FileWriteTool;
pub use python_repl::PythonReplTool;
pub use think::ThinkTool;
pub use weather::HourlyWeatherTool;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::data::{HourlyWeather, WeatherError};

/// Errors returned by tool execution
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool registered under this name
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments did not match the tool's schema
    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    /// The tool ran but could not complete
    #[error("{tool} failed: {message}")]
    ExecutionFailed { tool: String, message: String },

    /// The operator declined the action
    #[error("{0} was not approved")]
    ConsentDenied(String),

    /// Weather fetch failed
    #[error(transparent)]
    Weather(#[from] WeatherError),
}

impl ToolError {
    pub fn invalid(tool: &str, message: impl ToString) -> Self {
        Self::InvalidArguments {
            tool: tool.to_string(),
            message: message.to_string(),
        }
    }

    pub fn failed(tool: &str, message: impl ToString) -> Self {
        Self::ExecutionFailed {
            tool: tool.to_string(),
            message: message.to_string(),
        }
    }
}

/// Result payload of a tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Json(Value),
}

impl ToolOutput {
    /// Serialize any value into a JSON output
    pub fn json<T: Serialize>(tool: &str, value: &T) -> Result<Self, ToolError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| ToolError::failed(tool, e))
    }

    /// Render the output as text (compact JSON for structured outputs)
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Json(value) => value.to_string(),
        }
    }
}

/// Name, description and argument schema sent to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A capability the model can invoke by name
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema (`type: object`) describing the arguments
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// Deserialize tool arguments into a typed struct
pub(crate) fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::invalid(tool, e))
}

/// Whether side-effecting tools must be confirmed by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsentPolicy {
    /// Ask on the terminal before each file write or code run
    #[default]
    Prompt,
    /// Allow everything without asking
    Bypass,
}

impl ConsentPolicy {
    pub fn from_bypass_flag(bypass: bool) -> Self {
        if bypass {
            Self::Bypass
        } else {
            Self::Prompt
        }
    }
}

/// Asks the operator a yes/no question; called from a blocking thread
pub trait Prompter: Send + Sync {
    fn confirm(&self, prompt: &str) -> std::io::Result<bool>;
}

/// Interactive prompt on the controlling terminal
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str) -> std::io::Result<bool> {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(std::io::Error::other)
    }
}

/// Consent check shared by every side-effecting tool of a toolset
///
/// Clones share one lock, so at most one question is on the terminal even
/// when the agent runs several tool calls at once.
#[derive(Clone)]
pub struct ConsentGate {
    policy: ConsentPolicy,
    prompter: Arc<dyn Prompter>,
    turn: Arc<Mutex<()>>,
}

impl std::fmt::Debug for ConsentGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentGate")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl From<ConsentPolicy> for ConsentGate {
    fn from(policy: ConsentPolicy) -> Self {
        Self::new(policy)
    }
}

impl ConsentGate {
    pub fn new(policy: ConsentPolicy) -> Self {
        Self::with_prompter(policy, Arc::new(TerminalPrompter))
    }

    pub fn with_prompter(policy: ConsentPolicy, prompter: Arc<dyn Prompter>) -> Self {
        Self {
            policy,
            prompter,
            turn: Arc::new(Mutex::new(())),
        }
    }

    pub fn policy(&self) -> ConsentPolicy {
        self.policy
    }

    /// Returns `Ok(())` if the action may proceed.
    pub async fn confirm(&self, tool: &str, summary: String) -> Result<(), ToolError> {
        if self.policy == ConsentPolicy::Bypass {
            return Ok(());
        }

        let _turn = self.turn.lock().await;
        let prompter = Arc::clone(&self.prompter);
        let prompt = format!("{tool}: {summary}\nDo you want to proceed?");
        let approved = tokio::task::spawn_blocking(move || prompter.confirm(&prompt))
            .await
            .map_err(|e| ToolError::failed(tool, e))?
            .map_err(|e| ToolError::failed(tool, e))?;

        if approved {
            Ok(())
        } else {
            Err(ToolError::ConsentDenied(tool.to_string()))
        }
    }
}

/// Ordered collection of tools, dispatched by name
#[derive(Clone, Default)]
pub struct Toolset {
    tools: Vec<Arc<dyn Tool>>,
}

impl std::fmt::Debug for Toolset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Toolset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full toolset given to the forecasting agent
    pub fn standard(weather: Arc<dyn HourlyWeather>, consent: ConsentPolicy) -> Self {
        let gate = ConsentGate::new(consent);
        Self::new()
            .with(CalculatorTool)
            .with(ThinkTool)
            .with(PythonReplTool::new(gate.clone()))
            .with(FileWriteTool::new(gate))
            .with(CurrentTimeTool)
            .with(HourlyWeatherTool::new(weather))
    }

    /// Only the weather tool, as served over MCP
    pub fn weather_only(weather: Arc<dyn HourlyWeather>) -> Self {
        Self::new().with(HourlyWeatherTool::new(weather))
    }

    /// Register a tool; a later tool with the same name replaces the earlier one.
    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn call(&self, name: &str, args: Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(args).await
    }
}
