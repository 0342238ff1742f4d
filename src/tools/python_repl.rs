//! Run a Python snippet in a fresh `python3` process.
//!
//! No state is kept between calls.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::process::Command;
use tracing::debug;

use super::{parse_args, ConsentGate, Tool, ToolError, ToolOutput};

const TOOL_NAME: &str = "python_repl";

/// Default wall-clock limit for one snippet
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct PythonArgs {
    code: String,
}

pub struct PythonReplTool {
    consent: ConsentGate,
    interpreter: String,
    timeout: Duration,
}

impl PythonReplTool {
    pub fn new(consent: ConsentGate) -> Self {
        Self {
            consent,
            interpreter: "python3".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Tool for PythonReplTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Execute Python code and return stdout, stderr and the exit code. Use print() \
         to see results. Each call runs in a new interpreter; variables do not persist."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Python source to execute"
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: PythonArgs = parse_args(TOOL_NAME, args)?;
        if args.code.trim().is_empty() {
            return Err(ToolError::invalid(TOOL_NAME, "code cannot be empty"));
        }

        self.consent
            .confirm(TOOL_NAME, format!("run Python code:\n{}", args.code))
            .await?;

        debug!(interpreter = %self.interpreter, "Running Python snippet");
        let child = Command::new(&self.interpreter)
            .arg("-c")
            .arg(&args.code)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::failed(TOOL_NAME, format!("{}: {e}", self.interpreter)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                ToolError::failed(
                    TOOL_NAME,
                    format!("timed out after {}s", self.timeout.as_secs()),
                )
            })?
            .map_err(|e| ToolError::failed(TOOL_NAME, e))?;

        Ok(ToolOutput::Json(json!({
            "exit_code": output.status.code(),
            "stdout": String::from_utf8_lossy(&output.stdout),
            "stderr": String::from_utf8_lossy(&output.stderr),
        })))
    }
}
