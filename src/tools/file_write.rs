//! Write a text file to disk, creating parent directories as needed.
//!
//! The forecast command uses this to save `docs/index.md` and the per-day
//! reports.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{parse_args, ConsentGate, Tool, ToolError, ToolOutput};

const TOOL_NAME: &str = "file_write";

#[derive(Debug, Deserialize)]
struct FileWriteArgs {
    path: PathBuf,
    content: String,
}

pub struct FileWriteTool {
    consent: ConsentGate,
}

impl FileWriteTool {
    pub fn new(consent: ConsentGate) -> Self {
        Self { consent }
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Write text content to a file. Parent directories are created if missing; \
         an existing file is overwritten."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Destination path, e.g. 'docs/forecast_0.md'"
                },
                "content": {
                    "type": "string",
                    "description": "Full file content"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: FileWriteArgs = parse_args(TOOL_NAME, args)?;
        if args.path.as_os_str().is_empty() {
            return Err(ToolError::invalid(TOOL_NAME, "path cannot be empty"));
        }

        self.consent
            .confirm(
                TOOL_NAME,
                format!("write {} bytes to {}", args.content.len(), args.path.display()),
            )
            .await?;

        if let Some(parent) = args.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::failed(TOOL_NAME, e))?;
        }
        tokio::fs::write(&args.path, args.content.as_bytes())
            .await
            .map_err(|e| ToolError::failed(TOOL_NAME, e))?;

        info!(path = %args.path.display(), bytes = args.content.len(), "File written");
        Ok(ToolOutput::Text(format!(
            "Wrote {} bytes to {}",
            args.content.len(),
            args.path.display()
        )))
    }
}
