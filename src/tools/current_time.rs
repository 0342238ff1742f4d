//! Current date and time in an IANA timezone

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_args, Tool, ToolError, ToolOutput};

const TOOL_NAME: &str = "current_time";

#[derive(Debug, Deserialize)]
struct CurrentTimeArgs {
    #[serde(default)]
    timezone: Option<String>,
}

pub struct CurrentTimeTool;

/// Current time in `timezone` as RFC 3339
pub fn now_in(timezone: &str) -> Result<String, ToolError> {
    let tz: Tz = timezone
        .parse()
        .map_err(|_| ToolError::invalid(TOOL_NAME, format!("unknown timezone '{timezone}'")))?;
    Ok(Utc::now().with_timezone(&tz).to_rfc3339())
}

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Get the current date and time (ISO 8601) in the given IANA timezone. Defaults to UTC."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "timezone": {
                    "type": "string",
                    "description": "IANA timezone name, e.g. 'Europe/Madrid'",
                    "default": "UTC"
                }
            }
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let args: CurrentTimeArgs = parse_args(TOOL_NAME, args)?;
        let timezone = args.timezone.as_deref().unwrap_or("UTC");
        Ok(ToolOutput::Text(now_in(timezone)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn test_defaults_to_utc() {
        let out = CurrentTimeTool.execute(json!({})).await.unwrap().to_text();
        let parsed = DateTime::parse_from_rfc3339(&out).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
    }

    #[tokio::test]
    async fn test_named_timezone() {
        let out = CurrentTimeTool
            .execute(json!({"timezone": "Asia/Tokyo"}))
            .await
            .unwrap()
            .to_text();
        let parsed = DateTime::parse_from_rfc3339(&out).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_unknown_timezone() {
        let err = now_in("Mars/Olympus_Mons").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
