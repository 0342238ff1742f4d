//! `get_hourly_weather_data`: hourly readings for the configured location.
//!
//! The coordinates are bound inside the [`HourlyWeather`] implementation; the
//! caller only supplies the date range.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::instrument;

use super::{parse_args, Tool, ToolError, ToolOutput};
use crate::data::{DateRange, HourlyWeather};

pub const TOOL_NAME: &str = "get_hourly_weather_data";

pub struct HourlyWeatherTool {
    source: Arc<dyn HourlyWeather>,
}

impl HourlyWeatherTool {
    pub fn new(source: Arc<dyn HourlyWeather>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for HourlyWeatherTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Get hourly weather data at my location for a date range. Returns lists of \
         readings for temperature (°C), relative humidity (%), apparent temperature (°C), \
         precipitation (mm), evapotranspiration (mm) and surface pressure (hPa). \
         Each reading has a local timestamp and a value."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "from_date": {
                    "type": "string",
                    "format": "date",
                    "description": "First day to include (YYYY-MM-DD)"
                },
                "to_date": {
                    "type": "string",
                    "format": "date",
                    "description": "Last day to include (YYYY-MM-DD)"
                }
            },
            "required": ["from_date", "to_date"]
        })
    }

    #[instrument(skip(self, args))]
    async fn execute(&self, args: Value) -> Result<ToolOutput, ToolError> {
        let range: DateRange = parse_args(TOOL_NAME, args)?;
        let meteo = self.source.fetch(range).await?;
        ToolOutput::json(TOOL_NAME, &meteo)
    }
}
