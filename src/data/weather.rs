//! Open-Meteo weather API client
//!
//! This module fetches hourly weather series from the Open-Meteo API and
//! reshapes the column-oriented response into validated [`MeteoData`].

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use super::{MeteoData, Metric, Reading, ReadingError};

/// Base URL for the Open-Meteo forecast API
pub const OPEN_METEO_BASE_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Hourly series requested from the API, in response order
const HOURLY_METRICS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,precipitation,evapotranspiration,surface_pressure";

/// Errors that can occur when fetching weather data
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed or returned a non-success status
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// A metric series has no value for one of the timestamps
    #[error("Missing {metric} value at index {index}")]
    MissingValue { metric: &'static str, index: usize },

    /// Invalid time format in response
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    /// A value failed its range check
    #[error("Invalid reading: {0}")]
    InvalidReading(#[from] ReadingError),
}

/// Inclusive calendar date span for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

impl DateRange {
    pub fn new(from_date: NaiveDate, to_date: NaiveDate) -> Self {
        Self { from_date, to_date }
    }
}

/// Client for fetching weather data from Open-Meteo API
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: String,
}

impl Default for WeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherClient {
    /// Create a new WeatherClient with default settings
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: OPEN_METEO_BASE_URL.to_string(),
        }
    }

    /// Point the client at another forecast endpoint (e.g. a mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the request URL for an hourly query
    pub fn hourly_url(&self, latitude: f64, longitude: f64, range: DateRange) -> String {
        format!(
            "{}?latitude={}&longitude={}&hourly={}&start_date={}&end_date={}",
            self.base_url,
            latitude,
            longitude,
            HOURLY_METRICS,
            range.from_date.format("%Y-%m-%d"),
            range.to_date.format("%Y-%m-%d"),
        )
    }

    /// Fetch hourly readings for the given coordinates and date range
    ///
    /// Issues exactly one GET. Any transport, decoding or validation failure
    /// aborts the whole call; no partial data is returned.
    ///
    /// # Arguments
    /// * `lat` - Latitude coordinate
    /// * `lon` - Longitude coordinate
    /// * `range` - Inclusive start and end dates
    ///
    /// # Returns
    /// * `Ok(MeteoData)` - Six aligned series, one entry per returned hour
    /// * `Err(WeatherError)` - If the request, parsing or validation fails
    #[instrument(skip(self), fields(from = %range.from_date, to = %range.to_date))]
    pub async fn fetch_hourly(
        &self,
        lat: f64,
        lon: f64,
        range: DateRange,
    ) -> Result<MeteoData, WeatherError> {
        let url = self.hourly_url(lat, lon, range);

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let text = response.text().await?;
        let api_response: OpenMeteoHourlyResponse = serde_json::from_str(&text)?;

        info!(
            "Fetched weather data from {} to {}. {} records found.",
            range.from_date.format("%Y-%m-%d"),
            range.to_date.format("%Y-%m-%d"),
            api_response.hourly.time.len()
        );

        reshape(&api_response.hourly)
    }
}

/// Convert the column-oriented hourly block into row-aligned readings
///
/// Timestamps are processed in response order; duplicates are kept.
fn reshape(hourly: &HourlyColumns) -> Result<MeteoData, WeatherError> {
    let len = hourly.time.len();
    let mut meteo = MeteoData {
        temperature: Vec::with_capacity(len),
        humidity: Vec::with_capacity(len),
        apparent_temperature: Vec::with_capacity(len),
        precipitation: Vec::with_capacity(len),
        evapotranspiration: Vec::with_capacity(len),
        surface_pressure: Vec::with_capacity(len),
    };

    for (i, iso) in hourly.time.iter().enumerate() {
        let time = parse_datetime(iso)?;
        meteo.temperature.push(reading_at(time, &hourly.temperature_2m, i)?);
        meteo.humidity.push(reading_at(time, &hourly.relative_humidity_2m, i)?);
        meteo
            .apparent_temperature
            .push(reading_at(time, &hourly.apparent_temperature, i)?);
        meteo.precipitation.push(reading_at(time, &hourly.precipitation, i)?);
        meteo
            .evapotranspiration
            .push(reading_at(time, &hourly.evapotranspiration, i)?);
        meteo
            .surface_pressure
            .push(reading_at(time, &hourly.surface_pressure, i)?);
    }

    Ok(meteo)
}

fn reading_at<M: Metric>(
    time: NaiveDateTime,
    column: &[f64],
    index: usize,
) -> Result<Reading<M>, WeatherError> {
    let raw = column.get(index).copied().ok_or(WeatherError::MissingValue {
        metric: M::NAME,
        index,
    })?;
    Ok(Reading::new(time, raw)?)
}

/// Parse an ISO 8601 local datetime (e.g., "2024-07-15T05:00") to NaiveDateTime
fn parse_datetime(datetime_str: &str) -> Result<NaiveDateTime, WeatherError> {
    NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| WeatherError::InvalidTimeFormat(datetime_str.to_string()))
}

/// Capability to fetch hourly data for a fixed location
///
/// This is the interface the agent tool and the MCP server call into; the
/// coordinates are bound when the implementor is built.
#[async_trait]
pub trait HourlyWeather: Send + Sync {
    async fn fetch(&self, range: DateRange) -> Result<MeteoData, WeatherError>;
}

/// [`HourlyWeather`] backed by Open-Meteo for one coordinate pair
#[derive(Debug, Clone)]
pub struct LocalWeather {
    client: WeatherClient,
    latitude: f64,
    longitude: f64,
}

impl LocalWeather {
    pub fn new(client: WeatherClient, latitude: f64, longitude: f64) -> Self {
        Self {
            client,
            latitude,
            longitude,
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[async_trait]
impl HourlyWeather for LocalWeather {
    async fn fetch(&self, range: DateRange) -> Result<MeteoData, WeatherError> {
        self.client
            .fetch_hourly(self.latitude, self.longitude, range)
            .await
    }
}

/// Open-Meteo API response structure for hourly queries
#[derive(Debug, Deserialize)]
struct OpenMeteoHourlyResponse {
    hourly: HourlyColumns,
}

/// Hourly weather data from Open-Meteo, one array per metric
#[derive(Debug, Deserialize)]
struct HourlyColumns {
    time: Vec<String>,
    temperature_2m: Vec<f64>,
    relative_humidity_2m: Vec<f64>,
    apparent_temperature: Vec<f64>,
    precipitation: Vec<f64>,
    evapotranspiration: Vec<f64>,
    surface_pressure: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sample valid Open-Meteo hourly response
    const VALID_RESPONSE: &str = r#"{
        "latitude": 40.71,
        "longitude": -74.0,
        "generationtime_ms": 0.081,
        "utc_offset_seconds": 0,
        "timezone": "GMT",
        "timezone_abbreviation": "GMT",
        "elevation": 32.0,
        "hourly_units": {
            "time": "iso8601",
            "temperature_2m": "°C",
            "relative_humidity_2m": "%",
            "apparent_temperature": "°C",
            "precipitation": "mm",
            "evapotranspiration": "mm",
            "surface_pressure": "hPa"
        },
        "hourly": {
            "time": ["2025-07-12T14:00", "2025-07-12T15:00"],
            "temperature_2m": [25.5, 26.0],
            "relative_humidity_2m": [60, 58],
            "apparent_temperature": [27.0, 28.5],
            "precipitation": [0.0, 1.2],
            "evapotranspiration": [2.5, 3.1],
            "surface_pressure": [1013.25, 1012.8]
        }
    }"#;

    fn columns(json: &str) -> HourlyColumns {
        let response: OpenMeteoHourlyResponse =
            serde_json::from_str(json).expect("Failed to parse response");
        response.hourly
    }

    fn range(from: (i32, u32, u32), to: (i32, u32, u32)) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(from.0, from.1, from.2).unwrap(),
            NaiveDate::from_ymd_opt(to.0, to.1, to.2).unwrap(),
        )
    }

    #[test]
    fn test_reshape_valid_response() {
        let meteo = reshape(&columns(VALID_RESPONSE)).expect("Failed to reshape");

        assert_eq!(meteo.len(), 2);
        assert_eq!(meteo.temperature[0].value(), 25.5);
        assert_eq!(meteo.temperature[1].value(), 26.0);
        assert_eq!(meteo.humidity[0].value(), 60);
        assert_eq!(meteo.humidity[1].value(), 58);
        assert_eq!(meteo.apparent_temperature[1].value(), 28.5);
        assert_eq!(meteo.precipitation[1].value(), 1.2);
        assert_eq!(meteo.evapotranspiration[0].value(), 2.5);
        assert_eq!(meteo.surface_pressure[0].value(), 1013.25);

        let first = NaiveDate::from_ymd_opt(2025, 7, 12)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap();
        assert_eq!(meteo.temperature[0].time(), first);
    }

    #[test]
    fn test_reshape_aligns_timestamps_across_series() {
        let meteo = reshape(&columns(VALID_RESPONSE)).unwrap();

        for i in 0..meteo.len() {
            let t = meteo.temperature[i].time();
            assert_eq!(meteo.humidity[i].time(), t);
            assert_eq!(meteo.apparent_temperature[i].time(), t);
            assert_eq!(meteo.precipitation[i].time(), t);
            assert_eq!(meteo.evapotranspiration[i].time(), t);
            assert_eq!(meteo.surface_pressure[i].time(), t);
        }
    }

    #[test]
    fn test_reshape_empty_response() {
        let json = r#"{"hourly": {
            "time": [], "temperature_2m": [], "relative_humidity_2m": [],
            "apparent_temperature": [], "precipitation": [],
            "evapotranspiration": [], "surface_pressure": []
        }}"#;
        let meteo = reshape(&columns(json)).unwrap();

        assert!(meteo.is_empty());
        assert!(meteo.humidity.is_empty());
        assert!(meteo.apparent_temperature.is_empty());
        assert!(meteo.precipitation.is_empty());
        assert!(meteo.evapotranspiration.is_empty());
        assert!(meteo.surface_pressure.is_empty());
    }

    #[test]
    fn test_reshape_keeps_duplicate_timestamps_in_order() {
        let json = r#"{"hourly": {
            "time": ["2025-07-12T14:00", "2025-07-12T14:00"],
            "temperature_2m": [20.0, 21.0], "relative_humidity_2m": [50, 51],
            "apparent_temperature": [19.0, 20.0], "precipitation": [0.0, 0.5],
            "evapotranspiration": [0.1, 0.2], "surface_pressure": [1010.0, 1011.0]
        }}"#;
        let meteo = reshape(&columns(json)).unwrap();

        assert_eq!(meteo.len(), 2);
        assert_eq!(meteo.temperature[0].time(), meteo.temperature[1].time());
        assert_eq!(meteo.temperature[0].value(), 20.0);
        assert_eq!(meteo.temperature[1].value(), 21.0);
        assert_eq!(meteo.humidity[1].value(), 51);
    }

    #[test]
    fn test_reshape_fails_on_invalid_pressure() {
        let json = r#"{"hourly": {
            "time": ["2025-01-15T06:00"],
            "temperature_2m": [-40.0], "relative_humidity_2m": [80],
            "apparent_temperature": [-48.0], "precipitation": [0.0],
            "evapotranspiration": [0.0], "surface_pressure": [0.0]
        }}"#;
        let result = reshape(&columns(json));

        assert!(matches!(
            result,
            Err(WeatherError::InvalidReading(ReadingError::OutOfRange {
                metric: "surface_pressure",
                ..
            }))
        ));
    }

    #[test]
    fn test_reshape_fails_on_fractional_humidity() {
        let json = r#"{"hourly": {
            "time": ["2025-07-12T14:00"],
            "temperature_2m": [25.0], "relative_humidity_2m": [65.7],
            "apparent_temperature": [26.0], "precipitation": [0.0],
            "evapotranspiration": [0.3], "surface_pressure": [1012.0]
        }}"#;
        assert!(matches!(
            reshape(&columns(json)),
            Err(WeatherError::InvalidReading(ReadingError::NotIntegral { .. }))
        ));
    }

    #[test]
    fn test_reshape_fails_on_short_column() {
        let json = r#"{"hourly": {
            "time": ["2025-07-12T14:00", "2025-07-12T15:00"],
            "temperature_2m": [25.0, 26.0], "relative_humidity_2m": [65, 66],
            "apparent_temperature": [26.0, 27.0], "precipitation": [0.0],
            "evapotranspiration": [0.3, 0.4], "surface_pressure": [1012.0, 1012.5]
        }}"#;
        assert!(matches!(
            reshape(&columns(json)),
            Err(WeatherError::MissingValue {
                metric: "precipitation",
                index: 1
            })
        ));
    }

    #[test]
    fn test_missing_hourly_key_is_parse_error() {
        let result: Result<OpenMeteoHourlyResponse, _> =
            serde_json::from_str(r#"{"latitude": 1.0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 7, 15)
            .unwrap()
            .and_hms_opt(5, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime("2024-07-15T05:00").unwrap(), expected);
        assert_eq!(parse_datetime("2024-07-15T05:00:00").unwrap(), expected);
        assert!(matches!(
            parse_datetime("15/07/2024 05:00"),
            Err(WeatherError::InvalidTimeFormat(_))
        ));
    }

    #[test]
    fn test_hourly_url() {
        let client = WeatherClient::new();
        let url = client.hourly_url(40.7128, -74.006, range((2025, 7, 12), (2025, 7, 14)));

        assert_eq!(
            url,
            "https://api.open-meteo.com/v1/forecast?latitude=40.7128&longitude=-74.006\
             &hourly=temperature_2m,relative_humidity_2m,apparent_temperature,precipitation,evapotranspiration,surface_pressure\
             &start_date=2025-07-12&end_date=2025-07-14"
        );
    }

    #[test]
    fn test_hourly_url_reflects_each_call() {
        let client = WeatherClient::new().with_base_url("http://localhost:9999/forecast");
        let dates = range((2025, 7, 12), (2025, 7, 12));

        let madrid = client.hourly_url(40.4168, -3.7038, dates);
        let tokyo = client.hourly_url(35.6762, 139.6503, dates);

        assert!(madrid.starts_with("http://localhost:9999/forecast?"));
        assert!(madrid.contains("latitude=40.4168&longitude=-3.7038"));
        assert!(tokyo.contains("latitude=35.6762&longitude=139.6503"));
        assert!(!tokyo.contains("40.4168"));
    }

    #[test]
    fn test_local_weather_keeps_coordinates() {
        let local = LocalWeather::new(WeatherClient::new(), 52.52, 13.405);
        assert_eq!(local.latitude(), 52.52);
        assert_eq!(local.longitude(), 13.405);
    }

    #[test]
    fn test_date_range_deserializes_from_tool_args() {
        let parsed: DateRange =
            serde_json::from_str(r#"{"from_date":"2025-07-12","to_date":"2025-07-15"}"#).unwrap();
        assert_eq!(parsed, range((2025, 7, 12), (2025, 7, 15)));
    }
}
