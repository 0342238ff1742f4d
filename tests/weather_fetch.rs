//! Integration tests for the Open-Meteo client using WireMock
//!
//! These tests run the real HTTP client against a mock forecast endpoint.

use std::io;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use meteo_agent::data::{DateRange, HourlyWeather, LocalWeather, WeatherClient, WeatherError};
use serde_json::json;
use tracing_subscriber::fmt::MakeWriter;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

// =============================================================================
// Test Helpers
// =============================================================================

fn client(server: &MockServer) -> WeatherClient {
    WeatherClient::new().with_base_url(format!("{}/v1/forecast", server.uri()))
}

fn range(from: (i32, u32, u32), to: (i32, u32, u32)) -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(from.0, from.1, from.2).unwrap(),
        NaiveDate::from_ymd_opt(to.0, to.1, to.2).unwrap(),
    )
}

fn hourly_body(time: &[&str], pressure: &[f64]) -> serde_json::Value {
    let n = time.len();
    json!({
        "latitude": 40.42,
        "longitude": -3.7,
        "hourly": {
            "time": time,
            "temperature_2m": vec![21.5; n],
            "relative_humidity_2m": vec![55; n],
            "apparent_temperature": vec![22.0; n],
            "precipitation": vec![0.0; n],
            "evapotranspiration": vec![0.12; n],
            "surface_pressure": pressure,
        }
    })
}

/// Collects formatted log output in memory
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// =============================================================================
// Fetch Tests
// =============================================================================

#[tokio::test]
async fn test_request_carries_coordinates_and_dates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "40.4168"))
        .and(query_param("longitude", "-3.7038"))
        .and(query_param(
            "hourly",
            "temperature_2m,relative_humidity_2m,apparent_temperature,precipitation,evapotranspiration,surface_pressure",
        ))
        .and(query_param("start_date", "2025-07-12"))
        .and(query_param("end_date", "2025-07-13"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hourly_body(&[], &[])))
        .expect(1)
        .mount(&server)
        .await;

    let data = client(&server)
        .fetch_hourly(40.4168, -3.7038, range((2025, 7, 12), (2025, 7, 13)))
        .await
        .unwrap();
    assert!(data.is_empty());
}

#[tokio::test]
async fn test_sequential_calls_use_their_own_coordinates() {
    let server = MockServer::start().await;
    for lat in ["10.5", "-33.9"] {
        Mock::given(method("GET"))
            .and(query_param("latitude", lat))
            .respond_with(ResponseTemplate::new(200).set_body_json(hourly_body(&[], &[])))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client(&server);
    let dates = range((2025, 1, 1), (2025, 1, 1));
    client.fetch_hourly(10.5, 20.0, dates).await.unwrap();
    client.fetch_hourly(-33.9, 18.4, dates).await.unwrap();
}

#[tokio::test]
async fn test_empty_response_gives_empty_sequences() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hourly_body(&[], &[])))
        .mount(&server)
        .await;

    let data = client(&server)
        .fetch_hourly(0.0, 0.0, range((2025, 7, 12), (2025, 7, 12)))
        .await
        .unwrap();
    assert!(data.temperature.is_empty());
    assert!(data.humidity.is_empty());
    assert!(data.apparent_temperature.is_empty());
    assert!(data.precipitation.is_empty());
    assert!(data.evapotranspiration.is_empty());
    assert!(data.surface_pressure.is_empty());
}

#[tokio::test]
async fn test_sequences_are_aligned_by_timestamp() {
    let server = MockServer::start().await;
    let time = ["2025-07-12T00:00", "2025-07-12T01:00", "2025-07-12T02:00"];
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(hourly_body(&time, &[1012.0, 1012.5, 1013.1])),
        )
        .mount(&server)
        .await;

    let data = client(&server)
        .fetch_hourly(40.4, -3.7, range((2025, 7, 12), (2025, 7, 12)))
        .await
        .unwrap();

    assert_eq!(data.len(), 3);
    for (i, stamp) in time.iter().enumerate() {
        let expected = chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M").unwrap();
        assert_eq!(data.temperature[i].time(), expected);
        assert_eq!(data.humidity[i].time(), expected);
        assert_eq!(data.apparent_temperature[i].time(), expected);
        assert_eq!(data.precipitation[i].time(), expected);
        assert_eq!(data.evapotranspiration[i].time(), expected);
        assert_eq!(data.surface_pressure[i].time(), expected);
    }
    assert_eq!(data.humidity[0].value(), 55);
    assert_eq!(data.surface_pressure[2].value(), 1013.1);
}

#[tokio::test]
async fn test_invalid_pressure_fails_whole_fetch() {
    let server = MockServer::start().await;
    let mut body = hourly_body(&["2025-07-12T00:00"], &[0.0]);
    body["hourly"]["temperature_2m"] = json!([-40.0]);
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_hourly(40.4, -3.7, range((2025, 7, 12), (2025, 7, 12)))
        .await
        .unwrap_err();
    assert!(matches!(err, WeatherError::InvalidReading(_)));
}

#[tokio::test]
async fn test_server_error_fails_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_hourly(40.4, -3.7, range((2025, 7, 12), (2025, 7, 12)))
        .await
        .unwrap_err();
    assert!(matches!(err, WeatherError::RequestFailed(_)));
}

#[tokio::test]
async fn test_malformed_body_fails_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_hourly(40.4, -3.7, range((2025, 7, 12), (2025, 7, 12)))
        .await
        .unwrap_err();
    assert!(matches!(err, WeatherError::ParseError(_)));
}

#[tokio::test]
async fn test_local_weather_binds_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("latitude", "51.5"))
        .and(query_param("longitude", "-0.12"))
        .and(query_param("start_date", "2025-03-01"))
        .and(query_param("end_date", "2025-03-02"))
        .respond_with(ResponseTemplate::new(200).set_body_json(hourly_body(&[], &[])))
        .expect(1)
        .mount(&server)
        .await;

    let weather = LocalWeather::new(client(&server), 51.5, -0.12);
    weather
        .fetch(range((2025, 3, 1), (2025, 3, 2)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_fetch_logs_date_range_and_record_count() {
    let server = MockServer::start().await;
    let time = ["2025-07-12T00:00", "2025-07-12T01:00", "2025-07-13T00:00"];
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(hourly_body(&time, &[1012.0, 1012.5, 1013.1])),
        )
        .mount(&server)
        .await;

    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    // current-thread runtime, so the guard covers every poll of the fetch
    let _guard = tracing::subscriber::set_default(subscriber);

    client(&server)
        .fetch_hourly(40.4, -3.7, range((2025, 7, 12), (2025, 7, 13)))
        .await
        .unwrap();

    let output = logs.contents();
    let line = output
        .lines()
        .find(|line| line.contains("records found"))
        .unwrap_or_else(|| panic!("no fetch summary in logs:\n{output}"));
    assert!(line.contains("INFO"), "{line}");
    assert!(line.contains("2025-07-12"), "{line}");
    assert!(line.contains("2025-07-13"), "{line}");
    assert!(line.contains("3 records"), "{line}");
}
