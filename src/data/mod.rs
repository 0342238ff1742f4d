//! Core data models for hourly weather readings
//!
//! Every reading pairs a local timestamp with one validated value. The legal
//! range of the value depends on the metric, and is checked once at
//! construction: a `Reading` holding an out-of-range value cannot exist.

pub mod weather;

pub use weather::{DateRange, HourlyWeather, LocalWeather, WeatherClient, WeatherError};

use std::fmt;
use std::marker::PhantomData;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a raw value does not fit a metric's legal range
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadingError {
    /// Value is NaN or infinite
    #[error("{metric} must be a finite number, got {value}")]
    NotFinite { metric: &'static str, value: f64 },

    /// Value falls outside the metric's range
    #[error("{metric} value {value} is out of range ({rule})")]
    OutOfRange {
        metric: &'static str,
        value: f64,
        rule: &'static str,
    },

    /// Value must be a whole number but has a fractional part
    #[error("{metric} must be a whole number, got {value}")]
    NotIntegral { metric: &'static str, value: f64 },
}

/// A weather metric: its name, unit, storage type and validation rule.
pub trait Metric {
    /// Storage type of a validated value
    type Value: Copy + fmt::Debug + PartialEq + Serialize;

    /// Name used in error messages
    const NAME: &'static str;

    /// Unit of measurement
    const UNIT: &'static str;

    /// Validates a raw value and converts it to the storage type.
    fn validate(raw: f64) -> Result<Self::Value, ReadingError>;
}

fn finite(metric: &'static str, raw: f64) -> Result<f64, ReadingError> {
    if raw.is_finite() {
        Ok(raw)
    } else {
        Err(ReadingError::NotFinite { metric, value: raw })
    }
}

/// Air temperature at 2 m
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temperature;

/// Relative humidity at 2 m
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Humidity;

/// Perceived ("feels like") temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApparentTemperature;

/// Precipitation sum over the preceding hour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precipitation;

/// Reference evapotranspiration. Negative values model condensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evapotranspiration;

/// Atmospheric pressure at the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfacePressure;

impl Metric for Temperature {
    type Value = f64;
    const NAME: &'static str = "temperature";
    const UNIT: &'static str = "°C";

    fn validate(raw: f64) -> Result<f64, ReadingError> {
        finite(Self::NAME, raw)
    }
}

impl Metric for Humidity {
    type Value = u8;
    const NAME: &'static str = "humidity";
    const UNIT: &'static str = "%";

    /// Only whole numbers in 0..=100 are accepted; 65.0 is stored as 65.
    fn validate(raw: f64) -> Result<u8, ReadingError> {
        let raw = finite(Self::NAME, raw)?;
        if raw.fract() != 0.0 {
            return Err(ReadingError::NotIntegral {
                metric: Self::NAME,
                value: raw,
            });
        }
        if !(0.0..=100.0).contains(&raw) {
            return Err(ReadingError::OutOfRange {
                metric: Self::NAME,
                value: raw,
                rule: "0 <= value <= 100",
            });
        }
        Ok(raw as u8)
    }
}

impl Metric for ApparentTemperature {
    type Value = f64;
    const NAME: &'static str = "apparent_temperature";
    const UNIT: &'static str = "°C";

    fn validate(raw: f64) -> Result<f64, ReadingError> {
        finite(Self::NAME, raw)
    }
}

impl Metric for Precipitation {
    type Value = f64;
    const NAME: &'static str = "precipitation";
    const UNIT: &'static str = "mm";

    fn validate(raw: f64) -> Result<f64, ReadingError> {
        let raw = finite(Self::NAME, raw)?;
        if raw < 0.0 {
            return Err(ReadingError::OutOfRange {
                metric: Self::NAME,
                value: raw,
                rule: "value >= 0",
            });
        }
        Ok(raw)
    }
}

impl Metric for Evapotranspiration {
    type Value = f64;
    const NAME: &'static str = "evapotranspiration";
    const UNIT: &'static str = "mm";

    fn validate(raw: f64) -> Result<f64, ReadingError> {
        finite(Self::NAME, raw)
    }
}

impl Metric for SurfacePressure {
    type Value = f64;
    const NAME: &'static str = "surface_pressure";
    const UNIT: &'static str = "hPa";

    fn validate(raw: f64) -> Result<f64, ReadingError> {
        let raw = finite(Self::NAME, raw)?;
        if raw <= 0.0 {
            return Err(ReadingError::OutOfRange {
                metric: Self::NAME,
                value: raw,
                rule: "value > 0",
            });
        }
        Ok(raw)
    }
}

/// Unvalidated shape used when deserializing a reading
#[derive(Debug, Deserialize)]
pub struct RawReading {
    time: NaiveDateTime,
    value: f64,
}

/// A single observation of one metric at one point in time
///
/// Deserialization runs the same validation as [`Reading::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    bound(serialize = "", deserialize = "M: Metric"),
    try_from = "RawReading"
)]
pub struct Reading<M: Metric> {
    time: NaiveDateTime,
    value: M::Value,
    #[serde(skip)]
    metric: PhantomData<M>,
}

impl<M: Metric> Reading<M> {
    /// Creates a reading, failing if `raw` is outside the metric's range.
    pub fn new(time: NaiveDateTime, raw: f64) -> Result<Self, ReadingError> {
        Ok(Self {
            time,
            value: M::validate(raw)?,
            metric: PhantomData,
        })
    }

    /// Local timestamp of the reading
    pub fn time(&self) -> NaiveDateTime {
        self.time
    }

    /// Validated value
    pub fn value(&self) -> M::Value {
        self.value
    }

    /// Unit of the value
    pub fn unit(&self) -> &'static str {
        M::UNIT
    }
}

impl<M: Metric> TryFrom<RawReading> for Reading<M> {
    type Error = ReadingError;

    fn try_from(raw: RawReading) -> Result<Self, Self::Error> {
        Self::new(raw.time, raw.value)
    }
}

pub type TemperatureReading = Reading<Temperature>;
pub type HumidityReading = Reading<Humidity>;
pub type ApparentTemperatureReading = Reading<ApparentTemperature>;
pub type PrecipitationReading = Reading<Precipitation>;
pub type EvapotranspirationReading = Reading<Evapotranspiration>;
pub type SurfacePressureReading = Reading<SurfacePressure>;

/// Six hourly series for one date range, aligned by index
///
/// The i-th entry of every series shares the same timestamp when produced by
/// [`WeatherClient::fetch_hourly`]. The type itself does not enforce equal
/// lengths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeteoData {
    pub temperature: Vec<TemperatureReading>,
    pub humidity: Vec<HumidityReading>,
    pub apparent_temperature: Vec<ApparentTemperatureReading>,
    pub precipitation: Vec<PrecipitationReading>,
    pub evapotranspiration: Vec<EvapotranspirationReading>,
    pub surface_pressure: Vec<SurfacePressureReading>,
}

impl MeteoData {
    /// Number of hourly records (length of the temperature series)
    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }
}
