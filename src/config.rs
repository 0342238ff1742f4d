//! Typed runtime settings derived from the parsed command line
//!
//! Variables from `env/<ENVIRONMENT>/.env` are loaded before parsing; values
//! already present in the process environment take precedence.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aws::{AwsSettings, ClientTuning};
use crate::cli::{Cli, CliError};
use crate::tools::ConsentPolicy;

/// Coordinates the weather tool is bound to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

fn check_coordinate(name: &'static str, value: f64, limit: f64) -> Result<f64, CliError> {
    if value.is_finite() && (-limit..=limit).contains(&value) {
        Ok(value)
    } else {
        Err(CliError::InvalidCoordinate { name, value, limit })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model_id: String,
    pub temperature: f32,
}

/// Everything the commands need, resolved once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    /// Checked when given; only commands that fetch weather require them
    latitude: Option<f64>,
    longitude: Option<f64>,
    pub aws: AwsSettings,
    pub model: ModelSettings,
    pub tuning: ClientTuning,
    pub consent: ConsentPolicy,
    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let args = &cli.settings;

        let latitude = args
            .latitude
            .map(|v| check_coordinate("latitude", v, 90.0))
            .transpose()?;
        let longitude = args
            .longitude
            .map(|v| check_coordinate("longitude", v, 180.0))
            .transpose()?;

        if !(0.0..=1.0).contains(&args.temperature) {
            return Err(CliError::InvalidTemperature(args.temperature));
        }

        let log_filter = if cli.verbose || args.debug {
            "debug".to_string()
        } else {
            args.log_level.to_lowercase()
        };

        Ok(Self {
            latitude,
            longitude,
            aws: AwsSettings {
                assume_role: non_empty(&args.assume_role),
                region: non_empty(&args.region),
                profile_name: non_empty(&args.profile_name),
                access_key_id: non_empty(&args.access_key_id),
                secret_access_key: non_empty(&args.secret_access_key),
            },
            model: ModelSettings {
                model_id: args.model_id.clone(),
                temperature: args.temperature,
            },
            tuning: ClientTuning {
                read_timeout: Duration::from_secs(args.read_timeout),
                connect_timeout: Duration::from_secs(args.connect_timeout),
                max_attempts: args.max_attempts,
            },
            consent: ConsentPolicy::from_bypass_flag(args.bypass_tool_consent),
            log_filter,
        })
    }

    /// The configured location, or which coordinate is missing
    pub fn location(&self) -> Result<Location, CliError> {
        let latitude = self
            .latitude
            .ok_or(CliError::MissingCoordinate("latitude", "MY_LATITUDE"))?;
        let longitude = self
            .longitude
            .ok_or(CliError::MissingCoordinate("longitude", "MY_LONGITUDE"))?;
        Ok(Location {
            latitude,
            longitude,
        })
    }
}

/// Environment used when `ENVIRONMENT` is unset
pub const DEFAULT_ENVIRONMENT: &str = "local";

/// `env/<environment>/.env` under `base`
pub fn env_file_path(base: &Path, environment: Option<&str>) -> PathBuf {
    let environment = environment
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_ENVIRONMENT);
    base.join("env").join(environment).join(".env")
}

/// Load variables from `path` without overriding existing ones
///
/// Returns the path when a file was loaded and `None` when there is none.
pub fn load_env_file(path: &Path) -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(Some(path.to_path_buf())),
        Err(dotenvy::Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Empty environment variables count as unset
fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
