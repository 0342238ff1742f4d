//! Command-line interface parsing for the weather agent
//!
//! Every setting can also come from the environment, so a deployment only
//! needs to export variables such as `MY_LATITUDE` and `AWS_REGION`.

use clap::builder::{BoolishValueParser, FalseyValueParser};
use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::agent::bedrock::{DEFAULT_MODEL_ID, DEFAULT_TEMPERATURE};

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq)]
pub enum CliError {
    /// A coordinate was neither passed nor set in the environment
    #[error("Missing {0}: pass --{0} or set {1}")]
    MissingCoordinate(&'static str, &'static str),

    #[error("Invalid {name}: {value} (expected a finite value between -{limit} and {limit})")]
    InvalidCoordinate {
        name: &'static str,
        value: f64,
        limit: f64,
    },

    #[error("Invalid temperature: {0} (expected a value between 0 and 1)")]
    InvalidTemperature(f32),
}

/// Weather agent - hourly forecasts written by an LLM from Open-Meteo data
#[derive(Parser, Debug)]
#[command(name = "meteo-agent")]
#[command(about = "Weather forecasts from hourly Open-Meteo data and a Bedrock model")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Ask the agent what the weather will be like tomorrow
    #[command(name = "check-weather", alias = "check_weather")]
    CheckWeather,

    /// Generate a multi-day markdown forecast report
    ///
    /// Example:
    ///   meteo-agent forecast --days 3
    Forecast {
        /// Number of days to forecast
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=16))]
        days: u8,
    },

    /// Serve the hourly weather tool over MCP (streamable HTTP)
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8888)]
        port: u16,

        /// Endpoint path
        #[arg(long, default_value = "/mcp")]
        path: String,
    },
}

/// Settings shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// Latitude of the forecast location
    #[arg(long, env = "MY_LATITUDE", global = true, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// Longitude of the forecast location
    #[arg(long, env = "MY_LONGITUDE", global = true, allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// ARN of an IAM role to assume before calling Bedrock
    #[arg(long, env = "AWS_ASSUME_ROLE", global = true)]
    pub assume_role: Option<String>,

    #[arg(long, env = "AWS_REGION", global = true)]
    pub region: Option<String>,

    #[arg(long = "profile", env = "AWS_PROFILE_NAME", global = true)]
    pub profile_name: Option<String>,

    #[arg(long, env = "AWS_ACCESS_KEY_ID", global = true, hide_env_values = true)]
    pub access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", global = true, hide_env_values = true)]
    pub secret_access_key: Option<String>,

    /// Bedrock model or inference profile id
    #[arg(long = "model", env = "IA_MODEL", global = true, default_value = DEFAULT_MODEL_ID)]
    pub model_id: String,

    /// Sampling temperature (0 to 1)
    #[arg(long, env = "IA_TEMPERATURE", global = true, default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Model read timeout in seconds
    #[arg(long, env = "LLM_READ_TIMEOUT", global = true, default_value_t = 300)]
    pub read_timeout: u64,

    /// Model connect timeout in seconds
    #[arg(long, env = "LLM_CONNECT_TIMEOUT", global = true, default_value_t = 60)]
    pub connect_timeout: u64,

    /// Total attempts for each model call
    #[arg(
        long,
        env = "LLM_MAX_ATTEMPTS",
        global = true,
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: u32,

    /// Run file writes and code without asking
    #[arg(long, env = "BYPASS_TOOL_CONSENT", global = true, value_parser = BoolishValueParser::new())]
    pub bypass_tool_consent: bool,

    /// Log level or filter directive
    #[arg(long, env = "LOG_LEVEL", global = true, default_value = "info")]
    pub log_level: String,

    /// Force debug logging
    ///
    /// Any `DEBUG` value other than a false-like one (`false`, `0`, `no`,
    /// `off`, empty) enables it.
    #[arg(long, env = "DEBUG", global = true, value_parser = FalseyValueParser::new())]
    pub debug: bool,
}

#[cfg(test)]
impl Cli {
    /// Parse `argv` with every environment fallback disabled
    pub(crate) fn try_parse_without_env<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        use clap::{CommandFactory, FromArgMatches};

        let matches = Self::command()
            .mut_args(|arg| arg.env(None::<&str>))
            .try_get_matches_from(argv)?;
        Self::from_arg_matches(&matches)
    }
}
