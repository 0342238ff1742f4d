//! Weather agent CLI
//!
//! Fetches hourly Open-Meteo data for a fixed location and lets a Bedrock
//! model turn it into forecasts, or serves the weather tool over MCP.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use meteo_agent::agent::{Agent, BedrockModel};
use meteo_agent::aws::load_sdk_config;
use meteo_agent::cli::{Cli, Commands};
use meteo_agent::config::{env_file_path, load_env_file, Settings};
use meteo_agent::data::{HourlyWeather, LocalWeather, WeatherClient};
use meteo_agent::mcp::{McpServer, SERVER_NAME, SERVER_VERSION};
use meteo_agent::prompts::{forecast_prompt, CHECK_WEATHER_PROMPT, SYSTEM_PROMPT};
use meteo_agent::tools::Toolset;

/// Logs go to stderr so stdout only carries the report
fn init_logging(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter)
        .with_context(|| format!("Invalid log filter '{filter}'"))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(ChronoLocal::new("%d/%m/%Y %X".to_string())),
        )
        .try_init()
        .context("Failed to initialise logging")
}

fn local_weather(settings: &Settings) -> Result<Arc<dyn HourlyWeather>> {
    let location = settings.location()?;
    let weather: Arc<dyn HourlyWeather> = Arc::new(LocalWeather::new(
        WeatherClient::new(),
        location.latitude,
        location.longitude,
    ));
    Ok(weather)
}

async fn run_agent(settings: &Settings, prompt: &str) -> Result<()> {
    let weather = local_weather(settings)?;
    let sdk_config = load_sdk_config(&settings.aws, &settings.tuning).await;
    let model = BedrockModel::from_conf(
        &sdk_config,
        &settings.model.model_id,
        settings.model.temperature,
    );
    let agent = Agent::new(
        model,
        SYSTEM_PROMPT,
        Toolset::standard(weather, settings.consent),
    );

    let result = agent.run(prompt).await.context("Agent run failed")?;
    info!(
        turns = result.turns,
        tool_calls = result.tool_calls,
        "Agent completed"
    );
    println!("{result}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = env_file_path(Path::new("."), std::env::var("ENVIRONMENT").ok().as_deref());
    let loaded = load_env_file(&env_file)
        .with_context(|| format!("Failed to load {}", env_file.display()))?;

    let cli = Cli::parse();
    let settings = Settings::from_cli(&cli)?;
    init_logging(&settings.log_filter)?;
    if let Some(path) = loaded {
        debug!(path = %path.display(), "Loaded environment file");
    }

    match cli.command {
        Commands::CheckWeather => {
            info!("Checking tomorrow's weather");
            run_agent(&settings, CHECK_WEATHER_PROMPT).await
        }
        Commands::Forecast { days } => {
            info!(days, "Processing weather for the next {days} days");
            run_agent(&settings, &forecast_prompt(days)).await
        }
        Commands::Serve { host, port, path } => {
            let server = McpServer::new(
                SERVER_NAME,
                SERVER_VERSION,
                Toolset::weather_only(local_weather(&settings)?),
            );
            server
                .serve(&host, port, &path)
                .await
                .with_context(|| format!("MCP server on {host}:{port} failed"))
        }
    }
}
