mod app;
mod check_cmd;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use reframe_channels::{ChannelAdapter, TelegramAdapter};
use reframe_config::{
    load_and_prepare, load_dotenv, redacted_config, require_credentials, resolve_config_path,
    ReframeConfig,
};
use reframe_logging::init_logger;
use reframe_tools::format_results;

#[derive(Parser)]
#[command(name = "reframe")]
#[command(about = "Reframe - self-correcting counselling bot for Telegram")]
#[command(version)]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Telegram bot (default)
    Run,
    /// Verify credentials, the dialog database and remote services
    Check,
    /// Run a web search from the terminal
    Search {
        /// Free-text query
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Print the effective configuration with secrets redacted
    Config {
        /// Print JSON instead of YAML
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    load_dotenv();

    let config_path = resolve_config_path(cli.config.as_deref());
    let (config, report) = load_and_prepare(config_path.as_deref()).await?;

    init_logger(&config.logging.dir, &config.logging.level)?;

    for warning in &report.warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        for err in &report.errors {
            error!(path = %err.path, message = %err.message, "Config error");
        }
        bail!("Invalid configuration ({} errors)", report.errors.len());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_bot(config).await?,
        Commands::Check => {
            if !check_cmd::run(&config).await? {
                std::process::exit(1);
            }
        }
        Commands::Search { query } => {
            let credentials = require_credentials(&config)?;
            let provider = app::search_provider(&config, &credentials.tavily_api_key);
            let hits = provider.search(&query.join(" ")).await?;
            println!("{}", format_results(&hits));
        }
        Commands::Config { json } => {
            let redacted = redacted_config(&config);
            if json {
                println!("{}", serde_json::to_string_pretty(&redacted)?);
            } else {
                print!("{}", serde_yaml::to_string(&redacted)?);
            }
        }
    }

    Ok(())
}

async fn run_bot(config: ReframeConfig) -> Result<()> {
    let credentials = require_credentials(&config)?;
    info!(
        model = %config.model.name,
        db = %config.storage.db_path,
        "Starting Reframe"
    );

    let service = Arc::new(app::build_service(&config, &credentials)?);
    let adapter = TelegramAdapter::new(credentials.telegram_token, service);

    info!(channel = adapter.name(), "Channel adapter ready");
    adapter.start().await
}
