use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use collective::{cli, config, server};

#[derive(Parser)]
#[command(name = "collective", version, about = "Retrieval-augmented collective chat service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Chat with the collective from the terminal
    Chat,
    /// Search the collective memory
    Search {
        /// Natural language query
        query: String,
        /// Maximum number of documents to show
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Show collective memory statistics
    Stats,
    /// Manage the embedding and generation models
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download model files to ~/.collective/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = config::default_config_path();
    let mut config = config::CollectiveConfig::load_file(&config_path)?;

    // Tracing comes up before the env overrides run, so override warnings
    // are not lost. The log level itself can still come from the environment.
    let log_level = std::env::var("COLLECTIVE_LOG_LEVEL")
        .unwrap_or_else(|_| config.server.log_level.clone());
    let filter =
        EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if !config_path.exists() {
        tracing::info!(path = %config_path.display(), "no config file, using defaults");
    }
    config.apply_env_overrides();

    match cli.command {
        Command::Serve => {
            server::serve(config).await?;
        }
        Command::Chat => {
            cli::chat::chat(config).await?;
        }
        Command::Search { query, limit } => {
            cli::search::search(&config, &query, limit).await?;
        }
        Command::Stats => {
            cli::stats::stats(&config)?;
        }
        Command::Model { action } => match action {
            ModelAction::Download => {
                cli::model_download(&config).await?;
            }
        },
    }

    Ok(())
}
