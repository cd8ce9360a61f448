use anyhow::Context;
use clap::{Parser, Subcommand};
use fight_scraper::config::{Config, DEFAULT_CONFIG_PATH};
use fight_scraper::logging;
use fight_scraper::metrics::init_metrics;
use fight_scraper::parser::FightParser;
use fight_scraper::server::{start_server, AppState};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "fight_scraper")]
#[command(about = "Scrapes fight results and serves them as JSON")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve,
    /// Scrape once and print the records as JSON
    Scrape {
        /// Page to scrape instead of the configured source URL
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_from(&cli.config).context("Failed to load configuration")?;
    let _guard = logging::init_logging(&config.logging);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!("Starting fight results server");
            let metrics = if config.metrics.is_enabled() {
                let listen = config
                    .metrics
                    .port
                    .map(|port| config.server.resolve(port))
                    .transpose()?;
                init_metrics(listen)
            } else {
                None
            };
            let parser = FightParser::from_config(&config.scraper)?;
            let state = AppState {
                parser: Arc::new(parser),
                metrics,
            };
            start_server(&config.server, state).await?;
        }
        Commands::Scrape { url } => {
            if let Some(url) = url {
                config.scraper.source_url = url;
                config.validate()?;
            }
            let parser = FightParser::from_config(&config.scraper)?;
            let fights = parser
                .parse_fights()
                .await
                .with_context(|| format!("Failed to scrape {}", parser.source_url()))?;
            println!("{}", serde_json::to_string_pretty(&fights)?);
            info!("Printed {} fights", fights.len());
        }
    }

    Ok(())
}
