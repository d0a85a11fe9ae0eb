pub mod types;
pub mod error;
pub mod config;
pub mod data;
pub mod store;
pub mod filter;
pub mod aggregate;
pub mod charts;
pub mod locate;
pub mod view;
pub mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use types::{Category, CensusYear, SelectionRequest};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Default log level when RUST_LOG is unset
    #[arg(short, long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the townlands in the census table
    Places {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Render the view for one selection as JSON
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Townland to show
        #[arg(long)]
        townland: Option<String>,
        /// Census year the threshold applies to
        #[arg(long, default_value = "1841")]
        year: CensusYear,
        /// Total, Male or Female
        #[arg(long, default_value = "Total")]
        category: Category,
        /// Show townlands whose population is greater than this
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Serve the dashboard API and static front end
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Places { config } => {
            let app_config = config::AppConfig::load_from_file(&config)?;
            let census = store::census(&app_config.input.census)?;
            for name in census.townland_names() {
                println!("{}", name);
            }
        }
        Commands::Render { config, townland, year, category, threshold } => {
            let app_config = config::AppConfig::load_from_file(&config)?;
            let census = store::census(&app_config.input.census)?;

            let request = SelectionRequest { townland, year, category, threshold };
            let locator = locate::LazyLocator::new(&app_config.input.geo);
            let view = view::render(&request, &census, &locator)?;

            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Commands::Serve { config } => {
            tracing::info!("Serving dashboard with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(&config)?;
            server::start_server(app_config).await?;
        }
    }

    Ok(())
}
