//! Studio CMS - Main Server
//!
//! JSON API for the studio marketing site and its admin.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use studio_cms::{seed, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "studio-cms")]
#[command(about = "Studio marketing site CMS server")]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on (overrides config.yaml / SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Load content from a YAML seed file
    Seed {
        /// Seed file path
        #[arg(short, long, default_value = "seed.yaml")]
        path: PathBuf,

        /// Append to collections that already hold records
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,studio_cms=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            studio_cms::start_server(config).await
        }
        Commands::Seed { path, force } => run_seed(config, &path, force).await,
    }
}

async fn run_seed(config: Config, path: &std::path::Path, force: bool) -> Result<()> {
    tracing::info!("Seeding from {}", path.display());

    let seed_file = seed::SeedFile::load(path)?;
    let state = AppState::new(config).await?;

    let report = seed::apply_seed(state.store.clone(), seed_file, force).await?;

    tracing::info!(
        "Seed complete: {} records created, company {}, skipped {:?}",
        report.total_created(),
        if report.company_updated { "updated" } else { "unchanged" },
        report.skipped
    );

    Ok(())
}
