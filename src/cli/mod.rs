use clap::{Parser, Subcommand};
use serde_json::json;

use crate::database::manager::DatabaseManager;
use crate::database::repository::TrendRepository;
use crate::fetcher::FaersClient;
use crate::services::refresh_service::RefreshService;
use crate::services::seed_service::SeedService;

#[derive(Parser)]
#[command(name = "summit")]
#[command(about = "SummitCare CLI - operator tooling for the trends API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to bind (overrides SUMMIT_API_PORT/PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Fetch and cache adverse-event counts for tracked subjects")]
    Refresh {
        #[arg(long, value_delimiter = ',', help = "Subjects to refresh (default: configured list)")]
        subjects: Vec<String>,
    },

    #[command(about = "Create cache tables and indexes if absent")]
    Migrate,

    #[command(about = "Insert demonstration rows (idempotent)")]
    Seed,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or_else(crate::server::port_from_env);
            crate::server::run(port).await
        }
        Commands::Refresh { subjects } => refresh(subjects).await,
        Commands::Migrate => migrate().await,
        Commands::Seed => seed().await,
    }
}

async fn refresh(subjects: Vec<String>) -> anyhow::Result<()> {
    let config = crate::config::config();

    let subjects: Vec<String> = {
        let cleaned: Vec<String> = subjects
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if cleaned.is_empty() {
            config.refresh.subjects.clone()
        } else {
            cleaned
        }
    };

    let pool = DatabaseManager::pool().await?;
    let service = RefreshService::new(
        FaersClient::new(&config.fetcher),
        TrendRepository::new(pool),
        config.refresh.preview_limit,
    );

    let outcomes = service.refresh_all(&subjects).await;
    let all_ok = outcomes.iter().all(|o| o.ok);

    println!("{}", serde_json::to_string_pretty(&json!({ "results": outcomes }))?);

    DatabaseManager::close_all().await;
    if !all_ok {
        anyhow::bail!("one or more subjects failed to refresh");
    }
    Ok(())
}

async fn migrate() -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await?;
    crate::database::migrate::run(&pool).await?;
    println!("migration complete");
    DatabaseManager::close_all().await;
    Ok(())
}

async fn seed() -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await?;
    let summary = SeedService::new(pool).seed().await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    DatabaseManager::close_all().await;
    Ok(())
}
