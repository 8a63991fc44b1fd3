use anyhow::Result;
use tracing::{info, Level};

use mongo_migrate::{collect_registry, MigrationRunner, RunOptions, ServiceConfig};

mod cli;
mod config;
mod database;
mod migrations;
mod models;

use config::Config;
use database::DatabaseManager;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    dotenvy::dotenv().ok();
    let config = Config::from_env();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "migrate" {
        return cli::run_migration_cli(config).await;
    }

    if args.len() > 1 && args[1] == "verify" {
        return verify(config).await;
    }

    if args.len() > 1 && (args[1] == "help" || args[1] == "--help" || args[1] == "-h") {
        cli::print_seed_usage();
        return Ok(());
    }

    seed(config).await
}

/// Default action: apply pending seed releases, then check the result.
/// This is the single-shot deploy-time role the date-stamped shell scripts
/// used to fill.
async fn seed(config: Config) -> Result<()> {
    info!("Starting seed run");
    info!("MongoDB URI: {}", config.mongodb_uri);
    info!("Database: {}", config.database_name);

    if !config.auto_migrate {
        info!("AUTO_MIGRATE is disabled; nothing to do");
        return Ok(());
    }

    let db = DatabaseManager::connect(&config.mongodb_uri, &config.database_name).await?;
    info!("Connected to MongoDB");

    let registry = collect_registry()?;
    let runner =
        MigrationRunner::with_config(db.database().clone(), registry, config.migrator_config());

    runner.initialize().await?;
    let outcomes = runner.migrate_up(RunOptions::default()).await?;

    if outcomes.is_empty() {
        info!("Database already seeded; nothing to apply");
    } else {
        info!("Applied {} migration(s)", outcomes.len());
        for outcome in &outcomes {
            info!(
                "  ✓ Migration {}: {} ({}ms)",
                outcome.version, outcome.description, outcome.duration_ms
            );
        }
    }

    db.verify_seed().await
}

/// Re-check the seeded state without applying anything.
async fn verify(config: Config) -> Result<()> {
    let db = DatabaseManager::connect(&config.mongodb_uri, &config.database_name).await?;
    db.verify_seed().await?;
    println!("✅ Seed verification passed");
    Ok(())
}
