//! CLI utilities for migration management.
//!
//! A generic command surface any service can reuse: the service supplies
//! connection details through [`ServiceConfig`] and forwards either parsed
//! clap commands or the simple `migrate <verb>` argv form.

use std::env;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mongodb::{Client, Database};

use crate::{collect_registry, MigrationLoader, MigrationRunner, MigratorConfig, RunOptions};

/// CLI entry for migration management
#[derive(Parser)]
#[command(name = "migrate")]
#[command(about = "MongoDB migration management")]
pub struct MigrationCli {
    #[command(subcommand)]
    pub command: Option<MigrationCommand>,
}

/// Migration subcommands
#[derive(Subcommand)]
pub enum MigrationCommand {
    /// Run all pending migrations
    Up {
        /// Show what would be executed without running
        #[arg(long)]
        dry_run: bool,
        /// Execute even if migrations are already applied
        #[arg(long)]
        force: bool,
    },
    /// Rollback the last migration
    Down {
        #[arg(long)]
        dry_run: bool,
        /// Execute even if the migration is not recorded as applied
        #[arg(long)]
        force: bool,
    },
    /// Migrate to a specific version (forward or rollback)
    To {
        /// Target version number
        version: u32,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        force: bool,
    },
    /// Show migration status
    Status {
        /// Emit the status as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the migration plan without executing it
    Plan {
        /// Target version (defaults to latest)
        version: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// Discover migration files on the filesystem
    Discover {
        /// Path to the migrations directory
        #[arg(long, default_value = "src/migrations")]
        path: String,
    },
    /// Generate migration module declarations (legacy)
    Generate {
        #[arg(long, default_value = "src/migrations")]
        path: String,
        /// Output file path
        #[arg(long, default_value = "src/migrations/mod.rs")]
        output: String,
    },
}

/// Connection and migration settings a service provides to the CLI.
pub trait ServiceConfig {
    fn mongodb_uri(&self) -> &str;

    fn database_name(&self) -> &str;

    fn migrator_config(&self) -> MigratorConfig;
}

/// Drives migration commands for a service.
pub struct MigrationCliRunner<C: ServiceConfig> {
    config: C,
}

impl<C: ServiceConfig> MigrationCliRunner<C> {
    pub fn new(config: C) -> Self {
        Self { config }
    }

    /// Parse command line arguments and execute the selected command.
    pub async fn run_from_args(&self) -> Result<()> {
        let cli = MigrationCli::parse();

        match cli.command {
            Some(command) => self.execute_command(command).await,
            None => self.execute_command(MigrationCommand::Status { json: false }).await,
        }
    }

    /// Execute a specific migration command.
    pub async fn execute_command(&self, command: MigrationCommand) -> Result<()> {
        match command {
            MigrationCommand::Discover { path } => {
                let loader = MigrationLoader::new(path, None)?;
                loader.print_discovered_migrations()?;
                Ok(())
            }

            MigrationCommand::Generate { path, output } => {
                let loader = MigrationLoader::new(path, None)?;
                let code = loader.generate_registry_code()?;
                std::fs::write(&output, code)?;
                println!("✅ Generated migration module declarations at {}", output);
                Ok(())
            }

            command => {
                let client = Client::with_uri_str(self.config.mongodb_uri()).await?;
                let database = client.database(self.config.database_name());
                self.execute_database_command(command, database).await
            }
        }
    }

    async fn execute_database_command(
        &self,
        command: MigrationCommand,
        database: Database,
    ) -> Result<()> {
        let registry = collect_registry()?;
        let runner = MigrationRunner::with_config(database, registry, self.config.migrator_config());
        runner.initialize().await?;

        match command {
            MigrationCommand::Up { dry_run, force } => {
                let options = RunOptions {
                    dry_run,
                    force,
                    ..Default::default()
                };

                if dry_run {
                    println!("DRY RUN: showing what would be executed");
                }

                let outcomes = runner.migrate_up(options).await?;
                print_outcomes(&outcomes, "Applied");
            }

            MigrationCommand::Down { dry_run, force } => {
                let options = RunOptions {
                    dry_run,
                    force,
                    ..Default::default()
                };

                if dry_run {
                    println!("DRY RUN: showing what would be executed");
                }

                let outcomes = runner.rollback_one(options).await?;
                print_outcomes(&outcomes, "Rolled back");
            }

            MigrationCommand::To {
                version,
                dry_run,
                force,
            } => {
                let options = RunOptions {
                    dry_run,
                    force,
                    ..Default::default()
                };

                let current = runner.status().await?.current_version;
                let outcomes = if version < current {
                    runner.rollback_to(version, options).await?
                } else {
                    runner.migrate_to(version, options).await?
                };

                if outcomes.is_empty() {
                    println!("✅ Already at target version {}", version);
                } else {
                    print_outcomes(&outcomes, "Executed");
                }
            }

            MigrationCommand::Status { json } => {
                let status = runner.status().await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&status)?);
                    return Ok(());
                }

                println!("Migration status for '{}'", status.service_name);
                println!("  Current version:   {}", status.current_version);
                println!("  Latest available:  {}", status.latest_available_version);
                println!("  Pending:           {}", status.pending_count);
                println!("  Total applied:     {}", status.total_applied);
                println!("  Total rolled back: {}", status.total_rolled_back);
                if status.total_applied > 0 {
                    println!("  Average duration:  {:.1}ms", status.avg_duration_ms);
                }
                println!();
                if status.is_up_to_date() {
                    println!("✅ {}", status.summary());
                } else {
                    println!("⚠️  {}", status.summary());
                }
            }

            MigrationCommand::Plan { version, json } => {
                let plan = runner.plan(version).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&plan)?);
                    return Ok(());
                }

                println!("Migration plan for '{}'", runner.config().service_name);
                println!("{}", plan.summary());
                if plan.has_work() {
                    println!();
                    for step in &plan.steps {
                        println!("  {:>3} - {}", step.version, step.description);
                    }
                }
            }

            MigrationCommand::Discover { .. } | MigrationCommand::Generate { .. } => {
                unreachable!("handled before connecting")
            }
        }

        Ok(())
    }
}

fn print_outcomes(outcomes: &[crate::MigrationOutcome], verb: &str) {
    if outcomes.is_empty() {
        println!("✅ Nothing to do");
        return;
    }

    println!("✅ {} {} migration(s):", verb, outcomes.len());
    for outcome in outcomes {
        println!(
            "  ✓ {} {}: {} ({}ms)",
            outcome.direction, outcome.version, outcome.description, outcome.duration_ms
        );
    }
}

/// Simple argument parsing for services that don't want to use clap
pub fn parse_simple_migration_command() -> Option<SimpleMigrationCommand> {
    let args: Vec<String> = env::args().collect();
    parse_simple_args(&args)
}

fn parse_simple_args(args: &[String]) -> Option<SimpleMigrationCommand> {
    if args.len() < 2 || args[1] != "migrate" {
        return None;
    }

    if args.len() < 3 {
        return Some(SimpleMigrationCommand::Status);
    }

    match args[2].as_str() {
        "up" => Some(SimpleMigrationCommand::Up),
        "down" => Some(SimpleMigrationCommand::Down),
        "status" => Some(SimpleMigrationCommand::Status),
        "discover" => Some(SimpleMigrationCommand::Discover),
        "plan" => {
            let target = args.get(3).and_then(|v| v.parse().ok());
            Some(SimpleMigrationCommand::Plan(target))
        }
        "to" => args
            .get(3)
            .and_then(|v| v.parse().ok())
            .map(SimpleMigrationCommand::To),
        _ => None,
    }
}

/// Simple migration commands for services that don't use clap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleMigrationCommand {
    Up,
    Down,
    To(u32),
    Status,
    Plan(Option<u32>),
    Discover,
}

/// Print CLI usage help
pub fn print_usage(service_name: &str) {
    println!("{} - Migration Commands", service_name);
    println!("{}", "=".repeat(service_name.len() + 21));
    println!();
    println!("Usage:");
    println!("  cargo run                      - Apply pending migrations (default action)");
    println!("  cargo run migrate              - Show migration status");
    println!("  cargo run migrate up           - Run all pending migrations");
    println!("  cargo run migrate down         - Rollback last migration");
    println!("  cargo run migrate to <ver>     - Migrate to specific version");
    println!("  cargo run migrate status       - Show detailed migration status");
    println!("  cargo run migrate plan [ver]   - Show migration plan");
    println!("  cargo run migrate discover     - Discover migration files");
    println!();
    println!("Migration File Naming Convention:");
    println!("  m001_seed_users.rs             -> SeedUsers struct");
    println!("  m002_seed_orders.rs            -> SeedOrders struct");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestConfig;

    impl ServiceConfig for TestConfig {
        fn mongodb_uri(&self) -> &str {
            "mongodb://localhost:27017"
        }

        fn database_name(&self) -> &str {
            "test_db"
        }

        fn migrator_config(&self) -> MigratorConfig {
            MigratorConfig {
                service_name: "test-service".to_string(),
                version_collection: "test_migrations".to_string(),
                ..Default::default()
            }
        }
    }

    #[test]
    fn test_service_config() {
        let config = TestConfig;
        assert_eq!(config.mongodb_uri(), "mongodb://localhost:27017");
        assert_eq!(config.database_name(), "test_db");
        assert_eq!(config.migrator_config().service_name, "test-service");
    }

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_simple_args() {
        assert_eq!(
            parse_simple_args(&args(&["bin", "migrate", "up"])),
            Some(SimpleMigrationCommand::Up)
        );
        assert_eq!(
            parse_simple_args(&args(&["bin", "migrate"])),
            Some(SimpleMigrationCommand::Status)
        );
        assert_eq!(
            parse_simple_args(&args(&["bin", "migrate", "to", "2"])),
            Some(SimpleMigrationCommand::To(2))
        );
        assert_eq!(
            parse_simple_args(&args(&["bin", "migrate", "plan"])),
            Some(SimpleMigrationCommand::Plan(None))
        );
        assert_eq!(
            parse_simple_args(&args(&["bin", "migrate", "plan", "1"])),
            Some(SimpleMigrationCommand::Plan(Some(1)))
        );
        assert_eq!(parse_simple_args(&args(&["bin", "serve"])), None);
        assert_eq!(parse_simple_args(&args(&["bin", "migrate", "bogus"])), None);
        assert_eq!(parse_simple_args(&args(&["bin", "migrate", "to"])), None);
    }
}
