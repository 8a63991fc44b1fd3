use anyhow::Result;
use mongo_migrate::{
    parse_simple_migration_command, print_usage, MigrationCliRunner, MigrationCommand,
    MigratorConfig, ServiceConfig, SimpleMigrationCommand,
};

use crate::config::Config;

pub const SERVICE_NAME: &str = "seed";

impl ServiceConfig for Config {
    fn mongodb_uri(&self) -> &str {
        &self.mongodb_uri
    }

    fn database_name(&self) -> &str {
        &self.database_name
    }

    fn migrator_config(&self) -> MigratorConfig {
        MigratorConfig {
            service_name: SERVICE_NAME.to_string(),
            version_collection: "_migrations".to_string(),
            default_timeout: std::time::Duration::from_secs(300),
        }
    }
}

/// Run a `migrate <verb>` command with the given configuration.
pub async fn run_migration_cli(config: Config) -> Result<()> {
    let runner = MigrationCliRunner::new(config);

    let command = match parse_simple_migration_command() {
        Some(SimpleMigrationCommand::Up) => MigrationCommand::Up {
            dry_run: false,
            force: false,
        },
        Some(SimpleMigrationCommand::Down) => MigrationCommand::Down {
            dry_run: false,
            force: false,
        },
        Some(SimpleMigrationCommand::To(version)) => MigrationCommand::To {
            version,
            dry_run: false,
            force: false,
        },
        Some(SimpleMigrationCommand::Plan(version)) => {
            MigrationCommand::Plan { version, json: false }
        }
        Some(SimpleMigrationCommand::Discover) => MigrationCommand::Discover {
            path: "src/migrations".to_string(),
        },
        Some(SimpleMigrationCommand::Status) | None => MigrationCommand::Status { json: false },
    };

    runner.execute_command(command).await
}

pub fn print_seed_usage() {
    print_usage("Seed Service");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_config() {
        let config = Config {
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            database_name: "liquibase_test".to_string(),
            auto_migrate: true,
        };

        assert_eq!(config.mongodb_uri(), "mongodb://localhost:27017");
        assert_eq!(config.database_name(), "liquibase_test");

        let migrator = config.migrator_config();
        assert_eq!(migrator.service_name, "seed");
        assert_eq!(migrator.version_collection, "_migrations");
    }
}
