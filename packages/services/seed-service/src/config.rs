use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub mongodb_uri: String,
    pub database_name: String,
    /// Apply pending migrations when the binary runs with no subcommand
    pub auto_migrate: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let mongodb_uri = env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let database_name =
            env::var("DATABASE_NAME").unwrap_or_else(|_| "liquibase_test".to_string());
        let auto_migrate = env::var("AUTO_MIGRATE")
            .map(|value| parse_flag(&value))
            .unwrap_or(true);

        Self {
            mongodb_uri,
            database_name,
            auto_migrate,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.to_lowercase().as_str(), "false" | "0" | "no" | "off")
}
