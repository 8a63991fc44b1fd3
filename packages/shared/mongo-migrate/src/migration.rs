use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::Database;
use serde::{Deserialize, Serialize};

/// A single versioned migration that can be applied or rolled back.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Unique version number for this migration, starting at 1
    fn version(&self) -> u32;

    /// Human-readable description of what this migration does
    fn description(&self) -> &str;

    /// Apply the migration (forward)
    async fn up(&self, db: &Database) -> anyhow::Result<()>;

    /// Rollback the migration (backward)
    async fn down(&self, db: &Database) -> anyhow::Result<()>;

    /// Optional: validate that the migration can be safely applied
    async fn validate(&self, _db: &Database) -> anyhow::Result<()> {
        Ok(())
    }

    /// Optional: content tag recorded alongside the applied version.
    ///
    /// Changing a shipped migration without changing its fingerprint is
    /// reported as drift at initialization.
    fn fingerprint(&self) -> Option<&str> {
        None
    }
}

/// Direction a migration step was executed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Outcome of a single executed migration step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationOutcome {
    pub version: u32,
    pub description: String,
    pub direction: Direction,
    pub executed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl MigrationOutcome {
    pub fn new(
        version: u32,
        description: impl Into<String>,
        direction: Direction,
        executed_at: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            direction,
            executed_at,
            duration_ms,
        }
    }
}

/// Execution options for a migration run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Report the plan without executing anything
    pub dry_run: bool,
    /// Apply/rollback even if the tracked state says otherwise
    pub force: bool,
    /// Per-step timeout; falls back to the runner's configured default
    pub timeout: Option<std::time::Duration>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_fields() {
        let now = Utc::now();
        let outcome = MigrationOutcome::new(1, "Seed users", Direction::Up, now, 42);

        assert_eq!(outcome.version, 1);
        assert_eq!(outcome.description, "Seed users");
        assert_eq!(outcome.direction, Direction::Up);
        assert_eq!(outcome.duration_ms, 42);
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Up.to_string(), "up");
        assert_eq!(Direction::Down.to_string(), "down");
    }

    #[test]
    fn test_run_options_default() {
        let options = RunOptions::default();

        assert!(!options.dry_run);
        assert!(!options.force);
        assert!(options.timeout.is_none());
    }
}
