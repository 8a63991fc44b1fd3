use std::time::Instant;

use chrono::Utc;
use mongodb::Database;
use serde::Serialize;

use crate::{
    Direction, Migration, MigrationError, MigrationOutcome, MigrationPlan, MigrationRegistry,
    MigratorConfig, PlanType, Result, RunOptions, VersionTracker,
};

/// Executes migration plans against the database.
pub struct MigrationRunner {
    database: Database,
    registry: MigrationRegistry,
    tracker: VersionTracker,
    config: MigratorConfig,
}

impl MigrationRunner {
    pub fn new(database: Database, registry: MigrationRegistry) -> Self {
        Self::with_config(database, registry, MigratorConfig::default())
    }

    pub fn with_config(
        database: Database,
        registry: MigrationRegistry,
        config: MigratorConfig,
    ) -> Self {
        let tracker = VersionTracker::new(&database, &config);
        Self {
            database,
            registry,
            tracker,
            config,
        }
    }

    pub fn builder() -> MigrationRunnerBuilder {
        MigrationRunnerBuilder::new()
    }

    /// Prepare the migration system: tracker indexes, sequence validation,
    /// fingerprint drift check.
    pub async fn initialize(&self) -> Result<()> {
        self.tracker.initialize().await?;
        self.registry.validate_sequence()?;
        self.tracker.verify_fingerprints(&self.registry).await?;
        tracing::info!(
            service = %self.config.service_name,
            migrations = self.registry.count(),
            "migration system initialized"
        );
        Ok(())
    }

    /// Apply all pending migrations.
    pub async fn migrate_up(&self, options: RunOptions) -> Result<Vec<MigrationOutcome>> {
        let plan = self.registry.plan(&self.tracker, None).await?;
        self.execute_plan(plan, options).await
    }

    /// Apply pending migrations up to (and including) `target`.
    pub async fn migrate_to(
        &self,
        target: u32,
        options: RunOptions,
    ) -> Result<Vec<MigrationOutcome>> {
        let plan = self.registry.plan(&self.tracker, Some(target)).await?;
        self.execute_plan(plan, options).await
    }

    /// Roll back the most recently applied migration.
    pub async fn rollback_one(&self, options: RunOptions) -> Result<Vec<MigrationOutcome>> {
        let current = self.tracker.latest_version().await?.unwrap_or(0);
        if current == 0 {
            tracing::info!(service = %self.config.service_name, "no migrations to roll back");
            return Ok(Vec::new());
        }
        self.rollback_to(current - 1, options).await
    }

    /// Roll back until `target` is the newest applied version.
    pub async fn rollback_to(
        &self,
        target: u32,
        options: RunOptions,
    ) -> Result<Vec<MigrationOutcome>> {
        let plan = self.registry.plan(&self.tracker, Some(target)).await?;

        if plan.has_work() && plan.plan_type != PlanType::Rollback {
            return Err(MigrationError::Config(format!(
                "target version {} is not below the current version {}",
                target, plan.current_version
            )));
        }

        self.execute_plan(plan, options).await
    }

    /// Current tracked state versus the registry.
    pub async fn status(&self) -> Result<RunnerStatus> {
        let latest_available = self.registry.latest_version().unwrap_or(0);
        let current_version = self.tracker.latest_version().await?.unwrap_or(0);
        let stats = self.tracker.stats().await?;

        Ok(RunnerStatus {
            service_name: self.config.service_name.clone(),
            current_version,
            latest_available_version: latest_available,
            pending_count: self
                .registry
                .versions()
                .iter()
                .filter(|&&v| v > current_version)
                .count(),
            total_applied: stats.total_applied,
            total_rolled_back: stats.total_rolled_back,
            avg_duration_ms: stats.avg_duration_ms,
        })
    }

    /// Compute a plan without executing it.
    pub async fn plan(&self, target: Option<u32>) -> Result<MigrationPlan> {
        self.registry.plan(&self.tracker, target).await
    }

    async fn execute_plan(
        &self,
        plan: MigrationPlan,
        options: RunOptions,
    ) -> Result<Vec<MigrationOutcome>> {
        if !plan.has_work() {
            tracing::info!(service = %self.config.service_name, "{}", plan.summary());
            return Ok(Vec::new());
        }

        tracing::info!(service = %self.config.service_name, "executing plan: {}", plan.summary());

        if options.dry_run {
            for step in &plan.steps {
                tracing::info!(
                    "DRY RUN: would execute migration {} ({})",
                    step.version,
                    step.description
                );
            }
            return Ok(Vec::new());
        }

        let mut outcomes = Vec::new();
        for step in &plan.steps {
            let migration = self
                .registry
                .get(step.version)
                .ok_or(MigrationError::NotFound {
                    version: step.version,
                })?;

            let outcome = match plan.plan_type {
                PlanType::Forward => self.apply_one(migration, &options).await?,
                PlanType::Rollback => self.revert_one(migration, &options).await?,
                PlanType::NoOp => unreachable!("no-op plans have no steps"),
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn apply_one(
        &self,
        migration: &dyn Migration,
        options: &RunOptions,
    ) -> Result<MigrationOutcome> {
        let version = migration.version();

        tracing::info!(
            service = %self.config.service_name,
            version,
            "applying migration: {}",
            migration.description()
        );

        if self.tracker.is_applied(version).await? && !options.force {
            return Err(MigrationError::AlreadyApplied { version });
        }

        migration
            .validate(&self.database)
            .await
            .map_err(|source| MigrationError::ValidationFailed { version, source })?;

        let timeout = options.timeout.unwrap_or(self.config.default_timeout);
        let executed_at = Utc::now();
        let start = Instant::now();

        let result = tokio::time::timeout(timeout, migration.up(&self.database)).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(())) => {
                let outcome = MigrationOutcome::new(
                    version,
                    migration.description(),
                    Direction::Up,
                    executed_at,
                    duration_ms,
                );
                self.tracker
                    .record_applied(&outcome, migration.fingerprint())
                    .await?;
                tracing::info!(version, duration_ms, "migration applied");
                Ok(outcome)
            }
            Ok(Err(source)) => Err(MigrationError::Failed { version, source }),
            Err(_) => Err(MigrationError::Timeout { version, timeout }),
        }
    }

    async fn revert_one(
        &self,
        migration: &dyn Migration,
        options: &RunOptions,
    ) -> Result<MigrationOutcome> {
        let version = migration.version();

        tracing::info!(
            service = %self.config.service_name,
            version,
            "rolling back migration: {}",
            migration.description()
        );

        if !self.tracker.is_applied(version).await? && !options.force {
            return Err(MigrationError::NotApplied { version });
        }

        let timeout = options.timeout.unwrap_or(self.config.default_timeout);
        let executed_at = Utc::now();
        let start = Instant::now();

        let result = tokio::time::timeout(timeout, migration.down(&self.database)).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(())) => {
                self.tracker.record_rollback(version).await?;
                tracing::info!(version, duration_ms, "migration rolled back");
                Ok(MigrationOutcome::new(
                    version,
                    migration.description(),
                    Direction::Down,
                    executed_at,
                    duration_ms,
                ))
            }
            Ok(Err(source)) => Err(MigrationError::Failed { version, source }),
            Err(_) => Err(MigrationError::Timeout { version, timeout }),
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn tracker(&self) -> &VersionTracker {
        &self.tracker
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }
}

/// Builder for a [`MigrationRunner`] with custom configuration
pub struct MigrationRunnerBuilder {
    database: Option<Database>,
    registry: Option<MigrationRegistry>,
    config: MigratorConfig,
}

impl MigrationRunnerBuilder {
    pub fn new() -> Self {
        Self {
            database: None,
            registry: None,
            config: MigratorConfig::default(),
        }
    }

    pub fn database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    pub fn registry(mut self, registry: MigrationRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(mut self, config: MigratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn service_name(mut self, service_name: impl Into<String>) -> Self {
        self.config.service_name = service_name.into();
        self
    }

    pub fn version_collection(mut self, collection_name: impl Into<String>) -> Self {
        self.config.version_collection = collection_name.into();
        self
    }

    pub fn default_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.default_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<MigrationRunner> {
        let database = self
            .database
            .ok_or_else(|| MigrationError::Config("database is required".to_string()))?;
        let registry = self
            .registry
            .ok_or_else(|| MigrationError::Config("registry is required".to_string()))?;

        Ok(MigrationRunner::with_config(database, registry, self.config))
    }
}

impl Default for MigrationRunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of tracked state versus available migrations
#[derive(Debug, Clone, Serialize)]
pub struct RunnerStatus {
    pub service_name: String,
    pub current_version: u32,
    pub latest_available_version: u32,
    pub pending_count: usize,
    pub total_applied: u32,
    pub total_rolled_back: u32,
    pub avg_duration_ms: f64,
}

impl RunnerStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.current_version == self.latest_available_version
    }

    pub fn summary(&self) -> String {
        if self.is_up_to_date() {
            format!(
                "Service '{}' is up to date at version {}",
                self.service_name, self.current_version
            )
        } else {
            format!(
                "Service '{}' at version {}, {} migration(s) pending (latest: {})",
                self.service_name,
                self.current_version,
                self.pending_count,
                self.latest_available_version
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_builder_config() {
        let builder = MigrationRunnerBuilder::new()
            .service_name("seed")
            .version_collection("seed_migrations")
            .default_timeout(std::time::Duration::from_secs(60));

        assert_eq!(builder.config.service_name, "seed");
        assert_eq!(builder.config.version_collection, "seed_migrations");
        assert_eq!(
            builder.config.default_timeout,
            std::time::Duration::from_secs(60)
        );
    }

    #[test]
    fn test_runner_builder_missing_database() {
        let result = MigrationRunnerBuilder::new()
            .registry(MigrationRegistry::new())
            .build();
        assert!(matches!(result, Err(MigrationError::Config(_))));
    }

    #[test]
    fn test_status_pending() {
        let status = RunnerStatus {
            service_name: "seed".to_string(),
            current_version: 1,
            latest_available_version: 2,
            pending_count: 1,
            total_applied: 1,
            total_rolled_back: 0,
            avg_duration_ms: 12.0,
        };

        assert!(!status.is_up_to_date());
        assert!(status.summary().contains("1 migration(s) pending"));
    }

    #[test]
    fn test_status_up_to_date() {
        let status = RunnerStatus {
            service_name: "seed".to_string(),
            current_version: 2,
            latest_available_version: 2,
            pending_count: 0,
            total_applied: 2,
            total_rolled_back: 0,
            avg_duration_ms: 12.0,
        };

        assert!(status.is_up_to_date());
        assert!(status.summary().contains("up to date"));
    }
}
