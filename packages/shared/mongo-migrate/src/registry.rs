use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::{Migration, MigrationError, Result, VersionTracker};

/// Registry that holds all available migrations, ordered by version.
#[derive(Default)]
pub struct MigrationRegistry {
    migrations: BTreeMap<u32, Box<dyn Migration>>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self {
            migrations: BTreeMap::new(),
        }
    }

    /// Register a migration. Duplicate versions are a configuration error.
    pub fn register<M: Migration + 'static>(self, migration: M) -> Result<Self> {
        self.register_boxed(Box::new(migration))
    }

    /// Register a boxed migration (used by inventory discovery)
    pub fn register_boxed(mut self, migration: Box<dyn Migration>) -> Result<Self> {
        let version = migration.version();
        if self.migrations.contains_key(&version) {
            return Err(MigrationError::Config(format!(
                "migration version {} is already registered",
                version
            )));
        }
        self.migrations.insert(version, migration);
        Ok(self)
    }

    /// All registered migrations in ascending version order
    pub fn all(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.values().map(|m| m.as_ref())
    }

    /// Look up a specific migration by version
    pub fn get(&self, version: u32) -> Option<&dyn Migration> {
        self.migrations.get(&version).map(|m| m.as_ref())
    }

    /// All registered versions in ascending order
    pub fn versions(&self) -> Vec<u32> {
        self.migrations.keys().copied().collect()
    }

    /// Highest registered version, if any
    pub fn latest_version(&self) -> Option<u32> {
        self.migrations.keys().next_back().copied()
    }

    pub fn count(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn contains(&self, version: u32) -> bool {
        self.migrations.contains_key(&version)
    }

    /// Check the registered versions form a dense sequence starting at 1.
    pub fn validate_sequence(&self) -> Result<()> {
        let versions = self.versions();

        if versions.is_empty() {
            return Ok(());
        }

        if versions[0] == 0 {
            return Err(MigrationError::Sequence(
                "migration versions start from 1, not 0".to_string(),
            ));
        }

        for pair in versions.windows(2) {
            if pair[1] != pair[0] + 1 {
                return Err(MigrationError::Sequence(format!(
                    "gap in migration sequence: version {} is followed by version {}",
                    pair[0], pair[1]
                )));
            }
        }

        tracing::debug!("migration sequence validation passed for {} migrations", versions.len());
        Ok(())
    }

    /// Compute the plan that would bring the tracked state to `target`
    /// (or to the latest registered version when `target` is `None`).
    pub async fn plan(
        &self,
        tracker: &VersionTracker,
        target: Option<u32>,
    ) -> Result<MigrationPlan> {
        let current_version = tracker.latest_version().await?.unwrap_or(0);
        let applied: HashSet<u32> = tracker
            .applied()
            .await?
            .into_iter()
            .map(|record| record.version)
            .collect();

        match target {
            Some(target) if target < current_version => {
                self.rollback_plan(current_version, target, &applied)
            }
            Some(target) if target == current_version => Ok(MigrationPlan {
                plan_type: PlanType::NoOp,
                current_version,
                target_version: Some(target),
                steps: Vec::new(),
            }),
            target => {
                // Forward plan, optionally capped at the target version
                let steps: Vec<PlanStep> = self
                    .all()
                    .filter(|m| !applied.contains(&m.version()))
                    .filter(|m| target.map_or(true, |t| m.version() <= t))
                    .map(PlanStep::from_migration)
                    .collect();

                let target_version = target.or_else(|| steps.last().map(|s| s.version));
                Ok(MigrationPlan {
                    plan_type: PlanType::Forward,
                    current_version,
                    target_version,
                    steps,
                })
            }
        }
    }

    fn rollback_plan(
        &self,
        current_version: u32,
        target: u32,
        applied: &HashSet<u32>,
    ) -> Result<MigrationPlan> {
        let mut steps = Vec::new();

        // Applied versions newer than the target, newest first
        let mut to_revert: Vec<u32> = applied.iter().copied().filter(|&v| v > target).collect();
        to_revert.sort_by(|a, b| b.cmp(a));

        for version in to_revert {
            let migration = self
                .get(version)
                .ok_or(MigrationError::NotFound { version })?;
            steps.push(PlanStep::from_migration(migration));
        }

        Ok(MigrationPlan {
            plan_type: PlanType::Rollback,
            current_version,
            target_version: Some(target),
            steps,
        })
    }
}

/// Type of migration plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Forward,
    Rollback,
    NoOp,
}

/// One step of a migration plan
#[derive(Debug, Clone, Serialize)]
pub struct PlanStep {
    pub version: u32,
    pub description: String,
}

impl PlanStep {
    fn from_migration(migration: &dyn Migration) -> Self {
        Self {
            version: migration.version(),
            description: migration.description().to_string(),
        }
    }
}

/// Migration execution plan
#[derive(Debug, Clone, Serialize)]
pub struct MigrationPlan {
    pub plan_type: PlanType,
    pub current_version: u32,
    pub target_version: Option<u32>,
    pub steps: Vec<PlanStep>,
}

impl MigrationPlan {
    pub fn has_work(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn summary(&self) -> String {
        match self.plan_type {
            PlanType::Forward => {
                if self.steps.is_empty() {
                    "No pending migrations".to_string()
                } else {
                    format!(
                        "Apply {} migration(s) from version {} to {}",
                        self.steps.len(),
                        self.current_version,
                        self.target_version.unwrap_or(0)
                    )
                }
            }
            PlanType::Rollback => format!(
                "Rollback {} migration(s) from version {} to {}",
                self.steps.len(),
                self.current_version,
                self.target_version.unwrap_or(0)
            ),
            PlanType::NoOp => "No migrations needed".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mongodb::Database;

    struct TestMigration {
        version: u32,
        description: String,
    }

    impl TestMigration {
        fn new(version: u32, description: &str) -> Self {
            Self {
                version,
                description: description.to_string(),
            }
        }
    }

    #[async_trait]
    impl Migration for TestMigration {
        fn version(&self) -> u32 {
            self.version
        }

        fn description(&self) -> &str {
            &self.description
        }

        async fn up(&self, _db: &Database) -> anyhow::Result<()> {
            Ok(())
        }

        async fn down(&self, _db: &Database) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_registry_creation() {
        let registry = MigrationRegistry::new();
        assert_eq!(registry.count(), 0);
        assert!(registry.is_empty());
        assert!(registry.versions().is_empty());
        assert_eq!(registry.latest_version(), None);
    }

    #[test]
    fn test_migration_registration() {
        let registry = MigrationRegistry::new()
            .register(TestMigration::new(1, "First migration"))
            .unwrap()
            .register(TestMigration::new(2, "Second migration"))
            .unwrap();

        assert_eq!(registry.count(), 2);
        assert_eq!(registry.versions(), vec![1, 2]);
        assert!(registry.contains(1));
        assert!(registry.contains(2));
        assert!(!registry.contains(3));
        assert_eq!(registry.latest_version(), Some(2));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let result = MigrationRegistry::new()
            .register(TestMigration::new(1, "First"))
            .unwrap()
            .register(TestMigration::new(1, "Duplicate"));

        assert!(matches!(result, Err(MigrationError::Config(_))));
    }

    #[test]
    fn test_migration_ordering() {
        let registry = MigrationRegistry::new()
            .register(TestMigration::new(3, "Third"))
            .unwrap()
            .register(TestMigration::new(1, "First"))
            .unwrap()
            .register(TestMigration::new(2, "Second"))
            .unwrap();

        let versions: Vec<u32> = registry.all().map(|m| m.version()).collect();
        assert_eq!(versions, vec![1, 2, 3]);
    }

    #[test]
    fn test_sequence_validation() {
        // Valid sequence
        let registry = MigrationRegistry::new()
            .register(TestMigration::new(1, "First"))
            .unwrap()
            .register(TestMigration::new(2, "Second"))
            .unwrap();
        assert!(registry.validate_sequence().is_ok());

        // Gap in sequence
        let registry = MigrationRegistry::new()
            .register(TestMigration::new(1, "First"))
            .unwrap()
            .register(TestMigration::new(3, "Third"))
            .unwrap();
        assert!(matches!(
            registry.validate_sequence(),
            Err(MigrationError::Sequence(_))
        ));

        // Starting from 0
        let registry = MigrationRegistry::new()
            .register(TestMigration::new(0, "Zero"))
            .unwrap();
        assert!(registry.validate_sequence().is_err());
    }

    #[test]
    fn test_plan_summary() {
        let plan = MigrationPlan {
            plan_type: PlanType::Forward,
            current_version: 0,
            target_version: Some(2),
            steps: vec![
                PlanStep {
                    version: 1,
                    description: "Seed users".to_string(),
                },
                PlanStep {
                    version: 2,
                    description: "Seed orders".to_string(),
                },
            ],
        };
        assert!(plan.has_work());
        assert_eq!(plan.summary(), "Apply 2 migration(s) from version 0 to 2");

        let noop = MigrationPlan {
            plan_type: PlanType::NoOp,
            current_version: 2,
            target_version: Some(2),
            steps: Vec::new(),
        };
        assert!(!noop.has_work());
        assert_eq!(noop.summary(), "No migrations needed");
    }
}
