//! # mongo-migrate
//!
//! An inventory-based MongoDB migration framework for versioned seed and
//! index releases.
//!
//! ## Features
//!
//! - **Inventory-based Auto-discovery**: Migrations self-register using macros
//! - **Idempotent Releases**: Applied versions are tracked in the database and
//!   never re-run unless forced
//! - **Fingerprint Drift Detection**: Editing a shipped migration without
//!   bumping its fingerprint fails fast at initialization
//! - **Rollback Support**: Bidirectional migrations with per-step results
//! - **CLI Support**: Command-line tools for running and inspecting releases
//!
//! ## Quick Start
//!
//! ```rust
//! use mongo_migrate::{register_migration, Migration};
//! use async_trait::async_trait;
//! use mongodb::Database;
//! use anyhow::Result;
//!
//! #[derive(Default)]
//! pub struct CreateUserIndexes;
//!
//! register_migration!(CreateUserIndexes);
//!
//! #[async_trait]
//! impl Migration for CreateUserIndexes {
//!     fn version(&self) -> u32 { 1 }
//!     fn description(&self) -> &str { "Create user indexes" }
//!
//!     async fn up(&self, db: &Database) -> Result<()> {
//!         // Migration logic here
//!         Ok(())
//!     }
//!
//!     async fn down(&self, db: &Database) -> Result<()> {
//!         // Rollback logic here
//!         Ok(())
//!     }
//! }
//! ```

pub mod error;
pub mod factory;
pub mod migration;
pub mod registry;
pub mod runner;
pub mod tracker;

#[cfg(feature = "cli")]
pub mod loader;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export main types for easy access
pub use error::{MigrationError, Result};
pub use factory::{collect_registry, registered_migration_names, MigrationRegistration};
pub use migration::{Direction, Migration, MigrationOutcome, RunOptions};
pub use registry::{MigrationPlan, MigrationRegistry, PlanStep, PlanType};
pub use runner::{MigrationRunner, MigrationRunnerBuilder, RunnerStatus};
pub use tracker::{AppliedMigration, TrackerStats, VersionTracker};

#[cfg(feature = "cli")]
pub use loader::{MigrationFileInfo, MigrationLoader};

#[cfg(feature = "cli")]
pub use cli::{
    parse_simple_migration_command, print_usage, MigrationCli, MigrationCliRunner,
    MigrationCommand, ServiceConfig, SimpleMigrationCommand,
};

// Re-export inventory for the macro
pub use inventory;

/// Configuration for the migration system
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    /// Name of the collection that stores applied-version records
    pub version_collection: String,
    /// Service name used for record scoping and logging
    pub service_name: String,
    /// Default timeout applied to each migration step
    pub default_timeout: std::time::Duration,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            version_collection: "_migrations".to_string(),
            service_name: "default".to_string(),
            default_timeout: std::time::Duration::from_secs(300),
        }
    }
}

/// Register a migration with the inventory system.
///
/// Use once per migration file. The migration struct must implement
/// `Default`; the registry is later assembled with [`collect_registry`].
///
/// # Example
///
/// ```rust
/// use mongo_migrate::{register_migration, Migration};
/// # use async_trait::async_trait;
/// # use mongodb::Database;
///
/// #[derive(Default)]
/// pub struct MyMigration;
///
/// register_migration!(MyMigration);
/// # #[async_trait]
/// # impl Migration for MyMigration {
/// #     fn version(&self) -> u32 { 1 }
/// #     fn description(&self) -> &str { "" }
/// #     async fn up(&self, _db: &Database) -> anyhow::Result<()> { Ok(()) }
/// #     async fn down(&self, _db: &Database) -> anyhow::Result<()> { Ok(()) }
/// # }
/// ```
#[macro_export]
macro_rules! register_migration {
    ($migration_type:ty) => {
        $crate::inventory::submit! {
            $crate::MigrationRegistration::new(
                stringify!($migration_type),
                || Box::new(<$migration_type>::default())
            )
        }
    };
}
