use bson::doc;
use futures::stream::TryStreamExt;
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

use crate::{MigrationError, MigrationOutcome, MigrationRegistry, MigratorConfig, Result};

/// One applied-version record, stored in the version collection.
///
/// Timestamps are stored as native BSON dates so they sort and filter
/// correctly on the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedMigration {
    pub version: u32,
    pub description: String,
    pub applied_at: bson::DateTime,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolled_back_at: Option<bson::DateTime>,
    pub service_name: String,
}

impl AppliedMigration {
    pub fn is_active(&self) -> bool {
        self.rolled_back_at.is_none()
    }
}

/// Tracks applied migration versions in the database, scoped per service.
pub struct VersionTracker {
    collection: Collection<AppliedMigration>,
    service_name: String,
}

impl VersionTracker {
    pub fn new(database: &Database, config: &MigratorConfig) -> Self {
        let collection = database.collection::<AppliedMigration>(&config.version_collection);
        Self {
            collection,
            service_name: config.service_name.clone(),
        }
    }

    /// Create the indexes the version collection relies on.
    pub async fn initialize(&self) -> Result<()> {
        // One record per (service, version)
        self.collection
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "service_name": 1, "version": 1 })
                    .options(
                        mongodb::options::IndexOptions::builder()
                            .unique(true)
                            .build(),
                    )
                    .build(),
                None,
            )
            .await?;

        self.collection
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "applied_at": -1 })
                    .build(),
                None,
            )
            .await?;

        tracing::debug!(service = %self.service_name, "version tracking initialized");
        Ok(())
    }

    /// Record a successfully applied migration.
    pub async fn record_applied(
        &self,
        outcome: &MigrationOutcome,
        fingerprint: Option<&str>,
    ) -> Result<()> {
        let record = AppliedMigration {
            version: outcome.version,
            description: outcome.description.clone(),
            applied_at: bson::DateTime::from_chrono(outcome.executed_at),
            duration_ms: outcome.duration_ms,
            fingerprint: fingerprint.map(str::to_string),
            rolled_back_at: None,
            service_name: self.service_name.clone(),
        };

        // Upsert so a forced re-apply refreshes the existing record
        self.collection
            .replace_one(
                doc! {
                    "service_name": &self.service_name,
                    "version": outcome.version,
                },
                &record,
                mongodb::options::ReplaceOptions::builder()
                    .upsert(true)
                    .build(),
            )
            .await?;

        tracing::info!(
            service = %self.service_name,
            version = outcome.version,
            "recorded applied migration"
        );
        Ok(())
    }

    /// Mark an applied migration as rolled back.
    pub async fn record_rollback(&self, version: u32) -> Result<()> {
        self.collection
            .update_one(
                doc! {
                    "service_name": &self.service_name,
                    "version": version,
                },
                doc! { "$set": { "rolled_back_at": bson::DateTime::now() } },
                None,
            )
            .await?;

        tracing::info!(
            service = %self.service_name,
            version = version,
            "recorded rollback"
        );
        Ok(())
    }

    /// All active (not rolled back) records for this service, by version.
    pub async fn applied(&self) -> Result<Vec<AppliedMigration>> {
        let cursor = self
            .collection
            .find(
                doc! {
                    "service_name": &self.service_name,
                    "rolled_back_at": null,
                },
                mongodb::options::FindOptions::builder()
                    .sort(doc! { "version": 1 })
                    .build(),
            )
            .await?;

        Ok(cursor.try_collect().await?)
    }

    /// Latest active version for this service, if any.
    pub async fn latest_version(&self) -> Result<Option<u32>> {
        let record = self
            .collection
            .find_one(
                doc! {
                    "service_name": &self.service_name,
                    "rolled_back_at": null,
                },
                mongodb::options::FindOneOptions::builder()
                    .sort(doc! { "version": -1 })
                    .build(),
            )
            .await?;

        Ok(record.map(|r| r.version))
    }

    /// Whether a version is currently applied for this service.
    pub async fn is_applied(&self, version: u32) -> Result<bool> {
        let count = self
            .collection
            .count_documents(
                doc! {
                    "service_name": &self.service_name,
                    "version": version,
                    "rolled_back_at": null,
                },
                None,
            )
            .await?;

        Ok(count > 0)
    }

    /// Full history (including rollbacks), newest first, with pagination.
    pub async fn history(
        &self,
        limit: Option<i64>,
        skip: Option<u64>,
    ) -> Result<Vec<AppliedMigration>> {
        let options = mongodb::options::FindOptions::builder()
            .sort(doc! { "applied_at": -1 })
            .limit(limit)
            .skip(skip)
            .build();

        let cursor = self
            .collection
            .find(doc! { "service_name": &self.service_name }, options)
            .await?;

        Ok(cursor.try_collect().await?)
    }

    /// Compare recorded fingerprints against the registered migrations.
    ///
    /// Records without a fingerprint are skipped; a registered migration
    /// missing from the registry only warns, since rollback-only binaries
    /// legitimately carry a subset.
    pub async fn verify_fingerprints(&self, registry: &MigrationRegistry) -> Result<()> {
        for record in self.applied().await? {
            let Some(migration) = registry.get(record.version) else {
                tracing::warn!(
                    version = record.version,
                    "applied migration is not present in the registry"
                );
                continue;
            };

            if record.fingerprint.is_some()
                && record.fingerprint.as_deref() != migration.fingerprint()
            {
                return Err(MigrationError::FingerprintDrift {
                    version: record.version,
                    recorded: record.fingerprint,
                    registered: migration.fingerprint().map(str::to_string),
                });
            }
        }

        Ok(())
    }

    /// Aggregate statistics for this service's migration history.
    pub async fn stats(&self) -> Result<TrackerStats> {
        let total_applied = self
            .collection
            .count_documents(
                doc! {
                    "service_name": &self.service_name,
                    "rolled_back_at": null,
                },
                None,
            )
            .await?;

        let total_rolled_back = self
            .collection
            .count_documents(
                doc! {
                    "service_name": &self.service_name,
                    "rolled_back_at": { "$ne": null },
                },
                None,
            )
            .await?;

        let latest_version = self.latest_version().await?;

        let pipeline = vec![
            doc! {
                "$match": {
                    "service_name": &self.service_name,
                    "rolled_back_at": null,
                }
            },
            doc! {
                "$group": {
                    "_id": null,
                    "avg_duration": { "$avg": "$duration_ms" },
                    "total_duration": { "$sum": "$duration_ms" },
                }
            },
        ];

        let mut cursor = self.collection.aggregate(pipeline, None).await?;
        let mut avg_duration_ms = 0.0;
        let mut total_duration_ms = 0;

        if let Some(group) = cursor.try_next().await? {
            avg_duration_ms = group.get_f64("avg_duration").unwrap_or(0.0);
            total_duration_ms = group.get_i64("total_duration").unwrap_or(0);
        }

        Ok(TrackerStats {
            total_applied: total_applied as u32,
            total_rolled_back: total_rolled_back as u32,
            latest_version,
            avg_duration_ms,
            total_duration_ms,
            service_name: self.service_name.clone(),
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

/// Migration statistics for one service
#[derive(Debug, Clone, Serialize)]
pub struct TrackerStats {
    pub total_applied: u32,
    pub total_rolled_back: u32,
    pub latest_version: Option<u32>,
    pub avg_duration_ms: f64,
    pub total_duration_ms: i64,
    pub service_name: String,
}

impl TrackerStats {
    pub fn has_migrations(&self) -> bool {
        self.total_applied > 0
    }

    pub fn summary(&self) -> String {
        match self.latest_version {
            Some(version) => format!(
                "Service '{}' at version {}, {} applied, {} rolled back",
                self.service_name, version, self.total_applied, self.total_rolled_back
            ),
            None => format!("Service '{}' has no applied migrations", self.service_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(version: u32, fingerprint: Option<&str>) -> AppliedMigration {
        AppliedMigration {
            version,
            description: "test".to_string(),
            applied_at: bson::DateTime::now(),
            duration_ms: 5,
            fingerprint: fingerprint.map(str::to_string),
            rolled_back_at: None,
            service_name: "test".to_string(),
        }
    }

    #[test]
    fn test_record_serialization() {
        let doc = bson::to_document(&record(1, Some("users-v1"))).unwrap();

        // Timestamps are stored as real BSON dates
        assert!(doc.get_datetime("applied_at").is_ok());
        assert_eq!(doc.get_str("fingerprint").unwrap(), "users-v1");
        // Absent options are omitted, not stored as null
        assert!(!doc.contains_key("rolled_back_at"));
    }

    #[test]
    fn test_record_without_fingerprint() {
        let doc = bson::to_document(&record(1, None)).unwrap();
        assert!(!doc.contains_key("fingerprint"));
    }

    #[test]
    fn test_is_active() {
        let mut r = record(1, None);
        assert!(r.is_active());
        r.rolled_back_at = Some(bson::DateTime::now());
        assert!(!r.is_active());
    }

    #[test]
    fn test_stats_summary() {
        let stats = TrackerStats {
            total_applied: 5,
            total_rolled_back: 1,
            latest_version: Some(5),
            avg_duration_ms: 150.0,
            total_duration_ms: 750,
            service_name: "seed".to_string(),
        };

        assert!(stats.has_migrations());
        assert!(stats.summary().contains("seed"));
        assert!(stats.summary().contains("version 5"));
    }

    #[test]
    fn test_stats_summary_empty() {
        let stats = TrackerStats {
            total_applied: 0,
            total_rolled_back: 0,
            latest_version: None,
            avg_duration_ms: 0.0,
            total_duration_ms: 0,
            service_name: "seed".to_string(),
        };

        assert!(!stats.has_migrations());
        assert!(stats.summary().contains("no applied migrations"));
    }
}
