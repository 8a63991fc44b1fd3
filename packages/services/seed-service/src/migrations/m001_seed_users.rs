use anyhow::Result;
use async_trait::async_trait;
use bson::doc;
use mongodb::options::{IndexOptions, ReplaceOptions};
use mongodb::{Database, IndexModel};

use mongo_migrate::{register_migration, Migration};

use crate::models::{user_fixtures, User, USERS_COLLECTION};

/// Baseline user seed: the unique email index plus the two sample accounts
/// that used to be re-inserted by every weekly release script.
#[derive(Default)]
pub struct SeedUsers;

register_migration!(SeedUsers);

#[async_trait]
impl Migration for SeedUsers {
    fn version(&self) -> u32 {
        1
    }

    fn description(&self) -> &str {
        "Create unique email index and seed baseline users"
    }

    fn fingerprint(&self) -> Option<&str> {
        Some("users-20250918")
    }

    async fn up(&self, db: &Database) -> Result<()> {
        let users = db.collection::<User>(USERS_COLLECTION);

        // Index before data: a re-run can then never leave duplicate emails.
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
                None,
            )
            .await?;

        for user in user_fixtures() {
            users
                .replace_one(
                    doc! { "email": &user.email },
                    &user,
                    ReplaceOptions::builder().upsert(true).build(),
                )
                .await?;
        }

        tracing::info!("seeded baseline users");
        Ok(())
    }

    async fn down(&self, db: &Database) -> Result<()> {
        let users = db.collection::<User>(USERS_COLLECTION);

        let emails: Vec<String> = user_fixtures().into_iter().map(|u| u.email).collect();
        users
            .delete_many(doc! { "email": { "$in": emails } }, None)
            .await?;

        users.drop_index("email_1", None).await?;

        tracing::info!("removed baseline users and email index");
        Ok(())
    }

    async fn validate(&self, db: &Database) -> Result<()> {
        // Collection must be reachable before we touch indexes
        let users = db.collection::<bson::Document>(USERS_COLLECTION);
        let _ = users.estimated_document_count(None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata() {
        let migration = SeedUsers;
        assert_eq!(migration.version(), 1);
        assert_eq!(
            migration.description(),
            "Create unique email index and seed baseline users"
        );
        assert_eq!(migration.fingerprint(), Some("users-20250918"));
    }
}
