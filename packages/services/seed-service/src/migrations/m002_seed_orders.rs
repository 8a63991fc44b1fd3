use anyhow::Result;
use async_trait::async_trait;
use bson::doc;
use mongodb::options::ReplaceOptions;
use mongodb::{Database, IndexModel};

use mongo_migrate::{register_migration, Migration};

use crate::models::{order_fixtures, Order, ORDERS_COLLECTION, USERS_COLLECTION};

/// Baseline order seed. Orders carry the owning user's email in `userId`,
/// so the seed is keyed on that field (the fixture set holds at most one
/// order per user).
#[derive(Default)]
pub struct SeedOrders;

register_migration!(SeedOrders);

#[async_trait]
impl Migration for SeedOrders {
    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &str {
        "Create userId index and seed baseline orders"
    }

    fn fingerprint(&self) -> Option<&str> {
        Some("orders-20250919")
    }

    async fn up(&self, db: &Database) -> Result<()> {
        let orders = db.collection::<Order>(ORDERS_COLLECTION);

        orders
            .create_index(
                IndexModel::builder().keys(doc! { "userId": 1 }).build(),
                None,
            )
            .await?;

        for order in order_fixtures() {
            orders
                .replace_one(
                    doc! { "userId": &order.user_id },
                    &order,
                    ReplaceOptions::builder().upsert(true).build(),
                )
                .await?;
        }

        tracing::info!("seeded baseline orders");
        Ok(())
    }

    async fn down(&self, db: &Database) -> Result<()> {
        let orders = db.collection::<Order>(ORDERS_COLLECTION);

        let user_ids: Vec<String> = order_fixtures().into_iter().map(|o| o.user_id).collect();
        orders
            .delete_many(doc! { "userId": { "$in": user_ids } }, None)
            .await?;

        orders.drop_index("userId_1", None).await?;

        tracing::info!("removed baseline orders and userId index");
        Ok(())
    }

    async fn validate(&self, db: &Database) -> Result<()> {
        // Every seeded order must reference a user that is already present
        let users = db.collection::<bson::Document>(USERS_COLLECTION);

        for order in order_fixtures() {
            let count = users
                .count_documents(doc! { "email": &order.user_id }, None)
                .await?;
            if count == 0 {
                anyhow::bail!(
                    "order seed references unknown user '{}'; run the user seed first",
                    order.user_id
                );
            }
        }

        Ok(())
    }
}
