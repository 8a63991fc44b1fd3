use anyhow::{bail, Context, Result};
use bson::doc;
use mongodb::{Client, Collection, Database};

use crate::models::{
    order_fixtures, user_fixtures, Order, User, ORDERS_COLLECTION, USERS_COLLECTION,
};

#[derive(Clone)]
pub struct DatabaseManager {
    database: Database,
    pub users: Collection<User>,
    pub orders: Collection<Order>,
}

impl DatabaseManager {
    pub async fn connect(mongodb_uri: &str, database_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri).await?;
        let database = client.database(database_name);

        let users = database.collection::<User>(USERS_COLLECTION);
        let orders = database.collection::<Order>(ORDERS_COLLECTION);

        Ok(Self {
            database,
            users,
            orders,
        })
    }

    /// The underlying database handle, for the migration runner.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Check the seeded state the deploy pipeline expects: every fixture
    /// user present exactly once with its role/status, every fixture order
    /// present with its total and status.
    pub async fn verify_seed(&self) -> Result<()> {
        for expected in user_fixtures() {
            let count = self
                .users
                .count_documents(doc! { "email": &expected.email }, None)
                .await?;
            if count != 1 {
                bail!(
                    "expected exactly one user with email '{}', found {}",
                    expected.email,
                    count
                );
            }

            let user = self
                .users
                .find_one(doc! { "email": &expected.email }, None)
                .await?
                .with_context(|| format!("seed user '{}' is missing", expected.email))?;

            if user.role != expected.role || user.status != expected.status {
                bail!(
                    "user '{}' has role/status {:?}/{:?}, expected {:?}/{:?}",
                    expected.email,
                    user.role,
                    user.status,
                    expected.role,
                    expected.status
                );
            }
        }

        for expected in order_fixtures() {
            let order = self
                .orders
                .find_one(doc! { "userId": &expected.user_id }, None)
                .await?
                .with_context(|| format!("seed order for '{}' is missing", expected.user_id))?;

            if order.total != expected.total || order.status != expected.status {
                bail!(
                    "order for '{}' has total/status {}/{:?}, expected {}/{:?}",
                    expected.user_id,
                    order.total,
                    order.status,
                    expected.total,
                    expected.status
                );
            }
        }

        tracing::info!("seed verification passed");
        Ok(())
    }
}
