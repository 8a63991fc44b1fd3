use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const USERS_COLLECTION: &str = "users";
pub const ORDERS_COLLECTION: &str = "orders";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

/// User document. `email` is unique across the collection, enforced by the
/// index created in the seed-users migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
    pub status: UserStatus,
}

/// Order document. `userId` references the owning user's email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub items: Vec<String>,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created: DateTime<Utc>,
}

/// Baseline users seeded by m001. `created` carries the seed-run time.
pub fn user_fixtures() -> Vec<User> {
    vec![
        User {
            id: None,
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            role: UserRole::Admin,
            created: Utc::now(),
            status: UserStatus::Active,
        },
        User {
            id: None,
            name: "Jane Smith".to_string(),
            email: "jane@example.com".to_string(),
            role: UserRole::User,
            created: Utc::now(),
            status: UserStatus::Active,
        },
    ]
}

/// Baseline orders seeded by m002, one per user at most.
pub fn order_fixtures() -> Vec<Order> {
    vec![Order {
        id: None,
        user_id: "john@example.com".to_string(),
        items: vec!["laptop".to_string(), "mouse".to_string()],
        total: 1029.99,
        status: OrderStatus::Pending,
        created: Utc::now(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_fixture_contents() {
        let users = user_fixtures();
        assert_eq!(users.len(), 2);

        let john = users.iter().find(|u| u.email == "john@example.com").unwrap();
        assert_eq!(john.name, "John Doe");
        assert_eq!(john.role, UserRole::Admin);
        assert_eq!(john.status, UserStatus::Active);

        let jane = users.iter().find(|u| u.email == "jane@example.com").unwrap();
        assert_eq!(jane.role, UserRole::User);
        assert_eq!(jane.status, UserStatus::Active);
    }

    #[test]
    fn test_fixture_emails_are_unique() {
        let users = user_fixtures();
        let mut emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
        emails.sort();
        emails.dedup();
        assert_eq!(emails.len(), users.len());
    }

    #[test]
    fn test_order_fixture_contents() {
        let orders = order_fixtures();
        assert_eq!(orders.len(), 1);

        let order = &orders[0];
        assert_eq!(order.user_id, "john@example.com");
        assert_eq!(order.items, vec!["laptop", "mouse"]);
        assert_eq!(order.total, 1029.99);
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_order_references_seeded_user() {
        let emails: Vec<String> = user_fixtures().into_iter().map(|u| u.email).collect();
        for order in order_fixtures() {
            assert!(emails.contains(&order.user_id));
        }
    }

    #[test]
    fn test_user_document_shape() {
        let doc = bson::to_document(&user_fixtures()[0]).unwrap();

        // Unset _id is omitted so the server assigns one
        assert!(!doc.contains_key("_id"));
        assert_eq!(doc.get_str("email").unwrap(), "john@example.com");
        assert_eq!(doc.get_str("role").unwrap(), "admin");
        assert_eq!(doc.get_str("status").unwrap(), "active");
        // `created` is a native BSON date, matching what the mongo shell's
        // `new Date()` would have stored
        assert!(doc.get_datetime("created").is_ok());
    }

    #[test]
    fn test_order_document_shape() {
        let doc = bson::to_document(&order_fixtures()[0]).unwrap();

        assert_eq!(doc.get_str("userId").unwrap(), "john@example.com");
        assert_eq!(doc.get_f64("total").unwrap(), 1029.99);
        assert_eq!(doc.get_str("status").unwrap(), "pending");
        assert!(doc.get_datetime("created").is_ok());

        let items = doc.get_array("items").unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_user_roundtrip() {
        let doc = bson::to_document(&user_fixtures()[0]).unwrap();
        let back: User = bson::from_document(doc).unwrap();
        assert_eq!(back.role, UserRole::Admin);
        assert_eq!(back.email, "john@example.com");
    }
}
