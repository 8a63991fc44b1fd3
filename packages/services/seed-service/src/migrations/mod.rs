//! Seed-service migrations
//!
//! One module per versioned release; each migration self-registers through
//! the inventory system from the shared mongo-migrate crate.

pub mod m001_seed_users;
pub mod m002_seed_orders;

// Future releases follow the same pattern:
// pub mod m003_<next_release>;
