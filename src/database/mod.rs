pub mod connection;
pub mod migrations;

pub use connection::{create_pool, health_check};
pub use migrations::DatabaseMigrations;
