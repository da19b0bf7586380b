//! SQLite adapters for the posterior store.

pub mod connection;
pub mod migrations;
pub mod posterior_repository;

pub use connection::{create_pool, create_test_pool, ConnectionError, PoolConfig};
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use posterior_repository::SqlitePosteriorStore;
