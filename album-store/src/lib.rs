//! album-store: SQLite persistence for the PhotoBook backend.
//!
//! Hosts the tenant resolver (lookup-or-create of the caller's photobook
//! partition) and the row-scoped stores for categories, locations, persons,
//! and photos. Every SQL statement here either filters by `tenant_id` or
//! stamps it; nothing reads or writes across partitions.

pub mod entities;
pub mod import;
pub mod models;
pub mod resolver;
pub mod schema;

pub use entities::{CategoryStore, LocationStore, PersonStore, PhotoStore};
pub use import::LocalDataImporter;
pub use resolver::TenantResolver;
pub use schema::migrate;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Open (and create if missing) a SQLite database, with foreign keys on.
pub async fn connect(path: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}
