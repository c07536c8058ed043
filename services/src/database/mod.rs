//! Relational storage for posts, tags and their associations.
//!
//! [`SqlStorage`] is the seam between the domain services and the database.
//! [`PgStorage`] talks to Postgres; [`MockSqlStorage`] keeps everything in
//! memory and enforces the same constraints, for tests.

mod mock;
mod postgres;
mod traits;
mod types;

pub use mock::MockSqlStorage;
pub use postgres::PgStorage;
pub use traits::SqlStorage;
pub use types::{
    ListParams, PostInsert, PostRow, PostTagLabelRow, PostTagRow, PostUpdate, SqlStorageError,
    TagPostRow, TagRow,
};

use crate::config::Config;
use anyhow::Context;
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize a PostgreSQL connection pool
pub async fn create_pool(config: &Config) -> anyhow::Result<PgPool> {
    let pool_config = config.pool();
    let pool = PgPoolOptions::new()
        .max_connections(pool_config.max_connections)
        .min_connections(pool_config.min_connections)
        .acquire_timeout(pool_config.acquire_timeout)
        .max_lifetime(pool_config.max_lifetime)
        .connect(config.database_url())
        .await
        .context("failed to connect to the database")?;

    tracing::info!(
        max_connections = pool_config.max_connections,
        "Database connection pool established"
    );

    Ok(pool)
}

/// Applies the embedded migrations under `services/migrations`.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    tracing::info!("Database migrations applied");
    Ok(())
}
