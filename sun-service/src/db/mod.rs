pub mod migrations;
pub mod queries;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

pub use queries::SqliteKvStore;

pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    // Every connection to an in-memory database gets its own empty database.
    let max_connections = if database_url.contains(":memory:") { 1 } else { 4 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    // Run migrations
    migrations::run_migrations(&pool).await?;

    Ok(pool)
}
