use crate::config::DatabaseConfig;
use crate::error::HuddleError;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, HuddleError> {
    Ok(PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), HuddleError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn health_check(pool: &PgPool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT version()").fetch_one(pool).await?;
    Ok(row.0)
}
