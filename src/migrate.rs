use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Creates the schema if it does not exist. Idempotent.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    // Buckets are keyed by the oracle's place id; the NOCASE unique index
    // on name is what enforces "at most one bucket per canonical name".
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS geo_buckets (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            center_lat REAL NOT NULL,
            center_lng REAL NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_geo_buckets_name
         ON geo_buckets(name COLLATE NOCASE)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS properties (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            location_text TEXT,
            price REAL,
            bedrooms INTEGER,
            bathrooms INTEGER,
            lat REAL NOT NULL,
            lng REAL NOT NULL,
            bucket_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            FOREIGN KEY (bucket_id) REFERENCES geo_buckets(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_properties_bucket_id ON properties(bucket_id)")
        .execute(pool)
        .await?;

    Ok(())
}
