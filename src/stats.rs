//! Database statistics overview.
//!
//! Prints the bucket distribution straight from the database: how many
//! buckets exist, how many listings each one holds. Used by
//! `geobucket stats` to confirm that normalization is grouping listings
//! as expected.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_buckets: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM geo_buckets")
        .fetch_one(&pool)
        .await?;

    let total_listings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM properties")
        .fetch_one(&pool)
        .await?;

    println!("Geobucket — Database Stats");
    println!("==========================");
    println!();
    println!("  Database:  {}", config.db.path.display());
    println!("  Buckets:   {}", total_buckets);
    println!("  Listings:  {}", total_listings);
    println!();

    let rows = sqlx::query(
        r#"
        SELECT b.name AS name, COUNT(p.id) AS listing_count
        FROM geo_buckets b
        JOIN properties p ON p.bucket_id = b.id
        GROUP BY b.name
        ORDER BY listing_count DESC, b.name
        "#,
    )
    .fetch_all(&pool)
    .await?;

    if rows.is_empty() {
        println!("  No listings yet.");
    } else {
        println!("  {:<32} LISTINGS", "BUCKET");
        for row in &rows {
            let name: String = row.get("name");
            let count: i64 = row.get("listing_count");
            println!("  {:<32} {}", name, count);
        }
    }

    pool.close().await;
    Ok(())
}
