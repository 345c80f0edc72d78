//! Bucket registry: find-or-create with race recovery.
//!
//! Guarantees at most one bucket per distinct canonical name (compared
//! case-insensitively) under concurrent invocations. Deduplication is
//! pushed down to the storage layer's NOCASE unique index on `name`:
//! optimistic insert, catch the unique-constraint violation, re-read the
//! winner. No lock is taken, so the guarantee holds across server workers
//! sharing the database, not just tasks in one process.

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::ServiceError;
use crate::models::{Coordinates, GeoBucket};

/// Look up a bucket by canonical name, case-insensitively.
pub async fn find_bucket_by_name(
    pool: &SqlitePool,
    name: &str,
) -> Result<Option<GeoBucket>, ServiceError> {
    let row = sqlx::query(
        "SELECT id, name, center_lat, center_lng, created_at
         FROM geo_buckets WHERE name = ? COLLATE NOCASE",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| bucket_from_row(&r)))
}

/// Return the bucket for `name`, creating it if this is the first time the
/// canonical name has been seen.
///
/// For an existing bucket the stored id and center are authoritative; the
/// caller's `place_id` and `center` are only used when a new row is
/// created. A concurrently-created duplicate is treated as "found": the
/// insert's unique-violation is swallowed and the winning row re-read.
pub async fn resolve_or_create_bucket(
    pool: &SqlitePool,
    name: &str,
    place_id: &str,
    center: Coordinates,
) -> Result<GeoBucket, ServiceError> {
    if let Some(existing) = find_bucket_by_name(pool, name).await? {
        return Ok(existing);
    }

    let created_at = Utc::now().timestamp();
    let insert = sqlx::query(
        "INSERT INTO geo_buckets (id, name, center_lat, center_lng, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(place_id)
    .bind(name)
    .bind(center.lat)
    .bind(center.lng)
    .bind(created_at)
    .execute(pool)
    .await;

    match insert {
        Ok(_) => {
            debug!(bucket = name, id = place_id, "created bucket");
            Ok(GeoBucket {
                id: place_id.to_string(),
                name: name.to_string(),
                center,
                created_at,
            })
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            // Lost the race: another writer created this name (or this
            // place id) first. The winner is authoritative.
            debug!(bucket = name, "lost bucket creation race, re-reading winner");
            find_bucket_by_name(pool, name)
                .await?
                .ok_or_else(|| ServiceError::Database(sqlx::Error::RowNotFound))
        }
        Err(e) => Err(e.into()),
    }
}

fn bucket_from_row(row: &sqlx::sqlite::SqliteRow) -> GeoBucket {
    GeoBucket {
        id: row.get("id"),
        name: row.get("name"),
        center: Coordinates {
            lat: row.get("center_lat"),
            lng: row.get("center_lng"),
        },
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;
    use tempfile::TempDir;

    async fn test_pool(tmp: &TempDir) -> SqlitePool {
        let options = SqliteConnectOptions::from_str(&format!(
            "sqlite:{}",
            tmp.path().join("test.sqlite").display()
        ))
        .unwrap()
        .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .unwrap();

        migrate::apply_schema(&pool).await.unwrap();
        pool
    }

    fn center() -> Coordinates {
        Coordinates {
            lat: 6.4698,
            lng: 3.6285,
        }
    }

    #[tokio::test]
    async fn creates_bucket_on_first_resolution() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;

        let bucket = resolve_or_create_bucket(&pool, "Sangotedo", "place-1", center())
            .await
            .unwrap();

        assert_eq!(bucket.id, "place-1");
        assert_eq!(bucket.name, "Sangotedo");
        assert_eq!(bucket.center, center());
    }

    #[tokio::test]
    async fn reuses_bucket_and_keeps_original_id_and_center() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;

        let first = resolve_or_create_bucket(&pool, "Sangotedo", "place-1", center())
            .await
            .unwrap();

        // Second resolution carries different id and center; both discarded.
        let other_center = Coordinates {
            lat: 6.4720,
            lng: 3.6301,
        };
        let second = resolve_or_create_bucket(&pool, "Sangotedo", "place-2", other_center)
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.center, first.center);
    }

    #[tokio::test]
    async fn name_matching_is_case_insensitive() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;

        let first = resolve_or_create_bucket(&pool, "Sangotedo", "place-1", center())
            .await
            .unwrap();
        let second = resolve_or_create_bucket(&pool, "SANGOTEDO", "place-2", center())
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        // The stored display name is the first writer's casing.
        assert_eq!(second.name, "Sangotedo");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM geo_buckets")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_writers_produce_exactly_one_bucket() {
        let tmp = TempDir::new().unwrap();
        let pool = test_pool(&tmp).await;

        let mut handles = Vec::new();
        for i in 0..8 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                resolve_or_create_bucket(&pool, "Sangotedo", &format!("place-{}", i), center())
                    .await
                    .unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().id);
        }

        // Every writer sees the same winning bucket.
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 1);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM geo_buckets")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
