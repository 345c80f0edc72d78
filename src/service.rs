//! Listing service: create, search, and stats orchestration.
//!
//! Thin layer over the resolver and the bucket registry. Each operation
//! runs to completion within one request: resolve first, touch storage
//! only after a successful resolution, so no partial state is committed
//! when the oracle fails.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::geocode::Geocoder;
use crate::models::{Coordinates, GeoBucket, Listing};
use crate::registry;
use crate::resolver::{ResolveInput, Resolver};

/// Caller-supplied fields for a new listing. Everything except `title`
/// and the coordinates is optional; validation happens in
/// [`ListingService::create_listing`] so that missing fields surface as
/// a validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default)]
pub struct NewListing {
    pub title: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub location_text: Option<String>,
    pub price: Option<f64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
}

/// Result of a successful create: the stored listing and its bucket.
#[derive(Debug, Clone)]
pub struct CreatedListing {
    pub listing: Listing,
    pub bucket: GeoBucket,
}

/// One search result: a listing with its bucket name attached.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: String,
    pub location_text: Option<String>,
    pub bucket: String,
    pub coordinates: Coordinates,
}

pub struct ListingService {
    pool: SqlitePool,
    resolver: Resolver,
}

impl ListingService {
    pub fn new(pool: SqlitePool, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            pool,
            resolver: Resolver::new(geocoder),
        }
    }

    /// Validate, resolve the coordinates to a bucket, and persist the
    /// listing. The bucket is created if its canonical name is new.
    pub async fn create_listing(&self, input: NewListing) -> Result<CreatedListing, ServiceError> {
        let title = match input.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => return Err(ServiceError::Validation("title is required".to_string())),
        };

        let (lat, lng) = match (input.lat, input.lng) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => {
                return Err(ServiceError::Validation(
                    "lat and lng are required".to_string(),
                ))
            }
        };

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(ServiceError::Validation(
                "lat/lng out of range".to_string(),
            ));
        }

        let area = self
            .resolver
            .resolve(ResolveInput::Coordinates { lat, lng })
            .await?
            .ok_or(ServiceError::UnresolvableLocation)?;

        let center = Coordinates { lat, lng };
        let bucket =
            registry::resolve_or_create_bucket(&self.pool, &area.name, &area.place_id, center)
                .await?;

        let listing = Listing {
            id: Uuid::new_v4().to_string(),
            title,
            location_text: input.location_text,
            price: input.price,
            bedrooms: input.bedrooms,
            bathrooms: input.bathrooms,
            coordinates: center,
            bucket_id: bucket.id.clone(),
            created_at: Utc::now().timestamp(),
        };

        sqlx::query(
            "INSERT INTO properties
             (id, title, location_text, price, bedrooms, bathrooms, lat, lng, bucket_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&listing.id)
        .bind(&listing.title)
        .bind(&listing.location_text)
        .bind(listing.price)
        .bind(listing.bedrooms)
        .bind(listing.bathrooms)
        .bind(listing.coordinates.lat)
        .bind(listing.coordinates.lng)
        .bind(&listing.bucket_id)
        .bind(listing.created_at)
        .execute(&self.pool)
        .await?;

        info!(listing = %listing.id, bucket = %bucket.name, "created listing");

        Ok(CreatedListing { listing, bucket })
    }

    /// Resolve a free-text location query and return every listing in the
    /// matching bucket.
    ///
    /// "Nothing resolves" and "no such bucket" are both empty results,
    /// never errors — search stays idempotent and side-effect free.
    pub async fn search_by_location(&self, query: &str) -> Result<Vec<SearchHit>, ServiceError> {
        let Some(area) = self
            .resolver
            .resolve(ResolveInput::Text(query.to_string()))
            .await?
        else {
            return Ok(Vec::new());
        };

        let Some(bucket) = registry::find_bucket_by_name(&self.pool, &area.name).await? else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            "SELECT title, location_text, lat, lng FROM properties
             WHERE bucket_id = ? ORDER BY created_at, id",
        )
        .bind(&bucket.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| SearchHit {
                title: r.get("title"),
                location_text: r.get("location_text"),
                bucket: bucket.name.clone(),
                coordinates: Coordinates {
                    lat: r.get("lat"),
                    lng: r.get("lng"),
                },
            })
            .collect())
    }

    /// Listing count per bucket, restricted to buckets with at least one
    /// listing.
    pub async fn bucket_stats(&self) -> Result<BTreeMap<String, i64>, ServiceError> {
        let rows = sqlx::query(
            "SELECT b.name AS name, COUNT(p.id) AS listing_count
             FROM geo_buckets b
             JOIN properties p ON p.bucket_id = b.id
             GROUP BY b.name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| (r.get("name"), r.get("listing_count")))
            .collect())
    }
}
