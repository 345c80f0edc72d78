//! Core data models for the listing service.
//!
//! These types mirror the two persisted tables: canonical geographic
//! buckets and the property listings that reference them.

/// A latitude/longitude pair. Latitude first, as in the wire formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A canonical, deduplicated geographic grouping stored in `geo_buckets`.
///
/// `id` is the oracle's place id captured at first creation and `center`
/// the coordinates of the query that created the bucket; both are
/// authoritative once written and never updated.
#[derive(Debug, Clone)]
pub struct GeoBucket {
    pub id: String,
    pub name: String,
    pub center: Coordinates,
    pub created_at: i64,
}

/// A property listing stored in `properties`, linked to exactly one bucket.
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: String,
    pub title: String,
    /// Location string as supplied by the caller, un-normalized.
    pub location_text: Option<String>,
    pub price: Option<f64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub coordinates: Coordinates,
    pub bucket_id: String,
    pub created_at: i64,
}
