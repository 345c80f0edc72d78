//! HTTP API server.
//!
//! Exposes the listing service over a JSON HTTP API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/properties` | Create a listing, bucketed by its coordinates |
//! | `GET`  | `/api/properties/search?location=<text>` | Listings in the bucket the text resolves to |
//! | `GET`  | `/api/geo-buckets/stats` | Listing count per non-empty bucket |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "validation", "message": "title is required" } }
//! ```
//!
//! Error codes: `validation` (400), `unresolvable_location` (400),
//! `bad_request` (400), `geocoder_unavailable` (502), `internal` (500).
//! Search never errors on "no match" — it returns `200 []`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser
//! clients.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::config::Config;
use crate::db;
use crate::error::ServiceError;
use crate::geocode::{Geocoder, GoogleGeocoder};
use crate::service::{ListingService, NewListing};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    service: Arc<ListingService>,
}

/// Build the router around a database pool and an injected oracle.
///
/// Split out of [`run_server`] so tests can mount the exact production
/// routes on an ephemeral listener with a stub geocoder.
pub fn app(pool: sqlx::SqlitePool, geocoder: Arc<dyn Geocoder>) -> Router {
    let state = AppState {
        service: Arc::new(ListingService::new(pool, geocoder)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/properties", post(handle_create_property))
        .route("/api/properties/search", get(handle_search))
        .route("/api/geo-buckets/stats", get(handle_stats))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server with the Google geocoder from config.
///
/// Binds to the address configured in `[server].bind` and runs until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    let geocoder: Arc<dyn Geocoder> = Arc::new(GoogleGeocoder::new(&config.geocoder)?);

    let router = app(pool, geocoder);

    println!("listing server on http://{}", config.server.bind);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"validation"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match &err {
            ServiceError::Validation(_) => AppError {
                status: StatusCode::BAD_REQUEST,
                code: "validation".to_string(),
                message: err.to_string(),
            },
            ServiceError::UnresolvableLocation => AppError {
                status: StatusCode::BAD_REQUEST,
                code: "unresolvable_location".to_string(),
                message: err.to_string(),
            },
            ServiceError::GeocoderUnavailable(_) => AppError {
                status: StatusCode::BAD_GATEWAY,
                code: "geocoder_unavailable".to_string(),
                message: err.to_string(),
            },
            ServiceError::Database(_) => {
                error!(%err, "request failed");
                AppError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "internal".to_string(),
                    message: "internal error".to_string(),
                }
            }
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/properties ============

/// Request body for `POST /api/properties`. Required fields are kept
/// optional here so their absence surfaces as a `validation` error,
/// not a deserialization failure.
#[derive(Deserialize)]
struct CreatePropertyRequest {
    title: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    location: Option<String>,
    price: Option<f64>,
    bedrooms: Option<i64>,
    bathrooms: Option<i64>,
}

#[derive(Serialize)]
struct CreatePropertyResponse {
    message: String,
    bucket: String,
    bucket_id: String,
}

async fn handle_create_property(
    State(state): State<AppState>,
    Json(req): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<CreatePropertyResponse>), AppError> {
    let created = state
        .service
        .create_listing(NewListing {
            title: req.title,
            lat: req.lat,
            lng: req.lng,
            location_text: req.location,
            price: req.price,
            bedrooms: req.bedrooms,
            bathrooms: req.bathrooms,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePropertyResponse {
            message: "Property created".to_string(),
            bucket: created.bucket.name,
            bucket_id: created.bucket.id,
        }),
    ))
}

// ============ GET /api/properties/search ============

#[derive(Deserialize)]
struct SearchParams {
    location: Option<String>,
}

#[derive(Serialize)]
struct SearchHitResponse {
    title: String,
    location: Option<String>,
    bucket: String,
    coordinates: CoordinatesResponse,
}

#[derive(Serialize)]
struct CoordinatesResponse {
    lat: f64,
    lng: f64,
}

async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchHitResponse>>, AppError> {
    let location = params
        .location
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| bad_request("location query parameter is required"))?;

    let hits = state.service.search_by_location(&location).await?;

    Ok(Json(
        hits.into_iter()
            .map(|h| SearchHitResponse {
                title: h.title,
                location: h.location_text,
                bucket: h.bucket,
                coordinates: CoordinatesResponse {
                    lat: h.coordinates.lat,
                    lng: h.coordinates.lng,
                },
            })
            .collect(),
    ))
}

// ============ GET /api/geo-buckets/stats ============

async fn handle_stats(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, i64>>, AppError> {
    let stats = state.service.bucket_stats().await?;
    Ok(Json(stats))
}
