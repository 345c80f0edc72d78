//! Error taxonomy for the listing service.
//!
//! The service layer returns typed errors so the HTTP layer can map each
//! variant to a status code and stable error code without string matching.
//! Duplicate-bucket races are recovered inside the registry and never
//! appear here.

use thiserror::Error;

use crate::geocode::GeocodeError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Required request fields absent or malformed. Client error, no side effects.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The oracle returned no usable candidate for the given location.
    #[error("location could not be resolved to a known area")]
    UnresolvableLocation,

    /// The geocoding oracle is unreachable or kept failing.
    #[error("geocoder unavailable: {0}")]
    GeocoderUnavailable(#[source] GeocodeError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<GeocodeError> for ServiceError {
    fn from(err: GeocodeError) -> Self {
        ServiceError::GeocoderUnavailable(err)
    }
}
