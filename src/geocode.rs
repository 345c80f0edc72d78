//! Geocoding oracle adapter.
//!
//! Defines the [`Geocoder`] trait — the read-only I/O boundary to the
//! external geocoding service — and the [`GoogleGeocoder`] implementation
//! backed by the Google Geocoding API.
//!
//! The adapter does no normalization: it returns the oracle's candidates
//! in the oracle's own ranking and leaves name selection to the resolver.
//! An empty candidate list is a valid "no match" outcome, not an error.
//!
//! # Retry Strategy
//!
//! Transient failures are retried with exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - `OVER_QUERY_LIMIT` in the response body → retry
//! - Network errors → retry
//! - Any other failure → fail immediately
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Exhausted retries surface as [`GeocodeError::Unavailable`].

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::config::GeocoderConfig;

#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The oracle could not be reached or kept returning errors.
    #[error("geocoding oracle unavailable: {0}")]
    Unavailable(String),
}

/// One address component of a candidate, e.g. `{long_name: "Sangotedo",
/// types: ["neighborhood", "political"]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

/// A ranked address candidate as returned by the oracle.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressCandidate {
    #[serde(rename = "address_components", default)]
    pub components: Vec<AddressComponent>,
    pub formatted_address: String,
    pub place_id: String,
}

/// The external geocoding oracle, as a black box mapping coordinates or
/// free text to ranked address candidates.
///
/// Implementations must be read-only and side-effect free. Tests inject
/// stub implementations to make resolution deterministic.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Look up the address candidates for a coordinate pair.
    async fn reverse_geocode(&self, lat: f64, lng: f64)
        -> Result<Vec<AddressCandidate>, GeocodeError>;

    /// Look up the address candidates for a free-text location query.
    async fn geocode(&self, query: &str) -> Result<Vec<AddressCandidate>, GeocodeError>;
}

/// Wire shape of the Google Geocoding API response.
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<AddressCandidate>,
}

/// [`Geocoder`] backed by the Google Geocoding API.
///
/// The API key is read from the environment variable named in
/// `[geocoder].api_key_env` at construction time.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    url: String,
    api_key: String,
    max_retries: u32,
}

impl GoogleGeocoder {
    pub fn new(config: &GeocoderConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", config.api_key_env))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            api_key,
            max_retries: config.max_retries,
        })
    }

    /// Issue one geocoding request with retry/backoff, identified by a
    /// single query parameter (`latlng` for reverse, `address` for forward).
    async fn request(
        &self,
        param: &str,
        value: &str,
    ) -> Result<Vec<AddressCandidate>, GeocodeError> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .get(&self.url)
                .query(&[(param, value), ("key", self.api_key.as_str())])
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(format!("geocoding API error {}: {}", status, body_text));
                        continue;
                    }

                    if !status.is_success() {
                        let body_text = response.text().await.unwrap_or_default();
                        return Err(GeocodeError::Unavailable(format!(
                            "geocoding API error {}: {}",
                            status, body_text
                        )));
                    }

                    let body: GeocodeResponse = response
                        .json()
                        .await
                        .map_err(|e| GeocodeError::Unavailable(e.to_string()))?;

                    match body.status.as_str() {
                        "OK" => {
                            debug!(candidates = body.results.len(), "geocoding response");
                            return Ok(body.results);
                        }
                        // Valid "no match" outcome, not an error
                        "ZERO_RESULTS" => return Ok(Vec::new()),
                        "OVER_QUERY_LIMIT" => {
                            last_err = Some("geocoding API over query limit".to_string());
                            continue;
                        }
                        other => {
                            return Err(GeocodeError::Unavailable(format!(
                                "geocoding API status: {}",
                                other
                            )));
                        }
                    }
                }
                Err(e) => {
                    last_err = Some(e.to_string());
                    continue;
                }
            }
        }

        Err(GeocodeError::Unavailable(
            last_err.unwrap_or_else(|| "geocoding failed after retries".to_string()),
        ))
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn reverse_geocode(
        &self,
        lat: f64,
        lng: f64,
    ) -> Result<Vec<AddressCandidate>, GeocodeError> {
        self.request("latlng", &format!("{},{}", lat, lng)).await
    }

    async fn geocode(&self, query: &str) -> Result<Vec<AddressCandidate>, GeocodeError> {
        self.request("address", query).await
    }
}
