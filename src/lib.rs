//! # Geobucket
//!
//! A geo-bucketed real-estate listing service.
//!
//! Listings are entered with inconsistent location strings ("Sangotedo",
//! "Sangotedo, Ajah", "sangotedo lagos"). Geobucket resolves each listing's
//! coordinates — and each search query's text — through an external
//! geocoding oracle, picks one canonical area name at the most specific
//! stable granularity, and groups everything under deduplicated bucket
//! rows. Searching any spelling of an area finds every listing in it.
//!
//! ## Architecture
//!
//! ```text
//! client request
//!       │
//!       ▼
//! ┌───────────┐    ┌──────────┐    ┌───────────────┐
//! │  server   │──▶│ service   │──▶│   resolver     │──▶ geocode (oracle)
//! │  (axum)   │    │          │    │ priority scan │
//! └───────────┘    │          │    └───────────────┘
//!                  │          │    ┌───────────────┐
//!                  │          │──▶│   registry     │──▶ SQLite
//!                  └──────────┘    │ find-or-create│
//!                                  └───────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`geocode`] | Geocoding oracle adapter |
//! | [`resolver`] | Canonical-name resolution |
//! | [`registry`] | Bucket find-or-create with race recovery |
//! | [`service`] | Listing create / search / stats |
//! | [`server`] | HTTP API |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod error;
pub mod geocode;
pub mod migrate;
pub mod models;
pub mod registry;
pub mod resolver;
pub mod seed;
pub mod server;
pub mod service;
pub mod stats;
