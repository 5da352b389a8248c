//! Core library for the `climacell` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Geocoding of place names to coordinates
//! - The thin wrapper over the ClimaCell forecast endpoints
//!
//! It is used by `climacell-cli`, but can also be reused by other binaries or services.

pub mod api;
pub mod config;
pub mod error;
pub mod locator;
pub mod time;

pub use api::{ApiClient, HttpTransport, Query, Reply, Transport};
pub use config::{Settings, StoredSettings};
pub use error::{Error, Result};
pub use locator::{Geocoder, Locator, OpenCageGeocoder};
