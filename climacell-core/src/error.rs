use thiserror::Error;

/// Errors surfaced by the core library.
///
/// Every failure propagates to the caller as-is: no retry, no fallback
/// value, no local recovery.
#[derive(Debug, Error)]
pub enum Error {
    /// Required configuration is missing or a config file could not be used.
    #[error("configuration error: {0}")]
    Config(String),

    /// Neither coordinates nor a location name were supplied.
    #[error("either coordinates or a location name is required")]
    MissingLocation,

    /// The geocoding provider answered with an unexpected shape.
    #[error("unexpected geocoder response: {0}")]
    GeocodeFormat(String),

    /// A remote API answered with a non-2xx status. The body is kept
    /// verbatim for diagnostics.
    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// A timestamp argument was neither the `now` token nor RFC 3339.
    #[error("cannot parse timestamp {0:?}")]
    Timestamp(String),

    /// The HTTP transport failed before a response was received.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response body was not valid JSON.
    #[error("invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
