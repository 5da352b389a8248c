use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt::Debug;

use crate::config::Settings;
use crate::error::{Error, Result};

const OPENCAGE_URL: &str = "https://api.opencagedata.com/geocode/v1/json";

/// Seam over the geocoding provider. One network call per lookup, no
/// caching.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// Raw candidate list for a free-text query.
    async fn geocode(&self, query: &str) -> Result<Value>;
}

/// OpenCage forward geocoding.
#[derive(Debug, Clone)]
pub struct OpenCageGeocoder {
    api_key: String,
    http: Client,
}

impl OpenCageGeocoder {
    pub fn new(api_key: String) -> Self {
        Self { api_key, http: Client::new() }
    }
}

#[async_trait]
impl Geocoder for OpenCageGeocoder {
    async fn geocode(&self, query: &str) -> Result<Value> {
        let res = self
            .http
            .get(OPENCAGE_URL)
            .query(&[("q", query), ("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(Error::Api { status: status.as_u16(), body });
        }

        // The provider wraps the candidate list in a `results` member.
        let payload: Value = serde_json::from_str(&body)?;
        Ok(match payload {
            Value::Object(mut map) => match map.remove("results") {
                Some(results) => results,
                None => Value::Object(map),
            },
            other => other,
        })
    }
}

/// Resolves free-text place names to coordinates.
///
/// No retry, no caching, no disambiguation: the first candidate the
/// provider returns wins.
#[derive(Debug)]
pub struct Locator {
    geocoder: Box<dyn Geocoder>,
}

impl Locator {
    /// Build the OpenCage-backed locator.
    ///
    /// Fails with [`Error::Config`] when no geocoder key is configured.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let key = settings.geocoder_key().ok_or_else(|| {
            Error::Config(
                "OPENCAGE_KEY is not set; a geocoder key is required to look up place names"
                    .into(),
            )
        })?;

        Ok(Self::with_geocoder(Box::new(OpenCageGeocoder::new(key.to_string()))))
    }

    /// Locator over a caller-supplied geocoder.
    pub fn with_geocoder(geocoder: Box<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Single lookup, raw provider payload.
    pub async fn locate(&self, query: &str) -> Result<Value> {
        self.geocoder.geocode(query).await
    }

    /// First candidate's geometry as a `(latitude, longitude)` pair.
    ///
    /// The provider contract promises an ordered list of candidate matches;
    /// anything else is [`Error::GeocodeFormat`].
    pub async fn coordinates(&self, query: &str) -> Result<(f64, f64)> {
        let located = self.locate(query).await?;

        let candidates = located.as_array().ok_or_else(|| {
            Error::GeocodeFormat("expected an ordered list of candidate matches".into())
        })?;

        let first = candidates
            .first()
            .ok_or_else(|| Error::GeocodeFormat(format!("no candidates for {query:?}")))?;

        let geometry = first
            .get("geometry")
            .ok_or_else(|| Error::GeocodeFormat("candidate match has no geometry".into()))?;

        Ok((read_axis(geometry, "lat")?, read_axis(geometry, "lng")?))
    }
}

fn read_axis(geometry: &Value, axis: &str) -> Result<f64> {
    geometry
        .get(axis)
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::GeocodeFormat(format!("geometry is missing a numeric {axis:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct StubGeocoder {
        payload: Value,
    }

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn geocode(&self, _query: &str) -> Result<Value> {
            Ok(self.payload.clone())
        }
    }

    fn locator_with(payload: Value) -> Locator {
        Locator::with_geocoder(Box::new(StubGeocoder { payload }))
    }

    #[tokio::test]
    async fn coordinates_take_first_candidate() {
        let locator = locator_with(json!([
            { "geometry": { "lat": 52.5, "lng": 13.4 } },
            { "geometry": { "lat": 40.4, "lng": -3.7 } },
        ]));

        let coords = locator.coordinates("Berlin").await.expect("must resolve");
        assert_eq!(coords, (52.5, 13.4));
    }

    #[tokio::test]
    async fn single_object_payload_is_a_format_error() {
        let locator = locator_with(json!({ "geometry": { "lat": 52.5, "lng": 13.4 } }));

        let err = locator.coordinates("Berlin").await.unwrap_err();
        assert!(matches!(err, Error::GeocodeFormat(_)));
    }

    #[tokio::test]
    async fn empty_candidate_list_is_a_format_error() {
        let locator = locator_with(json!([]));

        let err = locator.coordinates("Nowhereville").await.unwrap_err();
        assert!(matches!(err, Error::GeocodeFormat(_)));
    }

    #[tokio::test]
    async fn non_numeric_geometry_is_a_format_error() {
        let locator = locator_with(json!([{ "geometry": { "lat": "52.5", "lng": 13.4 } }]));

        let err = locator.coordinates("Berlin").await.unwrap_err();
        assert!(matches!(err, Error::GeocodeFormat(_)));
    }

    #[test]
    fn from_settings_requires_a_geocoder_key() {
        let settings = Settings::new("KEY");

        let err = Locator::from_settings(&settings).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("OPENCAGE_KEY"));
    }

    #[test]
    fn from_settings_works_with_a_key() {
        let settings = Settings::new("KEY").with_geocoder_key("GEO_KEY");
        assert!(Locator::from_settings(&settings).is_ok());
    }
}
