use async_trait::async_trait;
use chrono::Duration;
use reqwest::{Client, Method};
use serde_json::Value;
use std::fmt::{Debug, Display};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::locator::Locator;
use crate::time::{self, Window};

/// Fields the station endpoint cannot serve.
const STATION_UNSUPPORTED: [&str; 3] = ["sunrise", "sunset", "weather_code"];

/// Ordered query parameters for one API call.
///
/// List-valued parameters (the requested fields) go on the wire as repeated
/// keys, which is how the API expects them.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &str, value: impl Display) {
        self.pairs.push((name.to_string(), value.to_string()));
    }

    pub fn push_fields(&mut self, fields: &[String]) {
        for field in fields {
            self.push("fields", field);
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// First value under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All values under `name`, in insertion order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(key, _)| key == name)
    }
}

/// What the transport hands back: status and raw body, uninterpreted.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

/// Seam over the HTTP layer; one request per call, no retries.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn execute(&self, method: Method, url: &str, query: &Query) -> Result<Reply>;
}

/// The reqwest-backed transport used outside of tests.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: Client,
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, method: Method, url: &str, query: &Query) -> Result<Reply> {
        let res = self.http.request(method, url).query(query.pairs()).send().await?;

        let status = res.status().as_u16();
        let body = res.text().await?;
        Ok(Reply { status, body })
    }
}

/// Thin wrapper over the ClimaCell forecast endpoints.
///
/// A client is built for one place and holds the resolved coordinates plus
/// the configured key, base URL, default fields and unit system for its
/// lifetime. Every method issues exactly one request; a failed call surfaces
/// as a single error.
#[derive(Debug)]
pub struct ApiClient {
    api_key: String,
    base_url: String,
    coords: (f64, f64),
    fields: Vec<String>,
    unit_system: String,
    transport: Box<dyn Transport>,
}

impl ApiClient {
    /// Build a client for a place, geocoding `location` when no explicit
    /// coordinates are given. Explicit coordinates win when both are
    /// present; neither is [`Error::MissingLocation`].
    pub async fn new(
        settings: &Settings,
        coords: Option<(f64, f64)>,
        location: Option<&str>,
    ) -> Result<Self> {
        Self::with_parts(settings, coords, location, None, Box::new(HttpTransport::default()))
            .await
    }

    /// Like [`ApiClient::new`], with a caller-supplied locator and
    /// transport.
    pub async fn with_parts(
        settings: &Settings,
        coords: Option<(f64, f64)>,
        location: Option<&str>,
        locator: Option<&Locator>,
        transport: Box<dyn Transport>,
    ) -> Result<Self> {
        let coords = match (coords, location) {
            (Some(pair), _) => pair,
            (None, Some(name)) => {
                let fallback;
                let locator = match locator {
                    Some(locator) => locator,
                    None => {
                        fallback = Locator::from_settings(settings)?;
                        &fallback
                    }
                };
                locator.coordinates(name).await?
            }
            (None, None) => return Err(Error::MissingLocation),
        };

        Ok(Self::with_transport(settings, coords, transport))
    }

    /// Client for already-known coordinates over a specific transport.
    pub fn with_transport(
        settings: &Settings,
        coords: (f64, f64),
        transport: Box<dyn Transport>,
    ) -> Self {
        Self {
            api_key: settings.api_key().to_string(),
            base_url: settings.base_url().to_string(),
            coords,
            fields: settings.fields().to_vec(),
            unit_system: settings.unit_system().to_string(),
            transport,
        }
    }

    /// The coordinates every call of this client is issued for.
    pub fn coordinates(&self) -> (f64, f64) {
        self.coords
    }

    /// Perform one call against `endpoint`.
    ///
    /// Merges `apikey`, `lat`, `lon` (and `unit_system` when `with_units`)
    /// into the caller's query. A non-2xx response becomes [`Error::Api`]
    /// with the status and body kept verbatim.
    pub async fn call(
        &self,
        endpoint: &str,
        mut query: Query,
        method: Method,
        with_units: bool,
    ) -> Result<Value> {
        query.push("apikey", &self.api_key);
        query.push("lat", self.coords.0);
        query.push("lon", self.coords.1);
        if with_units {
            query.push("unit_system", &self.unit_system);
        }

        let url = format!("{}{}", self.base_url, endpoint);
        let reply = self.transport.execute(method, &url, &query).await?;

        if !(200..300).contains(&reply.status) {
            return Err(Error::Api { status: reply.status, body: reply.body });
        }

        Ok(serde_json::from_str(&reply.body)?)
    }

    /// Real-time observational data.
    ///
    /// `fields` falls back to the configured defaults when `None`; an
    /// explicitly empty list is sent as-is. The same rule applies to every
    /// endpoint method.
    pub async fn realtime(&self, fields: Option<&[String]>) -> Result<Value> {
        let mut query = Query::new();
        query.push_fields(self.fields_or_default(fields));

        self.call("weather/realtime", query, Method::GET, true).await
    }

    /// Minute-by-minute forecast, up to six hours out.
    ///
    /// `timestep` is the interval between data points in minutes, default 5.
    pub async fn nowcast(
        &self,
        timestep: Option<u32>,
        start: Option<&str>,
        end: Option<&str>,
        fields: Option<&[String]>,
    ) -> Result<Value> {
        let window = Window::forward(start, end, Duration::minutes(360))?;

        let mut query = Query::new();
        query.push("start_time", time::to_wire(window.start));
        query.push("end_time", time::to_wire(window.end));
        query.push("timestep", timestep.unwrap_or(5));
        query.push_fields(self.fields_or_default(fields));

        self.call("weather/nowcast", query, Method::GET, true).await
    }

    /// Hourly forecast, up to 108 hours (4.5 days) out.
    pub async fn hourly(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        fields: Option<&[String]>,
    ) -> Result<Value> {
        let window = Window::forward(start, end, Duration::hours(108))?;

        let mut query = Query::new();
        query.push("start_time", time::to_wire(window.start));
        query.push("end_time", time::to_wire(window.end));
        query.push_fields(self.fields_or_default(fields));

        self.call("weather/forecast/hourly", query, Method::GET, true).await
    }

    /// Daily forecast with summaries, up to 15 days out. The default end
    /// lands on the start of the fifteenth day.
    pub async fn daily(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        fields: Option<&[String]>,
    ) -> Result<Value> {
        let window = Window::forward_days(start, end, 15)?;

        let mut query = Query::new();
        query.push("start_time", time::to_wire(window.start));
        query.push("end_time", time::to_wire(window.end));
        query.push_fields(self.fields_or_default(fields));

        self.call("weather/forecast/daily", query, Method::GET, true).await
    }

    /// Historical data from ClimaCell's own layer, defaulting to the last
    /// six hours.
    pub async fn climacell(
        &self,
        timestep: Option<u32>,
        start: Option<&str>,
        end: Option<&str>,
        fields: Option<&[String]>,
    ) -> Result<Value> {
        let window = Window::backward(start, end, Duration::minutes(360))?;

        let mut query = Query::new();
        query.push("start_time", time::to_wire(window.start));
        query.push("end_time", time::to_wire(window.end));
        query.push("timestep", timestep.unwrap_or(5));
        query.push_fields(self.fields_or_default(fields));

        self.call("weather/historical/climacell", query, Method::GET, true).await
    }

    /// Historical weather station observations, defaulting to the last six
    /// hours.
    pub async fn station(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        fields: Option<&[String]>,
    ) -> Result<Value> {
        let window = Window::backward(start, end, Duration::minutes(360))?;

        // The endpoint rejects astronomical fields; filter a copy so the
        // caller's list is left alone.
        let fields: Vec<String> = self
            .fields_or_default(fields)
            .iter()
            .filter(|field| !STATION_UNSUPPORTED.contains(&field.as_str()))
            .cloned()
            .collect();

        let mut query = Query::new();
        query.push("start_time", time::to_wire(window.start));
        query.push("end_time", time::to_wire(window.end));
        query.push_fields(&fields);

        self.call("weather/historical/station", query, Method::GET, true).await
    }

    /// Fire danger index. This endpoint takes no unit system.
    pub async fn fire_index(&self, fields: Option<&[String]>) -> Result<Value> {
        let mut query = Query::new();
        query.push_fields(self.fields_or_default(fields));

        self.call("insights/fire-index", query, Method::GET, false).await
    }

    fn fields_or_default<'a>(&'a self, fields: Option<&'a [String]>) -> &'a [String] {
        fields.unwrap_or(&self.fields)
    }
}
