//! AeroDataBox client.
//!
//! One GET per logical query, no retries. Every request carries the RapidAPI
//! host and key headers and the configured timeout.

use crate::cache::{cache_lifetime, ResponseCache};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::models::{
    DeparturesResponse, Fallbacks, Flight, IcaoCode, LocalTimeResponse, Route, RoutesResponse,
};
use crate::span::Window;
use chrono::NaiveDateTime;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Format of window bounds in the departures URL.
pub const WINDOW_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Fixed filters on the departures query: scheduled passenger departures only.
pub const DEPARTURE_FILTERS: &str = "withLeg=true&direction=Departure&withCancelled=true\
&withCodeshared=true&withCargo=false&withPrivate=false&withLocation=false";

/// Anything that can list the departures of an airport within a window.
///
/// [`ApiClient`] is the real implementation; the aggregator only depends on
/// this trait.
pub trait FlightSource: Send + Sync {
    fn fetch_flights(
        &self,
        origin: &IcaoCode,
        window: Window,
    ) -> impl Future<Output = Result<Vec<Flight>>> + Send;
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    cache: Option<Arc<ResponseCache>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Self::with_builder(config, Client::builder())
    }

    /// Like [`new`](ApiClient::new), on top of a caller-prepared builder
    /// (proxy settings, TLS roots). Timeout and auth headers are always
    /// taken from `config`.
    pub fn with_builder(config: &ApiConfig, builder: ClientBuilder) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-rapidapi-host"),
            header_value(&config.host, "api.host")?,
        );
        let mut key = header_value(&config.key, "api.key")?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static("x-rapidapi-key"), key);

        let client = builder
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache: config
                .cache_responses
                .then(|| Arc::new(ResponseCache::new())),
        })
    }

    pub fn routes_url(&self, origin: &IcaoCode) -> String {
        format!("{}/airports/icao/{}/stats/routes/daily", self.base_url, origin)
    }

    pub fn flights_url(&self, origin: &IcaoCode, window: &Window) -> String {
        format!(
            "{}/flights/airports/icao/{}/{}/{}?{}",
            self.base_url,
            origin,
            window.start.format(WINDOW_TIME_FORMAT),
            window.end.format(WINDOW_TIME_FORMAT),
            DEPARTURE_FILTERS
        )
    }

    pub fn local_time_url(&self, origin: &IcaoCode) -> String {
        format!("{}/airports/icao/{}/time/local", self.base_url, origin)
    }

    /// Daily route statistics for `origin`, in server order.
    pub async fn fetch_routes(&self, origin: &IcaoCode) -> Result<Vec<Route>> {
        let body = self.get(&self.routes_url(origin)).await?;
        let response: RoutesResponse = decode(&body, "routes")?;

        let routes: Vec<Route> = response
            .routes
            .into_iter()
            .map(|record| Route::from_record(origin, record))
            .collect();

        info!(icao = %origin, count = routes.len(), "Fetched routes");
        Ok(routes)
    }

    /// Scheduled departures from `origin` within `window`, in server order.
    ///
    /// A single malformed record fails the whole window.
    pub async fn fetch_departures(&self, origin: &IcaoCode, window: Window) -> Result<Vec<Flight>> {
        let body = self.get(&self.flights_url(origin, &window)).await?;
        let fallbacks = Fallbacks::now();
        let response: DeparturesResponse = decode(&body, "departures")?;

        let flights: Vec<Flight> = response
            .departures
            .into_iter()
            .map(|record| Flight::from_record(origin, record, &fallbacks))
            .collect();

        debug!(icao = %origin, window = window.index, count = flights.len(), "Fetched departures");
        Ok(flights)
    }

    /// Current wall-clock time at `origin`.
    pub async fn fetch_local_time(&self, origin: &IcaoCode) -> Result<NaiveDateTime> {
        let body = self.get(&self.local_time_url(origin)).await?;
        let response: LocalTimeResponse = decode(&body, "local time")?;

        info!(
            icao = %origin,
            utc = %response.utc_time,
            local = %response.local_time,
            "Fetched airport local time"
        );
        Ok(response.local_time)
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        if let Some(body) = self.cache.as_ref().and_then(|c| c.get(url)) {
            return Ok(body);
        }

        debug!(url, "GET");
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url, error = %e, "Request failed");
            Error::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, %status, "Request rejected");
            return Err(Error::Network(format!("HTTP {}", status)));
        }

        let lifetime = cache_lifetime(response.headers());
        let body = response.bytes().await?.to_vec();
        if body.iter().all(u8::is_ascii_whitespace) {
            warn!(url, "Empty response body");
            return Err(Error::MissingData);
        }

        if let (Some(cache), Some(lifetime)) = (&self.cache, lifetime) {
            cache.insert(url, body.clone(), lifetime);
        }
        Ok(body)
    }
}

impl FlightSource for ApiClient {
    async fn fetch_flights(&self, origin: &IcaoCode, window: Window) -> Result<Vec<Flight>> {
        self.fetch_departures(origin, window).await
    }
}

fn header_value(value: &str, field: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::InvalidConfig(format!("{}: {}", field, e)))
}

/// Decodes `body`, logging where the shape mismatch was before collapsing it
/// into [`Error::Decode`].
fn decode<T: DeserializeOwned>(body: &[u8], endpoint: &str) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(
            endpoint,
            line = e.line(),
            column = e.column(),
            error = %e,
            "Failed to decode response"
        );
        Error::Decode
    })
}
