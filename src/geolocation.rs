//! Device location and the location-to-weather adapter.
//!
//! Where the location comes from is a [`LocationProvider`]: a fixed position
//! from configuration, an IP-based lookup, or a test fake. [`get_geolocation`]
//! asks the provider once, turns the coordinates into a `"lat,lon"` query and
//! hands off to [`Weather::get_weather`].

use std::sync::Arc;

use futures::future::BoxFuture;
use log::{debug, error};
use serde::Deserialize;
use thiserror::Error;

use crate::http::{CallOptions, ClientError, HttpClient};
use crate::weather::{Weather, WeatherData, WeatherParams};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinates {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon")]
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
        }
    }

    /// `"lat,lon"`, the form the weather API accepts for `q`.
    pub fn to_query(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Error)]
pub enum GeolocationError {
    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),

    #[error("Location lookup failed: {0}")]
    Lookup(#[from] ClientError),
}

pub trait LocationProvider: Send + Sync {
    fn current_position(&self) -> BoxFuture<'_, Result<Coordinates, GeolocationError>>;
}

/// Always reports the same position.
#[derive(Debug, Clone)]
pub struct StaticLocationProvider {
    coordinates: Coordinates,
}

impl StaticLocationProvider {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

impl LocationProvider for StaticLocationProvider {
    fn current_position(&self) -> BoxFuture<'_, Result<Coordinates, GeolocationError>> {
        Box::pin(async move { Ok(self.coordinates) })
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(flatten)]
    coordinates: Option<Coordinates>,
}

/// Resolves the position from the caller's public IP with a JSON lookup
/// service such as `http://ip-api.com/json/`.
pub struct IpLocationProvider {
    http_client: Arc<HttpClient>,
    lookup_url: String,
}

impl IpLocationProvider {
    pub fn new(http_client: Arc<HttpClient>, lookup_url: impl Into<String>) -> Self {
        Self {
            http_client,
            lookup_url: lookup_url.into(),
        }
    }

    async fn lookup(&self) -> Result<Coordinates, GeolocationError> {
        let response: IpLookupResponse = self
            .http_client
            .json_do(self.lookup_url.as_str(), CallOptions::new())
            .await?;

        if response.status.as_deref() == Some("fail") {
            let message = response.message.unwrap_or_else(|| "lookup failed".to_string());
            return Err(GeolocationError::PositionUnavailable(message));
        }

        response
            .coordinates
            .ok_or_else(|| GeolocationError::PositionUnavailable("lookup returned no coordinates".to_string()))
    }
}

impl LocationProvider for IpLocationProvider {
    fn current_position(&self) -> BoxFuture<'_, Result<Coordinates, GeolocationError>> {
        Box::pin(self.lookup())
    }
}

/// Resolves the current position and fetches the weather for it.
///
/// Without a provider this logs that geolocation is unsupported and returns
/// `Ok(None)`. A provider failure is logged and returned. Weather failures
/// are swallowed by [`Weather::get_weather`] and surface as `Ok(None)`.
pub async fn get_geolocation(
    weather: &mut Weather,
    mut params: WeatherParams,
    provider: Option<&dyn LocationProvider>,
) -> Result<Option<WeatherData>, GeolocationError> {
    let Some(provider) = provider else {
        error!("Geolocation is not supported by this host.");
        return Ok(None);
    };

    let coordinates = provider.current_position().await.inspect_err(|e| {
        error!(error:% = e; "Could not determine current position");
    })?;

    let q = coordinates.to_query();
    debug!(q:% = q; "Resolved current position");
    params.q = Some(q);

    Ok(weather.get_weather(&params).await)
}
