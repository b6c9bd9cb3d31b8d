//! Weather convenience wrapper over [`HttpClient`].
//!
//! [`Weather`] remembers the last successful payload and whether a location
//! has been resolved. Failures are logged and swallowed here; callers only
//! see `None`.

mod types;

use std::sync::Arc;

use log::{debug, error};

use crate::http::{CallOptions, HttpClient};

pub use types::{Condition, Current, Location, WeatherData, WeatherParams};

pub struct Weather {
    http_client: Arc<HttpClient>,
    data: Option<WeatherData>,
    is_location_enabled: bool,
}

impl Weather {
    pub fn new(http_client: Arc<HttpClient>) -> Self {
        Self {
            http_client,
            data: None,
            is_location_enabled: false,
        }
    }

    /// `true` once a fetch has succeeded.
    pub fn location_enabled(&self) -> bool {
        self.is_location_enabled
    }

    pub fn data(&self) -> Option<&WeatherData> {
        self.data.as_ref()
    }

    /// Fetches current conditions for `params`.
    ///
    /// Sends `key`, `q` and `lang` as query parameters; unset optional
    /// parameters are left out. Returns `None` on any failure.
    pub async fn get_weather(&mut self, params: &WeatherParams) -> Option<WeatherData> {
        let mut options = CallOptions::new().param("key", &params.api_key);
        if let Some(q) = &params.q {
            options = options.param("q", q);
        }
        if let Some(lang) = &params.lang {
            options = options.param("lang", lang);
        }

        match self
            .http_client
            .json_do::<WeatherData>(params.path.as_str(), options)
            .await
        {
            Ok(weather_data) => {
                debug!(location:% = weather_data.location.name; "Weather data received");
                self.is_location_enabled = true;
                self.data = Some(weather_data.clone());
                Some(weather_data)
            },
            Err(err) => {
                error!(status = err.status, data:% = err.data; "Error fetching weather data");
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::http::ClientConfig;

    fn sample() -> serde_json::Value {
        json!({
            "location": {"name": "Amsterdam", "region": "North Holland", "country": "Netherlands", "localtime": "2025-05-01 9:05"},
            "current": {
                "temp_c": 14.0, "temp_f": 57.2, "precip_mm": 0.1,
                "condition": {"text": "Partly cloudy", "icon": "//cdn.example/116.png"},
                "wind_degree": 240, "wind_kph": 18.0, "wind_mph": 11.2
            }
        })
    }

    fn weather_for(server: &MockServer) -> Weather {
        let config = ClientConfig::new(&format!("{}/v1/", server.uri())).unwrap();
        Weather::new(Arc::new(HttpClient::new(config).unwrap()))
    }

    fn params() -> WeatherParams {
        WeatherParams {
            path: "current.json".into(),
            api_key: "secret".into(),
            q: Some("52.37,4.89".into()),
            lang: Some("nl".into()),
        }
    }

    #[tokio::test]
    async fn stores_payload_and_enables_location() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/current.json"))
            .and(query_param("key", "secret"))
            .and(query_param("q", "52.37,4.89"))
            .and(query_param("lang", "nl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample()))
            .mount(&mock_server)
            .await;

        let mut weather = weather_for(&mock_server);
        assert!(!weather.location_enabled());

        let data = weather.get_weather(&params()).await.unwrap();
        assert_eq!(data.location.name, "Amsterdam");
        assert_eq!(data.current.condition.text, "Partly cloudy");
        assert!(weather.location_enabled());
        assert_eq!(weather.data(), Some(&data));
    }

    #[tokio::test]
    async fn failure_is_swallowed() {
        let mock_server = MockServer::start().await;
        Mock::given(path("/v1/current.json"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": {"code": 2006}})))
            .mount(&mock_server)
            .await;

        let mut weather = weather_for(&mock_server);
        assert!(weather.get_weather(&params()).await.is_none());
        assert!(!weather.location_enabled());
        assert!(weather.data().is_none());
    }

    #[tokio::test]
    async fn unset_params_are_not_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(path("/v1/current.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample()))
            .mount(&mock_server)
            .await;

        let mut weather = weather_for(&mock_server);
        let params = WeatherParams {
            q: None,
            lang: None,
            ..params()
        };
        weather.get_weather(&params).await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests[0].url.query(), Some("key=secret"));
    }
}
