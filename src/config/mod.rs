//! Application configuration.
//!
//! The `[http]` section becomes the [`ClientConfig`] of the shared client,
//! `[weather]` feeds the weather wrapper and `[location]` selects the
//! location provider.

mod loader;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::http::{
    ClientConfig, HttpError, ReferrerPolicy, RequestCache, RequestCredentials, RequestMode,
};
use crate::weather::WeatherParams;

pub use loader::{ENV_PREFIX, get_default_config, load_app_config, load_configuration, write_config_to};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub http: HttpSettings,
    #[serde(default)]
    pub weather: WeatherSettings,
    #[serde(default)]
    pub location: LocationSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    pub base_url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub cache: Option<RequestCache>,
    pub credentials: Option<RequestCredentials>,
    pub mode: Option<RequestMode>,
    pub referrer: Option<String>,
    pub referrer_policy: Option<ReferrerPolicy>,
    pub timeout_secs: Option<u64>,
}

impl HttpSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherSettings {
    #[serde(default = "default_weather_path")]
    pub path: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_lang")]
    pub lang: Option<String>,
}

fn default_weather_path() -> String {
    "current.json".to_string()
}

fn default_lang() -> Option<String> {
    Some("nl".to_string())
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            path: default_weather_path(),
            api_key: String::new(),
            lang: default_lang(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationProviderKind {
    #[default]
    Ip,
    Static,
    None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationSettings {
    #[serde(default)]
    pub provider: LocationProviderKind,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,
}

fn default_ip_lookup_url() -> String {
    "http://ip-api.com/json/".to_string()
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            provider: LocationProviderKind::default(),
            latitude: None,
            longitude: None,
            ip_lookup_url: default_ip_lookup_url(),
        }
    }
}

impl AppConfig {
    /// Validates the `[http]` section into the client's fixed defaults.
    pub fn client_config(&self) -> Result<ClientConfig, HttpError> {
        let mut config = ClientConfig::new(&self.http.base_url)?;
        for (name, value) in &self.http.headers {
            config = config.with_header(name, value)?;
        }
        config.cache = self.http.cache;
        config.credentials = self.http.credentials;
        config.mode = self.http.mode;
        config.referrer = self.http.referrer.clone();
        config.referrer_policy = self.http.referrer_policy;
        Ok(config)
    }

    pub fn weather_params(&self) -> WeatherParams {
        WeatherParams {
            path: self.weather.path.clone(),
            api_key: self.weather.api_key.clone(),
            q: None,
            lang: self.weather.lang.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_config(headers: &[(&str, &str)]) -> AppConfig {
        AppConfig {
            http: HttpSettings {
                base_url: "https://api.example/v1/".into(),
                headers: headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                cache: None,
                credentials: Some(RequestCredentials::Omit),
                mode: None,
                referrer: None,
                referrer_policy: None,
                timeout_secs: Some(5),
            },
            weather: WeatherSettings::default(),
            location: LocationSettings::default(),
        }
    }

    #[test]
    fn client_config_carries_headers_and_policy() {
        let config = app_config(&[("content-type", "application/json")]).client_config().unwrap();
        assert_eq!(config.headers.get("Content-Type").unwrap(), "application/json");
        assert_eq!(config.credentials, Some(RequestCredentials::Omit));
        assert_eq!(config.base.as_str(), "https://api.example/v1/");
    }

    #[test]
    fn bad_header_is_rejected() {
        let err = app_config(&[("bad name", "x")]).client_config().unwrap_err();
        assert!(matches!(err, HttpError::InvalidHeader(_)));
    }

    #[test]
    fn weather_params_leave_query_unset() {
        let params = app_config(&[]).weather_params();
        assert_eq!(params.path, "current.json");
        assert_eq!(params.lang.as_deref(), Some("nl"));
        assert!(params.q.is_none());
        assert_eq!(app_config(&[]).http.timeout(), Some(Duration::from_secs(5)));
    }
}
