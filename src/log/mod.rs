pub mod structured_console_encoder;

use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use log::{debug, info, warn};
use log4rs::{
    Config,
    config::{Deserializers, RawConfig},
};
use url::Url;

use crate::http::{Interceptor, RequestDescriptor, ResponseEnvelope};
use crate::log::structured_console_encoder::StructuredConsoleEncoderDeserializer;

/// Query parameters whose values never appear in logs.
const SECRET_PARAMS: [&str; 4] = ["key", "api_key", "apikey", "token"];

/// Environment variable naming an external log4rs file.
pub const LOG_CONFIG_ENV: &str = "NIMBUS_LOG_CONFIG";

const DEFAULT_LOG_CONFIG_PATH: &str = "log4rs.yml";
const EMBEDDED_LOG_CONFIG: &str = include_str!("../../resources/default_log4rs.yml");

/// Sets up log4rs for the `nimbus` binary.
///
/// Uses the file named by `NIMBUS_LOG_CONFIG`, else `log4rs.yml` in the
/// working directory, else the embedded default. A file that exists but
/// cannot be loaded is an error rather than a silent fallback.
pub fn init_logging() -> anyhow::Result<()> {
    let mut deserializers = Deserializers::default();
    deserializers.insert("structured_console", StructuredConsoleEncoderDeserializer);

    let config_path = std::env::var(LOG_CONFIG_ENV).unwrap_or_else(|_| DEFAULT_LOG_CONFIG_PATH.to_string());
    let path = Path::new(&config_path);

    if path.exists() {
        log4rs::init_file(path, deserializers)
            .with_context(|| format!("Could not load logging configuration from {}", path.display()))?;
        info!(path:% = path.display(); "Logging configured from file");
        return Ok(());
    }

    let raw_config = embedded_log_config()?;
    let (appenders, errors) = raw_config.appenders_lossy(&deserializers);
    if !errors.is_empty() {
        anyhow::bail!("Embedded logging appenders are invalid: {:?}", errors);
    }

    let config = Config::builder()
        .appenders(appenders)
        .loggers(raw_config.loggers())
        .build(raw_config.root())
        .context("Embedded logging configuration is inconsistent")?;
    log4rs::init_config(config).context("Logging was already initialised")?;

    debug!(path = config_path.as_str(); "No logging file found, using embedded defaults");
    Ok(())
}

fn embedded_log_config() -> anyhow::Result<RawConfig> {
    serde_yaml::from_str(EMBEDDED_LOG_CONFIG).context("Embedded logging configuration is invalid YAML")
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn reveal_secrets() -> bool {
    static REVEAL: OnceLock<bool> = OnceLock::new();
    *REVEAL.get_or_init(|| std::env::var("REVEAL_SECRETS").is_ok_and(|v| is_truthy(&v)))
}

/// Renders `url` with secret query values replaced by `***`.
/// If REVEAL_SECRETS is true, returns the URL unchanged.
pub fn mask_url(url: &Url) -> String {
    if reveal_secrets() {
        return url.to_string();
    }
    mask_query(url)
}

fn mask_query(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| SECRET_PARAMS.contains(&k.as_ref())) {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if SECRET_PARAMS.contains(&k.as_ref()) {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();

    let mut masked = url.clone();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

/// Request interceptor that logs every outgoing call.
pub fn request_logger() -> Interceptor<RequestDescriptor> {
    Interceptor::new().on_fulfilled(|request: RequestDescriptor| async move {
        info!(method:% = request.method, url:% = mask_url(&request.url); "Sending request");
        Ok(request)
    })
}

/// Response interceptor that logs every completed call and every failure.
pub fn response_logger() -> Interceptor<ResponseEnvelope> {
    Interceptor::new()
        .on_fulfilled(|response: ResponseEnvelope| async move {
            info!(
                status = response.status().as_u16(),
                url:% = mask_url(response.url());
                "Received response"
            );
            Ok(response)
        })
        .on_rejected(|error| async move {
            warn!(error:% = error; "Request failed");
            Err(error)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_params_are_masked() {
        let url = Url::parse("https://api.example/current.json?key=abc123&q=52.37,4.89").unwrap();
        assert_eq!(mask_query(&url), "https://api.example/current.json?key=***&q=52.37%2C4.89");
    }

    #[test]
    fn embedded_config_parses() {
        let raw = embedded_log_config().unwrap();
        assert_eq!(raw.root().level(), log::LevelFilter::Info);
        assert!(raw.loggers().iter().any(|logger| logger.name() == "nimbus"));
    }

    #[test]
    fn truthy_values() {
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" 1 "));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn urls_without_secrets_are_untouched() {
        let url = Url::parse("https://api.example/current.json?q=1,2").unwrap();
        assert_eq!(mask_query(&url), "https://api.example/current.json?q=1,2");
    }
}
