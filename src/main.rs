use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::Parser;
use log::{info, warn};
use reqwest::Method;

use nimbus::config::{AppConfig, LocationProviderKind, get_default_config, load_app_config, write_config_to};
use nimbus::geolocation::{Coordinates, IpLocationProvider, LocationProvider, StaticLocationProvider, get_geolocation};
use nimbus::http::{BinaryError, CallOptions, HttpClient, ReqwestTransport};
use nimbus::log::{init_logging, request_logger, response_logger};
use nimbus::utils::timestamp::format_date;
use nimbus::weather::{Weather, WeatherData};

use crate::cli::{Cli, Commands, parse_header, parse_param};

mod cli;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_logging()?;

    let cli = Cli::parse();
    let config_path = Path::new(&cli.config);

    match cli.command {
        Commands::InitConfig { force } => {
            if config_path.exists() && !force {
                println!("Configuration already exists at {}. Use --force to overwrite.", config_path.display());
                return Ok(());
            }
            write_config_to(config_path, get_default_config())?;
            println!("Wrote default configuration to {}", config_path.display());
        },
        Commands::Current { query, lang, lat, lon } => {
            let app_config = load_app_config(config_path)?;
            let http_client = build_client(&app_config)?;
            let mut weather = Weather::new(http_client.clone());

            let mut params = app_config.weather_params();
            if lang.is_some() {
                params.lang = lang;
            }
            if params.api_key.is_empty() {
                warn!("No weather API key configured; set weather.api_key or NIMBUS_WEATHER__API_KEY");
            }

            let data = match query {
                Some(q) => {
                    params.q = Some(q);
                    weather.get_weather(&params).await
                },
                None => {
                    let fixed = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));
                    let provider = location_provider(&app_config, fixed)?;
                    get_geolocation(&mut weather, params, provider.as_deref()).await?
                },
            };

            match data {
                Some(data) => print_weather(&data),
                None => println!("No weather data available."),
            }
        },
        Commands::Fetch {
            resource,
            param,
            header,
            method,
            output,
        } => {
            let app_config = load_app_config(config_path)?;
            let http_client = build_client(&app_config)?;

            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .map_err(|_| anyhow!("Invalid HTTP method: {}", method))?;
            let mut options = CallOptions::new()
                .method(method)
                .params(param.iter().map(|raw| parse_param(raw)));
            for raw in &header {
                let (name, value) = parse_header(raw).ok_or_else(|| anyhow!("Invalid header: {}", raw))?;
                options = options.header(name, value);
            }

            match output {
                Some(path) => {
                    let body = match http_client.buffer_do(resource.as_str(), options).await {
                        Ok(body) => body,
                        Err(BinaryError::Response(response)) => {
                            return Err(anyhow!(
                                "Request failed with status {}: {}",
                                response.status(),
                                response.text()
                            ));
                        },
                        Err(BinaryError::Http(e)) => return Err(e.into()),
                    };
                    std::fs::write(&path, &body).with_context(|| format!("Failed to write {}", path))?;
                    info!(path:% = path, bytes = body.len(); "Response body saved");
                    println!("Saved {} bytes to {}", body.len(), path);
                },
                None => {
                    let response = http_client.do_request(resource.as_str(), options).await?;
                    println!("{} {}", response.status(), response.url());
                    for (name, value) in response.headers() {
                        println!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
                    }
                    println!();
                    println!("{}", response.text());
                },
            }
        },
    }

    Ok(())
}

fn build_client(app_config: &AppConfig) -> Result<Arc<HttpClient>, anyhow::Error> {
    let transport = ReqwestTransport::with_timeout(app_config.http.timeout())?;
    let client = HttpClient::with_transport(app_config.client_config()?, Arc::new(transport));
    client.interceptors().request.register(request_logger());
    client.interceptors().response.register(response_logger());
    Ok(Arc::new(client))
}

fn location_provider(
    app_config: &AppConfig,
    fixed: Option<Coordinates>,
) -> Result<Option<Box<dyn LocationProvider>>, anyhow::Error> {
    if let Some(coordinates) = fixed {
        return Ok(Some(Box::new(StaticLocationProvider::new(coordinates))));
    }

    let settings = &app_config.location;
    let provider: Option<Box<dyn LocationProvider>> = match settings.provider {
        LocationProviderKind::Static => {
            let coordinates = settings
                .latitude
                .zip(settings.longitude)
                .map(|(lat, lon)| Coordinates::new(lat, lon))
                .context("location.provider is \"static\" but latitude/longitude are not set")?;
            Some(Box::new(StaticLocationProvider::new(coordinates)))
        },
        LocationProviderKind::Ip => {
            // Separate client: the lookup service must not inherit the weather base URL or headers.
            let lookup_config = nimbus::http::ClientConfig::new(&settings.ip_lookup_url)?;
            let transport = ReqwestTransport::with_timeout(app_config.http.timeout())?;
            let lookup_client = Arc::new(HttpClient::with_transport(lookup_config, Arc::new(transport)));
            lookup_client.interceptors().response.register(response_logger());
            Some(Box::new(IpLocationProvider::new(lookup_client, settings.ip_lookup_url.clone())))
        },
        LocationProviderKind::None => None,
    };
    Ok(provider)
}

fn print_weather(data: &WeatherData) {
    let location = &data.location;
    let current = &data.current;
    let when = format_date(&location.localtime).unwrap_or_else(|_| location.localtime.clone());

    println!("{}, {} ({})", location.name, location.region, when);
    println!("  {}", current.condition.text);
    println!("  Temperature: {:.1}°C / {:.1}°F", current.temp_c, current.temp_f);
    println!("  Precipitation: {:.1} mm", current.precip_mm);
    println!(
        "  Wind: {:.0} km/h / {:.0} mph from {:.0}°",
        current.wind_kph, current.wind_mph, current.wind_degree
    );
}
