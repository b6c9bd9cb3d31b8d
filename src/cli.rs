use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nimbus")]
#[command(about = "Weather lookups over an interceptor-driven HTTP client", long_about = None)]
pub struct Cli {
    #[arg(
        short,
        long,
        global = true,
        help = "Path to the configuration file",
        default_value = "data/config.toml"
    )]
    pub config: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show current conditions for the device location, or for an explicit query
    Current {
        #[arg(short, long, help = "Location query (city name, postcode or \"lat,lon\"). Skips location lookup")]
        query: Option<String>,
        #[arg(short, long, help = "Language for the condition text, overrides the configured one")]
        lang: Option<String>,
        #[arg(long, requires = "lon", allow_hyphen_values = true, help = "Fixed latitude to use as the device location")]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true, help = "Fixed longitude to use as the device location")]
        lon: Option<f64>,
    },
    /// Fetch any resource relative to the configured base URL
    Fetch {
        #[arg(help = "Relative path or absolute URL to fetch")]
        resource: String,
        #[arg(
            short,
            long,
            help = "Query parameter in key=value format. Can be specified multiple times.",
            alias = "query"
        )]
        param: Vec<String>,
        #[arg(
            short = 'H',
            long,
            help = "Extra header in \"name: value\" format. Can be specified multiple times."
        )]
        header: Vec<String>,
        #[arg(short = 'X', long, help = "HTTP method", default_value = "GET")]
        method: String,
        #[arg(short, long, help = "Write the response body to this file instead of stdout")]
        output: Option<String>,
    },
    /// Write the default configuration file to the configured path
    InitConfig {
        #[arg(short, long, help = "Overwrite an existing configuration file")]
        force: bool,
    },
}

/// Splits `key=value`. A missing `=` yields an empty value.
pub fn parse_param(raw: &str) -> (String, String) {
    match raw.split_once('=') {
        Some((key, value)) => (key.to_string(), value.to_string()),
        None => (raw.to_string(), String::new()),
    }
}

/// Splits `name: value`.
pub fn parse_header(raw: &str) -> Option<(String, String)> {
    let (name, value) = raw.split_once(':')?;
    Some((name.trim().to_string(), value.trim().to_string()))
}
