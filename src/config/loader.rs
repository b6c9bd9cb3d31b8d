use std::{fs, fs::File, io::Write, path::Path};

use anyhow::{Context, Result};
use config::{Config, Environment};
use log::{info, trace};

use super::AppConfig;

/// Prefix for environment overrides, e.g. `NIMBUS_WEATHER__API_KEY`.
pub const ENV_PREFIX: &str = "NIMBUS";

pub fn get_default_config() -> &'static str {
    include_str!("../../config/config.toml")
}

/// Loads the layered configuration: the file at `path` (created from the
/// embedded default when missing), then `NIMBUS_*` environment variables.
pub fn load_configuration(path: &Path) -> Result<Config> {
    if !path.exists() {
        write_config_to(path, get_default_config()).context("Could not create default config")?;
        info!(path:% = path.display(); "Created new configuration file");
    }

    let filename = path.to_str().context("Invalid config file path")?;

    let cfg = Config::builder()
        .add_source(config::File::with_name(filename))
        .add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__"))
        .build()
        .context("Could not build config")?;

    trace!(path = filename; "Configuration sources merged");
    Ok(cfg)
}

pub fn load_app_config(path: &Path) -> Result<AppConfig> {
    load_configuration(path)?
        .try_deserialize()
        .context("Invalid configuration")
}

pub fn write_config_to(path: &Path, source: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create parent directories")?;
    };

    let mut file = File::create(path).context("Failed to create config file")?;
    file.write_all(source.as_bytes())
        .context("Failed to write config content")?;
    file.write_all(b"\n").context("Failed to write newline")?;
    Ok(())
}
