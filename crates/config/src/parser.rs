use crate::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

#[instrument(skip(path))]
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    debug!("Config file content length: {} bytes", content.len());
    parse_config(&content)
}

/// Parse a YAML document after environment variable substitution.
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let substituted = substitution::substitute_env_vars(content)?;

    let config: AppConfig = serde_yaml::from_str(&substituted)
        .with_context(|| "Failed to parse YAML configuration")?;

    info!("Configuration loaded successfully");
    Ok(config)
}

/// Config written by `init`: defaults plus explicit entries for every
/// venue, so the file documents what can be overridden.
#[instrument]
pub fn generate_default_config() -> AppConfig {
    let mut config = AppConfig::default();

    for venue in VenueKey::ALL {
        let info = venue.info();
        config.proxy.venues.insert(
            venue,
            VenueConfig {
                base_url: Some(info.default_base_url.to_string()),
                ..VenueConfig::default()
            },
        );
        config
            .compare
            .symbols
            .insert(venue, info.default_symbol.to_string());
    }

    config
}

#[instrument(skip(config))]
pub fn save_config<P: AsRef<Path> + std::fmt::Debug>(config: &AppConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Saving configuration to: {:?}", path);

    let yaml = serde_yaml::to_string(config)
        .with_context(|| "Failed to serialize configuration to YAML")?;

    fs::write(path, yaml)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    info!("Configuration saved successfully");
    Ok(())
}
