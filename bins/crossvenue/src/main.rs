//! Crossvenue CLI and proxy server binary
//!
//! `serve` runs the exchange proxy; `compare` and `probe` are clients of a
//! running proxy; `validate` and `init` manage the configuration file.

mod compare;
mod probe;

use anyhow::{Context, Result};
use cli::{Cli, Commands};
use common::{parse_venue_list, VenueKey};
use config::{
    generate_default_config, load_config, save_config, validate_config, AppConfig,
};
use market_data::{DayTick, TimestampPolicy};
use observability::{init_logging, init_metrics, LogFormat};
use proxy::{proxy_routes, ProxyState};
use server::{validate_port_available, HttpServer, ServerConfig, ServerExt};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let config = match cli.command.config_path() {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    let format = cli
        .log_format
        .and_then(|arg| LogFormat::parse(arg.as_str()))
        .unwrap_or(config.logging.format);
    init_logging("crossvenue", format)?;
    debug!(?cli, "CLI arguments parsed");
    info!(command = cli.command.name(), "Crossvenue starting");

    match cli.command {
        Commands::Serve { host, port, .. } => serve_command(config, host, port).await,
        Commands::Compare {
            venues,
            proxy_url,
            days,
            timestamp_policy,
            pretty,
            ..
        } => {
            let mut config = config;
            if let Some(url) = proxy_url {
                config.compare.proxy_url = url;
            }
            if let Some(days) = days {
                config.compare.window_days = days;
            }
            if let Some(policy) = timestamp_policy.and_then(|p| TimestampPolicy::parse(p.as_str())) {
                config.compare.timestamp_policy = policy;
            }
            compare_command(config, venues.as_deref(), pretty).await
        }
        Commands::Probe {
            venues,
            proxy_url,
            rows,
            ..
        } => {
            let mut config = config;
            if let Some(url) = proxy_url {
                config.compare.proxy_url = url;
            }
            probe_command(config, venues.as_deref(), rows).await
        }
        Commands::Validate { config } => validate_command(config).await,
        Commands::Init { output } => init_command(output).await,
    }
}

/// Log warnings and refuse to continue on validation errors.
fn check_config(config: &AppConfig) -> Result<()> {
    let report = validate_config(config);

    if !report.warnings.is_empty() {
        warn!("Configuration warnings:");
        for warning in &report.warnings {
            warn!(field = %warning.field, message = %warning.message);
        }
    }

    if !report.is_valid() {
        error!(
            error_count = report.errors.len(),
            "Configuration validation failed"
        );
        for err in &report.errors {
            error!("{}", err);
        }
        anyhow::bail!("Cannot continue due to configuration errors");
    }

    Ok(())
}

fn select_venues(config: &AppConfig, venues: Option<&str>) -> Result<Vec<VenueKey>> {
    match venues {
        Some(list) => parse_venue_list(list).context("Invalid --venues"),
        None => Ok(config.proxy.enabled_venues()),
    }
}

async fn serve_command(config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    check_config(&config)?;

    let server_config = ServerConfig::new(
        host.unwrap_or_else(|| config.server.host.clone()),
        port.unwrap_or(config.server.port),
    );
    validate_port_available(&server_config).await?;

    if config.metrics.enabled {
        init_metrics(config.metrics.port)?;
    }

    let state = ProxyState::from_config(&config.proxy).context("Failed to build proxy state")?;
    info!(
        host = %server_config.host,
        port = server_config.port,
        venues = ?config.proxy.enabled_venues(),
        "Starting proxy"
    );

    let server = HttpServer::new("proxy", server_config, proxy_routes(Arc::new(state)));
    server.run_until_signal().await?;

    Ok(())
}

async fn compare_command(config: AppConfig, venues: Option<&str>, pretty: bool) -> Result<()> {
    check_config(&config)?;
    let venues = select_venues(&config, venues)?;

    let report = compare::run_compare(
        &config.compare,
        &venues,
        DayTick::today(),
        config.proxy.timeout(),
    )
    .await?;

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    Ok(())
}

async fn probe_command(config: AppConfig, venues: Option<&str>, rows: Option<usize>) -> Result<()> {
    check_config(&config)?;
    let venues = select_venues(&config, venues)?;
    let rows = rows.unwrap_or(config.compare.candle_limit);

    let report =
        probe::run_probe(&config.compare, &venues, rows, config.proxy.timeout()).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.passed() {
        anyhow::bail!("One or more probes failed");
    }
    Ok(())
}

async fn validate_command<P: AsRef<Path>>(config_path: P) -> Result<()> {
    info!(path = ?config_path.as_ref(), "Validating configuration");

    let config = match load_config(&config_path) {
        Ok(c) => c,
        Err(e) => {
            error!(%e, "Failed to load configuration");
            anyhow::bail!(e);
        }
    };

    let report = validate_config(&config);

    println!("\n=== Configuration Validation Report ===\n");

    if !report.defaults_applied.is_empty() {
        println!("Defaults Applied ({}):", report.defaults_applied.len());
        for default in &report.defaults_applied {
            println!("  [info] {} = {}", default.field, default.value);
        }
        println!();
    }

    if !report.warnings.is_empty() {
        println!("Warnings ({}):", report.warnings.len());
        for warning in &report.warnings {
            println!("  [warn] [{}] {}", warning.field, warning.message);
        }
        println!();
    }

    if !report.errors.is_empty() {
        println!("Errors ({}):", report.errors.len());
        for err in &report.errors {
            println!("  [error] {}", err);
        }
        println!();
        anyhow::bail!("Configuration validation failed");
    }

    println!("[ok] Configuration is valid!");
    println!();
    println!("Listen: {}:{}", config.server.host, config.server.port);
    println!("Upstream timeout: {}ms", config.proxy.timeout_ms);
    println!("Enabled venues: {:?}", config.proxy.enabled_venues());
    println!("Compare proxy: {}", config.compare.proxy_url);
    println!("Window: {} days", config.compare.window_days);

    Ok(())
}

async fn init_command<P: AsRef<Path>>(output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!(?output_path, "Initializing new configuration file");

    let config = generate_default_config();

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    save_config(&config, output_path)?;

    println!("[ok] Configuration file created successfully!");
    println!();
    println!("Location: {:?}", output_path);
    println!();
    println!("This configuration includes:");
    println!("  - Server bind address and port");
    println!("  - Upstream base URL for {} venues", VenueKey::ALL.len());
    println!("  - Daily candle symbols for the compare command");
    println!();
    println!("Next steps:");
    println!(
        "  1. Run 'crossvenue validate --config {:?}' to check configuration",
        output_path
    );
    println!(
        "  2. Run 'crossvenue serve --config {:?}' to start the proxy",
        output_path
    );

    Ok(())
}
