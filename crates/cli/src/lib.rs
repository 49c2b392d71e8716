use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "crossvenue")]
#[command(about = "Crossvenue - multi-venue crypto market data proxy and comparison")]
#[command(version)]
pub struct Cli {
    /// Log output format (overrides logging.format from the config)
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the exchange proxy server
    Serve {
        /// Path to the configuration file (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override server.host
        #[arg(long)]
        host: Option<String>,

        /// Override server.port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Compare daily closes across venues through the proxy
    Compare {
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Comma-separated venues (default: all enabled venues)
        #[arg(long)]
        venues: Option<String>,

        /// Override compare.proxy_url
        #[arg(long)]
        proxy_url: Option<String>,

        /// Override compare.window_days
        #[arg(long)]
        days: Option<usize>,

        /// How rows with unusable timestamps are handled
        #[arg(long, value_enum)]
        timestamp_policy: Option<TimestampPolicyArg>,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
    },

    /// Check ticker and candle response shapes for each venue through the proxy
    Probe {
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Comma-separated venues (default: all enabled venues)
        #[arg(long)]
        venues: Option<String>,

        /// Override compare.proxy_url
        #[arg(long)]
        proxy_url: Option<String>,

        /// Candle rows to request (default: compare.candle_limit)
        #[arg(long)]
        rows: Option<usize>,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "crossvenue.yaml")]
        config: PathBuf,
    },

    /// Write a configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "crossvenue.yaml")]
        output: PathBuf,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Serve { .. } => "serve",
            Commands::Compare { .. } => "compare",
            Commands::Probe { .. } => "probe",
            Commands::Validate { .. } => "validate",
            Commands::Init { .. } => "init",
        }
    }

    /// Config file to load before running, if the command takes one.
    pub fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Commands::Serve { config, .. }
            | Commands::Compare { config, .. }
            | Commands::Probe { config, .. } => config.as_ref(),
            Commands::Validate { .. } | Commands::Init { .. } => None,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Human-readable, colored
    Pretty,
    /// One JSON object per line
    Json,
    /// Single-line
    Compact,
}

impl LogFormatArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormatArg::Pretty => "pretty",
            LogFormatArg::Json => "json",
            LogFormatArg::Compact => "compact",
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimestampPolicyArg {
    /// Drop the row and log a warning
    Skip,
    /// Fail the venue's normalization
    Strict,
    /// Place the row on the epoch day
    Sentinel,
}

impl TimestampPolicyArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampPolicyArg::Skip => "skip",
            TimestampPolicyArg::Strict => "strict",
            TimestampPolicyArg::Sentinel => "sentinel",
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compare_args() {
        let cli = Cli::try_parse_from([
            "crossvenue",
            "compare",
            "--venues",
            "binance,okx",
            "--days",
            "14",
            "--timestamp-policy",
            "strict",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_format, Some(LogFormatArg::Json));
        assert_eq!(cli.command.name(), "compare");
        match cli.command {
            Commands::Compare {
                venues,
                days,
                timestamp_policy,
                pretty,
                ..
            } => {
                assert_eq!(venues.as_deref(), Some("binance,okx"));
                assert_eq!(days, Some(14));
                assert_eq!(timestamp_policy, Some(TimestampPolicyArg::Strict));
                assert!(!pretty);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["crossvenue", "validate"]).unwrap();
        assert!(cli.log_format.is_none());
        assert!(cli.command.config_path().is_none());
        match cli.command {
            Commands::Validate { config } => assert_eq!(config, PathBuf::from("crossvenue.yaml")),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["crossvenue", "serve", "-c", "prod.yaml", "--port", "0"]).unwrap();
        assert_eq!(cli.command.config_path(), Some(&PathBuf::from("prod.yaml")));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["crossvenue", "compare", "--timestamp-policy", "lenient"]).is_err());
    }
}
