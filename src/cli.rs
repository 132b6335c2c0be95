//! CLI arguments and subcommands for unbound-collector.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Metric output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// mackerel-agent plugin protocol (graph definitions when MACKEREL_AGENT_PLUGIN_META=1)
    Mackerel,
    /// Prometheus text exposition
    Prometheus,
    /// JSON object of metric values
    Json,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "unbound-collector",
    about = "Collects Unbound resolver statistics for mackerel-agent and Prometheus",
    long_about = "Collects Unbound resolver statistics for mackerel-agent and Prometheus.\n\n\
                  Runs unbound-control once, parses its key=value statistics, aggregates \
                  per-shard key counts and prints the metrics together with their graph \
                  definitions.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the unbound-control executable
    #[arg(long = "command")]
    pub control_command: Option<String>,

    /// Control interface host
    #[arg(long)]
    pub host: Option<String>,

    /// Control interface port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Unbound config file passed to unbound-control -c
    #[arg(long)]
    pub conf: Option<String>,

    /// Metric key prefix (also title-cased into graph labels)
    #[arg(long)]
    pub metric_key_prefix: Option<String>,

    /// Seconds to wait for unbound-control before giving up
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "mackerel")]
    pub format: OutputFormat,

    /// Log level (overrides log_level from the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// List graph sections and their series
    Graphs {
        /// Show units and diff/stacked flags
        #[arg(long)]
        verbose: bool,

        /// Filter by section name
        #[arg(short = 's', long)]
        section: Option<String>,
    },

    /// Parse a saved statistics dump instead of running unbound-control
    Parse {
        /// Input file ("-" or omitted for stdin)
        input: Option<PathBuf>,
    },
}
