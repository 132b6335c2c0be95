//! Configuration management for unbound-collector.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use unbound_collector::ControlCommand;

use crate::cli::{Args, ConfigFormat};

// Default configuration constants
pub const DEFAULT_COMMAND: &str = "unbound-control";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8953;
pub const DEFAULT_CONF: &str = "/etc/unbound/unbound.conf";
pub const DEFAULT_PREFIX: &str = "unbound";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const DEFAULT_LOCATIONS: &[&str] = &[
    "/etc/unbound-collector/config.yaml",
    "/etc/unbound-collector/config.yml",
    "/etc/unbound-collector/config.json",
    "./unbound-collector.yaml",
    "./unbound-collector.yml",
    "./unbound-collector.json",
];

/// Collector configuration. Every field falls back to its default when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to unbound-control
    pub command: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Unbound config file passed with -c
    pub conf: Option<String>,
    /// Arguments appended after `-c <conf> -s <host>@<port>`
    pub args: Option<Vec<String>>,

    #[serde(alias = "metric-key-prefix")]
    pub metric_key_prefix: Option<String>,
    #[serde(alias = "timeout-secs")]
    pub timeout_secs: Option<u64>,

    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: Some(DEFAULT_COMMAND.into()),
            host: Some(DEFAULT_HOST.into()),
            port: Some(DEFAULT_PORT),
            conf: Some(DEFAULT_CONF.into()),
            args: Some(vec!["stats_noreset".into()]),
            metric_key_prefix: Some(DEFAULT_PREFIX.into()),
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn prefix(&self) -> &str {
        self.metric_key_prefix.as_deref().unwrap_or(DEFAULT_PREFIX)
    }

    /// Builds the control command invocation from the effective values.
    pub fn control_command(&self) -> ControlCommand {
        ControlCommand {
            program: self.command.clone().unwrap_or_else(|| DEFAULT_COMMAND.into()),
            conf: self.conf.clone().unwrap_or_else(|| DEFAULT_CONF.into()),
            host: self.host.clone().unwrap_or_else(|| DEFAULT_HOST.into()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            args: self
                .args
                .clone()
                .unwrap_or_else(|| vec!["stats_noreset".into()]),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<()> {
    if cfg.command.as_deref().is_some_and(|c| c.trim().is_empty()) {
        bail!("command must not be empty");
    }

    if cfg.host.as_deref().is_some_and(|h| h.trim().is_empty()) {
        bail!("host must not be empty");
    }

    if cfg.port == Some(0) {
        bail!("port must be between 1 and 65535");
    }

    if cfg.timeout_secs == Some(0) {
        bail!("timeout_secs must be greater than 0");
    }

    let prefix = cfg.prefix();
    if prefix.is_empty() {
        bail!("metric_key_prefix must not be empty");
    }
    if prefix.contains('.') || prefix.chars().any(char::is_whitespace) {
        bail!(
            "Invalid metric_key_prefix '{}': dots and whitespace are not allowed",
            prefix
        );
    }

    if let Some(level) = cfg.log_level.as_deref() {
        match level {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => {}
            other => bail!(
                "Invalid log_level '{}', expected off, error, warn, info, debug or trace",
                other
            ),
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(command) = &args.control_command {
        config.command = Some(command.clone());
    }
    if let Some(host) = &args.host {
        config.host = Some(host.clone());
    }
    if let Some(port) = args.port {
        config.port = Some(port);
    }
    if let Some(conf) = &args.conf {
        config.conf = Some(conf.clone());
    }
    if let Some(prefix) = &args.metric_key_prefix {
        config.metric_key_prefix = Some(prefix.clone());
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = Some(timeout);
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    Ok(config)
}

/// Loads a config file, falling back to the default locations and then to
/// built-in defaults. Fields missing from the file keep their defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                bail!("Config file not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => match DEFAULT_LOCATIONS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
        {
            Some(p) => p,
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let loaded: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?,
        // Default to YAML
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?,
    };
    info!("Loaded configuration from: {}", path.display());

    Ok(merge_defaults(loaded))
}

fn merge_defaults(loaded: Config) -> Config {
    let defaults = Config::default();
    Config {
        command: loaded.command.or(defaults.command),
        host: loaded.host.or(defaults.host),
        port: loaded.port.or(defaults.port),
        conf: loaded.conf.or(defaults.conf),
        args: loaded.args.or(defaults.args),
        metric_key_prefix: loaded.metric_key_prefix.or(defaults.metric_key_prefix),
        timeout_secs: loaded.timeout_secs.or(defaults.timeout_secs),
        log_level: loaded.log_level.or(defaults.log_level),
    }
}

/// Renders configuration in the requested format
pub fn render_config(config: &Config, format: &ConfigFormat) -> Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<()> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}
