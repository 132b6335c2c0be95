//! Config command implementation.
//!
//! Generates configuration files in various formats.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<()> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from("unbound-collector.yaml"));

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Unbound Collector Configuration
# ===============================
#
# Control Command
# ---------------
# command: "unbound-control"           # Path to unbound-control
# host: "127.0.0.1"                    # Control interface address
# port: 8953                           # Control interface port
# conf: "/etc/unbound/unbound.conf"    # Passed to unbound-control -c
# args: ["stats_noreset"]              # Appended after -c/-s
# timeout_secs: 10                     # Kill unbound-control after N seconds
#
# Output
# ------
# metric_key_prefix: "unbound"         # Metric key prefix, title-cased into graph labels
#
# Logging
# -------
# log_level: "info"                    # off, error, warn, info, debug, trace (stderr)
"#;

    format!("{comments}\n{yaml}")
}
