//! Parse command implementation.
//!
//! Parses a saved `unbound-control stats_noreset` dump from a file or stdin,
//! which is handy for checking output without a running resolver.

use anyhow::{Context, Result};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use unbound_collector::output::{self, MACKEREL_META_ENV};
use unbound_collector::{snapshot, GraphCatalog, TracingDiagnostics};

use super::collect::{mackerel_meta_requested, render_metrics};
use crate::cli::OutputFormat;
use crate::config::Config;

/// Reads the dump from `input`, or from stdin when it is absent or `-`.
fn read_input(input: Option<&Path>) -> Result<String> {
    match input.filter(|p| p.to_string_lossy() != "-") {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read statistics from stdin")?;
            Ok(buf)
        }
    }
}

/// Renders a raw dump the same way a live collection would be rendered.
fn render_dump(raw: &str, format: OutputFormat, config: &Config, meta: bool) -> Result<String> {
    let prefix = config.prefix();
    let catalog = GraphCatalog::definitions(prefix);

    if format == OutputFormat::Mackerel && meta {
        debug!("{}=1, printing graph definitions", MACKEREL_META_ENV);
        return Ok(output::mackerel_meta(&catalog, prefix)?);
    }

    if raw.trim().is_empty() {
        warn!("Statistics input is empty, every metric will be reported as 0");
    }

    let set = snapshot(raw, &catalog, &TracingDiagnostics);
    render_metrics(format, &catalog, &set, prefix)
}

/// Parses a statistics dump and prints it in the requested format.
pub fn command_parse(input: Option<PathBuf>, format: OutputFormat, config: &Config) -> Result<()> {
    let raw = read_input(input.as_deref())?;
    debug!("Read {} bytes of statistics", raw.len());

    print!(
        "{}",
        render_dump(&raw, format, config, mackerel_meta_requested())?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DUMP: &str = "total_connections_received=4\r\n\
                        db0=keys=5,expires=2,avg_ttl=100\r\n\
                        db1=keys=3,expires=1,avg_ttl=50\r\n";

    fn render_json(raw: &str) -> serde_json::Value {
        let out = render_dump(raw, OutputFormat::Json, &Config::default(), false).unwrap();
        serde_json::from_str(&out).unwrap()
    }

    #[test]
    fn test_read_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DUMP.as_bytes()).unwrap();
        assert_eq!(read_input(Some(file.path())).unwrap(), DUMP);
    }

    #[test]
    fn test_read_input_missing_file_is_an_error() {
        let err = read_input(Some(Path::new("/nonexistent/stats.txt"))).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/stats.txt"));
    }

    #[test]
    fn test_render_dump_folds_shards() {
        let json = render_json(DUMP);
        assert_eq!(json["keys"], 8.0);
        assert_eq!(json["expires"], 3.0);
        assert_eq!(json["total_connections_received"], 4.0);
    }

    #[test]
    fn test_blank_dump_renders_zeros() {
        let json = render_json("  \r\n");
        assert_eq!(json["keys"], 0.0);
        assert_eq!(json["used_memory"], 0.0);
    }

    #[test]
    fn test_mackerel_values_use_prefix() {
        let config = Config {
            metric_key_prefix: Some("edge".into()),
            ..Config::default()
        };
        let out = render_dump(DUMP, OutputFormat::Mackerel, &config, false).unwrap();
        assert!(out.lines().any(|l| l.starts_with("edge.keys.keys\t8\t")));
    }

    #[test]
    fn test_mackerel_meta_ignores_input() {
        let out = render_dump("", OutputFormat::Mackerel, &Config::default(), true).unwrap();
        assert!(out.starts_with(output::MACKEREL_META_HEADER));
        assert!(out.contains("\"graphs\""));
    }

    #[test]
    fn test_meta_only_applies_to_mackerel() {
        let out = render_dump(DUMP, OutputFormat::Json, &Config::default(), true).unwrap();
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["keys"], 8.0);
    }
}
