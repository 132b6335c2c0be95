//! Default command: collect once and print.
//!
//! Runs unbound-control, parses its statistics and writes the metrics to
//! stdout in the selected format.

use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Instant;
use tracing::debug;
use unbound_collector::output::{self, MACKEREL_META_ENV};
use unbound_collector::{Collector, GraphCatalog, MetricSet, TracingDiagnostics};

use crate::cli::OutputFormat;
use crate::config::Config;

/// Whether mackerel-agent is asking for graph definitions instead of values.
pub fn mackerel_meta_requested() -> bool {
    std::env::var(MACKEREL_META_ENV).is_ok_and(|v| v == "1")
}

/// Renders a backfilled metric set in the requested format.
pub fn render_metrics(
    format: OutputFormat,
    catalog: &GraphCatalog,
    set: &MetricSet,
    prefix: &str,
) -> Result<String> {
    let rendered = match format {
        OutputFormat::Mackerel => {
            output::mackerel_values(catalog, set, prefix, Utc::now().timestamp())
        }
        OutputFormat::Prometheus => output::prometheus_text(catalog, set, prefix)?,
        OutputFormat::Json => output::json(catalog, set)?,
    };
    Ok(rendered)
}

/// Collects statistics once and prints them.
pub fn command_collect(format: OutputFormat, config: &Config) -> Result<()> {
    let prefix = config.prefix();
    let catalog = GraphCatalog::definitions(prefix);

    // Graph definitions do not need the resolver to be reachable.
    if format == OutputFormat::Mackerel && mackerel_meta_requested() {
        debug!("{}=1, printing graph definitions", MACKEREL_META_ENV);
        print!("{}", output::mackerel_meta(&catalog, prefix)?);
        return Ok(());
    }

    let start = Instant::now();
    let collector = Collector::new(config.control_command(), catalog);
    let set = collector
        .collect(&TracingDiagnostics)
        .context("Failed to fetch statistics")?;

    print!(
        "{}",
        render_metrics(format, collector.catalog(), &set, prefix)?
    );

    debug!(
        "Collected {} metrics in {:.2}ms",
        set.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}
