//! Rendering of a metric snapshot for the monitoring backend.
//!
//! Every format walks the [`GraphCatalog`], so only catalogued metrics are
//! reported. Callers are expected to pass a set that has been backfilled.

use prometheus::{Counter, Encoder, Gauge, Opts, Registry, TextEncoder};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::graph::{GraphCatalog, GraphSpec};
use crate::stats::MetricSet;

/// First line of the graph definition output understood by mackerel-agent.
pub const MACKEREL_META_HEADER: &str = "# mackerel-agent-plugin";

/// Environment variable mackerel-agent sets when it asks for graph definitions.
pub const MACKEREL_META_ENV: &str = "MACKEREL_AGENT_PLUGIN_META";

/// Errors raised while rendering output.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Prometheus encoding failed: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Encoded output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Serialize)]
struct MackerelMeta<'a> {
    graphs: BTreeMap<String, &'a GraphSpec>,
}

/// Mackerel plugin protocol: `<prefix>.<section>.<metric>\t<value>\t<epoch>`.
pub fn mackerel_values(
    catalog: &GraphCatalog,
    set: &MetricSet,
    prefix: &str,
    epoch: i64,
) -> String {
    let mut out = String::new();
    for (section, spec) in catalog.sections() {
        for series in &spec.metrics {
            let value = set.get(series.name).unwrap_or(0.0);
            out.push_str(&format!(
                "{}.{}.{}\t{}\t{}\n",
                prefix, section, series.name, value, epoch
            ));
        }
    }
    out
}

/// Graph definitions in the JSON shape mackerel-agent expects, header included.
pub fn mackerel_meta(catalog: &GraphCatalog, prefix: &str) -> Result<String, OutputError> {
    let graphs = catalog
        .sections()
        .map(|(section, spec)| (format!("{}.{}", prefix, section), spec))
        .collect();
    let json = serde_json::to_string(&MackerelMeta { graphs })?;
    Ok(format!("{}\n{}\n", MACKEREL_META_HEADER, json))
}

/// Prometheus text exposition. Diff series become counters, the rest gauges.
pub fn prometheus_text(
    catalog: &GraphCatalog,
    set: &MetricSet,
    prefix: &str,
) -> Result<String, OutputError> {
    let registry = Registry::new();
    let namespace = sanitize_metric_name(prefix);

    for (_, spec) in catalog.sections() {
        for series in &spec.metrics {
            let value = set.get(series.name).unwrap_or(0.0);
            let opts = Opts::new(series.name, series.label).namespace(namespace.clone());

            if series.diff && value >= 0.0 {
                let counter = Counter::with_opts(opts)?;
                counter.inc_by(value);
                registry.register(Box::new(counter))?;
            } else {
                let gauge = Gauge::with_opts(opts)?;
                gauge.set(value);
                registry.register(Box::new(gauge))?;
            }
        }
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// The catalogued metrics as a JSON object ordered by name.
pub fn json(catalog: &GraphCatalog, set: &MetricSet) -> Result<String, OutputError> {
    let values: BTreeMap<&str, f64> = catalog
        .metric_names()
        .map(|name| (name, set.get(name).unwrap_or(0.0)))
        .collect();
    Ok(serde_json::to_string_pretty(&values)?)
}

/// Replaces characters Prometheus does not allow in metric names with `_`.
pub fn sanitize_metric_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backfilled(pairs: &[(&str, f64)]) -> (GraphCatalog, MetricSet) {
        let catalog = GraphCatalog::definitions("unbound");
        let mut set: MetricSet = pairs.iter().map(|(k, v)| (*k, *v)).collect();
        catalog.backfill(&mut set);
        (catalog, set)
    }

    #[test]
    fn test_mackerel_values_line_format() {
        let (catalog, set) = backfilled(&[("keyspace_hits", 12.0)]);
        let out = mackerel_values(&catalog, &set, "unbound", 1_700_000_000);
        assert!(out.contains("unbound.keyspace.keyspace_hits\t12\t1700000000\n"));
        assert!(out.contains("unbound.keys.keys\t0\t1700000000\n"));
        assert_eq!(out.lines().count(), catalog.metric_names().count());
    }

    #[test]
    fn test_mackerel_meta_shape() {
        let catalog = GraphCatalog::definitions("unbound");
        let out = mackerel_meta(&catalog, "unbound").unwrap();
        let (header, body) = out.split_once('\n').unwrap();
        assert_eq!(header, MACKEREL_META_HEADER);

        let meta: serde_json::Value = serde_json::from_str(body.trim()).unwrap();
        let total = &meta["graphs"]["unbound.total"];
        assert_eq!(total["label"], "Unbound Total");
        assert_eq!(total["unit"], "integer");
        assert_eq!(total["metrics"][0]["name"], "total_commands_processed");
        assert_eq!(total["metrics"][0]["diff"], true);
        assert_eq!(meta["graphs"]["unbound.capacity"]["unit"], "percentage");
    }

    #[test]
    fn test_prometheus_counters_and_gauges() {
        let (catalog, set) =
            backfilled(&[("total_commands_processed", 5.0), ("used_memory", 1024.0)]);
        let out = prometheus_text(&catalog, &set, "unbound").unwrap();
        assert!(out.contains("# TYPE unbound_total_commands_processed counter"));
        assert!(out.contains("unbound_total_commands_processed 5"));
        assert!(out.contains("# TYPE unbound_used_memory gauge"));
        assert!(out.contains("unbound_used_memory 1024"));
    }

    #[test]
    fn test_json_contains_every_catalog_metric() {
        let (catalog, set) = backfilled(&[("keys", 8.0)]);
        let out = json(&catalog, &set).unwrap();
        let parsed: BTreeMap<String, f64> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.get("keys"), Some(&8.0));
        for name in catalog.metric_names() {
            assert!(parsed.contains_key(name), "missing {}", name);
        }
    }

    #[test]
    fn test_sanitize_metric_name() {
        assert_eq!(sanitize_metric_name("edge-dns"), "edge_dns");
        assert_eq!(sanitize_metric_name("1st"), "_1st");
        assert_eq!(sanitize_metric_name("unbound"), "unbound");
    }
}
