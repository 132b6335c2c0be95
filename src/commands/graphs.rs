//! Graphs command implementation.
//!
//! Lists the graph sections the collector reports.

use anyhow::Result;
use unbound_collector::GraphCatalog;

use crate::config::Config;

/// Lists graph sections and their series.
pub fn command_graphs(verbose: bool, section: Option<String>, config: &Config) -> Result<()> {
    let prefix = config.prefix();
    let catalog = GraphCatalog::definitions(prefix);

    println!("📊 Unbound Collector - Graph Sections");
    println!("====================================");

    let mut shown = 0;
    for (name, graph) in catalog.sections() {
        if let Some(filter) = &section {
            if !name.contains(filter.as_str()) {
                continue;
            }
        }
        shown += 1;

        println!("\n🏷️  {}.{} - {}", prefix, name, graph.label);
        if verbose {
            println!("   unit: {:?}", graph.unit);
        }
        println!("{}", "─".repeat(50));

        for series in &graph.metrics {
            if verbose {
                println!(
                    "   ├─ {} ({}) diff={} stacked={}",
                    series.name, series.label, series.diff, series.stacked
                );
            } else {
                println!("   ├─ {} ({})", series.name, series.label);
            }
        }
    }

    println!(
        "\n📋 Total: {} of {} sections, {} series",
        shown,
        catalog.len(),
        catalog.metric_names().count()
    );

    Ok(())
}
