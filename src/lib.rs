//! Unbound statistics collector library
//!
//! This library turns the text printed by `unbound-control stats_noreset`
//! into a typed metric set and describes how the metrics are graphed. It is
//! framework-agnostic: the binary in this crate prints the result for
//! mackerel-agent or Prometheus, but the parser and catalog can be used on
//! their own.
//!
//! # Usage
//!
//! ```rust
//! use unbound_collector::{parse, GraphCatalog, TracingDiagnostics};
//!
//! let raw = "total_commands_processed=10\r\ndb0=keys=5,expires=2,avg_ttl=100\r\n";
//! let mut metrics = parse(raw, &TracingDiagnostics);
//! assert_eq!(metrics.get("keys"), Some(5.0));
//!
//! let catalog = GraphCatalog::definitions("unbound");
//! catalog.backfill(&mut metrics);
//! for (section, graph) in catalog.sections() {
//!     println!("{}: {} series", section, graph.metrics.len());
//! }
//! ```

pub mod collector;
pub mod control;
pub mod diagnostics;
pub mod graph;
pub mod output;
pub mod stats;

// Re-export main types for convenience
pub use collector::{snapshot, Collector};
pub use control::{CollectError, ControlCommand};
pub use diagnostics::{Diagnostics, SilentDiagnostics, TracingDiagnostics};
pub use graph::{GraphCatalog, GraphSpec, SeriesSpec, Unit};
pub use stats::{classify, parse, MetricSet, StatRecord};
