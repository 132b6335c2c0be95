//! One collection pass: fetch, parse, backfill.

use tracing::debug;

use crate::control::{CollectError, ControlCommand};
use crate::diagnostics::Diagnostics;
use crate::graph::GraphCatalog;
use crate::stats::{self, MetricSet};

/// Turns raw control-command output into a set that covers the whole catalog.
pub fn snapshot(raw: &str, catalog: &GraphCatalog, diag: &dyn Diagnostics) -> MetricSet {
    let mut set = stats::parse(raw, diag);
    let parsed = set.len();
    catalog.backfill(&mut set);
    debug!(
        "Parsed {} metrics, {} after catalog backfill",
        parsed,
        set.len()
    );
    set
}

/// Fetches statistics from the control command and parses them.
pub struct Collector {
    command: ControlCommand,
    catalog: GraphCatalog,
}

impl Collector {
    pub fn new(command: ControlCommand, catalog: GraphCatalog) -> Self {
        Self { command, catalog }
    }

    pub fn catalog(&self) -> &GraphCatalog {
        &self.catalog
    }

    /// Runs one collection. A failing command yields no metrics at all.
    pub fn collect(&self, diag: &dyn Diagnostics) -> Result<MetricSet, CollectError> {
        debug!("Collecting statistics from {}", self.command.server());
        let raw = self.command.fetch()?;
        Ok(snapshot(&raw, &self.catalog, diag))
    }
}
