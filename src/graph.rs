//! Graph definitions reported alongside the metrics.
//!
//! The catalog is the single source of truth for what the collector reports:
//! every emitted metric belongs to exactly one series of one section, and
//! [`GraphCatalog::backfill`] makes sure each of them has a value.

use serde::Serialize;

use crate::stats::{MetricSet, EXPIRED, EXPIRES, KEYS};

/// Display unit of a graph section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Integer,
    Percentage,
}

/// One line of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesSpec {
    pub name: &'static str,
    pub label: &'static str,
    /// Monotonic counter; the backend displays the delta between samples.
    pub diff: bool,
    pub stacked: bool,
}

/// A named group of series displayed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphSpec {
    pub label: String,
    pub unit: Unit,
    pub metrics: Vec<SeriesSpec>,
}

/// Immutable table of graph sections, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphCatalog {
    sections: Vec<(&'static str, GraphSpec)>,
}

const fn counter(name: &'static str, label: &'static str, stacked: bool) -> SeriesSpec {
    SeriesSpec {
        name,
        label,
        diff: true,
        stacked,
    }
}

const fn gauge(name: &'static str, label: &'static str, stacked: bool) -> SeriesSpec {
    SeriesSpec {
        name,
        label,
        diff: false,
        stacked,
    }
}

impl GraphCatalog {
    /// Builds the catalog, prefixing every section label with the title-cased
    /// `prefix` (`"unbound"` gives `"Unbound Total"`).
    pub fn definitions(prefix: &str) -> Self {
        let label_prefix = title_case(prefix);
        let section = |title: &str, unit: Unit, metrics: Vec<SeriesSpec>| GraphSpec {
            label: format!("{} {}", label_prefix, title).trim().to_string(),
            unit,
            metrics,
        };

        let sections = vec![
            (
                "total",
                section(
                    "Total",
                    Unit::Integer,
                    vec![counter("total_commands_processed", "Queries", false)],
                ),
            ),
            (
                "connections",
                section(
                    "Connections",
                    Unit::Integer,
                    vec![
                        counter("total_connections_received", "Connections", true),
                        counter("rejected_connections", "Rejected Connections", true),
                    ],
                ),
            ),
            (
                "clients",
                section(
                    "Clients",
                    Unit::Integer,
                    vec![
                        gauge("connected_clients", "Connected Clients", true),
                        gauge("blocked_clients", "Blocked Clients", true),
                        gauge("connected_slaves", "Connected Slaves", true),
                    ],
                ),
            ),
            (
                "keys",
                section("Keys", Unit::Integer, vec![gauge(KEYS, "Keys", false)]),
            ),
            (
                "expiry",
                section(
                    "Expiry",
                    Unit::Integer,
                    vec![
                        gauge(EXPIRES, "Keys with expiration", false),
                        gauge(EXPIRED, "Expired Keys", false),
                    ],
                ),
            ),
            (
                "keyspace",
                section(
                    "Keyspace",
                    Unit::Integer,
                    vec![
                        counter("keyspace_hits", "Keyspace Hits", false),
                        counter("keyspace_misses", "Keyspace Missed", false),
                    ],
                ),
            ),
            (
                "memory",
                section(
                    "Memory",
                    Unit::Integer,
                    vec![
                        gauge("used_memory", "Used Memory", false),
                        gauge("used_memory_rss", "Used Memory RSS", false),
                        gauge("used_memory_peak", "Used Memory Peak", false),
                        gauge("used_memory_lua", "Used Memory Lua engine", false),
                    ],
                ),
            ),
            (
                "capacity",
                section(
                    "Capacity",
                    Unit::Percentage,
                    vec![
                        gauge("percentage_of_memory", "Percentage of memory", false),
                        gauge("percentage_of_clients", "Percentage of clients", false),
                    ],
                ),
            ),
        ];

        Self { sections }
    }

    /// Sections in display order.
    pub fn sections(&self) -> impl Iterator<Item = (&'static str, &GraphSpec)> {
        self.sections.iter().map(|(name, spec)| (*name, spec))
    }

    pub fn get(&self, section: &str) -> Option<&GraphSpec> {
        self.sections
            .iter()
            .find(|(name, _)| *name == section)
            .map(|(_, spec)| spec)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Every metric name referenced by any series.
    pub fn metric_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sections
            .iter()
            .flat_map(|(_, spec)| spec.metrics.iter().map(|m| m.name))
    }

    /// Inserts 0 for every referenced metric missing from `set`.
    pub fn backfill(&self, set: &mut MetricSet) {
        for name in self.metric_names() {
            if !set.contains(name) {
                set.insert(name, 0.0);
            }
        }
    }
}

/// Upper-cases the first letter of every word, leaving the rest untouched.
///
/// Words are split by whitespace and by ASCII punctuation other than `_`, so
/// `edge-dns` becomes `Edge-Dns` while `edge_dns` stays one word.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;

    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = is_word_separator(c);
    }

    out
}

fn is_word_separator(c: char) -> bool {
    if c.is_ascii() {
        !(c.is_ascii_alphanumeric() || c == '_')
    } else if c.is_alphanumeric() {
        false
    } else {
        c.is_whitespace()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("unbound"), "Unbound");
        assert_eq!(title_case("my resolver"), "My Resolver");
        assert_eq!(title_case("edge-dns_01"), "Edge-Dns_01");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_title_case_word_separators() {
        assert_eq!(title_case("edge_dns"), "Edge_dns");
        assert_eq!(title_case("a:b/c"), "A:B/C");
        assert_eq!(title_case("dns.edge"), "Dns.Edge");
        assert_eq!(title_case("été résolveur"), "Été Résolveur");
        assert_eq!(title_case("zone\u{00a0}one"), "Zone\u{00a0}One");
    }

    #[test]
    fn test_section_labels_use_prefix() {
        let catalog = GraphCatalog::definitions("unbound");
        assert_eq!(catalog.get("total").map(|g| g.label.as_str()), Some("Unbound Total"));
        assert_eq!(
            catalog.get("capacity").map(|g| g.label.as_str()),
            Some("Unbound Capacity")
        );
    }

    #[test]
    fn test_empty_prefix_has_no_leading_space() {
        let catalog = GraphCatalog::definitions("");
        assert_eq!(catalog.get("memory").map(|g| g.label.as_str()), Some("Memory"));
    }

    #[test]
    fn test_units() {
        let catalog = GraphCatalog::definitions("unbound");
        for (name, spec) in catalog.sections() {
            let expected = if name == "capacity" {
                Unit::Percentage
            } else {
                Unit::Integer
            };
            assert_eq!(spec.unit, expected, "unexpected unit for {}", name);
        }
    }

    #[test]
    fn test_metric_names_unique() {
        let catalog = GraphCatalog::definitions("unbound");
        let mut names: Vec<_> = catalog.metric_names().collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn test_backfill_keeps_existing_values() {
        let catalog = GraphCatalog::definitions("unbound");
        let mut set: MetricSet = [("keyspace_hits", 9.0)].into_iter().collect();
        catalog.backfill(&mut set);
        assert_eq!(set.get("keyspace_hits"), Some(9.0));
        assert_eq!(set.get("keyspace_misses"), Some(0.0));
    }

    #[test]
    fn test_unit_serializes_lowercase() {
        let json = serde_json::to_string(&Unit::Percentage).unwrap();
        assert_eq!(json, "\"percentage\"");
    }
}
