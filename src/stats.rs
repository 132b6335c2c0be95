//! Parser for `unbound-control` statistics output.
//!
//! The control command prints one `key=value` record per line, terminated by
//! CRLF. Shard records (`db0`, `db1`, ...) pack several sub-counters into the
//! value (`keys=5,expires=2,avg_ttl=100`) and are folded into the two totals
//! `keys` and `expires` instead of being emitted per shard.

use ahash::AHashMap as HashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::diagnostics::Diagnostics;

/// Total live keys across all shards.
pub const KEYS: &str = "keys";
/// Total keys with an expiration set across all shards.
pub const EXPIRES: &str = "expires";
/// Keys expired so far, copied from [`EXPIRED_KEYS`].
pub const EXPIRED: &str = "expired";
/// Upstream counter that `expired` is derived from. Older servers omit it.
pub const EXPIRED_KEYS: &str = "expired_keys";

static SHARD_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^db[0-9]+$").expect("shard key pattern is valid"));

/// Metric name to value, built fresh by every [`parse`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSet {
    values: HashMap<String, f64>,
}

impl MetricSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a metric.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for MetricSet {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut set = MetricSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Why a shard sub-field could not be used.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubfieldError {
    #[error("sub-field missing")]
    Missing,

    #[error("no '=' in sub-field {0:?}")]
    NoSeparator(String),

    #[error("invalid number {0:?}")]
    NotANumber(String),
}

/// One classified line of control-command output.
#[derive(Debug, Clone, PartialEq)]
pub enum StatRecord<'a> {
    /// `key=<number>`
    Simple { key: &'a str, value: f64 },
    /// `db<N>=keys=<n>,expires=<n>,...`, only the first two sub-fields are read.
    Shard {
        key: &'a str,
        keys: Result<f64, SubfieldError>,
        expires: Result<f64, SubfieldError>,
    },
    /// No separator, or a value that is not a finite number.
    Malformed,
}

/// Classifies a single line. Never fails; unusable lines become `Malformed`.
pub fn classify(line: &str) -> StatRecord<'_> {
    let Some((key, value)) = line.split_once('=') else {
        return StatRecord::Malformed;
    };
    if key.is_empty() {
        return StatRecord::Malformed;
    }

    if SHARD_KEY.is_match(key) {
        let mut fields = value.split(',');
        return StatRecord::Shard {
            key,
            keys: parse_subfield(fields.next()),
            expires: parse_subfield(fields.next()),
        };
    }

    match value.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => StatRecord::Simple { key, value },
        _ => StatRecord::Malformed,
    }
}

fn parse_subfield(field: Option<&str>) -> Result<f64, SubfieldError> {
    let field = field.ok_or(SubfieldError::Missing)?;
    let (_, raw) = field
        .split_once('=')
        .ok_or_else(|| SubfieldError::NoSeparator(field.to_string()))?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SubfieldError::NotANumber(raw.to_string()))
}

/// Parses raw statistics text into a [`MetricSet`].
///
/// Malformed lines are skipped. Shard sub-fields that cannot be parsed are
/// reported through `diag` and count as 0. The result always contains
/// `keys`, `expires` and `expired`.
pub fn parse(raw: &str, diag: &dyn Diagnostics) -> MetricSet {
    let mut set = MetricSet::new();
    let mut keys_total = 0.0;
    let mut expires_total = 0.0;

    for line in raw.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);

        match classify(line) {
            StatRecord::Simple { key, value } => set.insert(key, value),
            StatRecord::Shard { key, keys, expires } => {
                keys_total += subfield_or_zero(key, "keys", keys, diag);
                expires_total += subfield_or_zero(key, "expires", expires, diag);
            }
            StatRecord::Malformed => {}
        }
    }

    set.insert(KEYS, keys_total);
    set.insert(EXPIRES, expires_total);

    let expired = set.get(EXPIRED_KEYS).unwrap_or(0.0);
    set.insert(EXPIRED, expired);
    set
}

fn subfield_or_zero(
    shard: &str,
    field: &str,
    value: Result<f64, SubfieldError>,
    diag: &dyn Diagnostics,
) -> f64 {
    value.unwrap_or_else(|e| {
        diag.warn(&format!("Failed to parse {} {}: {}", shard, field, e));
        0.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SilentDiagnostics;

    #[test]
    fn test_classify_simple() {
        assert_eq!(
            classify("total_connections_received=42"),
            StatRecord::Simple {
                key: "total_connections_received",
                value: 42.0
            }
        );
    }

    #[test]
    fn test_classify_malformed() {
        assert_eq!(classify("foo"), StatRecord::Malformed);
        assert_eq!(classify("version=1.19.0"), StatRecord::Malformed);
        assert_eq!(classify(""), StatRecord::Malformed);
        assert_eq!(classify("=3"), StatRecord::Malformed);
    }

    #[test]
    fn test_classify_shard_reads_first_two_subfields() {
        match classify("db3=keys=7,expires=1,avg_ttl=100") {
            StatRecord::Shard { key, keys, expires } => {
                assert_eq!(key, "db3");
                assert_eq!(keys, Ok(7.0));
                assert_eq!(expires, Ok(1.0));
            }
            other => panic!("expected shard record, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_shard_missing_expires() {
        match classify("db0=keys=7") {
            StatRecord::Shard { keys, expires, .. } => {
                assert_eq!(keys, Ok(7.0));
                assert_eq!(expires, Err(SubfieldError::Missing));
            }
            other => panic!("expected shard record, got {:?}", other),
        }
    }

    #[test]
    fn test_dbsize_is_not_a_shard() {
        assert_eq!(
            classify("dbsize=12"),
            StatRecord::Simple {
                key: "dbsize",
                value: 12.0
            }
        );
    }

    #[test]
    fn test_value_keeps_everything_after_first_separator() {
        // Only the first '=' splits; "1=2" is not a number.
        assert_eq!(classify("a=1=2"), StatRecord::Malformed);
    }

    #[test]
    fn test_parse_accepts_bare_newlines() {
        let set = parse("a=1\nb=2\n", &SilentDiagnostics);
        assert_eq!(set.get("a"), Some(1.0));
        assert_eq!(set.get("b"), Some(2.0));
    }

    #[test]
    fn test_capacity_values_pass_through_unchanged() {
        let raw = "used_memory=50\r\nmaxmemory=200\r\npercentage_of_memory=7\r\n";
        let set = parse(raw, &SilentDiagnostics);
        assert_eq!(set.get("percentage_of_memory"), Some(7.0));
    }

    #[test]
    fn test_no_metrics_invented_from_limits() {
        let set = parse("used_memory=50\r\nmaxmemory=200\r\n", &SilentDiagnostics);
        assert_eq!(set.len(), 5);
        assert!(!set.contains("percentage_of_memory"));
    }

    #[test]
    fn test_non_finite_values_are_malformed() {
        assert_eq!(classify("a=NaN"), StatRecord::Malformed);
        assert_eq!(classify("a=inf"), StatRecord::Malformed);
        assert_eq!(classify("a=-infinity"), StatRecord::Malformed);
    }

    #[test]
    fn test_non_finite_shard_subfield_is_rejected() {
        match classify("db0=keys=NaN,expires=inf") {
            StatRecord::Shard { keys, expires, .. } => {
                assert_eq!(keys, Err(SubfieldError::NotANumber("NaN".to_string())));
                assert_eq!(expires, Err(SubfieldError::NotANumber("inf".to_string())));
            }
            other => panic!("expected shard record, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_with_nan_is_idempotent() {
        let raw = "a=NaN\r\nb=2\r\n";
        assert_eq!(parse(raw, &SilentDiagnostics), parse(raw, &SilentDiagnostics));
        assert!(!parse(raw, &SilentDiagnostics).contains("a"));
    }
}
