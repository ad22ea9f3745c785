//! Counters describing what the charts driver did with its input.
//!
//! Built-in counters are created on first increment. Custom metrics implement
//! [`Metric`] and are registered alongside them; everything is exported as one
//! JSON object.
//!
//! # Example
//!
//! ```
//! use ironrank::metrics::{Metric, MetricsCollector};
//! use serde_json::Value;
//!
//! struct Partitions(u32);
//!
//! impl Metric for Partitions {
//!     fn name(&self) -> &str {
//!         "partitions"
//!     }
//!
//!     fn value(&self) -> Value {
//!         serde_json::json!(self.0)
//!     }
//! }
//!
//! let mut metrics = MetricsCollector::new();
//! metrics.register(Box::new(Partitions(4)));
//! metrics.increment_counter("plays_received", 2);
//! assert_eq!(metrics.to_json()["plays_received"]["value"], 2);
//! assert_eq!(metrics.to_json()["partitions"]["value"], 4);
//! ```

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Play events offered to the driver.
pub const PLAYS_RECEIVED: &str = "plays_received";
/// Plays dropped for being shorter than the chartable minimum.
pub const PLAYS_FILTERED: &str = "plays_filtered";
/// Plays dropped because the song is not in the song table.
pub const PLAYS_UNKNOWN_SONG: &str = "plays_unknown_song";
/// Aggregate updates written to a store.
pub const CHART_UPDATES: &str = "chart_updates";
/// Retractions routed to an aggregate.
pub const RETRACTIONS: &str = "retractions";

/// A named value reported alongside the built-in counters.
pub trait Metric: Send + Sync {
    /// The name of this metric (e.g., `plays_received`).
    fn name(&self) -> &str;

    /// The current value of this metric as a JSON value.
    fn value(&self) -> Value;

    /// Optional description of what this metric measures.
    fn description(&self) -> Option<&str> {
        None
    }
}

/// A monotonically increasing count.
#[derive(Clone, Debug)]
pub struct CounterMetric {
    name: String,
    count: u64,
}

impl CounterMetric {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_value(name, 0)
    }

    pub fn with_value(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Metric for CounterMetric {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Value {
        json!(self.count)
    }
}

/// Owned collection of counters and custom metrics.
#[derive(Default)]
pub struct MetricsCollector {
    counters: BTreeMap<String, CounterMetric>,
    custom: BTreeMap<String, Box<dyn Metric>>,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom metric, replacing any metric with the same name.
    pub fn register(&mut self, metric: Box<dyn Metric>) {
        self.custom.insert(metric.name().to_string(), metric);
    }

    /// Add `value` to the counter `name`, creating it at zero first if needed.
    pub fn increment_counter(&mut self, name: &str, value: u64) {
        self.counters
            .entry(name.to_string())
            .or_insert_with(|| CounterMetric::new(name))
            .count += value;
    }

    /// Current value of a counter; zero if it was never incremented.
    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).map_or(0, CounterMetric::count)
    }

    /// All metrics as `{ name: { "value": .., "description"?: .. } }`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut out = Map::new();
        for counter in self.counters.values() {
            insert_metric(&mut out, counter);
        }
        for metric in self.custom.values() {
            insert_metric(&mut out, metric.as_ref());
        }
        Value::Object(out)
    }

    /// Snapshot of every metric's value, keyed by name.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        let mut out: BTreeMap<String, Value> = self
            .counters
            .iter()
            .map(|(name, c)| (name.clone(), c.value()))
            .collect();
        out.extend(self.custom.iter().map(|(name, m)| (name.clone(), m.value())));
        out
    }

    /// Save all metrics to a pretty-printed JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        file.write_all(formatted.as_bytes())
            .with_context(|| format!("write metrics to {}", path.display()))?;
        Ok(())
    }
}

fn insert_metric(out: &mut Map<String, Value>, metric: &dyn Metric) {
    let mut obj = Map::new();
    obj.insert("value".to_string(), metric.value());
    if let Some(desc) = metric.description() {
        obj.insert("description".to_string(), json!(desc));
    }
    out.insert(metric.name().to_string(), Value::Object(obj));
}
