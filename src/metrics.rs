//! Driver counters: connections, schema setups, errors and per-format usage.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Aggregate line is logged every this many connections.
pub const AGGREGATE_EVERY: u64 = 10;

#[derive(Debug, Default)]
pub struct DriverMetrics {
    connections: AtomicU64,
    schema_setups: AtomicU64,
    errors: AtomicU64,
    format_usage: RwLock<BTreeMap<String, u64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub connections: u64,
    pub schema_setups: u64,
    pub errors: u64,
    pub format_usage: BTreeMap<String, u64>,
    pub initialized_schemas: usize,
}

impl DriverMetrics {
    pub fn new() -> Self { Self::default() }

    /// Count a connection attempt; returns the new total.
    pub fn record_connection(&self, initialized_schemas: usize) -> u64 {
        let n = self.connections.fetch_add(1, Ordering::Relaxed) + 1;
        if n % AGGREGATE_EVERY == 0 {
            let s = self.snapshot(initialized_schemas);
            info!(
                target: "filedriver::metrics",
                connections = s.connections,
                schema_setups = s.schema_setups,
                errors = s.errors,
                initialized_schemas = s.initialized_schemas,
                formats = ?s.format_usage,
                "driver statistics"
            );
        }
        n
    }

    pub fn record_setup(&self, format: &str, elapsed_ms: u128) {
        self.schema_setups.fetch_add(1, Ordering::Relaxed);
        *self.format_usage.write().entry(format.to_string()).or_insert(0) += 1;
        info!(target: "filedriver::metrics", format, elapsed_ms = elapsed_ms as u64, "schema setup complete");
    }

    pub fn record_error(&self) { self.errors.fetch_add(1, Ordering::Relaxed); }

    pub fn snapshot(&self, initialized_schemas: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            connections: self.connections.load(Ordering::Relaxed),
            schema_setups: self.schema_setups.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            format_usage: self.format_usage.read().clone(),
            initialized_schemas,
        }
    }
}
