//! Schema registrations that outlive a single connection.
//! Keyed by the exact (schema name, base path, pattern) triple; the first registration for a
//! key wins and later identical connections reuse its handle.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::schema::Schema;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DedupKey {
    pub schema_name: String,
    pub base_path: String,
    pub pattern: String,
}

impl DedupKey {
    pub fn new(schema_name: impl Into<String>, base_path: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self { schema_name: schema_name.into(), base_path: base_path.into(), pattern: pattern.into() }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}:{}:{}", self.schema_name, self.base_path, self.pattern) }
}

#[derive(Clone)]
pub struct SchemaRegistration {
    pub name: String,
    pub key: DedupKey,
    pub schema: Arc<dyn Schema>,
    pub registered_at: i64,
}

impl fmt::Debug for SchemaRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistration").field("name", &self.name).field("key", &self.key).field("registered_at", &self.registered_at).finish()
    }
}

#[derive(Default)]
pub struct SchemaRegistry {
    entries: RwLock<HashMap<DedupKey, SchemaRegistration>>,
}

impl SchemaRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, key: &DedupKey) -> Option<SchemaRegistration> { self.entries.read().get(key).cloned() }

    /// Register `schema` under `key` unless already present; returns the registration in force.
    pub fn register(&self, key: DedupKey, schema: Arc<dyn Schema>) -> SchemaRegistration {
        let mut entries = self.entries.write();
        entries
            .entry(key.clone())
            .or_insert_with(|| SchemaRegistration { name: key.schema_name.clone(), key, schema, registered_at: Utc::now().timestamp() })
            .clone()
    }

    /// Keys registered for one schema name, sorted.
    pub fn keys_for(&self, schema_name: &str) -> Vec<DedupKey> {
        let mut keys: Vec<DedupKey> = self.entries.read().keys().filter(|k| k.schema_name == schema_name).cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize { self.entries.read().len() }

    pub fn is_empty(&self) -> bool { self.entries.read().is_empty() }
}
