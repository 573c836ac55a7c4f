//! Hybrid config document named by a `config=` locator: a list of schema declarations plus
//! connection-wide defaults that are folded into each declared operand.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::defaults::DEFAULT_SCHEMA;
use crate::config::validate::REFRESH_DISABLED;
use crate::factory::FILE_FACTORY;
use crate::operand::Operand;
use crate::schema::casing::{Casing, CasingPolicy};

fn default_version() -> String { "1.0".to_string() }
fn default_schema_name() -> String { DEFAULT_SCHEMA.to_string() }
fn default_batch_size() -> Option<u64> { Some(2048) }
fn default_memory_threshold() -> Option<u64> { Some(67_108_864) }
fn default_refresh_interval() -> Option<String> { Some(REFRESH_DISABLED.to_string()) }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDeclaration {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Factory selector; `file` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<String>,
    #[serde(default)]
    pub operand: Map<String, Value>,
}

impl SchemaDeclaration {
    pub fn selector(&self) -> &str {
        match self.factory.as_deref().map(str::trim) {
            Some(f) if !f.is_empty() => f,
            _ => FILE_FACTORY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_schema_name")]
    pub default_schema: String,
    #[serde(default)]
    pub schemas: Vec<SchemaDeclaration>,
    #[serde(default)]
    pub execution_engine: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: Option<u64>,
    #[serde(default = "default_memory_threshold")]
    pub memory_threshold: Option<u64>,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: Option<String>,
    #[serde(default)]
    pub aws_region: Option<String>,
    #[serde(default)]
    pub table_name_casing: Option<Casing>,
    #[serde(default)]
    pub column_name_casing: Option<Casing>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: None,
            description: None,
            default_schema: default_schema_name(),
            schemas: Vec::new(),
            execution_engine: None,
            batch_size: default_batch_size(),
            memory_threshold: default_memory_threshold(),
            refresh_interval: default_refresh_interval(),
            aws_region: None,
            table_name_casing: None,
            column_name_casing: None,
        }
    }
}

impl FileConfig {
    /// Read a document; `.yaml`/`.yml` parse as YAML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
        let cfg = Self::parse(&text, &path.to_string_lossy())?;
        debug!(target: "filedriver::locator", path = %path.display(), schemas = cfg.schemas.len(), "loaded config document");
        Ok(cfg)
    }

    pub fn parse(text: &str, location: &str) -> Result<Self> {
        let lower = location.to_ascii_lowercase();
        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            serde_yaml::from_str(text).with_context(|| format!("invalid YAML config document {}", location))
        } else {
            serde_json::from_str(text).with_context(|| format!("invalid JSON config document {}", location))
        }
    }

    /// Document casing where declared, else `fallback` per axis.
    pub fn casing(&self, fallback: CasingPolicy) -> CasingPolicy {
        CasingPolicy { table: self.table_name_casing.unwrap_or(fallback.table), column: self.column_name_casing.unwrap_or(fallback.column) }
    }

    /// The declaration's operand with document-level settings folded in. The execution engine
    /// is connection-wide and always replaces the declared one; the numeric and refresh settings
    /// only fill gaps.
    pub fn effective_operand(&self, decl: &SchemaDeclaration) -> Result<Operand> {
        let mut map = decl.operand.clone();
        if let Some(engine) = &self.execution_engine {
            map.insert("executionEngine".to_string(), Value::String(engine.clone()));
        }
        if let Some(n) = self.batch_size {
            map.entry("batchSize").or_insert_with(|| Value::from(n));
        }
        if let Some(n) = self.memory_threshold {
            map.entry("memoryThreshold").or_insert_with(|| Value::from(n));
        }
        if let Some(r) = &self.refresh_interval {
            map.entry("refreshInterval").or_insert_with(|| Value::String(r.clone()));
        }
        if let Some(Value::Array(items)) = map.get_mut("materializations") {
            for item in items.iter_mut() {
                fill_backing_table(item);
            }
        }
        serde_json::from_value(Value::Object(map)).with_context(|| format!("invalid operand for schema '{}'", decl.name))
    }
}

fn fill_backing_table(item: &mut Value) {
    let Value::Object(m) = item else { return };
    let has_table = ["table", "backingTableName"]
        .iter()
        .any(|k| m.get(*k).and_then(Value::as_str).map(|s| !s.trim().is_empty()).unwrap_or(false));
    if has_table {
        return;
    }
    let view = m.get("view").or_else(|| m.get("viewName")).and_then(Value::as_str).map(str::to_string);
    if let Some(view) = view {
        m.remove("backingTableName");
        m.insert("table".to_string(), Value::String(format!("{}_materialized", view)));
    }
}
