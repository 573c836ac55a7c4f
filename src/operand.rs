//! Per-source configuration payload handed to table-source factories, and the builders that
//! derive it from validated settings. Builders return fresh values; nothing is shared between
//! sources.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::validate::{AuthSettings, ExecutionEngine, Settings};
use crate::format::FormatTag;
use crate::schema::casing::{Casing, CasingPolicy};
use crate::views::{MaterializationDeclaration, ViewDeclaration};

/// OAuth-style storage credentials, nested under `config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageCredentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// One explicit table entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSpec {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_lines: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<TableSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_threshold: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spill_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitioned_tables: Option<Value>,
    #[serde(rename = "config", skip_serializing_if = "Option::is_none")]
    pub credentials: Option<StorageCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict_host_key_checking: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<ViewDeclaration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materializations: Vec<MaterializationDeclaration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name_casing: Option<Casing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_name_casing: Option<Casing>,
    /// Keys this crate does not interpret, passed through to the factory.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Operand {
    pub fn new() -> Self { Self::default() }

    pub fn with_directory(mut self, dir: impl Into<String>) -> Self {
        self.directory = Some(dir.into());
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = Some(recursive);
        self
    }

    pub fn with_table(mut self, table: TableSpec) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_execution_engine(mut self, engine: ExecutionEngine) -> Self {
        self.execution_engine = Some(engine.as_str().to_string());
        self
    }

    pub fn with_batch_size(mut self, n: Option<u32>) -> Self {
        if let Some(n) = n { self.batch_size = Some(n as u64); }
        self
    }

    pub fn with_memory_threshold(mut self, n: Option<u64>) -> Self {
        if let Some(n) = n { self.memory_threshold = Some(n); }
        self
    }

    pub fn with_spill_directory(mut self, dir: Option<&str>) -> Self {
        if let Some(d) = dir { self.spill_directory = Some(d.to_string()); }
        self
    }

    pub fn with_storage_type(mut self, t: Option<&str>) -> Self {
        if let Some(t) = t { self.storage_type = Some(t.to_string()); }
        self
    }

    pub fn with_refresh_interval(mut self, r: Option<&str>) -> Self {
        if let Some(r) = r { self.refresh_interval = Some(r.to_string()); }
        self
    }

    pub fn with_partitioned_tables(mut self, v: Value) -> Self {
        self.partitioned_tables = Some(v);
        self
    }

    /// Copy credential fields verbatim; OAuth fields nest under `config`.
    pub fn with_auth(mut self, auth: &AuthSettings) -> Self {
        if auth.has_oauth() {
            self.credentials = Some(StorageCredentials {
                tenant_id: auth.tenant_id.clone(),
                client_id: auth.client_id.clone(),
                client_secret: auth.client_secret.clone(),
                refresh_token: auth.refresh_token.clone(),
                access_token: auth.access_token.clone(),
            });
        }
        self.username = auth.username.clone().or(self.username.take());
        self.password = auth.password.clone().or(self.password.take());
        self.private_key_path = auth.private_key_path.clone().or(self.private_key_path.take());
        self.strict_host_key_checking = auth.strict_host_key_checking.clone().or(self.strict_host_key_checking.take());
        self
    }

    pub fn with_views(mut self, views: Vec<ViewDeclaration>) -> Self {
        self.views = views;
        self
    }

    pub fn with_materializations(mut self, m: Vec<MaterializationDeclaration>) -> Self {
        self.materializations = m;
        self
    }

    pub fn with_casing(mut self, policy: CasingPolicy) -> Self {
        self.table_name_casing = Some(policy.table);
        self.column_name_casing = Some(policy.column);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn engine(&self) -> Option<&str> { self.execution_engine.as_deref() }

    pub fn is_columnar_engine(&self) -> bool {
        self.engine().map(|e| e.eq_ignore_ascii_case(ExecutionEngine::columnar().as_str())).unwrap_or(false)
    }

    /// Camel-case map as a factory reads it.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(m)) => m,
            _ => Map::new(),
        }
    }
}

/// Performance, refresh and credential parameters shared by every operand shape.
fn with_common(op: Operand, settings: &Settings) -> Operand {
    let op = match settings.execution_engine {
        Some(e) => op.with_execution_engine(e),
        None => op,
    };
    op.with_batch_size(settings.batch_size)
        .with_memory_threshold(settings.memory_threshold)
        .with_spill_directory(settings.spill_directory.as_deref())
        .with_storage_type(settings.storage_type.as_deref())
        .with_refresh_interval(settings.refresh_interval.as_deref())
        .with_auth(&settings.auth)
}

fn default_columnar_engine(op: Operand, format: Option<FormatTag>) -> Operand {
    if op.execution_engine.is_none() && format.map(|f| f.is_columnar()).unwrap_or(false) {
        return op.with_execution_engine(ExecutionEngine::columnar());
    }
    op
}

/// Directory-shaped operand. `format` is the detected or requested format, when known.
pub fn directory_operand(directory: &str, format: Option<FormatTag>, settings: &Settings) -> Operand {
    let op = with_common(Operand::new().with_directory(directory).with_recursive(settings.recursive), settings);
    let op = default_columnar_engine(op, format);
    match settings.partitioned_tables.as_deref() {
        Some(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(v) => op.with_partitioned_tables(v),
            Err(e) => {
                warn!(target: "filedriver::operand", directory, error = %e, "ignoring malformed partitionedTables");
                op
            }
        },
        None => op,
    }
}

/// Explicit table entry with the format-specific reader flags.
pub fn table_spec(name: &str, url: &str, format: FormatTag, settings: &Settings) -> TableSpec {
    let mut spec = TableSpec { name: name.to_string(), url: url.to_string(), ..TableSpec::default() };
    if format.is_delimited() {
        spec.flavor = Some("scannable".to_string());
        if format == FormatTag::Tsv { spec.separator = Some("\t".to_string()); }
        if let Some(d) = &settings.delimiter { spec.separator = Some(d.clone()); }
        spec.header = settings.header;
        spec.skip_lines = settings.skip_lines;
    }
    if format == FormatTag::Json { spec.multiline = settings.multiline; }
    spec.charset = settings.charset.clone();
    spec.refresh_interval = settings.refresh_interval.clone();
    spec
}

fn parent_of(path: &str) -> String {
    Path::new(path).parent().map(|p| p.to_string_lossy().to_string()).filter(|p| !p.is_empty()).unwrap_or_else(|| ".".to_string())
}

/// Operand for one local file.
pub fn file_operand(path: &str, name: &str, format: FormatTag, settings: &Settings) -> Operand {
    if format.is_columnar() || format.is_directory_shaped() {
        // readers for these formats only discover by directory
        return directory_operand(&parent_of(path), Some(format), settings).with_recursive(false);
    }
    let op = Operand::new().with_table(table_spec(name, path, format, settings));
    with_common(op, settings)
}

/// Operand for a remote single source (HTTP family or one object storage key).
pub fn remote_operand(url: &str, name: &str, format: FormatTag, settings: &Settings) -> Operand {
    let op = with_common(Operand::new().with_table(table_spec(name, url, format, settings)), settings);
    default_columnar_engine(op, Some(format))
}

/// One table per location, for multi-location connections.
pub fn multi_operand(entries: &[(String, String, FormatTag)], settings: &Settings) -> Operand {
    let op = entries.iter().fold(Operand::new(), |op, (name, url, format)| op.with_table(table_spec(name, url, *format, settings)));
    with_common(op, settings)
}

/// Single logical table over every match of `pattern`; the reader expands the glob itself.
pub fn single_glob_operand(pattern: &str, name: &str, format: FormatTag, settings: &Settings) -> Operand {
    let op = with_common(Operand::new().with_table(table_spec(name, pattern, format, settings)), settings);
    default_columnar_engine(op, Some(format))
}

/// Promote a configured region to the process environment, where storage clients read it.
pub fn promote_region(region: Option<&str>) {
    if let Some(r) = region.map(str::trim).filter(|r| !r.is_empty()) {
        std::env::set_var("AWS_REGION", r);
    }
}

#[cfg(test)]
#[path = "operand_tests.rs"]
mod operand_tests;
