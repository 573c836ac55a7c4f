//! Configuration validation: `ConnectionSpec` -> typed `Settings`, or the first violation.
//! Order is fixed: path safety, numeric bounds, enumerations, refresh interval.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::connection::ConnectionSpec;
use crate::config::defaults::DEFAULT_SCHEMA;
use crate::error::{DriverError, DriverResult};
use crate::format::FormatTag;
use crate::operand::Operand;
use crate::options::parse_bool;
use crate::schema::casing::{Casing, CasingPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionEngine { Parquet, Vectorized, Arrow, Linq4j }

pub const ENGINE_NAMES: &[&str] = &["parquet", "vectorized", "arrow", "linq4j"];

impl ExecutionEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionEngine::Parquet => "parquet",
            ExecutionEngine::Vectorized => "vectorized",
            ExecutionEngine::Arrow => "arrow",
            ExecutionEngine::Linq4j => "linq4j",
        }
    }

    /// The engine materializations require.
    pub fn columnar() -> Self { ExecutionEngine::Parquet }
}

impl fmt::Display for ExecutionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ExecutionEngine {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parquet" => Ok(ExecutionEngine::Parquet),
            "vectorized" => Ok(ExecutionEngine::Vectorized),
            "arrow" => Ok(ExecutionEngine::Arrow),
            "linq4j" => Ok(ExecutionEngine::Linq4j),
            _ => Err(DriverError::config(
                "invalid_execution_engine",
                format!("Invalid execution engine: '{}'. Supported engines: {}", s, ENGINE_NAMES.join(", ")),
            )),
        }
    }
}

/// How a glob location is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GlobMode {
    /// One table per matched file.
    #[default]
    MultiTable,
    /// All matches read as one table by the reader.
    SingleTable,
}

pub const GLOB_MODE_NAMES: &[&str] = &["multi-table", "single-table"];

impl FromStr for GlobMode {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multi-table" => Ok(GlobMode::MultiTable),
            "single-table" => Ok(GlobMode::SingleTable),
            _ => Err(DriverError::config("invalid_glob_mode", format!("Invalid globMode: '{}'. Supported modes: {}", s, GLOB_MODE_NAMES.join(", ")))),
        }
    }
}

/// Credential and transport settings copied verbatim into operands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSettings {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub access_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub private_key_path: Option<String>,
    pub strict_host_key_checking: Option<String>,
    pub aws_region: Option<String>,
}

impl AuthSettings {
    pub fn has_oauth(&self) -> bool {
        self.tenant_id.is_some() || self.client_id.is_some() || self.client_secret.is_some() || self.refresh_token.is_some() || self.access_token.is_some()
    }
}

/// Validated, typed view of a `ConnectionSpec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub schema_name: String,
    pub format: Option<FormatTag>,
    pub execution_engine: Option<ExecutionEngine>,
    pub batch_size: Option<u32>,
    pub memory_threshold: Option<u64>,
    pub max_spill_files: Option<u32>,
    pub skip_lines: Option<u32>,
    pub refresh_interval: Option<String>,
    pub casing: CasingPolicy,
    pub glob_mode: GlobMode,
    pub recursive: bool,
    pub header: Option<bool>,
    pub multiline: Option<bool>,
    pub delimiter: Option<String>,
    pub charset: Option<String>,
    pub spill_directory: Option<String>,
    pub storage_type: Option<String>,
    /// Raw JSON; parsed by the operand builder, which drops it with a warning if malformed.
    pub partitioned_tables: Option<String>,
    pub table: Option<String>,
    pub views: Option<String>,
    pub views_file: Option<String>,
    pub materializations: Option<String>,
    pub auth: AuthSettings,
}

struct Bound {
    name: &'static str,
    min: i64,
    max: i64,
}

const BATCH_SIZE: Bound = Bound { name: "batchSize", min: 1, max: 1_000_000 };
const MEMORY_THRESHOLD: Bound = Bound { name: "memoryThreshold", min: 1024, max: i64::MAX };
const MAX_SPILL_FILES: Bound = Bound { name: "maxSpillFiles", min: 1, max: 10_000 };
const SKIP_LINES: Bound = Bound { name: "skipLines", min: 0, max: 1_000_000 };

/// Refresh interval meaning "never refresh"; only config documents use it.
pub const REFRESH_DISABLED: &str = "-1";

pub const REFRESH_LITERALS: &[&str] = &["30 seconds", "1 minute", "5 minutes", "30 minutes", "1 hour", "2 hours", "12 hours", "1 day", "7 days"];

static REFRESH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\d+\s*(second|minute|hour|day)s?$").expect("static regex"));

/// Validate a whole spec; the first violation is returned.
pub fn validate(spec: &ConnectionSpec) -> DriverResult<Settings> {
    for path in spec.local_paths() {
        validate_path(path)?;
    }
    if let Some(p) = spec.option("spillDirectory") { validate_path(p)?; }
    if let Some(p) = spec.option("viewsFile") {
        if !p.contains("://") { validate_path(p)?; }
    }

    let batch_size = spec.option("batchSize").map(|v| check_bound(&BATCH_SIZE, v)).transpose()?.map(|v| v as u32);
    let memory_threshold = spec.option("memoryThreshold").map(|v| check_bound(&MEMORY_THRESHOLD, v)).transpose()?.map(|v| v as u64);
    let max_spill_files = spec.option("maxSpillFiles").map(|v| check_bound(&MAX_SPILL_FILES, v)).transpose()?.map(|v| v as u32);
    let skip_lines = spec.option("skipLines").map(|v| check_bound(&SKIP_LINES, v)).transpose()?.map(|v| v as u32);

    let format = spec.option("format").map(FormatTag::from_str).transpose()?;
    let execution_engine = spec.option("executionEngine").map(ExecutionEngine::from_str).transpose()?;
    let table_casing = spec.option("tableNameCasing").map(|v| parse_casing("tableNameCasing", v)).transpose()?;
    let column_casing = spec.option("columnNameCasing").map(|v| parse_casing("columnNameCasing", v)).transpose()?;
    let glob_mode = spec.option("globMode").map(GlobMode::from_str).transpose()?.unwrap_or_default();

    let refresh_interval = spec.option("refreshInterval").map(check_refresh_interval).transpose()?;

    let defaults = CasingPolicy::default();
    let opt = |k: &str| spec.option(k).map(str::to_string);
    Ok(Settings {
        schema_name: opt("schema").unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
        format,
        execution_engine,
        batch_size,
        memory_threshold,
        max_spill_files,
        skip_lines,
        refresh_interval,
        casing: CasingPolicy { table: table_casing.unwrap_or(defaults.table), column: column_casing.unwrap_or(defaults.column) },
        glob_mode,
        recursive: spec.option("recursive").map(parse_bool).unwrap_or(true),
        header: spec.option("header").map(parse_bool),
        multiline: spec.option("multiline").map(parse_bool),
        delimiter: spec.options.get("delimiter").filter(|d| !d.is_empty()).map(str::to_string),
        charset: opt("charset"),
        spill_directory: opt("spillDirectory"),
        storage_type: opt("storageType"),
        partitioned_tables: opt("partitionedTables"),
        table: opt("table"),
        views: opt("views"),
        views_file: opt("viewsFile"),
        materializations: opt("materializations"),
        auth: AuthSettings {
            tenant_id: opt("tenantId"),
            client_id: opt("clientId"),
            client_secret: opt("clientSecret"),
            refresh_token: opt("refreshToken"),
            access_token: opt("accessToken"),
            username: opt("username"),
            password: opt("password"),
            private_key_path: opt("privateKeyPath"),
            strict_host_key_checking: opt("strictHostKeyChecking"),
            aws_region: opt("awsRegion"),
        },
    })
}

/// Reject null bytes and any `..` path component, under either separator.
/// `..` inside a name (`v1..v2`) is fine. Never touches the filesystem.
pub fn validate_path(path: &str) -> DriverResult<()> {
    if path.contains('\0') {
        return Err(DriverError::security("null_byte_in_path", "Invalid path: contains null bytes"));
    }
    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(DriverError::security("path_traversal", format!("Invalid path: contains directory traversal: {}", path)));
    }
    Ok(())
}

fn check_bound(bound: &Bound, raw: &str) -> DriverResult<i64> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| DriverError::config("invalid_number", format!("{} must be a valid integer, got: {}", bound.name, raw)))?;
    check_range(bound, value)
}

fn check_range(bound: &Bound, value: i64) -> DriverResult<i64> {
    if value < bound.min || value > bound.max {
        return Err(DriverError::config(
            "numeric_out_of_range",
            format!("{} must be within [{}, {}], got: {}", bound.name, bound.min, bound.max, value),
        ));
    }
    Ok(value)
}

fn check_unsigned(bound: &Bound, value: u64) -> DriverResult<()> {
    let value = i64::try_from(value).map_err(|_| {
        DriverError::config("numeric_out_of_range", format!("{} must be within [{}, {}], got: {}", bound.name, bound.min, bound.max, value))
    })?;
    check_range(bound, value).map(|_| ())
}

/// Checks a declared operand the way connection options are checked, in the same order:
/// path safety, numeric bounds, engine allow-list, refresh intervals. `-1` disables refresh.
/// Table URLs with a scheme are not local paths and are left to the reader.
pub fn validate_operand(op: &Operand) -> DriverResult<()> {
    let local_urls = op.tables.iter().map(|t| t.url.as_str()).filter(|u| !u.contains("://"));
    for path in op.directory.iter().chain(op.spill_directory.iter()).chain(op.private_key_path.iter()).map(String::as_str).chain(local_urls) {
        validate_path(path)?;
    }

    if let Some(n) = op.batch_size { check_unsigned(&BATCH_SIZE, n)?; }
    if let Some(n) = op.memory_threshold { check_unsigned(&MEMORY_THRESHOLD, n)?; }
    for t in &op.tables {
        if let Some(n) = t.skip_lines { check_unsigned(&SKIP_LINES, u64::from(n))?; }
    }

    if let Some(engine) = op.engine() { ExecutionEngine::from_str(engine)?; }

    let intervals = op.refresh_interval.iter().chain(op.tables.iter().filter_map(|t| t.refresh_interval.as_ref()));
    for r in intervals.filter(|r| r.trim() != REFRESH_DISABLED) {
        check_refresh_interval(r)?;
    }
    Ok(())
}

fn parse_casing(name: &str, raw: &str) -> DriverResult<Casing> {
    Casing::from_str(raw).map_err(|_| {
        DriverError::config("invalid_casing", format!("Invalid {}: '{}'. Supported values: UPPER, LOWER, UNCHANGED", name, raw))
    })
}

/// Accept `<n> <unit>` or one of the approved literals.
pub fn check_refresh_interval(raw: &str) -> DriverResult<String> {
    let v = raw.trim();
    if REFRESH_RE.is_match(v) || REFRESH_LITERALS.contains(&v) {
        return Ok(v.to_string());
    }
    Err(DriverError::config(
        "invalid_refresh_interval",
        format!("Invalid refreshInterval: '{}'. Expected '<number> <second|minute|hour|day>[s]' or one of: {}", raw, REFRESH_LITERALS.join(", ")),
    ))
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod validate_tests;
