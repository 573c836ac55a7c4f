//! Schema assembly: dedup against the registry, factory invocation, casing decoration, and
//! registration of declared views and materializations.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::validate::{ExecutionEngine, Settings};
use crate::context::DriverContext;
use crate::error::{DriverError, DriverResult};
use crate::format::{self, FormatTag};
use crate::locator::leaf_stem;
use crate::operand::{self, Operand};
use crate::registry::DedupKey;
use crate::schema::{CasingPolicy, CasingSchema, MaterializedViewTable, MemorySchema, Schema, SchemaPlus, Table, ViewTable};
use crate::views::{MaterializationDeclaration, ViewDeclaration};

static GLOB_CHARS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*?\[\]]").expect("static regex"));
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("static regex"));

/// Result of assembling one schema under a root.
pub struct Assembled {
    pub schema: Arc<SchemaPlus>,
    /// True when an existing schema was reused and no factory ran.
    pub reused: bool,
}

pub struct Assembler<'a> {
    ctx: &'a DriverContext,
    root: &'a SchemaPlus,
}

fn same_schema(a: &Arc<dyn Schema>, b: &Arc<dyn Schema>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const u8, Arc::as_ptr(b) as *const u8)
}

impl<'a> Assembler<'a> {
    pub fn new(ctx: &'a DriverContext, root: &'a SchemaPlus) -> Self { Self { ctx, root } }

    /// Register the schema for `key` under the root, building it with `build` only when neither
    /// the root nor the registry already holds it. `build` output is casing-decorated per
    /// `policy` before registration.
    pub fn assemble<F>(&self, key: DedupKey, policy: CasingPolicy, build: F) -> DriverResult<Assembled>
    where
        F: FnOnce(&SchemaPlus) -> DriverResult<Arc<dyn Schema>>,
    {
        let registry = self.ctx.registry();
        let name = key.schema_name.clone();

        if let Some(existing) = self.root.get_sub_schema(&name) {
            let built_for = registry
                .keys_for(&name)
                .into_iter()
                .find(|k| registry.get(k).map(|r| same_schema(&r.schema, existing.delegate())).unwrap_or(false));
            if let Some(other) = built_for {
                if other != key {
                    return Err(DriverError::config(
                        "schema_name_conflict",
                        format!("schema '{}' is already assembled from {} in this connection; refusing {}", name, other, key),
                    ));
                }
            }
            debug!(target: "filedriver::assemble", schema = %name, "schema already present under root");
            return Ok(Assembled { schema: existing, reused: true });
        }

        if let Some(reg) = registry.get(&key) {
            debug!(target: "filedriver::assemble", key = %key, "reusing registered schema");
            return Ok(Assembled { schema: self.root.add(&name, reg.schema), reused: true });
        }

        let built = build(self.root)?;
        let decorated = CasingSchema::wrap(built, policy);
        let reg = registry.register(key.clone(), decorated);
        info!(target: "filedriver::assemble", key = %key, tables = reg.schema.table_names().len(), "registered schema");
        Ok(Assembled { schema: self.root.add(&name, reg.schema), reused: false })
    }

    /// Add computed views to `target`. Failures are logged per view; returns how many were added.
    pub fn register_views(&self, target: &SchemaPlus, views: &[ViewDeclaration]) -> usize {
        let mut added = 0;
        for v in views {
            let table = Arc::new(ViewTable { name: v.name.clone(), sql: v.sql.clone(), schema_path: target.path().to_vec(), description: v.description.clone() });
            match target.add_table(&v.name, table) {
                Ok(()) => added += 1,
                Err(e) => warn!(target: "filedriver::views", view = %v.name, schema = target.name(), error = %e, "skipping view"),
            }
        }
        added
    }

    /// Add materializations under their backing table names.
    pub fn register_materializations(&self, target: &SchemaPlus, decls: &[MaterializationDeclaration]) -> usize {
        let mut added = 0;
        for m in decls {
            let backing = m.backing_table();
            let table = Arc::new(MaterializedViewTable { view_name: m.view.clone(), backing_table: backing.clone(), sql: m.sql.clone(), schema_path: target.path().to_vec() });
            match target.add_table(&backing, table) {
                Ok(()) => added += 1,
                Err(e) => warn!(target: "filedriver::views", view = %m.view, table = %backing, error = %e, "skipping materialization"),
            }
        }
        added
    }

    /// Build the per-file tables for a multi-table glob. `named` pairs a derived name with the
    /// matched location. A file whose factory call fails is logged and skipped.
    pub fn build_glob_schema(&self, parent: &SchemaPlus, schema_name: &str, named: &[(String, String)], settings: &Settings) -> DriverResult<Arc<dyn Schema>> {
        let mut schema = MemorySchema::new();
        for (derived, location) in named {
            let fmt = settings.format.unwrap_or_else(|| format::detect(location));
            match self.glob_file_tables(parent, schema_name, derived, location, fmt, settings) {
                Ok(tables) => {
                    for (name, table) in tables {
                        if schema.contains(&name) {
                            warn!(target: "filedriver::discovery", table = %name, location = %location, "table already produced by an earlier match; skipping");
                            continue;
                        }
                        schema.push_table(name, table);
                    }
                }
                Err(e) => warn!(target: "filedriver::discovery", location = %location, error = %format!("{:#}", e), "skipping glob match"),
            }
        }
        debug!(target: "filedriver::discovery", schema = schema_name, tables = schema.len(), "assembled glob schema");
        Ok(Arc::new(schema))
    }

    fn glob_file_tables(
        &self,
        parent: &SchemaPlus,
        schema_name: &str,
        derived: &str,
        location: &str,
        fmt: FormatTag,
        settings: &Settings,
    ) -> anyhow::Result<Vec<(String, Arc<dyn Table>)>> {
        let stem = leaf_stem(location).unwrap_or_else(|| derived.to_string());
        let factories = self.ctx.factories();
        let inner_name = format!("{}.{}", schema_name, derived);
        let casing = CasingPolicy::unchanged();

        if fmt.is_columnar() {
            let op = operand::file_operand(location, &stem, fmt, settings).with_casing(casing);
            let schema = factories.columnar().create(parent, &inner_name, &op)?;
            let table = schema
                .table(&stem.to_uppercase())
                .or_else(|| schema.table(&stem))
                .ok_or_else(|| anyhow::anyhow!("no table named '{}' produced for {}", stem, location))?;
            return Ok(vec![(derived.to_string(), table)]);
        }

        if fmt.is_directory_shaped() {
            let op = operand::file_operand(location, &stem, fmt, settings).with_casing(casing);
            let schema = factories.generic().create(parent, &inner_name, &op)?;
            let names = schema.table_names();
            let prefix = format!("{}__", stem.to_lowercase());
            let own: Vec<(String, String)> = names
                .iter()
                .filter_map(|n| {
                    let lower = n.to_lowercase();
                    if lower == stem.to_lowercase() {
                        Some((n.clone(), n.clone()))
                    } else {
                        lower.strip_prefix(&prefix)?;
                        n.get(prefix.len()..).map(|sheet| (n.clone(), sheet.to_string()))
                    }
                })
                .collect();
            let picked = if own.is_empty() { names.iter().map(|n| (n.clone(), n.clone())).collect() } else { own };
            let mut out = Vec::new();
            for (table_name, sheet) in picked {
                if let Some(t) = schema.table(&table_name) {
                    out.push((format!("{}__{}", derived, sheet), t));
                }
            }
            return Ok(out);
        }

        let op = operand::file_operand(location, derived, fmt, settings).with_casing(casing);
        let schema = factories.generic().create(parent, &inner_name, &op)?;
        let table = schema
            .table(derived)
            .or_else(|| schema.table_names().first().and_then(|n| schema.table(n)))
            .ok_or_else(|| anyhow::anyhow!("factory produced no table for {}", location))?;
        Ok(vec![(derived.to_string(), table)])
    }
}

/// Attach materializations to an operand, forcing the columnar engine they require.
pub fn prepare_materializations(op: Operand, decls: &[MaterializationDeclaration]) -> Operand {
    if decls.is_empty() {
        return op;
    }
    let op = if op.is_columnar_engine() {
        op
    } else {
        warn!(
            target: "filedriver::views",
            engine = op.engine().unwrap_or("<unset>"),
            "materializations require the {} execution engine; forcing it",
            ExecutionEngine::columnar()
        );
        op.with_execution_engine(ExecutionEngine::columnar())
    };
    op.with_materializations(decls.iter().map(MaterializationDeclaration::resolved).collect())
}

/// Table name for a single-table glob: the leaf pattern without wildcard characters, non-word
/// runs collapsed to `_`.
pub fn single_glob_name(location: &str) -> String {
    let leaf = location.rsplit(['/', '\\']).next().unwrap_or(location);
    let stripped = GLOB_CHARS_RE.replace_all(leaf, "");
    let name = NON_WORD_RE.replace_all(&stripped, "_").into_owned();
    if name.is_empty() { "glob_table".to_string() } else { name }
}

#[cfg(test)]
#[path = "assembler_tests.rs"]
mod assembler_tests;
