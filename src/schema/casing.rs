//! Identifier casing decorator.
//! `CasingSchema` presents a delegate's table names folded per policy and resolves lookups
//! back to the delegate's own names; `CasingTable` renames row-type fields. The delegate is
//! never modified.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{FunctionRef, RowType, Schema, SchemaVersion, Statistic, Table, TableType};
use crate::error::DriverError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Casing { Upper, Lower, Unchanged }

impl Casing {
    pub fn apply(&self, ident: &str) -> String {
        match self {
            Casing::Upper => ident.to_uppercase(),
            Casing::Lower => ident.to_lowercase(),
            Casing::Unchanged => ident.to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Casing::Upper => "UPPER",
            Casing::Lower => "LOWER",
            Casing::Unchanged => "UNCHANGED",
        }
    }
}

impl fmt::Display for Casing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Casing {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UPPER" => Ok(Casing::Upper),
            "LOWER" => Ok(Casing::Lower),
            "UNCHANGED" => Ok(Casing::Unchanged),
            _ => Err(DriverError::config("invalid_casing", format!("Invalid casing: '{}'. Supported values: UPPER, LOWER, UNCHANGED", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasingPolicy {
    pub table: Casing,
    pub column: Casing,
}

/// UPPER tables and UNCHANGED columns: the engine's own folding convention.
impl Default for CasingPolicy {
    fn default() -> Self { Self { table: Casing::Upper, column: Casing::Unchanged } }
}

impl CasingPolicy {
    pub fn new(table: Casing, column: Casing) -> Self { Self { table, column } }

    /// Policy that leaves every identifier as the source produced it.
    pub fn unchanged() -> Self { Self { table: Casing::Unchanged, column: Casing::Unchanged } }

    pub fn needs_wrapping(&self) -> bool { *self != CasingPolicy::default() }
}

pub struct CasingSchema {
    delegate: Arc<dyn Schema>,
    policy: CasingPolicy,
    to_original: HashMap<String, String>,
    names: Vec<String>,
}

impl CasingSchema {
    pub fn new(delegate: Arc<dyn Schema>, policy: CasingPolicy) -> Self {
        let mut to_original = HashMap::new();
        let mut names = Vec::new();
        for original in delegate.table_names() {
            let folded = policy.table.apply(&original);
            if let Some(prev) = to_original.get(&folded) {
                warn!(target: "filedriver::assemble", table = %original, kept = %prev, "casing folds two tables to '{}'; keeping the first", folded);
                continue;
            }
            to_original.insert(folded.clone(), original);
            names.push(folded);
        }
        Self { delegate, policy, to_original, names }
    }

    /// Wrap only when the policy differs from the engine default; otherwise hand back the delegate.
    pub fn wrap(delegate: Arc<dyn Schema>, policy: CasingPolicy) -> Arc<dyn Schema> {
        if !policy.needs_wrapping() {
            return delegate;
        }
        Arc::new(CasingSchema::new(delegate, policy))
    }

    pub fn policy(&self) -> CasingPolicy { self.policy }

    pub fn delegate(&self) -> &Arc<dyn Schema> { &self.delegate }

    fn original_name(&self, name: &str) -> Option<String> {
        if let Some(orig) = self.to_original.get(name) {
            return Some(orig.clone());
        }
        self.names
            .iter()
            .filter_map(|folded| self.to_original.get(folded).map(|orig| (folded, orig)))
            .find(|(folded, orig)| folded.eq_ignore_ascii_case(name) || orig.eq_ignore_ascii_case(name))
            .map(|(_, orig)| orig.clone())
    }
}

impl Schema for CasingSchema {
    fn table(&self, name: &str) -> Option<Arc<dyn Table>> {
        let original = self.original_name(name)?;
        self.delegate.table(&original).map(|t| CasingTable::wrap(t, self.policy.column))
    }

    fn table_names(&self) -> Vec<String> { self.names.clone() }

    fn sub_schema(&self, name: &str) -> Option<Arc<dyn Schema>> {
        let sub = self.delegate.sub_schema(name).or_else(|| {
            let actual = self.delegate.sub_schema_names().into_iter().find(|n| n.eq_ignore_ascii_case(name))?;
            self.delegate.sub_schema(&actual)
        })?;
        Some(Arc::new(CasingSchema::new(sub, self.policy)))
    }

    fn sub_schema_names(&self) -> Vec<String> { self.delegate.sub_schema_names() }
    fn functions(&self, name: &str) -> Vec<FunctionRef> { self.delegate.functions(name) }
    fn function_names(&self) -> Vec<String> { self.delegate.function_names() }
    fn type_names(&self) -> Vec<String> { self.delegate.type_names() }
    fn type_def(&self, name: &str) -> Option<RowType> { self.delegate.type_def(name) }
    fn is_mutable(&self) -> bool { self.delegate.is_mutable() }

    fn snapshot(self: Arc<Self>, version: SchemaVersion) -> Arc<dyn Schema> {
        Arc::new(CasingSchema::new(self.delegate.clone().snapshot(version), self.policy))
    }
}

pub struct CasingTable {
    delegate: Arc<dyn Table>,
    column: Casing,
}

impl CasingTable {
    pub fn wrap(delegate: Arc<dyn Table>, column: Casing) -> Arc<dyn Table> {
        if column == Casing::Unchanged {
            return delegate;
        }
        Arc::new(CasingTable { delegate, column })
    }
}

impl Table for CasingTable {
    fn row_type(&self) -> RowType { self.delegate.row_type().renamed(|n| self.column.apply(n)) }
    fn statistic(&self) -> Statistic { self.delegate.statistic() }
    fn table_type(&self) -> TableType { self.delegate.table_type() }
    fn view_sql(&self) -> Option<String> { self.delegate.view_sql() }
}

#[cfg(test)]
#[path = "casing_tests.rs"]
mod casing_tests;
