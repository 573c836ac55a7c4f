use std::sync::Arc;

use super::{RowType, Schema, SchemaVersion, Statistic, Table};

/// Fixed table with a known row type.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    row_type: RowType,
    statistic: Statistic,
}

impl MemoryTable {
    pub fn new(row_type: RowType) -> Self { Self { row_type, statistic: Statistic::default() } }

    pub fn with_row_count(mut self, rows: u64) -> Self {
        self.statistic.row_count = Some(rows);
        self
    }
}

impl Table for MemoryTable {
    fn row_type(&self) -> RowType { self.row_type.clone() }
    fn statistic(&self) -> Statistic { self.statistic.clone() }
}

/// Immutable schema assembled from already-built tables, e.g. one entry per glob match.
#[derive(Default)]
pub struct MemorySchema {
    tables: Vec<(String, Arc<dyn Table>)>,
    sub_schemas: Vec<(String, Arc<dyn Schema>)>,
}

impl MemorySchema {
    pub fn new() -> Self { Self::default() }

    /// Add or replace a table, keeping first-insertion order.
    pub fn with_table(mut self, name: impl Into<String>, table: Arc<dyn Table>) -> Self {
        self.push_table(name, table);
        self
    }

    pub fn with_sub_schema(mut self, name: impl Into<String>, schema: Arc<dyn Schema>) -> Self {
        let name = name.into();
        match self.sub_schemas.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = schema,
            None => self.sub_schemas.push((name, schema)),
        }
        self
    }

    pub fn push_table(&mut self, name: impl Into<String>, table: Arc<dyn Table>) {
        let name = name.into();
        match self.tables.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = table,
            None => self.tables.push((name, table)),
        }
    }

    pub fn contains(&self, name: &str) -> bool { self.tables.iter().any(|(n, _)| n == name) }

    pub fn len(&self) -> usize { self.tables.len() }

    pub fn is_empty(&self) -> bool { self.tables.is_empty() }
}

impl Schema for MemorySchema {
    fn table(&self, name: &str) -> Option<Arc<dyn Table>> {
        self.tables.iter().find(|(n, _)| n == name).map(|(_, t)| t.clone())
    }

    fn table_names(&self) -> Vec<String> { self.tables.iter().map(|(n, _)| n.clone()).collect() }

    fn sub_schema(&self, name: &str) -> Option<Arc<dyn Schema>> {
        self.sub_schemas.iter().find(|(n, _)| n == name).map(|(_, s)| s.clone())
    }

    fn sub_schema_names(&self) -> Vec<String> { self.sub_schemas.iter().map(|(n, _)| n.clone()).collect() }

    // Content is fixed at construction, so every version is the same.
    fn snapshot(self: Arc<Self>, _version: SchemaVersion) -> Arc<dyn Schema> { self }
}
