//! Narrow interface to the query engine's schema tree.
//! Factories hand back `Arc<dyn Schema>`; the driver registers them under a `SchemaPlus` root
//! and optionally wraps them in a `CasingSchema`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod casing;
pub mod memory;
pub mod plus;
pub mod view;

pub use casing::{Casing, CasingPolicy, CasingSchema, CasingTable};
pub use memory::{MemorySchema, MemoryTable};
pub use plus::SchemaPlus;
pub use view::{MaterializedViewTable, ViewTable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self { name: name.into(), data_type: data_type.into(), nullable: true }
    }
}

/// Ordered column descriptors of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowType {
    pub fields: Vec<Field>,
}

impl RowType {
    pub fn new(fields: Vec<Field>) -> Self { Self { fields } }

    pub fn field_names(&self) -> Vec<&str> { self.fields.iter().map(|f| f.name.as_str()).collect() }

    /// Same row type with every field renamed through `f`.
    pub fn renamed<F: Fn(&str) -> String>(&self, f: F) -> RowType {
        RowType { fields: self.fields.iter().map(|fld| Field { name: f(&fld.name), ..fld.clone() }).collect() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableType { Table, View, MaterializedView }

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistic {
    pub row_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRef {
    pub name: String,
    pub signature: String,
}

/// Point in time for versioned schema snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaVersion(pub i64);

pub trait Table: Send + Sync {
    fn row_type(&self) -> RowType;

    fn statistic(&self) -> Statistic { Statistic::default() }

    fn table_type(&self) -> TableType { TableType::Table }

    /// Defining query for views and materializations.
    fn view_sql(&self) -> Option<String> { None }
}

pub trait Schema: Send + Sync {
    fn table(&self, name: &str) -> Option<Arc<dyn Table>>;

    /// Names in registration order.
    fn table_names(&self) -> Vec<String>;

    fn sub_schema(&self, _name: &str) -> Option<Arc<dyn Schema>> { None }

    fn sub_schema_names(&self) -> Vec<String> { Vec::new() }

    fn functions(&self, _name: &str) -> Vec<FunctionRef> { Vec::new() }

    fn function_names(&self) -> Vec<String> { Vec::new() }

    fn type_names(&self) -> Vec<String> { Vec::new() }

    fn type_def(&self, _name: &str) -> Option<RowType> { None }

    fn is_mutable(&self) -> bool { false }

    fn snapshot(self: Arc<Self>, version: SchemaVersion) -> Arc<dyn Schema>;
}

impl fmt::Debug for dyn Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema").field("tables", &self.table_names()).field("sub_schemas", &self.sub_schema_names()).finish()
    }
}

impl fmt::Debug for dyn Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table").field("type", &self.table_type()).field("columns", &self.row_type().field_names()).finish()
    }
}
