//! Mutable schema node the driver registers into.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::memory::MemorySchema;
use super::{FunctionRef, RowType, Schema, SchemaVersion, Table};
use crate::error::{DriverError, DriverResult};

/// A delegate schema plus whatever tables and child schemas were added at runtime.
/// Added entries shadow the delegate's entries of the same name.
pub struct SchemaPlus {
    name: String,
    path: Vec<String>,
    delegate: Arc<dyn Schema>,
    tables: RwLock<Vec<(String, Arc<dyn Table>)>>,
    sub_schemas: RwLock<Vec<(String, Arc<SchemaPlus>)>>,
}

impl SchemaPlus {
    /// Empty root of a connection's schema tree.
    pub fn root() -> Arc<SchemaPlus> {
        Arc::new(SchemaPlus::wrap(String::new(), Vec::new(), Arc::new(MemorySchema::new())))
    }

    fn wrap(name: String, path: Vec<String>, delegate: Arc<dyn Schema>) -> Self {
        Self { name, path, delegate, tables: RwLock::new(Vec::new()), sub_schemas: RwLock::new(Vec::new()) }
    }

    pub fn name(&self) -> &str { &self.name }

    /// Names from the root down to this node; empty for the root.
    pub fn path(&self) -> &[String] { &self.path }

    pub fn delegate(&self) -> &Arc<dyn Schema> { &self.delegate }

    /// Register `schema` as a child named `name`, replacing any existing child of that name.
    pub fn add(&self, name: &str, schema: Arc<dyn Schema>) -> Arc<SchemaPlus> {
        let mut path = self.path.clone();
        path.push(name.to_string());
        let node = Arc::new(SchemaPlus::wrap(name.to_string(), path, schema));
        let mut subs = self.sub_schemas.write();
        match subs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = node.clone(),
            None => subs.push((name.to_string(), node.clone())),
        }
        node
    }

    /// Add a table; an existing table of the same name is a configuration error.
    pub fn add_table(&self, name: &str, table: Arc<dyn Table>) -> DriverResult<()> {
        if self.table(name).is_some() {
            return Err(DriverError::config("duplicate_table_name", format!("table '{}' already exists in schema '{}'", name, self.name)));
        }
        self.tables.write().push((name.to_string(), table));
        Ok(())
    }

    pub fn get_sub_schema(&self, name: &str) -> Option<Arc<SchemaPlus>> {
        self.sub_schemas.read().iter().find(|(n, _)| n == name).map(|(_, s)| s.clone())
    }
}

impl fmt::Debug for SchemaPlus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaPlus").field("path", &self.path).field("tables", &self.table_names()).field("sub_schemas", &self.sub_schema_names()).finish()
    }
}

impl Schema for SchemaPlus {
    fn table(&self, name: &str) -> Option<Arc<dyn Table>> {
        if let Some(t) = self.tables.read().iter().find(|(n, _)| n == name).map(|(_, t)| t.clone()) {
            return Some(t);
        }
        self.delegate.table(name)
    }

    fn table_names(&self) -> Vec<String> {
        let mut names = self.delegate.table_names();
        for (n, _) in self.tables.read().iter() {
            if !names.contains(n) { names.push(n.clone()); }
        }
        names
    }

    fn sub_schema(&self, name: &str) -> Option<Arc<dyn Schema>> {
        match self.get_sub_schema(name) {
            Some(s) => Some(s as Arc<dyn Schema>),
            None => self.delegate.sub_schema(name),
        }
    }

    fn sub_schema_names(&self) -> Vec<String> {
        let mut names = self.delegate.sub_schema_names();
        for (n, _) in self.sub_schemas.read().iter() {
            if !names.contains(n) { names.push(n.clone()); }
        }
        names
    }

    fn functions(&self, name: &str) -> Vec<FunctionRef> { self.delegate.functions(name) }
    fn function_names(&self) -> Vec<String> { self.delegate.function_names() }
    fn type_names(&self) -> Vec<String> { self.delegate.type_names() }
    fn type_def(&self, name: &str) -> Option<RowType> { self.delegate.type_def(name) }

    fn is_mutable(&self) -> bool { true }

    fn snapshot(self: Arc<Self>, _version: SchemaVersion) -> Arc<dyn Schema> { self }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, MemoryTable};

    fn t() -> Arc<dyn Table> { Arc::new(MemoryTable::new(RowType::new(vec![Field::new("id", "INTEGER")]))) }

    #[test]
    fn add_builds_paths() {
        let root = SchemaPlus::root();
        let files = root.add("files", Arc::new(MemorySchema::new().with_table("A", t())));
        assert_eq!(files.path(), ["files".to_string()]);
        assert_eq!(root.sub_schema_names(), vec!["files"]);
        assert!(root.sub_schema("files").unwrap().table("A").is_some());
        let nested = files.add("inner", Arc::new(MemorySchema::new()));
        assert_eq!(nested.path(), ["files".to_string(), "inner".to_string()]);
    }

    #[test]
    fn added_tables_merge_with_delegate() {
        let root = SchemaPlus::root();
        let s = root.add("s", Arc::new(MemorySchema::new().with_table("A", t())));
        s.add_table("V", t()).unwrap();
        assert_eq!(s.table_names(), vec!["A", "V"]);
        let err = s.add_table("A", t()).unwrap_err();
        assert_eq!(err.code_str(), "duplicate_table_name");
    }
}
