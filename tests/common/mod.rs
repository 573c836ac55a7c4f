#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use filedriver::schema::{Field, MemorySchema, MemoryTable, RowType};
use filedriver::{Casing, Operand, Schema, SchemaFactory, SchemaPlus, Table};
use parking_lot::Mutex;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))).with_test_writer().try_init();
}

/// Reader stand-in: one table per explicit table entry, or one per regular file of the operand
/// directory. Names fold per the operand's casing, the way the engine folds them.
#[derive(Default)]
pub struct ListingFactory {
    pub calls: Mutex<Vec<(String, Operand)>>,
}

impl ListingFactory {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    pub fn call_count(&self) -> usize { self.calls.lock().len() }

    pub fn last_operand(&self) -> Operand { self.calls.lock().last().map(|(_, op)| op.clone()).expect("factory was called") }
}

fn fold(c: Option<Casing>, s: &str) -> String { c.unwrap_or(Casing::Unchanged).apply(s) }

impl SchemaFactory for ListingFactory {
    fn create(&self, _parent: &SchemaPlus, name: &str, op: &Operand) -> anyhow::Result<Arc<dyn Schema>> {
        self.calls.lock().push((name.to_string(), op.clone()));
        let row = RowType::new(vec![Field::new(fold(op.column_name_casing, "Id"), "INTEGER")]);
        let mut schema = MemorySchema::new();
        for t in &op.tables {
            schema.push_table(fold(op.table_name_casing, &t.name), Arc::new(MemoryTable::new(row.clone())) as Arc<dyn Table>);
        }
        if let Some(dir) = &op.directory {
            let mut entries: Vec<_> = std::fs::read_dir(dir)?.filter_map(Result::ok).map(|e| e.path()).filter(|p| p.is_file()).collect();
            entries.sort();
            for p in entries {
                let stem = p.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
                schema.push_table(fold(op.table_name_casing, &stem), Arc::new(MemoryTable::new(row.clone())) as Arc<dyn Table>);
            }
        }
        Ok(Arc::new(schema))
    }
}

/// Accelerated reader that always fails.
#[derive(Default)]
pub struct FailingFactory {
    pub calls: Mutex<Vec<Operand>>,
}

impl SchemaFactory for FailingFactory {
    fn create(&self, _parent: &SchemaPlus, _name: &str, op: &Operand) -> anyhow::Result<Arc<dyn Schema>> {
        self.calls.lock().push(op.clone());
        anyhow::bail!("native reader could not start")
    }
}

pub fn write(root: &Path, rel: &str, body: &str) {
    let p = root.join(rel);
    if let Some(parent) = p.parent() {
        std::fs::create_dir_all(parent).expect("create dirs");
    }
    std::fs::write(p, body).expect("write fixture");
}

pub fn file_locator(path: &Path) -> String { format!("file://{}", path.to_string_lossy().replace('\\', "/")) }
