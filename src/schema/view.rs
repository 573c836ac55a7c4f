use super::{RowType, Table, TableType};

/// Computed view. The engine expands `sql` with `schema_path` as the default namespace, so
/// table references inside it need no qualification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTable {
    pub name: String,
    pub sql: String,
    pub schema_path: Vec<String>,
    pub description: Option<String>,
}

impl Table for ViewTable {
    // Columns are derived by the engine when it plans `sql`.
    fn row_type(&self) -> RowType { RowType::default() }
    fn table_type(&self) -> TableType { TableType::View }
    fn view_sql(&self) -> Option<String> { Some(self.sql.clone()) }
}

/// Materialization registered under its backing table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedViewTable {
    pub view_name: String,
    pub backing_table: String,
    pub sql: String,
    pub schema_path: Vec<String>,
}

impl Table for MaterializedViewTable {
    fn row_type(&self) -> RowType { RowType::default() }
    fn table_type(&self) -> TableType { TableType::MaterializedView }
    fn view_sql(&self) -> Option<String> { Some(self.sql.clone()) }
}
