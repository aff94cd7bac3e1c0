#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub table: String,
    pub column: String,
    pub datatype: String,
    /// `None` when the column declares no null representation.
    pub nulltype: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatatypeDescriptor {
    pub datatype: String,
    pub condition: String,
}

#[derive(Clone, Debug)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableSchema {
    pub fn find_column(&self, column_name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.column == column_name)
    }
}
