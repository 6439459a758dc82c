use serde_json::{Map, Value};

use crate::error::SchemaError;

/// One input row: column name to cell value
pub type Row = Map<String, Value>;

/// In-memory table with named columns, as handed over by the I/O layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names in first-seen order
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table from rows; the column list is the union of row keys
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Fail with a `SchemaError` if `name` is not a column of this table
    pub fn require_column(&self, name: &str) -> Result<(), SchemaError> {
        if self.has_column(name) {
            Ok(())
        } else {
            Err(SchemaError::MissingColumn {
                column: name.to_string(),
                available: self.columns.clone(),
            })
        }
    }
}

/// Render a cell as text. Null and missing cells yield `None`.
pub fn cell_to_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}
