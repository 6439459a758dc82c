use std::path::Path;

use serde_json::Value;

use crate::error::InputError;
use crate::models::Table;

/// Read a JSON file holding an array of row objects into a Table
pub fn read_table_file(path: &Path) -> Result<Table, InputError> {
    let content = std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table_json(&content)
}

/// Parse a JSON array of row objects into a Table
pub fn parse_table_json(json: &str) -> Result<Table, InputError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(items) = value else {
        return Err(InputError::NotAnArray);
    };

    let rows = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(row) => Ok(row),
            _ => Err(InputError::NotAnObject { index }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Table::from_rows(rows))
}
