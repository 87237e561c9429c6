//! Tabular read results

use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A single cell as stored by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(i) => CellValue::Integer(i),
            ValueRef::Real(f) => CellValue::Real(f),
            ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => CellValue::Blob(b.to_vec()),
        }
    }
}

impl From<&CellValue> for Value {
    fn from(cell: &CellValue) -> Self {
        match cell {
            CellValue::Null => Value::Null,
            CellValue::Integer(i) => Value::from(*i),
            CellValue::Real(f) => Value::from(*f),
            CellValue::Text(t) => Value::from(t.as_str()),
            CellValue::Blob(b) => Value::from(b.clone()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Real(r) => write!(f, "{}", r),
            CellValue::Text(t) => write!(f, "{}", t),
            CellValue::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
        }
    }
}

/// Column names plus rows, in the order the engine returned them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as JSON objects keyed by column name
    ///
    /// Duplicate column names (e.g. `SELECT 1 AS a, 2 AS a`) keep the last value.
    pub fn to_json_objects(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.iter())
                    .map(|(name, cell)| (name.clone(), Value::from(cell)))
                    .collect()
            })
            .collect()
    }
}

/// Column description as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "display", derive(tabled::Tabled))]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "display", tabled(rename = "type"))]
    pub declared_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_serialization_is_plain_json() {
        let cells = vec![
            CellValue::Null,
            CellValue::Integer(5),
            CellValue::Real(1.5),
            CellValue::Text("2024-03-05".into()),
        ];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[null,5,1.5,"2024-03-05"]"#);
    }

    #[test]
    fn test_to_json_objects() {
        let rs = ResultSet {
            columns: vec!["a".into(), "b".into()],
            rows: vec![vec![CellValue::Integer(1), CellValue::Text("x".into())]],
        };
        let objects = rs.to_json_objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0]["a"], Value::from(1));
        assert_eq!(objects[0]["b"], Value::from("x"));
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Null.to_string(), "NULL");
        assert_eq!(CellValue::Blob(vec![1, 2, 3]).to_string(), "<blob 3 bytes>");
    }
}
