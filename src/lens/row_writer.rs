//! Row insertion with type-aware coercion
//!
//! Values arrive as text in column order. `DATE` columns are normalized to
//! `YYYY-MM-DD`; everything else is bound as-is and left to the engine's type
//! affinity.

use crate::database::{quote_identifier, sanitize_identifier, ColumnInfo, SchemaStore};
use crate::error::{ConsoleError, ConsoleResult};
use chrono::{DateTime, NaiveDate};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

pub struct RowWriter<'a> {
    store: &'a SchemaStore,
}

impl<'a> RowWriter<'a> {
    pub fn new(store: &'a SchemaStore) -> Self {
        Self { store }
    }

    /// Insert one row into an existing table
    ///
    /// Returns the number of rows written.
    pub fn insert_row(&self, table: &str, values: &[String]) -> ConsoleResult<usize> {
        let table = sanitize_identifier("table name", table.trim())?;
        if !self.store.table_exists(table)? {
            return Err(ConsoleError::SqlExecution(format!("no such table: {}", table)));
        }

        let columns = self.store.describe(table)?;
        let params = coerce_values(&columns, values)?;

        let placeholders = vec!["?"; params.len()].join(", ");
        let statement = format!(
            "INSERT INTO {} VALUES ({})",
            quote_identifier(table),
            placeholders
        );
        let written = self.store.execute_dml(&statement, &params)?;
        tracing::info!("inserted {} row(s) into {}", written, table);
        Ok(written)
    }
}

/// Align `values` with `columns`, normalizing date columns
pub fn coerce_values(columns: &[ColumnInfo], values: &[String]) -> ConsoleResult<Vec<String>> {
    if columns.len() != values.len() {
        return Err(ConsoleError::validation(
            "values",
            format!(
                "expected {} values, got {}",
                columns.len(),
                values.len()
            ),
        ));
    }

    columns
        .iter()
        .zip(values)
        .map(|(column, value)| {
            if column.declared_type.to_ascii_uppercase().contains("DATE") {
                coerce_date(value).ok_or_else(|| {
                    ConsoleError::validation(
                        column.name.as_str(),
                        format!("'{}' is not a date (use YYYY-MM-DD)", value),
                    )
                })
            } else {
                Ok(value.clone())
            }
        })
        .collect()
}

/// Parse a calendar date and render it as `YYYY-MM-DD`
pub fn coerce_date(value: &str) -> Option<String> {
    let value = value.trim();
    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|ts| ts.date_naive())
        })?;
    Some(date.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::CellValue;

    fn store_with(ddl: &str) -> SchemaStore {
        let store = SchemaStore::open_in_memory().unwrap();
        store.execute_ddl(ddl).unwrap();
        store
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_coerce_date_formats() {
        assert_eq!(coerce_date("2024-03-05").as_deref(), Some("2024-03-05"));
        assert_eq!(coerce_date(" 2024/03/05 ").as_deref(), Some("2024-03-05"));
        assert_eq!(
            coerce_date("2024-03-05T23:10:00+02:00").as_deref(),
            Some("2024-03-05")
        );
        assert_eq!(coerce_date("2024-02-30"), None);
        assert_eq!(coerce_date("yesterday"), None);
        assert_eq!(coerce_date(""), None);
    }

    #[test]
    fn test_date_column_round_trip() {
        let store = store_with(r#"CREATE TABLE "events" ("name" TEXT, "day" DATE)"#);
        let writer = RowWriter::new(&store);
        writer
            .insert_row("events", &strings(&["launch", "2024-03-05"]))
            .unwrap();
        writer
            .insert_row("events", &strings(&["review", "2024/03/06"]))
            .unwrap();

        let rows = store.read_all("events").unwrap();
        assert_eq!(rows.rows[0][1], CellValue::Text("2024-03-05".into()));
        assert_eq!(rows.rows[1][1], CellValue::Text("2024-03-06".into()));
    }

    #[test]
    fn test_integer_affinity_applies() {
        let store = store_with(r#"CREATE TABLE "t" ("a" INTEGER)"#);
        RowWriter::new(&store)
            .insert_row("t", &strings(&["5"]))
            .unwrap();
        let rows = store.read_all("t").unwrap();
        assert_eq!(rows.rows, vec![vec![CellValue::Integer(5)]]);
    }

    #[test]
    fn test_bad_date_is_validation_error() {
        let store = store_with(r#"CREATE TABLE "t" ("d" DATE)"#);
        let err = RowWriter::new(&store)
            .insert_row("t", &strings(&["not a date"]))
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { ref field, .. } if field == "d"));
        assert!(store.read_all("t").unwrap().is_empty());
    }

    #[test]
    fn test_arity_mismatch() {
        let store = store_with(r#"CREATE TABLE "t" ("a" TEXT, "b" TEXT)"#);
        let err = RowWriter::new(&store)
            .insert_row("t", &strings(&["only one"]))
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Validation { ref field, .. } if field == "values"));
    }

    #[test]
    fn test_unknown_table() {
        let store = SchemaStore::open_in_memory().unwrap();
        let err = RowWriter::new(&store)
            .insert_row("missing", &strings(&["x"]))
            .unwrap_err();
        assert!(matches!(err, ConsoleError::SqlExecution(_)));
    }

    #[test]
    fn test_values_are_bound_not_spliced() {
        let store = store_with(r#"CREATE TABLE "t" ("a" TEXT)"#);
        let hostile = "x'); DROP TABLE t; --";
        RowWriter::new(&store)
            .insert_row("t", &strings(&[hostile]))
            .unwrap();
        let rows = store.read_all("t").unwrap();
        assert_eq!(rows.rows[0][0], CellValue::Text(hostile.into()));
    }
}
