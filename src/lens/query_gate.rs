//! Read-only query execution
//!
//! A query must start with `select` (after trimming, case-insensitive). The
//! store then enforces that the text holds exactly one statement and that the
//! engine considers it read-only, running it on a `query_only` connection.

use crate::database::{ResultSet, SchemaStore};
use crate::error::{ConsoleError, ConsoleResult};

pub struct QueryGate<'a> {
    store: &'a SchemaStore,
}

impl<'a> QueryGate<'a> {
    pub fn new(store: &'a SchemaStore) -> Self {
        Self { store }
    }

    /// Check the prefix policy without running anything
    pub fn check_policy(sql: &str) -> ConsoleResult<()> {
        if sql.trim().to_lowercase().starts_with("select") {
            Ok(())
        } else {
            Err(ConsoleError::PolicyViolation(
                "only SELECT queries are allowed".to_string(),
            ))
        }
    }

    /// Run a read-only query, passing the text through verbatim
    pub fn run_select(&self, sql: &str) -> ConsoleResult<ResultSet> {
        let result = Self::check_policy(sql).and_then(|_| self.store.execute_query(sql));
        if let Err(ConsoleError::PolicyViolation(reason)) = &result {
            tracing::warn!("rejected query: {}", reason);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::CellValue;

    fn store() -> SchemaStore {
        let store = SchemaStore::open_in_memory().unwrap();
        store
            .execute_ddl(r#"CREATE TABLE "x" ("a" INTEGER)"#)
            .unwrap();
        store
            .execute_dml(r#"INSERT INTO "x" VALUES (?)"#, &["1".to_string()])
            .unwrap();
        store
    }

    #[test]
    fn test_select_one() {
        let store = store();
        let rs = QueryGate::new(&store).run_select("select 1").unwrap();
        assert_eq!(rs.columns.len(), 1);
        assert_eq!(rs.rows, vec![vec![CellValue::Integer(1)]]);
    }

    #[test]
    fn test_prefix_is_case_and_whitespace_insensitive() {
        let store = store();
        let rs = QueryGate::new(&store)
            .run_select("   SeLeCt a FROM x  ")
            .unwrap();
        assert_eq!(rs.row_count(), 1);
    }

    #[test]
    fn test_drop_is_rejected_without_mutation() {
        let store = store();
        let err = QueryGate::new(&store).run_select("DROP TABLE x").unwrap_err();
        assert!(matches!(err, ConsoleError::PolicyViolation(_)));
        assert_eq!(store.list_tables().unwrap(), vec!["x".to_string()]);
    }

    #[test]
    fn test_smuggled_statement_is_rejected() {
        let store = store();
        let err = QueryGate::new(&store)
            .run_select("select 1; DROP TABLE x")
            .unwrap_err();
        assert!(matches!(err, ConsoleError::PolicyViolation(_)));
        assert!(store.table_exists("x").unwrap());
    }

    #[test]
    fn test_bad_sql_is_execution_error() {
        let store = store();
        let err = QueryGate::new(&store)
            .run_select("select * from nowhere")
            .unwrap_err();
        assert!(matches!(err, ConsoleError::SqlExecution(_)));
    }
}
