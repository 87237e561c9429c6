//! Dynamic table creation
//!
//! Validates a user-supplied column specification and compiles it into a
//! `CREATE TABLE` statement. Nothing is sent to the database unless the whole
//! specification is valid.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlscribe::lens::table_builder::{ColumnSpec, TableBuilder};
//!
//! let builder = TableBuilder::new(&store);
//! let columns = vec![ColumnSpec::new("id", "INTEGER"), ColumnSpec::new("born", "DATE")];
//! let table = builder.create_table("people", &columns)?;
//! assert_eq!(table.to_sql(), r#"CREATE TABLE "people" ("id" INTEGER, "born" DATE)"#);
//! ```

use crate::database::{quote_identifier, sanitize_identifier, SchemaStore};
use crate::error::{ConsoleError, ConsoleResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of columns a table may be created with
pub const MAX_COLUMNS: usize = 10;

// =============================================================================
// Types
// =============================================================================

/// Column types offered when creating a table
///
/// `Date` is stored as canonical `YYYY-MM-DD` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Integer,
    Text,
    Real,
    Date,
}

impl ColumnType {
    pub const ALL: [ColumnType; 4] = [
        ColumnType::Integer,
        ColumnType::Text,
        ColumnType::Real,
        ColumnType::Date,
    ];

    pub fn as_sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
            ColumnType::Real => "REAL",
            ColumnType::Date => "DATE",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INTEGER" => Ok(ColumnType::Integer),
            "TEXT" => Ok(ColumnType::Text),
            "REAL" => Ok(ColumnType::Real),
            "DATE" => Ok(ColumnType::Date),
            _ => Err(format!(
                "'{}' is not one of INTEGER, TEXT, REAL, DATE",
                s.trim()
            )),
        }
    }
}

/// A column as entered by the user: free-form name and type text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

impl FromStr for ColumnSpec {
    type Err = String;

    /// Parse `name:TYPE`, as accepted on the command line
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((name, column_type)) => Ok(ColumnSpec::new(name, column_type)),
            None => Err(format!("expected NAME:TYPE, got '{}'", s)),
        }
    }
}

/// A validated table definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<(String, ColumnType)>,
}

impl TableDefinition {
    /// Compile to a `CREATE TABLE` statement with quoted identifiers
    pub fn to_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|(name, ty)| format!("{} {}", quote_identifier(name), ty.as_sql()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({})", quote_identifier(&self.name), columns)
    }
}

// =============================================================================
// Lens
// =============================================================================

/// Validates column specifications and creates tables
pub struct TableBuilder<'a> {
    store: &'a SchemaStore,
}

impl<'a> TableBuilder<'a> {
    pub fn new(store: &'a SchemaStore) -> Self {
        Self { store }
    }

    /// Validate a table specification without touching the database
    ///
    /// Checks run in a fixed order and the first failure is reported: column
    /// count, table name, every column name, name uniqueness, every type.
    /// Names are trimmed of surrounding whitespace first.
    pub fn validate(name: &str, columns: &[ColumnSpec]) -> ConsoleResult<TableDefinition> {
        if columns.is_empty() || columns.len() > MAX_COLUMNS {
            return Err(ConsoleError::validation(
                "columns",
                format!(
                    "a table needs between 1 and {} columns, got {}",
                    MAX_COLUMNS,
                    columns.len()
                ),
            ));
        }

        let table = sanitize_identifier("table name", name.trim())?;

        let mut names: Vec<&str> = Vec::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            names.push(sanitize_identifier(
                &format!("column {} name", i + 1),
                column.name.trim(),
            )?);
        }

        // the engine compares column names case-insensitively
        for (i, name) in names.iter().enumerate() {
            if names[..i].iter().any(|prev| prev.eq_ignore_ascii_case(name)) {
                return Err(ConsoleError::validation(
                    format!("column {} name", i + 1),
                    format!("duplicate column name '{}'", name),
                ));
            }
        }

        let mut typed = Vec::with_capacity(columns.len());
        for (i, (name, column)) in names.iter().zip(columns).enumerate() {
            let ty = column
                .column_type
                .parse::<ColumnType>()
                .map_err(|e| ConsoleError::validation(format!("column {} type", i + 1), e))?;
            typed.push((name.to_string(), ty));
        }

        Ok(TableDefinition {
            name: table.to_string(),
            columns: typed,
        })
    }

    /// Validate, then create the table
    pub fn create_table(&self, name: &str, columns: &[ColumnSpec]) -> ConsoleResult<TableDefinition> {
        let definition = Self::validate(name, columns)?;
        self.store.execute_ddl(&definition.to_sql())?;
        tracing::info!(
            "created table {} with {} columns",
            definition.name,
            definition.columns.len()
        );
        Ok(definition)
    }
}

// =============================================================================
// Tests
// =============================================================================
