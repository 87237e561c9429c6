//! Output formatting shared by every lens
//!
//! Results are rendered as bordered tables, markdown tables, JSON variants or
//! pipe-separated text. Table rendering needs the `display` feature; without
//! it the table formats fall back to pipe-separated output.

use crate::database::{ColumnInfo, ResultSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Default maximum width of a cell in table output
pub const DEFAULT_CELL_MAX_LEN: usize = 40;

/// Output format for console results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Pretty table with borders (default)
    #[default]
    Table,
    /// Markdown table format
    Markdown,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON with indentation
    JsonPretty,
    /// One JSON object per row
    JsonLine,
    /// Pipe-separated values with header
    Psv,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty | Self::JsonLine)
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table | Self::Markdown)
    }

    /// All format names, for help text
    pub fn all_names() -> &'static [&'static str] {
        &[
            "table",
            "markdown",
            "json",
            "json-pretty",
            "json-line",
            "psv",
        ]
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::JsonPretty => write!(f, "json-pretty"),
            Self::JsonLine => write!(f, "json-line"),
            Self::Psv => write!(f, "psv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "json-pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            "json-line" | "jsonline" | "jsonl" | "ndjson" => Ok(Self::JsonLine),
            "psv" | "pipe" => Ok(Self::Psv),
            _ => Err(format!(
                "Unknown output format '{}'. Valid formats: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}

/// Truncate a cell to `max_len` characters, marking the cut with "..."
pub fn truncate_cell(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Render a query result
///
/// A result with no rows still prints its header in table and PSV formats.
pub fn render_result_set(result: &ResultSet, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(&result.to_json_objects()).unwrap_or_default(),
        OutputFormat::JsonPretty => {
            serde_json::to_string_pretty(&result.to_json_objects()).unwrap_or_default()
        }
        OutputFormat::JsonLine => result
            .to_json_objects()
            .into_iter()
            .map(|obj| Value::Object(obj).to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => {
            let rows: Vec<Vec<String>> = result
                .rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect();
            render_grid(&result.columns, &rows, format)
        }
    }
}

/// Render a column listing as `name | type`
pub fn render_columns(columns: &[ColumnInfo], format: OutputFormat) -> String {
    if format.is_json() {
        return render_json(columns, format);
    }
    let rows: Vec<Vec<String>> = columns
        .iter()
        .map(|c| vec![c.name.clone(), c.declared_type.clone()])
        .collect();
    render_grid(&["name".to_string(), "type".to_string()], &rows, format)
}

/// Render a single-column list such as table names
pub fn render_names(header: &str, names: &[String], format: OutputFormat) -> String {
    if format.is_json() {
        return render_json(names, format);
    }
    let rows: Vec<Vec<String>> = names.iter().map(|n| vec![n.clone()]).collect();
    render_grid(&[header.to_string()], &rows, format)
}

fn render_json<T: Serialize>(items: &[T], format: OutputFormat) -> String {
    match format {
        OutputFormat::JsonPretty => serde_json::to_string_pretty(items).unwrap_or_default(),
        OutputFormat::JsonLine => items
            .iter()
            .filter_map(|item| serde_json::to_string(item).ok())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => serde_json::to_string(items).unwrap_or_default(),
    }
}

fn render_grid(header: &[String], rows: &[Vec<String>], format: OutputFormat) -> String {
    #[cfg(feature = "display")]
    if format.is_table() {
        return render_table(header, rows, format);
    }
    let _ = format;

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header.join("|"));
    for row in rows {
        lines.push(row.join("|"));
    }
    lines.join("\n")
}

#[cfg(feature = "display")]
fn render_table(header: &[String], rows: &[Vec<String>], format: OutputFormat) -> String {
    use tabled::builder::Builder;
    use tabled::settings::Style;

    let mut builder = Builder::default();
    builder.push_record(header.iter().cloned());
    for row in rows {
        builder.push_record(row.iter().map(|c| truncate_cell(c, DEFAULT_CELL_MAX_LEN)));
    }

    let mut table = builder.build();
    match format {
        OutputFormat::Markdown => table.with(Style::markdown()),
        _ => table.with(Style::rounded()),
    };
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::CellValue;

    fn sample() -> ResultSet {
        ResultSet {
            columns: vec!["id".into(), "born".into()],
            rows: vec![
                vec![CellValue::Integer(1), CellValue::Text("2024-03-05".into())],
                vec![CellValue::Integer(2), CellValue::Null],
            ],
        }
    }

    #[test]
    fn test_truncate_cell() {
        assert_eq!(truncate_cell("Short", 20), "Short");
        assert_eq!(
            truncate_cell("This is a very long cell value", 20),
            "This is a very lo..."
        );
        assert_eq!(truncate_cell("日本語テスト名前これは長い", 10), "日本語テスト名...");
        assert_eq!(truncate_cell("Hello", 3), "...");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("pretty").unwrap(), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str("md").unwrap(), OutputFormat::Markdown);
        assert_eq!(OutputFormat::from_str("JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str("jsonl").unwrap(), OutputFormat::JsonLine);
        assert_eq!(OutputFormat::from_str("pipe").unwrap(), OutputFormat::Psv);
        assert!(OutputFormat::from_str("csv").is_err());
    }

    #[test]
    fn test_output_format_display_round_trips_names() {
        for name in OutputFormat::all_names() {
            let format = OutputFormat::from_str(name).unwrap();
            assert_eq!(format.to_string(), *name);
        }
    }

    #[test]
    fn test_render_psv() {
        let out = render_result_set(&sample(), OutputFormat::Psv);
        assert_eq!(out, "id|born\n1|2024-03-05\n2|NULL");
    }

    #[test]
    fn test_render_json_variants() {
        let json = render_result_set(&sample(), OutputFormat::Json);
        assert_eq!(
            json,
            r#"[{"born":"2024-03-05","id":1},{"born":null,"id":2}]"#
        );

        let lines = render_result_set(&sample(), OutputFormat::JsonLine);
        assert_eq!(lines.lines().count(), 2);
    }

    #[test]
    fn test_render_empty_result_keeps_header() {
        let empty = ResultSet::new(vec!["a".into()]);
        assert_eq!(render_result_set(&empty, OutputFormat::Psv), "a");
        assert_eq!(render_result_set(&empty, OutputFormat::Json), "[]");
    }

    #[test]
    fn test_render_names_and_columns() {
        let names = vec!["alpha".to_string(), "beta".to_string()];
        assert_eq!(
            render_names("table", &names, OutputFormat::Psv),
            "table\nalpha\nbeta"
        );
        assert_eq!(
            render_names("table", &names, OutputFormat::Json),
            r#"["alpha","beta"]"#
        );

        let columns = vec![ColumnInfo {
            name: "id".into(),
            declared_type: "INTEGER".into(),
        }];
        assert_eq!(
            render_columns(&columns, OutputFormat::Json),
            r#"[{"name":"id","type":"INTEGER"}]"#
        );
    }

    #[cfg(feature = "display")]
    #[test]
    fn test_render_markdown_table() {
        let out = render_result_set(&sample(), OutputFormat::Markdown);
        assert!(out.contains("| id | born"));
        assert!(out.contains("2024-03-05"));
    }
}
