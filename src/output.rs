//! Output rendering shared by dbctl and semctl.
//!
//! Every command renders one JSON value: pretty-printed JSON by default, or a
//! fixed-width aligned text table for row lists when `--format table` is
//! requested. Table cells are truncated with an ellipsis so one oversized
//! value cannot blow up the layout.

use clap::ValueEnum;
use serde_json::Value;

/// Maximum rendered cell width, ellipsis included.
pub const MAX_CELL_WIDTH: usize = 80;

const ELLIPSIS: &str = "...";
const COLUMN_SEP: &str = "  ";

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON (default)
    #[default]
    Json,
    /// Fixed-width aligned text table
    Table,
}

/// Renders `data` in the requested format.
///
/// Table mode applies only to arrays; any other payload falls back to JSON.
/// When no column list is given the columns are derived from the first row's
/// key order.
pub fn render(
    data: &Value,
    format: OutputFormat,
    columns: Option<&[&str]>,
    headers: Option<&[&str]>,
) -> String {
    if format == OutputFormat::Table {
        if let Some(rows) = data.as_array() {
            return format_table(rows, columns, headers);
        }
    }
    serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string())
}

/// Renders and prints `data` to stdout.
pub fn emit(data: &Value, format: OutputFormat, columns: Option<&[&str]>, headers: Option<&[&str]>) {
    println!("{}", render(data, format, columns, headers));
}

/// Formats rows as an aligned table.
///
/// Column widths equal the longest of the header and every (truncated) cell
/// in that column.
pub fn format_table(rows: &[Value], columns: Option<&[&str]>, headers: Option<&[&str]>) -> String {
    if rows.is_empty() {
        return "(no results)".to_string();
    }

    let columns: Vec<String> = match columns {
        Some(cols) => cols.iter().map(|c| c.to_string()).collect(),
        None => rows[0]
            .as_object()
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default(),
    };
    if columns.is_empty() {
        return serde_json::to_string_pretty(&Value::Array(rows.to_vec()))
            .unwrap_or_else(|_| String::new());
    }
    let headers: Vec<String> = match headers {
        Some(hs) => hs.iter().map(|h| h.to_string()).collect(),
        None => columns.clone(),
    };

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    let mut str_rows: Vec<Vec<String>> = Vec::with_capacity(rows.len());
    for row in rows {
        let vals: Vec<String> = columns
            .iter()
            .map(|col| truncate_cell(&cell_text(row.get(col.as_str()))))
            .collect();
        for (i, val) in vals.iter().enumerate() {
            widths[i] = widths[i].max(val.chars().count());
        }
        str_rows.push(vals);
    }

    let mut lines = Vec::with_capacity(str_rows.len() + 2);
    lines.push(join_row(&headers, &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "\u{2500}".repeat(*w))
            .collect::<Vec<_>>()
            .join(COLUMN_SEP),
    );
    for vals in &str_rows {
        lines.push(join_row(vals, &widths));
    }
    lines.join("\n")
}

fn join_row(vals: &[String], widths: &[usize]) -> String {
    vals.iter()
        .zip(widths)
        .map(|(v, w)| {
            let pad = w.saturating_sub(v.chars().count());
            format!("{v}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join(COLUMN_SEP)
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn truncate_cell(text: &str) -> String {
    if text.chars().count() > MAX_CELL_WIDTH {
        let kept: String = text.chars().take(MAX_CELL_WIDTH - ELLIPSIS.len()).collect();
        format!("{kept}{ELLIPSIS}")
    } else {
        text.to_string()
    }
}
