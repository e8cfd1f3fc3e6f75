//! Column alignment for table pages.
//!
//! Converts row records into aligned text lines. The header line is returned
//! separately so the viewport can pin it above the scrolled content.

use std::collections::HashMap;
use std::fmt::Write;

use unicode_width::UnicodeWidthStr;

/// One record keyed by lowercase column name.
pub type Record = HashMap<&'static str, String>;

/// Result of table formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatTableResult {
    pub header: String,
    pub lines: Vec<String>,
}

const SEPARATOR_WIDTH: usize = 3;

/// Single-pass extraction of all cell values with width calculation.
/// Returns (extracted_rows, column_widths) where widths[i] is max width for column i.
#[inline]
fn extract_all_cells<'a>(records: &'a [Record], columns: &[String]) -> (Vec<Vec<&'a str>>, Vec<usize>) {
    let mut widths = vec![0usize; columns.len()];
    let mut extracted = Vec::with_capacity(records.len());

    for record in records {
        let mut row_cells = Vec::with_capacity(columns.len());
        for (col_idx, col) in columns.iter().enumerate() {
            let value = record.get(col.as_str()).map(String::as_str).unwrap_or("");
            widths[col_idx] = widths[col_idx].max(value.width());
            row_cells.push(value);
        }
        extracted.push(row_cells);
    }

    (extracted, widths)
}

/// Widen each column to fit its header plus the separator; the last column gets no separator.
#[inline]
fn apply_padding(widths: &mut [usize], headers: &[String]) {
    let ncols = headers.len();
    for (i, header) in headers.iter().enumerate() {
        widths[i] = widths[i].max(header.width());
        if i + 1 < ncols {
            widths[i] += SEPARATOR_WIDTH;
        }
    }
}

fn pad_cell(line: &mut String, value: &str, width: usize) {
    let fill = width.saturating_sub(value.width());
    let _ = write!(line, "{value}{:fill$}", "");
}

/// Format records into an aligned header line and one line per record.
///
/// `columns` are display headers; a record cell is looked up by the lowercase
/// header with spaces replaced by underscores.
#[tracing::instrument(skip(records), fields(rows = records.len()))]
pub fn format_table(records: &[Record], columns: &[String]) -> FormatTableResult {
    if columns.is_empty() {
        return FormatTableResult::default();
    }

    let keys: Vec<String> = columns.iter().map(|h| column_key(h)).collect();
    let headers: Vec<String> = columns.iter().map(|h| h.to_uppercase()).collect();

    let (extracted, mut widths) = extract_all_cells(records, &keys);
    apply_padding(&mut widths, &headers);
    let total_width: usize = widths.iter().sum();

    let mut header = String::with_capacity(total_width);
    for (i, h) in headers.iter().enumerate() {
        pad_cell(&mut header, h, widths[i]);
    }

    let lines = extracted
        .iter()
        .map(|cells| {
            let mut line = String::with_capacity(total_width);
            for (i, cell) in cells.iter().enumerate() {
                pad_cell(&mut line, cell, widths[i]);
            }
            line.trim_end().to_string()
        })
        .collect();

    FormatTableResult {
        header: header.trim_end().to_string(),
        lines,
    }
}

/// Normalizes a configured column name to its record key.
pub fn column_key(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Parses a comma separated column list, validating against the known columns.
pub fn parse_columns(raw: &str, known: &[&str]) -> Result<Vec<String>, String> {
    let columns: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if columns.is_empty() {
        return Err("no columns given".to_string());
    }
    for col in &columns {
        if !known.contains(&column_key(col).as_str()) {
            return Err(format!("unknown column {col:?}, expected one of {}", known.join(", ")));
        }
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&'static str, &str)]) -> Record {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_format_empty_table() {
        let result = format_table(&[], &["Name".to_string()]);
        assert!(result.lines.is_empty());
        assert_eq!(result.header, "NAME");
    }

    #[test]
    fn test_format_simple_table() {
        let rows = vec![
            record(&[("name", "web"), ("status", "running")]),
            record(&[("name", "batch-reporting"), ("status", "dead")]),
        ];
        let result = format_table(&rows, &["Name".to_string(), "Status".to_string()]);

        assert_eq!(result.lines.len(), 2);
        assert!(result.header.starts_with("NAME"));
        let status_col = result.header.find("STATUS").unwrap();
        assert_eq!(result.lines[0].find("running"), Some(status_col));
        assert_eq!(result.lines[1].find("dead"), Some(status_col));
    }

    #[test]
    fn test_wide_glyphs_align_by_display_width() {
        let rows = vec![
            record(&[("name", "日本"), ("status", "a")]),
            record(&[("name", "abcd"), ("status", "b")]),
        ];
        let result = format_table(&rows, &["Name".to_string(), "Status".to_string()]);
        assert_eq!(result.lines[0].width(), result.lines[1].width());
    }

    #[test]
    fn test_parse_columns() {
        let known = ["name", "status", "alloc_id"];
        assert_eq!(
            parse_columns("Name, Alloc ID", &known).unwrap(),
            vec!["Name".to_string(), "Alloc ID".to_string()]
        );
        assert!(parse_columns("nope", &known).is_err());
        assert!(parse_columns(" , ", &known).is_err());
    }
}
