//! catalog::table
//!
//! Header-first delimited table codec.
//!
//! # Format
//!
//! The first non-blank line names the columns; every following non-blank
//! line is a row. Columns are addressed by name, so producers may reorder
//! columns freely. The delimiter is selected per file extension through
//! [`TableFormat::for_extension`]; only tab-separated tables ship, and
//! adding a format means adding an arm there.

use indexmap::IndexMap;
use thiserror::Error;

/// Errors from table parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// The resource had no header line.
    #[error("table has no header line")]
    Empty,

    /// A row had fewer columns than the header.
    #[error("row {line_number} has {found} columns, header has {expected}: {line}")]
    ShortRow {
        line_number: usize,
        expected: usize,
        found: usize,
        line: String,
    },
}

/// A delimited table format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFormat {
    column_separator: char,
}

impl TableFormat {
    /// Look up the format for a file extension.
    ///
    /// Returns `None` for extensions with no registered format.
    pub fn for_extension(extension: &str) -> Option<Self> {
        match extension {
            "tsv" => Some(Self {
                column_separator: '\t',
            }),
            _ => None,
        }
    }

    /// Parse table content into one column-name → value map per row.
    ///
    /// Blank and whitespace-only lines are skipped. Rows longer than the
    /// header keep only the named columns; shorter rows are an error.
    pub fn parse(&self, content: &str) -> Result<Vec<IndexMap<String, String>>, TableError> {
        let mut lines = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header_line) = lines.next().ok_or(TableError::Empty)?;
        let columns: Vec<&str> = header_line.trim().split(self.column_separator).collect();

        let mut rows = Vec::new();
        for (index, line) in lines {
            let fields: Vec<&str> = line.trim().split(self.column_separator).collect();
            if fields.len() < columns.len() {
                return Err(TableError::ShortRow {
                    line_number: index + 1,
                    expected: columns.len(),
                    found: fields.len(),
                    line: line.to_string(),
                });
            }
            let row = columns
                .iter()
                .zip(fields.iter())
                .map(|(c, f)| (c.to_string(), f.to_string()))
                .collect();
            rows.push(row);
        }
        Ok(rows)
    }
}
