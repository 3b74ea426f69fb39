//! Delimited-text parsing for run logs
//!
//! Input files are whitespace- or separator-delimited numeric tables,
//! optionally starting with a single header line. A line is a header if
//! any of its whitespace-delimited tokens fails float parsing.

use evoplot_core::{Error, Result};
use std::fs;
use std::path::Path;

/// Split a line on the configured separator, discarding empty tokens.
/// `None` splits on any whitespace.
pub fn split_line(line: &str, separator: Option<char>) -> Vec<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    match separator {
        Some(sep) => line
            .split(sep)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect(),
        None => line.split_whitespace().collect(),
    }
}

/// Header heuristic: any whitespace token that fails float parsing marks
/// the line as a header
pub fn is_header_line(line: &str) -> bool {
    line.split_whitespace()
        .any(|token| token.parse::<f64>().is_err())
}

/// Parse one numeric token; failure is fatal and names the file and line
pub fn parse_value(token: &str, file: &Path, line_nr: usize) -> Result<f64> {
    token
        .parse::<f64>()
        .map_err(|_| Error::bad_token(file, line_nr, token))
}

/// A data file with its header (if any) stripped
pub struct DataLines {
    /// Data lines, in file order
    pub lines: Vec<String>,
    /// 1-based file line number of the first data line
    pub first_line_nr: usize,
}

impl DataLines {
    /// Iterate `(file_line_nr, line)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| (self.first_line_nr + i, line.as_str()))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Read a file, skipping a leading header line if present
pub fn read_data_lines(file: &Path) -> Result<DataLines> {
    let content = fs::read_to_string(file)?;
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    let mut first_line_nr = 1;
    if let Some(first) = lines.first() {
        if is_header_line(first) {
            lines.remove(0);
            first_line_nr = 2;
        }
    }
    Ok(DataLines {
        lines,
        first_line_nr,
    })
}
