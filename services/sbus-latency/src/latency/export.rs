//! Semicolon separated delay export
//!
//! Each run contributes one column: a title in row 0 followed by one delay per
//! correlated trigger. Appending merges the new column into an existing file
//! by row index, so several runs can be compared side by side.

use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::Result;

const DELIMITER: u8 = b';';

/// Rows of cells with a known column count
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportTable {
    rows: Vec<Vec<String>>,
    columns: usize,
}

impl ReportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an existing report; a missing file is an empty table
    ///
    /// Rows stay aligned with the file's lines: a blank line is kept as a row
    /// holding one empty cell.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Report {} does not exist yet", path.display());
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        let mut reader = ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(content.as_bytes());

        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            // The reader skips blank lines, its position still counts them
            let line = record.position().map_or(rows.len() + 1, |pos| pos.line() as usize);
            while rows.len() + 1 < line {
                rows.push(vec![String::new()]);
            }
            rows.push(record.iter().map(str::to_string).collect());
        }
        let lines = content.lines().count();
        if rows.len() < lines {
            rows.resize(lines, vec![String::new()]);
        }
        let columns = rows.first().map_or(0, |row| row.len());

        Ok(Self { rows, columns })
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Add a column holding `title` in row 0 and `values` below it
    ///
    /// An existing row keeps all of its cells and gets the new one after them.
    /// Rows that do not exist yet start with one empty cell per existing
    /// column. Existing rows the new column does not reach get an empty cell.
    pub fn append_column<I, S>(&mut self, title: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = self.columns;
        let cells = std::iter::once(title.to_string()).chain(values.into_iter().map(Into::into));

        let mut filled = 0;
        for (i, cell) in cells.enumerate() {
            match self.rows.get_mut(i) {
                Some(row) => row.push(cell),
                None => {
                    let mut row = vec![String::new(); columns];
                    row.push(cell);
                    self.rows.push(row);
                }
            }
            filled = i + 1;
        }

        for row in self.rows.iter_mut().skip(filled) {
            row.push(String::new());
        }
        self.columns += 1;
    }

    /// Write the table, replacing `path`
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .delimiter(DELIMITER)
            .flexible(true)
            .from_path(path)?;

        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Export delays as a new column of the report at `path`
///
/// Without `append` the file is rewritten with only this column. Returns the
/// number of delays written.
pub fn export_delays<I>(path: &Path, title: &str, append: bool, delays: I) -> Result<usize>
where
    I: IntoIterator<Item = f64>,
{
    let mut table = if append {
        ReportTable::load(path)?
    } else {
        ReportTable::new()
    };

    let values: Vec<String> = delays.into_iter().map(format_delay).collect();
    let count = values.len();
    table.append_column(title, values);
    table.write(path)?;

    debug!(
        "Exported {} delays to {} ({} rows, {} columns)",
        count,
        path.display(),
        table.rows().len(),
        table.columns()
    );
    Ok(count)
}

/// Shortest representation that reads back to the same value, e.g. `2.0`
fn format_delay(delay_ms: f64) -> String {
    format!("{:?}", delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_append_to_existing_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        fs::write(&path, "A\n").unwrap();

        export_delays(&path, "B", true, [5.0]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["A;B", ";5.0"]);
    }

    #[test]
    fn test_merge_by_row_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        fs::write(&path, "A;B\n1.0;2.0 \n3.0;4.0\n").unwrap();

        export_delays(&path, "C", true, [7.5, 8.25, 9.0]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["A;B;C", "1.0;2.0;7.5", "3.0;4.0;8.25", ";;9.0"]);
    }

    #[test]
    fn test_existing_rows_beyond_new_column_are_kept() {
        let mut table = ReportTable {
            rows: vec![
                vec!["A".to_string()],
                vec!["1.0".to_string()],
                vec!["2.0".to_string()],
            ],
            columns: 1,
        };
        table.append_column("B", ["3.0"]);

        assert_eq!(table.columns(), 2);
        assert_eq!(table.rows()[0], vec!["A", "B"]);
        assert_eq!(table.rows()[1], vec!["1.0", "3.0"]);
        assert_eq!(table.rows()[2], vec!["2.0", ""]);
    }

    #[test]
    fn test_existing_cells_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        fs::write(&path, "A\n1;2\n").unwrap();

        export_delays(&path, "B", true, [5.0]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "A;B\n1;2;5.0\n");
    }

    #[test]
    fn test_blank_rows_keep_their_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        fs::write(&path, "A\n\n3\n").unwrap();

        let table = ReportTable::load(&path).unwrap();
        assert_eq!(table.rows().len(), 3);

        export_delays(&path, "B", true, [5.0, 6.0]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "A;B\n;5.0\n3;6.0\n");
    }

    #[test]
    fn test_overwrite_without_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        fs::write(&path, "old;data\n1;2\n").unwrap();

        let written = export_delays(&path, "Unknown", false, [2.0000000000000018, 3.5]).unwrap();
        assert_eq!(written, 2);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Unknown\n2.0000000000000018\n3.5\n");
    }

    #[test]
    fn test_append_to_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.csv");

        let table = ReportTable::load(&path).unwrap();
        assert_eq!(table.columns(), 0);
        assert!(table.rows().is_empty());

        export_delays(&path, "First", true, [1.0]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "First\n1.0\n");
    }
}
