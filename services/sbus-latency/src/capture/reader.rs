//! CSV capture loading
//!
//! Column 0 holds the sample time in seconds, the remaining columns hold one
//! logic level per channel. The first row is always a header and is skipped,
//! whatever it contains.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, trace};

use super::transitions::{debounce, Transition};
use crate::error::{LatencyError, Result};

const TIME_COLUMN: usize = 0;

/// A fully buffered capture
#[derive(Debug, Clone, Default)]
pub struct Capture {
    records: Vec<StringRecord>,
}

impl Capture {
    /// Read a capture file
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Read a capture from any CSV source
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(rdr);

        let records = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!("Capture loaded: {} samples", records.len());

        Ok(Self { records })
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Raw level changes of one column, before debouncing
    ///
    /// A transition is emitted on the first data row and on every row whose
    /// level differs from the last emitted one.
    pub fn raw_transitions(&self, column: usize) -> Result<Vec<Transition>> {
        let mut transitions = Vec::new();
        let mut last: Option<u8> = None;

        for (i, record) in self.records.iter().enumerate() {
            let row = i + 1;
            let level = parse_level(record, row, column)?;
            if last != Some(level) {
                let time_s: f64 = parse_cell(record, row, TIME_COLUMN)?;
                transitions.push(Transition::new(time_s * 1000.0, level));
                last = Some(level);
            }
        }

        Ok(transitions)
    }

    /// Debounced level changes of one column
    pub fn transitions(&self, column: usize, debounce_window_ms: f64) -> Result<Vec<Transition>> {
        let raw = self.raw_transitions(column)?;
        let debounced = debounce(&raw, debounce_window_ms);
        trace!(
            "Column {}: {} raw transitions, {} after debounce",
            column,
            raw.len(),
            debounced.len()
        );
        Ok(debounced)
    }
}

fn parse_cell<T: FromStr>(record: &StringRecord, row: usize, column: usize) -> Result<T> {
    let value = record
        .get(column)
        .ok_or(LatencyError::MissingColumn { row, column })?;
    value.parse().map_err(|_| LatencyError::InvalidSample {
        row,
        column,
        value: value.to_string(),
    })
}

fn parse_level(record: &StringRecord, row: usize, column: usize) -> Result<u8> {
    let level: u8 = parse_cell(record, row, column)?;
    if level > 1 {
        return Err(LatencyError::InvalidSample {
            row,
            column,
            value: level.to_string(),
        });
    }
    Ok(level)
}
