//! Row sources feeding the profiler.
//!
//! The engine only needs headers plus an ordered stream of records aligned
//! to them. [`CsvRowSource`] reads delimited files (or stdin) through the
//! `csv` crate; [`MemoryRowSource`] serves rows already held in memory.

use std::{io::Read, path::Path};

use encoding_rs::Encoding;

use crate::{error::MatchError, io_utils};

pub trait RowSource {
    /// Name used in errors and reports, usually the file path.
    fn identity(&self) -> &str;

    fn headers(&self) -> &[String];

    /// Next record, aligned to [`RowSource::headers`]. `Ok(None)` at the end.
    fn next_row(&mut self) -> Result<Option<Vec<String>>, MatchError>;
}

pub struct CsvRowSource {
    identity: String,
    headers: Vec<String>,
    reader: csv::Reader<Box<dyn Read>>,
    encoding: &'static Encoding,
    record: csv::ByteRecord,
    rows_read: usize,
}

impl CsvRowSource {
    pub fn open(
        path: &Path,
        delimiter: Option<u8>,
        encoding: &'static Encoding,
    ) -> Result<Self, MatchError> {
        let identity = if io_utils::is_dash(path) {
            "<stdin>".to_string()
        } else {
            path.display().to_string()
        };
        let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)
            .map_err(|err| MatchError::row_source(identity.clone(), None, err))?;
        let headers = io_utils::reader_headers(&mut reader, encoding)
            .map_err(|err| MatchError::row_source(identity.clone(), None, err))?;
        Ok(Self {
            identity,
            headers,
            reader,
            encoding,
            record: csv::ByteRecord::new(),
            rows_read: 0,
        })
    }

    pub fn rows_read(&self) -> usize {
        self.rows_read
    }
}

impl RowSource for CsvRowSource {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn next_row(&mut self) -> Result<Option<Vec<String>>, MatchError> {
        let row_number = self.rows_read + 1;
        let has_record = self
            .reader
            .read_byte_record(&mut self.record)
            .map_err(|err| {
                MatchError::row_source(self.identity.clone(), Some(row_number), err)
            })?;
        if !has_record {
            return Ok(None);
        }
        let decoded = io_utils::decode_record(&self.record, self.encoding)
            .map_err(|err| {
                MatchError::row_source(self.identity.clone(), Some(row_number), err)
            })?;
        self.rows_read = row_number;
        Ok(Some(decoded))
    }
}

#[derive(Debug, Clone)]
pub struct MemoryRowSource {
    identity: String,
    headers: Vec<String>,
    rows: std::vec::IntoIter<Vec<String>>,
    position: usize,
}

impl MemoryRowSource {
    pub fn new(identity: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            identity: identity.into(),
            headers,
            rows: rows.into_iter(),
            position: 0,
        }
    }

    /// Builds rows from column-major data. Shorter columns are padded with
    /// empty cells.
    pub fn from_columns<S: AsRef<str>>(
        identity: impl Into<String>,
        columns: &[(&str, Vec<S>)],
    ) -> Self {
        let headers = columns
            .iter()
            .map(|(name, _)| name.to_string())
            .collect::<Vec<_>>();
        let height = columns
            .iter()
            .map(|(_, values)| values.len())
            .max()
            .unwrap_or(0);
        let rows = (0..height)
            .map(|row| {
                columns
                    .iter()
                    .map(|(_, values)| {
                        values
                            .get(row)
                            .map(|value| value.as_ref().to_string())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();
        Self::new(identity, headers, rows)
    }
}

impl RowSource for MemoryRowSource {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn next_row(&mut self) -> Result<Option<Vec<String>>, MatchError> {
        let Some(row) = self.rows.next() else {
            return Ok(None);
        };
        self.position += 1;
        if row.len() != self.headers.len() {
            return Err(MatchError::row_source(
                self.identity.clone(),
                Some(self.position),
                format!(
                    "expected {} field(s) but found {}",
                    self.headers.len(),
                    row.len()
                ),
            ));
        }
        Ok(Some(row))
    }
}
