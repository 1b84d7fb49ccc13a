//! Raw Table Loader.
//!
//! Reads a character-separated file into string-typed rows. Every field is
//! kept as text; typing happens later in [`crate::normalize`]. Rows the CSV
//! reader cannot parse, or that carry more fields than the header, are
//! skipped and counted rather than failing the whole read.

use std::io::Read;
use std::path::Path;

use crate::PipelineError;

/// A string-typed table with trimmed header names.
#[derive(Debug, Clone)]
pub struct RawTable {
    label: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    skipped: usize,
}

/// Borrowed view of one row.
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    fields: &'a [String],
}

impl<'a> RawRow<'a> {
    /// Returns the trimmed field at a resolved column index.
    ///
    /// `None` means the column was not resolved or the row is short.
    #[must_use]
    pub fn get(&self, column: Option<usize>) -> Option<&'a str> {
        column
            .and_then(|idx| self.fields.get(idx))
            .map(|s| s.trim())
    }
}

impl RawTable {
    /// Reads the table at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingInput`] if the file does not exist,
    /// and [`PipelineError::Csv`] if the header row cannot be read or the
    /// underlying file read fails.
    pub fn read(path: &Path, label: &str) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file, label)?;
        log::info!(
            "[{label}] Read {} rows from {} ({} malformed rows skipped)",
            table.len(),
            path.display(),
            table.skipped
        );
        Ok(table)
    }

    /// Parses a table from any reader.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Csv`] if the header row is unreadable or an
    /// I/O error interrupts the read.
    pub fn from_reader<R: Read>(reader: R, label: &str) -> Result<Self, PipelineError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| decode_field(h).trim_start_matches('\u{feff}').trim().to_owned())
            .collect();

        let mut rows = Vec::new();
        let mut skipped = 0;

        for result in reader.byte_records() {
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    log::debug!("[{label}] Skipping malformed row: {e}");
                    skipped += 1;
                    continue;
                }
            };

            if record.len() > headers.len() {
                log::debug!(
                    "[{label}] Skipping row with {} fields (header has {})",
                    record.len(),
                    headers.len()
                );
                skipped += 1;
                continue;
            }

            rows.push(record.iter().map(decode_field).collect());
        }

        if skipped > 0 {
            log::warn!("[{label}] Skipped {skipped} malformed rows");
        }

        Ok(Self {
            label: label.to_owned(),
            headers,
            rows,
            skipped,
        })
    }

    /// Human-readable table label used in logs and errors.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Trimmed header names in file order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of rows kept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows were kept.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of malformed rows dropped while reading.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// Resolves the first alias that matches a header, case-insensitively.
    ///
    /// Aliases are tried in order, so earlier spellings take priority over
    /// later ones regardless of column order in the file.
    #[must_use]
    pub fn column(&self, aliases: &[String]) -> Option<usize> {
        aliases.iter().find_map(|alias| {
            self.headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(alias.trim()))
        })
    }

    /// Like [`Self::column`] but fails when no alias matches.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingColumn`] naming the table and field.
    pub fn require_column(
        &self,
        aliases: &[String],
        field: &'static str,
    ) -> Result<usize, PipelineError> {
        self.column(aliases).ok_or_else(|| PipelineError::MissingColumn {
            table: self.label.clone(),
            field,
        })
    }

    /// Indices of every header satisfying `predicate`, in file order.
    #[must_use]
    pub fn columns_where(&self, predicate: impl Fn(&str) -> bool) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(_, h)| predicate(h))
            .map(|(i, _)| i)
            .collect()
    }

    /// Iterates rows in file order.
    pub fn rows(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.rows.iter().map(|fields| RawRow { fields })
    }
}

/// Decodes a raw field as UTF-8, falling back to Latin-1.
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_owned(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}
