//! Record reader contract and an in-memory implementation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Error, Result};
use crate::record::Record;

/// Sequential and random access over a persisted sequence of records.
///
/// Seeks return `false` when the source is closed or the target entry does
/// not exist or cannot be read.
pub trait RecordReader {
    /// Error reported when a source cannot be opened.
    type Error: std::error::Error;

    /// Opens `source`, closing any previously open one.
    ///
    /// # Errors
    /// Returns an error if the source cannot be opened.
    fn open(&mut self, source: &Path) -> std::result::Result<(), Self::Error>;

    fn close(&mut self);

    fn is_open(&self) -> bool;

    fn first(&mut self) -> bool {
        self.nth_entry(0)
    }

    fn next(&mut self) -> bool {
        match self.current_index() {
            Some(index) => self.nth_entry(index + 1),
            None => self.first(),
        }
    }

    fn last(&mut self) -> bool {
        match self.total_record_count() {
            0 => false,
            total => self.nth_entry(total - 1),
        }
    }

    fn nth_entry(&mut self, index: usize) -> bool;

    /// Record loaded by the last successful seek.
    fn current_record(&self) -> Option<&Record>;

    /// Index of the record loaded by the last successful seek.
    fn current_index(&self) -> Option<usize>;

    /// Number of records in the open source, 0 when closed.
    fn total_record_count(&self) -> usize;

    /// Type tag of the current record as stored in the source.
    fn current_type_tag(&self) -> Option<&str>;
}

/// Reader over named in-memory record sources.
///
/// Useful for embedding and tests: sources are registered up front and
/// opened by name.
#[derive(Debug, Default)]
pub struct InMemoryReader {
    sources: HashMap<PathBuf, Vec<Record>>,
    open: Option<PathBuf>,
    current: Option<usize>,
}

impl InMemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `records` under `name`.
    #[must_use]
    pub fn with_source<P: Into<PathBuf>>(mut self, name: P, records: Vec<Record>) -> Self {
        self.sources.insert(name.into(), records);
        self
    }

    fn records(&self) -> &[Record] {
        self.open
            .as_ref()
            .and_then(|name| self.sources.get(name))
            .map_or(&[], Vec::as_slice)
    }
}

impl RecordReader for InMemoryReader {
    type Error = Error;

    fn open(&mut self, source: &Path) -> Result<()> {
        self.close();
        if !self.sources.contains_key(source) {
            return Err(Error::SourceNotFound(source.to_path_buf()));
        }
        self.open = Some(source.to_path_buf());
        info!(
            "opened in-memory source {} with {} records",
            source.display(),
            self.records().len()
        );
        Ok(())
    }

    fn close(&mut self) {
        self.open = None;
        self.current = None;
    }

    fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn nth_entry(&mut self, index: usize) -> bool {
        if index < self.records().len() {
            self.current = Some(index);
            true
        } else {
            false
        }
    }

    fn current_record(&self) -> Option<&Record> {
        self.current.and_then(|index| self.records().get(index))
    }

    fn current_index(&self) -> Option<usize> {
        self.current
    }

    fn total_record_count(&self) -> usize {
        self.records().len()
    }

    fn current_type_tag(&self) -> Option<&str> {
        self.current_record().map(Record::type_tag)
    }
}
