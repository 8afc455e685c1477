//! Memory-mapped record file readers.
//!

use crate::scanner::{LineSpan, RecordScanner};
use crate::{Error, Result};
use log::{debug, error, info};
use memmap2::Mmap;
use serde_json::Value;
use std::fs::File;
use std::path::{Path, PathBuf};
use stripview_core::{Record, RecordReader};

/// A memory-mapped file reader.
///
/// Uses memmap2 to efficiently access file contents without
/// loading the entire file into memory.
pub struct MappedFileReader {
    mmap: Mmap,
    path: PathBuf,
}

impl MappedFileReader {
    /// Opens a file for memory-mapped reading.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file) }
            .map_err(|e| Error::MmapError(format!("{}: {e}", path.as_ref().display())))?;
        Ok(Self {
            mmap,
            path: path.as_ref().to_path_buf(),
        })
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

struct LoadedRecord {
    index: usize,
    tag: String,
    record: Record,
}

/// Record reader over a JSON Lines file.
///
/// The file is mapped and scanned once on open; each seek parses only the
/// requested line. Tags the record model does not know load as
/// [`Record::Unknown`] while [`RecordReader::current_type_tag`] still
/// reports the tag found in the file.
#[derive(Default)]
pub struct JsonRecordReader {
    file: Option<MappedFileReader>,
    spans: Vec<LineSpan>,
    current: Option<LoadedRecord>,
}

impl JsonRecordReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the open file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(MappedFileReader::path)
    }

    /// Parses one line into its stored tag and record.
    fn parse_line(line: &[u8]) -> Result<(String, Record)> {
        let value: Value = serde_json::from_slice(line)?;
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidFormat("record has no string \"type\" tag".into()))?
            .to_owned();
        let record = serde_json::from_value(value)?;
        Ok((tag, record))
    }
}

impl RecordReader for JsonRecordReader {
    type Error = Error;

    fn open(&mut self, source: &Path) -> Result<()> {
        self.close();
        let file = MappedFileReader::open(source)?;
        let spans = RecordScanner::scan_lines(file.as_bytes());
        info!(
            "mapped {} ({} bytes, {} records)",
            source.display(),
            file.len(),
            spans.len()
        );
        self.spans = spans;
        self.file = Some(file);
        Ok(())
    }

    fn close(&mut self) {
        if let Some(file) = self.file.take() {
            debug!("unmapped {}", file.path().display());
        }
        self.spans.clear();
        self.current = None;
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn nth_entry(&mut self, index: usize) -> bool {
        let (Some(file), Some(span)) = (self.file.as_ref(), self.spans.get(index)) else {
            return false;
        };
        match Self::parse_line(span.slice(file.as_bytes())) {
            Ok((tag, record)) => {
                self.current = Some(LoadedRecord { index, tag, record });
                true
            }
            Err(err) => {
                error!(
                    "{}:{}: unreadable record: {err}",
                    file.path().display(),
                    span.line_number
                );
                false
            }
        }
    }

    fn current_record(&self) -> Option<&Record> {
        self.current.as_ref().map(|loaded| &loaded.record)
    }

    fn current_index(&self) -> Option<usize> {
        self.current.as_ref().map(|loaded| loaded.index)
    }

    fn total_record_count(&self) -> usize {
        self.spans.len()
    }

    fn current_type_tag(&self) -> Option<&str> {
        self.current.as_ref().map(|loaded| loaded.tag.as_str())
    }
}
