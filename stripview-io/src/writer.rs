//! File writers for records and diagram exports.

use crate::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use stripview_core::{DiagramSeries, EdgeType, Record, Side};

/// Writer for JSON Lines record files.
///
/// Output can be read back with [`crate::JsonRecordReader`].
pub struct RecordFileWriter {
    writer: BufWriter<File>,
}

impl RecordFileWriter {
    /// Creates a new record file, truncating any existing one.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Appends one record as a single line.
    ///
    /// # Errors
    /// Returns an error if the record cannot be serialized or written.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Appends all `records` and flushes.
    ///
    /// # Errors
    /// Returns an error if any record cannot be serialized or written.
    pub fn write_records(&mut self, records: &[Record]) -> Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        self.flush()
    }

    /// Flushes the writer.
    ///
    /// # Errors
    /// Returns an error if buffered data cannot be written.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writer for diagram series as CSV, times in nanoseconds.
pub struct DiagramCsvWriter {
    writer: BufWriter<File>,
}

impl DiagramCsvWriter {
    /// Creates a new CSV file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self { writer })
    }

    /// Writes a header and one row per diagram point.
    ///
    /// # Errors
    /// Returns an error if the data cannot be written.
    pub fn write_series(&mut self, series: &[DiagramSeries]) -> Result<()> {
        writeln!(
            self.writer,
            "series,side,layer,slot,edge,threshold_number,threshold,time_ns"
        )?;

        for (index, s) in series.iter().enumerate() {
            for p in &s.points {
                let side = match p.side {
                    Side::A => "A",
                    Side::B => "B",
                };
                let edge = match p.edge {
                    EdgeType::Leading => "leading",
                    EdgeType::Trailing => "trailing",
                };
                writeln!(
                    self.writer,
                    "{},{},{},{},{},{},{},{}",
                    index,
                    side,
                    p.layer,
                    p.slot,
                    edge,
                    p.threshold_number,
                    p.threshold,
                    p.time_ns()
                )?;
            }
        }

        self.writer.flush()?;
        Ok(())
    }
}
