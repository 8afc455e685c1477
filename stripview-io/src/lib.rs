//! stripview-io: Memory-mapped record files for stripview.
//!
//! Record files are JSON Lines, one tagged record per line. They are read
//! through a memory map and parsed lazily on seek. Writers produce the same
//! format and CSV exports of diagram series.
//!

mod error;
mod reader;
pub mod scanner;
mod writer;

pub use error::{Error, Result};
pub use reader::{JsonRecordReader, MappedFileReader};
pub use scanner::{LineSpan, RecordScanner};
pub use writer::{DiagramCsvWriter, RecordFileWriter};
