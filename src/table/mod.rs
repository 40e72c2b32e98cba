//! Flat tabular import and export of label records.
//!
//! A table is a header row followed by one row per record. Cells are plain
//! strings; no type coercion happens beyond what the label schema allows
//! (dates stay 8-digit strings such as `19700101`).
//!
//! # Layout
//!
//! | column                | content                                       |
//! |-----------------------|-----------------------------------------------|
//! | `AnnotationType`      | `ODELIA:Label` or `ODELIA:ROI`                |
//! | identity column       | the case id (default `StudyInstanceUID`)      |
//! | `FrameOfReferenceUID` | ROI frame of reference (ROI tables only)      |
//! | `points`              | ROI outline, see [`format_points`]            |
//! | label keys ...        | one column per key, in first-seen order       |
//!
//! Reading is deliberately lenient: rows whose length differs from the
//! header are kept so the importer can report them individually.

mod export;
mod geometry;
mod import;
mod report;

pub use export::export_table;
pub use geometry::{format_points, parse_points};
pub use import::import_table;
pub use report::{ImportIssue, ImportIssueCode, ImportReport, ImportSeverity};

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::LabelSyncError;
use crate::model::ToolType;

/// Column naming the record kind of a row.
pub const ANNOTATION_TYPE_COLUMN: &str = "AnnotationType";
/// Column holding an ROI's frame of reference.
pub const FRAME_OF_REFERENCE_COLUMN: &str = "FrameOfReferenceUID";
/// Column holding an ROI's encoded outline.
pub const POINTS_COLUMN: &str = "points";

/// `AnnotationType` value of `case-label` rows.
pub const LABEL_ROW_TAG: &str = "ODELIA:Label";
/// `AnnotationType` value of `roi` rows.
pub const ROI_ROW_TAG: &str = "ODELIA:ROI";

/// The `AnnotationType` cell written for a record kind.
pub fn row_tag(tool_type: ToolType) -> &'static str {
    match tool_type {
        ToolType::CaseLabel => LABEL_ROW_TAG,
        ToolType::Roi => ROI_ROW_TAG,
    }
}

/// A header row plus data rows, all as strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    /// Position of `name` in the header.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    /// The cell of `row` under column `name`, if both exist.
    pub fn cell<'a>(&self, row: &'a [String], name: &str) -> Option<&'a str> {
        self.column(name)
            .and_then(|i| row.get(i))
            .map(String::as_str)
    }

    /// True if there is no header row.
    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }
}

/// Reads a table from a CSV file.
///
/// # Errors
/// Returns an error if the file cannot be opened or is not valid CSV.
pub fn read_table(path: &Path) -> Result<Table, LabelSyncError> {
    let file = File::open(path).map_err(LabelSyncError::Io)?;
    read_from(BufReader::new(file), path)
}

/// Reads a table from a CSV string.
pub fn from_table_str(csv_str: &str) -> Result<Table, LabelSyncError> {
    from_table_slice(csv_str.as_bytes())
}

/// Reads a table from CSV bytes.
pub fn from_table_slice(bytes: &[u8]) -> Result<Table, LabelSyncError> {
    read_from(bytes, Path::new("<bytes>"))
}

fn read_from<R: Read>(reader: R, path: &Path) -> Result<Table, LabelSyncError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = csv_reader.records();
    let header = match records.next() {
        Some(record) => record.map_err(|source| read_error(path, source))?,
        None => return Ok(Table::default()),
    };

    let mut table = Table::new(header.iter());
    for record in records {
        let record = record.map_err(|source| read_error(path, source))?;
        table.push_row(record.iter());
    }
    Ok(table)
}

/// Writes a table to a CSV file.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_table(path: &Path, table: &Table) -> Result<(), LabelSyncError> {
    let file = File::create(path).map_err(LabelSyncError::Io)?;
    write_to(BufWriter::new(file), table, path)?.flush()?;
    Ok(())
}

/// Writes a table to any writer, e.g. stdout.
pub fn write_table_to<W: Write>(writer: W, table: &Table) -> Result<(), LabelSyncError> {
    write_to(writer, table, Path::new("<stream>"))?.flush()?;
    Ok(())
}

/// Writes a table to a CSV string.
pub fn to_table_string(table: &Table) -> Result<String, LabelSyncError> {
    let path = Path::new("<string>");
    let bytes = write_to(Vec::new(), table, path)?;
    String::from_utf8(bytes).map_err(|e| {
        LabelSyncError::Io(io::Error::new(io::ErrorKind::InvalidData, e.utf8_error()))
    })
}

fn write_to<W: Write>(writer: W, table: &Table, path: &Path) -> Result<W, LabelSyncError> {
    let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);

    if !table.is_empty() {
        csv_writer
            .write_record(&table.header)
            .map_err(|source| write_error(path, source))?;
    }
    for row in &table.rows {
        csv_writer
            .write_record(row)
            .map_err(|source| write_error(path, source))?;
    }

    csv_writer
        .into_inner()
        .map_err(|e| LabelSyncError::Io(e.into_error()))
}

fn read_error(path: &Path, source: csv::Error) -> LabelSyncError {
    LabelSyncError::CsvRead {
        path: path.to_path_buf(),
        source,
    }
}

fn write_error(path: &Path, source: csv::Error) -> LabelSyncError {
    LabelSyncError::CsvWrite {
        path: path.to_path_buf(),
        source,
    }
}
