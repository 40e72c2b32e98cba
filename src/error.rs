use std::path::PathBuf;
use thiserror::Error;

use crate::model::RecordUid;
use crate::table::ImportReport;

/// The main error type for labelsync operations.
#[derive(Debug, Error)]
pub enum LabelSyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The label schema is malformed. Fatal at load.
    #[error("Invalid label config: {message}")]
    Config { message: String },

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// The measurement store could not accept the source registration.
    #[error("Failed to register source {name}@{version}: {message}")]
    Registration {
        name: String,
        version: String,
        message: String,
    },

    #[error("No mapping registered for annotation type '{annotation_type}' on source {source_name}@{source_version}")]
    MappingNotFound {
        source_name: String,
        source_version: String,
        annotation_type: String,
    },

    #[error("No mapping of source {source_name}@{source_version} matches the raw measurement")]
    NoMatchingMapping {
        source_name: String,
        source_version: String,
    },

    #[error("Annotation cannot be converted by mapping '{annotation_type}': {message}")]
    Conversion {
        annotation_type: String,
        message: String,
    },

    /// A single table row could not be imported. Recoverable.
    #[error("Malformed row {row}: {message}")]
    MalformedRow { row: usize, message: String },

    #[error("No record with uid {0}")]
    RecordNotFound(RecordUid),

    #[error("Label '{key}' is not declared for {tool_type} records")]
    UnknownLabelKey { key: String, tool_type: String },

    #[error("Value '{value}' is not valid for label '{key}'")]
    InvalidLabelValue { key: String, value: String },

    #[error("Failed to read table from {path}: {source}")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write table to {path}: {source}")]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to parse store snapshot {path}: {source}")]
    SnapshotParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write store snapshot {path}: {source}")]
    SnapshotWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Import skipped {} malformed row(s)", .report.malformed_row_count())]
    ImportFailed { report: ImportReport },
}
