//! JSON persistence of an [`InMemoryStore`]'s records.
//!
//! Only records are persisted. Sources and mappings hold conversion
//! functions and are re-registered on every start, and subscriptions belong
//! to a session.

use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::InMemoryStore;
use crate::error::LabelSyncError;
use crate::model::LabelRecord;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreSnapshot {
    #[serde(default)]
    records: Vec<LabelRecord>,
}

/// Reads a store snapshot. A missing file yields an empty store.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn read_snapshot(path: &Path) -> Result<InMemoryStore, LabelSyncError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no store snapshot, starting empty");
            return Ok(InMemoryStore::new());
        }
        Err(e) => return Err(LabelSyncError::Io(e)),
    };

    let snapshot: StoreSnapshot = serde_json::from_reader(BufReader::new(file)).map_err(
        |source| LabelSyncError::SnapshotParse {
            path: path.to_path_buf(),
            source,
        },
    )?;
    Ok(InMemoryStore::with_records(snapshot.records))
}

/// Writes the store's records to `path`, replacing the file.
pub fn write_snapshot(path: &Path, store: &InMemoryStore) -> Result<(), LabelSyncError> {
    let file = File::create(path).map_err(LabelSyncError::Io)?;
    let writer = BufWriter::new(file);

    let snapshot = StoreSnapshot {
        records: store.records(),
    };
    serde_json::to_writer_pretty(writer, &snapshot).map_err(|source| {
        LabelSyncError::SnapshotWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Parses a snapshot from a JSON string.
pub fn from_snapshot_str(json: &str) -> Result<InMemoryStore, serde_json::Error> {
    let snapshot: StoreSnapshot = serde_json::from_str(json)?;
    Ok(InMemoryStore::with_records(snapshot.records))
}

/// Serializes the store's records to a JSON string.
pub fn to_snapshot_string(store: &InMemoryStore) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&StoreSnapshot {
        records: store.records(),
    })
}
