//! Newtype IDs for records and cases.
//!
//! Using newtypes prevents accidentally mixing up a record identity with the
//! case it refers to; both are plain strings on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a record in the measurement store.
///
/// Tool-drawn annotations keep their annotation UID as record identity so
/// later modify/remove events can be correlated by lookup.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordUid(String);

impl RecordUid {
    /// Creates a RecordUid from an existing identifier.
    #[inline]
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Allocates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RecordUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordUid({})", self.0)
    }
}

impl fmt::Display for RecordUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordUid {
    fn from(uid: &str) -> Self {
        RecordUid::new(uid)
    }
}

impl From<String> for RecordUid {
    fn from(uid: String) -> Self {
        RecordUid(uid)
    }
}

/// Identifier of the case (study) a record is scoped to.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    /// Creates a new CaseId.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CaseId({})", self.0)
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CaseId {
    fn from(id: &str) -> Self {
        CaseId::new(id)
    }
}

impl From<String> for CaseId {
    fn from(id: String) -> Self {
        CaseId(id)
    }
}
