//! Measurement store contract.
//!
//! The measurement store is an external service holding a flat collection of
//! [`LabelRecord`]s. It knows nothing about labels itself: registrants create
//! a [`Source`], attach one [`Mapping`] per annotation type, and the store
//! uses those mappings to turn raw tool payloads into records. Every mutation
//! is announced on the store's event feed as a [`StoreEvent`].
//!
//! [`InMemoryStore`] is the in-process implementation used by the CLI and
//! the tests; [`snapshot`] persists its records as JSON.

mod memory;
pub mod snapshot;

pub use memory::InMemoryStore;

use std::fmt;

use crate::error::LabelSyncError;
use crate::events::{SubscriptionId, Topic};
use crate::model::{LabelRecord, RecordUid, ToolAnnotation};

/// A registrant in the store, identified by name and version.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Source {
    pub name: String,
    pub version: String,
}

impl Source {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Coarse shape of a raw measurement, used for routing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueType {
    /// A pure label payload without geometry.
    Label,
    /// An ordered outline of points.
    Polyline,
}

impl ValueType {
    /// Classifies a tool payload.
    pub fn of(annotation: &ToolAnnotation) -> Self {
        if annotation.data.points.is_empty() {
            ValueType::Label
        } else {
            ValueType::Polyline
        }
    }
}

/// Rule the store uses to route a raw measurement to a mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchingCriterion {
    pub value_type: ValueType,
    /// Exact number of points, or `None` for any count.
    pub points: Option<usize>,
}

impl MatchingCriterion {
    pub fn matches(&self, annotation: &ToolAnnotation) -> bool {
        ValueType::of(annotation) == self.value_type
            && self
                .points
                .map_or(true, |n| n == annotation.data.points.len())
    }
}

/// Converts a stored record back into a tool annotation.
pub type ToAnnotationFn = fn(&LabelRecord) -> ToolAnnotation;

/// Converts a tool payload into a record.
pub type ToMeasurementFn = fn(&ToolAnnotation) -> Result<LabelRecord, LabelSyncError>;

/// Binds an annotation type to its pure conversion functions.
#[derive(Clone)]
pub struct Mapping {
    pub annotation_type: String,
    pub matching_criteria: Vec<MatchingCriterion>,
    pub to_annotation: ToAnnotationFn,
    pub to_measurement: ToMeasurementFn,
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("annotation_type", &self.annotation_type)
            .field("matching_criteria", &self.matching_criteria)
            .finish_non_exhaustive()
    }
}

impl Mapping {
    /// Returns true if any criterion accepts `annotation`.
    pub fn matches(&self, annotation: &ToolAnnotation) -> bool {
        self.matching_criteria.iter().any(|c| c.matches(annotation))
    }
}

/// Discriminant of a [`StoreEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreEventKind {
    Added,
    RawAdded,
    Updated,
    Removed,
    Cleared,
}

/// Notifications published by the store after each mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    Added(LabelRecord),
    RawAdded(LabelRecord),
    Updated(LabelRecord),
    Removed(LabelRecord),
    Cleared { removed: Vec<LabelRecord> },
}

impl Topic for StoreEvent {
    type Kind = StoreEventKind;

    fn topic(&self) -> StoreEventKind {
        match self {
            StoreEvent::Added(_) => StoreEventKind::Added,
            StoreEvent::RawAdded(_) => StoreEventKind::RawAdded,
            StoreEvent::Updated(_) => StoreEventKind::Updated,
            StoreEvent::Removed(_) => StoreEventKind::Removed,
            StoreEvent::Cleared { .. } => StoreEventKind::Cleared,
        }
    }
}

/// Handler type accepted by [`MeasurementStore::subscribe`].
///
/// Handlers run while the store is mid-mutation and must not call back into
/// the store.
pub type StoreHandler = Box<dyn FnMut(&StoreEvent)>;

/// Operations labelsync needs from a measurement store.
pub trait MeasurementStore {
    /// Creates (or returns the existing) source registration.
    fn create_source(&mut self, name: &str, version: &str) -> Result<Source, LabelSyncError>;

    fn get_source(&self, name: &str, version: &str) -> Option<Source>;

    /// Installs a mapping on `source`, replacing any mapping with the same
    /// annotation type.
    fn add_mapping(&mut self, source: &Source, mapping: Mapping) -> Result<(), LabelSyncError>;

    /// Mappings of a source, in installation order.
    fn get_source_mappings(&self, name: &str, version: &str) -> Vec<Mapping>;

    /// Converts `payload` with the mapping for `annotation_type` (or the first
    /// mapping whose criteria match, when `None`) and stores the result.
    ///
    /// A payload whose uid already exists replaces that record and publishes
    /// `Updated` instead of `Added`.
    fn add_raw_measurement(
        &mut self,
        source: &Source,
        annotation_type: Option<&str>,
        payload: &ToolAnnotation,
    ) -> Result<RecordUid, LabelSyncError>;

    fn get_measurement(&self, uid: &RecordUid) -> Option<&LabelRecord>;

    /// All records, in insertion order.
    fn get_measurements(&self) -> Vec<&LabelRecord>;

    /// Replaces the record stored under `uid`.
    fn update(&mut self, uid: &RecordUid, record: LabelRecord) -> Result<(), LabelSyncError>;

    /// Deletes a record, returning it if it existed.
    fn remove(&mut self, uid: &RecordUid) -> Option<LabelRecord>;

    /// Deletes every record.
    fn clear_measurements(&mut self);

    fn subscribe(&mut self, kind: StoreEventKind, handler: StoreHandler) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}
