//! Payloads exchanged with the annotation tool layer.

use serde::{Deserialize, Serialize};

use super::ids::{CaseId, RecordUid};
use super::label_data::LabelData;
use super::record::{OriginTag, Point};
use crate::events::Topic;

/// Metadata attached to a tool annotation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationMetadata {
    /// Case the annotation was drawn on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<CaseId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_of_reference_id: Option<String>,

    /// Origin tag; absent for user-drawn annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<OriginTag>,
}

/// Tool-specific data of an annotation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_data: Option<LabelData>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<Point>,
}

/// A graphical (or synthetic) annotation as seen by the tool layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolAnnotation {
    /// Identity assigned by the tool layer. `None` lets the store allocate one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation_uid: Option<RecordUid>,

    /// Annotation type tag, e.g. `roi`.
    #[serde(rename = "type")]
    pub annotation_type: String,

    #[serde(default)]
    pub metadata: AnnotationMetadata,

    #[serde(default)]
    pub data: AnnotationData,
}

impl ToolAnnotation {
    pub fn new(annotation_type: impl Into<String>) -> Self {
        Self {
            annotation_uid: None,
            annotation_type: annotation_type.into(),
            metadata: AnnotationMetadata::default(),
            data: AnnotationData::default(),
        }
    }

    pub fn with_uid(mut self, uid: impl Into<RecordUid>) -> Self {
        self.annotation_uid = Some(uid.into());
        self
    }

    pub fn with_case(mut self, case_id: impl Into<CaseId>) -> Self {
        self.metadata.case_id = Some(case_id.into());
        self
    }

    pub fn with_frame_of_reference(mut self, frame_of_reference_id: impl Into<String>) -> Self {
        self.metadata.frame_of_reference_id = Some(frame_of_reference_id.into());
        self
    }

    pub fn with_origin(mut self, origin: OriginTag) -> Self {
        self.metadata.origin = Some(origin);
        self
    }

    pub fn with_label_data(mut self, label_data: LabelData) -> Self {
        self.data.label_data = Some(label_data);
        self
    }

    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.data.points = points;
        self
    }
}

/// Events fired by the annotation tool layer.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolEvent {
    Added(ToolAnnotation),
    Completed(ToolAnnotation),
    Modified(ToolAnnotation),
    Removed(ToolAnnotation),
    SelectionChanged {
        added: Vec<RecordUid>,
        removed: Vec<RecordUid>,
    },
}

/// Discriminant of a [`ToolEvent`], used to subscribe to one event type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolEventKind {
    Added,
    Completed,
    Modified,
    Removed,
    SelectionChanged,
}

impl ToolEventKind {
    /// Machine-friendly name, used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolEventKind::Added => "added",
            ToolEventKind::Completed => "completed",
            ToolEventKind::Modified => "modified",
            ToolEventKind::Removed => "removed",
            ToolEventKind::SelectionChanged => "selection_changed",
        }
    }
}

impl ToolEvent {
    pub fn kind(&self) -> ToolEventKind {
        match self {
            ToolEvent::Added(_) => ToolEventKind::Added,
            ToolEvent::Completed(_) => ToolEventKind::Completed,
            ToolEvent::Modified(_) => ToolEventKind::Modified,
            ToolEvent::Removed(_) => ToolEventKind::Removed,
            ToolEvent::SelectionChanged { .. } => ToolEventKind::SelectionChanged,
        }
    }

    /// The annotation carried by the event, if any.
    pub fn annotation(&self) -> Option<&ToolAnnotation> {
        match self {
            ToolEvent::Added(a)
            | ToolEvent::Completed(a)
            | ToolEvent::Modified(a)
            | ToolEvent::Removed(a) => Some(a),
            ToolEvent::SelectionChanged { .. } => None,
        }
    }
}

impl Topic for ToolEvent {
    type Kind = ToolEventKind;

    fn topic(&self) -> ToolEventKind {
        self.kind()
    }
}
