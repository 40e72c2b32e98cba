//! The canonical label record held by the measurement store.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CaseId, RecordUid};
use super::label_data::LabelData;

/// Annotation type tag of the one-per-case label record.
pub const CASE_LABEL_TYPE: &str = "case-label";

/// Annotation type tag of geometric region-of-interest records.
pub const ROI_TYPE: &str = "roi";

/// Kind of record, which also selects the mapping that converts it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolType {
    #[serde(rename = "case-label")]
    CaseLabel,
    #[serde(rename = "roi")]
    Roi,
}

impl ToolType {
    /// The annotation type tag used by mappings and tool events.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::CaseLabel => CASE_LABEL_TYPE,
            ToolType::Roi => ROI_TYPE,
        }
    }

    /// Parses an annotation type tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            CASE_LABEL_TYPE => Some(ToolType::CaseLabel),
            ROI_TYPE => Some(ToolType::Roi),
            _ => None,
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a record came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginTag {
    /// Created by the seeder when a case was first opened.
    Inited,
    /// Created by a table import.
    Imported,
    /// Drawn by the user in the annotation tool layer.
    #[default]
    Drawn,
}

impl OriginTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            OriginTag::Inited => "inited",
            OriginTag::Imported => "imported",
            OriginTag::Drawn => "drawn",
        }
    }
}

/// A 2D point in the frame of reference of its geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

/// Geometry of a region-of-interest record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Frame of reference the points are expressed in.
    pub frame_of_reference_id: String,

    /// Ordered outline points.
    pub points: Vec<Point>,
}

impl Geometry {
    pub fn new(frame_of_reference_id: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            frame_of_reference_id: frame_of_reference_id.into(),
            points,
        }
    }
}

/// A synchronized unit of label/annotation data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    /// Identity within the store.
    pub uid: RecordUid,

    /// The case this record belongs to.
    pub reference_case_id: CaseId,

    /// Record kind.
    pub tool_type: ToolType,

    /// How the record was created.
    #[serde(default)]
    pub origin: OriginTag,

    /// Label values keyed by field key.
    #[serde(default, skip_serializing_if = "LabelData::is_empty")]
    pub label_data: LabelData,

    /// Outline for ROI records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,

    /// Cosmetic selection state mirrored from the tool layer.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}

impl LabelRecord {
    /// Creates a record with no label values and no geometry.
    pub fn new(
        uid: impl Into<RecordUid>,
        reference_case_id: impl Into<CaseId>,
        tool_type: ToolType,
        origin: OriginTag,
    ) -> Self {
        Self {
            uid: uid.into(),
            reference_case_id: reference_case_id.into(),
            tool_type,
            origin,
            label_data: LabelData::new(),
            geometry: None,
            selected: false,
        }
    }

    /// Replaces the label values.
    pub fn with_label_data(mut self, label_data: LabelData) -> Self {
        self.label_data = label_data;
        self
    }

    /// Sets one label value.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.label_data.insert(key, value);
        self
    }

    /// Attaches geometry.
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Returns true for the per-case label record.
    pub fn is_case_label(&self) -> bool {
        self.tool_type == ToolType::CaseLabel
    }
}
