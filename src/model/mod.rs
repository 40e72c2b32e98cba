//! Data model shared by every labelsync component.
//!
//! [`LabelRecord`] is the canonical unit stored in the measurement store;
//! [`ToolAnnotation`] and [`ToolEvent`] describe what the annotation tool
//! layer sends. Conversion between the two lives in the registered mappings
//! (see [`crate::registration`]).
//!
//! # Example
//!
//! ```
//! use labelsync::model::{LabelRecord, OriginTag, ToolType};
//!
//! let record = LabelRecord::new("uid-1", "C1", ToolType::CaseLabel, OriginTag::Inited)
//!     .with_label("status", "open");
//! assert_eq!(record.label_data.get("status"), Some("open"));
//! ```

mod annotation;
mod ids;
mod label_data;
mod record;

pub use annotation::{
    AnnotationData, AnnotationMetadata, ToolAnnotation, ToolEvent, ToolEventKind,
};
pub use ids::{CaseId, RecordUid};
pub use label_data::LabelData;
pub use record::{
    Geometry, LabelRecord, OriginTag, Point, ToolType, CASE_LABEL_TYPE, ROI_TYPE,
};
