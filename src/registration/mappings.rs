//! Built-in mappings for the labeling source.
//!
//! Each mapping is a pair of pure functions converting between the tool
//! layer's [`ToolAnnotation`] and the store's [`LabelRecord`].

use crate::error::LabelSyncError;
use crate::model::{
    Geometry, LabelRecord, OriginTag, RecordUid, ToolAnnotation, ToolType, CASE_LABEL_TYPE,
    ROI_TYPE,
};
use crate::store::{MatchingCriterion, Mapping, ValueType};

/// Mapping for the one-per-case label record.
pub fn case_label_mapping() -> Mapping {
    Mapping {
        annotation_type: CASE_LABEL_TYPE.to_string(),
        matching_criteria: vec![MatchingCriterion {
            value_type: ValueType::Label,
            points: Some(0),
        }],
        to_annotation: record_to_annotation,
        to_measurement: case_label_to_record,
    }
}

/// Mapping for geometric region-of-interest records.
pub fn roi_mapping() -> Mapping {
    Mapping {
        annotation_type: ROI_TYPE.to_string(),
        matching_criteria: vec![MatchingCriterion {
            value_type: ValueType::Polyline,
            points: None,
        }],
        to_annotation: record_to_annotation,
        to_measurement: roi_to_record,
    }
}

/// Every mapping the labeling source registers.
pub fn default_mappings() -> Vec<Mapping> {
    vec![case_label_mapping(), roi_mapping()]
}

fn case_label_to_record(annotation: &ToolAnnotation) -> Result<LabelRecord, LabelSyncError> {
    base_record(annotation, ToolType::CaseLabel)
}

fn roi_to_record(annotation: &ToolAnnotation) -> Result<LabelRecord, LabelSyncError> {
    if annotation.data.points.is_empty() {
        return Err(conversion_error(annotation, "ROI annotation has no points"));
    }

    let frame_of_reference_id = annotation
        .metadata
        .frame_of_reference_id
        .clone()
        .unwrap_or_default();
    let record = base_record(annotation, ToolType::Roi)?;
    Ok(record.with_geometry(Geometry::new(
        frame_of_reference_id,
        annotation.data.points.clone(),
    )))
}

fn base_record(annotation: &ToolAnnotation, expected: ToolType) -> Result<LabelRecord, LabelSyncError> {
    if annotation.annotation_type != expected.as_str() {
        return Err(conversion_error(
            annotation,
            &format!("expected a '{}' annotation", expected),
        ));
    }

    let case_id = annotation
        .metadata
        .case_id
        .clone()
        .ok_or_else(|| conversion_error(annotation, "annotation metadata has no case id"))?;

    let uid = annotation
        .annotation_uid
        .clone()
        .unwrap_or_else(RecordUid::generate);

    let record = LabelRecord::new(
        uid,
        case_id,
        expected,
        annotation.metadata.origin.unwrap_or(OriginTag::Drawn),
    );
    Ok(match &annotation.data.label_data {
        Some(label_data) => record.with_label_data(label_data.clone()),
        None => record,
    })
}

fn record_to_annotation(record: &LabelRecord) -> ToolAnnotation {
    let mut annotation = ToolAnnotation::new(record.tool_type.as_str())
        .with_uid(record.uid.clone())
        .with_case(record.reference_case_id.clone())
        .with_origin(record.origin)
        .with_label_data(record.label_data.clone());

    if let Some(geometry) = &record.geometry {
        annotation = annotation
            .with_frame_of_reference(geometry.frame_of_reference_id.clone())
            .with_points(geometry.points.clone());
    }
    annotation
}

fn conversion_error(annotation: &ToolAnnotation, message: &str) -> LabelSyncError {
    LabelSyncError::Conversion {
        annotation_type: annotation.annotation_type.clone(),
        message: message.to_string(),
    }
}
