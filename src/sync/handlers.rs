//! Per-event translation between the tool layer and the store.
//!
//! These are plain functions over borrowed state so they can be driven by
//! synthetic events without any subscription machinery.

use crate::error::LabelSyncError;
use crate::model::{
    LabelRecord, RecordUid, ToolAnnotation, ToolEvent, ToolType, CASE_LABEL_TYPE,
};
use crate::registration::find_mapping;
use crate::schema::{Config, PanelScope};
use crate::store::{Mapping, MeasurementStore, Source, StoreEvent};

use super::AnnotationSink;

/// What a tool event did to the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncAction {
    Created(RecordUid),
    Updated(RecordUid),
    Removed(RecordUid),
    /// Selection flags changed on this many records.
    Selected(usize),
    /// The event named no synchronized record.
    Ignored,
}

/// Applies one tool-layer event to the store.
///
/// Label values not declared by a panel of the record's scope in `config`
/// are dropped before anything is written. `case-label` annotations are
/// ignored: the per-case label record is owned by the seeder and the
/// importer, and the tool layer never draws, moves or removes it.
///
/// # Errors
/// Returns an error if the annotation has no uid, no mapping exists for its
/// type, or the mapping rejects it.
pub fn apply_tool_event<S: MeasurementStore + ?Sized>(
    store: &mut S,
    source: &Source,
    config: &Config,
    event: &ToolEvent,
) -> Result<SyncAction, LabelSyncError> {
    if let Some(annotation) = event.annotation() {
        if annotation.annotation_type == CASE_LABEL_TYPE {
            tracing::debug!(
                uid = ?annotation.annotation_uid,
                "case-label annotation from the tool layer ignored"
            );
            return Ok(SyncAction::Ignored);
        }
    }

    match event {
        ToolEvent::Added(annotation) | ToolEvent::Completed(annotation) => {
            let uid = tool_uid(annotation)?;
            let annotation = declared_only(config, annotation);
            if store.get_measurement(&uid).is_some() {
                // Completed follows Added for the same annotation.
                return rederive(store, source, &annotation, uid);
            }
            let created = store.add_raw_measurement(
                source,
                Some(annotation.annotation_type.as_str()),
                &annotation,
            )?;
            Ok(SyncAction::Created(created))
        }
        ToolEvent::Modified(annotation) => {
            let uid = tool_uid(annotation)?;
            if store.get_measurement(&uid).is_none() {
                tracing::debug!(uid = %uid, "modified annotation was never synchronized");
                return Ok(SyncAction::Ignored);
            }
            rederive(store, source, &declared_only(config, annotation), uid)
        }
        ToolEvent::Removed(annotation) => {
            let uid = tool_uid(annotation)?;
            let drawn = store
                .get_measurement(&uid)
                .is_some_and(|record| !record.is_case_label());
            if !drawn {
                return Ok(SyncAction::Ignored);
            }
            store.remove(&uid);
            Ok(SyncAction::Removed(uid))
        }
        ToolEvent::SelectionChanged { added, removed } => {
            let mut changed = 0;
            for (uids, selected) in [(added, true), (removed, false)] {
                for uid in uids {
                    if set_selected(store, uid, selected)? {
                        changed += 1;
                    }
                }
            }
            Ok(SyncAction::Selected(changed))
        }
    }
}

/// Forwards a store event to the tool layer.
///
/// `case-label` records have no drawn counterpart and are skipped.
pub fn forward_store_event(event: &StoreEvent, mappings: &[Mapping], sink: &mut dyn AnnotationSink) {
    match event {
        StoreEvent::Updated(record) if !record.is_case_label() => {
            match mappings
                .iter()
                .find(|m| m.annotation_type == record.tool_type.as_str())
            {
                Some(mapping) => sink.update_annotation((mapping.to_annotation)(record)),
                None => tracing::warn!(
                    uid = %record.uid,
                    tool_type = %record.tool_type,
                    "no mapping to convert updated record"
                ),
            }
        }
        StoreEvent::Removed(record) if !record.is_case_label() => {
            sink.remove_annotation(&record.uid);
        }
        StoreEvent::Cleared { removed } => {
            for record in removed.iter().filter(|r| !r.is_case_label()) {
                sink.remove_annotation(&record.uid);
            }
        }
        _ => {}
    }
}

fn tool_uid(annotation: &ToolAnnotation) -> Result<RecordUid, LabelSyncError> {
    annotation
        .annotation_uid
        .clone()
        .ok_or_else(|| LabelSyncError::Conversion {
            annotation_type: annotation.annotation_type.clone(),
            message: "tool annotation has no uid".to_string(),
        })
}

/// Copy of `annotation` keeping only the label keys its scope declares.
fn declared_only(config: &Config, annotation: &ToolAnnotation) -> ToolAnnotation {
    let mut annotation = annotation.clone();
    let tool_type = ToolType::from_tag(&annotation.annotation_type);
    if let (Some(tool_type), Some(label_data)) = (tool_type, annotation.data.label_data.as_mut()) {
        let scope = PanelScope::for_tool_type(tool_type);
        let before = label_data.len();
        label_data.retain(|key| config.declares(scope, key));
        if label_data.len() != before {
            tracing::debug!(
                dropped = before - label_data.len(),
                "undeclared label keys dropped from tool annotation"
            );
        }
    }
    annotation
}

/// Re-runs the record's mapping over `annotation` and writes the result.
///
/// Fields the annotation leaves out keep the stored record's values.
fn rederive<S: MeasurementStore + ?Sized>(
    store: &mut S,
    source: &Source,
    annotation: &ToolAnnotation,
    uid: RecordUid,
) -> Result<SyncAction, LabelSyncError> {
    let existing = store
        .get_measurement(&uid)
        .cloned()
        .ok_or_else(|| LabelSyncError::RecordNotFound(uid.clone()))?;
    let mapping = find_mapping(&*store, source, existing.tool_type.as_str())?;

    let mut annotation = annotation.clone();
    annotation.annotation_uid = Some(uid.clone());
    let metadata = &mut annotation.metadata;
    metadata.case_id.get_or_insert_with(|| existing.reference_case_id.clone());
    metadata.origin.get_or_insert(existing.origin);
    if let Some(geometry) = &existing.geometry {
        metadata
            .frame_of_reference_id
            .get_or_insert_with(|| geometry.frame_of_reference_id.clone());
    }
    annotation
        .data
        .label_data
        .get_or_insert_with(|| existing.label_data.clone());

    let mut record = (mapping.to_measurement)(&annotation)?;
    record.selected = existing.selected;
    store.update(&uid, record)?;
    Ok(SyncAction::Updated(uid))
}

fn set_selected<S: MeasurementStore + ?Sized>(
    store: &mut S,
    uid: &RecordUid,
    selected: bool,
) -> Result<bool, LabelSyncError> {
    let record = match store.get_measurement(uid) {
        Some(record) if record.selected != selected => record,
        _ => return Ok(false),
    };
    let record = LabelRecord {
        selected,
        ..record.clone()
    };
    store.update(uid, record)?;
    Ok(true)
}
