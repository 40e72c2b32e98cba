//! Default label seeding.
//!
//! When a case is opened for the first time, the seeder creates its single
//! `case-label` record holding the default value of every case-scoped field.
//! Seeding an already seeded case does nothing, so callers may seed on every
//! open.

use crate::error::LabelSyncError;
use crate::model::{CaseId, LabelData, OriginTag, RecordUid, ToolAnnotation, CASE_LABEL_TYPE};
use crate::schema::{Config, PanelScope};
use crate::store::{MeasurementStore, Source};

/// Result of a [`seed`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeedOutcome {
    /// A new record was created.
    Created(RecordUid),
    /// The case already had a label record; nothing was written.
    AlreadySeeded(RecordUid),
}

impl SeedOutcome {
    /// The uid of the case's label record.
    pub fn uid(&self) -> &RecordUid {
        match self {
            SeedOutcome::Created(uid) | SeedOutcome::AlreadySeeded(uid) => uid,
        }
    }

    pub fn created(&self) -> bool {
        matches!(self, SeedOutcome::Created(_))
    }
}

/// Flattens the defaults of every case-scoped panel into one map.
///
/// Keys keep panel then field declaration order.
pub fn default_label_data(config: &Config) -> LabelData {
    config
        .scope_fields(PanelScope::Case)
        .map(|field| (field.key.as_str(), field.default_value()))
        .collect()
}

/// Creates the default `case-label` record for `case_id` unless one exists.
///
/// # Errors
/// Returns [`LabelSyncError::MappingNotFound`] if the `case-label` mapping
/// was never registered on `source`, and propagates conversion failures.
pub fn seed<S: MeasurementStore + ?Sized>(
    store: &mut S,
    source: &Source,
    config: &Config,
    case_id: &CaseId,
) -> Result<SeedOutcome, LabelSyncError> {
    if let Some(existing) = store
        .get_measurements()
        .into_iter()
        .find(|r| r.is_case_label() && &r.reference_case_id == case_id)
    {
        tracing::debug!(case_id = %case_id, uid = %existing.uid, "case already seeded");
        return Ok(SeedOutcome::AlreadySeeded(existing.uid.clone()));
    }

    let payload = ToolAnnotation::new(CASE_LABEL_TYPE)
        .with_uid(RecordUid::generate())
        .with_case(case_id.clone())
        .with_origin(OriginTag::Inited)
        .with_label_data(default_label_data(config));

    let uid = store.add_raw_measurement(source, Some(CASE_LABEL_TYPE), &payload)?;
    tracing::info!(case_id = %case_id, uid = %uid, "seeded default labels");
    Ok(SeedOutcome::Created(uid))
}
