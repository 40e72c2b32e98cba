//! Source and mapping registration.
//!
//! Registration runs once at extension load. It creates the labeling
//! [`Source`] in the measurement store and installs one [`Mapping`] per
//! annotation type. Every other component looks mappings up through the
//! returned handle, so a failure here must abort startup.

mod mappings;

pub use mappings::{case_label_mapping, default_mappings, roi_mapping};

use crate::error::LabelSyncError;
use crate::store::{Mapping, MeasurementStore, Source};

/// Name under which the labeling source registers.
pub const LABELING_SOURCE_NAME: &str = "OdeliaLabeling";

/// Version of the labeling source.
pub const LABELING_SOURCE_VERSION: &str = "0.1";

/// Registers `name@version` with `mappings` on the store.
///
/// Registering the same pair again returns the same handle; mappings of the
/// same annotation type replace the earlier ones instead of duplicating.
///
/// # Errors
/// Returns [`LabelSyncError::Registration`] if the store cannot create the
/// source or accept a mapping.
pub fn register<S: MeasurementStore + ?Sized>(
    store: &mut S,
    name: &str,
    version: &str,
    mappings: Vec<Mapping>,
) -> Result<Source, LabelSyncError> {
    let source = store
        .create_source(name, version)
        .map_err(|e| registration_error(name, version, e))?;

    for mapping in mappings {
        let annotation_type = mapping.annotation_type.clone();
        store
            .add_mapping(&source, mapping)
            .map_err(|e| registration_error(name, version, e))?;
        tracing::debug!(source = %source, annotation_type, "installed mapping");
    }

    tracing::info!(source = %source, "registered annotation source");
    Ok(source)
}

/// Registers the labeling source with its built-in mappings.
pub fn register_labeling_source<S: MeasurementStore + ?Sized>(
    store: &mut S,
) -> Result<Source, LabelSyncError> {
    register(
        store,
        LABELING_SOURCE_NAME,
        LABELING_SOURCE_VERSION,
        default_mappings(),
    )
}

/// Looks up the mapping for `annotation_type` on `source`.
///
/// # Errors
/// Returns [`LabelSyncError::MappingNotFound`] when the mapping was never
/// installed, which means registration did not run first.
pub fn find_mapping<S: MeasurementStore + ?Sized>(
    store: &S,
    source: &Source,
    annotation_type: &str,
) -> Result<Mapping, LabelSyncError> {
    store
        .get_source_mappings(&source.name, &source.version)
        .into_iter()
        .find(|m| m.annotation_type == annotation_type)
        .ok_or_else(|| LabelSyncError::MappingNotFound {
            source_name: source.name.clone(),
            source_version: source.version.clone(),
            annotation_type: annotation_type.to_string(),
        })
}

fn registration_error(name: &str, version: &str, err: LabelSyncError) -> LabelSyncError {
    match err {
        LabelSyncError::Registration { .. } => err,
        other => LabelSyncError::Registration {
            name: name.to_string(),
            version: version.to_string(),
            message: other.to_string(),
        },
    }
}
