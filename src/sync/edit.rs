//! Label edits coming from the presentation layer.

use crate::error::LabelSyncError;
use crate::model::RecordUid;
use crate::schema::{Config, PanelScope};
use crate::store::MeasurementStore;

/// Sets one label value on a stored record.
///
/// The key must be declared by a panel matching the record's kind, and the
/// value must be legal for that field. The write goes through
/// [`MeasurementStore::update`], so subscribers see an `Updated` event.
///
/// # Errors
/// [`LabelSyncError::RecordNotFound`], [`LabelSyncError::UnknownLabelKey`]
/// or [`LabelSyncError::InvalidLabelValue`].
pub fn update_label<S: MeasurementStore + ?Sized>(
    store: &mut S,
    config: &Config,
    uid: &RecordUid,
    key: &str,
    value: &str,
) -> Result<(), LabelSyncError> {
    let record = store
        .get_measurement(uid)
        .ok_or_else(|| LabelSyncError::RecordNotFound(uid.clone()))?;

    let field = config
        .field(PanelScope::for_tool_type(record.tool_type), key)
        .ok_or_else(|| LabelSyncError::UnknownLabelKey {
            key: key.to_string(),
            tool_type: record.tool_type.to_string(),
        })?;
    if !field.accepts(value) {
        return Err(LabelSyncError::InvalidLabelValue {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    let mut updated = record.clone();
    updated.label_data.insert(key, value);
    store.update(uid, updated)?;
    tracing::debug!(uid = %uid, key, value, "label updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LabelRecord, OriginTag, ToolType};
    use crate::schema::from_yaml_str;
    use crate::store::InMemoryStore;

    const CONFIG: &str = r#"
panels:
  - name: case table
    fields:
      - key: status
        kind: categorical
        options: [open, closed]
      - key: reviewedOn
        kind: date
  - name: lesion table
    scope: roi
    fields:
      - key: size
        kind: categorical
        options: [small, large]
"#;

    fn store() -> InMemoryStore {
        InMemoryStore::with_records(vec![
            LabelRecord::new("L", "C1", ToolType::CaseLabel, OriginTag::Inited)
                .with_label("status", "open")
                .with_label("reviewedOn", "19700101"),
            LabelRecord::new("R", "C1", ToolType::Roi, OriginTag::Drawn),
        ])
    }

    #[test]
    fn test_update_categorical_keeps_key_order() {
        let config = from_yaml_str(CONFIG).unwrap();
        let mut store = store();
        update_label(&mut store, &config, &"L".into(), "status", "closed").unwrap();

        let record = store.get_measurement(&"L".into()).unwrap();
        assert_eq!(
            record.label_data.iter().collect::<Vec<_>>(),
            vec![("status", "closed"), ("reviewedOn", "19700101")]
        );
    }

    #[test]
    fn test_update_date() {
        let config = from_yaml_str(CONFIG).unwrap();
        let mut store = store();
        update_label(&mut store, &config, &"L".into(), "reviewedOn", "20240131").unwrap();

        let err = update_label(&mut store, &config, &"L".into(), "reviewedOn", "2024-01-31")
            .unwrap_err();
        assert!(matches!(err, LabelSyncError::InvalidLabelValue { .. }));
    }

    #[test]
    fn test_keys_are_scoped_by_record_kind() {
        let config = from_yaml_str(CONFIG).unwrap();
        let mut store = store();

        update_label(&mut store, &config, &"R".into(), "size", "large").unwrap();
        let err = update_label(&mut store, &config, &"R".into(), "status", "open").unwrap_err();
        assert!(matches!(err, LabelSyncError::UnknownLabelKey { .. }));
        let err = update_label(&mut store, &config, &"L".into(), "size", "large").unwrap_err();
        assert!(matches!(err, LabelSyncError::UnknownLabelKey { .. }));
    }

    #[test]
    fn test_missing_record() {
        let config = from_yaml_str(CONFIG).unwrap();
        let err = update_label(&mut store(), &config, &"nope".into(), "status", "open").unwrap_err();
        assert!(matches!(err, LabelSyncError::RecordNotFound(_)));
    }
}
