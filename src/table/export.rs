//! Record → table export.

use super::{
    format_points, row_tag, Table, ANNOTATION_TYPE_COLUMN, FRAME_OF_REFERENCE_COLUMN,
    POINTS_COLUMN,
};
use crate::model::LabelRecord;
use crate::schema::TableOptions;
use crate::store::MeasurementStore;

/// Serializes every record of `store` into a table.
///
/// One row per record, in store order. Label columns are the union of all
/// records' keys in first-seen insertion order; a record lacking a key gets
/// an empty cell. Geometry columns are only present if an ROI record is
/// exported. The store is not modified.
pub fn export_table<S: MeasurementStore + ?Sized>(store: &S, options: &TableOptions) -> Table {
    let records = store.get_measurements();
    let with_geometry = records.iter().any(|r| r.geometry.is_some());

    let mut label_columns: Vec<&str> = Vec::new();
    for record in &records {
        for key in record.label_data.keys() {
            if !options.is_metadata(key) && !label_columns.contains(&key) {
                label_columns.push(key);
            }
        }
    }

    let mut header = vec![ANNOTATION_TYPE_COLUMN, options.identity_column.as_str()];
    if with_geometry {
        header.extend([FRAME_OF_REFERENCE_COLUMN, POINTS_COLUMN]);
    }
    header.extend(label_columns.iter().copied());

    let mut table = Table::new(header);
    for record in &records {
        table.push_row(record_row(record, with_geometry, &label_columns));
    }

    tracing::debug!(
        rows = table.rows.len(),
        columns = table.header.len(),
        "exported records"
    );
    table
}

fn record_row(record: &LabelRecord, with_geometry: bool, label_columns: &[&str]) -> Vec<String> {
    let mut row = vec![
        row_tag(record.tool_type).to_string(),
        record.reference_case_id.to_string(),
    ];
    if with_geometry {
        match &record.geometry {
            Some(geometry) => {
                row.push(geometry.frame_of_reference_id.clone());
                row.push(format_points(&geometry.points));
            }
            None => row.extend([String::new(), String::new()]),
        }
    }
    row.extend(
        label_columns
            .iter()
            .map(|key| record.label_data.get(key).unwrap_or_default().to_string()),
    );
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Geometry, OriginTag, Point, ToolType};
    use crate::store::InMemoryStore;

    #[test]
    fn test_columns_follow_first_seen_order() {
        let store = InMemoryStore::with_records(vec![
            LabelRecord::new("a", "C1", ToolType::CaseLabel, OriginTag::Inited)
                .with_label("status", "open")
                .with_label("reviewedOn", "19700101"),
            LabelRecord::new("b", "C2", ToolType::CaseLabel, OriginTag::Imported)
                .with_label("grade", "2")
                .with_label("status", "closed"),
        ]);

        let table = export_table(&store, &TableOptions::default());
        assert_eq!(
            table.header,
            vec!["AnnotationType", "StudyInstanceUID", "status", "reviewedOn", "grade"]
        );
        assert_eq!(table.rows[0], vec!["ODELIA:Label", "C1", "open", "19700101", ""]);
        assert_eq!(table.rows[1], vec!["ODELIA:Label", "C2", "closed", "", "2"]);
    }

    #[test]
    fn test_geometry_columns_only_with_roi() {
        let store = InMemoryStore::with_records(vec![
            LabelRecord::new("a", "C1", ToolType::CaseLabel, OriginTag::Inited)
                .with_label("status", "open"),
            LabelRecord::new("r", "C1", ToolType::Roi, OriginTag::Drawn)
                .with_label("size", "large")
                .with_geometry(Geometry::new(
                    "1.2.840",
                    vec![Point::new(10.0, 20.0), Point::new(30.5, 40.0)],
                )),
        ]);

        let table = export_table(&store, &TableOptions::default());
        assert_eq!(
            table.header,
            vec![
                "AnnotationType",
                "StudyInstanceUID",
                "FrameOfReferenceUID",
                "points",
                "status",
                "size"
            ]
        );
        assert_eq!(table.rows[0], vec!["ODELIA:Label", "C1", "", "", "open", ""]);
        assert_eq!(
            table.rows[1],
            vec!["ODELIA:ROI", "C1", "1.2.840", "10 20;30.5 40", "", "large"]
        );
    }

    #[test]
    fn test_empty_store_exports_header_only() {
        let table = export_table(&InMemoryStore::new(), &TableOptions::default());
        assert_eq!(table.header, vec!["AnnotationType", "StudyInstanceUID"]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_export_does_not_mutate() {
        let store = InMemoryStore::with_records(vec![LabelRecord::new(
            "a",
            "C1",
            ToolType::CaseLabel,
            OriginTag::Inited,
        )]);
        let before = store.records();
        export_table(&store, &TableOptions::default());
        assert_eq!(store.records(), before);
    }
}
