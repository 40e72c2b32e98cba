//! Table → record import with per-case collation.

use std::collections::HashMap;

use super::{
    parse_points, ImportIssue, ImportIssueCode, ImportReport, Table, ANNOTATION_TYPE_COLUMN,
    FRAME_OF_REFERENCE_COLUMN, POINTS_COLUMN, ROI_ROW_TAG,
};
use crate::error::LabelSyncError;
use crate::model::{LabelData, OriginTag, RecordUid, ToolAnnotation, CASE_LABEL_TYPE, ROI_TYPE};
use crate::registration::find_mapping;
use crate::schema::{Config, PanelScope};
use crate::store::{MeasurementStore, Source};

/// A data row with its 1-based line number (the header is line 1).
type NumberedRow<'a> = (usize, &'a [String]);

/// Replaces the store's records with the content of `table`.
///
/// The store is cleared first, even if nothing can be imported.
///
/// Label rows are collated by the identity column: when several rows share
/// an identity the last one wins, and each replacement is noted in the
/// report. Only columns declared by a case-scoped panel become label
/// values; empty cells are treated as absent.
///
/// Rows tagged `ODELIA:ROI` are not collated. If an ROI mapping is
/// registered, each becomes its own `roi` record: the record is created from
/// its geometry and then its roi-scoped label values are written with a
/// follow-up update.
///
/// Rows whose length differs from the header, rows with an empty identity
/// and ROI rows with unparseable points are skipped and reported as
/// malformed; the rest of the table is still imported.
///
/// # Errors
/// Returns an error only if the store rejects a record, for example because
/// the `case-label` mapping was never registered on `source`.
pub fn import_table<S: MeasurementStore + ?Sized>(
    store: &mut S,
    source: &Source,
    config: &Config,
    table: &Table,
) -> Result<ImportReport, LabelSyncError> {
    store.clear_measurements();
    let mut report = ImportReport::new();

    if table.is_empty() {
        report.add(ImportIssue::info(
            ImportIssueCode::EmptyTable,
            None,
            "table has no header row, nothing imported",
        ));
        return Ok(report);
    }

    note_undeclared_columns(table, config, &mut report);

    let (labels, rois) = collate(table, config, &mut report);

    for (line, row) in labels {
        let payload = ToolAnnotation::new(CASE_LABEL_TYPE)
            .with_uid(RecordUid::generate())
            .with_case(identity_of(table, config, row))
            .with_origin(OriginTag::Imported)
            .with_label_data(label_values(table, config, row, PanelScope::Case));
        let uid = store.add_raw_measurement(source, Some(CASE_LABEL_TYPE), &payload)?;
        tracing::debug!(row = line, uid = %uid, "imported label row");
        report.label_records += 1;
    }

    if !rois.is_empty() {
        if find_mapping(&*store, source, ROI_TYPE).is_ok() {
            for (line, row) in rois {
                if import_roi(store, source, config, table, line, row, &mut report)? {
                    report.roi_records += 1;
                }
            }
        } else {
            report.add(ImportIssue::warning(
                ImportIssueCode::RoiMappingMissing,
                None,
                format!(
                    "{} ROI row(s) ignored: no '{}' mapping is registered on {}",
                    rois.len(),
                    ROI_TYPE,
                    source
                ),
            ));
        }
    }

    tracing::info!(
        label_records = report.label_records,
        roi_records = report.roi_records,
        malformed_rows = report.malformed_row_count(),
        "table imported"
    );
    Ok(report)
}

/// Splits well-formed rows into collated label rows and ROI rows.
///
/// Label rows are returned in first-seen identity order.
fn collate<'a>(
    table: &'a Table,
    config: &Config,
    report: &mut ImportReport,
) -> (Vec<NumberedRow<'a>>, Vec<NumberedRow<'a>>) {
    let mut labels: Vec<NumberedRow<'a>> = Vec::new();
    let mut slots: HashMap<&'a str, usize> = HashMap::new();
    let mut rois = Vec::new();

    for (index, row) in table.rows.iter().enumerate() {
        let line = index + 2;
        if row.len() != table.header.len() {
            report.add(ImportIssue::malformed(
                line,
                format!(
                    "expected {} column(s), found {}",
                    table.header.len(),
                    row.len()
                ),
            ));
            continue;
        }

        let identity = identity_of(table, config, row);
        if identity.trim().is_empty() {
            report.add(ImportIssue::malformed(
                line,
                format!("'{}' is empty", config.table().identity_column),
            ));
            continue;
        }

        if table.cell(row, ANNOTATION_TYPE_COLUMN) == Some(ROI_ROW_TAG) {
            rois.push((line, row.as_slice()));
            continue;
        }

        match slots.get(identity) {
            Some(&slot) => {
                report.add(ImportIssue::info(
                    ImportIssueCode::DuplicateIdentity,
                    Some(line),
                    format!(
                        "replaces row {} for identity '{}' (last row wins)",
                        labels[slot].0, identity
                    ),
                ));
                labels[slot] = (line, row.as_slice());
            }
            None => {
                slots.insert(identity, labels.len());
                labels.push((line, row.as_slice()));
            }
        }
    }

    (labels, rois)
}

/// Creates one ROI record. Returns false if the row was skipped.
fn import_roi<S: MeasurementStore + ?Sized>(
    store: &mut S,
    source: &Source,
    config: &Config,
    table: &Table,
    line: usize,
    row: &[String],
    report: &mut ImportReport,
) -> Result<bool, LabelSyncError> {
    let points = match parse_points(line, table.cell(row, POINTS_COLUMN).unwrap_or_default()) {
        Ok(points) => points,
        Err(LabelSyncError::MalformedRow { message, .. }) => {
            report.add(ImportIssue::malformed(line, message));
            return Ok(false);
        }
        Err(other) => return Err(other),
    };

    let payload = ToolAnnotation::new(ROI_TYPE)
        .with_uid(RecordUid::generate())
        .with_case(identity_of(table, config, row))
        .with_frame_of_reference(
            table
                .cell(row, FRAME_OF_REFERENCE_COLUMN)
                .unwrap_or_default(),
        )
        .with_origin(OriginTag::Imported)
        .with_points(points);
    let uid = store.add_raw_measurement(source, Some(ROI_TYPE), &payload)?;

    let label_data = label_values(table, config, row, PanelScope::Roi);
    if let Some(mut record) = store.get_measurement(&uid).cloned() {
        record.label_data = label_data;
        store.update(&uid, record)?;
    }

    tracing::debug!(row = line, uid = %uid, "imported ROI row");
    Ok(true)
}

fn identity_of<'a>(table: &Table, config: &Config, row: &'a [String]) -> &'a str {
    table
        .cell(row, &config.table().identity_column)
        .unwrap_or_default()
}

/// Cells of `row` that are declared label keys of `scope`, skipping empty
/// cells and metadata columns.
fn label_values(table: &Table, config: &Config, row: &[String], scope: PanelScope) -> LabelData {
    table
        .header
        .iter()
        .zip(row)
        .filter(|(key, value)| {
            !value.is_empty() && !is_reserved(config, key) && config.declares(scope, key)
        })
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect()
}

fn is_reserved(config: &Config, column: &str) -> bool {
    config.table().is_metadata(column)
        || [ANNOTATION_TYPE_COLUMN, FRAME_OF_REFERENCE_COLUMN, POINTS_COLUMN].contains(&column)
}

fn note_undeclared_columns(table: &Table, config: &Config, report: &mut ImportReport) {
    for column in &table.header {
        if is_reserved(config, column)
            || config.declares(PanelScope::Case, column)
            || config.declares(PanelScope::Roi, column)
        {
            continue;
        }
        report.add(ImportIssue::info(
            ImportIssueCode::UndeclaredColumn,
            None,
            format!("column '{}' is not a declared label and is dropped", column),
        ));
    }
}
