#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};

use labelsync::model::{Geometry, LabelRecord, OriginTag, Point, ToolType};
use labelsync::schema::{Config, LabelField, PanelConfig, PanelScope, TableOptions};
use labelsync::store::{InMemoryStore, MeasurementStore};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub const STATUS_OPTIONS: [&str; 3] = ["open", "closed", "needs review, urgent"];
pub const SIZE_OPTIONS: [&str; 2] = ["small", "large \"xl\""];

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Case panel with a comma-bearing option, ROI panel with a quote-bearing one.
pub fn label_config() -> Config {
    Config::new(
        vec![
            PanelConfig::new(
                "case table",
                vec![
                    LabelField::categorical("status", STATUS_OPTIONS),
                    LabelField::date("reviewedOn"),
                    LabelField::categorical("grade", ["1", "2", "3"]),
                ],
            ),
            PanelConfig::new(
                "lesion table",
                vec![LabelField::categorical("size", SIZE_OPTIONS)],
            )
            .with_scope(PanelScope::Roi),
        ],
        TableOptions::default(),
    )
    .expect("valid config")
}

fn arb_date() -> impl Strategy<Value = String> {
    (1970u32..2100, 1u32..13, 1u32..29).prop_map(|(y, m, d)| format!("{:04}{:02}{:02}", y, m, d))
}

/// Label values for a case record; every key is optional.
fn arb_case_labels() -> impl Strategy<Value = Vec<(String, String)>> {
    (
        proptest::option::of(proptest::sample::select(STATUS_OPTIONS.to_vec())),
        proptest::option::of(arb_date()),
        proptest::option::of(proptest::sample::select(vec!["1", "2", "3"])),
    )
        .prop_map(|(status, date, grade)| {
            let mut labels = Vec::new();
            if let Some(status) = status {
                labels.push(("status".to_string(), status.to_string()));
            }
            if let Some(date) = date {
                labels.push(("reviewedOn".to_string(), date));
            }
            if let Some(grade) = grade {
                labels.push(("grade".to_string(), grade.to_string()));
            }
            labels
        })
}

fn arb_point() -> impl Strategy<Value = Point> {
    (-1.0e4f64..1.0e4, -1.0e4f64..1.0e4).prop_map(|(x, y)| Point::new(x, y))
}

fn arb_roi(case_count: usize) -> impl Strategy<Value = (usize, Vec<Point>, Option<&'static str>)> {
    (
        0..case_count,
        proptest::collection::vec(arb_point(), 1..8),
        proptest::option::of(proptest::sample::select(SIZE_OPTIONS.to_vec())),
    )
}

/// A store with up to `max_cases` seeded-like case records and up to
/// `max_rois` ROI records attached to those cases.
pub fn arb_store(max_cases: usize, max_rois: usize) -> BoxedStrategy<InMemoryStore> {
    (1..=max_cases)
        .prop_flat_map(move |cases| {
            (
                proptest::collection::vec(arb_case_labels(), cases),
                proptest::collection::vec(arb_roi(cases), 0..=max_rois),
            )
        })
        .prop_map(|(cases, rois)| {
            let mut records: Vec<LabelRecord> = cases
                .into_iter()
                .enumerate()
                .map(|(i, labels)| {
                    LabelRecord::new(
                        format!("label-{i}"),
                        format!("1.2.840.{i}"),
                        ToolType::CaseLabel,
                        OriginTag::Inited,
                    )
                    .with_label_data(labels.into_iter().collect())
                })
                .collect();

            for (i, (case, points, size)) in rois.into_iter().enumerate() {
                let mut record = LabelRecord::new(
                    format!("roi-{i}"),
                    format!("1.2.840.{case}"),
                    ToolType::Roi,
                    OriginTag::Drawn,
                )
                .with_geometry(Geometry::new(format!("FOR.{case}"), points));
                if let Some(size) = size {
                    record = record.with_label("size", size);
                }
                records.push(record);
            }
            InMemoryStore::with_records(records)
        })
        .boxed()
}

pub type Labels = BTreeMap<String, String>;

/// Case id → label values of its `case-label` record.
pub fn case_semantics(store: &InMemoryStore) -> BTreeMap<String, Labels> {
    store
        .get_measurements()
        .into_iter()
        .filter(|r| r.is_case_label())
        .map(|r| (r.reference_case_id.to_string(), labels_of(r)))
        .collect()
}

/// ROI records ignoring uid: (case, frame of reference, points, labels).
pub fn roi_semantics(store: &InMemoryStore) -> BTreeSet<String> {
    store
        .get_measurements()
        .into_iter()
        .filter(|r| !r.is_case_label())
        .map(|r| {
            let geometry = r.geometry.clone().unwrap_or_default();
            format!(
                "{}|{}|{:?}|{:?}",
                r.reference_case_id,
                geometry.frame_of_reference_id,
                geometry.points,
                labels_of(r)
            )
        })
        .collect()
}

fn labels_of(record: &LabelRecord) -> Labels {
    record
        .label_data
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
