use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use labelsync::events::EventBus;
use labelsync::model::{
    CaseId, Point, RecordUid, ToolAnnotation, ToolEvent, CASE_LABEL_TYPE, ROI_TYPE,
};
use labelsync::registration::register_labeling_source;
use labelsync::schema::{load_config, Config, PanelConfig, LabelField, TableOptions};
use labelsync::seed::seed;
use labelsync::store::{InMemoryStore, MeasurementStore};
use labelsync::sync::{update_label, AnnotationSink, SyncSession};
use labelsync::table::{export_table, from_table_str, import_table, to_table_string};

fn case_table_config() -> Config {
    Config::new(
        vec![PanelConfig::new(
            "case table",
            vec![
                LabelField::categorical("status", ["open", "closed"]),
                LabelField::date("reviewedOn"),
            ],
        )],
        TableOptions::default(),
    )
    .expect("valid config")
}

fn label_data_by_case(store: &InMemoryStore) -> BTreeMap<String, BTreeMap<String, String>> {
    store
        .get_measurements()
        .into_iter()
        .filter(|r| r.is_case_label())
        .map(|r| {
            (
                r.reference_case_id.to_string(),
                r.label_data
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            )
        })
        .collect()
}

#[test]
fn seed_edit_export_import_scenario() {
    let config = case_table_config();
    let mut store = InMemoryStore::new();
    let source = register_labeling_source(&mut store).unwrap();
    let case = CaseId::new("C1");

    let outcome = seed(&mut store, &source, &config, &case).unwrap();
    let record = store.get_measurement(outcome.uid()).unwrap();
    assert_eq!(
        record.label_data.iter().collect::<Vec<_>>(),
        vec![("status", "open"), ("reviewedOn", "19700101")]
    );

    update_label(&mut store, &config, outcome.uid(), "status", "closed").unwrap();

    let table = export_table(&store, config.table());
    let csv = to_table_string(&table).unwrap();
    assert_eq!(
        csv,
        "AnnotationType,StudyInstanceUID,status,reviewedOn\nODELIA:Label,C1,closed,19700101\n"
    );

    let report = import_table(&mut store, &source, &config, &from_table_str(&csv).unwrap()).unwrap();
    assert!(report.is_clean());
    assert_eq!(store.len(), 1);
    let records = store.get_measurements();
    assert_eq!(records[0].reference_case_id, case);
    assert_eq!(records[0].label_data.get("status"), Some("closed"));
}

#[test]
fn seeding_twice_keeps_one_record() {
    let config = case_table_config();
    let mut store = InMemoryStore::new();
    let source = register_labeling_source(&mut store).unwrap();

    for _ in 0..3 {
        seed(&mut store, &source, &config, &CaseId::new("C1")).unwrap();
    }
    assert_eq!(store.len(), 1);
}

#[test]
fn export_import_roundtrip_preserves_label_data() {
    let config = load_config(Path::new("tests/fixtures/case_config.yaml")).unwrap();
    let mut store = InMemoryStore::new();
    let source = register_labeling_source(&mut store).unwrap();

    for case in ["1.2.3", "1.2.4", "1.2.5"] {
        seed(&mut store, &source, &config, &CaseId::new(case)).unwrap();
    }
    let second = store.get_measurements()[1].uid.clone();
    update_label(&mut store, &config, &second, "reviewedOn", "20240229").unwrap();

    let before = label_data_by_case(&store);
    let csv = to_table_string(&export_table(&store, config.table())).unwrap();
    import_table(&mut store, &source, &config, &from_table_str(&csv).unwrap()).unwrap();

    assert_eq!(label_data_by_case(&store), before);
}

#[derive(Default)]
struct Canvas {
    drawn: Vec<ToolAnnotation>,
    erased: Vec<RecordUid>,
}

impl AnnotationSink for Canvas {
    fn update_annotation(&mut self, annotation: ToolAnnotation) {
        self.drawn.push(annotation);
    }

    fn remove_annotation(&mut self, uid: &RecordUid) {
        self.erased.push(uid.clone());
    }
}

#[test]
fn drawn_roi_survives_table_roundtrip() {
    let config = load_config(Path::new("tests/fixtures/case_config.yaml")).unwrap();
    let store = Rc::new(RefCell::new(InMemoryStore::new()));
    let source = register_labeling_source(&mut *store.borrow_mut()).unwrap();
    let mut tool_bus = EventBus::new();
    let canvas = Rc::new(RefCell::new(Canvas::default()));
    let session = SyncSession::attach(&store, &source, &config, &mut tool_bus, Rc::clone(&canvas));

    seed(&mut *store.borrow_mut(), &source, &config, &CaseId::new("S1")).unwrap();

    let outline = ToolAnnotation::new(ROI_TYPE)
        .with_uid("roi-1")
        .with_case("S1")
        .with_frame_of_reference("1.2.840.1")
        .with_points(vec![Point::new(10.0, 20.0), Point::new(30.0, 40.0), Point::new(50.0, 60.0)]);
    tool_bus.publish(&ToolEvent::Added(outline.clone()));
    tool_bus.publish(&ToolEvent::Completed(outline));
    assert_eq!(store.borrow().len(), 2);

    // the tool layer cannot add a second case label for a seeded case
    tool_bus.publish(&ToolEvent::Added(
        ToolAnnotation::new(CASE_LABEL_TYPE).with_uid("tool-label").with_case("S1"),
    ));
    assert_eq!(store.borrow().len(), 2);

    // a modify for an annotation that was never added is ignored
    tool_bus.publish(&ToolEvent::Modified(
        ToolAnnotation::new(ROI_TYPE).with_uid("roi-unknown"),
    ));
    assert_eq!(store.borrow().len(), 2);

    update_label(&mut *store.borrow_mut(), &config, &"roi-1".into(), "size", "large").unwrap();
    assert_eq!(canvas.borrow().drawn.len(), 1);

    let csv = to_table_string(&export_table(&*store.borrow(), config.table())).unwrap();
    assert!(csv.contains("ODELIA:ROI,S1,1.2.840.1,10 20;30 40;50 60,,,large"));

    let table = from_table_str(&csv).unwrap();
    let report = import_table(&mut *store.borrow_mut(), &source, &config, &table).unwrap();
    assert_eq!((report.label_records, report.roi_records), (1, 1));

    // import clears the store, which erases the drawn outline, then redraws
    // the reconstructed ROI when its labels are written
    let canvas_state = canvas.borrow();
    assert_eq!(canvas_state.erased, vec![RecordUid::new("roi-1")]);
    let redrawn = canvas_state.drawn.last().unwrap();
    assert_eq!(redrawn.data.points.len(), 3);
    assert_eq!(
        redrawn.data.label_data.as_ref().and_then(|d| d.get("size")),
        Some("large")
    );
    drop(canvas_state);

    assert_eq!(session.detach(&mut tool_bus), 8);
}
