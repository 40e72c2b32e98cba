//! Bidirectional synchronization between the annotation tool layer and the
//! measurement store.
//!
//! A [`SyncSession`] subscribes to both feeds:
//!
//! - tool events (`Added`, `Completed`, `Modified`, `Removed`,
//!   `SelectionChanged`) become store writes, correlated by uid;
//! - store `Updated`, `Removed` and `Cleared` events are forwarded to an
//!   [`AnnotationSink`] so drawn annotations follow edits made elsewhere.
//!
//! Store events raised by the session's own tool-driven writes are not
//! forwarded. Failures are logged per event and never reach the event
//! source. Subscriptions stay alive until [`SyncSession::detach`].

mod edit;
mod handlers;

pub use edit::update_label;
pub use handlers::{apply_tool_event, forward_store_event, SyncAction};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::events::{EventBus, SubscriptionId};
use crate::model::{RecordUid, ToolAnnotation, ToolEvent, ToolEventKind};
use crate::schema::Config;
use crate::store::{MeasurementStore, Source, StoreEvent, StoreEventKind};

/// Command side of the annotation tool layer.
pub trait AnnotationSink {
    /// Redraws (or draws) the annotation with the given uid.
    fn update_annotation(&mut self, annotation: ToolAnnotation);

    fn remove_annotation(&mut self, uid: &RecordUid);
}

const TOOL_KINDS: [ToolEventKind; 5] = [
    ToolEventKind::Added,
    ToolEventKind::Completed,
    ToolEventKind::Modified,
    ToolEventKind::Removed,
    ToolEventKind::SelectionChanged,
];

const STORE_KINDS: [StoreEventKind; 3] = [
    StoreEventKind::Updated,
    StoreEventKind::Removed,
    StoreEventKind::Cleared,
];

/// Live subscriptions of one synchronization session.
#[must_use = "dropping a session leaks its subscriptions; call detach"]
pub struct SyncSession<S: MeasurementStore> {
    store: Rc<RefCell<S>>,
    tool_subscriptions: Vec<SubscriptionId>,
    store_subscriptions: Vec<SubscriptionId>,
}

impl<S: MeasurementStore + 'static> SyncSession<S> {
    /// Subscribes to `tool_bus` and to `store`, writing tool events through
    /// `source` and forwarding store events to `sink`.
    ///
    /// Tool label values are filtered against `config` before they reach the
    /// store. The store must not be borrowed while attaching.
    pub fn attach<K: AnnotationSink + 'static>(
        store: &Rc<RefCell<S>>,
        source: &Source,
        config: &Config,
        tool_bus: &mut EventBus<ToolEvent>,
        sink: Rc<RefCell<K>>,
    ) -> Self {
        let writing = Rc::new(Cell::new(false));
        let config = Rc::new(config.clone());

        let tool_subscriptions = TOOL_KINDS
            .iter()
            .map(|&kind| {
                let store = Rc::clone(store);
                let source = source.clone();
                let config = Rc::clone(&config);
                let writing = Rc::clone(&writing);
                tool_bus.subscribe(kind, move |event: &ToolEvent| {
                    handle_tool_event(&store, &source, &config, &writing, event)
                })
            })
            .collect();

        let mut guard = store.borrow_mut();
        let mappings = guard.get_source_mappings(&source.name, &source.version);
        let store_subscriptions = STORE_KINDS
            .iter()
            .map(|&kind| {
                let sink = Rc::clone(&sink);
                let writing = Rc::clone(&writing);
                let mappings = mappings.clone();
                guard.subscribe(
                    kind,
                    Box::new(move |event: &StoreEvent| {
                        if writing.get() {
                            return;
                        }
                        match sink.try_borrow_mut() {
                            Ok(mut sink) => forward_store_event(event, &mappings, &mut *sink),
                            Err(_) => tracing::warn!(
                                event = ?kind,
                                "annotation sink is busy, store event dropped"
                            ),
                        }
                    }),
                )
            })
            .collect();
        drop(guard);

        tracing::debug!(source = %source, "synchronizer attached");
        Self {
            store: Rc::clone(store),
            tool_subscriptions,
            store_subscriptions,
        }
    }

    /// Removes every subscription of the session.
    ///
    /// Returns the number of subscriptions removed.
    pub fn detach(self, tool_bus: &mut EventBus<ToolEvent>) -> usize {
        let mut removed = 0;
        for id in self.tool_subscriptions {
            removed += usize::from(tool_bus.unsubscribe(id));
        }
        let mut store = self.store.borrow_mut();
        for id in self.store_subscriptions {
            removed += usize::from(store.unsubscribe(id));
        }
        tracing::debug!(removed, "synchronizer detached");
        removed
    }
}

fn handle_tool_event<S: MeasurementStore>(
    store: &Rc<RefCell<S>>,
    source: &Source,
    config: &Config,
    writing: &Cell<bool>,
    event: &ToolEvent,
) {
    let kind = event.kind().as_str();
    let mut store = match store.try_borrow_mut() {
        Ok(store) => store,
        Err(_) => {
            tracing::warn!(event = kind, "store is busy, tool event dropped");
            return;
        }
    };

    writing.set(true);
    let result = apply_tool_event(&mut *store, source, config, event);
    writing.set(false);

    match result {
        Ok(action) => tracing::debug!(event = kind, ?action, "tool event synchronized"),
        Err(e) => tracing::warn!(event = kind, error = %e, "failed to synchronize tool event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Point, ROI_TYPE};
    use crate::registration::register_labeling_source;
    use crate::schema::from_yaml_str;
    use crate::store::InMemoryStore;

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

    struct Fixture {
        store: Rc<RefCell<InMemoryStore>>,
        config: Config,
        bus: EventBus<ToolEvent>,
        canvas: Rc<RefCell<Canvas>>,
        session: SyncSession<InMemoryStore>,
    }

    fn fixture() -> Fixture {
        let store = Rc::new(RefCell::new(InMemoryStore::new()));
        let source = register_labeling_source(&mut *store.borrow_mut()).unwrap();
        let mut bus = EventBus::new();
        let canvas = Rc::new(RefCell::new(Canvas::default()));
        let config = from_yaml_str(
            "panels:\n  - name: lesion table\n    scope: roi\n    fields:\n      - key: size\n        kind: categorical\n        options: [small, large]\n",
        )
        .unwrap();
        let session =
            SyncSession::attach(&store, &source, &config, &mut bus, Rc::clone(&canvas));
        Fixture {
            store,
            config,
            bus,
            canvas,
            session,
        }
    }

    fn roi(uid: &str) -> ToolAnnotation {
        ToolAnnotation::new(ROI_TYPE)
            .with_uid(uid)
            .with_case("C1")
            .with_points(vec![Point::new(0.0, 0.0), Point::new(4.0, 4.0)])
    }

    #[test]
    fn test_tool_events_reach_store_without_echo() {
        let mut f = fixture();
        f.bus.publish(&ToolEvent::Added(roi("t1")));
        f.bus.publish(&ToolEvent::Completed(roi("t1")));
        f.bus.publish(&ToolEvent::Removed(roi("t1")));

        assert!(f.store.borrow().is_empty());
        assert!(f.canvas.borrow().drawn.is_empty());
        assert!(f.canvas.borrow().erased.is_empty());
        f.session.detach(&mut f.bus);
    }

    #[test]
    fn test_modified_before_added_is_noop() {
        let mut f = fixture();
        f.bus.publish(&ToolEvent::Modified(roi("t1")));
        assert_eq!(f.store.borrow().len(), 0);
        f.session.detach(&mut f.bus);
    }

    #[test]
    fn test_failures_are_contained() {
        let mut f = fixture();
        f.bus.publish(&ToolEvent::Added(ToolAnnotation::new(ROI_TYPE)));
        f.bus.publish(&ToolEvent::Added(roi("t2")));
        assert_eq!(f.store.borrow().len(), 1);
        f.session.detach(&mut f.bus);
    }

    #[test]
    fn test_label_edit_is_forwarded_to_tool_layer() {
        let mut f = fixture();
        f.bus.publish(&ToolEvent::Added(roi("t1")));

        update_label(&mut *f.store.borrow_mut(), &f.config, &"t1".into(), "size", "large").unwrap();

        let canvas = f.canvas.borrow();
        assert_eq!(canvas.drawn.len(), 1);
        let label_data = canvas.drawn[0].data.label_data.as_ref().unwrap();
        assert_eq!(label_data.get("size"), Some("large"));
        drop(canvas);
        f.session.detach(&mut f.bus);
    }

    #[test]
    fn test_store_clear_erases_drawn_annotations() {
        let mut f = fixture();
        f.bus.publish(&ToolEvent::Added(roi("t1")));
        f.store.borrow_mut().clear_measurements();
        assert_eq!(f.canvas.borrow().erased, vec![RecordUid::new("t1")]);
        f.session.detach(&mut f.bus);
    }

    #[test]
    fn test_drawn_labels_are_filtered_by_config() {
        let mut f = fixture();
        let drawn =
            roi("t1").with_label_data([("bogus", "x"), ("size", "small")].into_iter().collect());
        f.bus.publish(&ToolEvent::Added(drawn));

        let store = f.store.borrow();
        let record = store.get_measurement(&"t1".into()).unwrap();
        assert_eq!(record.label_data.keys().collect::<Vec<_>>(), vec!["size"]);
        drop(store);
        f.session.detach(&mut f.bus);
    }

    #[test]
    fn test_detach_stops_synchronization() {
        let mut f = fixture();
        assert_eq!(f.session.detach(&mut f.bus), 8);
        assert_eq!(f.bus.subscriber_count(), 0);

        f.bus.publish(&ToolEvent::Added(roi("t1")));
        assert!(f.store.borrow().is_empty());
    }
}
