//! In-process measurement store.

use std::collections::HashMap;

use super::{
    Mapping, MeasurementStore, Source, StoreEvent, StoreEventKind, StoreHandler,
};
use crate::error::LabelSyncError;
use crate::events::{EventBus, SubscriptionId};
use crate::model::{LabelRecord, RecordUid, ToolAnnotation};

/// A measurement store kept entirely in memory.
///
/// Records are held in an arena in insertion order with an index from
/// [`RecordUid`] to slot, so identity lookups never scan.
#[derive(Debug)]
pub struct InMemoryStore {
    available: bool,
    sources: Vec<(Source, Vec<Mapping>)>,
    records: Vec<LabelRecord>,
    index: HashMap<RecordUid, usize>,
    events: EventBus<StoreEvent>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            available: true,
            sources: Vec::new(),
            records: Vec::new(),
            index: HashMap::new(),
            events: EventBus::new(),
        }
    }

    /// A store that refuses source registration, as an uninitialized or
    /// unreachable service would.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// Builds a store holding `records`, without publishing events.
    ///
    /// Later records win over earlier ones with the same uid.
    pub fn with_records(records: Vec<LabelRecord>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.insert_silently(record);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copies every record, in insertion order.
    pub fn records(&self) -> Vec<LabelRecord> {
        self.records.clone()
    }

    /// Inserts or replaces; returns true if the uid was new.
    fn insert_silently(&mut self, record: LabelRecord) -> bool {
        match self.index.get(&record.uid) {
            Some(&slot) => {
                self.records[slot] = record;
                false
            }
            None => {
                self.index.insert(record.uid.clone(), self.records.len());
                self.records.push(record);
                true
            }
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(slot, r)| (r.uid.clone(), slot))
            .collect();
    }

    fn mappings_of(&self, source: &Source) -> Option<&[Mapping]> {
        self.sources
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, m)| m.as_slice())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementStore for InMemoryStore {
    fn create_source(&mut self, name: &str, version: &str) -> Result<Source, LabelSyncError> {
        if !self.available {
            return Err(LabelSyncError::Registration {
                name: name.to_string(),
                version: version.to_string(),
                message: "measurement store is not initialized".to_string(),
            });
        }
        if name.is_empty() || version.is_empty() {
            return Err(LabelSyncError::Registration {
                name: name.to_string(),
                version: version.to_string(),
                message: "source name and version must be non-empty".to_string(),
            });
        }

        let source = Source::new(name, version);
        if !self.sources.iter().any(|(s, _)| *s == source) {
            self.sources.push((source.clone(), Vec::new()));
        }
        Ok(source)
    }

    fn get_source(&self, name: &str, version: &str) -> Option<Source> {
        self.sources
            .iter()
            .map(|(s, _)| s)
            .find(|s| s.name == name && s.version == version)
            .cloned()
    }

    fn add_mapping(&mut self, source: &Source, mapping: Mapping) -> Result<(), LabelSyncError> {
        let (_, mappings) = self
            .sources
            .iter_mut()
            .find(|(s, _)| s == source)
            .ok_or_else(|| LabelSyncError::Registration {
                name: source.name.clone(),
                version: source.version.clone(),
                message: "source was never created".to_string(),
            })?;

        match mappings
            .iter_mut()
            .find(|m| m.annotation_type == mapping.annotation_type)
        {
            Some(existing) => *existing = mapping,
            None => mappings.push(mapping),
        }
        Ok(())
    }

    fn get_source_mappings(&self, name: &str, version: &str) -> Vec<Mapping> {
        self.mappings_of(&Source::new(name, version))
            .map(<[Mapping]>::to_vec)
            .unwrap_or_default()
    }

    fn add_raw_measurement(
        &mut self,
        source: &Source,
        annotation_type: Option<&str>,
        payload: &ToolAnnotation,
    ) -> Result<RecordUid, LabelSyncError> {
        let mappings = self.mappings_of(source).unwrap_or_default();

        let mapping = match annotation_type {
            Some(tag) => mappings.iter().find(|m| m.annotation_type == tag).ok_or_else(|| {
                LabelSyncError::MappingNotFound {
                    source_name: source.name.clone(),
                    source_version: source.version.clone(),
                    annotation_type: tag.to_string(),
                }
            })?,
            None => mappings.iter().find(|m| m.matches(payload)).ok_or_else(|| {
                LabelSyncError::NoMatchingMapping {
                    source_name: source.name.clone(),
                    source_version: source.version.clone(),
                }
            })?,
        };

        let record = (mapping.to_measurement)(payload)?;
        let uid = record.uid.clone();

        if self.insert_silently(record.clone()) {
            self.events.publish(&StoreEvent::Added(record.clone()));
            self.events.publish(&StoreEvent::RawAdded(record));
        } else {
            self.events.publish(&StoreEvent::Updated(record));
        }
        Ok(uid)
    }

    fn get_measurement(&self, uid: &RecordUid) -> Option<&LabelRecord> {
        self.index.get(uid).map(|&slot| &self.records[slot])
    }

    fn get_measurements(&self) -> Vec<&LabelRecord> {
        self.records.iter().collect()
    }

    fn update(&mut self, uid: &RecordUid, mut record: LabelRecord) -> Result<(), LabelSyncError> {
        let slot = *self
            .index
            .get(uid)
            .ok_or_else(|| LabelSyncError::RecordNotFound(uid.clone()))?;

        record.uid = uid.clone();
        self.records[slot] = record.clone();
        self.events.publish(&StoreEvent::Updated(record));
        Ok(())
    }

    fn remove(&mut self, uid: &RecordUid) -> Option<LabelRecord> {
        let slot = self.index.remove(uid)?;
        let record = self.records.remove(slot);
        self.reindex();
        self.events.publish(&StoreEvent::Removed(record.clone()));
        Some(record)
    }

    fn clear_measurements(&mut self) {
        let removed = std::mem::take(&mut self.records);
        self.index.clear();
        self.events.publish(&StoreEvent::Cleared { removed });
    }

    fn subscribe(&mut self, kind: StoreEventKind, handler: StoreHandler) -> SubscriptionId {
        self.events.subscribe(kind, handler)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }
}
