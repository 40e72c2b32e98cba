//! Fuzz target for CSV table parsing and import.
//!
//! Arbitrary bytes are parsed as a table and, when that succeeds, imported
//! into a fresh store. Neither step may panic.

#![no_main]

use labelsync::registration::register_labeling_source;
use labelsync::schema::{Config, LabelField, PanelConfig, PanelScope, TableOptions};
use labelsync::store::InMemoryStore;
use labelsync::table::{from_table_slice, import_table};
use libfuzzer_sys::fuzz_target;

fn config() -> Option<Config> {
    Config::new(
        vec![
            PanelConfig::new(
                "case table",
                vec![
                    LabelField::categorical("status", ["open", "closed"]),
                    LabelField::date("reviewedOn"),
                ],
            ),
            PanelConfig::new("lesion table", vec![LabelField::categorical("size", ["small", "large"])])
                .with_scope(PanelScope::Roi),
        ],
        TableOptions::default(),
    )
    .ok()
}

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(table) = from_table_slice(data) else {
        return;
    };
    let Some(config) = config() else {
        return;
    };

    let mut store = InMemoryStore::new();
    if let Ok(source) = register_labeling_source(&mut store) {
        let _ = import_table(&mut store, &source, &config, &table);
    }
});
