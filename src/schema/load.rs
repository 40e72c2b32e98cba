//! Loading the label config document from YAML or JSON.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{Config, FieldKind, LabelField, PanelConfig, PanelScope, TableOptions};
use crate::error::LabelSyncError;

// ============================================================================
// Document schema (internal to this module)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigDoc {
    panels: Vec<PanelDoc>,
    #[serde(default)]
    table: Option<TableDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PanelDoc {
    name: String,
    #[serde(default)]
    scope: ScopeDoc,
    #[serde(default)]
    fields: Vec<FieldDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScopeDoc {
    #[default]
    Case,
    Roi,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDoc {
    key: String,
    kind: KindDoc,
    #[serde(default)]
    options: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindDoc {
    Categorical,
    Date,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableDoc {
    #[serde(default)]
    identity_column: Option<String>,
    #[serde(default)]
    metadata_columns: Option<Vec<String>>,
}

// ============================================================================
// Public API
// ============================================================================

/// Loads and validates a config document.
///
/// Files ending in `.json` are parsed as JSON; everything else as YAML.
///
/// # Errors
/// Returns [`LabelSyncError::ConfigParse`] if the document cannot be parsed
/// and [`LabelSyncError::Config`] if it describes an invalid schema.
pub fn load_config(path: &Path) -> Result<Config, LabelSyncError> {
    let text = fs::read_to_string(path).map_err(LabelSyncError::Io)?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let doc: ConfigDoc = if is_json {
        serde_json::from_str(&text).map_err(|e| parse_error(path, e.to_string()))?
    } else {
        serde_yaml::from_str(&text).map_err(|e| parse_error(path, e.to_string()))?
    };

    let config = doc_to_config(doc)?;
    tracing::debug!(
        path = %path.display(),
        panels = config.panels().len(),
        "loaded label config"
    );
    Ok(config)
}

/// Parses a config from a YAML string.
pub fn from_yaml_str(yaml: &str) -> Result<Config, LabelSyncError> {
    let doc: ConfigDoc =
        serde_yaml::from_str(yaml).map_err(|e| parse_error(Path::new("<string>"), e.to_string()))?;
    doc_to_config(doc)
}

/// Parses a config from a JSON string.
pub fn from_json_str(json: &str) -> Result<Config, LabelSyncError> {
    let doc: ConfigDoc =
        serde_json::from_str(json).map_err(|e| parse_error(Path::new("<string>"), e.to_string()))?;
    doc_to_config(doc)
}

// ============================================================================
// Conversion: document -> Config
// ============================================================================

fn doc_to_config(doc: ConfigDoc) -> Result<Config, LabelSyncError> {
    let panels = doc
        .panels
        .into_iter()
        .map(|panel| PanelConfig {
            name: panel.name,
            scope: match panel.scope {
                ScopeDoc::Case => PanelScope::Case,
                ScopeDoc::Roi => PanelScope::Roi,
            },
            fields: panel
                .fields
                .into_iter()
                .map(|field| LabelField {
                    key: field.key,
                    kind: match field.kind {
                        KindDoc::Categorical => FieldKind::Categorical {
                            options: field.options,
                        },
                        KindDoc::Date => FieldKind::Date,
                    },
                })
                .collect(),
        })
        .collect();

    let mut table = TableOptions::default();
    if let Some(doc) = doc.table {
        if let Some(identity_column) = doc.identity_column {
            table.identity_column = identity_column;
        }
        if let Some(metadata_columns) = doc.metadata_columns {
            table.metadata_columns = metadata_columns;
        }
    }

    Config::new(panels, table)
}

fn parse_error(path: &Path, message: String) -> LabelSyncError {
    LabelSyncError::ConfigParse {
        path: path.to_path_buf(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_YAML: &str = "\
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
      - key: finding
        kind: categorical
        options: [mass, cyst]
table:
  identity_column: Case
";

    #[test]
    fn test_yaml_document() {
        let config = from_yaml_str(SAMPLE_YAML).expect("parse failed");
        assert_eq!(config.panels().len(), 2);
        assert_eq!(config.panels()[1].scope, PanelScope::Roi);
        assert_eq!(config.table().identity_column, "Case");
        // metadata columns fall back to the defaults
        assert!(config.table().is_metadata("AnnotationType"));
    }

    #[test]
    fn test_json_document() {
        let json = r#"{
            "panels": [
                {"name": "p", "fields": [{"key": "d", "kind": "date"}]}
            ]
        }"#;
        let config = from_json_str(json).expect("parse failed");
        assert_eq!(config.fields_of("p")[0].kind, FieldKind::Date);
        assert_eq!(config.table(), &TableOptions::default());
    }

    #[test]
    fn test_unknown_kind_is_parse_error() {
        let yaml = "panels:\n  - name: p\n    fields:\n      - key: k\n        kind: number\n";
        let err = from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, LabelSyncError::ConfigParse { .. }));
    }

    #[test]
    fn test_categorical_without_options_is_config_error() {
        let yaml = "panels:\n  - name: p\n    fields:\n      - key: k\n        kind: categorical\n";
        let err = from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, LabelSyncError::Config { .. }));
    }

    #[test]
    fn test_load_from_file_by_extension() {
        let dir = std::env::temp_dir().join(format!("labelsync-cfg-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let yaml_path = dir.join("labels.yaml");
        fs::write(&yaml_path, SAMPLE_YAML).unwrap();
        assert_eq!(load_config(&yaml_path).unwrap().panels().len(), 2);

        let json_path = dir.join("labels.json");
        fs::write(&json_path, r#"{"panels": []}"#).unwrap();
        assert!(load_config(&json_path).unwrap().panels().is_empty());

        fs::remove_dir_all(&dir).ok();
    }
}
