//! Label schema model.
//!
//! A [`Config`] is an ordered list of [`PanelConfig`]s, each declaring the
//! label fields shown in one panel. It is loaded once at startup (see
//! [`load_config`]) and passed by reference to every component; nothing in
//! the crate mutates it afterwards.
//!
//! # Example
//!
//! ```
//! use labelsync::schema::{from_yaml_str, default_value};
//!
//! let config = from_yaml_str(
//!     "panels:\n  - name: case table\n    fields:\n      - key: status\n        kind: categorical\n        options: [open, closed]\n      - key: reviewedOn\n        kind: date\n",
//! )?;
//! let fields = config.fields_of("case table");
//! assert_eq!(default_value(&fields[0]), "open");
//! assert_eq!(default_value(&fields[1]), "19700101");
//! # Ok::<(), labelsync::LabelSyncError>(())
//! ```

mod load;

pub use load::{from_json_str, from_yaml_str, load_config};

use serde::Serialize;

use crate::error::LabelSyncError;
use crate::model::ToolType;
use crate::table::{ANNOTATION_TYPE_COLUMN, FRAME_OF_REFERENCE_COLUMN, POINTS_COLUMN};

/// Table columns written by export regardless of configured metadata.
const RESERVED_COLUMNS: [&str; 3] =
    [ANNOTATION_TYPE_COLUMN, FRAME_OF_REFERENCE_COLUMN, POINTS_COLUMN];

/// Value a date field holds until someone sets it.
pub const DATE_UNSET: &str = "19700101";

/// Default name of the column holding the case identity in tables.
pub const DEFAULT_IDENTITY_COLUMN: &str = "StudyInstanceUID";

/// Columns that never become label values on import.
pub const DEFAULT_METADATA_COLUMNS: &[&str] = &[
    "AnnotationType",
    "Patient ID",
    "Patient Name",
    "StudyInstanceUID",
    "Lesion ID",
    "FrameOfReferenceUID",
    "points",
];

/// The kind of value a label field holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    /// One of a fixed list of options; the first is the default.
    Categorical { options: Vec<String> },
    /// An 8-digit `YYYYMMDD` date string.
    Date,
}

/// A single label field of a panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LabelField {
    pub key: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl LabelField {
    pub fn categorical<I, S>(key: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            kind: FieldKind::Categorical {
                options: options.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn date(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: FieldKind::Date,
        }
    }

    /// The value a freshly seeded record holds for this field.
    pub fn default_value(&self) -> &str {
        match &self.kind {
            FieldKind::Categorical { options } => {
                options.first().map(String::as_str).unwrap_or_default()
            }
            FieldKind::Date => DATE_UNSET,
        }
    }

    /// Returns true if `value` is a legal value for this field.
    pub fn accepts(&self, value: &str) -> bool {
        match &self.kind {
            FieldKind::Categorical { options } => options.iter().any(|o| o == value),
            FieldKind::Date => value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()),
        }
    }
}

/// Returns the default value of `field`.
pub fn default_value(field: &LabelField) -> &str {
    field.default_value()
}

/// Which records a panel describes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelScope {
    /// Fields of the single per-case label record.
    #[default]
    Case,
    /// Fields of each region-of-interest record.
    Roi,
}

impl PanelScope {
    /// The scope whose fields a record of `tool_type` carries.
    pub fn for_tool_type(tool_type: ToolType) -> Self {
        match tool_type {
            ToolType::CaseLabel => PanelScope::Case,
            ToolType::Roi => PanelScope::Roi,
        }
    }
}

/// One panel of label fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PanelConfig {
    pub name: String,
    pub scope: PanelScope,
    pub fields: Vec<LabelField>,
}

impl PanelConfig {
    pub fn new(name: impl Into<String>, fields: Vec<LabelField>) -> Self {
        Self {
            name: name.into(),
            scope: PanelScope::Case,
            fields,
        }
    }

    pub fn with_scope(mut self, scope: PanelScope) -> Self {
        self.scope = scope;
        self
    }
}

/// Table layout options used by import and export.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableOptions {
    /// Column holding the case identity; rows are collated by it.
    pub identity_column: String,
    /// Columns that are never label values.
    pub metadata_columns: Vec<String>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            identity_column: DEFAULT_IDENTITY_COLUMN.to_string(),
            metadata_columns: DEFAULT_METADATA_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl TableOptions {
    /// Returns true if `column` is the identity column or a metadata column.
    pub fn is_metadata(&self, column: &str) -> bool {
        column == self.identity_column || self.metadata_columns.iter().any(|c| c == column)
    }
}

/// The validated, read-only label schema.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Config {
    panels: Vec<PanelConfig>,
    table: TableOptions,
}

impl Config {
    /// Builds a config, rejecting malformed schemas.
    ///
    /// # Errors
    /// Returns [`LabelSyncError::Config`] if a panel name repeats, a panel
    /// declares a key twice, a key is empty, or a categorical field has no
    /// options.
    pub fn new(panels: Vec<PanelConfig>, table: TableOptions) -> Result<Self, LabelSyncError> {
        let config = Self { panels, table };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), LabelSyncError> {
        let mut panel_names = std::collections::HashSet::new();
        for panel in &self.panels {
            if !panel_names.insert(panel.name.as_str()) {
                return Err(config_error(format!("duplicate panel '{}'", panel.name)));
            }

            let mut keys = std::collections::HashSet::new();
            for field in &panel.fields {
                if field.key.trim().is_empty() {
                    return Err(config_error(format!(
                        "panel '{}' has a field with an empty key",
                        panel.name
                    )));
                }
                if self.table.is_metadata(&field.key)
                    || RESERVED_COLUMNS.contains(&field.key.as_str())
                {
                    return Err(config_error(format!(
                        "field '{}' in panel '{}' collides with a table metadata column",
                        field.key, panel.name
                    )));
                }
                if !keys.insert(field.key.as_str()) {
                    return Err(config_error(format!(
                        "panel '{}' declares field '{}' more than once",
                        panel.name, field.key
                    )));
                }
                if let FieldKind::Categorical { options } = &field.kind {
                    if options.is_empty() {
                        return Err(config_error(format!(
                            "categorical field '{}' in panel '{}' has no options",
                            field.key, panel.name
                        )));
                    }
                    if options.iter().any(|o| o.trim().is_empty()) {
                        return Err(config_error(format!(
                            "categorical field '{}' in panel '{}' has an empty option",
                            field.key, panel.name
                        )));
                    }
                }
            }
        }

        if self.table.identity_column.trim().is_empty() {
            return Err(config_error("table identity column is empty".to_string()));
        }

        Ok(())
    }

    /// All panels, in declaration order.
    pub fn panels(&self) -> &[PanelConfig] {
        &self.panels
    }

    pub fn table(&self) -> &TableOptions {
        &self.table
    }

    pub fn panel(&self, name: &str) -> Option<&PanelConfig> {
        self.panels.iter().find(|p| p.name == name)
    }

    /// Fields of the named panel, in declaration order.
    ///
    /// Unknown panels have no fields.
    pub fn fields_of(&self, panel_name: &str) -> &[LabelField] {
        self.panel(panel_name)
            .map(|p| p.fields.as_slice())
            .unwrap_or_default()
    }

    /// Fields of every panel with the given scope, in declaration order.
    pub fn scope_fields(&self, scope: PanelScope) -> impl Iterator<Item = &LabelField> {
        self.panels
            .iter()
            .filter(move |p| p.scope == scope)
            .flat_map(|p| p.fields.iter())
    }

    /// Looks up the field `key` among panels of `scope`.
    pub fn field(&self, scope: PanelScope, key: &str) -> Option<&LabelField> {
        self.scope_fields(scope).find(|f| f.key == key)
    }

    /// Returns true if `key` is declared by a panel of `scope`.
    pub fn declares(&self, scope: PanelScope, key: &str) -> bool {
        self.field(scope, key).is_some()
    }
}

fn config_error(message: String) -> LabelSyncError {
    LabelSyncError::Config { message }
}
