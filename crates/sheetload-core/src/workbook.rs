//! Engine configuration and the default workbook created after loading.
//!
//! These structures are handed to the engine as-is, so they serialize with
//! camelCase keys matching what the engine's construction API expects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default locale for the engine and the default workbook
pub const DEFAULT_LOCALE: &str = "en-US";

/// Row count of the default sheet
pub const DEFAULT_ROW_COUNT: u32 = 1000;

/// Column count of the default sheet
pub const DEFAULT_COLUMN_COUNT: u32 = 20;

/// Settings passed to the engine constructor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Theme name
    pub theme: String,
    /// Locale tag, e.g. `en-US`
    pub locale: String,
    /// Identifier of the DOM element the engine renders into
    pub container: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            container: "app".to_string(),
        }
    }
}

/// A plugin registered against the engine instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSpec {
    pub name: String,
    /// Plugin options, passed through untouched
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub options: serde_json::Value,
}

impl PluginSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: serde_json::Value::Null,
        }
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }

    /// The fixed plugin list, in registration order
    pub fn default_plugins() -> Vec<PluginSpec> {
        [
            "render-engine",
            "formula-engine",
            "ui",
            "docs",
            "docs-ui",
            "sheets",
            "sheets-ui",
            "sheets-formula",
        ]
        .into_iter()
        .map(PluginSpec::new)
        .collect()
    }
}

/// Kind of content unit the engine creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Sheet,
    Doc,
}

impl UnitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::Sheet => "sheet",
            UnitKind::Doc => "doc",
        }
    }
}

/// A single sheet in the default workbook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetData {
    pub id: String,
    pub name: String,
    pub row_count: u32,
    pub column_count: u32,
    /// Row index -> column index -> raw cell value
    #[serde(default)]
    pub cell_data: BTreeMap<u32, BTreeMap<u32, serde_json::Value>>,
}

impl SheetData {
    /// An empty sheet with the default dimensions
    pub fn empty(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            row_count: DEFAULT_ROW_COUNT,
            column_count: DEFAULT_COLUMN_COUNT,
            cell_data: BTreeMap::new(),
        }
    }
}

/// Workbook snapshot used to create the default unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookData {
    pub id: String,
    pub name: String,
    pub locale: String,
    pub sheet_order: Vec<String>,
    pub sheets: BTreeMap<String, SheetData>,
}

impl WorkbookData {
    /// Look up a sheet by its id
    pub fn sheet(&self, id: &str) -> Option<&SheetData> {
        self.sheets.get(id)
    }

    /// Sheets in display order
    pub fn ordered_sheets(&self) -> impl Iterator<Item = &SheetData> + '_ {
        self.sheet_order.iter().filter_map(|id| self.sheets.get(id))
    }
}

impl Default for WorkbookData {
    fn default() -> Self {
        let sheet = SheetData::empty("sheet-01", "Sheet1");
        let mut sheets = BTreeMap::new();
        let order = vec![sheet.id.clone()];
        sheets.insert(sheet.id.clone(), sheet);

        Self {
            id: "workbook-01".to_string(),
            name: "Untitled".to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            sheet_order: order,
            sheets,
        }
    }
}
