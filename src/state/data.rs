/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the catalog layer and the UI layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Placeholder shown for absent fields
pub const PLACEHOLDER: &str = "-";

/// Represents a single catalog entry
///
/// Only `brand` and `model` are guaranteed. Everything else (prices such as
/// `dp`, `mrp`, `rp`, `rp1`) varies per record and lives in `fields`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Record {
    pub brand: String,
    pub model: String,
    /// Product type (e.g. "RADIAL", "TUBELESS")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Remaining fields, keyed by name
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(brand: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            kind: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_type(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Internal/system fields (`_id`, `__v`, ...) are never displayed.
    pub fn is_internal_field(key: &str) -> bool {
        key.starts_with('_')
    }

    /// Render the value of column `key` for the table view
    pub fn display(&self, key: &str) -> String {
        match key {
            "brand" => self.brand.clone(),
            "model" => self.model.clone(),
            "type" => self
                .kind
                .clone()
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            _ => match self.fields.get(key) {
                None | Some(Value::Null) => PLACEHOLDER.to_string(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            },
        }
    }

    /// One-line summary copied to the clipboard
    pub fn clipboard_line(&self) -> String {
        format!(
            "{} - {} - DP:{} - MRP:{}",
            self.brand,
            self.model,
            self.display("dp"),
            self.display("mrp")
        )
    }
}

/// Distinct dropdown values, in first-seen catalog order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facets {
    pub brands: Vec<String>,
    pub types: Vec<String>,
}

/// Result of a folder import operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportResult {
    pub imported_count: usize,
    pub skipped_count: usize,
    pub failed_files: usize,
}
