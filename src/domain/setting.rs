// Setting records for Setting Miner.
// One record per field declaration that builds a typed Setting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A configuration setting discovered in the source tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingRecord {
    /// Setting key, the first constructor/factory argument.
    pub name: String,
    /// Java variable the setting is assigned to.
    pub raw_name: String,
    /// Value type, `"Outer of Inner"` for nested generics.
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<String>,
    pub default_value: String,
    pub source_line: u32,
    /// Path relative to the scanned root, `/`-separated.
    pub source_file: String,
}

/// Non-fatal problem found while extracting a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub source_file: String,
    pub source_line: u32,
    pub raw_name: Option<String>,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// The declaration resolved fewer arguments than key, default and properties need.
    InsufficientArguments { found: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subject = self.raw_name.as_deref().unwrap_or("<unnamed>");
        match &self.kind {
            DiagnosticKind::InsufficientArguments { found } => write!(
                f,
                "{}:{}: problem with {}: expected at least 3 arguments, found {}",
                self.source_file, self.source_line, subject, found
            ),
        }
    }
}
