use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrintOptions {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub letterhead: Option<String>,
    #[serde(default)]
    pub no_letterhead: bool,
    #[serde(default)]
    pub pdf_options: Option<Value>,
    /// Filled from the document's `address` before rendering.
    #[serde(default, skip_deserializing)]
    pub address_display: Option<String>,
}

/// Documents to print: a list of names of one doctype, or names grouped by
/// doctype under a caller-chosen output name. Groups print in the order the
/// caller sent them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PrintSelection {
    Grouped {
        documents: IndexMap<String, Vec<String>>,
        name: String,
    },
    Single {
        doctype: String,
        names: Vec<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultiPdfRequest {
    #[serde(flatten)]
    pub selection: PrintSelection,
    #[serde(flatten)]
    pub options: PrintOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfRequest {
    pub doctype: String,
    pub name: String,
    #[serde(flatten)]
    pub options: PrintOptions,
}
