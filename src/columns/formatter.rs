//! Cell formatter capability.
//!
//! A formatter maps `(record, column, context)` to a tagged [`CellContent`]
//! plus an optional minimum height request. Rows compare content for equality
//! before writing, so formatters must be deterministic for a given input.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Column, Region};
use crate::types::Record;

/// A small element tree produced by markup-returning formatters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupNode {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MarkupNode>,
}

impl MarkupNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    #[must_use]
    pub fn child(mut self, node: MarkupNode) -> Self {
        self.children.push(node);
        self
    }
}

/// Opaque reference to a host widget embedded in a cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WidgetHandle {
    /// Widget type understood by the host
    pub kind: String,
    /// Stable key so the host can reuse the widget instance
    pub key: String,
}

/// What a formatter asks a cell to display.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum CellContent {
    #[default]
    Empty,
    Text(String),
    Markup(MarkupNode),
    Widget(WidgetHandle),
}

impl CellContent {
    /// Plain-text view of the content, used by tests and the CLI.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellContent::Text(s) => Some(s),
            CellContent::Markup(node) => node.text.as_deref(),
            _ => None,
        }
    }
}

/// Formatter output: content plus the side-channel height request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellOutput {
    pub content: CellContent,
    /// Minimum row height this cell needs
    pub height: Option<f64>,
}

impl CellOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: CellContent::Text(text.into()),
            height: None,
        }
    }

    #[must_use]
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }
}

impl From<CellContent> for CellOutput {
    fn from(content: CellContent) -> Self {
        Self {
            content,
            height: None,
        }
    }
}

/// Everything a formatter may look at.
pub struct CellContext<'a> {
    pub record: &'a Record,
    pub column: &'a Column,
    /// Raw field value, if the record has it
    pub value: Option<&'a Value>,
    /// Index of the record in the store's visible sequence
    pub data_index: usize,
    pub region: Region,
}

/// Maps a cell context to content.
pub trait CellFormatter: Send + Sync {
    fn format(&self, ctx: &CellContext<'_>) -> CellOutput;
}

impl<F> CellFormatter for F
where
    F: Fn(&CellContext<'_>) -> CellOutput + Send + Sync,
{
    fn format(&self, ctx: &CellContext<'_>) -> CellOutput {
        self(ctx)
    }
}

/// Shared, cloneable formatter handle stored on columns.
#[derive(Clone)]
pub struct Formatter(Arc<dyn CellFormatter>);

impl Formatter {
    pub fn new(formatter: impl CellFormatter + 'static) -> Self {
        Self(Arc::new(formatter))
    }

    pub fn format(&self, ctx: &CellContext<'_>) -> CellOutput {
        self.0.format(ctx)
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Formatter(..)")
    }
}

/// Display string for a raw JSON value.
pub fn value_to_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
