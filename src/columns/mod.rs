//! Column model consumed by row rendering.
//!
//! This module handles:
//! - Column configs (serde) resolved into columns through a [`ColumnTypeRegistry`]
//! - A tree of columns where only visible leaves render cells
//! - Region assignment (locked vs normal sub-grid)

mod formatter;
mod registry;

pub use formatter::{
    value_to_text, CellContent, CellContext, CellFormatter, CellOutput, Formatter, MarkupNode,
    WidgetHandle,
};
pub use registry::{ColumnFactory, ColumnTypeRegistry};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GridError, Result};
use crate::types::Record;

/// Default column width in pixels
pub const DEFAULT_COLUMN_WIDTH: f64 = 100.0;

/// A vertical slice of the grid, horizontally scrolled on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Locked,
    #[default]
    Normal,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::Locked, Region::Normal];
}

/// Declarative column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnConfig {
    /// Registered column type, `column` when absent
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// Explicit id; falls back to `field`, then to a positional id
    pub id: Option<String>,
    pub field: Option<String>,
    pub text: String,
    pub width: f64,
    pub hidden: bool,
    pub region: Region,
    /// Shorthand for `region: "locked"`
    pub locked: bool,
    /// Fraction digits for number columns
    pub decimals: Option<u32>,
    /// Widget kind for widget columns
    pub widget: Option<String>,
    pub children: Vec<ColumnConfig>,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            type_name: None,
            id: None,
            field: None,
            text: String::new(),
            width: DEFAULT_COLUMN_WIDTH,
            hidden: false,
            region: Region::Normal,
            locked: false,
            decimals: None,
            widget: None,
            children: Vec::new(),
        }
    }
}

impl ColumnConfig {
    /// Plain text column bound to `field`.
    pub fn field(field: &str) -> Self {
        Self {
            field: Some(field.to_string()),
            text: field.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn of_type(mut self, type_name: &str) -> Self {
        self.type_name = Some(type_name.to_string());
        self
    }

    #[must_use]
    pub fn in_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }
}

/// A resolved column.
#[derive(Debug, Clone)]
pub struct Column {
    pub id: String,
    pub field: Option<String>,
    pub text: String,
    pub type_name: String,
    pub width: f64,
    pub hidden: bool,
    pub region: Region,
    pub children: Vec<Column>,
    pub formatter: Formatter,
}

impl Column {
    /// Raw value of this column's field in `record`.
    pub fn raw_value<'r>(&self, record: &'r Record) -> Option<&'r Value> {
        self.field.as_deref().and_then(|f| record.get(f))
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Replace the formatter, e.g. with a caller-supplied closure.
    #[must_use]
    pub fn with_formatter(mut self, formatter: impl CellFormatter + 'static) -> Self {
        self.formatter = Formatter::new(formatter);
        self
    }
}

/// Ordered tree of columns with a cached list of visible leaves.
#[derive(Debug, Clone, Default)]
pub struct ColumnStore {
    roots: Vec<Column>,
    /// Paths (child indices from the roots) of visible leaves, locked region first
    visible: Vec<Vec<usize>>,
    /// Bumped whenever the visible set or widths change
    generation: u64,
}

impl ColumnStore {
    /// Build from already-resolved columns.
    pub fn new(roots: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        check_unique(&roots, &mut seen)?;
        let mut store = Self {
            roots,
            visible: Vec::new(),
            generation: 0,
        };
        store.rebuild_visible();
        Ok(store)
    }

    /// Resolve configs against a type registry.
    pub fn from_configs(configs: &[ColumnConfig], registry: &ColumnTypeRegistry) -> Result<Self> {
        let mut counter = 0usize;
        let roots = configs
            .iter()
            .map(|c| registry.create(c, None, &mut counter))
            .collect::<Result<Vec<_>>>()?;
        Self::new(roots)
    }

    fn rebuild_visible(&mut self) {
        let mut leaves: Vec<(Region, Vec<usize>)> = Vec::new();
        let mut path = Vec::new();
        collect_leaves(&self.roots, &mut path, &mut leaves);
        // Stable sort keeps tree order within a region.
        leaves.sort_by_key(|(region, _)| *region);
        self.visible = leaves.into_iter().map(|(_, p)| p).collect();
        self.generation += 1;
    }

    fn column_at_path(&self, path: &[usize]) -> Option<&Column> {
        let (first, rest) = path.split_first()?;
        let mut col = self.roots.get(*first)?;
        for idx in rest {
            col = col.children.get(*idx)?;
        }
        Some(col)
    }

    fn find_path(&self, id: &str) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        find_path_in(&self.roots, id, &mut path).then_some(path)
    }

    fn column_mut(&mut self, id: &str) -> Option<&mut Column> {
        let path = self.find_path(id)?;
        let (first, rest) = path.split_first()?;
        let mut col = self.roots.get_mut(*first)?;
        for idx in rest {
            col = col.children.get_mut(*idx)?;
        }
        Some(col)
    }

    /// Top-level columns.
    pub fn roots(&self) -> &[Column] {
        &self.roots
    }

    /// Any column (leaf or group) by id.
    pub fn get(&self, id: &str) -> Option<&Column> {
        let path = self.find_path(id)?;
        self.column_at_path(&path)
    }

    /// Visible leaf columns in render order.
    pub fn visible_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.visible.iter().filter_map(|p| self.column_at_path(p))
    }

    /// Visible leaf columns of one region.
    pub fn visible_in_region(&self, region: Region) -> impl Iterator<Item = &Column> + '_ {
        self.visible_columns().filter(move |c| c.region == region)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn visible_at(&self, index: usize) -> Option<&Column> {
        self.visible.get(index).and_then(|p| self.column_at_path(p))
    }

    pub fn visible_index_of(&self, id: &str) -> Option<usize> {
        self.visible_columns().position(|c| c.id == id)
    }

    /// Regions that currently contain at least one visible column.
    pub fn regions(&self) -> Vec<Region> {
        Region::ALL
            .into_iter()
            .filter(|r| self.visible_in_region(*r).next().is_some())
            .collect()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Hide or show a column. Returns `false` for unknown ids or no-op changes.
    pub fn set_hidden(&mut self, id: &str, hidden: bool) -> bool {
        let Some(col) = self.column_mut(id) else {
            return false;
        };
        if col.hidden == hidden {
            return false;
        }
        col.hidden = hidden;
        self.rebuild_visible();
        true
    }

    /// Resize a column. Returns `false` for unknown ids.
    pub fn set_width(&mut self, id: &str, width: f64) -> bool {
        let Some(col) = self.column_mut(id) else {
            return false;
        };
        col.width = width.max(0.0);
        self.generation += 1;
        true
    }

    /// Every column, groups included, in depth-first tree order.
    pub fn all_columns(&self) -> Vec<&Column> {
        let mut out = Vec::new();
        collect_all(&self.roots, &mut out);
        out
    }

    /// Ids of all hidden columns, for state persistence.
    pub fn hidden_ids(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_hidden(&self.roots, &mut out);
        out
    }
}

fn check_unique<'a>(cols: &'a [Column], seen: &mut HashSet<&'a str>) -> Result<()> {
    for col in cols {
        if !seen.insert(col.id.as_str()) {
            return Err(GridError::DuplicateColumn(col.id.clone()));
        }
        check_unique(&col.children, seen)?;
    }
    Ok(())
}

fn collect_leaves(cols: &[Column], path: &mut Vec<usize>, out: &mut Vec<(Region, Vec<usize>)>) {
    for (i, col) in cols.iter().enumerate() {
        if col.hidden {
            continue;
        }
        path.push(i);
        if col.is_leaf() {
            out.push((col.region, path.clone()));
        } else {
            collect_leaves(&col.children, path, out);
        }
        path.pop();
    }
}

fn find_path_in(cols: &[Column], id: &str, path: &mut Vec<usize>) -> bool {
    for (i, col) in cols.iter().enumerate() {
        path.push(i);
        if col.id == id || find_path_in(&col.children, id, path) {
            return true;
        }
        path.pop();
    }
    false
}

fn collect_all<'a>(cols: &'a [Column], out: &mut Vec<&'a Column>) {
    for col in cols {
        out.push(col);
        collect_all(&col.children, out);
    }
}

fn collect_hidden(cols: &[Column], out: &mut Vec<String>) {
    for col in cols {
        if col.hidden {
            out.push(col.id.clone());
        }
        collect_hidden(&col.children, out);
    }
}
