//! Grid composition.
//!
//! A [`Grid`] owns the store, the column model, the row manager and the
//! scroller, and forwards every data or column change to the row manager so
//! the rendered window stays consistent. Selection, navigation, persistence
//! and sub-grid layout are exposed through the capability traits in
//! [`capabilities`], implemented here by delegation.

mod capabilities;
mod scroll;

pub use capabilities::{GridState, Navigation, SelectionConfig, StatePersistence, SubGridLayout};
pub use scroll::Debouncer;

use serde::Serialize;
use serde_json::Value;

use crate::columns::{CellContent, ColumnStore, ColumnTypeRegistry, Region};
use crate::error::{GridError, Result};
use crate::layout::{ColumnLayout, Scroller};
use crate::location::{Location, LocationContext};
use crate::row_manager::{RenderContext, RowManager, RowManagerEvent};
use crate::store::{ArrayStore, Store, StoreChange};
use crate::types::{GridConfig, Record, RecordId, SelectionMode};

/// A virtualized grid over an in-memory store.
#[derive(Debug)]
pub struct Grid {
    config: GridConfig,
    store: ArrayStore,
    columns: ColumnStore,
    layout: ColumnLayout,
    rows: RowManager,
    scroller: Scroller,
    selection: SelectionMode,
    focused: Option<Location>,
    /// Pending viewport size from buffered resizes
    resize: Debouncer<(f64, f64)>,
    /// Fires once scrolling has been idle for the settle delay
    scroll_settle: Debouncer<()>,
}

/// Serializable view of the rendered window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub scroll_top: f64,
    pub total_height: f64,
    pub top_index: usize,
    pub row_count: usize,
    pub rows: Vec<RowSnapshot>,
}

/// Serializable view of one rendered row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowSnapshot {
    pub slot_id: usize,
    pub data_index: Option<usize>,
    pub id: Option<RecordId>,
    pub top: f64,
    pub height: f64,
    pub cells: Vec<CellSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellSnapshot {
    pub column_id: String,
    pub region: Region,
    pub content: CellContent,
}

impl Grid {
    /// Build a grid and render its first window.
    pub fn new(config: GridConfig, registry: &ColumnTypeRegistry, records: Vec<Record>) -> Result<Self> {
        config.rows.validate()?;
        if !(config.settle_delay_ms.is_finite() && config.settle_delay_ms >= 0.0) {
            return Err(GridError::Config(format!(
                "settleDelayMs must be non-negative, got {}",
                config.settle_delay_ms
            )));
        }
        let columns = ColumnStore::from_configs(&config.columns, registry)?;
        let mut selection = config.selection_mode.clone();
        selection.normalize();
        let mut grid = Self {
            store: ArrayStore::new(records),
            layout: ColumnLayout::new(&columns),
            columns,
            rows: RowManager::new(config.rows.clone())?,
            scroller: Scroller::new(config.view_width, config.view_height),
            selection,
            focused: None,
            resize: Debouncer::new(config.settle_delay_ms),
            scroll_settle: Debouncer::new(config.settle_delay_ms),
            config,
        };
        let ctx = RenderContext::new(&grid.store, &grid.columns);
        grid.rows.set_view_height(ctx, grid.scroller.client_height);
        grid.sync();
        tracing::debug!(
            records = grid.store.count(),
            columns = grid.columns.visible_count(),
            row_count = grid.rows.row_count(),
            "grid created"
        );
        Ok(grid)
    }

    /// Parse a JSON config and build an empty grid with the default column types.
    pub fn from_json(json: &str) -> Result<Self> {
        let config = GridConfig::from_json(json)?;
        Self::new(config, &ColumnTypeRegistry::with_defaults(), Vec::new())
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn store(&self) -> &ArrayStore {
        &self.store
    }

    pub fn columns(&self) -> &ColumnStore {
        &self.columns
    }

    pub fn column_layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn row_manager(&self) -> &RowManager {
        &self.rows
    }

    pub fn scroller(&self) -> &Scroller {
        &self.scroller
    }

    pub(crate) fn location_context(&self) -> LocationContext<'_> {
        LocationContext {
            store: &self.store,
            columns: &self.columns,
            view_height: self.scroller.client_height,
            row_height: self.rows.config().row_offset_height(),
        }
    }

    /// Apply pending row manager notifications to the scroller and return them.
    pub(crate) fn sync(&mut self) -> Vec<RowManagerEvent> {
        let events = self.rows.take_events();
        for event in &events {
            match event {
                RowManagerEvent::TotalHeightChanged { height } => {
                    self.scroller.set_scroll_height(*height);
                }
                RowManagerEvent::ScrollCorrected { scroll_top, .. } => {
                    self.scroller.set_y(*scroll_top);
                }
                _ => {}
            }
        }
        events
    }

    // ========================================================================
    // Data operations
    // ========================================================================

    fn apply_change(&mut self, change: &StoreChange) -> Vec<RowManagerEvent> {
        let ctx = RenderContext::new(&self.store, &self.columns);
        self.rows.on_store_change(ctx, change);
        if matches!(change, StoreChange::Dataset) {
            self.focused = None;
        }
        self.sync()
    }

    /// Replace all records.
    pub fn load(&mut self, records: Vec<Record>) -> Vec<RowManagerEvent> {
        let change = self.store.load(records);
        self.apply_change(&change)
    }

    /// Append records.
    pub fn add(&mut self, records: Vec<Record>) -> Vec<RowManagerEvent> {
        let change = self.store.add(records);
        self.apply_change(&change)
    }

    /// Insert records before visible index `index`.
    pub fn insert(&mut self, index: usize, records: Vec<Record>) -> Vec<RowManagerEvent> {
        let change = self.store.insert(index, records);
        self.apply_change(&change)
    }

    pub fn remove(&mut self, ids: &[RecordId]) -> Vec<RowManagerEvent> {
        let change = self.store.remove(ids);
        self.apply_change(&change)
    }

    /// Set one field of a record. Unknown ids are ignored.
    pub fn update(&mut self, id: &RecordId, field: &str, value: Value) -> Vec<RowManagerEvent> {
        match self.store.update(id, field, value) {
            Some(change) => self.apply_change(&change),
            None => Vec::new(),
        }
    }

    pub fn set_record_height(&mut self, id: &RecordId, height: Option<f64>) -> Vec<RowManagerEvent> {
        match self.store.set_row_height(id, height) {
            Some(change) => self.apply_change(&change),
            None => Vec::new(),
        }
    }

    pub fn move_record(&mut self, from: usize, to: usize) -> Vec<RowManagerEvent> {
        match self.store.move_record(from, to) {
            Some(change) => self.apply_change(&change),
            None => Vec::new(),
        }
    }

    pub fn filter_by(
        &mut self,
        filter: impl Fn(&Record) -> bool + Send + Sync + 'static,
    ) -> Vec<RowManagerEvent> {
        let change = self.store.filter_by(filter);
        self.apply_change(&change)
    }

    pub fn clear_filter(&mut self) -> Vec<RowManagerEvent> {
        let change = self.store.clear_filter();
        self.apply_change(&change)
    }

    pub fn sort_by(&mut self, field: &str, ascending: bool) -> Vec<RowManagerEvent> {
        let change = self.store.sort_by(field, ascending);
        self.apply_change(&change)
    }

    pub fn group_by(&mut self, field: &str) -> Vec<RowManagerEvent> {
        let change = self.store.group_by(field);
        self.apply_change(&change)
    }

    pub fn clear_group(&mut self) -> Vec<RowManagerEvent> {
        let change = self.store.clear_group();
        self.apply_change(&change)
    }

    // ========================================================================
    // Column operations
    // ========================================================================

    fn columns_changed(&mut self) -> Vec<RowManagerEvent> {
        self.layout = ColumnLayout::new(&self.columns);
        for region in Region::ALL {
            let x = self.scroller.x(region);
            let content = self.layout.region_width(region);
            self.scroller.set_x(region, x, content, self.region_viewport_width(region));
        }
        let ctx = RenderContext::new(&self.store, &self.columns);
        self.rows.refresh(ctx);
        self.sync()
    }

    pub fn set_column_hidden(&mut self, id: &str, hidden: bool) -> Vec<RowManagerEvent> {
        if !self.columns.set_hidden(id, hidden) {
            return Vec::new();
        }
        self.columns_changed()
    }

    pub fn set_column_width(&mut self, id: &str, width: f64) -> Vec<RowManagerEvent> {
        if !self.columns.set_width(id, width) {
            return Vec::new();
        }
        self.columns_changed()
    }

    /// Width available to a region: the locked region is as wide as its
    /// content, the normal region takes what is left of the viewport.
    fn region_viewport_width(&self, region: Region) -> f64 {
        match region {
            Region::Locked => self.layout.region_width(Region::Locked),
            Region::Normal => {
                (self.scroller.client_width - self.layout.region_width(Region::Locked)).max(0.0)
            }
        }
    }

    /// Snapshot of the rendered rows.
    pub fn snapshot(&self) -> WindowSnapshot {
        let rows = self
            .rows
            .rows()
            .iter()
            .map(|row| RowSnapshot {
                slot_id: row.slot_id(),
                data_index: row.data_index(),
                id: row.id().cloned(),
                top: row.top(),
                height: row.height(),
                cells: row
                    .regions()
                    .iter()
                    .flat_map(|rc| {
                        rc.cells.iter().map(move |cell| CellSnapshot {
                            column_id: cell.column_id.clone(),
                            region: rc.region,
                            content: cell.content.clone(),
                        })
                    })
                    .collect(),
            })
            .collect();
        WindowSnapshot {
            scroll_top: self.scroller.y,
            total_height: self.rows.total_height(),
            top_index: self.rows.top_index(),
            row_count: self.rows.row_count(),
            rows,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::columns::ColumnConfig;

    fn grid(count: usize) -> Grid {
        let config = GridConfig {
            columns: vec![
                ColumnConfig::field("id").in_region(Region::Locked).with_width(60.0),
                ColumnConfig::field("name").with_width(200.0),
            ],
            view_height: 300.0,
            ..GridConfig::default()
        };
        let records = (0..count)
            .map(|i| Record::new(i64::try_from(i).unwrap()).with("id", i).with("name", format!("n{i}")))
            .collect();
        Grid::new(config, &ColumnTypeRegistry::with_defaults(), records).unwrap()
    }

    #[test]
    fn test_new_renders_first_window() {
        let grid = grid(1000);
        assert_eq!(grid.row_manager().rows().len(), 20);
        assert_eq!(grid.scroller().scroll_height(), 30_000.0);
        let snapshot = grid.snapshot();
        assert_eq!(snapshot.rows[0].cells.len(), 2);
        assert_eq!(snapshot.rows[0].cells[0].region, Region::Locked);
    }

    #[test]
    fn test_data_changes_flow_to_rows() {
        let mut grid = grid(10);
        grid.add(vec![Record::new(100).with("name", "late")]);
        assert_eq!(grid.row_manager().rows().len(), 11);
        assert_eq!(grid.scroller().scroll_height(), 330.0);
        grid.update(&RecordId::Int(100), "name", Value::from("later"));
        let row = grid.row_manager().row_for_record(&RecordId::Int(100)).unwrap();
        assert_eq!(row.cell("name").unwrap().content.as_text(), Some("later"));
    }

    #[test]
    fn test_hiding_column_rebuilds_cells() {
        let mut grid = grid(10);
        grid.set_column_hidden("id", true);
        let row = grid.row_manager().row(0).unwrap();
        assert!(row.cells(Region::Locked).is_empty());
        assert_eq!(grid.column_layout().region_width(Region::Locked), 0.0);
        assert!(grid.set_column_hidden("missing", true).is_empty());
    }
}
