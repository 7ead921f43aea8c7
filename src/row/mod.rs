//! A rendering slot.
//!
//! A [`Row`] owns one set of per-region cells and displays whichever record
//! the row manager binds to it. Rows are recycled while scrolling: binding a
//! different record overwrites identity and content in place.

use serde::Serialize;

use crate::columns::{CellContent, CellContext, ColumnStore, Region};
use crate::types::{Record, RecordId, RowManagerConfig};

/// One rendered cell.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowCell {
    pub column_id: String,
    pub content: CellContent,
    /// Minimum height the formatter asked for on the last render
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_height: Option<f64>,
    /// Number of content writes since the cell was created
    #[serde(skip)]
    writes: usize,
}

impl RowCell {
    fn new(column_id: &str) -> Self {
        Self {
            column_id: column_id.to_string(),
            content: CellContent::Empty,
            requested_height: None,
            writes: 0,
        }
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

/// The cells of one row inside one region.
#[derive(Debug, Clone, Serialize)]
pub struct RegionCells {
    pub region: Region,
    pub cells: Vec<RowCell>,
}

/// Binding state of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RowState {
    /// Never rendered
    Unbound,
    /// Displaying its record's current content
    Bound,
    /// Displaying a record whose content may be out of date
    Stale,
}

/// A rendering slot in the row manager's pool.
#[derive(Debug, Clone)]
pub struct Row {
    /// Identity of the materialized element set; survives rebinding
    slot_id: usize,
    /// Position in the pool
    pub(crate) index: usize,
    data_index: Option<usize>,
    id: Option<RecordId>,
    top: f64,
    height: f64,
    border_height: f64,
    regions: Vec<RegionCells>,
    /// Column store generation the cells were laid out for
    column_generation: Option<u64>,
    special: bool,
    state: RowState,
    render_count: usize,
}

impl Row {
    pub(crate) fn new(slot_id: usize, index: usize, config: &RowManagerConfig) -> Self {
        Self {
            slot_id,
            index,
            data_index: None,
            id: None,
            top: 0.0,
            height: config.row_height,
            border_height: config.border_height,
            regions: Vec::new(),
            column_generation: None,
            special: false,
            state: RowState::Unbound,
            render_count: 0,
        }
    }

    pub fn slot_id(&self) -> usize {
        self.slot_id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn data_index(&self) -> Option<usize> {
        self.data_index
    }

    pub fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    /// Content height, excluding the border.
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn offset_height(&self) -> f64 {
        self.height + self.border_height
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.offset_height()
    }

    pub fn state(&self) -> RowState {
        self.state
    }

    /// Displaying a group header or other synthesized record.
    pub fn is_special(&self) -> bool {
        self.special
    }

    pub fn render_count(&self) -> usize {
        self.render_count
    }

    pub fn regions(&self) -> &[RegionCells] {
        &self.regions
    }

    /// Cells of one region.
    pub fn cells(&self, region: Region) -> &[RowCell] {
        self.regions
            .iter()
            .find(|r| r.region == region)
            .map_or(&[], |r| r.cells.as_slice())
    }

    /// Cell by column id, in any region.
    pub fn cell(&self, column_id: &str) -> Option<&RowCell> {
        self.regions
            .iter()
            .flat_map(|r| r.cells.iter())
            .find(|c| c.column_id == column_id)
    }

    /// Content writes across all cells.
    pub fn total_writes(&self) -> usize {
        self.regions
            .iter()
            .flat_map(|r| r.cells.iter())
            .map(RowCell::writes)
            .sum()
    }

    /// Mark the content as out of date without unbinding the record.
    pub fn invalidate(&mut self) {
        if self.state == RowState::Bound {
            self.state = RowState::Stale;
        }
    }

    /// Move the row. Returns `true` if the position changed.
    pub fn set_top(&mut self, top: f64) -> bool {
        if (self.top - top).abs() <= f64::EPSILON {
            return false;
        }
        self.top = top;
        true
    }

    /// Shift the row by `delta` pixels.
    pub fn translate(&mut self, delta: f64) -> bool {
        self.set_top(self.top + delta)
    }

    /// Lay out one empty cell per visible column if the column set changed.
    fn sync_cells(&mut self, columns: &ColumnStore) {
        if self.column_generation == Some(columns.generation()) {
            return;
        }
        self.column_generation = Some(columns.generation());
        let same_layout = self.regions.len() == columns.regions().len()
            && self.regions.iter().all(|rc| {
                rc.cells
                    .iter()
                    .map(|c| c.column_id.as_str())
                    .eq(columns.visible_in_region(rc.region).map(|c| c.id.as_str()))
            });
        if same_layout {
            return;
        }
        self.regions = columns
            .regions()
            .into_iter()
            .map(|region| RegionCells {
                region,
                cells: columns
                    .visible_in_region(region)
                    .map(|c| RowCell::new(&c.id))
                    .collect(),
            })
            .collect();
    }

    /// Render `record` (at store index `data_index`) into this slot.
    ///
    /// Returns the row's derived content height.
    pub fn render(
        &mut self,
        data_index: usize,
        record: &Record,
        columns: &ColumnStore,
        config: &RowManagerConfig,
    ) -> f64 {
        self.sync_cells(columns);
        self.data_index = Some(data_index);
        if self.id.as_ref() != Some(&record.id) {
            self.id = Some(record.id.clone());
        }
        self.special = record.is_special();
        self.border_height = config.border_height;

        let mut tallest: f64 = 0.0;
        let mut first_cell = true;
        for region_cells in &mut self.regions {
            let region = region_cells.region;
            for (column, cell) in columns
                .visible_in_region(region)
                .zip(region_cells.cells.iter_mut())
            {
                let output = match &record.group_header {
                    // Group headers put their label in the first cell only.
                    Some(group) if first_cell => {
                        let label = crate::columns::value_to_text(Some(&group.value));
                        CellContent::Text(format!("{label} ({})", group.child_count)).into()
                    }
                    Some(_) => CellContent::Empty.into(),
                    None => {
                        let ctx = CellContext {
                            record,
                            column,
                            value: column.raw_value(record),
                            data_index,
                            region,
                        };
                        column.formatter.format(&ctx)
                    }
                };
                first_cell = false;
                cell.requested_height = output.height;
                if let Some(h) = output.height {
                    tallest = tallest.max(h);
                }
                if cell.content != output.content {
                    cell.content = output.content;
                    cell.writes += 1;
                }
            }
        }

        self.height = if config.fixed_row_height {
            config.row_height
        } else {
            record
                .row_height
                .unwrap_or(config.row_height)
                .max(config.min_row_height())
                .max(tallest)
        };
        self.state = RowState::Bound;
        self.render_count += 1;
        self.height
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::columns::{CellOutput, ColumnConfig, ColumnTypeRegistry};

    fn columns() -> ColumnStore {
        let configs = vec![
            ColumnConfig::field("id").in_region(Region::Locked),
            ColumnConfig::field("name"),
            ColumnConfig::field("notes"),
        ];
        ColumnStore::from_configs(&configs, &ColumnTypeRegistry::with_defaults()).unwrap()
    }

    #[test]
    fn test_render_fills_region_cells() {
        let columns = columns();
        let config = RowManagerConfig::variable(30.0);
        let mut row = Row::new(0, 0, &config);
        assert_eq!(row.state(), RowState::Unbound);
        let record = Record::new(1).with("id", 1).with("name", "Ada");
        let height = row.render(0, &record, &columns, &config);
        assert_eq!(height, 30.0);
        assert_eq!(row.state(), RowState::Bound);
        assert_eq!(row.cells(Region::Locked).len(), 1);
        assert_eq!(row.cells(Region::Normal).len(), 2);
        assert_eq!(row.cell("name").unwrap().content.as_text(), Some("Ada"));
        assert_eq!(row.id(), Some(&RecordId::Int(1)));
    }

    #[test]
    fn test_unchanged_content_is_not_rewritten() {
        let columns = columns();
        let config = RowManagerConfig::fixed(30.0);
        let mut row = Row::new(0, 0, &config);
        let record = Record::new(1).with("id", 1).with("name", "Ada").with("notes", "x");
        row.render(0, &record, &columns, &config);
        let writes = row.total_writes();
        row.render(0, &record, &columns, &config);
        assert_eq!(row.total_writes(), writes);
        let changed = record.clone().with("name", "Bea");
        row.render(0, &changed, &columns, &config);
        assert_eq!(row.total_writes(), writes + 1);
    }

    #[test]
    fn test_height_derives_from_tallest_cell() {
        let configs = vec![ColumnConfig::field("notes")];
        let registry = ColumnTypeRegistry::with_defaults();
        let column = registry_column(&registry, &configs[0]).with_formatter(
            |ctx: &CellContext<'_>| {
                let lines = crate::columns::value_to_text(ctx.value).lines().count();
                CellOutput::text("..").with_height(20.0 * lines as f64)
            },
        );
        let columns = ColumnStore::new(vec![column]).unwrap();
        let config = RowManagerConfig::variable(30.0);
        let mut row = Row::new(0, 0, &config);
        let tall = Record::new(1).with("notes", "a\nb\nc");
        assert_eq!(row.render(0, &tall, &columns, &config), 60.0);
        let short = Record::new(2).with("notes", "a");
        assert_eq!(row.render(1, &short, &columns, &config), 30.0);
        let hinted = Record::new(3).with("notes", "a").with_row_height(45.0);
        assert_eq!(row.render(2, &hinted, &columns, &config), 45.0);

        let fixed = RowManagerConfig::fixed(30.0);
        assert_eq!(row.render(0, &tall, &columns, &fixed), 30.0);
    }

    fn registry_column(registry: &ColumnTypeRegistry, config: &ColumnConfig) -> crate::columns::Column {
        let store = ColumnStore::from_configs(std::slice::from_ref(config), registry).unwrap();
        store.roots()[0].clone()
    }

    #[test]
    fn test_geometry() {
        let config = RowManagerConfig::fixed(30.0).with_border(1.0);
        let mut row = Row::new(3, 0, &config);
        assert!(row.set_top(100.0));
        assert!(!row.set_top(100.0));
        assert!(row.translate(-10.0));
        assert_eq!(row.top(), 90.0);
        assert_eq!(row.bottom(), 121.0);
        assert_eq!(row.slot_id(), 3);
    }
}
