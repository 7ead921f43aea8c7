//! Shared fixtures for the integration tests.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use vgrid::columns::{ColumnConfig, ColumnStore, ColumnTypeRegistry, Region};
use vgrid::{ArrayStore, Record, RenderContext, RowManager, RowManagerConfig};

/// A store plus the columns rendered from it.
pub struct Fixture {
    pub store: ArrayStore,
    pub columns: ColumnStore,
}

impl Fixture {
    /// `count` records with ids `0..count` and a `name` field.
    pub fn new(count: usize) -> Self {
        Self::with_records((0..count).map(record).collect())
    }

    /// Records whose height hints cycle through `heights`.
    pub fn with_heights(count: usize, heights: &[f64]) -> Self {
        Self::with_records(
            (0..count)
                .map(|i| record(i).with_row_height(heights[i % heights.len()]))
                .collect(),
        )
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        let configs = [
            ColumnConfig::field("id").in_region(Region::Locked),
            ColumnConfig::field("name"),
        ];
        let columns = ColumnStore::from_configs(&configs, &ColumnTypeRegistry::with_defaults())
            .expect("columns");
        Self {
            store: ArrayStore::new(records),
            columns,
        }
    }

    pub fn ctx(&self) -> RenderContext<'_> {
        RenderContext::new(&self.store, &self.columns)
    }

    /// A row manager rendered into a viewport of `view_height`.
    pub fn manager(&self, config: RowManagerConfig, view_height: f64) -> RowManager {
        let mut manager = RowManager::new(config).expect("config");
        manager.set_view_height(self.ctx(), view_height);
        manager.take_events();
        manager
    }
}

pub fn record(i: usize) -> Record {
    Record::new(i64::try_from(i).unwrap())
        .with("id", i)
        .with("name", format!("Record {i}"))
}

/// Rows are stacked without gaps and map to consecutive records.
pub fn assert_contiguous(manager: &RowManager) {
    let rows = manager.rows();
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.index(), i, "pool position of slot {}", row.slot_id());
        assert_eq!(row.data_index(), Some(manager.top_index() + i));
    }
    for pair in rows.iter().collect::<Vec<_>>().windows(2) {
        assert!(
            (pair[0].bottom() - pair[1].top()).abs() < 1e-6,
            "gap between rows {:?} and {:?}",
            pair[0].data_index(),
            pair[1].data_index()
        );
    }
}

/// Rendered rows reach from `y` to `y + view_height`, allowing for the data edges.
pub fn assert_covers(manager: &RowManager, count: usize, y: f64) {
    let first = manager.top_row().expect("rows");
    let last = manager.bottom_row().expect("rows");
    assert!(
        first.top() <= y + 1e-6 || manager.top_index() == 0,
        "first row starts at {} below {}",
        first.top(),
        y
    );
    let at_end = manager.top_index() + manager.rows().len() >= count;
    assert!(
        last.bottom() + 1e-6 >= y + manager.view_height() || at_end,
        "last row ends at {} above {}",
        last.bottom(),
        y + manager.view_height()
    );
}
