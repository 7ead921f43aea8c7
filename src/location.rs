//! Lazy (row, column) cursors.
//!
//! A [`Location`] stores *what* it points at (a record id or a row index, a
//! column id or a column index) and resolves *where* that is against the live
//! store and column store on every query. A location captured before an
//! insert, remove or reorder keeps pointing at the same cell afterwards as
//! long as its record and column still exist.

use serde::{Deserialize, Serialize};

use crate::columns::{Column, ColumnStore};
use crate::store::Store;
use crate::types::{Record, RecordId};

/// Row index of the column header row.
pub const HEADER_ROW: isize = -1;

/// How a location refers to its row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowRef {
    Record(RecordId),
    /// Position in the visible sequence; `-1` is the header row
    Index(isize),
}

/// How a location refers to its column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnRef {
    Id(String),
    /// Position among the visible leaf columns
    Index(usize),
}

/// Movement tokens accepted by [`Location::move_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Up,
    Down,
    NextCell,
    PrevCell,
    FirstColumn,
    LastColumn,
    FirstCell,
    LastCell,
    PrevPage,
    NextPage,
}

/// Live collections a location resolves against.
#[derive(Clone, Copy)]
pub struct LocationContext<'a> {
    pub store: &'a dyn Store,
    pub columns: &'a ColumnStore,
    /// Viewport height used for page movement
    pub view_height: f64,
    /// Row height used for page movement
    pub row_height: f64,
}

impl LocationContext<'_> {
    /// Rows moved by one page.
    pub fn page_size(&self) -> isize {
        if self.row_height.is_nan() || self.row_height <= 0.0 {
            return 1;
        }
        #[allow(clippy::cast_possible_truncation)]
        let rows = (self.view_height / self.row_height).floor() as isize;
        rows.max(1)
    }
}

/// A cell or row cursor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub row: RowRef,
    pub column: ColumnRef,
}

impl Location {
    /// Cell of a record in a column.
    pub fn for_record(id: impl Into<RecordId>, column_id: &str) -> Self {
        Self {
            row: RowRef::Record(id.into()),
            column: ColumnRef::Id(column_id.to_string()),
        }
    }

    /// Cell at a row index and visible column index.
    pub fn at(row_index: isize, column_index: usize) -> Self {
        Self {
            row: RowRef::Index(row_index),
            column: ColumnRef::Index(column_index),
        }
    }

    /// Header cell of a column.
    pub fn header(column_id: &str) -> Self {
        Self {
            row: RowRef::Index(HEADER_ROW),
            column: ColumnRef::Id(column_id.to_string()),
        }
    }

    /// Current row index, `-1` for the header. `None` if the record is gone.
    pub fn row_index(&self, ctx: &LocationContext<'_>) -> Option<isize> {
        match &self.row {
            RowRef::Record(id) => ctx
                .store
                .index_of(id)
                .and_then(|i| isize::try_from(i).ok()),
            RowRef::Index(HEADER_ROW) => Some(HEADER_ROW),
            RowRef::Index(i) => {
                let count = isize::try_from(ctx.store.count()).ok()?;
                (0..count).contains(i).then_some(*i)
            }
        }
    }

    pub fn record<'a>(&self, ctx: &LocationContext<'a>) -> Option<&'a Record> {
        match &self.row {
            RowRef::Record(id) => ctx.store.get_by_id(id),
            RowRef::Index(i) => usize::try_from(*i).ok().and_then(|i| ctx.store.get_at(i)),
        }
    }

    pub fn column<'a>(&self, ctx: &LocationContext<'a>) -> Option<&'a Column> {
        let index = self.column_index(ctx)?;
        ctx.columns.visible_at(index)
    }

    /// Current position among the visible columns. `None` if hidden or gone.
    pub fn column_index(&self, ctx: &LocationContext<'_>) -> Option<usize> {
        match &self.column {
            ColumnRef::Id(id) => ctx.columns.visible_index_of(id),
            ColumnRef::Index(i) => (*i < ctx.columns.visible_count()).then_some(*i),
        }
    }

    /// Points at a data cell that currently exists.
    pub fn is_cell(&self, ctx: &LocationContext<'_>) -> bool {
        self.record(ctx).is_some() && self.column(ctx).is_some()
    }

    pub fn is_column_header(&self) -> bool {
        self.row == RowRef::Index(HEADER_ROW)
    }

    /// Points at a group header or other synthesized row.
    pub fn is_special_row(&self, ctx: &LocationContext<'_>) -> bool {
        self.record(ctx).is_some_and(Record::is_special)
    }

    /// Same raw references, without resolving anything.
    pub fn equals_shallow(&self, other: &Location) -> bool {
        self == other
    }

    /// Same resolved record (or header) and column.
    pub fn equals(&self, other: &Location, ctx: &LocationContext<'_>) -> bool {
        let row_identity = |loc: &Location| -> Option<Option<RecordId>> {
            if loc.is_column_header() {
                return Some(None);
            }
            loc.record(ctx).map(|r| Some(r.id.clone()))
        };
        let column_identity = |loc: &Location| loc.column(ctx).map(|c| c.id.clone());
        match (row_identity(self), row_identity(other)) {
            (Some(a), Some(b)) if a == b => {}
            _ => return false,
        }
        matches!(
            (column_identity(self), column_identity(other)),
            (Some(a), Some(b)) if a == b
        )
    }

    /// A new location one step away in `direction`, clamped to the grid edges.
    ///
    /// The header row (`-1`) is reachable with `Up` only. `NextCell` continues
    /// on the next row's first column; `PrevCell` continues on the previous
    /// row's last column but never enters the header. Unresolvable locations
    /// are returned unchanged.
    pub fn move_to(&self, direction: Direction, ctx: &LocationContext<'_>) -> Location {
        let Some(row) = self.row_index(ctx) else {
            return self.clone();
        };
        let column_count = ctx.columns.visible_count();
        let Some(last_column) = column_count.checked_sub(1) else {
            return self.clone();
        };
        let column = self.column_index(ctx).unwrap_or(0).min(last_column);
        let last_row = isize::try_from(ctx.store.count()).unwrap_or(isize::MAX) - 1;
        let page = ctx.page_size();

        let (row, column) = match direction {
            Direction::Up => ((row - 1).max(HEADER_ROW), column),
            Direction::Down => ((row + 1).min(last_row), column),
            Direction::NextCell if column < last_column => (row, column + 1),
            Direction::NextCell if row != HEADER_ROW && row < last_row => (row + 1, 0),
            Direction::NextCell => (row, column),
            Direction::PrevCell if column > 0 => (row, column - 1),
            Direction::PrevCell if row > 0 => (row - 1, last_column),
            Direction::PrevCell => (row, column),
            Direction::FirstColumn => (row, 0),
            Direction::LastColumn => (row, last_column),
            Direction::FirstCell => (0.min(last_row), 0),
            Direction::LastCell => (last_row, last_column),
            Direction::PrevPage if row == HEADER_ROW => (row, column),
            Direction::PrevPage => ((row - page).max(0), column),
            Direction::NextPage => ((row + page).min(last_row), column),
        };
        // An empty store leaves only the header row.
        let row = row.max(HEADER_ROW);
        Self::resolved(row, column, ctx)
    }

    /// Build an identity-based location from resolved indices.
    fn resolved(row: isize, column: usize, ctx: &LocationContext<'_>) -> Location {
        let row = match usize::try_from(row).ok().and_then(|i| ctx.store.get_at(i)) {
            Some(record) => RowRef::Record(record.id.clone()),
            None => RowRef::Index(row),
        };
        let column = match ctx.columns.visible_at(column) {
            Some(c) => ColumnRef::Id(c.id.clone()),
            None => ColumnRef::Index(column),
        };
        Location { row, column }
    }
}
