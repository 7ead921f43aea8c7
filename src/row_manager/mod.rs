//! Virtualized row pool.
//!
//! The [`RowManager`] keeps a bounded ring buffer of [`Row`] slots covering the
//! viewport plus prepend/append buffers, maps scroll positions to record indices,
//! and maintains the estimate of the total scrollable height.
//!
//! Layout:
//! - `mod.rs`: state, pool sizing, rendering passes, height bookkeeping, queries
//! - `scroll.rs`: scroll-driven updates (threshold, warp, ring-buffer fill, drift correction)
//! - `mutation.rs`: reactions to store changes (insert, remove, update, reset)

mod mutation;
mod scroll;

use std::collections::VecDeque;

use serde::Serialize;

use crate::columns::ColumnStore;
use crate::error::Result;
use crate::layout::{HeightMap, RowOffsets};
use crate::row::Row;
use crate::store::Store;
use crate::types::{RecordId, RowManagerConfig};

/// Corrections smaller than this (in pixels) are not applied.
const CORRECTION_EPSILON: f64 = 0.5;

/// Collaborators a rendering pass reads from.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub store: &'a dyn Store,
    pub columns: &'a ColumnStore,
}

impl<'a> RenderContext<'a> {
    pub fn new(store: &'a dyn Store, columns: &'a ColumnStore) -> Self {
        Self { store, columns }
    }
}

/// Notifications produced by the row manager, drained with [`RowManager::take_events`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RowManagerEvent {
    /// The estimated scrollable height changed
    TotalHeightChanged { height: f64 },
    /// Slots were added to the pool
    RowsCreated { slot_ids: Vec<usize> },
    /// Slots were removed from the pool
    RowsDestroyed { slot_ids: Vec<usize> },
    /// Records were inserted at pool position `position`; `count` is capped to visible rows
    RowsInserted { position: usize, count: usize },
    /// Records were removed at pool position `position`; `count` is capped to visible rows
    RowsRemoved { position: usize, count: usize },
    /// A row moved
    RowTranslated { slot_id: usize, top: f64 },
    /// The scroll position must be set to `scroll_top` (moved by `delta`)
    ScrollCorrected { delta: f64, scroll_top: f64 },
    /// A rendering pass finished
    RenderDone,
}

/// Owner of the row pool and the height estimator.
#[derive(Debug)]
pub struct RowManager {
    config: RowManagerConfig,
    /// Pool of slots; `rows[i]` displays record `top_index + i`
    rows: VecDeque<Row>,
    top_index: usize,
    row_count: usize,
    visible_row_count: usize,
    view_height: f64,
    height_map: HeightMap,
    /// Exact prefix sums of offset heights, kept once every record is measured
    offsets: Option<RowOffsets>,
    /// Last published estimate of the scrollable height
    total_height: f64,
    /// Last scroll position the window was rendered for
    scroll_top: f64,
    /// Scroll position last requested; trails `scroll_top` by under a row
    /// when a small scroll skipped rendering
    view_top: f64,
    next_slot_id: usize,
    events: Vec<RowManagerEvent>,
}

impl RowManager {
    pub fn new(config: RowManagerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rows: VecDeque::new(),
            top_index: 0,
            row_count: 0,
            visible_row_count: 0,
            view_height: 0.0,
            height_map: HeightMap::new(),
            offsets: None,
            total_height: 0.0,
            scroll_top: 0.0,
            view_top: 0.0,
            next_slot_id: 0,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &RowManagerConfig {
        &self.config
    }

    pub fn rows(&self) -> &VecDeque<Row> {
        &self.rows
    }

    /// Row at a pool position.
    pub fn row(&self, position: usize) -> Option<&Row> {
        self.rows.get(position)
    }

    /// Record index displayed by `rows[0]`.
    pub fn top_index(&self) -> usize {
        self.top_index
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn visible_row_count(&self) -> usize {
        self.visible_row_count
    }

    pub fn view_height(&self) -> f64 {
        self.view_height
    }

    pub fn total_height(&self) -> f64 {
        self.total_height
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    /// Where the viewport actually is, which may differ from [`Self::scroll_top`]
    /// by less than one row.
    pub fn view_top(&self) -> f64 {
        self.view_top
    }

    fn set_scroll_top(&mut self, y: f64) {
        self.scroll_top = y;
        self.view_top = y;
    }

    pub fn height_map(&self) -> &HeightMap {
        &self.height_map
    }

    pub fn top_row(&self) -> Option<&Row> {
        self.rows.front()
    }

    pub fn bottom_row(&self) -> Option<&Row> {
        self.rows.back()
    }

    /// Row currently displaying the record with `id`.
    pub fn row_for_record(&self, id: &RecordId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id() == Some(id))
    }

    /// Row covering content position `y`.
    pub fn row_at(&self, y: f64) -> Option<&Row> {
        let i = self.rows.partition_point(|r| r.bottom() <= y);
        self.rows.get(i).filter(|r| r.top() <= y)
    }

    /// First row intersecting the viewport.
    pub fn first_visible_row(&self) -> Option<&Row> {
        let i = self.rows.partition_point(|r| r.bottom() <= self.view_top);
        self.rows.get(i)
    }

    /// Last row intersecting the viewport.
    pub fn last_visible_row(&self) -> Option<&Row> {
        let bottom = self.view_top + self.view_height;
        let i = self.rows.partition_point(|r| r.top() < bottom);
        i.checked_sub(1).and_then(|i| self.rows.get(i))
    }

    /// Drain pending notifications.
    pub fn take_events(&mut self) -> Vec<RowManagerEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Height bookkeeping
    // ========================================================================

    /// Record a measured height. Returns `true` if it changed the map.
    pub fn store_known_height(&mut self, id: RecordId, height: f64) -> bool {
        let changed = self.height_map.store(id, height);
        if changed {
            self.drop_offsets();
        }
        changed
    }

    /// Forget measured heights. Returns how many were known.
    pub fn invalidate_known_height<'a>(&mut self, ids: impl IntoIterator<Item = &'a RecordId>) -> usize {
        let forgotten = ids
            .into_iter()
            .filter(|id| self.height_map.invalidate(id))
            .count();
        if forgotten > 0 {
            self.drop_offsets();
        }
        forgotten
    }

    /// Build the exact offset index once every record has a measured height.
    ///
    /// The index is dropped whenever the store or the height map changes
    /// shape and rebuilt here on the next scroll, in one O(n) pass.
    fn sync_offsets(&mut self, ctx: RenderContext<'_>) {
        if self.config.fixed_row_height || !self.all_heights_known(ctx) {
            self.offsets = None;
            return;
        }
        let count = ctx.store.count();
        if self.offsets.as_ref().map_or(false, |o| o.len() == count) {
            return;
        }
        let values = (0..count).map(|i| self.offset_height_of(ctx, i)).collect();
        self.offsets = Some(RowOffsets::from_values(values));
        tracing::debug!(count, "offset index built");
    }

    /// The offset index, if it matches the store.
    fn exact_offsets(&self, ctx: RenderContext<'_>) -> Option<&RowOffsets> {
        self.offsets
            .as_ref()
            .filter(|o| o.len() == ctx.store.count())
    }

    fn drop_offsets(&mut self) {
        self.offsets = None;
    }

    /// Mean measured height, `None` before anything was measured.
    pub fn average_row_height(&self) -> Option<f64> {
        self.height_map.average()
    }

    /// Whether every record's height is known exactly.
    pub fn all_heights_known(&self, ctx: RenderContext<'_>) -> bool {
        self.config.fixed_row_height || self.height_map.len() >= ctx.store.count()
    }

    /// Offset height assumed for records that were never measured.
    ///
    /// The running average only replaces the configured row height once the
    /// sample is at least as large as the pool (and `min_estimate_sample`).
    pub fn estimated_offset_height(&self) -> f64 {
        if self.config.fixed_row_height {
            return self.config.row_offset_height();
        }
        let sample = self.row_count.max(self.config.min_estimate_sample);
        let height = match self.height_map.average() {
            Some(average) if self.height_map.len() >= sample => average,
            _ => self.config.row_height,
        };
        height.max(self.config.min_row_height()) + self.config.border_height
    }

    /// Offset height of one record: measured if known, estimated otherwise.
    fn offset_height_of(&self, ctx: RenderContext<'_>, index: usize) -> f64 {
        if self.config.fixed_row_height {
            return self.config.row_offset_height();
        }
        ctx.store
            .get_at(index)
            .and_then(|r| self.height_map.get(&r.id))
            .map_or_else(
                || self.estimated_offset_height(),
                |h| h + self.config.border_height,
            )
    }

    /// Top of record `index` summed from known and estimated heights.
    pub fn calculate_top(&self, ctx: RenderContext<'_>, index: usize) -> f64 {
        if self.config.fixed_row_height {
            return index as f64 * self.config.row_offset_height();
        }
        if let Some(offsets) = self.exact_offsets(ctx) {
            return offsets.top_of(index);
        }
        (0..index).map(|i| self.offset_height_of(ctx, i)).sum()
    }

    /// Top of record `index` assuming uniform density over the estimate.
    fn estimated_top(&self, ctx: RenderContext<'_>, index: usize) -> f64 {
        let count = ctx.store.count();
        if self.config.fixed_row_height {
            return index as f64 * self.config.row_offset_height();
        }
        if self.all_heights_known(ctx) {
            return self.calculate_top(ctx, index);
        }
        if count > 0 && self.total_height > 0.0 {
            return index as f64 * self.total_height / count as f64;
        }
        index as f64 * self.estimated_offset_height()
    }

    /// Scroll position at which record `index` starts.
    pub fn scroll_position_for(&self, ctx: RenderContext<'_>, index: usize) -> f64 {
        match self.rows.iter().find(|r| r.data_index() == Some(index)) {
            Some(row) => row.top(),
            None => self.estimated_top(ctx, index),
        }
    }

    /// Estimate the scrollable height and publish it if it changed.
    pub fn estimate_total_height(&mut self, ctx: RenderContext<'_>) -> f64 {
        let count = ctx.store.count();
        let mut estimate = if self.config.fixed_row_height {
            count as f64 * self.config.row_offset_height()
        } else {
            let known = self.height_map.len();
            let unknown = count.saturating_sub(known);
            self.height_map.total_known_height()
                + known as f64 * self.config.border_height
                + unknown as f64 * self.estimated_offset_height()
        };
        if let Some(bottom) = self.rows.back() {
            if count > 0 && bottom.data_index() == Some(count - 1) {
                // The last record is rendered: its bottom is exact.
                estimate = bottom.bottom();
            } else {
                estimate = estimate.max(bottom.bottom());
            }
        }
        self.set_total_height(estimate);
        estimate
    }

    fn set_total_height(&mut self, height: f64) {
        if (height - self.total_height).abs() <= f64::EPSILON {
            return;
        }
        tracing::trace!(from = self.total_height, to = height, "total height changed");
        self.total_height = height;
        self.events.push(RowManagerEvent::TotalHeightChanged { height });
    }

    // ========================================================================
    // Pool sizing
    // ========================================================================

    /// Number of slots needed for the current viewport and store.
    pub fn calculate_row_count(&mut self, ctx: RenderContext<'_>) -> usize {
        if self.view_height <= 0.0 || ctx.columns.visible_count() == 0 {
            self.visible_row_count = 0;
            self.row_count = 0;
            return 0;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let visible = (self.view_height / self.config.min_row_offset_height()).ceil() as usize;
        self.visible_row_count = visible;
        self.row_count = ctx.store.count().min(
            visible + self.config.prepend_row_buffer + self.config.append_row_buffer,
        );
        self.row_count
    }

    /// Grow or shrink the pool to `row_count` slots at its bottom edge.
    ///
    /// Returns the first pool position that needs rendering, if any.
    pub fn match_row_count(&mut self, ctx: RenderContext<'_>) -> Option<usize> {
        let current = self.rows.len();
        let target = self.row_count;
        let mut dirty_from = None;

        if target > current {
            let mut slot_ids = Vec::with_capacity(target - current);
            while self.rows.len() < target {
                let slot_id = self.next_slot_id;
                self.next_slot_id += 1;
                self.rows.push_back(Row::new(slot_id, self.rows.len(), &self.config));
                slot_ids.push(slot_id);
            }
            tracing::debug!(from = current, to = target, "row pool grown");
            self.events.push(RowManagerEvent::RowsCreated { slot_ids });
            dirty_from = Some(current);
        } else if target < current {
            let mut slot_ids = Vec::with_capacity(current - target);
            while self.rows.len() > target {
                if let Some(row) = self.rows.pop_back() {
                    slot_ids.push(row.slot_id());
                }
            }
            tracing::debug!(from = current, to = target, "row pool shrunk");
            self.events.push(RowManagerEvent::RowsDestroyed { slot_ids });
        }

        if self.clamp_top_index(ctx) || (current == 0 && target > 0) {
            let top = self.estimated_top(ctx, self.top_index);
            self.place(0, top);
            dirty_from = Some(0);
        }
        dirty_from
    }

    /// Keep `top_index` within `[0, count - rows]`. Returns `true` if it moved.
    fn clamp_top_index(&mut self, ctx: RenderContext<'_>) -> bool {
        let max_top = ctx.store.count().saturating_sub(self.rows.len());
        if self.top_index > max_top {
            tracing::debug!(from = self.top_index, to = max_top, "top index clamped");
            self.top_index = max_top;
            return true;
        }
        false
    }

    /// Resize the viewport and render whatever became visible.
    pub fn set_view_height(&mut self, ctx: RenderContext<'_>, view_height: f64) {
        self.view_height = view_height.max(0.0);
        self.calculate_row_count(ctx);
        if self.row_count == 0 {
            self.skip_render();
            return;
        }
        if let Some(position) = self.match_row_count(ctx) {
            self.render_from_row(ctx, position);
        }
        self.settle(ctx);
    }

    // ========================================================================
    // Rendering passes
    // ========================================================================

    /// Nothing can be rendered: drop the pool and publish a zero height.
    fn skip_render(&mut self) {
        self.release_rows();
        self.set_total_height(0.0);
        self.events.push(RowManagerEvent::RenderDone);
    }

    fn release_rows(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let slot_ids = self.rows.drain(..).map(|r| r.slot_id()).collect();
        self.events.push(RowManagerEvent::RowsDestroyed { slot_ids });
    }

    /// Re-render the whole window in place.
    pub fn refresh(&mut self, ctx: RenderContext<'_>) {
        let _span = tracing::debug_span!("refresh", top_index = self.top_index).entered();
        self.calculate_row_count(ctx);
        if self.row_count == 0 {
            self.skip_render();
            return;
        }
        self.match_row_count(ctx);
        self.render_from_row(ctx, 0);
        self.settle(ctx);
    }

    /// Cover the viewport, fix drift and publish the height after a pass.
    fn settle(&mut self, ctx: RenderContext<'_>) {
        let y = self.scroll_top;
        self.fill(ctx, y, std::cmp::Ordering::Equal);
        self.correct_error(ctx);
        self.estimate_total_height(ctx);
        self.events.push(RowManagerEvent::RenderDone);
    }

    /// Re-render rows from pool position `position` down, stacking tops.
    pub fn render_from_row(&mut self, ctx: RenderContext<'_>, position: usize) {
        let mut top = match position.checked_sub(1).and_then(|p| self.rows.get(p)) {
            Some(previous) => previous.bottom(),
            None => self.rows.front().map_or(0.0, Row::top),
        };
        let mut rendered = 0;
        for pos in position..self.rows.len() {
            let Some(offset) = self.bind(ctx, pos, self.top_index + pos) else {
                break;
            };
            self.place(pos, top);
            top += offset;
            rendered += 1;
        }
        tracing::trace!(position, rendered, "rendered rows");
    }

    /// Render record `data_index` into the row at `pos`. Returns its offset height.
    fn bind(&mut self, ctx: RenderContext<'_>, pos: usize, data_index: usize) -> Option<f64> {
        let record = ctx.store.get_at(data_index)?;
        let row = self.rows.get_mut(pos)?;
        row.index = pos;
        let height = row.render(data_index, record, ctx.columns, &self.config);
        if !self.config.fixed_row_height && self.height_map.store(record.id.clone(), height) {
            if let Some(offsets) = self.offsets.as_mut() {
                offsets.set(data_index, height + self.config.border_height);
            }
        }
        Some(row.offset_height())
    }

    /// Move the row at `pos` to `top`, announcing the move.
    fn place(&mut self, pos: usize, top: f64) {
        if let Some(row) = self.rows.get_mut(pos) {
            if row.set_top(top) {
                self.events.push(RowManagerEvent::RowTranslated {
                    slot_id: row.slot_id(),
                    top,
                });
            }
        }
    }

    fn reindex(&mut self) {
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.index = i;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::columns::{ColumnConfig, ColumnTypeRegistry};
    use crate::store::ArrayStore;
    use crate::types::Record;

    fn columns() -> ColumnStore {
        ColumnStore::from_configs(&[ColumnConfig::field("name")], &ColumnTypeRegistry::with_defaults())
            .unwrap()
    }

    fn store(count: usize) -> ArrayStore {
        ArrayStore::new(
            (0..count)
                .map(|i| Record::new(i64::try_from(i).unwrap()).with("name", format!("r{i}")))
                .collect(),
        )
    }

    #[test]
    fn test_row_count_bounded_by_store() {
        let (store, columns) = (store(8), columns());
        let ctx = RenderContext::new(&store, &columns);
        let mut manager = RowManager::new(RowManagerConfig::fixed(30.0)).unwrap();
        manager.set_view_height(ctx, 600.0);
        assert_eq!(manager.visible_row_count(), 20);
        assert_eq!(manager.row_count(), 8);
        assert_eq!(manager.rows().len(), 8);
        assert_eq!(manager.total_height(), 240.0);
    }

    #[test]
    fn test_zero_columns_skips_rendering() {
        let store = store(100);
        let columns = ColumnStore::new(Vec::new()).unwrap();
        let ctx = RenderContext::new(&store, &columns);
        let mut manager = RowManager::new(RowManagerConfig::fixed(30.0)).unwrap();
        manager.set_view_height(ctx, 600.0);
        assert_eq!(manager.row_count(), 0);
        assert!(manager.rows().is_empty());
        assert_eq!(manager.total_height(), 0.0);
    }

    #[test]
    fn test_resize_keeps_existing_slots() {
        let (store, columns) = (store(1000), columns());
        let ctx = RenderContext::new(&store, &columns);
        let mut manager = RowManager::new(RowManagerConfig::fixed(30.0)).unwrap();
        manager.set_view_height(ctx, 300.0);
        let before: Vec<usize> = manager.rows().iter().map(Row::slot_id).collect();
        manager.take_events();
        manager.set_view_height(ctx, 600.0);
        let after: Vec<usize> = manager.rows().iter().map(Row::slot_id).collect();
        assert_eq!(&after[..before.len()], &before[..]);
        assert_eq!(after.len(), 30);
        assert!(manager
            .take_events()
            .iter()
            .any(|e| matches!(e, RowManagerEvent::RowsCreated { slot_ids } if slot_ids.len() == 10)));

        manager.set_view_height(ctx, 150.0);
        assert_eq!(manager.rows().len(), 15);
    }

    #[test]
    fn test_row_at_and_visible_rows() {
        let (store, columns) = (store(1000), columns());
        let ctx = RenderContext::new(&store, &columns);
        let mut manager = RowManager::new(RowManagerConfig::fixed(30.0)).unwrap();
        manager.set_view_height(ctx, 600.0);
        assert_eq!(manager.row_at(45.0).unwrap().data_index(), Some(1));
        assert_eq!(manager.first_visible_row().unwrap().data_index(), Some(0));
        assert_eq!(manager.last_visible_row().unwrap().data_index(), Some(19));
        assert_eq!(manager.scroll_position_for(ctx, 500), 15000.0);
    }

    #[test]
    fn test_invalidate_known_height() {
        let mut manager = RowManager::new(RowManagerConfig::variable(30.0)).unwrap();
        manager.store_known_height(RecordId::Int(1), 40.0);
        manager.store_known_height(RecordId::Int(2), 60.0);
        let ids = [RecordId::Int(1), RecordId::Int(3)];
        assert_eq!(manager.invalidate_known_height(&ids), 1);
        assert_eq!(manager.height_map().total_known_height(), 60.0);
    }
}
