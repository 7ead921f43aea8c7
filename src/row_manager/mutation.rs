//! Reactions to store changes.

use std::cmp::Ordering;

use super::{RenderContext, RowManager, RowManagerEvent};
use crate::row::Row;
use crate::store::StoreChange;
use crate::types::RecordId;

impl RowManager {
    /// Apply a store notification to the window. The store is already mutated.
    pub fn on_store_change(&mut self, ctx: RenderContext<'_>, change: &StoreChange) {
        tracing::debug!(?change, "store changed");
        self.drop_offsets();
        match change {
            StoreChange::Add { index, count } => self.insert(ctx, *index, *count),
            StoreChange::Remove { records } => {
                self.invalidate_known_height(records.iter().map(|(_, id)| id));
                if let Some(first) = records.iter().map(|(i, _)| *i).min() {
                    self.remove(ctx, first, records.len());
                }
            }
            StoreChange::Update { id, fields, .. } => self.update_record(ctx, id, fields),
            StoreChange::Move { from, to, .. } => self.move_record(ctx, *from, *to),
            StoreChange::Dataset => self.reset(ctx),
            StoreChange::Filter | StoreChange::Group => {
                self.height_map.retain(|id| ctx.store.index_of(id).is_some());
                let y = self.scroll_top;
                self.relayout(ctx, y);
            }
            StoreChange::Sort => {
                let y = self.scroll_top;
                self.relayout(ctx, y);
            }
        }
    }

    /// Rows between `position` and the viewport bottom.
    fn visible_rows_from(&self, position: usize) -> usize {
        let bottom = self.view_top + self.view_height;
        self.rows
            .iter()
            .skip(position)
            .take_while(|r| r.top() < bottom)
            .count()
    }

    /// `count` records were inserted at store index `index`.
    pub fn insert(&mut self, ctx: RenderContext<'_>, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        let _span = tracing::debug_span!("insert", index, count).entered();
        self.calculate_row_count(ctx);
        if self.row_count == 0 {
            self.refresh(ctx);
            return;
        }
        let resized = self.match_row_count(ctx);
        let window_end = self.top_index + self.rows.len();
        let affected = index < window_end;
        let position = index.saturating_sub(self.top_index);
        let start = match (resized, affected) {
            (Some(p), true) => Some(p.min(position)),
            (Some(p), false) => Some(p),
            (None, true) => Some(position),
            (None, false) => None,
        };
        if let Some(start) = start {
            self.render_from_row(ctx, start);
        }
        if affected {
            let visible = self.visible_rows_from(position);
            self.events.push(RowManagerEvent::RowsInserted {
                position,
                count: count.min(visible),
            });
        }
        self.settle(ctx);
    }

    /// `count` records starting at store index `index` were removed.
    ///
    /// Rows below the removal point are re-rendered with the records that
    /// moved up; if the store shrank below the window, `top_index` is pulled
    /// back and the whole window re-rendered.
    pub fn remove(&mut self, ctx: RenderContext<'_>, index: usize, count: usize) {
        if count == 0 {
            return;
        }
        let _span = tracing::debug_span!("remove", index, count).entered();
        let window_end = self.top_index + self.rows.len();
        let affected = index < window_end;
        let position = index.saturating_sub(self.top_index);
        let visible = self.visible_rows_from(position);

        self.calculate_row_count(ctx);
        if self.row_count == 0 {
            self.refresh(ctx);
            return;
        }
        let resized = self.match_row_count(ctx);
        let start = match resized {
            Some(p) => Some(p.min(position)),
            None if affected => Some(position),
            None => None,
        };
        if let Some(start) = start {
            self.render_from_row(ctx, start.min(self.rows.len()));
        }
        if affected {
            self.events.push(RowManagerEvent::RowsRemoved {
                position,
                count: count.min(visible),
            });
        }
        self.settle(ctx);
    }

    /// Field values of one record changed.
    fn update_record(&mut self, ctx: RenderContext<'_>, id: &RecordId, fields: &[String]) {
        if fields.iter().any(|f| f == "rowHeight") {
            self.height_map.invalidate(id);
        }
        let Some(position) = self.rows.iter().position(|r| r.id() == Some(id)) else {
            self.estimate_total_height(ctx);
            return;
        };
        if self.config.fixed_row_height {
            let data_index = self.top_index + position;
            self.bind(ctx, position, data_index);
            self.events.push(RowManagerEvent::RenderDone);
        } else {
            // The height may change, so every row below restacks.
            self.render_from_row(ctx, position);
            self.settle(ctx);
        }
    }

    /// A record moved from store index `from` to `to`.
    fn move_record(&mut self, ctx: RenderContext<'_>, from: usize, to: usize) {
        let first = from.min(to);
        let last = from.max(to);
        let window_end = self.top_index + self.rows.len();
        if last < self.top_index || first >= window_end {
            return;
        }
        self.render_from_row(ctx, first.saturating_sub(self.top_index));
        self.settle(ctx);
    }

    /// All data was replaced: forget measured heights and return to the top.
    pub fn reset(&mut self, ctx: RenderContext<'_>) {
        tracing::debug!(count = ctx.store.count(), "dataset reset");
        self.height_map.clear();
        self.drop_offsets();
        self.top_index = 0;
        self.view_top = 0.0;
        if self.scroll_top > 0.0 {
            let delta = -self.scroll_top;
            self.scroll_top = 0.0;
            self.events.push(RowManagerEvent::ScrollCorrected {
                delta,
                scroll_top: 0.0,
            });
        }
        self.place(0, 0.0);
        self.refresh(ctx);
    }

    /// Re-derive the window for scroll position `y` after a reordering change.
    pub fn relayout(&mut self, ctx: RenderContext<'_>, y: f64) {
        self.calculate_row_count(ctx);
        if self.row_count == 0 {
            self.refresh(ctx);
            return;
        }
        self.match_row_count(ctx);
        self.estimate_total_height(ctx);
        let y = y.clamp(0.0, (self.total_height - self.view_height).max(0.0));
        self.reposition(ctx, y);
        self.set_scroll_top(y);
        self.correct_error(ctx);
        self.estimate_total_height(ctx);
        self.events.push(RowManagerEvent::RenderDone);
    }

    /// Switch between fixed and variable row height. Measured heights are dropped.
    pub fn set_fixed_row_height(&mut self, ctx: RenderContext<'_>, fixed: bool) {
        if self.config.fixed_row_height == fixed {
            return;
        }
        self.config.fixed_row_height = fixed;
        self.height_map.clear();
        self.drop_offsets();
        let y = self.scroll_top;
        self.relayout(ctx, y);
    }

    /// Change the configured row height. Measured heights are dropped.
    pub fn set_row_height(&mut self, ctx: RenderContext<'_>, row_height: f64) {
        if !(row_height.is_finite() && row_height > 0.0) {
            tracing::warn!(row_height, "ignoring invalid row height");
            return;
        }
        self.config.row_height = row_height;
        self.height_map.clear();
        self.drop_offsets();
        let y = self.scroll_top;
        self.relayout(ctx, y);
    }

    /// Mark every rendered row stale and re-render the window.
    pub fn invalidate_rows(&mut self, ctx: RenderContext<'_>) {
        self.rows.iter_mut().for_each(Row::invalidate);
        self.refresh(ctx);
    }

    /// Scroll so record `index` is fully visible. Returns the new scroll position.
    pub fn scroll_row_into_view(&mut self, ctx: RenderContext<'_>, index: usize) -> f64 {
        let count = ctx.store.count();
        if count == 0 || self.rows.is_empty() {
            return self.scroll_top;
        }
        let index = index.min(count - 1);
        // Estimates may shift once the row renders, so settle in two passes.
        for _ in 0..2 {
            let (top, bottom) = match self.rows.iter().find(|r| r.data_index() == Some(index)) {
                Some(row) => (row.top(), row.bottom()),
                None => {
                    let top = self.scroll_position_for(ctx, index);
                    (top, top + self.estimated_offset_height())
                }
            };
            let y = self.scroll_top;
            let target = match (top.partial_cmp(&y), (bottom - self.view_height).partial_cmp(&y)) {
                (Some(Ordering::Less), _) => top,
                (_, Some(Ordering::Greater)) => bottom - self.view_height,
                _ => return y,
            };
            if !self.update_rendered_rows(ctx, target) {
                self.set_scroll_top(target.clamp(0.0, (self.total_height - self.view_height).max(0.0)));
            }
        }
        self.scroll_top
    }
}
