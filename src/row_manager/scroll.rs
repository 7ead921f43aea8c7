//! Scroll-driven window updates.
//!
//! Small scrolls rotate rows through the ring buffer one at a time. Jumps
//! larger than `warp_factor` window heights recompute `top_index` directly
//! and re-render the window, so the cost stays O(window) for any distance.

use std::cmp::Ordering;

use super::{RenderContext, RowManager, RowManagerEvent, CORRECTION_EPSILON};
use crate::row::Row;

impl RowManager {
    /// Largest scroll position the current estimate allows.
    fn max_scroll_top(&self) -> f64 {
        (self.total_height - self.view_height).max(0.0)
    }

    /// Whether the rendered rows cover `[y, y + view_height]`.
    fn covers(&self, ctx: RenderContext<'_>, y: f64) -> bool {
        let (Some(first), Some(last)) = (self.rows.front(), self.rows.back()) else {
            return false;
        };
        let at_end = self.top_index + self.rows.len() >= ctx.store.count();
        (first.top() <= y || self.top_index == 0)
            && (last.bottom() >= y + self.view_height || at_end)
    }

    /// Pixel span of the rendered window.
    fn window_span(&self) -> f64 {
        match (self.rows.front(), self.rows.back()) {
            (Some(first), Some(last)) => last.bottom() - first.top(),
            _ => 0.0,
        }
    }

    /// Bring the window to scroll position `new_scroll_top`.
    ///
    /// Returns `false` when the change was below the render threshold.
    pub fn update_rendered_rows(&mut self, ctx: RenderContext<'_>, new_scroll_top: f64) -> bool {
        let y = new_scroll_top.clamp(0.0, self.max_scroll_top());
        if self.rows.is_empty() {
            self.set_scroll_top(y);
            return false;
        }
        let delta = y - self.scroll_top;
        if delta.abs() < self.config.row_offset_height() && self.covers(ctx, y) {
            self.view_top = y;
            return false;
        }
        self.sync_offsets(ctx);

        let _span = tracing::debug_span!("update_rendered_rows", y, delta).entered();
        if !self.warp_if_needed(ctx, y) {
            let direction = delta.partial_cmp(&0.0).unwrap_or(Ordering::Equal);
            self.fill(ctx, y, direction);
        }
        self.set_scroll_top(y);
        self.correct_error(ctx);
        self.estimate_total_height(ctx);
        self.events.push(RowManagerEvent::RenderDone);
        true
    }

    /// Jump straight to `y` if it is too far away to scroll row by row.
    fn warp_if_needed(&mut self, ctx: RenderContext<'_>, y: f64) -> bool {
        let distance = (y - self.scroll_top).abs();
        if distance <= self.config.warp_factor * self.window_span() {
            return false;
        }
        self.reposition(ctx, y);
        true
    }

    /// Recompute `top_index` for scroll position `y` and re-render the window there.
    pub(super) fn reposition(&mut self, ctx: RenderContext<'_>, y: f64) {
        self.sync_offsets(ctx);
        let count = ctx.store.count();
        let first_visible = self.index_at_position(ctx, y);
        let top_index = first_visible.min(count.saturating_sub(self.rows.len()));
        tracing::debug!(
            from = self.top_index,
            to = top_index,
            y,
            exact = self.all_heights_known(ctx),
            "warp"
        );
        self.top_index = top_index;
        let top = self.estimated_top(ctx, top_index);
        self.place(0, top);
        self.render_from_row(ctx, 0);
        self.reindex();
        self.fill(ctx, y, Ordering::Equal);
    }

    /// Record index starting at or containing position `y`.
    fn index_at_position(&self, ctx: RenderContext<'_>, y: f64) -> usize {
        let count = ctx.store.count();
        if count == 0 || y <= 0.0 {
            return 0;
        }
        let last = count - 1;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = if self.config.fixed_row_height {
            (y / self.config.row_offset_height()).floor() as usize
        } else if let Some(offsets) = self.exact_offsets(ctx) {
            offsets.index_at(y)
        } else if self.total_height > 0.0 {
            (y * count as f64 / self.total_height).floor() as usize
        } else {
            (y / self.estimated_offset_height()).floor() as usize
        };
        index.min(last)
    }

    /// Rotate rows until `[y, y + view_height]` is covered.
    ///
    /// `direction` is the scroll direction: the buffer on the trailing side
    /// is trimmed back to its configured size only while moving.
    pub(super) fn fill(&mut self, ctx: RenderContext<'_>, y: f64, direction: Ordering) {
        let below = self.fill_below(ctx, y, direction == Ordering::Greater);
        let above = self.fill_above(ctx, y, direction == Ordering::Less);
        if below + above > 0 {
            tracing::trace!(below, above, top_index = self.top_index, "filled");
            self.reindex();
        }
    }

    fn fill_below(&mut self, ctx: RenderContext<'_>, y: f64, trim_above: bool) -> usize {
        let target = y + self.view_height;
        let count = ctx.store.count();
        let mut moved = 0;
        while self.top_index + self.rows.len() < count && moved < count {
            let short = self.rows.back().map_or(false, |r| r.bottom() < target);
            let above = self.rows.partition_point(|r| r.bottom() <= y);
            if !(short || (trim_above && above > self.config.prepend_row_buffer)) {
                break;
            }
            if !self.display_record_at_bottom(ctx) {
                break;
            }
            moved += 1;
        }
        moved
    }

    fn fill_above(&mut self, ctx: RenderContext<'_>, y: f64, trim_below: bool) -> usize {
        let target = y + self.view_height;
        let count = ctx.store.count();
        let mut moved = 0;
        while self.top_index > 0 && moved < count {
            let gap = self.rows.front().map_or(false, |r| r.top() > y);
            let below = self.rows.len() - self.rows.partition_point(|r| r.top() < target);
            if !(gap || (trim_below && below > self.config.append_row_buffer)) {
                break;
            }
            if !self.display_record_at_top(ctx) {
                break;
            }
            moved += 1;
        }
        moved
    }

    /// Move the top row to the bottom and render the next record into it.
    pub fn display_record_at_bottom(&mut self, ctx: RenderContext<'_>) -> bool {
        let data_index = self.top_index + self.rows.len();
        if ctx.store.get_at(data_index).is_none() {
            return false;
        }
        let Some(top) = self.rows.back().map(Row::bottom) else {
            return false;
        };
        let Some(row) = self.rows.pop_front() else {
            return false;
        };
        self.rows.push_back(row);
        self.top_index += 1;
        let pos = self.rows.len() - 1;
        self.bind(ctx, pos, data_index);
        self.place(pos, top);
        true
    }

    /// Move the bottom row to the top and render the previous record into it.
    pub fn display_record_at_top(&mut self, ctx: RenderContext<'_>) -> bool {
        let Some(data_index) = self.top_index.checked_sub(1) else {
            return false;
        };
        if ctx.store.get_at(data_index).is_none() {
            return false;
        }
        let Some(next_top) = self.rows.front().map(Row::top) else {
            return false;
        };
        let Some(row) = self.rows.pop_back() else {
            return false;
        };
        self.rows.push_front(row);
        self.top_index = data_index;
        let offset = self.bind(ctx, 0, data_index).unwrap_or(0.0);
        self.place(0, next_top - offset);
        true
    }

    /// Shift the window to remove estimation drift.
    ///
    /// Record 0 must start at 0. When every height is known, or the window is
    /// within `edge_correction_factor` viewports of the top, the window is
    /// moved to its calculated top and the scroll position follows it. At the
    /// end of the data the scroll position is pulled back so the last record
    /// ends at the viewport bottom.
    pub fn correct_error(&mut self, ctx: RenderContext<'_>) {
        let Some(first_top) = self.rows.front().map(Row::top) else {
            return;
        };
        self.sync_offsets(ctx);
        let y = self.scroll_top;
        let delta = if self.top_index == 0 {
            -first_top
        } else if self.all_heights_known(ctx)
            || y < self.config.edge_correction_factor * self.view_height
        {
            self.calculate_top(ctx, self.top_index) - first_top
        } else {
            0.0
        };

        if delta.abs() >= CORRECTION_EPSILON {
            for pos in 0..self.rows.len() {
                let top = self.rows.get(pos).map_or(0.0, Row::top) + delta;
                self.place(pos, top);
            }
            let scroll_top = (y + delta).max(0.0);
            tracing::debug!(delta, scroll_top, top_index = self.top_index, "corrected drift");
            self.set_scroll_top(scroll_top);
            self.events
                .push(RowManagerEvent::ScrollCorrected { delta, scroll_top });
        }

        let count = ctx.store.count();
        let Some(bottom) = self.rows.back().map(Row::bottom) else {
            return;
        };
        let at_end = self.top_index + self.rows.len() >= count;
        let max_scroll_top = (bottom - self.view_height).max(0.0);
        if at_end && self.scroll_top - max_scroll_top >= CORRECTION_EPSILON {
            let delta = max_scroll_top - self.scroll_top;
            tracing::debug!(delta, scroll_top = max_scroll_top, "clamped scroll to last record");
            self.set_scroll_top(max_scroll_top);
            self.events.push(RowManagerEvent::ScrollCorrected {
                delta,
                scroll_top: max_scroll_top,
            });
        }
    }
}
