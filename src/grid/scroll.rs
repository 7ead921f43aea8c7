//! Scroll and resize handling for `Grid`.
//!
//! Scroll events render synchronously. Resizes and the post-scroll settle
//! pass are buffered through trailing-edge debouncers: a later call pushes
//! the deadline back and replaces the pending payload.

use super::Grid;
use crate::columns::Region;
use crate::row_manager::{RenderContext, RowManagerEvent};

/// Trailing-edge debouncer driven by caller-supplied timestamps.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay_ms: f64,
    pending: Option<(T, f64)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    /// Schedule `payload`, superseding anything pending.
    pub fn call(&mut self, payload: T, now_ms: f64) {
        self.pending = Some((payload, now_ms + self.delay_ms));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the payload if its deadline has passed.
    pub fn poll(&mut self, now_ms: f64) -> Option<T> {
        match &self.pending {
            Some((_, due)) if *due <= now_ms => self.pending.take().map(|(payload, _)| payload),
            _ => None,
        }
    }

    /// Take the payload regardless of the deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(payload, _)| payload)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl Grid {
    /// Scroll vertically to `y` and render the rows it exposes.
    pub fn scroll_to(&mut self, y: f64, now_ms: f64) -> Vec<RowManagerEvent> {
        self.scroller.set_y(y);
        let ctx = RenderContext::new(&self.store, &self.columns);
        self.rows.update_rendered_rows(ctx, self.scroller.y);
        self.scroll_settle.call((), now_ms);
        self.sync()
    }

    pub fn scroll_by(&mut self, delta_y: f64, now_ms: f64) -> Vec<RowManagerEvent> {
        let y = self.scroller.y + delta_y;
        self.scroll_to(y, now_ms)
    }

    /// Scroll one region horizontally.
    pub fn scroll_region_x(&mut self, region: Region, x: f64) {
        let content = self.layout.region_width(region);
        let viewport = self.region_viewport_width(region);
        self.scroller.set_x(region, x, content, viewport);
    }

    /// Buffer a viewport resize until the size stops changing.
    pub fn resize(&mut self, width: f64, height: f64, now_ms: f64) {
        self.resize.call((width, height), now_ms);
    }

    /// Apply a resize immediately.
    pub fn resize_now(&mut self, width: f64, height: f64) -> Vec<RowManagerEvent> {
        self.resize.cancel();
        self.apply_resize(width, height)
    }

    fn apply_resize(&mut self, width: f64, height: f64) -> Vec<RowManagerEvent> {
        tracing::debug!(width, height, "viewport resized");
        self.scroller.resize(width, height);
        for region in Region::ALL {
            let x = self.scroller.x(region);
            self.scroll_region_x(region, x);
        }
        let ctx = RenderContext::new(&self.store, &self.columns);
        self.rows.set_view_height(ctx, self.scroller.client_height);
        self.sync()
    }

    /// Run buffered work whose delay has elapsed.
    pub fn tick(&mut self, now_ms: f64) -> Vec<RowManagerEvent> {
        let mut events = Vec::new();
        if let Some((width, height)) = self.resize.poll(now_ms) {
            events.extend(self.apply_resize(width, height));
        }
        if self.scroll_settle.poll(now_ms).is_some() {
            // Scrolling stopped: settle drift against what was measured meanwhile.
            let ctx = RenderContext::new(&self.store, &self.columns);
            self.rows.correct_error(ctx);
            self.rows.estimate_total_height(ctx);
            events.extend(self.sync());
        }
        events
    }

    /// Whether buffered work is waiting for [`Grid::tick`].
    pub fn has_pending_work(&self) -> bool {
        self.resize.is_pending() || self.scroll_settle.is_pending()
    }
}
