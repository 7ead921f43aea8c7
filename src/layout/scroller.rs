//! Scroll geometry shared by all regions of a grid.

use std::collections::BTreeMap;

use crate::columns::Region;

/// Vertical scroll state plus one horizontal offset per region.
#[derive(Clone, Debug)]
pub struct Scroller {
    /// Vertical scroll position in content coordinates
    pub y: f64,
    /// Viewport height in pixels
    pub client_height: f64,
    /// Viewport width in pixels
    pub client_width: f64,
    /// Scrollable content height, driven by the row manager's estimate
    scroll_height: f64,
    /// Horizontal scroll per region
    x: BTreeMap<Region, f64>,
}

impl Default for Scroller {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl Scroller {
    pub fn new(client_width: f64, client_height: f64) -> Self {
        Self {
            y: 0.0,
            client_height: client_height.max(0.0),
            client_width: client_width.max(0.0),
            scroll_height: 0.0,
            x: BTreeMap::new(),
        }
    }

    pub fn scroll_height(&self) -> f64 {
        self.scroll_height
    }

    /// Publish a new content height; the scroll position is re-clamped.
    pub fn set_scroll_height(&mut self, height: f64) {
        self.scroll_height = height.max(0.0);
        self.clamp_scroll();
    }

    /// Largest valid vertical scroll position.
    pub fn max_y(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    /// Clamp the vertical position to `[0, max_y]`.
    pub fn clamp_scroll(&mut self) {
        self.y = self.y.clamp(0.0, self.max_y());
    }

    /// Scroll by a delta. Returns the delta actually applied.
    pub fn scroll_by(&mut self, delta_y: f64) -> f64 {
        let before = self.y;
        self.y += delta_y;
        self.clamp_scroll();
        self.y - before
    }

    /// Set the absolute vertical position.
    pub fn set_y(&mut self, y: f64) {
        self.y = y;
        self.clamp_scroll();
    }

    /// Resize the viewport.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.client_width = width.max(0.0);
        self.client_height = height.max(0.0);
        self.clamp_scroll();
    }

    /// Horizontal position of one region.
    pub fn x(&self, region: Region) -> f64 {
        self.x.get(&region).copied().unwrap_or(0.0)
    }

    /// Set a region's horizontal position, clamped to its scrollable width.
    pub fn set_x(&mut self, region: Region, x: f64, content_width: f64, region_width: f64) {
        let max_x = (content_width - region_width).max(0.0);
        self.x.insert(region, x.clamp(0.0, max_x));
    }

    /// Content y to viewport y.
    pub fn to_screen(&self, y: f64) -> f64 {
        y - self.y
    }

    /// Viewport y to content y.
    pub fn to_content(&self, screen_y: f64) -> f64 {
        screen_y + self.y
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_to_scroll_height() {
        let mut scroller = Scroller::new(800.0, 600.0);
        scroller.set_scroll_height(3000.0);
        scroller.set_y(5000.0);
        assert_eq!(scroller.y, 2400.0);
        assert_eq!(scroller.scroll_by(-3000.0), -2400.0);
        assert_eq!(scroller.y, 0.0);
    }

    #[test]
    fn test_shrinking_content_pulls_scroll_back() {
        let mut scroller = Scroller::new(800.0, 600.0);
        scroller.set_scroll_height(3000.0);
        scroller.set_y(2400.0);
        scroller.set_scroll_height(1000.0);
        assert_eq!(scroller.y, 400.0);
        scroller.set_scroll_height(100.0);
        assert_eq!(scroller.y, 0.0);
    }

    #[test]
    fn test_region_x_is_independent() {
        let mut scroller = Scroller::default();
        scroller.set_x(Region::Normal, 150.0, 1000.0, 400.0);
        scroller.set_x(Region::Locked, 900.0, 300.0, 200.0);
        assert_eq!(scroller.x(Region::Normal), 150.0);
        assert_eq!(scroller.x(Region::Locked), 100.0);
        assert_eq!(scroller.to_content(scroller.to_screen(42.0)), 42.0);
    }
}
