//! Serde-backed configuration for the row manager and the grid.

use serde::{Deserialize, Serialize};

use crate::columns::ColumnConfig;
use crate::error::{GridError, Result};
use crate::types::SelectionMode;

/// Default row height in pixels
pub const DEFAULT_ROW_HEIGHT: f64 = 30.0;

/// Rows rendered above/below the viewport by default
pub const DEFAULT_ROW_BUFFER: usize = 5;

/// Delay (ms) after the last scroll/resize before a buffered refresh runs.
pub const DEFAULT_SETTLE_DELAY_MS: f64 = 100.0;

/// Row manager tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RowManagerConfig {
    /// Configured row height (content box, excluding border)
    pub row_height: f64,
    /// Lower bound for variable row heights; defaults to `row_height`
    pub min_row_height: Option<f64>,
    /// Border added to every row's height to get its offset height
    pub border_height: f64,
    /// Rows rendered above the viewport
    pub prepend_row_buffer: usize,
    /// Rows rendered below the viewport
    pub append_row_buffer: usize,
    /// All rows share `row_height`; enables exact index/pixel math
    pub fixed_row_height: bool,
    /// Scroll jumps larger than this many rendered-window heights are warped
    pub warp_factor: f64,
    /// Drift is corrected while the window is within this many viewports of the top
    pub edge_correction_factor: f64,
    /// Known heights needed before their average replaces `row_height` in estimates
    pub min_estimate_sample: usize,
}

impl Default for RowManagerConfig {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            min_row_height: None,
            border_height: 0.0,
            prepend_row_buffer: DEFAULT_ROW_BUFFER,
            append_row_buffer: DEFAULT_ROW_BUFFER,
            fixed_row_height: true,
            warp_factor: 3.0,
            edge_correction_factor: 2.0,
            min_estimate_sample: 10,
        }
    }
}

impl RowManagerConfig {
    /// Fixed-height config with the given row height.
    pub fn fixed(row_height: f64) -> Self {
        Self {
            row_height,
            ..Self::default()
        }
    }

    /// Variable-height config with the given default row height.
    pub fn variable(row_height: f64) -> Self {
        Self {
            row_height,
            fixed_row_height: false,
            ..Self::default()
        }
    }

    /// Builder-style buffer sizes.
    #[must_use]
    pub fn with_buffers(mut self, prepend: usize, append: usize) -> Self {
        self.prepend_row_buffer = prepend;
        self.append_row_buffer = append;
        self
    }

    /// Builder-style border height.
    #[must_use]
    pub fn with_border(mut self, border_height: f64) -> Self {
        self.border_height = border_height;
        self
    }

    /// Builder-style minimum row height.
    #[must_use]
    pub fn with_min_row_height(mut self, min: f64) -> Self {
        self.min_row_height = Some(min);
        self
    }

    /// Effective minimum content height of a row.
    pub fn min_row_height(&self) -> f64 {
        if self.fixed_row_height {
            return self.row_height;
        }
        self.min_row_height.unwrap_or(self.row_height)
    }

    /// Offset height of a row at the configured row height.
    pub fn row_offset_height(&self) -> f64 {
        self.row_height + self.border_height
    }

    /// Offset height of the smallest possible row.
    pub fn min_row_offset_height(&self) -> f64 {
        self.min_row_height() + self.border_height
    }

    /// Reject configs that would break index math.
    pub fn validate(&self) -> Result<()> {
        if !(self.row_height.is_finite() && self.row_height > 0.0) {
            return Err(GridError::Config(format!(
                "rowHeight must be positive, got {}",
                self.row_height
            )));
        }
        let min = self.min_row_height();
        if !(min.is_finite() && min > 0.0) {
            return Err(GridError::Config(format!(
                "minRowHeight must be positive, got {min}"
            )));
        }
        if !(self.border_height.is_finite() && self.border_height >= 0.0) {
            return Err(GridError::Config(format!(
                "borderHeight must be non-negative, got {}",
                self.border_height
            )));
        }
        if self.warp_factor < 1.0 {
            return Err(GridError::Config(format!(
                "warpFactor must be at least 1, got {}",
                self.warp_factor
            )));
        }
        Ok(())
    }
}

/// Top-level grid configuration, usually loaded from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    #[serde(flatten)]
    pub rows: RowManagerConfig,
    pub columns: Vec<ColumnConfig>,
    pub selection_mode: SelectionMode,
    /// Viewport height in pixels
    pub view_height: f64,
    /// Viewport width in pixels
    pub view_width: f64,
    /// Trailing-edge delay for buffered refreshes
    pub settle_delay_ms: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: RowManagerConfig::default(),
            columns: Vec::new(),
            selection_mode: SelectionMode::default(),
            view_height: 600.0,
            view_width: 800.0,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

impl GridConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GridConfig = serde_json::from_str(json)?;
        config.rows.validate()?;
        Ok(config)
    }
}
