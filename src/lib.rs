//! vgrid - virtualized data-grid row engine
//!
//! Renders a window of recycled rows over stores of any size:
//! - Fixed pool of row slots, rotated top/bottom while scrolling
//! - Exact pixel math for fixed row heights, estimation for variable ones
//! - Warping for long jumps (scrollbar drags) instead of walking every row
//! - Lazy (row, column) locations that survive inserts, removals and sorting
//! - Locked/normal column regions sharing one row pool
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { GridView } from 'vgrid';
//! await init();
//! const grid = new GridView(JSON.stringify({ rowHeight: 30, columns: [{ field: 'name' }] }));
//! grid.load(records);
//! const events = grid.scroll_to(1200);
//! paint(grid.snapshot());
//! ```

pub mod columns;
pub mod error;
pub mod grid;
pub mod layout;
pub mod location;
pub mod row;
pub mod row_manager;
pub mod store;
pub mod types;
pub mod viewer;

use wasm_bindgen::prelude::*;

// Re-export the main grid types
pub use error::{GridError, Result};
pub use grid::{Grid, GridState, Navigation, SelectionConfig, StatePersistence, SubGridLayout};
pub use location::{Direction, Location};
pub use row::Row;
pub use row_manager::{RenderContext, RowManager, RowManagerEvent};
pub use store::{ArrayStore, Store, StoreChange};
pub use viewer::GridView;

pub use types::*;

/// Validate a grid config and return it normalized as JSON.
///
/// # Errors
/// Returns an error if the JSON is malformed or the config is invalid.
#[wasm_bindgen]
pub fn normalize_config(json: &str) -> std::result::Result<String, JsValue> {
    let config = GridConfig::from_json(json)?;
    serde_json::to_string(&config)
        .map_err(|e| JsValue::from_str(&format!("JSON serialization error: {e}")))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
