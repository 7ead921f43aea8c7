//! `GridView` - the WASM-exported facade over [`Grid`].
//!
//! JavaScript hosts drive the grid with JSON configs, plain record objects and
//! scroll/resize notifications, and read back row manager events and window
//! snapshots to paint. Buffered work (resize, scroll settle) runs when the
//! host calls `tick`, typically from `requestAnimationFrame`.

use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::columns::Region;
use crate::error::GridError;
use crate::grid::{Grid, Navigation, SelectionConfig, StatePersistence, SubGridLayout};
use crate::location::Direction;
use crate::types::{Record, RecordId};

/// Grid handle exported to JavaScript.
#[wasm_bindgen]
pub struct GridView {
    grid: Grid,
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

fn parse_direction(direction: &str) -> Result<Direction, GridError> {
    Ok(serde_json::from_value(Value::String(direction.to_string()))?)
}

#[wasm_bindgen]
impl GridView {
    /// Create a grid from a JSON config (row manager options, columns, viewport size).
    ///
    /// # Errors
    /// Returns an error for malformed JSON, invalid options or unknown column types.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<GridView, JsValue> {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();
        let grid = Grid::from_json(config_json)?;
        Ok(Self { grid })
    }

    /// Replace all records with an array of record objects.
    ///
    /// # Errors
    /// Returns an error if `records` is not an array of records.
    pub fn load(&mut self, records: JsValue) -> Result<JsValue, JsValue> {
        let records: Vec<Record> = serde_wasm_bindgen::from_value(records)?;
        let events = self.grid.load(records);
        to_js(&events)
    }

    /// Replace all records from a JSON array.
    ///
    /// # Errors
    /// Returns an error for malformed JSON.
    pub fn load_json(&mut self, json: &str) -> Result<usize, JsValue> {
        let records: Vec<Record> = serde_json::from_str(json).map_err(GridError::from)?;
        let count = records.len();
        self.grid.load(records);
        Ok(count)
    }

    /// # Errors
    /// Returns an error if the events cannot be serialized.
    pub fn scroll_to(&mut self, y: f64) -> Result<JsValue, JsValue> {
        let events = self.grid.scroll_to(y, now_ms());
        to_js(&events)
    }

    /// # Errors
    /// Returns an error if the events cannot be serialized.
    pub fn scroll_by(&mut self, delta_y: f64) -> Result<JsValue, JsValue> {
        let events = self.grid.scroll_by(delta_y, now_ms());
        to_js(&events)
    }

    /// Scroll the locked (`"locked"`) or normal (`"normal"`) region horizontally.
    pub fn scroll_region_x(&mut self, region: &str, x: f64) {
        let region = if region == "locked" {
            Region::Locked
        } else {
            Region::Normal
        };
        self.grid.scroll_region_x(region, x);
    }

    /// Buffer a viewport resize; it is applied by a later `tick`.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.grid.resize(width, height, now_ms());
    }

    /// Run buffered work whose delay elapsed.
    ///
    /// # Errors
    /// Returns an error if the events cannot be serialized.
    pub fn tick(&mut self) -> Result<JsValue, JsValue> {
        let events = self.grid.tick(now_ms());
        to_js(&events)
    }

    pub fn has_pending_work(&self) -> bool {
        self.grid.has_pending_work()
    }

    pub fn total_height(&self) -> f64 {
        self.grid.row_manager().total_height()
    }

    /// # Errors
    /// Returns an error if the snapshot cannot be serialized.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.grid.snapshot())
    }

    /// # Errors
    /// Returns an error if the snapshot cannot be serialized.
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        Ok(serde_json::to_string(&self.grid.snapshot()).map_err(GridError::from)?)
    }

    /// # Errors
    /// Returns an error for unknown options or non-boolean values.
    pub fn set_selection_option(&mut self, name: &str, value: JsValue) -> Result<(), JsValue> {
        let value: Value = serde_wasm_bindgen::from_value(value)?;
        self.grid.set_selection_option(name, &value)?;
        Ok(())
    }

    /// Move the focused cell (`"up"`, `"nextCell"`, `"nextPage"`, ...).
    ///
    /// # Errors
    /// Returns an error for unknown directions.
    pub fn navigate(&mut self, direction: &str) -> Result<JsValue, JsValue> {
        let direction = parse_direction(direction)?;
        let focused = self.grid.navigate(direction);
        to_js(&focused)
    }

    /// # Errors
    /// Returns an error if the location cannot be serialized.
    pub fn hit_test(&self, x: f64, y: f64) -> Result<JsValue, JsValue> {
        to_js(&self.grid.hit_test(x, y))
    }

    pub fn set_column_hidden(&mut self, id: &str, hidden: bool) {
        self.grid.set_column_hidden(id, hidden);
    }

    pub fn set_column_width(&mut self, id: &str, width: f64) {
        self.grid.set_column_width(id, width);
    }

    /// Set one field of a record identified by a numeric or string id.
    ///
    /// # Errors
    /// Returns an error if `id` or `value` are not JSON values.
    pub fn update(&mut self, id: JsValue, field: &str, value: JsValue) -> Result<(), JsValue> {
        let id: RecordId = serde_wasm_bindgen::from_value(id)?;
        let value: Value = serde_wasm_bindgen::from_value(value)?;
        self.grid.update(&id, field, value);
        Ok(())
    }

    /// # Errors
    /// Returns an error if the state cannot be serialized.
    pub fn state_json(&self) -> Result<String, JsValue> {
        Ok(serde_json::to_string(&self.grid.state()).map_err(GridError::from)?)
    }

    /// # Errors
    /// Returns an error for malformed state JSON.
    pub fn apply_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state = serde_json::from_str(json).map_err(GridError::from)?;
        self.grid.apply_state(&state)?;
        Ok(())
    }
}

impl GridView {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }
}

/// Milliseconds from a monotonic-enough clock, used to drive debouncers.
#[cfg(target_arch = "wasm32")]
pub(crate) fn now_ms() -> f64 {
    if let Some(window) = web_sys::window() {
        if let Some(perf) = window.performance() {
            return perf.now();
        }
    }
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0.0, |d| d.as_secs_f64() * 1000.0)
}
