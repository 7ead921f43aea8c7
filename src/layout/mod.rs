//! Geometry shared by the row manager and the grid.
//!
//! This module handles:
//! - Measured row heights and their running aggregates
//! - Prefix sums of exact row offsets once every height is measured
//! - Scroll state (vertical offset, per-region horizontal offsets, content height)
//! - Pre-computing column positions per region for hit testing

mod column_layout;
mod height_map;
mod row_offsets;
mod scroller;

pub use column_layout::{ColumnLayout, RegionLayout};
pub use height_map::HeightMap;
pub use row_offsets::RowOffsets;
pub use scroller::Scroller;
