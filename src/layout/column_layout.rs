//! Pre-computed horizontal layout of the visible columns, per region.
//!
//! Column positions are computed once per column-store generation, enabling
//! O(log n) hit testing with a binary search.

use crate::columns::{ColumnStore, Region};

/// Layout of one region's visible columns.
#[derive(Clone, Debug)]
pub struct RegionLayout {
    pub region: Region,
    /// Visible column ids in render order
    pub column_ids: Vec<String>,
    /// Cumulative positions (`col_positions[i]` = x of column i's left edge), plus the final edge
    pub col_positions: Vec<f64>,
    pub col_widths: Vec<f64>,
}

impl RegionLayout {
    /// Find the column at x (binary search). `None` past the last edge.
    pub fn col_at_x(&self, x: f64) -> Option<usize> {
        if x < 0.0 || x >= self.total_width() || self.col_widths.is_empty() {
            return None;
        }
        let i = match self
            .col_positions
            .binary_search_by(|pos| pos.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal))
        {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        Some(i.min(self.col_widths.len() - 1))
    }

    /// Total width of the region's columns.
    pub fn total_width(&self) -> f64 {
        self.col_positions.last().copied().unwrap_or(0.0)
    }

    /// Left edge and width of a column by id.
    pub fn column_rect(&self, id: &str) -> Option<(f64, f64)> {
        let i = self.column_ids.iter().position(|c| c == id)?;
        Some((*self.col_positions.get(i)?, *self.col_widths.get(i)?))
    }
}

/// Layout of all regions.
#[derive(Clone, Debug, Default)]
pub struct ColumnLayout {
    pub regions: Vec<RegionLayout>,
    /// Column store generation this layout was built from
    pub generation: u64,
}

impl ColumnLayout {
    pub fn new(columns: &ColumnStore) -> Self {
        let regions = columns
            .regions()
            .into_iter()
            .map(|region| {
                let mut column_ids = Vec::new();
                let mut col_positions = Vec::new();
                let mut col_widths = Vec::new();
                let mut x = 0.0;
                for col in columns.visible_in_region(region) {
                    col_positions.push(x);
                    col_widths.push(col.width);
                    column_ids.push(col.id.clone());
                    x += col.width;
                }
                col_positions.push(x); // Final edge
                RegionLayout {
                    region,
                    column_ids,
                    col_positions,
                    col_widths,
                }
            })
            .collect();
        Self {
            regions,
            generation: columns.generation(),
        }
    }

    pub fn region(&self, region: Region) -> Option<&RegionLayout> {
        self.regions.iter().find(|r| r.region == region)
    }

    /// Column id at x within a region.
    pub fn column_at(&self, region: Region, x: f64) -> Option<&str> {
        let layout = self.region(region)?;
        let i = layout.col_at_x(x)?;
        layout.column_ids.get(i).map(String::as_str)
    }

    /// Width of a region's content (0 for absent regions).
    pub fn region_width(&self, region: Region) -> f64 {
        self.region(region).map_or(0.0, RegionLayout::total_width)
    }

    /// Sum of all region widths.
    pub fn total_width(&self) -> f64 {
        self.regions.iter().map(RegionLayout::total_width).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::columns::{ColumnConfig, ColumnTypeRegistry};

    fn layout() -> ColumnLayout {
        let configs = vec![
            ColumnConfig::field("id").in_region(Region::Locked).with_width(50.0),
            ColumnConfig::field("name").with_width(120.0),
            ColumnConfig::field("city").with_width(80.0),
        ];
        let columns =
            ColumnStore::from_configs(&configs, &ColumnTypeRegistry::with_defaults()).unwrap();
        ColumnLayout::new(&columns)
    }

    #[test]
    fn test_region_widths() {
        let layout = layout();
        assert_eq!(layout.region_width(Region::Locked), 50.0);
        assert_eq!(layout.region_width(Region::Normal), 200.0);
        assert_eq!(layout.total_width(), 250.0);
    }

    #[test]
    fn test_column_at() {
        let layout = layout();
        assert_eq!(layout.column_at(Region::Normal, 0.0), Some("name"));
        assert_eq!(layout.column_at(Region::Normal, 119.9), Some("name"));
        assert_eq!(layout.column_at(Region::Normal, 120.0), Some("city"));
        assert_eq!(layout.column_at(Region::Normal, 200.0), None);
        assert_eq!(layout.column_at(Region::Locked, 10.0), Some("id"));
        assert_eq!(
            layout.region(Region::Normal).unwrap().column_rect("city"),
            Some((120.0, 80.0))
        );
    }
}
