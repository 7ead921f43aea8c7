//! Capability traits implemented by [`Grid`].
//!
//! Each trait is one feature boundary consumed by surrounding UI code:
//! keyboard navigation, selection configuration, state persistence and
//! locked/normal sub-grid layout.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Grid;
use crate::columns::Region;
use crate::error::Result;
use crate::location::{Direction, Location};
use crate::row_manager::RenderContext;
use crate::types::SelectionMode;

/// Keyboard-style movement over cells.
pub trait Navigation {
    fn focused(&self) -> Option<&Location>;

    /// Focus a location and scroll it into view. Returns `false` if it does not resolve.
    fn focus(&mut self, location: Location) -> bool;

    /// Move the focus one step. Returns the new focus.
    fn navigate(&mut self, direction: Direction) -> Option<Location>;

    /// Scroll until the location's row is fully visible. Returns the new scroll position.
    fn scroll_into_view(&mut self, location: &Location) -> f64;
}

/// Validated selection mode writes.
pub trait SelectionConfig {
    fn selection_mode(&self) -> &SelectionMode;

    /// Set one option by name; dependent options are normalized.
    fn set_selection_option(&mut self, name: &str, value: &Value) -> Result<()>;
}

/// Serializable grid state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridState {
    pub scroll_top: f64,
    pub scroll_x: BTreeMap<Region, f64>,
    pub hidden_columns: Vec<String>,
    pub column_widths: BTreeMap<String, f64>,
    pub selection_mode: SelectionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused: Option<Location>,
}

/// Save and restore user-visible state.
pub trait StatePersistence {
    fn state(&self) -> GridState;
    fn apply_state(&mut self, state: &GridState) -> Result<()>;
}

/// Locked/normal region geometry.
pub trait SubGridLayout {
    /// Regions with at least one visible column, left to right.
    fn regions(&self) -> Vec<Region>;

    /// Content width of a region's columns.
    fn region_width(&self, region: Region) -> f64;

    /// Cell under a viewport point.
    fn hit_test(&self, x: f64, y: f64) -> Option<Location>;
}

impl Navigation for Grid {
    fn focused(&self) -> Option<&Location> {
        self.focused.as_ref()
    }

    fn focus(&mut self, location: Location) -> bool {
        let ctx = self.location_context();
        if location.row_index(&ctx).is_none() || location.column_index(&ctx).is_none() {
            return false;
        }
        self.scroll_into_view(&location);
        self.focused = Some(location);
        true
    }

    fn navigate(&mut self, direction: Direction) -> Option<Location> {
        let ctx = self.location_context();
        let current = match &self.focused {
            Some(location) if location.row_index(&ctx).is_some() => location.clone(),
            // Start from the first cell when nothing valid has focus.
            _ => Location::at(0, 0).move_to(Direction::FirstCell, &ctx),
        };
        let next = current.move_to(direction, &ctx);
        tracing::trace!(?direction, ?next, "navigate");
        if !self.focus(next.clone()) {
            return None;
        }
        Some(next)
    }

    fn scroll_into_view(&mut self, location: &Location) -> f64 {
        let ctx = self.location_context();
        let Some(index) = location
            .row_index(&ctx)
            .and_then(|i| usize::try_from(i).ok())
        else {
            // Header row or unresolvable location.
            return self.scroller.y;
        };
        let render = RenderContext::new(&self.store, &self.columns);
        self.rows.scroll_row_into_view(render, index);
        self.sync();
        self.scroller.set_y(self.rows.scroll_top());
        self.scroller.y
    }
}

impl SelectionConfig for Grid {
    fn selection_mode(&self) -> &SelectionMode {
        &self.selection
    }

    fn set_selection_option(&mut self, name: &str, value: &Value) -> Result<()> {
        self.selection.set_option(name, value)?;
        tracing::debug!(name, %value, "selection option set");
        Ok(())
    }
}

impl StatePersistence for Grid {
    fn state(&self) -> GridState {
        let column_widths = self
            .columns
            .all_columns()
            .into_iter()
            .filter(|c| c.is_leaf())
            .map(|c| (c.id.clone(), c.width))
            .collect();
        GridState {
            scroll_top: self.scroller.y,
            scroll_x: Region::ALL
                .into_iter()
                .map(|r| (r, self.scroller.x(r)))
                .collect(),
            hidden_columns: self.columns.hidden_ids(),
            column_widths,
            selection_mode: self.selection.clone(),
            focused: self.focused.clone(),
        }
    }

    fn apply_state(&mut self, state: &GridState) -> Result<()> {
        let mut changed = false;
        let ids: Vec<String> = self
            .columns
            .all_columns()
            .into_iter()
            .map(|c| c.id.clone())
            .collect();
        for id in ids {
            changed |= self
                .columns
                .set_hidden(&id, state.hidden_columns.contains(&id));
        }
        for (id, width) in &state.column_widths {
            changed |= self.columns.set_width(id, *width);
        }
        if changed {
            self.columns_changed();
        }
        let mut selection = state.selection_mode.clone();
        selection.normalize();
        self.selection = selection;
        for (region, x) in &state.scroll_x {
            self.scroll_region_x(*region, *x);
        }
        self.scroller.set_y(state.scroll_top);
        let render = RenderContext::new(&self.store, &self.columns);
        self.rows.update_rendered_rows(render, self.scroller.y);
        self.sync();
        self.focused = state.focused.clone();
        Ok(())
    }
}

impl SubGridLayout for Grid {
    fn regions(&self) -> Vec<Region> {
        self.columns.regions()
    }

    fn region_width(&self, region: Region) -> f64 {
        self.layout.region_width(region)
    }

    fn hit_test(&self, x: f64, y: f64) -> Option<Location> {
        if x < 0.0 || y < 0.0 || x >= self.scroller.client_width || y >= self.scroller.client_height
        {
            return None;
        }
        let locked_width = self.layout.region_width(Region::Locked);
        let (region, region_x) = if x < locked_width {
            (Region::Locked, x)
        } else {
            (Region::Normal, x - locked_width)
        };
        let column = self
            .layout
            .column_at(region, region_x + self.scroller.x(region))?;
        let row = self.rows.row_at(self.scroller.to_content(y))?;
        Some(Location::for_record(row.id()?.clone(), column))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::columns::{ColumnConfig, ColumnTypeRegistry};
    use crate::types::{GridConfig, Record, RecordId};
    use serde_json::json;

    fn grid() -> Grid {
        let config = GridConfig {
            columns: vec![
                ColumnConfig::field("id").in_region(Region::Locked).with_width(50.0),
                ColumnConfig::field("name").with_width(300.0),
                ColumnConfig::field("city").with_width(300.0),
            ],
            view_height: 300.0,
            view_width: 400.0,
            ..GridConfig::default()
        };
        let records = (0..500).map(|i| Record::new(i).with("id", i)).collect();
        Grid::new(config, &ColumnTypeRegistry::with_defaults(), records).unwrap()
    }

    #[test]
    fn test_navigate_down_scrolls() {
        let mut grid = grid();
        grid.focus(Location::for_record(8, "name"));
        for _ in 0..5 {
            grid.navigate(Direction::Down);
        }
        assert_eq!(grid.focused(), Some(&Location::for_record(13, "name")));
        // Row 13 ends at 420; the viewport must reach down to it.
        assert_eq!(grid.scroller().y, 120.0);
    }

    #[test]
    fn test_selection_option_normalizes() {
        let mut grid = grid();
        grid.set_selection_option("showCheckAll", &json!(true)).unwrap();
        assert!(grid.selection_mode().checkbox);
        assert!(grid.selection_mode().row);
        assert!(grid.set_selection_option("bogus", &json!(true)).is_err());
    }

    #[test]
    fn test_state_round_trip() {
        let mut grid = grid();
        grid.scroll_to(900.0, 0.0);
        grid.scroll_region_x(Region::Normal, 120.0);
        grid.set_column_hidden("city", true);
        let state = grid.state();
        let json = serde_json::to_string(&state).unwrap();

        let mut restored = self::grid();
        restored.apply_state(&serde_json::from_str(&json).unwrap()).unwrap();
        assert_eq!(restored.state(), state);
        assert_eq!(restored.row_manager().top_index(), grid.row_manager().top_index());
    }

    #[test]
    fn test_state_restores_hidden_child_columns() {
        fn grouped() -> Grid {
            let config = GridConfig {
                columns: vec![
                    ColumnConfig::field("name"),
                    ColumnConfig {
                        text: "Contact".to_string(),
                        children: vec![ColumnConfig::field("email"), ColumnConfig::field("phone")],
                        ..ColumnConfig::default()
                    },
                ],
                view_height: 300.0,
                ..GridConfig::default()
            };
            let records = (0..50).map(|i| Record::new(i).with("name", i)).collect();
            Grid::new(config, &ColumnTypeRegistry::with_defaults(), records).unwrap()
        }

        let mut grid = grouped();
        grid.set_column_width("email", 120.0);
        grid.set_column_hidden("email", true);
        let state = grid.state();
        assert_eq!(state.hidden_columns, vec!["email".to_string()]);
        assert_eq!(state.column_widths.get("email"), Some(&120.0));

        let mut restored = grouped();
        restored.apply_state(&state).unwrap();
        assert_eq!(restored.columns().hidden_ids(), vec!["email".to_string()]);
        assert_eq!(restored.columns().get("email").map(|c| c.width), Some(120.0));
        assert_eq!(restored.state(), state);

        let visible: Vec<&str> = restored.columns().visible_columns().map(|c| c.id.as_str()).collect();
        assert_eq!(visible, vec!["name", "phone"]);
    }

    #[test]
    fn test_hit_test_respects_regions() {
        let mut grid = grid();
        assert_eq!(grid.regions(), vec![Region::Locked, Region::Normal]);
        assert_eq!(grid.hit_test(10.0, 40.0), Some(Location::for_record(1, "id")));
        assert_eq!(grid.hit_test(60.0, 0.0), Some(Location::for_record(0, "name")));
        // Clamped to the 600px of normal content minus its 350px viewport.
        grid.scroll_region_x(Region::Normal, 300.0);
        assert_eq!(grid.scroller().x(Region::Normal), 250.0);
        assert_eq!(grid.hit_test(110.0, 0.0), Some(Location::for_record(0, "city")));
        assert_eq!(grid.hit_test(500.0, 0.0), None);
        assert!(grid.hit_test(10.0, 40.0).unwrap().equals_shallow(&Location::for_record(RecordId::Int(1), "id")));
    }
}
