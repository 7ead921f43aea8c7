use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GridError, Result};

/// Selection behaviour options consumed by the selection feature.
///
/// Writes go through [`SelectionMode::set_option`], which keeps dependent
/// options consistent (e.g. enabling checkboxes turns on row selection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectionMode {
    /// Whole rows can be selected
    pub row: bool,
    /// Individual cells can be selected
    pub cell: bool,
    /// More than one row/cell may be selected at a time
    pub multi_select: bool,
    /// A checkbox column drives row selection
    pub checkbox: bool,
    /// Header checkbox selecting every row
    pub show_check_all: bool,
    /// Only the checkbox toggles selection; clicking the row does not
    pub row_checkbox_selection: bool,
    /// Mouse drag extends the selection
    pub drag_select: bool,
    /// Clicking a selected row deselects it
    pub deselect_on_click: bool,
    /// Drop selected records that get filtered out
    pub deselect_filtered_out_records: bool,
    /// Keep selection across a dataset reload
    pub preserve_selection_on_dataset_change: bool,
}

impl Default for SelectionMode {
    fn default() -> Self {
        Self {
            row: true,
            cell: true,
            multi_select: true,
            checkbox: false,
            show_check_all: false,
            row_checkbox_selection: false,
            drag_select: false,
            deselect_on_click: false,
            deselect_filtered_out_records: false,
            preserve_selection_on_dataset_change: true,
        }
    }
}

impl SelectionMode {
    /// Set one option by its camelCase name and normalize dependents.
    pub fn set_option(&mut self, name: &str, value: &Value) -> Result<()> {
        let Some(flag) = value.as_bool() else {
            return Err(GridError::SelectionOption {
                name: name.to_string(),
                reason: format!("expected a boolean, got {value}"),
            });
        };
        match name {
            "row" => self.row = flag,
            "cell" => self.cell = flag,
            "multiSelect" => self.multi_select = flag,
            "checkbox" => self.checkbox = flag,
            "showCheckAll" => self.show_check_all = flag,
            "rowCheckboxSelection" => self.row_checkbox_selection = flag,
            "dragSelect" => self.drag_select = flag,
            "deselectOnClick" => self.deselect_on_click = flag,
            "deselectFilteredOutRecords" => self.deselect_filtered_out_records = flag,
            "preserveSelectionOnDatasetChange" => self.preserve_selection_on_dataset_change = flag,
            _ => {
                return Err(GridError::SelectionOption {
                    name: name.to_string(),
                    reason: "unknown option".to_string(),
                })
            }
        }
        self.normalize_after(name, flag);
        Ok(())
    }

    /// Apply the implication rules to a mode built without [`Self::set_option`],
    /// e.g. one deserialized from JSON.
    pub fn normalize(&mut self) {
        self.normalize_after("", true);
    }

    fn normalize_after(&mut self, changed: &str, flag: bool) {
        // Switching an option off takes its dependents with it.
        if !flag {
            match changed {
                "checkbox" => {
                    self.row_checkbox_selection = false;
                    self.show_check_all = false;
                }
                "multiSelect" => {
                    self.show_check_all = false;
                    self.drag_select = false;
                }
                _ => {}
            }
        }
        if self.row_checkbox_selection || self.show_check_all {
            self.checkbox = true;
        }
        // Checkbox selection selects rows, so cell-only selection is off the table.
        if self.checkbox {
            self.row = true;
        }
        if self.show_check_all || self.drag_select {
            self.multi_select = true;
        }
        if !self.row && !self.cell {
            self.row = true;
        }
    }

    /// Only cells are selectable.
    pub fn is_cell_exclusive(&self) -> bool {
        self.cell && !self.row
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checkbox_implies_row() {
        let mut mode = SelectionMode::default();
        mode.set_option("row", &json!(false)).unwrap();
        assert!(mode.is_cell_exclusive());
        mode.set_option("checkbox", &json!(true)).unwrap();
        assert!(mode.row);
        assert!(!mode.is_cell_exclusive());
    }

    #[test]
    fn test_show_check_all_pulls_in_dependents() {
        let mut mode = SelectionMode {
            multi_select: false,
            ..SelectionMode::default()
        };
        mode.set_option("showCheckAll", &json!(true)).unwrap();
        assert!(mode.checkbox);
        assert!(mode.multi_select);
        mode.set_option("checkbox", &json!(false)).unwrap();
        assert!(!mode.show_check_all);
    }

    #[test]
    fn test_cannot_disable_both_row_and_cell() {
        let mut mode = SelectionMode::default();
        mode.set_option("row", &json!(false)).unwrap();
        mode.set_option("cell", &json!(false)).unwrap();
        assert!(mode.row);
    }

    #[test]
    fn test_rejects_unknown_and_non_bool() {
        let mut mode = SelectionMode::default();
        assert!(mode.set_option("lasso", &json!(true)).is_err());
        assert!(mode.set_option("row", &json!("yes")).is_err());
    }
}
