use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableViewConfig {
    pub row_height: f32,
    pub header_height: f32,
    /// Body height while the table is in scrollable mode. Otherwise the table grows
    /// with its rows.
    pub max_height: f32,
    pub striped: bool,
    /// Double click on an editable column opens its editor instead of firing the row
    /// double click.
    pub editable_cells: bool,
    /// Reorder columns by dragging their headers.
    pub enable_column_drag: bool,
    pub empty_text: String,
}

impl Default for TableViewConfig {
    fn default() -> Self {
        TableViewConfig {
            row_height: 24.0,
            header_height: 22.0,
            max_height: 480.0,
            striped: true,
            editable_cells: true,
            enable_column_drag: true,
            empty_text: "No results.".into(),
        }
    }
}

impl super::TableView {
    pub fn config(&self) -> &TableViewConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TableViewConfig {
        &mut self.config
    }
}
