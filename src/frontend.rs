use datatable_core::interaction::RowHandler;
use datatable_core::CellCoord;
use egui::{Color32, Ui};

/// Caller side of a [`crate::TableView`]: row interaction hooks plus optional decoration.
pub trait TableFrontend<R>: RowHandler<R> {
    /// Context menu of a body row. Close the menu with `ui.close_menu()` once an entry
    /// was used.
    fn row_context_menu(&mut self, row: &R, ui: &mut Ui) {
        let _ = (row, ui);
    }

    /// Override default cell color
    fn cell_color(&self, _row: &R, _coord: &CellCoord) -> Option<Color32> {
        None
    }

    /// Show tooltip on cell hover
    fn cell_tooltip(&self, _row: &R, _coord: &CellCoord) -> Option<String> {
        None
    }

    /// Custom content at the start of the toolbar.
    fn left_toolbar_ui(&mut self, _ui: &mut Ui) {}

    /// Custom content at the end of the toolbar.
    fn right_toolbar_ui(&mut self, _ui: &mut Ui) {}
}

impl<R> TableFrontend<R> for () {}
