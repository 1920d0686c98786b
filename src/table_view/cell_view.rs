use datatable_core::column::CellAlign;
use datatable_core::render::BodyCell;
use egui::{Align, Color32, Label, Layout, Response, RichText, Ui, Widget};

pub(super) fn show_cell(
    ui: &mut Ui,
    cell: &BodyCell,
    color: Option<Color32>,
    tooltip: Option<&str>,
) -> Response {
    let mut text = RichText::new(cell.text.as_str());
    if let Some(color) = color {
        text = text.color(color);
    }
    let label = Label::new(text).truncate().selectable(false);
    let resp = match cell.align {
        CellAlign::Left => label.ui(ui),
        CellAlign::Center => ui
            .with_layout(Layout::centered_and_justified(egui::Direction::LeftToRight), |ui| {
                label.ui(ui)
            })
            .inner,
        CellAlign::Right => ui
            .with_layout(Layout::right_to_left(Align::Center), |ui| label.ui(ui))
            .inner,
    };
    match tooltip {
        Some(tooltip) if !tooltip.is_empty() => resp.on_hover_text(tooltip),
        _ => resp,
    }
}

/// Footer cells are drawn strong so they read apart from the last body row.
pub(super) fn show_footer_cell(ui: &mut Ui, text: &str, align: CellAlign) {
    let label = Label::new(RichText::new(text).strong()).truncate().selectable(false);
    match align {
        CellAlign::Right => {
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| label.ui(ui));
        }
        _ => {
            label.ui(ui);
        }
    }
}
