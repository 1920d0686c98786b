use datatable_core::column::{EditInput, EditMeta};
use datatable_core::CellValue;
use egui::{ComboBox, Key, TextEdit, Ui, Widget};
use log::warn;

use super::state::EditingCell;

pub(super) enum EditOutcome {
    Pending,
    Commit(CellValue),
    Cancel,
}

pub(super) fn show_cell_editor(editing: &mut EditingCell, meta: &EditMeta, ui: &mut Ui) -> EditOutcome {
    if ui.input(|i| i.key_pressed(Key::Escape)) {
        return EditOutcome::Cancel;
    }
    let first_pass = std::mem::take(&mut editing.first_pass);
    match &meta.input {
        EditInput::Text | EditInput::Number => {
            let edit = TextEdit::singleline(&mut editing.text)
                .desired_width(f32::INFINITY)
                .ui(ui);
            if first_pass {
                edit.request_focus();
            }
            if !edit.lost_focus() {
                return EditOutcome::Pending;
            }
            match meta.input {
                EditInput::Number => match parse_number(&editing.text, &editing.buffer) {
                    Some(value) => EditOutcome::Commit(value),
                    None => {
                        warn!("not a number: {:?}, edit discarded", editing.text);
                        EditOutcome::Cancel
                    }
                },
                _ if editing.text.trim().is_empty() => EditOutcome::Commit(CellValue::Empty),
                _ => EditOutcome::Commit(CellValue::Str(editing.text.clone())),
            }
        }
        EditInput::Checkbox => {
            let mut checked = editing.buffer.as_bool().unwrap_or(false);
            if ui.checkbox(&mut checked, "").changed() {
                EditOutcome::Commit(CellValue::Bool(checked))
            } else if ui.input(|i| i.key_pressed(Key::Enter)) {
                EditOutcome::Cancel
            } else {
                EditOutcome::Pending
            }
        }
        EditInput::Select { options } => {
            let mut picked = None;
            ComboBox::from_id_salt(ui.id().with("cell_select"))
                .selected_text(editing.text.as_str())
                .width(ui.available_width())
                .show_ui(ui, |ui| {
                    for option in options {
                        if ui
                            .selectable_label(&editing.text == option, option.as_str())
                            .clicked()
                        {
                            picked = Some(option.clone());
                        }
                    }
                });
            match picked {
                Some(option) => EditOutcome::Commit(CellValue::Str(option)),
                None => EditOutcome::Pending,
            }
        }
    }
}

/// Keeps integers integral when the edited value was one.
fn parse_number(text: &str, previous: &CellValue) -> Option<CellValue> {
    let text = text.trim();
    if text.is_empty() {
        return Some(CellValue::Empty);
    }
    if matches!(previous, CellValue::Int(_) | CellValue::Empty) {
        if let Ok(x) = text.parse::<i64>() {
            return Some(CellValue::Int(x));
        }
    }
    text.parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
        .map(CellValue::Float)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_parsing_follows_previous_kind() {
        assert_eq!(parse_number("42", &CellValue::Int(1)), Some(CellValue::Int(42)));
        assert_eq!(parse_number("42", &CellValue::Float(1.5)), Some(CellValue::Float(42.0)));
        assert_eq!(parse_number(" 2.5 ", &CellValue::Int(1)), Some(CellValue::Float(2.5)));
        assert_eq!(parse_number("", &CellValue::Int(1)), Some(CellValue::Empty));
        assert_eq!(parse_number("abc", &CellValue::Int(1)), None);
        assert_eq!(parse_number("inf", &CellValue::Float(1.0)), None);
    }
}
