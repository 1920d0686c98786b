use datatable_core::filter::FilterOperation;
use datatable_core::{CellCoord, CellValue, ColumnId};
use egui::Rect;
use indexmap::IndexMap;

/// Frame to frame state of a [`super::TableView`] that is not worth persisting.
#[derive(Default)]
pub(super) struct State {
    pub(super) editing: Option<EditingCell>,
    /// Filter text typed into a header menu, keyed by column.
    pub(super) filter_drafts: IndexMap<ColumnId, FilterDraft>,
    /// Header cells as drawn this frame.
    pub(super) header_rects: IndexMap<ColumnId, Rect>,
    /// Header widths when the primary button went down.
    pub(super) resize_origin: Option<IndexMap<ColumnId, f32>>,
}

impl State {
    pub(super) fn header_widths(&self) -> IndexMap<ColumnId, f32> {
        self.header_rects
            .iter()
            .map(|(id, rect)| (id.clone(), rect.width()))
            .collect()
    }
}

pub(super) struct EditingCell {
    pub(super) coord: CellCoord,
    pub(super) buffer: CellValue,
    pub(super) text: String,
    /// Focus is requested only on the frame the editor opens.
    pub(super) first_pass: bool,
}

impl EditingCell {
    pub(super) fn new(coord: CellCoord, value: CellValue) -> Self {
        EditingCell {
            coord,
            text: match &value {
                CellValue::Empty => String::new(),
                other => other.to_string(),
            },
            buffer: value,
            first_pass: true,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(super) struct FilterDraft {
    /// `None` until picked, the column type's default applies.
    pub(super) op: Option<FilterOperation>,
    pub(super) value: String,
}
