//! Headless table model handed to a frontend for drawing.
//!
//! [`build_model`] resolves visibility, order and pinning of the columns and renders every
//! loaded row into display cells. The model knows nothing about where rows came from.

use crate::column::{CellAlign, CellKind, ColumnDescriptor, EditMeta, FooterKind, HeaderKind, PinSide};
use crate::sort::SortDirection;
use crate::state::TableStateStore;
use crate::value::CellValue;
use crate::{ColumnId, RowId};

/// Sticky placement of a pinned column. `offset` is measured from the table edge of
/// `side`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PinInfo {
    pub side: PinSide,
    pub offset: f32,
    /// Last left pinned or first right pinned column, drawn with a border.
    pub is_boundary: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeaderCell {
    pub column_id: ColumnId,
    pub kind: HeaderKind,
    pub size: f32,
    pub min_size: f32,
    pub max_size: f32,
    pub pin: Option<PinInfo>,
    pub sortable: bool,
    pub sort: Option<SortDirection>,
    /// Only set while more than one column is sorted.
    pub sort_priority: Option<usize>,
    pub resizable: bool,
    pub hideable: bool,
    pub draggable: bool,
    pub filtered: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeaderGroup {
    pub id: String,
    pub headers: Vec<HeaderCell>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BodyCell {
    pub column_id: ColumnId,
    pub value: CellValue,
    pub text: String,
    pub align: CellAlign,
    pub pin: Option<PinInfo>,
    /// Present for editable, non read-only columns.
    pub edit: Option<EditMeta>,
    pub is_select: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BodyRow {
    pub row_id: RowId,
    /// Position among the loaded rows.
    pub index: usize,
    pub selected: bool,
    pub cells: Vec<BodyCell>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FooterCell {
    pub column_id: ColumnId,
    pub text: String,
    pub align: CellAlign,
    pub pin: Option<PinInfo>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FooterGroup {
    pub id: String,
    pub cells: Vec<FooterCell>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableModel {
    pub header_groups: Vec<HeaderGroup>,
    pub rows: Vec<BodyRow>,
    pub footer_groups: Vec<FooterGroup>,
    pub is_scrollable: bool,
    pub all_selected: bool,
    pub some_selected: bool,
}

impl TableModel {
    /// Leaf headers, one per drawn column.
    pub fn headers(&self) -> &[HeaderCell] {
        self.header_groups
            .last()
            .map(|g| g.headers.as_slice())
            .unwrap_or_default()
    }

    pub fn has_footer(&self) -> bool {
        !self.footer_groups.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Visible columns in drawing order: left pinned, unpinned, right pinned.
pub fn layout_columns<R>(store: &TableStateStore<R>) -> Vec<(&ColumnDescriptor<R>, Option<PinInfo>)> {
    let pinning = store.column_pinning();
    let visible = store.visible_columns();
    let pinned = |ids: &[ColumnId]| {
        ids.iter()
            .filter_map(|id| visible.iter().find(|c| &c.id == id).copied())
            .collect::<Vec<_>>()
    };
    let left = pinned(&pinning.left);
    let right = pinned(&pinning.right);

    let mut out = Vec::with_capacity(visible.len());
    let mut offset = 0.0;
    let left_len = left.len();
    for (i, column) in left.into_iter().enumerate() {
        out.push((
            column,
            Some(PinInfo {
                side: PinSide::Left,
                offset,
                is_boundary: i + 1 == left_len,
            }),
        ));
        offset += store.column_size(&column.id);
    }

    out.extend(
        visible
            .iter()
            .filter(|c| pinning.side(&c.id).is_none())
            .map(|c| (*c, None)),
    );

    let mut offset = 0.0;
    let mut tail = Vec::with_capacity(right.len());
    for (i, column) in right.into_iter().enumerate().rev() {
        tail.push((
            column,
            Some(PinInfo {
                side: PinSide::Right,
                offset,
                is_boundary: i == 0,
            }),
        ));
        offset += store.column_size(&column.id);
    }
    tail.reverse();
    out.extend(tail);
    out
}

pub fn build_model<R>(store: &TableStateStore<R>) -> TableModel {
    let layout = layout_columns(store);
    let sorting = store.sorting();
    let multi_sorted = sorting.0.len() > 1;
    let filters = store.filters();

    let headers = layout
        .iter()
        .map(|(column, pin)| HeaderCell {
            column_id: column.id.clone(),
            kind: column.header.clone(),
            size: store.column_size(&column.id),
            min_size: column.min_size,
            max_size: column.max_size,
            pin: *pin,
            sortable: column.sortable,
            sort: sorting.direction(&column.id),
            sort_priority: sorting.priority(&column.id).filter(|_| multi_sorted),
            resizable: column.resizable,
            hideable: column.hideable,
            draggable: !column.is_select() && pin.is_none(),
            filtered: filters.columns.iter().any(|f| f.id == column.id),
        })
        .collect();

    let rows = store
        .rows()
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let row_id = store.row_id(row);
            let cells = layout
                .iter()
                .map(|(column, pin)| {
                    let value = column.value(row);
                    BodyCell {
                        column_id: column.id.clone(),
                        text: column.cell.render(row, &value),
                        value,
                        align: column.cell.align(),
                        pin: *pin,
                        edit: column.meta.clone().filter(|m| !m.read_only),
                        is_select: column.is_select(),
                    }
                })
                .collect();
            BodyRow {
                selected: store.is_row_selected(&row_id),
                row_id,
                index,
                cells,
            }
        })
        .collect();

    let footer_groups = if layout.iter().any(|(c, _)| c.footer.is_some()) {
        let cells = layout
            .iter()
            .map(|(column, pin)| FooterCell {
                column_id: column.id.clone(),
                text: footer_text(column, store.rows()),
                align: column.cell.align(),
                pin: *pin,
            })
            .collect();
        vec![FooterGroup {
            id: "footer".into(),
            cells,
        }]
    } else {
        vec![]
    };

    TableModel {
        header_groups: vec![HeaderGroup {
            id: "header".into(),
            headers,
        }],
        rows,
        footer_groups,
        is_scrollable: store.is_scrollable(),
        all_selected: store.is_all_selected(),
        some_selected: store.selected_count() > 0,
    }
}

fn footer_text<R>(column: &ColumnDescriptor<R>, rows: &[R]) -> String {
    match &column.footer {
        None => String::new(),
        Some(FooterKind::Label(label)) => label.clone(),
        Some(FooterKind::Count) => rows
            .iter()
            .filter(|row| !column.value(row).is_empty())
            .count()
            .to_string(),
        Some(FooterKind::Sum) => {
            let sum: f64 = rows.iter().filter_map(|row| column.value(row).as_f64()).sum();
            match column.cell {
                CellKind::Number { decimals } => format!("{sum:.decimals$}"),
                _ => sum.to_string(),
            }
        }
    }
}
