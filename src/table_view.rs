mod cell_edit;
mod cell_view;
mod config;
mod state;

pub use config::TableViewConfig;

use datatable_core::column::{HeaderKind, PinSide};
use datatable_core::filter::FilterOperation;
use datatable_core::interaction::RowEvent;
use datatable_core::render::{build_model, HeaderCell, PinInfo, TableModel};
use datatable_core::sort::SortDirection;
use datatable_core::storage::PersistKey;
use datatable_core::toolbar::FocusScope;
use datatable_core::{CellCoord, CellEdit, CellValue, ColumnId, RowId, TableStateStore};
use egui::{
    Checkbox, CornerRadius, Id, Label, PointerButton, Rect, Response, RichText, ScrollArea,
    Sense, TextEdit, Ui, Widget,
};
use egui_extras::{Column, TableBuilder};
use indexmap::IndexMap;
use log::{debug, trace};
use strum::IntoEnumIterator;
use tap::Tap;

use crate::frontend::TableFrontend;
use cell_edit::EditOutcome;
use state::{EditingCell, FilterDraft};

/// User intents collected while drawing, applied to the store once the table is drawn.
enum Command {
    ToggleSort(ColumnId),
    MoveColumn { source: ColumnId, target: ColumnId },
    Hide(ColumnId),
    Pin(ColumnId, Option<PinSide>),
    Resize(ColumnId, f32),
    ToggleRow(RowId),
    ToggleAll,
    Row(RowId, RowEvent),
    Filter {
        column_id: ColumnId,
        op: Option<FilterOperation>,
        value: String,
    },
    ClearFilter(ColumnId),
    StartEdit(CellCoord, CellValue),
}

pub struct TableResponse {
    /// Union of the header and row responses, `None` when nothing was drawn.
    pub response: Option<Response>,
    /// Committed cell edits, the caller applies them to its data.
    pub edits: Vec<CellEdit>,
    pub scope: FocusScope,
}

pub struct TableView {
    state: state::State,
    config: TableViewConfig,
}

impl Default for TableView {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn focus_scope_id(key: &PersistKey) -> Id {
    Id::new(("datatable_focus_scope", key.storage_key()))
}

impl TableView {
    pub fn new() -> Self {
        TableView {
            state: state::State::default(),
            config: TableViewConfig::default(),
        }
    }

    pub fn with_config(config: TableViewConfig) -> Self {
        TableView {
            state: state::State::default(),
            config,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.state.editing.is_some()
    }

    pub fn show<R, F: TableFrontend<R>>(
        &mut self,
        store: &mut TableStateStore<R>,
        frontend: &mut F,
        ui: &mut Ui,
    ) -> TableResponse {
        let model = build_model(store);
        let scope_id = focus_scope_id(store.persist_key());
        let mut commands = Vec::new();
        let mut edits = Vec::new();

        let output = ScrollArea::horizontal()
            .id_salt(scope_id.with("hscroll"))
            .drag_to_scroll(false)
            .show(ui, |ui| {
                self.show_table(&model, store, frontend, &mut commands, &mut edits, ui)
            });

        let scope = if self.state.editing.is_some() || ui.rect_contains_pointer(output.inner_rect) {
            FocusScope::DataTable
        } else {
            FocusScope::Other
        };
        ui.ctx().data_mut(|d| d.insert_temp(scope_id, scope));

        if model.is_empty() {
            Label::new(RichText::new(self.config.empty_text.as_str()).weak()).ui(ui);
        }

        self.apply(commands, store, frontend);
        TableResponse {
            response: output.inner,
            edits,
            scope,
        }
    }

    fn show_table<R, F: TableFrontend<R>>(
        &mut self,
        model: &TableModel,
        store: &TableStateStore<R>,
        frontend: &mut F,
        commands: &mut Vec<Command>,
        edits: &mut Vec<CellEdit>,
        ui: &mut Ui,
    ) -> Option<Response> {
        let ctx = &ui.ctx().clone();
        let ui_layer_id = ui.layer_id();
        let visual = ui.visuals().clone();
        let boundary_stroke = visual.widgets.noninteractive.bg_stroke;
        let (pressed, released) =
            ui.input(|i| (i.pointer.primary_pressed(), i.pointer.primary_released()));
        let headers = model.headers();
        let mut resp_total = None::<Response>;

        let mut builder = TableBuilder::new(ui).id_salt(store.persist_key().storage_key());
        for header in headers {
            builder = builder.column(
                Column::initial(header.size)
                    .range(header.min_size..=header.max_size)
                    .resizable(header.resizable)
                    .clip(true),
            );
        }
        let max_height = if model.is_scrollable {
            self.config.max_height
        } else {
            f32::INFINITY
        };

        builder
            .drag_to_scroll(false) // Drag is used for column reordering
            .striped(self.config.striped)
            .vscroll(model.is_scrollable)
            .max_scroll_height(max_height)
            .sense(Sense::click_and_drag())
            .header(self.config.header_height, |mut h| {
                self.state.header_rects.clear();
                for header in headers {
                    let mut painter = None;
                    let mut select_all_clicked = false;
                    let (_, resp) = h.col(|ui| {
                        select_all_clicked = header_cell_ui(ui, header, model);
                        if painter.is_none() {
                            painter = Some(ui.painter().clone());
                        }
                    });

                    // The returned rect only spans the cell's content, the response spans the cell.
                    let rect = resp.rect;
                    self.state.header_rects.insert(header.column_id.clone(), rect);

                    if select_all_clicked {
                        commands.push(Command::ToggleAll);
                    }

                    if header.draggable && self.config.enable_column_drag {
                        // Set drag payload for column reordering.
                        resp.dnd_set_drag_payload(header.column_id.clone());
                        if resp.dragged() {
                            egui::popup::show_tooltip_text(
                                ctx,
                                ui_layer_id,
                                "_EGUI_DATATABLE__COLUMN_MOVE__".into(),
                                header.kind.label(),
                            );
                        }
                        if resp
                            .dnd_hover_payload::<ColumnId>()
                            .is_some_and(|source| *source != header.column_id)
                        {
                            if let Some(p) = &painter {
                                p.rect_filled(
                                    resp.rect,
                                    CornerRadius::ZERO,
                                    visual.selection.bg_fill.gamma_multiply(0.5),
                                );
                            }
                        }
                        if let Some(source) = resp.dnd_release_payload::<ColumnId>() {
                            commands.push(Command::MoveColumn {
                                source: (*source).clone(),
                                target: header.column_id.clone(),
                            });
                        }
                    }

                    if header.sortable {
                        if resp.hovered() {
                            if let Some(p) = &painter {
                                p.rect_filled(
                                    resp.rect,
                                    CornerRadius::ZERO,
                                    visual.selection.bg_fill.gamma_multiply(0.2),
                                );
                            }
                        }
                        if resp.clicked_by(PointerButton::Primary) {
                            commands.push(Command::ToggleSort(header.column_id.clone()));
                        }
                    }

                    if let (Some(pin), Some(p)) = (header.pin, &painter) {
                        draw_pin_boundary(p, rect, pin, boundary_stroke);
                    }

                    if !header.column_id.is_select() {
                        resp.context_menu(|ui| {
                            self.header_menu(ui, header, store, commands);
                        });
                    }
                }

                if pressed {
                    self.state.resize_origin = Some(self.state.header_widths());
                }
                if released {
                    if let Some(origin) = self.state.resize_origin.take() {
                        commands.extend(resized_columns(headers, &origin, &self.state.header_rects));
                    }
                }

                // Account for header response to calculate total response.
                resp_total = Some(h.response());
            })
            .tap_mut(|table| {
                table.ui_mut().separator();
            })
            .body(|body| {
                let footer_rows = usize::from(model.has_footer());
                body.rows(self.config.row_height, model.rows.len() + footer_rows, |mut row| {
                    let Some(body_row) = model.rows.get(row.index()) else {
                        if let Some(footer) = model.footer_groups.first() {
                            for cell in &footer.cells {
                                row.col(|ui| cell_view::show_footer_cell(ui, &cell.text, cell.align));
                            }
                        }
                        return;
                    };
                    let Some(entity) = store.rows().get(body_row.index) else {
                        return;
                    };
                    row.set_selected(body_row.selected);

                    let mut clicked = false;
                    let mut double_clicked = false;
                    let mut finished = None;
                    for cell in &body_row.cells {
                        let coord = CellCoord::from((&body_row.row_id, &cell.column_id));
                        let editing_here = self
                            .state
                            .editing
                            .as_ref()
                            .is_some_and(|e| e.coord == coord);
                        let mut painter = None;
                        let (_, resp) = row.col(|ui| {
                            painter = Some(ui.painter().clone());
                            if cell.is_select {
                                let mut checked = body_row.selected;
                                if ui.checkbox(&mut checked, "").clicked() {
                                    commands.push(Command::ToggleRow(body_row.row_id.clone()));
                                }
                                return;
                            }
                            if let (true, Some(editing), Some(meta)) =
                                (editing_here, self.state.editing.as_mut(), cell.edit.as_ref())
                            {
                                match cell_edit::show_cell_editor(editing, meta, ui) {
                                    EditOutcome::Pending => {}
                                    EditOutcome::Commit(value) => finished = Some(Some(value)),
                                    EditOutcome::Cancel => finished = Some(None),
                                }
                                return;
                            }
                            let tooltip = frontend.cell_tooltip(entity, &coord);
                            cell_view::show_cell(
                                ui,
                                cell,
                                frontend.cell_color(entity, &coord),
                                tooltip.as_deref(),
                            );
                        });

                        if let (Some(pin), Some(p)) = (cell.pin, &painter) {
                            draw_pin_boundary(p, resp.rect, pin, boundary_stroke);
                        }
                        if cell.is_select || editing_here {
                            continue;
                        }
                        if resp.double_clicked() {
                            if self.config.editable_cells && cell.edit.is_some() {
                                commands.push(Command::StartEdit(coord, cell.value.clone()));
                            } else {
                                double_clicked = true;
                            }
                        } else if resp.clicked() {
                            clicked = true;
                        }
                    }

                    if let Some(result) = finished {
                        if let (Some(editing), Some(value)) = (self.state.editing.take(), result) {
                            edits.push(CellEdit {
                                coord: editing.coord,
                                value,
                            });
                        }
                    }

                    let row_resp = row.response();
                    row_resp.context_menu(|ui| frontend.row_context_menu(entity, ui));
                    if double_clicked {
                        commands.push(Command::Row(body_row.row_id.clone(), RowEvent::DoubleClick));
                    } else if clicked {
                        commands.push(Command::Row(body_row.row_id.clone(), RowEvent::Click));
                    }

                    // Accumulate response
                    if let Some(resp) = &mut resp_total {
                        *resp = resp.union(row_resp);
                    } else {
                        resp_total = Some(row_resp);
                    }
                });
            });

        resp_total
    }

    fn header_menu<R>(
        &mut self,
        ui: &mut Ui,
        header: &HeaderCell,
        store: &TableStateStore<R>,
        commands: &mut Vec<Command>,
    ) {
        let column_id = &header.column_id;
        if header.sortable && ui.button("Sort").clicked() {
            commands.push(Command::ToggleSort(column_id.clone()));
            ui.close_menu();
        }
        if header.hideable && ui.button("Hide").clicked() {
            commands.push(Command::Hide(column_id.clone()));
            ui.close_menu();
        }
        ui.menu_button("Pin", |ui| {
            let pinned = header.pin.map(|p| p.side);
            for side in PinSide::iter() {
                if ui
                    .selectable_label(pinned == Some(side), side.to_string())
                    .clicked()
                {
                    commands.push(Command::Pin(column_id.clone(), Some(side)));
                    ui.close_menu();
                }
            }
            if pinned.is_some() && ui.button("Unpin").clicked() {
                commands.push(Command::Pin(column_id.clone(), None));
                ui.close_menu();
            }
        });

        ui.separator();
        let draft = self
            .state
            .filter_drafts
            .entry(column_id.clone())
            .or_insert_with(|| {
                store
                    .filters()
                    .columns
                    .iter()
                    .find(|f| &f.id == column_id)
                    .map(|f| FilterDraft {
                        op: Some(f.op),
                        value: f.value.clone(),
                    })
                    .unwrap_or_default()
            });
        ui.horizontal(|ui| {
            for op in FilterOperation::iter() {
                let selected = draft.op == Some(op);
                if ui.selectable_label(selected, op.to_string()).clicked() {
                    draft.op = if selected { None } else { Some(op) };
                }
            }
        });
        let edit = TextEdit::singleline(&mut draft.value)
            .hint_text("Filter value")
            .desired_width(160.0)
            .ui(ui);
        let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        ui.horizontal(|ui| {
            if ui.button("Apply").clicked() || submitted {
                commands.push(Command::Filter {
                    column_id: column_id.clone(),
                    op: draft.op,
                    value: draft.value.clone(),
                });
                ui.close_menu();
            }
            if header.filtered && ui.button("Clear").clicked() {
                commands.push(Command::ClearFilter(column_id.clone()));
                ui.close_menu();
            }
        });
    }

    fn apply<R, F: TableFrontend<R>>(
        &mut self,
        commands: Vec<Command>,
        store: &mut TableStateStore<R>,
        frontend: &mut F,
    ) {
        for command in commands {
            match command {
                Command::ToggleSort(id) => store.toggle_sort(&id),
                Command::MoveColumn { source, target } => {
                    if !store.move_column(&source, &target) {
                        debug!("ignored drop of {source} onto {target}");
                    }
                }
                Command::Hide(id) => store.set_column_visible(&id, false),
                Command::Pin(id, side) => store.pin_column(&id, side),
                Command::Resize(id, width) => store.set_column_size(&id, width),
                Command::ToggleRow(id) => store.toggle_row(&id),
                Command::ToggleAll => store.toggle_all(),
                Command::Row(id, event) => store.handle_row_event(&id, event, frontend),
                Command::Filter {
                    column_id,
                    op,
                    value,
                } => {
                    if value.trim().is_empty() {
                        store.remove_column_filter(&column_id);
                    } else {
                        let mut filter = store.filter_for(&column_id, value);
                        if let Some(op) = op {
                            filter.op = op;
                        }
                        store.upsert_column_filter(filter);
                    }
                    self.state.filter_drafts.shift_remove(&column_id);
                }
                Command::ClearFilter(id) => {
                    store.remove_column_filter(&id);
                    self.state.filter_drafts.shift_remove(&id);
                }
                Command::StartEdit(coord, value) => {
                    trace!("editing {}:{}", coord.row_id, coord.column_id);
                    self.state.editing = Some(EditingCell::new(coord, value));
                }
            }
        }
    }
}

/// Columns whose drawn width changed between the press and the release of the primary
/// button, i.e. the ones dragged by their resize handle.
fn resized_columns(
    headers: &[HeaderCell],
    origin: &IndexMap<ColumnId, f32>,
    now: &IndexMap<ColumnId, Rect>,
) -> Vec<Command> {
    headers
        .iter()
        .filter(|h| h.resizable)
        .filter_map(|h| {
            let before = *origin.get(&h.column_id)?;
            let width = now.get(&h.column_id)?.width();
            ((width - before).abs() > 1.0).then(|| Command::Resize(h.column_id.clone(), width))
        })
        .collect()
}

/// Returns true when the select-all checkbox was clicked.
fn header_cell_ui(ui: &mut Ui, header: &HeaderCell, model: &TableModel) -> bool {
    match &header.kind {
        HeaderKind::SelectAll => {
            let mut checked = model.all_selected;
            Checkbox::new(&mut checked, "")
                .indeterminate(model.some_selected && !model.all_selected)
                .ui(ui)
                .clicked()
        }
        HeaderKind::Label(label) => {
            let mut text = label.clone();
            match header.sort {
                Some(SortDirection::Asc) => text.push_str(" ⬆"),
                Some(SortDirection::Desc) => text.push_str(" ⬇"),
                None => {}
            }
            if let Some(priority) = header.sort_priority {
                text.push_str(&(priority + 1).to_string());
            }
            if header.filtered {
                text.push_str(" 🔍");
            }
            Label::new(RichText::new(text).strong())
                .selectable(false)
                .truncate()
                .ui(ui);
            false
        }
    }
}

fn draw_pin_boundary(painter: &egui::Painter, rect: Rect, pin: PinInfo, stroke: egui::Stroke) {
    if !pin.is_boundary {
        return;
    }
    let x = match pin.side {
        PinSide::Left => rect.right(),
        PinSide::Right => rect.left(),
    };
    painter.vline(x, rect.y_range(), stroke);
}

#[cfg(test)]
mod tests {
    use super::*;
    use datatable_core::sort::SortingState;
    use datatable_core::storage::{shared, MemoryStorage};
    use datatable_core::{ColumnDescriptor, ColumnSet, TableStateOptions};

    struct Share {
        account: &'static str,
        shares: i64,
    }

    fn store() -> TableStateStore<Share> {
        let columns = ColumnSet::with_select([
            ColumnDescriptor::new("account", "Account", |s: &Share| s.account.into()),
            ColumnDescriptor::new("shares", "Shares", |s: &Share| s.shares.into()).number(0),
        ])
        .unwrap();
        let options = TableStateOptions::new(PersistKey::new(["shares"]), columns, |s: &Share| {
            s.account.into()
        });
        let mut store = TableStateStore::new(options, shared(MemoryStorage::default()));
        store.set_rows(vec![
            Share {
                account: "A-1",
                shares: 10,
            },
            Share {
                account: "A-2",
                shares: 25,
            },
        ]);
        store
    }

    #[test]
    fn draws_without_a_window() {
        let ctx = egui::Context::default();
        let mut store = store();
        let mut view = TableView::new();
        let mut result = None;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                result = Some(view.show(&mut store, &mut (), ui));
            });
        });
        let result = result.unwrap();
        assert!(result.edits.is_empty());
        assert_eq!(result.scope, FocusScope::Other);
        assert!(!view.is_editing());
    }

    #[test]
    fn commands_reach_the_store() {
        let mut store = store();
        let mut view = TableView::new();
        view.apply(
            vec![
                Command::MoveColumn {
                    source: "account".into(),
                    target: "shares".into(),
                },
                Command::MoveColumn {
                    source: "shares".into(),
                    target: "select".into(),
                },
                Command::Filter {
                    column_id: "shares".into(),
                    op: None,
                    value: "25".into(),
                },
                Command::Row("A-1".into(), RowEvent::DoubleClick),
                Command::StartEdit(
                    CellCoord::from((RowId::from("A-2"), ColumnId::from("account"))),
                    "A-2".into(),
                ),
            ],
            &mut store,
            &mut (),
        );
        let order: Vec<_> = store.column_order().iter().map(|c| c.as_str()).collect();
        assert_eq!(order, vec!["select", "shares", "account"]);
        assert_eq!(store.filters().columns[0].op, FilterOperation::Equals);
        assert!(store.is_row_selected(&"A-1".into()));
        assert!(view.is_editing());
    }

    fn frame(
        ctx: &egui::Context,
        view: &mut TableView,
        store: &mut TableStateStore<Share>,
        events: Vec<egui::Event>,
    ) {
        let input = egui::RawInput {
            screen_rect: Some(Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0))),
            events,
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                view.show(store, &mut (), ui);
            });
        });
    }

    fn button(pos: egui::Pos2, pressed: bool) -> egui::Event {
        egui::Event::PointerButton {
            pos,
            button: PointerButton::Primary,
            pressed,
            modifiers: Default::default(),
        }
    }

    /// Moves to `from`, presses, moves through `path` and releases at its last point.
    fn drag(
        ctx: &egui::Context,
        view: &mut TableView,
        store: &mut TableStateStore<Share>,
        from: egui::Pos2,
        path: &[egui::Pos2],
    ) {
        frame(ctx, view, store, vec![egui::Event::PointerMoved(from)]);
        frame(ctx, view, store, vec![button(from, true)]);
        for pos in path {
            frame(ctx, view, store, vec![egui::Event::PointerMoved(*pos)]);
        }
        let to = path.last().copied().unwrap_or(from);
        frame(ctx, view, store, vec![button(to, false)]);
    }

    fn header_rect(view: &TableView, id: &str) -> Rect {
        view.state.header_rects[&ColumnId::from(id)]
    }

    #[test]
    fn header_click_sorts_without_resizing() {
        let ctx = egui::Context::default();
        let mut store = store();
        let mut view = TableView::new();
        frame(&ctx, &mut view, &mut store, vec![]);
        let center = header_rect(&view, "account").center();
        drag(&ctx, &mut view, &mut store, center, &[]);

        assert_eq!(store.sorting(), &SortingState::single("account", false));
        assert!(store.state().column_sizing.is_empty());
        assert_eq!(store.column_size(&"account".into()), 150.0);
    }

    #[test]
    fn release_outside_the_table_keeps_widths() {
        let ctx = egui::Context::default();
        let mut store = store();
        let mut view = TableView::new();
        frame(&ctx, &mut view, &mut store, vec![]);
        drag(&ctx, &mut view, &mut store, egui::pos2(600.0, 500.0), &[]);

        assert!(store.state().column_sizing.is_empty());
        assert_eq!(store.column_size(&"account".into()), 150.0);
        assert_eq!(store.column_size(&"shares".into()), 150.0);
        assert!(store.sorting().is_empty());
    }

    #[test]
    fn dragging_a_resize_handle_saves_the_width() {
        let ctx = egui::Context::default();
        let mut store = store();
        let mut view = TableView::new();
        frame(&ctx, &mut view, &mut store, vec![]);
        let edge = header_rect(&view, "account").right_center() + egui::vec2(5.0, 0.0);
        drag(
            &ctx,
            &mut view,
            &mut store,
            edge,
            &[edge + egui::vec2(20.0, 0.0), edge + egui::vec2(40.0, 0.0)],
        );

        let width = store.column_size(&"account".into());
        assert!(width > 180.0 && width < 200.0, "{width}");
        assert!(!store.state().column_sizing.contains_key(&ColumnId::from("shares")));
        assert!(store.sorting().is_empty());
    }

    #[test]
    fn header_rects_span_whole_columns() {
        let ctx = egui::Context::default();
        let mut store = store();
        store.pin_column(&"shares".into(), Some(PinSide::Left));
        let mut view = TableView::new();
        frame(&ctx, &mut view, &mut store, vec![]);

        let shares = header_rect(&view, "shares");
        let account = header_rect(&view, "account");
        assert!((shares.width() - 150.0).abs() < 1.0, "{shares:?}");
        assert!((account.width() - 150.0).abs() < 1.0, "{account:?}");
        assert!(header_rect(&view, "select").right() <= shares.left());
        assert!(shares.right() < account.left());
    }
}
