use datatable_core::filter::FilterLogic;
use datatable_core::toolbar::{
    ActionProps, FocusScope, ShortcutKey, ToolbarAction, ToolbarConfig, ToolbarItem,
};
use datatable_core::{ColumnId, TableStateStore};
use egui::{Align, Button, Key, Layout, TextEdit, Ui, Widget};
use itertools::Itertools;
use strum::IntoEnumIterator;

use crate::frontend::TableFrontend;
use crate::table_view::focus_scope_id;

/// Controls around a table. View state changes (search, selection, column visibility,
/// options) go straight to the store, record level actions are returned to the caller.
pub struct Toolbar {
    config: ToolbarConfig,
    search: String,
}

impl Toolbar {
    pub fn new(config: ToolbarConfig) -> Self {
        Toolbar {
            config,
            search: String::new(),
        }
    }

    pub fn config(&self) -> &ToolbarConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ToolbarConfig {
        &mut self.config
    }

    pub fn show<R, F: TableFrontend<R>>(
        &mut self,
        store: &mut TableStateStore<R>,
        frontend: &mut F,
        ui: &mut Ui,
    ) -> Option<ToolbarAction> {
        let items = self.config.layout(store.selected_count(), store.filters());
        let (left, right): (Vec<_>, Vec<_>) = items.into_iter().partition(|i| !i.is_right());
        let mut action = None;

        ui.horizontal(|ui| {
            for item in &left {
                self.item_ui(item, store, frontend, &mut action, ui);
            }
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                for item in right.iter().rev() {
                    self.item_ui(item, store, frontend, &mut action, ui);
                }
            });
        });

        action.or_else(|| self.shortcut(store, ui))
    }

    fn shortcut<R>(&self, store: &TableStateStore<R>, ui: &Ui) -> Option<ToolbarAction> {
        let ctx = ui.ctx();
        if ctx.wants_keyboard_input() || !ui.input(|i| i.key_pressed(Key::Enter)) {
            return None;
        }
        let scope = ctx
            .data(|d| d.get_temp::<FocusScope>(focus_scope_id(store.persist_key())))
            .unwrap_or(FocusScope::Other);
        self.config.shortcut(ShortcutKey::Enter, scope)
    }

    fn item_ui<R, F: TableFrontend<R>>(
        &mut self,
        item: &ToolbarItem,
        store: &mut TableStateStore<R>,
        frontend: &mut F,
        action: &mut Option<ToolbarAction>,
        ui: &mut Ui,
    ) {
        match item {
            ToolbarItem::LeftContent => frontend.left_toolbar_ui(ui),
            ToolbarItem::RightContent => frontend.right_toolbar_ui(ui),
            ToolbarItem::Search => {
                let resp = TextEdit::singleline(&mut self.search)
                    .hint_text("Search…")
                    .desired_width(180.0)
                    .ui(ui);
                if resp.changed() {
                    store.set_global_filter(self.search.trim());
                } else if !resp.has_focus() && self.search.trim() != store.filters().global {
                    self.search = store.filters().global.clone();
                }
            }
            ToolbarItem::FilterChips => {
                let mut removed = None;
                for filter in &store.filters().columns {
                    let text = format!("{} {} {} ✖", filter.id, filter.op, filter.value);
                    if ui.small_button(text).on_hover_text("Remove filter").clicked() {
                        removed = Some(filter.id.clone());
                    }
                }
                if store.filters().columns.len() > 1 {
                    let logic = store.filters().logic;
                    ui.weak(logic.to_string());
                }
                if let Some(id) = removed {
                    store.remove_column_filter(&id);
                }
            }
            ToolbarItem::Unselect { count } => {
                if ui.button(format!("✖ {count} selected")).clicked() {
                    store.clear_selection();
                }
            }
            ToolbarItem::Delete(props) => {
                if action_button(props, ui) {
                    *action = Some(ToolbarAction::DeleteSelected);
                }
            }
            ToolbarItem::Refresh(props) => {
                if action_button(props, ui) {
                    *action = Some(ToolbarAction::Refresh);
                }
            }
            ToolbarItem::Export(props) => {
                if action_button(props, ui) {
                    *action = Some(ToolbarAction::Export);
                }
            }
            ToolbarItem::Create(props) => {
                if action_button(props, ui) {
                    *action = Some(ToolbarAction::Create);
                }
            }
            ToolbarItem::ColumnVisibility => column_visibility_menu(store, ui),
            ToolbarItem::Options => options_menu(store, ui),
        }
    }
}

fn action_button(props: &ActionProps, ui: &mut Ui) -> bool {
    if props.is_loading {
        ui.spinner();
    }
    ui.add_enabled(!props.disabled && !props.is_loading, Button::new(props.label.as_str()))
        .clicked()
}

fn column_visibility_menu<R>(store: &mut TableStateStore<R>, ui: &mut Ui) {
    ui.menu_button("Columns", |ui| {
        let mut toggled: Option<ColumnId> = None;
        for column in store.columns().iter().filter(|c| !c.is_select()) {
            let mut visible = store.is_column_visible(&column.id);
            let checkbox = egui::Checkbox::new(&mut visible, column.header.label());
            if ui.add_enabled(column.hideable, checkbox).changed() {
                toggled = Some(column.id.clone());
            }
        }
        if let Some(id) = toggled {
            store.toggle_column_visible(&id);
        }
        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Show all").clicked() {
                store.set_all_columns_visible(true);
            }
            if ui.button("Hide all").clicked() {
                store.set_all_columns_visible(false);
            }
        });
        let hidden = store
            .columns()
            .iter()
            .filter(|c| !store.is_column_visible(&c.id))
            .map(|c| c.header.label())
            .join(", ");
        if !hidden.is_empty() {
            ui.weak(format!("Hidden: {hidden}"));
        }
    });
}

fn options_menu<R>(store: &mut TableStateStore<R>, ui: &mut Ui) {
    ui.menu_button("Options", |ui| {
        let mut scrollable = store.is_scrollable();
        if ui.checkbox(&mut scrollable, "Scrollable").changed() {
            store.set_scrollable(scrollable);
        }
        ui.separator();
        ui.label("Combine filters with");
        ui.horizontal(|ui| {
            for logic in FilterLogic::iter() {
                if ui
                    .selectable_label(store.filters().logic == logic, logic.to_string())
                    .clicked()
                {
                    store.set_filter_logic(logic);
                }
            }
        });
        if !store.filters().is_empty() && ui.button("Clear filters").clicked() {
            store.clear_filters();
            ui.close_menu();
        }
        ui.separator();
        if ui.button("Reset view").clicked() {
            store.reset();
            ui.close_menu();
        }
        if ui.button("Forget saved view").clicked() {
            store.clear_persisted();
            ui.close_menu();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use datatable_core::storage::{shared, MemoryStorage, PersistKey};
    use datatable_core::{ColumnDescriptor, ColumnSet, TableStateOptions};

    struct Member {
        id: u32,
    }

    #[test]
    fn draws_and_stays_quiet_without_input() {
        let columns = ColumnSet::with_select([ColumnDescriptor::new("id", "ID", |m: &Member| {
            m.id.into()
        })])
        .unwrap();
        let options =
            TableStateOptions::new(PersistKey::new(["members"]), columns, |m: &Member| m.id.into());
        let mut store = TableStateStore::new(options, shared(MemoryStorage::default()));
        store.set_rows(vec![Member { id: 1 }]);
        store.toggle_row(&1u32.into());

        let mut toolbar = Toolbar::new(
            ToolbarConfig::default()
                .create(ActionProps::new("New member"))
                .delete(ActionProps::new("Delete")),
        );
        let ctx = egui::Context::default();
        let mut action = Some(ToolbarAction::Refresh);
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                action = toolbar.show(&mut store, &mut (), ui);
            });
        });
        assert_eq!(action, None);
        assert_eq!(store.selected_count(), 1);
    }
}
