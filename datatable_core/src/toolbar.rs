//! Which toolbar controls exist and in what order.
//!
//! Optional actions appear when their [`ActionProps`] are supplied and their `hide_*` flag
//! is not set. This is a presence gate only, callers disable actions through
//! [`ActionProps::disabled`].

use crate::filter::FilterState;

#[derive(Clone, Debug, PartialEq)]
pub struct ActionProps {
    pub label: String,
    pub disabled: bool,
    /// Spinner instead of the icon, used by refresh while a refetch is in flight.
    pub is_loading: bool,
}

impl ActionProps {
    pub fn new(label: impl Into<String>) -> Self {
        ActionProps {
            label: label.into(),
            disabled: false,
            is_loading: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn loading(mut self, is_loading: bool) -> Self {
        self.is_loading = is_loading;
        self
    }
}

/// Intents handed back to the caller, which owns the actual mutation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ToolbarAction {
    Create,
    DeleteSelected,
    Export,
    Refresh,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ToolbarItem {
    LeftContent,
    Search,
    FilterChips,
    Unselect { count: usize },
    Delete(ActionProps),
    Refresh(ActionProps),
    ColumnVisibility,
    Options,
    Export(ActionProps),
    Create(ActionProps),
    RightContent,
}

impl ToolbarItem {
    /// Items drawn in the right aligned group.
    pub fn is_right(&self) -> bool {
        !matches!(
            self,
            ToolbarItem::LeftContent | ToolbarItem::Search | ToolbarItem::FilterChips
        )
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FocusScope {
    DataTable,
    Other,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ShortcutKey {
    Enter,
    Escape,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolbarConfig {
    pub delete: Option<ActionProps>,
    pub refresh: Option<ActionProps>,
    pub export: Option<ActionProps>,
    pub create: Option<ActionProps>,
    pub hide_delete: bool,
    pub hide_refresh: bool,
    pub hide_export: bool,
    pub hide_create: bool,
    pub show_search: bool,
    pub show_filter_chips: bool,
    pub has_left_content: bool,
    pub has_right_content: bool,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        ToolbarConfig {
            delete: None,
            refresh: None,
            export: None,
            create: None,
            hide_delete: false,
            hide_refresh: false,
            hide_export: false,
            hide_create: false,
            show_search: true,
            show_filter_chips: true,
            has_left_content: false,
            has_right_content: false,
        }
    }
}

fn gated(props: &Option<ActionProps>, hide: bool) -> Option<&ActionProps> {
    props.as_ref().filter(|_| !hide)
}

impl ToolbarConfig {
    pub fn create(mut self, props: ActionProps) -> Self {
        self.create = Some(props);
        self
    }

    pub fn delete(mut self, props: ActionProps) -> Self {
        self.delete = Some(props);
        self
    }

    pub fn refresh(mut self, props: ActionProps) -> Self {
        self.refresh = Some(props);
        self
    }

    pub fn export(mut self, props: ActionProps) -> Self {
        self.export = Some(props);
        self
    }

    /// Left group first, then the right group, each in drawing order.
    pub fn layout(&self, selected_count: usize, filters: &FilterState) -> Vec<ToolbarItem> {
        let mut items = vec![];
        if self.has_left_content {
            items.push(ToolbarItem::LeftContent);
        }
        if self.show_search {
            items.push(ToolbarItem::Search);
        }
        if self.show_filter_chips && !filters.columns.is_empty() {
            items.push(ToolbarItem::FilterChips);
        }
        if selected_count > 0 {
            items.push(ToolbarItem::Unselect {
                count: selected_count,
            });
        }
        if let Some(delete) = gated(&self.delete, self.hide_delete) {
            let mut delete = delete.clone();
            delete.disabled |= selected_count == 0;
            items.push(ToolbarItem::Delete(delete));
        }
        if let Some(refresh) = gated(&self.refresh, self.hide_refresh) {
            items.push(ToolbarItem::Refresh(refresh.clone()));
        }
        items.push(ToolbarItem::ColumnVisibility);
        items.push(ToolbarItem::Options);
        if let Some(export) = gated(&self.export, self.hide_export) {
            items.push(ToolbarItem::Export(export.clone()));
        }
        if let Some(create) = gated(&self.create, self.hide_create) {
            items.push(ToolbarItem::Create(create.clone()));
        }
        if self.has_right_content {
            items.push(ToolbarItem::RightContent);
        }
        items
    }

    /// Enter inside the data table scope creates a record.
    pub fn shortcut(&self, key: ShortcutKey, scope: FocusScope) -> Option<ToolbarAction> {
        match (key, scope) {
            (ShortcutKey::Enter, FocusScope::DataTable) => gated(&self.create, self.hide_create)
                .filter(|p| !p.disabled)
                .map(|_| ToolbarAction::Create),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{ColumnFilter, FilterOperation};

    #[test]
    fn bare_toolbar() {
        let config = ToolbarConfig::default();
        assert_eq!(
            config.layout(0, &FilterState::default()),
            vec![
                ToolbarItem::Search,
                ToolbarItem::ColumnVisibility,
                ToolbarItem::Options
            ]
        );
        assert_eq!(config.shortcut(ShortcutKey::Enter, FocusScope::DataTable), None);
    }

    #[test]
    fn full_toolbar_order() {
        let mut filters = FilterState::default();
        filters.upsert(ColumnFilter::new("status", FilterOperation::Equals, "active"));
        let config = ToolbarConfig {
            has_left_content: true,
            has_right_content: true,
            ..ToolbarConfig::default()
        }
        .create(ActionProps::new("New member"))
        .delete(ActionProps::new("Delete"))
        .refresh(ActionProps::new("Refresh").loading(true))
        .export(ActionProps::new("Export"));

        let items = config.layout(2, &filters);
        let names: Vec<_> = items
            .iter()
            .map(|i| match i {
                ToolbarItem::LeftContent => "left",
                ToolbarItem::Search => "search",
                ToolbarItem::FilterChips => "chips",
                ToolbarItem::Unselect { .. } => "unselect",
                ToolbarItem::Delete(_) => "delete",
                ToolbarItem::Refresh(_) => "refresh",
                ToolbarItem::ColumnVisibility => "columns",
                ToolbarItem::Options => "options",
                ToolbarItem::Export(_) => "export",
                ToolbarItem::Create(_) => "create",
                ToolbarItem::RightContent => "right",
            })
            .collect();
        assert_eq!(
            names,
            vec![
                "left", "search", "chips", "unselect", "delete", "refresh", "columns", "options",
                "export", "create", "right"
            ]
        );
        assert_eq!(items.iter().filter(|i| !i.is_right()).count(), 3);
    }

    #[test]
    fn hide_flags_and_empty_selection() {
        let config = ToolbarConfig {
            hide_create: true,
            hide_export: true,
            ..ToolbarConfig::default()
        }
        .create(ActionProps::new("New"))
        .export(ActionProps::new("Export"))
        .delete(ActionProps::new("Delete"));
        let items = config.layout(0, &FilterState::default());
        assert!(!items.iter().any(|i| matches!(i, ToolbarItem::Create(_) | ToolbarItem::Export(_))));
        assert!(!items.iter().any(|i| matches!(i, ToolbarItem::Unselect { .. })));
        assert!(items.contains(&ToolbarItem::Delete(ActionProps::new("Delete").disabled(true))));
        assert_eq!(config.shortcut(ShortcutKey::Enter, FocusScope::DataTable), None);
    }

    #[test]
    fn enter_is_scoped() {
        let config = ToolbarConfig::default().create(ActionProps::new("New"));
        assert_eq!(
            config.shortcut(ShortcutKey::Enter, FocusScope::DataTable),
            Some(ToolbarAction::Create)
        );
        assert_eq!(config.shortcut(ShortcutKey::Enter, FocusScope::Other), None);
        assert_eq!(config.shortcut(ShortcutKey::Escape, FocusScope::DataTable), None);
    }
}
