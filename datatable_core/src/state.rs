//! Persisted table view state: column order, visibility, pinning and sizing, row
//! selection, sorting, filters, pagination and the scroll toggle.
//!
//! State is namespaced by [`PersistKey`] and written through a [`SharedStorage`] on every
//! user driven change. Saved state is reconciled against the live column set when it is
//! loaded: unknown ids are dropped, new columns are appended. Storage and decoding
//! failures are logged and never reach the caller.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::column::{ColumnDescriptor, ColumnSet, PinSide};
use crate::column_type::{ColumnType, ColumnTypeResolver, DEFAULT_SAMPLE_SIZE};
use crate::filter::{ColumnFilter, FilterLogic, FilterState};
use crate::interaction::{Handled, RowEvent, RowHandler};
use crate::query::{Pagination, QueryParams, DEFAULT_PAGE_SIZE};
use crate::sort::{sort_rows, SortingState};
use crate::storage::{PersistKey, SharedStorage};
use crate::{ColumnId, RowId, SELECT_COLUMN_ID};

/// Called with the selected loaded rows whenever the selection changes.
pub type SelectDataFn<R> = Box<dyn FnMut(&[&R])>;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnPinning {
    pub left: Vec<ColumnId>,
    pub right: Vec<ColumnId>,
}

impl ColumnPinning {
    pub fn side(&self, id: &ColumnId) -> Option<PinSide> {
        if self.left.contains(id) {
            Some(PinSide::Left)
        } else if self.right.contains(id) {
            Some(PinSide::Right)
        } else {
            None
        }
    }

    /// Pinned columns are appended to their side, `None` unpins.
    pub fn set(&mut self, id: &ColumnId, side: Option<PinSide>) {
        self.left.retain(|c| c != id);
        self.right.retain(|c| c != id);
        match side {
            Some(PinSide::Left) => self.left.push(id.clone()),
            Some(PinSide::Right) => self.right.push(id.clone()),
            None => {}
        }
    }

    fn pin_leading(&mut self, id: &ColumnId) {
        self.right.retain(|c| c != id);
        self.left.retain(|c| c != id);
        self.left.insert(0, id.clone());
    }

    fn retain(&mut self, mut f: impl FnMut(&ColumnId) -> bool) {
        let mut seen = HashSet::new();
        self.left.retain(|c| f(c) && seen.insert(c.clone()));
        self.right.retain(|c| f(c) && seen.insert(c.clone()));
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableUiState {
    pub column_order: Vec<ColumnId>,
    /// Absent ids are visible.
    pub column_visibility: IndexMap<ColumnId, bool>,
    pub column_pinning: ColumnPinning,
    /// Widths the user dragged, absent ids use the declared size.
    pub column_sizing: IndexMap<ColumnId, f32>,
    pub row_selection: IndexMap<RowId, bool>,
    pub is_scrollable: bool,
    pub sorting: SortingState,
    pub filters: FilterState,
    pub pagination: Pagination,
}

impl Default for TableUiState {
    fn default() -> Self {
        TableUiState {
            column_order: vec![],
            column_visibility: IndexMap::new(),
            column_pinning: ColumnPinning::default(),
            column_sizing: IndexMap::new(),
            row_selection: IndexMap::new(),
            is_scrollable: true,
            sorting: SortingState::default(),
            filters: FilterState::default(),
            pagination: Pagination::default(),
        }
    }
}

/// Keeps the still known ids of `persisted` in their saved order, then appends the
/// remaining columns in declaration order. The select column is always moved first.
pub fn reconcile_order<R>(persisted: &[ColumnId], columns: &ColumnSet<R>) -> Vec<ColumnId> {
    let mut seen = HashSet::new();
    let mut order = Vec::with_capacity(columns.len());
    for id in persisted {
        if columns.contains(id) && seen.insert(id) {
            order.push(id.clone());
        }
    }
    for id in columns.ids() {
        if seen.insert(id) {
            order.push(id.clone());
        }
    }
    if let Some(pos) = order.iter().position(|id| id.is_select()) {
        if pos != 0 {
            let select = order.remove(pos);
            order.insert(0, select);
        }
    }
    order
}

/// Unseen columns are visible, columns that cannot be hidden are always visible.
pub fn reconcile_visibility<R>(
    persisted: &IndexMap<ColumnId, bool>,
    columns: &ColumnSet<R>,
) -> IndexMap<ColumnId, bool> {
    columns
        .iter()
        .map(|c| {
            let visible = !c.hideable || persisted.get(&c.id).copied().unwrap_or(true);
            (c.id.clone(), visible)
        })
        .collect()
}

/// Array move: remove `source`, insert it at `target`'s index. No-op when the ids are
/// equal or either is missing.
pub fn move_id(order: &mut Vec<ColumnId>, source: &ColumnId, target: &ColumnId) -> bool {
    if source == target {
        return false;
    }
    let (Some(from), Some(to)) = (
        order.iter().position(|id| id == source),
        order.iter().position(|id| id == target),
    ) else {
        return false;
    };
    let id = order.remove(from);
    order.insert(to, id);
    true
}

pub struct TableStateOptions<R> {
    pub persist_key: PersistKey,
    pub columns: ColumnSet<R>,
    /// Empty means declaration order.
    pub default_column_order: Vec<ColumnId>,
    pub default_column_visibility: IndexMap<ColumnId, bool>,
    pub get_row_id: fn(&R) -> RowId,
    pub on_select_data: Option<SelectDataFn<R>>,
    /// Off by default, header clicks replace the current sort.
    pub enable_multi_sort: bool,
    pub page_size: usize,
    pub sample_size: usize,
}

impl<R> TableStateOptions<R> {
    pub fn new(persist_key: PersistKey, columns: ColumnSet<R>, get_row_id: fn(&R) -> RowId) -> Self {
        TableStateOptions {
            persist_key,
            columns,
            default_column_order: vec![],
            default_column_visibility: IndexMap::new(),
            get_row_id,
            on_select_data: None,
            enable_multi_sort: false,
            page_size: DEFAULT_PAGE_SIZE,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    pub fn default_column_order(mut self, order: impl IntoIterator<Item = impl Into<ColumnId>>) -> Self {
        self.default_column_order = order.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_column_visibility(
        mut self,
        visibility: impl IntoIterator<Item = (impl Into<ColumnId>, bool)>,
    ) -> Self {
        self.default_column_visibility = visibility.into_iter().map(|(id, v)| (id.into(), v)).collect();
        self
    }

    pub fn on_select_data(mut self, f: impl FnMut(&[&R]) + 'static) -> Self {
        self.on_select_data = Some(Box::new(f));
        self
    }

    pub fn enable_multi_sort(mut self, enabled: bool) -> Self {
        self.enable_multi_sort = enabled;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }
}

/// View state of one mounted table over rows of type `R`.
pub struct TableStateStore<R> {
    key: PersistKey,
    storage: SharedStorage,
    columns: ColumnSet<R>,
    default_order: Vec<ColumnId>,
    default_visibility: IndexMap<ColumnId, bool>,
    page_size: usize,
    enable_multi_sort: bool,
    state: TableUiState,
    rows: Vec<R>,
    get_row_id: fn(&R) -> RowId,
    on_select_data: Option<SelectDataFn<R>>,
    types: ColumnTypeResolver,
}

impl<R> TableStateStore<R> {
    pub fn new(options: TableStateOptions<R>, storage: SharedStorage) -> Self {
        let mut store = TableStateStore {
            key: options.persist_key,
            storage,
            columns: options.columns,
            default_order: options.default_column_order,
            default_visibility: options.default_column_visibility,
            page_size: options.page_size,
            enable_multi_sort: options.enable_multi_sort,
            state: TableUiState::default(),
            rows: vec![],
            get_row_id: options.get_row_id,
            on_select_data: options.on_select_data,
            types: ColumnTypeResolver::new(options.sample_size),
        };
        store.load();
        store
    }

    fn defaults(&self) -> TableUiState {
        let mut pinning = ColumnPinning::default();
        for column in self.columns.iter() {
            if column.pin.is_some() {
                pinning.set(&column.id, column.pin);
            }
        }
        TableUiState {
            column_order: reconcile_order(&self.default_order, &self.columns),
            column_visibility: reconcile_visibility(&self.default_visibility, &self.columns),
            column_pinning: pinning,
            pagination: Pagination {
                page_index: 0,
                page_size: self.page_size,
            },
            ..TableUiState::default()
        }
    }

    fn load(&mut self) {
        let saved = match self.storage.try_borrow() {
            Ok(storage) => storage.get(&self.key.storage_key()),
            Err(_) => {
                warn!("{}: storage is busy, starting from defaults", self.key);
                None
            }
        };
        let mut state = match saved {
            Some(json) => match serde_json::from_str::<TableUiState>(&json) {
                Ok(state) => state,
                Err(e) => {
                    debug!("{}: discarding unreadable saved state: {e}", self.key);
                    self.defaults()
                }
            },
            None => {
                trace!("{}: no saved state", self.key);
                self.defaults()
            }
        };
        self.reconcile(&mut state);
        self.state = state;
    }

    fn reconcile(&self, state: &mut TableUiState) {
        let columns = &self.columns;
        let before = state.column_order.len();
        state.column_order = reconcile_order(&state.column_order, columns);
        if before > state.column_order.len() {
            debug!("{}: dropped unknown columns from saved order", self.key);
        }
        state.column_visibility = reconcile_visibility(&state.column_visibility, columns);

        state.column_pinning.retain(|id| columns.contains(id) && !id.is_select());
        if columns.has_select() {
            state.column_pinning.pin_leading(&ColumnId::new(SELECT_COLUMN_ID));
        }

        state.column_sizing = state
            .column_sizing
            .iter()
            .filter_map(|(id, size)| {
                let column = columns.get(id).filter(|c| c.resizable)?;
                size.is_finite().then(|| (id.clone(), column.clamp_size(*size)))
            })
            .collect();

        state.sorting.retain(|id| columns.get(id).is_some_and(|c| c.sortable));
        if !self.enable_multi_sort {
            state.sorting.0.truncate(1);
        }
        state.filters.columns.retain(|f| columns.contains(&f.id));
        if state.pagination.page_size == 0 {
            state.pagination.page_size = self.page_size;
        }
    }

    fn persist(&self) {
        let json = match serde_json::to_string(&self.state) {
            Ok(json) => json,
            Err(e) => {
                warn!("{}: cannot serialize table state: {e}", self.key);
                return;
            }
        };
        match self.storage.try_borrow_mut() {
            Ok(mut storage) => match storage.set(&self.key.storage_key(), json) {
                Ok(()) => trace!("{}: saved", self.key),
                Err(e) => warn!("{}: failed to save table state: {e}", self.key),
            },
            Err(_) => warn!("{}: storage is busy, table state not saved", self.key),
        }
    }

    fn selection_changed(&mut self) {
        self.persist();
        self.notify_selection();
    }

    fn notify_selection(&mut self) {
        let get_row_id = self.get_row_id;
        let selection = &self.state.row_selection;
        if let Some(callback) = self.on_select_data.as_mut() {
            let selected: Vec<&R> = self
                .rows
                .iter()
                .filter(|row| selection.get(&get_row_id(row)) == Some(&true))
                .collect();
            callback(&selected);
        }
    }

    pub fn persist_key(&self) -> &PersistKey {
        &self.key
    }

    /// Switches to another namespace and loads its state. `on_select_data` fires when the
    /// loaded selection differs from the previous key's.
    pub fn set_persist_key(&mut self, key: PersistKey) {
        if key != self.key {
            let previous = std::mem::take(&mut self.state.row_selection);
            self.key = key;
            self.load();
            if self.state.row_selection != previous {
                self.notify_selection();
            }
        }
    }

    pub fn columns(&self) -> &ColumnSet<R> {
        &self.columns
    }

    /// Replaces the live column set and reconciles the current state against it.
    pub fn set_columns(&mut self, columns: ColumnSet<R>) {
        self.columns = columns;
        let mut state = self.state.clone();
        self.reconcile(&mut state);
        if state != self.state {
            self.state = state;
            self.persist();
        }
    }

    pub fn state(&self) -> &TableUiState {
        &self.state
    }

    pub fn column_order(&self) -> &[ColumnId] {
        &self.state.column_order
    }

    pub fn is_column_visible(&self, id: &ColumnId) -> bool {
        self.state.column_visibility.get(id).copied().unwrap_or(true)
    }

    /// Visible columns in their resolved order, pinning not applied.
    pub fn visible_columns(&self) -> Vec<&ColumnDescriptor<R>> {
        self.state
            .column_order
            .iter()
            .filter(|id| self.is_column_visible(id))
            .filter_map(|id| self.columns.get(id))
            .collect()
    }

    pub fn column_pinning(&self) -> &ColumnPinning {
        &self.state.column_pinning
    }

    pub fn column_size(&self, id: &ColumnId) -> f32 {
        match self.state.column_sizing.get(id) {
            Some(size) => *size,
            None => self.columns.get(id).map(|c| c.size).unwrap_or_default(),
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Replaces the loaded rows. Selection is keyed by row id and is kept as is.
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.rows = rows;
    }

    /// Filters, sorts and pages `rows` locally, keeping the current page loaded.
    /// Returns the number of rows that passed the filters.
    pub fn load_client_side(&mut self, rows: Vec<R>) -> usize {
        let types = self.types.all_column_types(&self.columns, &rows);
        let mut rows: Vec<R> = rows
            .into_iter()
            .filter(|row| self.state.filters.matches_row(row, &self.columns, &types))
            .collect();
        sort_rows(&mut rows, &self.state.sorting, &self.columns);
        let total = rows.len();
        let last_page = self.state.pagination.page_count(total) - 1;
        if self.state.pagination.page_index > last_page {
            self.state.pagination.page_index = last_page;
            self.persist();
        }
        let range = self.state.pagination.page_range(total);
        self.rows = rows.into_iter().skip(range.start).take(range.len()).collect();
        total
    }

    pub fn row_id(&self, row: &R) -> RowId {
        (self.get_row_id)(row)
    }

    pub fn find_row(&self, id: &RowId) -> Option<&R> {
        self.rows.iter().find(|row| &self.row_id(row) == id)
    }

    pub fn is_scrollable(&self) -> bool {
        self.state.is_scrollable
    }

    pub fn set_scrollable(&mut self, scrollable: bool) {
        if self.state.is_scrollable != scrollable {
            self.state.is_scrollable = scrollable;
            self.persist();
        }
    }

    pub fn toggle_scrollable(&mut self) {
        self.set_scrollable(!self.state.is_scrollable);
    }

    // Row selection

    pub fn is_row_selected(&self, id: &RowId) -> bool {
        self.state.row_selection.get(id).copied().unwrap_or(false)
    }

    pub fn set_row_selected(&mut self, id: &RowId, selected: bool) {
        if self.is_row_selected(id) == selected {
            return;
        }
        if selected {
            self.state.row_selection.insert(id.clone(), true);
        } else {
            self.state.row_selection.shift_remove(id);
        }
        self.selection_changed();
    }

    pub fn toggle_row(&mut self, id: &RowId) {
        self.set_row_selected(id, !self.is_row_selected(id));
    }

    /// Selects every loaded row.
    pub fn select_all(&mut self) {
        let mut changed = false;
        for row in &self.rows {
            let id = (self.get_row_id)(row);
            changed |= self.state.row_selection.insert(id, true) != Some(true);
        }
        if changed {
            self.selection_changed();
        }
    }

    /// Header checkbox: deselects the loaded rows if all of them are selected, otherwise
    /// selects them all.
    pub fn toggle_all(&mut self) {
        if self.is_all_selected() {
            for row in &self.rows {
                let id = (self.get_row_id)(row);
                self.state.row_selection.shift_remove(&id);
            }
            self.selection_changed();
        } else {
            self.select_all();
        }
    }

    pub fn clear_selection(&mut self) {
        if !self.state.row_selection.is_empty() {
            self.state.row_selection.clear();
            self.selection_changed();
        }
    }

    pub fn is_all_selected(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|row| self.is_row_selected(&self.row_id(row)))
    }

    pub fn selected_count(&self) -> usize {
        self.state.row_selection.values().filter(|s| **s).count()
    }

    pub fn selected_row_ids(&self) -> Vec<RowId> {
        self.state
            .row_selection
            .iter()
            .filter(|(_, s)| **s)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Selected rows among the loaded ones.
    pub fn selected_rows(&self) -> Vec<&R> {
        self.rows
            .iter()
            .filter(|row| self.is_row_selected(&self.row_id(row)))
            .collect()
    }

    pub fn handle_row_event<H: RowHandler<R> + ?Sized>(
        &mut self,
        row_id: &RowId,
        event: RowEvent,
        handler: &mut H,
    ) {
        let get_row_id = self.get_row_id;
        let Some(row) = self.rows.iter().find(|row| &get_row_id(row) == row_id) else {
            debug!("{}: event for unknown row {row_id}", self.key);
            return;
        };
        match event {
            RowEvent::Click => handler.on_row_click(row),
            RowEvent::DoubleClick => {
                if handler.on_double_click(row) == Handled::No {
                    self.toggle_row(row_id);
                }
            }
        }
    }

    // Columns

    pub fn set_column_visible(&mut self, id: &ColumnId, visible: bool) {
        let Some(column) = self.columns.get(id) else {
            return;
        };
        if !column.hideable || self.is_column_visible(id) == visible {
            return;
        }
        self.state.column_visibility.insert(id.clone(), visible);
        self.persist();
    }

    pub fn toggle_column_visible(&mut self, id: &ColumnId) {
        self.set_column_visible(id, !self.is_column_visible(id));
    }

    pub fn set_all_columns_visible(&mut self, visible: bool) {
        let mut changed = false;
        for column in self.columns.iter().filter(|c| c.hideable) {
            changed |= self.state.column_visibility.insert(column.id.clone(), visible) != Some(visible);
        }
        if changed {
            self.persist();
        }
    }

    /// Drag and drop reorder. The select column neither moves nor accepts drops.
    pub fn move_column(&mut self, source: &ColumnId, target: &ColumnId) -> bool {
        if source.is_select() || target.is_select() {
            return false;
        }
        let moved = move_id(&mut self.state.column_order, source, target);
        if moved {
            self.persist();
        }
        moved
    }

    pub fn set_column_order(&mut self, order: Vec<ColumnId>) {
        let order = reconcile_order(&order, &self.columns);
        if order != self.state.column_order {
            self.state.column_order = order;
            self.persist();
        }
    }

    pub fn pin_column(&mut self, id: &ColumnId, side: Option<PinSide>) {
        if id.is_select() || !self.columns.contains(id) {
            return;
        }
        if self.state.column_pinning.side(id) == side {
            return;
        }
        self.state.column_pinning.set(id, side);
        self.persist();
    }

    pub fn set_column_size(&mut self, id: &ColumnId, size: f32) {
        let Some(column) = self.columns.get(id).filter(|c| c.resizable) else {
            return;
        };
        if !size.is_finite() {
            return;
        }
        let size = column.clamp_size(size);
        if (self.column_size(id) - size).abs() > f32::EPSILON {
            self.state.column_sizing.insert(id.clone(), size);
            self.persist();
        }
    }

    pub fn reset_column_size(&mut self, id: &ColumnId) {
        if self.state.column_sizing.shift_remove(id).is_some() {
            self.persist();
        }
    }

    // Sorting

    pub fn sorting(&self) -> &SortingState {
        &self.state.sorting
    }

    pub fn toggle_sort(&mut self, id: &ColumnId) {
        let Some(column) = self.columns.get(id).filter(|c| c.sortable) else {
            return;
        };
        let multi = self.enable_multi_sort && column.multi_sortable;
        self.state.sorting.toggle(id, multi);
        self.persist();
    }

    pub fn set_sorting(&mut self, mut sorting: SortingState) {
        let columns = &self.columns;
        sorting.retain(|id| columns.get(id).is_some_and(|c| c.sortable));
        if !self.enable_multi_sort {
            sorting.0.truncate(1);
        }
        if sorting != self.state.sorting {
            self.state.sorting = sorting;
            self.persist();
        }
    }

    // Filters

    pub fn filters(&self) -> &FilterState {
        &self.state.filters
    }

    pub fn set_global_filter(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.state.filters.global {
            self.state.filters.global = text;
            self.state.pagination.page_index = 0;
            self.persist();
        }
    }

    pub fn upsert_column_filter(&mut self, filter: ColumnFilter) {
        if !self.columns.contains(&filter.id) {
            return;
        }
        self.state.filters.upsert(filter);
        self.state.pagination.page_index = 0;
        self.persist();
    }

    pub fn remove_column_filter(&mut self, id: &ColumnId) {
        if self.state.filters.remove(id) {
            self.state.pagination.page_index = 0;
            self.persist();
        }
    }

    pub fn clear_filters(&mut self) {
        if !self.state.filters.is_empty() {
            self.state.filters.global.clear();
            self.state.filters.columns.clear();
            self.state.pagination.page_index = 0;
            self.persist();
        }
    }

    pub fn set_filter_logic(&mut self, logic: FilterLogic) {
        if self.state.filters.logic != logic {
            self.state.filters.logic = logic;
            self.persist();
        }
    }

    pub fn toggle_filter_logic(&mut self) {
        self.set_filter_logic(self.state.filters.logic.toggled());
    }

    /// Filter on `id` using the default operation for its inferred type.
    pub fn filter_for(&mut self, id: &ColumnId, value: impl Into<String>) -> ColumnFilter {
        let op = self.column_type(id).default_filter();
        ColumnFilter::new(id.clone(), op, value)
    }

    // Column types

    pub fn column_type(&mut self, id: &ColumnId) -> ColumnType {
        self.types.column_type(id, &self.columns, &self.rows)
    }

    pub fn column_types(&mut self) -> IndexMap<ColumnId, ColumnType> {
        self.types.all_column_types(&self.columns, &self.rows)
    }

    pub fn set_column_type(&mut self, id: ColumnId, ty: ColumnType) {
        self.types.set_column_type(id, ty);
    }

    /// Call when a new query replaces the data set.
    pub fn clear_column_types(&mut self) {
        self.types.clear_cache();
    }

    // Pagination

    pub fn pagination(&self) -> Pagination {
        self.state.pagination
    }

    pub fn set_page(&mut self, page_index: usize) {
        if self.state.pagination.page_index != page_index {
            self.state.pagination.page_index = page_index;
            self.persist();
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        if page_size != 0 && self.state.pagination.page_size != page_size {
            self.state.pagination = Pagination {
                page_index: 0,
                page_size,
            };
            self.persist();
        }
    }

    pub fn query_params(&self) -> QueryParams {
        QueryParams::new(self.state.pagination, &self.state.sorting, &self.state.filters)
    }

    /// Restores the default view, the row selection is kept.
    pub fn reset(&mut self) {
        let selection = std::mem::take(&mut self.state.row_selection);
        let mut state = self.defaults();
        state.row_selection = selection;
        self.reconcile(&mut state);
        self.state = state;
        self.persist();
    }

    /// Forgets the saved state of this key and starts over from defaults.
    pub fn clear_persisted(&mut self) {
        match self.storage.try_borrow_mut() {
            Ok(mut storage) => {
                if let Err(e) = storage.remove(&self.key.storage_key()) {
                    warn!("{}: failed to clear saved state: {e}", self.key);
                }
            }
            Err(_) => warn!("{}: storage is busy, saved state not cleared", self.key),
        }
        let had_selection = !self.state.row_selection.is_empty();
        let mut state = self.defaults();
        self.reconcile(&mut state);
        self.state = state;
        if had_selection {
            if let Some(callback) = self.on_select_data.as_mut() {
                callback(&[]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use proptest::prelude::*;

    use super::*;
    use crate::storage::{shared, MemoryStorage, StateStorage, StorageError};
    use crate::value::CellValue;

    #[derive(Clone, Debug)]
    struct Member {
        id: u32,
        name: &'static str,
        balance: f64,
    }

    fn member(id: u32, name: &'static str, balance: f64) -> Member {
        Member { id, name, balance }
    }

    fn member_columns() -> Vec<ColumnDescriptor<Member>> {
        vec![
            ColumnDescriptor::new("name", "Name", |m: &Member| m.name.into()),
            ColumnDescriptor::new("balance", "Balance", |m: &Member| m.balance.into()).number(2),
            ColumnDescriptor::new("branch", "Branch", |_: &Member| "Main".into()),
            ColumnDescriptor::new("member_no", "Member #", |m: &Member| m.id.into()).hideable(false),
        ]
    }

    fn options() -> TableStateOptions<Member> {
        TableStateOptions::new(
            PersistKey::new(["members", "view"]),
            ColumnSet::with_select(member_columns()).unwrap(),
            |m: &Member| m.id.into(),
        )
    }

    fn ids(names: &[&str]) -> Vec<ColumnId> {
        names.iter().map(|n| ColumnId::from(*n)).collect()
    }

    fn saved(storage: &SharedStorage) -> TableUiState {
        let json = storage
            .borrow()
            .get("datatable:members:view")
            .expect("state was persisted");
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn first_mount_uses_defaults() {
        let storage = shared(MemoryStorage::default());
        let store = TableStateStore::new(
            options().default_column_visibility([("branch", false)]),
            storage,
        );
        assert_eq!(
            store.column_order(),
            ids(&["select", "name", "balance", "branch", "member_no"])
        );
        assert!(!store.is_column_visible(&"branch".into()));
        assert!(store.is_column_visible(&"name".into()));
        assert!(store.is_scrollable());
        assert_eq!(store.column_pinning().left, ids(&["select"]));
        assert_eq!(store.pagination().page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn persisted_state_is_reconciled() {
        let storage = shared(MemoryStorage::default());
        let stale = TableUiState {
            column_order: ids(&["balance", "ghost", "name"]),
            column_visibility: IndexMap::from([
                ("name".into(), false),
                ("ghost".into(), false),
                ("member_no".into(), false),
            ]),
            column_pinning: ColumnPinning {
                left: ids(&["ghost"]),
                right: ids(&["balance"]),
            },
            column_sizing: IndexMap::from([("name".into(), 5.0), ("ghost".into(), 80.0)]),
            sorting: SortingState::single("ghost", false),
            ..TableUiState::default()
        };
        storage
            .borrow_mut()
            .set("datatable:members:view", serde_json::to_string(&stale).unwrap())
            .unwrap();

        let store = TableStateStore::new(options(), storage);
        assert_eq!(
            store.column_order(),
            ids(&["select", "balance", "name", "branch", "member_no"])
        );
        assert!(!store.is_column_visible(&"name".into()));
        assert!(store.is_column_visible(&"branch".into()));
        assert!(store.is_column_visible(&"member_no".into()));
        assert!(!store.state().column_visibility.contains_key(&ColumnId::from("ghost")));
        assert_eq!(store.column_pinning().left, ids(&["select"]));
        assert_eq!(store.column_pinning().right, ids(&["balance"]));
        assert_eq!(store.column_size(&"name".into()), 20.0);
        assert!(store.sorting().is_empty());
    }

    #[test]
    fn corrupt_state_falls_back_to_defaults() {
        let storage = shared(MemoryStorage::default());
        storage
            .borrow_mut()
            .set("datatable:members:view", "{\"column_order\": 42".into())
            .unwrap();
        let store = TableStateStore::new(options(), storage);
        assert_eq!(store.column_order().len(), 5);
    }

    #[test]
    fn drag_reorder_moves_and_persists() {
        let mut order = ids(&["a", "b", "c", "d"]);
        assert!(move_id(&mut order, &"a".into(), &"c".into()));
        assert_eq!(order, ids(&["b", "c", "a", "d"]));
        assert!(!move_id(&mut order, &"a".into(), &"a".into()));
        assert!(!move_id(&mut order, &"a".into(), &"zzz".into()));
        assert_eq!(order, ids(&["b", "c", "a", "d"]));

        let storage = shared(MemoryStorage::default());
        let mut store = TableStateStore::new(options(), storage.clone());
        assert!(store.move_column(&"name".into(), &"branch".into()));
        assert!(!store.move_column(&"name".into(), &"select".into()));
        assert_eq!(
            saved(&storage).column_order,
            ids(&["select", "balance", "branch", "name", "member_no"])
        );
    }

    #[test]
    fn state_survives_remount() {
        let storage = shared(MemoryStorage::default());
        let mut store = TableStateStore::new(options(), storage.clone());
        store.set_column_visible(&"balance".into(), false);
        store.set_column_visible(&"member_no".into(), false);
        store.pin_column(&"name".into(), Some(PinSide::Left));
        store.toggle_scrollable();
        store.toggle_sort(&"balance".into());
        drop(store);

        let store = TableStateStore::new(options(), storage);
        assert!(!store.is_column_visible(&"balance".into()));
        assert!(store.is_column_visible(&"member_no".into()));
        assert_eq!(store.column_pinning().left, ids(&["select", "name"]));
        assert!(!store.is_scrollable());
        assert_eq!(store.sorting(), &SortingState::single("balance", false));
    }

    #[test]
    fn keys_do_not_collide() {
        let storage = shared(MemoryStorage::default());
        let mut members = TableStateStore::new(options(), storage.clone());
        members.set_column_visible(&"name".into(), false);
        let mut other = options();
        other.persist_key = PersistKey::new(["members", "view", "archived"]);
        let archived = TableStateStore::new(other, storage.clone());
        assert!(archived.is_column_visible(&"name".into()));

        members.set_persist_key(PersistKey::new(["members", "view", "archived"]));
        assert!(members.is_column_visible(&"name".into()));
        members.set_persist_key(PersistKey::new(["members", "view"]));
        assert!(!members.is_column_visible(&"name".into()));
    }

    #[test]
    fn key_switch_reports_the_loaded_selection() {
        let seen = Rc::new(RefCell::new(Vec::<Vec<u32>>::new()));
        let sink = seen.clone();
        let storage = shared(MemoryStorage::default());
        let mut store = TableStateStore::new(
            options().on_select_data(move |rows: &[&Member]| {
                sink.borrow_mut().push(rows.iter().map(|m| m.id).collect());
            }),
            storage,
        );
        store.set_rows(vec![member(1, "Ana", 1.0), member(2, "Ben", 2.0)]);
        store.toggle_row(&RowId::from(1u32));

        store.set_persist_key(PersistKey::new(["members", "view", "archived"]));
        assert_eq!(store.selected_count(), 0);
        store.set_persist_key(PersistKey::new(["members", "view"]));
        assert!(store.is_row_selected(&RowId::from(1u32)));
        store.set_persist_key(PersistKey::new(["members", "view"]));
        assert_eq!(*seen.borrow(), vec![vec![1], vec![], vec![1]]);
    }

    #[test]
    fn derived_changes_are_saved() {
        let storage = shared(MemoryStorage::default());
        let mut store = TableStateStore::new(options().page_size(2), storage.clone());
        store.set_page(3);
        assert_eq!(saved(&storage).pagination.page_index, 3);
        store.load_client_side(vec![member(1, "Ana", 1.0), member(2, "Ben", 2.0), member(3, "Cruz", 3.0)]);
        assert_eq!(store.pagination().page_index, 1);
        assert_eq!(saved(&storage).pagination.page_index, 1);

        let columns: Vec<_> = member_columns()
            .into_iter()
            .filter(|c| c.id.as_str() != "branch")
            .collect();
        store.set_columns(ColumnSet::with_select(columns).unwrap());
        assert_eq!(
            saved(&storage).column_order,
            ids(&["select", "name", "balance", "member_no"])
        );
    }

    #[test]
    fn selection_is_keyed_by_row_id() {
        let storage = shared(MemoryStorage::default());
        let mut store = TableStateStore::new(options(), storage);
        store.set_rows(vec![
            member(1, "Ana", 10.0),
            member(2, "Ben", 30.0),
            member(3, "Cruz", 20.0),
        ]);
        store.toggle_row(&RowId::from(1u32));
        let position = |store: &TableStateStore<Member>| {
            store.rows().iter().position(|m| m.id == 1).unwrap()
        };
        assert_eq!(position(&store), 0);

        let mut rows = store.rows().to_vec();
        sort_rows(&mut rows, &SortingState::single("balance", true), store.columns());
        store.set_rows(rows);
        assert_eq!(position(&store), 2);
        assert!(store.is_row_selected(&RowId::from(1u32)));
        assert_eq!(store.selected_rows().len(), 1);
        assert_eq!(store.selected_rows()[0].name, "Ana");
    }

    #[test]
    fn select_all_and_callback() {
        let seen = Rc::new(RefCell::new(Vec::<Vec<u32>>::new()));
        let sink = seen.clone();
        let storage = shared(MemoryStorage::default());
        let mut store = TableStateStore::new(
            options().on_select_data(move |rows: &[&Member]| {
                sink.borrow_mut().push(rows.iter().map(|m| m.id).collect());
            }),
            storage,
        );
        store.set_rows(vec![member(1, "Ana", 1.0), member(2, "Ben", 2.0)]);
        store.toggle_all();
        assert!(store.is_all_selected());
        store.toggle_row(&RowId::from(2u32));
        store.toggle_all();
        store.toggle_all();
        store.clear_selection();
        assert_eq!(
            *seen.borrow(),
            vec![vec![1, 2], vec![1], vec![1, 2], vec![]]
        );
        assert_eq!(store.selected_count(), 0);
    }

    #[test]
    fn double_click_defaults_to_toggle() {
        struct Recorder {
            clicks: Vec<u32>,
            claim_double: bool,
        }
        impl RowHandler<Member> for Recorder {
            fn on_row_click(&mut self, row: &Member) {
                self.clicks.push(row.id);
            }
            fn on_double_click(&mut self, _row: &Member) -> Handled {
                if self.claim_double { Handled::Yes } else { Handled::No }
            }
        }

        let storage = shared(MemoryStorage::default());
        let mut store = TableStateStore::new(options(), storage);
        store.set_rows(vec![member(7, "Ana", 1.0)]);
        let id = RowId::from(7u32);
        let mut handler = Recorder {
            clicks: vec![],
            claim_double: false,
        };
        store.handle_row_event(&id, RowEvent::Click, &mut handler);
        assert_eq!(handler.clicks, vec![7]);
        assert!(!store.is_row_selected(&id));
        store.handle_row_event(&id, RowEvent::DoubleClick, &mut handler);
        assert!(store.is_row_selected(&id));
        handler.claim_double = true;
        store.handle_row_event(&id, RowEvent::DoubleClick, &mut handler);
        assert!(store.is_row_selected(&id));
        store.handle_row_event(&RowId::from("missing"), RowEvent::DoubleClick, &mut ());
        assert_eq!(store.selected_count(), 1);
    }

    #[test]
    fn writes_are_applied_in_order() {
        let storage = shared(MemoryStorage::default());
        let mut store = TableStateStore::new(options(), storage.clone());
        store.toggle_scrollable();
        assert!(!saved(&storage).is_scrollable);
        store.toggle_scrollable();
        assert!(saved(&storage).is_scrollable);
    }

    struct FailingStorage;

    impl StateStorage for FailingStorage {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }
        fn set(&mut self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(std::io::Error::other("disk full").into())
        }
        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Err(std::io::Error::other("disk full").into())
        }
    }

    #[test]
    fn storage_failures_are_swallowed() {
        let mut store = TableStateStore::new(options(), shared(FailingStorage));
        store.set_column_visible(&"name".into(), false);
        assert!(!store.is_column_visible(&"name".into()));
        store.clear_persisted();
        assert!(store.is_column_visible(&"name".into()));
    }

    #[test]
    fn sizing_filters_and_paging() {
        let storage = shared(MemoryStorage::default());
        let mut store = TableStateStore::new(options().page_size(2), storage);
        store.set_column_size(&"name".into(), 400.0);
        store.set_column_size(&"select".into(), 400.0);
        assert_eq!(store.column_size(&"name".into()), 400.0);
        assert_eq!(store.column_size(&"select".into()), 48.0);

        let all = vec![
            member(1, "Ana", 10.0),
            member(2, "Ben", 30.0),
            member(3, "Cruz", 20.0),
            member(4, "Dina", 40.0),
        ];
        store.toggle_sort(&"balance".into());
        store.set_page(1);
        assert_eq!(store.load_client_side(all.clone()), 4);
        let names: Vec<_> = store.rows().iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Ben", "Dina"]);

        let filter = store.filter_for(&"balance".into(), "30");
        assert_eq!(filter.op, crate::filter::FilterOperation::Equals);
        store.upsert_column_filter(filter);
        assert_eq!(store.pagination().page_index, 0);
        assert_eq!(store.load_client_side(all.clone()), 1);
        assert_eq!(store.rows()[0].name, "Ben");

        store.set_global_filter("zzz");
        assert_eq!(store.load_client_side(all), 0);
        assert!(store.rows().is_empty());

        let params = store.query_params();
        assert_eq!(params.page_size, 2);
        assert_eq!(params.sort, crate::sort::encode_sorting(store.sorting()));
    }

    #[test]
    fn reset_keeps_selection() {
        let storage = shared(MemoryStorage::default());
        let mut store = TableStateStore::new(options(), storage);
        store.set_rows(vec![member(1, "Ana", 1.0)]);
        store.toggle_row(&RowId::from(1u32));
        store.set_column_visible(&"name".into(), false);
        store.reset();
        assert!(store.is_column_visible(&"name".into()));
        assert!(store.is_row_selected(&RowId::from(1u32)));
    }

    #[test]
    fn multi_sort_needs_opt_in() {
        let storage = shared(MemoryStorage::default());
        let mut single = TableStateStore::new(options(), storage.clone());
        single.toggle_sort(&"name".into());
        single.toggle_sort(&"balance".into());
        assert_eq!(single.sorting().0.len(), 1);

        let mut other = options().enable_multi_sort(true);
        other.persist_key = PersistKey::new(["members", "multi"]);
        let mut multi = TableStateStore::new(other, storage);
        multi.toggle_sort(&"name".into());
        multi.toggle_sort(&"balance".into());
        multi.toggle_sort(&"select".into());
        assert_eq!(multi.sorting().0.len(), 2);
    }

    const UNIVERSE: [&str; 6] = ["a", "b", "c", "d", "e", "f"];
    const WIDER: [&str; 8] = ["a", "b", "c", "d", "e", "f", "x", "y"];

    fn column_set(names: &[&str]) -> ColumnSet<()> {
        ColumnSet::new(
            names
                .iter()
                .map(|n| ColumnDescriptor::new(*n, *n, |_: &()| CellValue::Empty)),
        )
        .unwrap()
    }

    proptest! {
        #[test]
        fn reconcile_order_is_an_idempotent_permutation(
            current in proptest::sample::subsequence(UNIVERSE.to_vec(), 0..=UNIVERSE.len()).prop_shuffle(),
            persisted in proptest::collection::vec(proptest::sample::select(WIDER.to_vec()), 0..12),
        ) {
            let columns = column_set(&current);
            let persisted = ids(&persisted);
            let once = reconcile_order(&persisted, &columns);

            let mut sorted_once = once.clone();
            sorted_once.sort();
            let mut sorted_current = ids(&current);
            sorted_current.sort();
            prop_assert_eq!(sorted_once, sorted_current);

            let mut kept = Vec::new();
            for id in &persisted {
                if columns.contains(id) && !kept.contains(id) {
                    kept.push(id.clone());
                }
            }
            prop_assert_eq!(&once[..kept.len()], &kept[..]);
            let appended: Vec<ColumnId> = ids(&current).into_iter().filter(|id| !kept.contains(id)).collect();
            prop_assert_eq!(&once[kept.len()..], &appended[..]);

            prop_assert_eq!(reconcile_order(&once, &columns), once);
        }

        #[test]
        fn unseen_columns_default_visible(
            current in proptest::sample::subsequence(UNIVERSE.to_vec(), 0..=UNIVERSE.len()),
            hidden in proptest::sample::subsequence(WIDER.to_vec(), 0..=WIDER.len()),
        ) {
            let columns = column_set(&current);
            let persisted: IndexMap<ColumnId, bool> = hidden.iter().map(|n| (ColumnId::from(*n), false)).collect();
            let visibility = reconcile_visibility(&persisted, &columns);
            for id in columns.ids() {
                prop_assert_eq!(visibility[id], !persisted.contains_key(id));
            }
            prop_assert_eq!(visibility.len(), columns.len());
        }
    }
}
