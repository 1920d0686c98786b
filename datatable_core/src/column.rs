use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::value::CellValue;
use crate::{ColumnId, SELECT_COLUMN_ID};

pub const DEFAULT_COLUMN_SIZE: f32 = 150.0;
pub const DEFAULT_MIN_COLUMN_SIZE: f32 = 20.0;
pub const SELECT_COLUMN_SIZE: f32 = 48.0;

/// Extracts a cell value from a row entity.
pub type Accessor<R> = fn(&R) -> CellValue;
/// Produces display text for [`CellKind::Custom`] cells.
pub type CustomCellFn<R> = fn(&R) -> String;

#[derive(Clone, Debug, PartialEq)]
pub enum HeaderKind {
    Label(String),
    /// Select-all checkbox of the synthetic select column.
    SelectAll,
}

impl HeaderKind {
    pub fn label(&self) -> &str {
        match self {
            HeaderKind::Label(label) => label.as_str(),
            HeaderKind::SelectAll => "",
        }
    }
}

/// How a cell turns its value into text.
pub enum CellKind<R> {
    Text,
    Number { decimals: usize },
    Boolean,
    Date { format: String },
    /// Row checkbox of the select column, rendered by the frontend.
    Select,
    Custom(CustomCellFn<R>),
}

impl<R> Clone for CellKind<R> {
    fn clone(&self) -> Self {
        match self {
            CellKind::Text => CellKind::Text,
            CellKind::Number { decimals } => CellKind::Number {
                decimals: *decimals,
            },
            CellKind::Boolean => CellKind::Boolean,
            CellKind::Date { format } => CellKind::Date {
                format: format.clone(),
            },
            CellKind::Select => CellKind::Select,
            CellKind::Custom(f) => CellKind::Custom(*f),
        }
    }
}

impl<R> CellKind<R> {
    pub fn render(&self, row: &R, value: &CellValue) -> String {
        match self {
            CellKind::Text => value.to_string(),
            CellKind::Number { decimals } => match value.as_f64() {
                Some(x) => format!("{x:.prec$}", prec = *decimals),
                None => value.to_string(),
            },
            CellKind::Boolean => match value.as_bool() {
                Some(true) => "Yes".to_string(),
                Some(false) => "No".to_string(),
                None => value.to_string(),
            },
            CellKind::Date { format } => match value {
                CellValue::Date(d) => d.format(format).to_string(),
                CellValue::DateTime(dt) => dt.format(format).to_string(),
                other => other.to_string(),
            },
            CellKind::Select => String::new(),
            CellKind::Custom(f) => f(row),
        }
    }

    pub fn align(&self) -> CellAlign {
        match self {
            CellKind::Number { .. } => CellAlign::Right,
            CellKind::Boolean | CellKind::Select => CellAlign::Center,
            _ => CellAlign::Left,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CellAlign {
    Left,
    Center,
    Right,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FooterKind {
    Label(String),
    /// Sum of numeric values over the loaded rows.
    Sum,
    /// Count of non-empty values over the loaded rows.
    Count,
}

/// Editor shown by editable cells.
#[derive(Clone, Debug, PartialEq)]
pub enum EditInput {
    Text,
    Number,
    Checkbox,
    Select { options: Vec<String> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditMeta {
    pub input: EditInput,
    pub read_only: bool,
}

impl EditMeta {
    pub fn new(input: EditInput) -> Self {
        EditMeta {
            input,
            read_only: false,
        }
    }
}

#[derive(
    strum::EnumIter,
    strum::Display,
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PinSide {
    Left,
    Right,
}

/// Static definition of one table column.
pub struct ColumnDescriptor<R> {
    pub id: ColumnId,
    pub accessor: Accessor<R>,
    pub header: HeaderKind,
    pub cell: CellKind<R>,
    pub footer: Option<FooterKind>,
    pub meta: Option<EditMeta>,
    /// Pinning applied when no persisted pinning exists.
    pub pin: Option<PinSide>,
    pub sortable: bool,
    pub resizable: bool,
    pub hideable: bool,
    pub multi_sortable: bool,
    pub size: f32,
    pub min_size: f32,
    pub max_size: f32,
}

impl<R> Clone for ColumnDescriptor<R> {
    fn clone(&self) -> Self {
        ColumnDescriptor {
            id: self.id.clone(),
            accessor: self.accessor,
            header: self.header.clone(),
            cell: self.cell.clone(),
            footer: self.footer.clone(),
            meta: self.meta.clone(),
            pin: self.pin,
            sortable: self.sortable,
            resizable: self.resizable,
            hideable: self.hideable,
            multi_sortable: self.multi_sortable,
            size: self.size,
            min_size: self.min_size,
            max_size: self.max_size,
        }
    }
}

impl<R> ColumnDescriptor<R> {
    pub fn new(id: impl Into<ColumnId>, header: impl AsRef<str>, accessor: Accessor<R>) -> Self {
        ColumnDescriptor {
            id: id.into(),
            accessor,
            header: HeaderKind::Label(header.as_ref().to_string()),
            cell: CellKind::Text,
            footer: None,
            meta: None,
            pin: None,
            sortable: true,
            resizable: true,
            hideable: true,
            multi_sortable: true,
            size: DEFAULT_COLUMN_SIZE,
            min_size: DEFAULT_MIN_COLUMN_SIZE,
            max_size: f32::MAX,
        }
    }

    /// Row checkbox column with a left pinned action slot.
    pub fn select() -> Self {
        ColumnDescriptor {
            id: ColumnId::new(SELECT_COLUMN_ID),
            accessor: |_| CellValue::Empty,
            header: HeaderKind::SelectAll,
            cell: CellKind::Select,
            footer: None,
            meta: None,
            pin: Some(PinSide::Left),
            sortable: false,
            resizable: false,
            hideable: false,
            multi_sortable: false,
            size: SELECT_COLUMN_SIZE,
            min_size: SELECT_COLUMN_SIZE,
            max_size: SELECT_COLUMN_SIZE,
        }
    }

    pub fn is_select(&self) -> bool {
        self.id.is_select()
    }

    pub fn value(&self, row: &R) -> CellValue {
        (self.accessor)(row)
    }

    pub fn render(&self, row: &R) -> String {
        self.cell.render(row, &self.value(row))
    }

    pub fn clamp_size(&self, size: f32) -> f32 {
        size.max(self.min_size).min(self.max_size)
    }

    pub fn cell(mut self, cell: CellKind<R>) -> Self {
        self.cell = cell;
        self
    }

    pub fn number(self, decimals: usize) -> Self {
        self.cell(CellKind::Number { decimals })
    }

    pub fn boolean(self) -> Self {
        self.cell(CellKind::Boolean)
    }

    pub fn date(self, format: impl Into<String>) -> Self {
        self.cell(CellKind::Date {
            format: format.into(),
        })
    }

    pub fn custom(self, f: CustomCellFn<R>) -> Self {
        self.cell(CellKind::Custom(f))
    }

    pub fn footer(mut self, footer: FooterKind) -> Self {
        self.footer = Some(footer);
        self
    }

    pub fn editable(mut self, meta: EditMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn pinned(mut self, side: PinSide) -> Self {
        self.pin = Some(side);
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn hideable(mut self, hideable: bool) -> Self {
        self.hideable = hideable;
        self
    }

    pub fn multi_sortable(mut self, multi_sortable: bool) -> Self {
        self.multi_sortable = multi_sortable;
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn min_size(mut self, min_size: f32) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn max_size(mut self, max_size: f32) -> Self {
        self.max_size = max_size;
        self
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ColumnError {
    #[error("duplicate column id `{0}`")]
    DuplicateId(ColumnId),
    #[error("the select column must be the first column")]
    SelectNotFirst,
    #[error("the select column cannot be sortable, resizable or hideable")]
    SelectCapabilities,
}

/// Ordered, validated list of column descriptors.
pub struct ColumnSet<R> {
    columns: Vec<ColumnDescriptor<R>>,
}

impl<R> Clone for ColumnSet<R> {
    fn clone(&self) -> Self {
        ColumnSet {
            columns: self.columns.clone(),
        }
    }
}

impl<R> ColumnSet<R> {
    pub fn new(columns: impl IntoIterator<Item = ColumnDescriptor<R>>) -> Result<Self, ColumnError> {
        let columns: Vec<_> = columns.into_iter().collect();
        let mut seen = HashSet::new();
        for (idx, column) in columns.iter().enumerate() {
            if !seen.insert(&column.id) {
                return Err(ColumnError::DuplicateId(column.id.clone()));
            }
            if column.is_select() {
                if idx != 0 {
                    return Err(ColumnError::SelectNotFirst);
                }
                if column.sortable || column.resizable || column.hideable {
                    return Err(ColumnError::SelectCapabilities);
                }
            }
        }
        Ok(ColumnSet { columns })
    }

    /// Prepends the synthetic select column.
    pub fn with_select(
        columns: impl IntoIterator<Item = ColumnDescriptor<R>>,
    ) -> Result<Self, ColumnError> {
        Self::new(std::iter::once(ColumnDescriptor::select()).chain(columns))
    }

    pub fn get(&self, id: &ColumnId) -> Option<&ColumnDescriptor<R>> {
        self.columns.iter().find(|c| &c.id == id)
    }

    pub fn contains(&self, id: &ColumnId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor<R>> {
        self.columns.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ColumnId> {
        self.columns.iter().map(|c| &c.id)
    }

    pub fn has_select(&self) -> bool {
        self.columns.first().is_some_and(|c| c.is_select())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Loan {
        id: u32,
        principal: f64,
        active: bool,
    }

    fn columns() -> Vec<ColumnDescriptor<Loan>> {
        vec![
            ColumnDescriptor::new("loan_id", "Loan #", |l: &Loan| l.id.into()),
            ColumnDescriptor::new("principal", "Principal", |l: &Loan| l.principal.into()).number(2),
            ColumnDescriptor::new("active", "Active", |l: &Loan| l.active.into()).boolean(),
        ]
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut cols = columns();
        cols.push(ColumnDescriptor::new("principal", "Again", |l: &Loan| l.principal.into()));
        assert_eq!(
            ColumnSet::new(cols).err(),
            Some(ColumnError::DuplicateId("principal".into()))
        );
    }

    #[test]
    fn select_must_come_first() {
        let mut cols = columns();
        cols.push(ColumnDescriptor::select());
        assert_eq!(ColumnSet::new(cols).err(), Some(ColumnError::SelectNotFirst));
        let set = ColumnSet::with_select(columns()).unwrap();
        assert!(set.has_select());
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn select_capabilities_are_locked() {
        let select = ColumnDescriptor::<Loan>::select().sortable(true);
        assert_eq!(
            ColumnSet::new([select]).err(),
            Some(ColumnError::SelectCapabilities)
        );
    }

    #[test]
    fn renders_by_cell_kind() {
        let set = ColumnSet::new(columns()).unwrap();
        let loan = Loan {
            id: 7,
            principal: 1250.5,
            active: false,
        };
        assert_eq!(set.get(&"principal".into()).unwrap().render(&loan), "1250.50");
        assert_eq!(set.get(&"active".into()).unwrap().render(&loan), "No");
        assert_eq!(set.get(&"loan_id".into()).unwrap().render(&loan), "7");
    }

    #[test]
    fn clamps_size() {
        let col = ColumnDescriptor::new("x", "X", |l: &Loan| l.id.into())
            .min_size(50.0)
            .max_size(200.0);
        assert_eq!(col.clamp_size(10.0), 50.0);
        assert_eq!(col.clamp_size(500.0), 200.0);
        assert_eq!(col.clamp_size(120.0), 120.0);
    }
}
