use serde::{Deserialize, Serialize};
use std::fmt;

pub mod column;
pub mod column_type;
pub mod filter;
pub mod interaction;
pub mod query;
pub mod render;
pub mod sort;
pub mod state;
pub mod storage;
pub mod token;
pub mod toolbar;
pub mod value;

pub use column::{ColumnDescriptor, ColumnSet};
pub use state::{TableStateOptions, TableStateStore, TableUiState};
pub use value::CellValue;

/// Id of the synthetic row selection column.
pub const SELECT_COLUMN_ID: &str = "select";

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(pub String);

impl ColumnId {
    pub fn new(id: impl Into<String>) -> Self {
        ColumnId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_select(&self) -> bool {
        self.0 == SELECT_COLUMN_ID
    }
}

impl From<&str> for ColumnId {
    fn from(value: &str) -> Self {
        ColumnId(value.to_string())
    }
}

impl From<String> for ColumnId {
    fn from(value: String) -> Self {
        ColumnId(value)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable row identity, derived from the entity (usually its primary key), never from
/// the row's position.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        RowId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        RowId(value.to_string())
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        RowId(value)
    }
}

impl From<u32> for RowId {
    fn from(value: u32) -> Self {
        RowId(value.to_string())
    }
}

impl From<u64> for RowId {
    fn from(value: u64) -> Self {
        RowId(value.to_string())
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CellCoord {
    pub row_id: RowId,
    pub column_id: ColumnId,
}

impl From<(RowId, ColumnId)> for CellCoord {
    fn from(value: (RowId, ColumnId)) -> Self {
        CellCoord {
            row_id: value.0,
            column_id: value.1,
        }
    }
}

impl From<(&RowId, &ColumnId)> for CellCoord {
    fn from(value: (&RowId, &ColumnId)) -> Self {
        CellCoord {
            row_id: value.0.clone(),
            column_id: value.1.clone(),
        }
    }
}

/// Value committed by an editable cell, handed back to the caller's update hook.
#[derive(Clone, Debug, PartialEq)]
pub struct CellEdit {
    pub coord: CellCoord,
    pub value: CellValue,
}
