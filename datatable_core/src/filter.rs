use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::column::ColumnSet;
use crate::column_type::ColumnType;
use crate::token::{self, TokenError};
use crate::value::CellValue;
use crate::ColumnId;

#[derive(
    strum::EnumIter,
    strum::Display,
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FilterLogic {
    #[default]
    And,
    Or,
}

impl FilterLogic {
    pub fn toggled(self) -> Self {
        match self {
            FilterLogic::And => FilterLogic::Or,
            FilterLogic::Or => FilterLogic::And,
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
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperation {
    #[strum(serialize = "contains")]
    Contains,
    #[strum(serialize = "=")]
    Equals,
    #[strum(serialize = "≠")]
    NotEquals,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = "<")]
    LessThan,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub id: ColumnId,
    pub op: FilterOperation,
    pub value: String,
}

impl ColumnFilter {
    pub fn new(id: impl Into<ColumnId>, op: FilterOperation, value: impl Into<String>) -> Self {
        ColumnFilter {
            id: id.into(),
            op,
            value: value.into(),
        }
    }

    pub fn matches(&self, value: &CellValue, ty: ColumnType) -> bool {
        let wanted = self.value.trim();
        match self.op {
            FilterOperation::Contains => value
                .to_string()
                .to_lowercase()
                .contains(&wanted.to_lowercase()),
            FilterOperation::Equals => equals(value, wanted, ty),
            FilterOperation::NotEquals => !equals(value, wanted, ty),
            FilterOperation::GreaterThan => compare(value, wanted, ty).is_some_and(|o| o.is_gt()),
            FilterOperation::LessThan => compare(value, wanted, ty).is_some_and(|o| o.is_lt()),
        }
    }
}

fn equals(value: &CellValue, wanted: &str, ty: ColumnType) -> bool {
    match ty {
        ColumnType::Number => match (value.as_f64(), wanted.parse::<f64>()) {
            (Some(a), Ok(b)) => a == b,
            _ => false,
        },
        ColumnType::Boolean => value.as_bool() == CellValue::from(wanted).as_bool(),
        _ => value.to_string().trim().eq_ignore_ascii_case(wanted),
    }
}

fn compare(value: &CellValue, wanted: &str, ty: ColumnType) -> Option<std::cmp::Ordering> {
    match ty {
        ColumnType::Number => value.as_f64()?.partial_cmp(&wanted.parse::<f64>().ok()?),
        _ => Some(value.to_string().as_str().cmp(wanted)),
    }
}

/// Global search text plus per-column filters combined with [`FilterLogic`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub global: String,
    pub columns: Vec<ColumnFilter>,
    pub logic: FilterLogic,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.global.trim().is_empty() && self.columns.is_empty()
    }

    /// Replaces an existing filter on the same column.
    pub fn upsert(&mut self, filter: ColumnFilter) {
        match self.columns.iter_mut().find(|f| f.id == filter.id) {
            Some(existing) => *existing = filter,
            None => self.columns.push(filter),
        }
    }

    pub fn remove(&mut self, id: &ColumnId) -> bool {
        let len = self.columns.len();
        self.columns.retain(|f| &f.id != id);
        len != self.columns.len()
    }

    /// Client side evaluation for locally held rows. Columns missing from `types` are
    /// treated as text.
    pub fn matches_row<R>(
        &self,
        row: &R,
        columns: &ColumnSet<R>,
        types: &IndexMap<ColumnId, ColumnType>,
    ) -> bool {
        let global = self.global.trim().to_lowercase();
        if !global.is_empty() {
            let hit = columns
                .iter()
                .filter(|c| !c.is_select())
                .any(|c| c.render(row).to_lowercase().contains(&global));
            if !hit {
                return false;
            }
        }
        let mut results = self.columns.iter().filter_map(|f| {
            let column = columns.get(&f.id)?;
            let ty = types.get(&f.id).copied().unwrap_or_default();
            Some(f.matches(&column.value(row), ty))
        });
        match self.logic {
            FilterLogic::And => results.all(|hit| hit),
            FilterLogic::Or => {
                let mut any_filter = false;
                for hit in results {
                    if hit {
                        return true;
                    }
                    any_filter = true;
                }
                !any_filter
            }
        }
    }
}

pub fn encode_filter(filter: &FilterState) -> String {
    token::encode(filter)
}

pub fn decode_filter(token: &str) -> Result<FilterState, TokenError> {
    token::decode(token)
}
