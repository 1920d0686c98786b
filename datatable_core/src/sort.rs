use serde::{Deserialize, Serialize};

use crate::column::ColumnSet;
use crate::token::{self, TokenError};
use crate::ColumnId;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ColumnSort {
    pub id: ColumnId,
    pub desc: bool,
}

#[derive(strum::Display, Copy, Clone, Debug, Eq, PartialEq)]
pub enum SortDirection {
    #[strum(serialize = "asc")]
    Asc,
    #[strum(serialize = "desc")]
    Desc,
}

/// Multi-column sort, first entry is the primary key.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortingState(pub Vec<ColumnSort>);

impl SortingState {
    pub fn single(id: impl Into<ColumnId>, desc: bool) -> Self {
        SortingState(vec![ColumnSort {
            id: id.into(),
            desc,
        }])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSort> {
        self.0.iter()
    }

    pub fn direction(&self, id: &ColumnId) -> Option<SortDirection> {
        self.0.iter().find(|s| &s.id == id).map(|s| {
            if s.desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            }
        })
    }

    pub fn priority(&self, id: &ColumnId) -> Option<usize> {
        self.0.iter().position(|s| &s.id == id)
    }

    /// Header click cycle: unsorted -> ascending -> descending -> unsorted.
    /// Without `multi` the clicked column replaces any other sort key.
    pub fn toggle(&mut self, id: &ColumnId, multi: bool) {
        let next = match self.direction(id) {
            None => Some(false),
            Some(SortDirection::Asc) => Some(true),
            Some(SortDirection::Desc) => None,
        };
        if multi {
            match (self.priority(id), next) {
                (Some(idx), Some(desc)) => self.0[idx].desc = desc,
                (Some(idx), None) => {
                    self.0.remove(idx);
                }
                (None, Some(desc)) => self.0.push(ColumnSort {
                    id: id.clone(),
                    desc,
                }),
                (None, None) => {}
            }
        } else {
            self.0 = next
                .map(|desc| {
                    vec![ColumnSort {
                        id: id.clone(),
                        desc,
                    }]
                })
                .unwrap_or_default();
        }
    }

    pub fn retain(&mut self, mut f: impl FnMut(&ColumnId) -> bool) {
        self.0.retain(|s| f(&s.id));
    }
}

pub fn encode_sorting(sorting: &SortingState) -> String {
    token::encode(sorting)
}

pub fn decode_sorting(token: &str) -> Result<SortingState, TokenError> {
    token::decode(token)
}

/// Stable client side sort for tables that hold all their rows locally.
pub fn sort_rows<R>(rows: &mut [R], sorting: &SortingState, columns: &ColumnSet<R>) {
    let keys: Vec<_> = sorting
        .iter()
        .filter_map(|s| columns.get(&s.id).map(|c| (c, s.desc)))
        .collect();
    if keys.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for (column, desc) in &keys {
            let ord = column.value(a).sort_cmp(&column.value(b));
            let ord = if *desc { ord.reverse() } else { ord };
            if ord.is_ne() {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    });
}
