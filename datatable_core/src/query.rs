use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::filter::{encode_filter, FilterState};
use crate::sort::{encode_sorting, SortingState};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn page_count(&self, total_rows: usize) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        total_rows.div_ceil(self.page_size).max(1)
    }

    /// Row index range of the current page, clamped to `total_rows`.
    pub fn page_range(&self, total_rows: usize) -> Range<usize> {
        let start = (self.page_index * self.page_size).min(total_rows);
        let end = (start + self.page_size).min(total_rows);
        start..end
    }
}

/// Parameters handed opaquely to the caller's HTTP client.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub page_index: usize,
    pub page_size: usize,
    pub sort: String,
    pub filter: String,
}

impl QueryParams {
    pub fn new(pagination: Pagination, sorting: &SortingState, filter: &FilterState) -> Self {
        QueryParams {
            page_index: pagination.page_index,
            page_size: pagination.page_size,
            sort: encode_sorting(sorting),
            filter: encode_filter(filter),
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("pageIndex", self.page_index.to_string()),
            ("pageSize", self.page_size.to_string()),
            ("sort", self.sort.clone()),
            ("filter", self.filter.clone()),
        ]
    }
}
