//! Heuristic column type inference.
//!
//! Samples the loaded rows of a column and votes on a [`ColumnType`], which decides the
//! default filter operation offered for the column. Misclassification only affects the
//! filter UI, callers can always override a column with
//! [`ColumnTypeResolver::set_column_type`].

use std::sync::LazyLock;

use chrono::NaiveDate;
use indexmap::IndexMap;
use log::trace;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::column::ColumnSet;
use crate::filter::FilterOperation;
use crate::value::CellValue;
use crate::ColumnId;

pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Numeric strings longer than this are assumed to be account numbers or phone numbers.
const MAX_NUMERIC_LEN: usize = 15;

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\d{1,2}:\d{2}(?::\d{2})?(?:\s*[AP]M)?$").unwrap());
static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:[T ].*)?$").unwrap());
static SLASH_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d{1,2}/\d{1,2}/\d{2,4}|\d{4}/\d{1,2}/\d{1,2})$").unwrap());
static LONG_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{3,9}\.? \d{1,2}, \d{4}$").unwrap());

#[derive(
    strum::EnumIter,
    strum::Display,
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Date,
    Time,
    Boolean,
}

impl ColumnType {
    pub fn default_filter(&self) -> FilterOperation {
        match self {
            ColumnType::Text => FilterOperation::Contains,
            ColumnType::Number | ColumnType::Date | ColumnType::Time | ColumnType::Boolean => {
                FilterOperation::Equals
            }
        }
    }
}

/// Memoized per table instance, invalidate with [`ColumnTypeResolver::clear_cache`] when a
/// new query replaces the data set.
#[derive(Debug, Clone)]
pub struct ColumnTypeResolver {
    sample_size: usize,
    cache: IndexMap<ColumnId, ColumnType>,
}

impl Default for ColumnTypeResolver {
    fn default() -> Self {
        ColumnTypeResolver::new(DEFAULT_SAMPLE_SIZE)
    }
}

impl ColumnTypeResolver {
    pub fn new(sample_size: usize) -> Self {
        ColumnTypeResolver {
            sample_size,
            cache: IndexMap::new(),
        }
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn column_type<R>(
        &mut self,
        column_id: &ColumnId,
        columns: &ColumnSet<R>,
        rows: &[R],
    ) -> ColumnType {
        if let Some(ty) = self.cache.get(column_id) {
            return *ty;
        }
        let samples: Vec<CellValue> = match columns.get(column_id) {
            Some(column) => rows
                .iter()
                .map(|row| column.value(row))
                .filter(|v| !v.is_empty())
                .take(self.sample_size)
                .collect(),
            None => vec![],
        };
        let ty = if samples.is_empty() {
            ColumnType::Text
        } else {
            let votes: Vec<ColumnType> = samples
                .iter()
                .map(|v| infer_value_type(column_id.as_str(), v))
                .collect();
            majority(&votes)
        };
        trace!("inferred {column_id} as {ty} from {} samples", samples.len());
        self.cache.insert(column_id.clone(), ty);
        ty
    }

    /// Types of all data columns in declaration order, the select column is skipped.
    pub fn all_column_types<R>(
        &mut self,
        columns: &ColumnSet<R>,
        rows: &[R],
    ) -> IndexMap<ColumnId, ColumnType> {
        columns
            .iter()
            .filter(|c| !c.is_select())
            .map(|c| (c.id.clone(), self.column_type(&c.id, columns, rows)))
            .collect()
    }

    pub fn cached(&self, column_id: &ColumnId) -> Option<ColumnType> {
        self.cache.get(column_id).copied()
    }

    pub fn set_column_type(&mut self, column_id: ColumnId, ty: ColumnType) {
        self.cache.insert(column_id, ty);
    }

    /// Drops every cached type, manual overrides included.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

pub fn infer_value_type(column_id: &str, value: &CellValue) -> ColumnType {
    match value {
        CellValue::Bool(_) => ColumnType::Boolean,
        CellValue::Int(_) | CellValue::Float(_) => ColumnType::Number,
        CellValue::Date(_) | CellValue::DateTime(_) => ColumnType::Date,
        CellValue::Str(s) => infer_str_type(column_id, s),
        CellValue::Empty => ColumnType::Text,
    }
}

fn infer_str_type(column_id: &str, s: &str) -> ColumnType {
    let s = s.trim();
    if s.is_empty() {
        return ColumnType::Text;
    }
    if TIME_RE.is_match(s) {
        return ColumnType::Time;
    }
    if is_date_like(s) {
        return ColumnType::Date;
    }
    if is_numeric(s) && !looks_like_identifier(column_id, s) {
        return ColumnType::Number;
    }
    ColumnType::Text
}

fn is_date_like(s: &str) -> bool {
    if let Some(caps) = ISO_DATE_RE.captures(s) {
        return NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").is_ok();
    }
    if SLASH_DATE_RE.is_match(s) {
        return ["%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%m/%d/%y"]
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(s, fmt).is_ok());
    }
    if LONG_DATE_RE.is_match(s) {
        let s = s.replacen('.', "", 1);
        return ["%B %d, %Y", "%b %d, %Y"]
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(&s, fmt).is_ok());
    }
    false
}

fn is_numeric(s: &str) -> bool {
    s.parse::<f64>().is_ok_and(|x| x.is_finite())
}

/// Ids, codes and phone numbers are digits but must not be summed or range filtered.
/// Approximate: a column named `paid` or a long account number also ends up as text.
fn looks_like_identifier(column_id: &str, s: &str) -> bool {
    let id = column_id.to_lowercase();
    id.contains("id") || id.contains("code") || id.contains("phone") || s.len() > MAX_NUMERIC_LEN
}

/// Ties go to the type encountered first.
fn majority(votes: &[ColumnType]) -> ColumnType {
    let mut counts: IndexMap<ColumnType, usize> = IndexMap::new();
    for ty in votes {
        *counts.entry(*ty).or_default() += 1;
    }
    let mut best = None::<(ColumnType, usize)>;
    for (ty, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((ty, count));
        }
    }
    best.map(|(ty, _)| ty).unwrap_or_default()
}
