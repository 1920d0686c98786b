use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Dynamically typed cell value produced by column accessors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Only `Empty` counts as null when sampling columns, a blank string does not.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(x) => Some(*x as f64),
            CellValue::Float(x) => Some(*x),
            CellValue::Str(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            CellValue::Int(x) => Some(*x != 0),
            CellValue::Str(s) => match s.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Total order used for client side sorting. Kinds are ranked first (empty, boolean,
    /// number, text, date), numbers compare numerically across Int/Float with NaN last,
    /// text compares case-insensitively and a date sorts as its midnight.
    pub fn sort_cmp(&self, other: &CellValue) -> Ordering {
        use CellValue::*;
        self.kind_rank()
            .cmp(&other.kind_rank())
            .then_with(|| match (self, other) {
                (Bool(a), Bool(b)) => a.cmp(b),
                (Int(a), Int(b)) => a.cmp(b),
                (Int(_) | Float(_), Int(_) | Float(_)) => {
                    let (a, b) = (self.as_f64().unwrap_or(f64::NAN), other.as_f64().unwrap_or(f64::NAN));
                    a.is_nan()
                        .cmp(&b.is_nan())
                        .then_with(|| if a.is_nan() { Ordering::Equal } else { a.total_cmp(&b) })
                        // Int before Float when the f64 values tie, Int(2^53 + 1) stays ordered
                        .then_with(|| matches!(self, Float(_)).cmp(&matches!(other, Float(_))))
                        .then_with(|| match (self, other) {
                            (Int(a), Int(b)) => a.cmp(b),
                            _ => Ordering::Equal,
                        })
                }
                (Str(a), Str(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
                (Date(_) | DateTime(_), Date(_) | DateTime(_)) => self.as_datetime().cmp(&other.as_datetime()),
                _ => Ordering::Equal,
            })
    }

    fn kind_rank(&self) -> u8 {
        match self {
            CellValue::Empty => 0,
            CellValue::Bool(_) => 1,
            CellValue::Int(_) | CellValue::Float(_) => 2,
            CellValue::Str(_) => 3,
            CellValue::Date(_) | CellValue::DateTime(_) => 4,
        }
    }

    fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(d) => d.and_hms_opt(0, 0, 0),
            CellValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(x) => write!(f, "{x}"),
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::Str(s) => f.write_str(s),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Int(value as i64)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Int(value as i64)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Str(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Str(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_across_kinds() {
        assert_eq!(CellValue::Int(2).sort_cmp(&CellValue::Float(1.5)), Ordering::Greater);
        assert_eq!(CellValue::Float(2.0).sort_cmp(&CellValue::Int(2)), Ordering::Greater);
        assert_eq!(CellValue::Float(f64::NAN).sort_cmp(&CellValue::Int(i64::MAX)), Ordering::Greater);
        assert_eq!(CellValue::Float(f64::NAN).sort_cmp(&CellValue::Float(-f64::NAN)), Ordering::Equal);
    }

    #[test]
    fn mixed_kinds_do_not_cycle() {
        let values = [
            CellValue::from("B"),
            CellValue::Float(f64::NAN),
            CellValue::from("a"),
            CellValue::Int(3),
            CellValue::Bool(true),
            CellValue::Empty,
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        ];
        for a in &values {
            for b in &values {
                assert_eq!(a.sort_cmp(b), b.sort_cmp(a).reverse(), "{a:?} vs {b:?}");
                for c in &values {
                    if a.sort_cmp(b).is_le() && b.sort_cmp(c).is_le() {
                        assert!(a.sort_cmp(c).is_le(), "{a:?} <= {b:?} <= {c:?}");
                    }
                }
            }
        }
        assert_eq!(CellValue::from("a").sort_cmp(&CellValue::from("B")), Ordering::Less);
        assert_eq!(CellValue::Float(f64::NAN).sort_cmp(&CellValue::from("a")), Ordering::Less);
    }

    #[test]
    fn empty_sorts_first() {
        assert_eq!(CellValue::Empty.sort_cmp(&CellValue::Int(0)), Ordering::Less);
        assert_eq!(CellValue::from("a").sort_cmp(&CellValue::Empty), Ordering::Greater);
    }

    #[test]
    fn option_none_is_empty() {
        let v: CellValue = Option::<i64>::None.into();
        assert!(v.is_empty());
        assert_eq!(v.to_string(), "");
    }

    #[test]
    fn display_dates_iso() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(CellValue::Date(d).to_string(), "2024-03-07");
    }
}
