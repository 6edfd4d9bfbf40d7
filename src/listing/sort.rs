//! Tri-state column sorting

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{FieldValue, Listable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Current sort of a list: a column and direction, or unsorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: Option<SortDirection>,
}

impl SortState {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: Some(column.into()),
            direction: Some(direction),
        }
    }

    /// Cycle a column: ascending, then descending, then unsorted.
    /// Selecting a different column starts it at ascending.
    pub fn toggle(&mut self, column: &str) {
        let next = match (self.column.as_deref(), self.direction) {
            (Some(current), Some(SortDirection::Ascending)) if current == column => {
                Some(SortDirection::Descending)
            }
            (Some(current), Some(SortDirection::Descending)) if current == column => None,
            _ => Some(SortDirection::Ascending),
        };

        match next {
            Some(direction) => {
                self.column = Some(column.to_string());
                self.direction = Some(direction);
            }
            None => *self = Self::unsorted(),
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.column.is_some() && self.direction.is_some()
    }
}

/// Missing values compare greater than any value, so they land last when
/// ascending and first when descending.
fn compare_optional(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => x.compare(y),
    }
}

/// Stable sort of rows by the state's column.
///
/// Ties on a date column are broken by `date_fallback` in the same direction.
pub fn sort_rows<T: Listable>(rows: &mut [T], state: &SortState, date_fallback: Option<&str>) {
    let (Some(column), Some(direction)) = (state.column.as_deref(), state.direction) else {
        return;
    };

    rows.sort_by(|a, b| {
        let va = a.field(column);
        let vb = b.field(column);
        let mut ordering = compare_optional(va.as_ref(), vb.as_ref());

        if ordering == Ordering::Equal {
            let is_date = va.as_ref().or(vb.as_ref()).is_some_and(FieldValue::is_temporal);
            if let (true, Some(fallback)) = (is_date, date_fallback) {
                ordering = compare_optional(a.field(fallback).as_ref(), b.field(fallback).as_ref());
            }
        }

        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}
