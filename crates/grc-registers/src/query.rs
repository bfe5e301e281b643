//! Record query pipeline
//!
//! Shared sort and pagination primitives behind every register view.
//! Filtering lives with each register (its filter struct knows the
//! record's fields); the pipeline is always filter -> stable sort ->
//! paginate.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

use grc_common::GrcError;

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending (the default for a newly selected column)
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl Direction {
    /// Opposite direction
    pub fn flip(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl FromStr for Direction {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(GrcError::InvalidValue {
                field: "direction",
                value: s.to_string(),
            }),
        }
    }
}

/// Table sort state
///
/// Selecting the active key again flips direction; selecting a new key
/// resets to ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    /// Active sort key
    pub key: String,
    /// Current direction for that key
    pub direction: Direction,
}

impl SortState {
    /// Initial state: sort ascending by `key`
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: Direction::Asc,
        }
    }

    /// Apply a column click
    pub fn select(&mut self, key: &str) {
        if self.key == key {
            self.direction = self.direction.flip();
        } else {
            self.key = key.to_string();
            self.direction = Direction::Asc;
        }
    }
}

/// Comparable sort key value
///
/// Strings compare case-insensitively, numbers numerically. A key maps
/// every record of a register to the same variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortValue {
    /// Case-insensitive text comparison
    Text(String),
    /// Numeric comparison (scores, counts, progress)
    Number(i64),
}

impl SortValue {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

/// Sort records in place by the value `key_fn` extracts
///
/// Uses the standard library's stable sort, so records with equal keys
/// keep their input order in either direction.
pub fn sort_records<T>(records: &mut [T], direction: Direction, key_fn: impl Fn(&T) -> SortValue) {
    records.sort_by(|a, b| {
        let ord = key_fn(a).compare(&key_fn(b));
        match direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        }
    });
}

/// One page of records plus table metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records on the current page
    pub items: Vec<T>,
    /// Clamped 1-indexed page number
    pub current_page: usize,
    /// Always at least 1, even for an empty result set
    pub total_pages: usize,
    /// Record count before slicing
    pub total_items: usize,
}

/// Slice a result set into a fixed-size page
///
/// `page` is 1-indexed and clamped to `[1, total_pages]`; an empty input
/// yields a valid page 1 with no rows. A zero `page_size` behaves as 1.
pub fn paginate<T: Clone>(records: &[T], page_size: usize, page: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = records.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let current_page = page.clamp(1, total_pages);

    let start = (current_page - 1) * page_size;
    let end = (start + page_size).min(total_items);
    let items = if start < total_items {
        records[start..end].to_vec()
    } else {
        Vec::new()
    };

    Page {
        items,
        current_page,
        total_pages,
        total_items,
    }
}

/// Case-insensitive substring match used by every text-search predicate
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sort_state_toggle_and_reset() {
        let mut state = SortState::new("name");
        assert_eq!(state.direction, Direction::Asc);

        state.select("name");
        assert_eq!(state.direction, Direction::Desc);

        state.select("name");
        assert_eq!(state.direction, Direction::Asc);

        state.select("owner");
        assert_eq!(state.key, "owner");
        assert_eq!(state.direction, Direction::Asc);
    }

    #[test]
    fn test_sort_stability_on_equal_keys() {
        let mut records = vec![("a", 1), ("b", 1), ("c", 1), ("d", 1)];
        sort_records(&mut records, Direction::Asc, |r| SortValue::Number(r.1));
        assert_eq!(
            records.iter().map(|r| r.0).collect::<Vec<_>>(),
            vec!["a", "b", "c", "d"]
        );

        sort_records(&mut records, Direction::Desc, |r| SortValue::Number(r.1));
        assert_eq!(
            records.iter().map(|r| r.0).collect::<Vec<_>>(),
            vec!["a", "b", "c", "d"]
        );
    }

    #[test]
    fn test_sort_text_case_insensitive() {
        let mut records = vec!["banana", "Apple", "cherry"];
        sort_records(&mut records, Direction::Asc, |r| SortValue::Text(r.to_string()));
        assert_eq!(records, vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_paginate_empty_is_page_one() {
        let page = paginate::<u32>(&[], 10, 1);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_items, 0);
    }

    #[test]
    fn test_paginate_clamps_out_of_range() {
        let records: Vec<u32> = (0..25).collect();
        let page = paginate(&records, 10, 99);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.items, (20..25).collect::<Vec<_>>());

        let page = paginate(&records, 10, 0);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.items, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_contains_ci() {
        assert!(contains_ci("Database Server", "base s"));
        assert!(!contains_ci("Database Server", "basis"));
    }

    proptest! {
        #[test]
        fn prop_pages_cover_exactly(len in 0usize..200, page_size in 1usize..20) {
            let records: Vec<usize> = (0..len).collect();
            let total_pages = paginate(&records, page_size, 1).total_pages;

            let mut seen = Vec::new();
            for page in 1..=total_pages {
                seen.extend(paginate(&records, page_size, page).items);
            }
            prop_assert_eq!(seen, records);
        }

        #[test]
        fn prop_page_size_bound(len in 0usize..100, page_size in 1usize..20, page in 1usize..20) {
            let records: Vec<usize> = (0..len).collect();
            let result = paginate(&records, page_size, page);
            prop_assert!(result.items.len() <= page_size);
            prop_assert!(result.current_page >= 1);
            prop_assert!(result.current_page <= result.total_pages);
        }
    }
}
