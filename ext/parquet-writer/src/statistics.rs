//! Min / max / null-count accumulation
//!
//! Page statistics are gathered while a page is encoded and merged into the
//! chunk statistics afterwards, so the chunk summary always agrees with its
//! pages.

use crate::encoding::{ParquetPrimitive, SortOrder};
use parquet::format::Statistics;

#[derive(Debug, Clone)]
pub(crate) struct ValueStatistics<T> {
    sort_order: SortOrder,
    min: Option<T>,
    max: Option<T>,
    null_count: u64,
    distinct_count: Option<u64>,
}

impl<T: ParquetPrimitive> ValueStatistics<T> {
    pub fn new(sort_order: SortOrder) -> Self {
        Self {
            sort_order,
            min: None,
            max: None,
            null_count: 0,
            distinct_count: None,
        }
    }

    pub fn update(&mut self, value: &T) {
        if value.ignored_in_stats() {
            return;
        }
        let order = self.sort_order;
        if self
            .min
            .as_ref()
            .map_or(true, |min| value.compare(min, order).is_lt())
        {
            self.min = Some(*value);
        }
        if self
            .max
            .as_ref()
            .map_or(true, |max| value.compare(max, order).is_gt())
        {
            self.max = Some(*value);
        }
    }

    pub fn update_all(&mut self, values: &[T]) {
        for value in values {
            self.update(value);
        }
    }

    pub fn add_nulls(&mut self, count: u64) {
        self.null_count += count;
    }

    pub fn set_distinct_count(&mut self, count: u64) {
        self.distinct_count = Some(count);
    }

    pub fn merge(&mut self, other: &Self) {
        if let Some(min) = &other.min {
            self.update(min);
        }
        if let Some(max) = &other.max {
            self.update(max);
        }
        self.null_count += other.null_count;
    }

    pub fn to_thrift(&self) -> Statistics {
        Statistics {
            null_count: Some(self.null_count as i64),
            distinct_count: self.distinct_count.map(|c| c as i64),
            max_value: self.max.map(|v| v.normalize_max().stat_bytes()),
            min_value: self.min.map(|v| v.normalize_min().stat_bytes()),
            ..Statistics::default()
        }
    }
}
