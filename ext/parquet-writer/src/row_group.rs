//! Row group partitioning
//!
//! Each group is sized from an estimated row width. Fixed-width columns
//! contribute their in-memory width. String columns contribute the larger
//! of two averages: string bytes seen in the groups already planned, and a
//! sample from the head of the upcoming slice. Both carry the 4-byte length
//! prefix.

use crate::table::{ColumnData, Table};
use std::ops::Range;
use tracing::debug;

/// Rows sampled ahead of each group to seed string width estimates
const STRING_SAMPLE_ROWS: usize = 1024;

/// PLAIN length prefix of a string value
const STRING_PREFIX_BYTES: usize = 4;

/// Boundaries of one row group within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowGroupPlan {
    pub start: usize,
    pub end: usize,
    /// Rows times estimated row width
    pub estimated_bytes: u64,
}

impl RowGroupPlan {
    pub fn num_rows(&self) -> usize {
        self.end - self.start
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct StringWidth {
    bytes: u64,
    rows: u64,
}

impl StringWidth {
    fn average(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.bytes as f64 / self.rows as f64
        }
    }
}

/// Iterator over the row groups of a table
///
/// Groups form an ordered, disjoint cover of `0..num_rows`. A group closes
/// once `rows * width` reaches the byte target, the optional row cap is hit,
/// or the table runs out. Groups are never empty.
#[derive(Debug)]
pub struct RowGroupAssembler<'a> {
    table: &'a Table,
    byte_target: u64,
    max_rows: Option<usize>,
    next_row: usize,
    fixed_width: usize,
    string_columns: Vec<(&'a [String], StringWidth)>,
}

impl<'a> RowGroupAssembler<'a> {
    pub fn new(table: &'a Table, byte_target: u64, max_rows: Option<usize>) -> Self {
        let mut fixed_width = 0;
        let mut string_columns = Vec::new();
        for column in table.columns() {
            match column.data() {
                ColumnData::String(values) => {
                    string_columns.push((values.as_slice(), StringWidth::default()))
                }
                data => fixed_width += data.column_type().fixed_width().unwrap_or(0),
            }
        }

        Self {
            table,
            byte_target: byte_target.max(1),
            max_rows: max_rows.map(|rows| rows.max(1)),
            next_row: 0,
            fixed_width,
            string_columns,
        }
    }

    /// Estimated bytes per row for the group starting at `next_row`
    fn estimate_row_width(&self) -> u64 {
        let sample_end = (self.next_row + STRING_SAMPLE_ROWS).min(self.table.num_rows());
        let string_width: u64 = self
            .string_columns
            .iter()
            .map(|(values, seen)| {
                let sample = &values[self.next_row..sample_end];
                let sampled = StringWidth {
                    bytes: sample.iter().map(|s| s.len() as u64).sum(),
                    rows: sample.len() as u64,
                };
                let average = seen.average().max(sampled.average());
                average.ceil() as u64 + STRING_PREFIX_BYTES as u64
            })
            .sum();

        (self.fixed_width as u64 + string_width).max(1)
    }

    fn record_seen(&mut self, rows: Range<usize>) {
        for (values, seen) in &mut self.string_columns {
            seen.bytes += values[rows.clone()].iter().map(|s| s.len() as u64).sum::<u64>();
            seen.rows += rows.len() as u64;
        }
    }
}

impl Iterator for RowGroupAssembler<'_> {
    type Item = RowGroupPlan;

    fn next(&mut self) -> Option<RowGroupPlan> {
        let remaining = self.table.num_rows() - self.next_row;
        if remaining == 0 {
            return None;
        }

        let row_width = self.estimate_row_width();
        let mut rows = self.byte_target.div_ceil(row_width).max(1);
        rows = rows.min(remaining as u64);
        if let Some(max_rows) = self.max_rows {
            rows = rows.min(max_rows as u64);
        }
        let rows = rows as usize;

        let plan = RowGroupPlan {
            start: self.next_row,
            end: self.next_row + rows,
            estimated_bytes: rows as u64 * row_width,
        };
        debug!(
            start = plan.start,
            end = plan.end,
            row_width,
            estimated_bytes = plan.estimated_bytes,
            "planned row group"
        );

        self.record_seen(plan.range());
        self.next_row = plan.end;
        Some(plan)
    }
}

/// Partition `table` into row groups
pub fn plan_row_groups(
    table: &Table,
    byte_target: u64,
    max_rows: Option<usize>,
) -> Vec<RowGroupPlan> {
    RowGroupAssembler::new(table, byte_target, max_rows).collect()
}
