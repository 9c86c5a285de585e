//! Shared fixtures for unit tests

use crate::schema::TimeUnit;
use crate::table::{Column, ColumnData, Table};
use crate::writer::WriterOptions;

/// A table touching every encoder family, with nulls in two columns
pub fn sample_table(rows: usize) -> Table {
    let ids: Vec<i64> = (0..rows as i64).collect();
    let names: Vec<String> = (0..rows).map(|i| format!("name-{}", i % 7)).collect();
    let scores: Vec<f64> = (0..rows).map(|i| i as f64 * 0.5).collect();
    let flags: Vec<bool> = (0..rows).map(|i| i % 3 == 0).collect();
    let stamps: Vec<i64> = (0..rows as i64).map(|i| 1_700_000_000 + i).collect();

    Table::try_new(vec![
        Column::new("id", ColumnData::Int64(ids)),
        Column::with_validity(
            "name",
            ColumnData::String(names),
            (0..rows).map(|i| i % 5 != 0).collect(),
        )
        .unwrap(),
        Column::with_validity(
            "score",
            ColumnData::Float64(scores),
            (0..rows).map(|i| i % 4 != 1).collect(),
        )
        .unwrap(),
        Column::new("flag", ColumnData::Boolean(flags)),
        Column::new(
            "seen_at",
            ColumnData::Timestamp(TimeUnit::Seconds, stamps),
        ),
    ])
    .unwrap()
}

/// Options that force several row groups and pages on small tables
pub fn small_options() -> WriterOptions {
    WriterOptions {
        row_group_byte_target: 8 * 1024,
        page_byte_target: 512,
        ..WriterOptions::default()
    }
}
