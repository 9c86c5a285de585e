//! Columnar Parquet writer
//!
//! `parquet-writer` encodes in-memory columnar tables into the Apache
//! Parquet file format. Value encodings, page assembly, compression and
//! row group sizing are implemented here; page headers and the footer use
//! the generated Thrift structs from `parquet::format`.
//!
//! # Key Components
//!
//! - **Table**: named, typed, equal-length columns with optional validity
//!   bitmaps, see [`Table`] and [`Column`]
//!   - Booleans, signed and unsigned integers, floats, UTF-8 strings
//!   - Timestamps in days, seconds, milliseconds, microseconds, nanoseconds
//!
//! - **Writer**: single-pass file writer over any [`Sink`]
//!   - Explicit state machine, see [`WriterState`]
//!   - Row groups sized by an estimated byte budget
//!   - Column chunks encoded in parallel with `rayon`, committed in order
//!   - PLAIN or dictionary encoding chosen per column chunk
//!   - Optional Snappy page compression
//!
//! - **Sinks**: in-memory buffers, files, or any `std::io::Write`
//!
//! # Example Usage
//!
//! ```no_run
//! use parquet_writer::{write_table, Column, ColumnData, FileSink, Table, WriterOptions};
//!
//! let table = Table::try_new(vec![
//!     Column::new("id", ColumnData::Int64(vec![1, 2, 3])),
//!     Column::new("name", ColumnData::String(vec!["a".into(), "b".into(), "c".into()])),
//! ])?;
//! let sink = FileSink::create("out.parquet")?;
//! write_table(&table, sink, &WriterOptions::default())?;
//! # Ok::<(), parquet_writer::ParquetError>(())
//! ```

pub mod compression;
pub mod error;
pub mod format;
pub mod row_group;
pub mod schema;
pub mod sink;
pub mod table;
pub mod value;
pub mod writer;

mod column;
mod encoding;
mod page;
mod statistics;

#[cfg(test)]
mod test_utils;

pub use compression::{Compression, NoCompression, PageCodec, SnappyCodec};
pub use error::{ParquetError, Result};
pub use row_group::{plan_row_groups, RowGroupAssembler, RowGroupPlan};
pub use schema::{ColumnType, Field, Repetition, Schema, SchemaBuilder, TimeUnit};
pub use sink::{BufferSink, FileSink, Sink, WriteSink};
pub use table::{Column, ColumnData, Table};
pub use value::Value;
pub use writer::{write_table, Writer, WriterBuilder, WriterOptions, WriterState};
