//! Core Parquet writing functionality
//!
//! A [`Writer`] owns a [`Sink`] and walks it through the file layout in a
//! single pass:
//!
//! ```text
//! NotStarted -> HeaderWritten -> RowGroupWritten* -> FooterWritten -> Closed
//! ```
//!
//! The column chunks of a row group are encoded in parallel and committed to
//! the sink one by one in schema order.

use crate::column::{ColumnChunkWriter, EncodedColumnChunk};
use crate::compression::{Compression, PageCodec};
use crate::format::{to_thrift_bytes, FORMAT_VERSION, PARQUET_MAGIC};
use crate::row_group::{RowGroupAssembler, RowGroupPlan};
use crate::sink::Sink;
use crate::table::{Column, Table};
use crate::{ParquetError, Result, Schema};
use indexmap::IndexMap;
use parquet::format::{ColumnOrder, FileMetaData, KeyValue, RowGroup, TypeDefinedOrder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// Default configuration constants
const DEFAULT_ROW_GROUP_BYTE_TARGET: u64 = 128 * 1024 * 1024; // 128MB
const DEFAULT_PAGE_BYTE_TARGET: usize = 1024 * 1024; // 1MB
const DEFAULT_PAGE_ROW_LIMIT: usize = 20_000;
const DEFAULT_DICTIONARY_PAGE_BYTE_LIMIT: usize = 1024 * 1024; // 1MB

fn default_created_by() -> String {
    format!("parquet-writer version {}", env!("CARGO_PKG_VERSION"))
}

/// Write configuration
///
/// Deserializes from any serde format; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    pub compression: Compression,
    /// Estimated bytes per row group
    pub row_group_byte_target: u64,
    /// Estimated encoded bytes per data page
    pub page_byte_target: usize,
    /// Maximum rows per data page
    pub page_row_limit: usize,
    /// Optional hard cap on rows per row group
    pub max_rows_per_row_group: Option<usize>,
    pub dictionary_enabled: bool,
    /// Largest dictionary page before a chunk falls back to PLAIN
    pub dictionary_page_byte_limit: usize,
    /// File-level key-value metadata, written in insertion order
    pub key_value_metadata: IndexMap<String, String>,
    pub created_by: String,
    /// Encode the column chunks of a row group on the rayon pool
    pub parallel: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            compression: Compression::Uncompressed,
            row_group_byte_target: DEFAULT_ROW_GROUP_BYTE_TARGET,
            page_byte_target: DEFAULT_PAGE_BYTE_TARGET,
            page_row_limit: DEFAULT_PAGE_ROW_LIMIT,
            max_rows_per_row_group: None,
            dictionary_enabled: true,
            dictionary_page_byte_limit: DEFAULT_DICTIONARY_PAGE_BYTE_LIMIT,
            key_value_metadata: IndexMap::new(),
            created_by: default_created_by(),
            parallel: true,
        }
    }
}

impl WriterOptions {
    /// Reject settings that cannot produce a file
    pub fn validate(&self) -> Result<()> {
        if self.row_group_byte_target == 0 {
            return Err(ParquetError::invalid_argument(
                "row_group_byte_target must be positive",
            ));
        }
        if self.page_byte_target == 0 {
            return Err(ParquetError::invalid_argument(
                "page_byte_target must be positive",
            ));
        }
        if self.page_row_limit == 0 {
            return Err(ParquetError::invalid_argument(
                "page_row_limit must be positive",
            ));
        }
        if self.max_rows_per_row_group == Some(0) {
            return Err(ParquetError::invalid_argument(
                "max_rows_per_row_group must be positive",
            ));
        }
        Ok(())
    }
}

/// Builder for creating a configured Writer
#[derive(Debug, Default)]
pub struct WriterBuilder {
    options: WriterOptions,
}

impl WriterBuilder {
    /// Create a new WriterBuilder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a complete set of options
    pub fn with_options(mut self, options: WriterOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the compression algorithm
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.options.compression = compression;
        self
    }

    pub fn with_row_group_byte_target(mut self, bytes: u64) -> Self {
        self.options.row_group_byte_target = bytes;
        self
    }

    pub fn with_page_byte_target(mut self, bytes: usize) -> Self {
        self.options.page_byte_target = bytes;
        self
    }

    pub fn with_page_row_limit(mut self, rows: usize) -> Self {
        self.options.page_row_limit = rows;
        self
    }

    pub fn with_max_rows_per_row_group(mut self, rows: usize) -> Self {
        self.options.max_rows_per_row_group = Some(rows);
        self
    }

    /// Enable or disable dictionary encoding
    pub fn with_dictionary(mut self, enabled: bool) -> Self {
        self.options.dictionary_enabled = enabled;
        self
    }

    pub fn with_dictionary_page_byte_limit(mut self, bytes: usize) -> Self {
        self.options.dictionary_page_byte_limit = bytes;
        self
    }

    /// Add a key-value pair to the file metadata
    pub fn with_key_value_metadata<K: Into<String>, V: Into<String>>(
        mut self,
        key: K,
        value: V,
    ) -> Self {
        self.options
            .key_value_metadata
            .insert(key.into(), value.into());
        self
    }

    pub fn with_created_by<S: Into<String>>(mut self, created_by: S) -> Self {
        self.options.created_by = created_by.into();
        self
    }

    /// Encode column chunks in parallel (the default) or on the calling thread
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.options.parallel = parallel;
        self
    }

    /// Build a Writer with the configured settings
    pub fn build<S: Sink>(self, sink: S, schema: Schema) -> Result<Writer<S>> {
        Writer::new_with_options(sink, schema, self.options)
    }
}

/// Position of a writer in the file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    NotStarted,
    HeaderWritten,
    RowGroupWritten,
    FooterWritten,
    Closed,
}

/// Single-pass Parquet writer over any [`Sink`]
///
/// Tables written with [`Writer::write_table`] must match the writer's
/// schema; each call appends its row groups. After a sink error, or after a
/// table fails once some of its row groups were committed, the writer
/// refuses further calls, since the output can no longer be completed.
pub struct Writer<S: Sink> {
    sink: S,
    schema: Schema,
    options: WriterOptions,
    codec: Box<dyn PageCodec>,
    state: WriterState,
    failed: bool,
    row_groups: Vec<RowGroup>,
    total_rows_written: u64,
}

impl<S: Sink> Writer<S> {
    /// Create a new writer with default settings
    pub fn new(sink: S, schema: Schema) -> Result<Self> {
        WriterBuilder::new().build(sink, schema)
    }

    /// Create a new writer with custom options
    pub fn new_with_options(sink: S, schema: Schema, options: WriterOptions) -> Result<Self> {
        options.validate()?;
        schema.check_supported()?;

        Ok(Self {
            sink,
            schema,
            codec: options.compression.codec(),
            options,
            state: WriterState::NotStarted,
            failed: false,
            row_groups: Vec::new(),
            total_rows_written: 0,
        })
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    pub fn num_row_groups(&self) -> usize {
        self.row_groups.len()
    }

    pub fn total_rows_written(&self) -> u64 {
        self.total_rows_written
    }

    /// Bytes written to the sink so far
    pub fn bytes_written(&self) -> u64 {
        self.sink.position()
    }

    /// Return the sink, whatever state the file is in
    pub fn into_inner(self) -> S {
        self.sink
    }

    fn ensure_not_failed(&self) -> Result<()> {
        if self.failed {
            return Err(ParquetError::invalid_state(
                "a previous write failed; the output is incomplete",
            ));
        }
        Ok(())
    }

    /// Mark the writer unusable if `result` failed
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let result = self.sink.append(bytes);
        self.track(result)
    }

    /// Write the opening magic bytes
    pub fn write_header(&mut self) -> Result<()> {
        self.ensure_not_failed()?;
        if self.state != WriterState::NotStarted {
            return Err(ParquetError::invalid_state(format!(
                "header already written (state {:?})",
                self.state
            )));
        }
        self.append(PARQUET_MAGIC)?;
        self.state = WriterState::HeaderWritten;
        Ok(())
    }

    fn ensure_accepts_row_groups(&mut self) -> Result<()> {
        self.ensure_not_failed()?;
        match self.state {
            WriterState::NotStarted => self.write_header(),
            WriterState::HeaderWritten | WriterState::RowGroupWritten => Ok(()),
            WriterState::FooterWritten | WriterState::Closed => Err(ParquetError::invalid_state(
                format!("cannot write row groups in state {:?}", self.state),
            )),
        }
    }

    fn check_table(&self, table: &Table) -> Result<()> {
        if table.schema() != &self.schema {
            return Err(ParquetError::schema(format!(
                "table columns [{}] do not match writer schema [{}]",
                describe(table.schema()),
                describe(&self.schema)
            )));
        }
        Ok(())
    }

    /// Write all rows of `table`, split into row groups by the configured
    /// byte target
    ///
    /// A table is written whole or not at all. If a later row group fails
    /// after earlier ones reached the sink, the writer is marked failed and
    /// the footer is never written.
    pub fn write_table(&mut self, table: &Table) -> Result<()> {
        self.ensure_accepts_row_groups()?;
        self.check_table(table)?;

        let assembler = RowGroupAssembler::new(
            table,
            self.options.row_group_byte_target,
            self.options.max_rows_per_row_group,
        );
        for (index, plan) in assembler.enumerate() {
            let result = self.write_row_group(table, &plan);
            if index > 0 && result.is_err() {
                warn!(
                    committed = index,
                    row = plan.start,
                    "table failed after some of its row groups were written"
                );
                self.failed = true;
            }
            result?;
        }
        Ok(())
    }

    /// Write rows `plan.start..plan.end` of `table` as one row group
    pub fn write_row_group(&mut self, table: &Table, plan: &RowGroupPlan) -> Result<()> {
        self.ensure_accepts_row_groups()?;
        self.check_table(table)?;
        if plan.start >= plan.end || plan.end > table.num_rows() {
            return Err(ParquetError::invalid_argument(format!(
                "row group {}..{} is empty or outside a table of {} rows",
                plan.start,
                plan.end,
                table.num_rows()
            )));
        }

        let chunks = self.encode_chunks(table.columns(), plan)?;

        let file_offset = self.sink.position() as i64;
        let mut total_byte_size = 0i64;
        let mut total_compressed_size = 0i64;
        let mut columns = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            total_byte_size += chunk.uncompressed_size() as i64;
            total_compressed_size += chunk.compressed_size() as i64;
            let result = chunk.commit(&mut self.sink);
            columns.push(self.track(result)?);
        }

        let ordinal = i16::try_from(self.row_groups.len()).ok();
        self.row_groups.push(RowGroup {
            columns,
            total_byte_size,
            num_rows: plan.num_rows() as i64,
            sorting_columns: None,
            file_offset: Some(file_offset),
            total_compressed_size: Some(total_compressed_size),
            ordinal,
        });
        self.total_rows_written += plan.num_rows() as u64;
        self.state = WriterState::RowGroupWritten;

        debug!(
            row_group = self.row_groups.len() - 1,
            rows = plan.num_rows(),
            estimated_bytes = plan.estimated_bytes,
            compressed_bytes = total_compressed_size,
            "wrote row group"
        );
        Ok(())
    }

    /// Encode every column of the row group, in parallel when configured;
    /// results come back in column order
    fn encode_chunks(
        &self,
        columns: &[Column],
        plan: &RowGroupPlan,
    ) -> Result<Vec<EncodedColumnChunk>> {
        let options = &self.options;
        let codec = self.codec.as_ref();
        let encode =
            |column: &Column| ColumnChunkWriter::new(column, options, codec).encode(plan.range());

        if options.parallel {
            columns.par_iter().map(encode).collect()
        } else {
            columns.iter().map(encode).collect()
        }
    }

    /// Serialize the file metadata and close the file layout
    ///
    /// Writes the header first when nothing has been written yet, which
    /// yields a valid file with no row groups.
    pub fn write_footer(&mut self) -> Result<()> {
        self.ensure_not_failed()?;
        match self.state {
            WriterState::NotStarted => self.write_header()?,
            WriterState::HeaderWritten | WriterState::RowGroupWritten => {}
            WriterState::FooterWritten | WriterState::Closed => {
                return Err(ParquetError::invalid_state(format!(
                    "footer already written (state {:?})",
                    self.state
                )))
            }
        }

        let key_value_metadata = if self.options.key_value_metadata.is_empty() {
            None
        } else {
            Some(
                self.options
                    .key_value_metadata
                    .iter()
                    .map(|(key, value)| KeyValue::new(key.clone(), value.clone()))
                    .collect(),
            )
        };

        let column_orders =
            vec![ColumnOrder::TYPEORDER(TypeDefinedOrder::new()); self.schema.len()];
        let metadata = FileMetaData {
            version: FORMAT_VERSION,
            schema: self.schema.to_schema_elements()?,
            num_rows: self.total_rows_written as i64,
            row_groups: self.row_groups.clone(),
            key_value_metadata,
            created_by: Some(self.options.created_by.clone()),
            column_orders: Some(column_orders),
            encryption_algorithm: None,
            footer_signing_key_metadata: None,
        };
        let footer = to_thrift_bytes(&metadata)?;

        let footer_len = u32::try_from(footer.len()).map_err(|_| {
            ParquetError::internal(format!("footer of {} bytes is too large", footer.len()))
        })?;
        self.append(&footer)?;
        self.append(&footer_len.to_le_bytes())?;
        self.append(PARQUET_MAGIC)?;
        self.state = WriterState::FooterWritten;

        debug!(
            row_groups = self.row_groups.len(),
            rows = self.total_rows_written,
            footer_bytes = footer.len(),
            file_bytes = self.sink.position(),
            "wrote footer"
        );
        Ok(())
    }

    /// Finish the file and flush the sink
    ///
    /// Writes the footer if that has not happened yet.
    pub fn close(&mut self) -> Result<()> {
        self.ensure_not_failed()?;
        match self.state {
            WriterState::Closed => {
                return Err(ParquetError::invalid_state("writer is already closed"))
            }
            WriterState::FooterWritten => {}
            _ => self.write_footer()?,
        }

        let result = self.sink.flush();
        self.track(result)?;
        self.state = WriterState::Closed;
        Ok(())
    }
}

fn describe(schema: &Schema) -> String {
    schema
        .fields()
        .iter()
        .map(|f| {
            format!(
                "{}: {}{}",
                f.name,
                f.column_type,
                if f.nullable { "?" } else { "" }
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Write `table` to `sink` as a complete Parquet file
pub fn write_table<S: Sink>(table: &Table, sink: S, options: &WriterOptions) -> Result<()> {
    let mut writer = Writer::new_with_options(sink, table.schema().clone(), options.clone())?;
    writer.write_table(table)?;
    writer.close()
}
