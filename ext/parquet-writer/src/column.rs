//! Column chunk encoding and commit
//!
//! Encoding a chunk is pure computation over a borrowed column, so the
//! chunks of one row group can be encoded on any thread. Committing appends
//! the finished pages to the sink and records where they landed.

use crate::compression::PageCodec;
use crate::encoding::dictionary::{Dictionary, DictionaryLimits};
use crate::encoding::rle::encode_dictionary_indices;
use crate::encoding::{ParquetPrimitive, SortOrder};
use crate::format::{Encoding, PhysicalType};
use crate::page::{split_pages, CompressedPage, PageBuilder, PageLimits};
use crate::schema::TimeUnit;
use crate::sink::Sink;
use crate::statistics::ValueStatistics;
use crate::table::{Column, ColumnData};
use crate::writer::WriterOptions;
use crate::{ParquetError, Result};
use parquet::format::{ColumnChunk, ColumnMetaData, CompressionCodec, PageType, Statistics};
use std::borrow::Cow;
use std::ops::Range;
use tracing::trace;

/// Dictionaries are abandoned once distinct values exceed this share of
/// the chunk's non-null values
const DICTIONARY_MAX_RATIO: f64 = 0.5;

const MILLIS_PER_SECOND: i64 = 1000;

/// Encoding chosen for a column chunk
#[derive(Debug)]
enum ChunkEncoding<T> {
    Plain,
    Dictionary(Dictionary<T>),
}

/// All pages and metadata of one column within one row group, not yet
/// written anywhere
#[derive(Debug)]
pub(crate) struct EncodedColumnChunk {
    name: String,
    physical_type: PhysicalType,
    codec: CompressionCodec,
    dictionary_page: Option<CompressedPage>,
    data_pages: Vec<CompressedPage>,
    encodings: Vec<Encoding>,
    num_values: usize,
    statistics: Statistics,
}

impl EncodedColumnChunk {
    pub fn is_dictionary_encoded(&self) -> bool {
        self.dictionary_page.is_some()
    }

    pub fn num_data_pages(&self) -> usize {
        self.data_pages.len()
    }

    fn pages(&self) -> impl Iterator<Item = &CompressedPage> {
        self.dictionary_page.iter().chain(self.data_pages.iter())
    }

    pub fn compressed_size(&self) -> usize {
        self.pages().map(CompressedPage::compressed_len).sum()
    }

    pub fn uncompressed_size(&self) -> usize {
        self.pages().map(CompressedPage::uncompressed_len).sum()
    }

    /// Append every page to `sink`, dictionary page first, and return the
    /// chunk's footer record
    pub fn commit<S: Sink + ?Sized>(self, sink: &mut S) -> Result<ColumnChunk> {
        let total_compressed_size = self.compressed_size() as i64;
        let total_uncompressed_size = self.uncompressed_size() as i64;

        let mut dictionary_page_offset = None;
        let mut data_page_offset = None;
        for page in self.pages() {
            let offset = sink.position() as i64;
            if page.page_type == PageType::DICTIONARY_PAGE {
                dictionary_page_offset = Some(offset);
            } else {
                data_page_offset.get_or_insert(offset);
            }
            sink.append(&page.header)?;
            sink.append(&page.data)?;
        }
        let data_page_offset = data_page_offset.unwrap_or(sink.position() as i64);

        trace!(
            column = %self.name,
            pages = self.num_data_pages(),
            dictionary = self.is_dictionary_encoded(),
            compressed = total_compressed_size,
            "committed column chunk"
        );

        let meta_data = ColumnMetaData {
            type_: self.physical_type.into(),
            encodings: self.encodings.into_iter().map(Into::into).collect(),
            path_in_schema: vec![self.name],
            codec: self.codec,
            num_values: self.num_values as i64,
            total_uncompressed_size,
            total_compressed_size,
            key_value_metadata: None,
            data_page_offset,
            index_page_offset: None,
            dictionary_page_offset,
            statistics: Some(self.statistics),
            encoding_stats: None,
            bloom_filter_offset: None,
            bloom_filter_length: None,
            size_statistics: None,
        };
        Ok(ColumnChunk {
            file_path: None,
            file_offset: dictionary_page_offset.unwrap_or(data_page_offset),
            meta_data: Some(meta_data),
            offset_index_offset: None,
            offset_index_length: None,
            column_index_offset: None,
            column_index_length: None,
            crypto_metadata: None,
            encrypted_column_metadata: None,
        })
    }
}

/// Encodes one column of a table over a row range
pub(crate) struct ColumnChunkWriter<'a> {
    column: &'a Column,
    options: &'a WriterOptions,
    codec: &'a dyn PageCodec,
}

impl<'a> ColumnChunkWriter<'a> {
    pub fn new(column: &'a Column, options: &'a WriterOptions, codec: &'a dyn PageCodec) -> Self {
        Self {
            column,
            options,
            codec,
        }
    }

    /// Encode rows `range` of the column into pages
    pub fn encode(&self, range: Range<usize>) -> Result<EncodedColumnChunk> {
        let validity: Cow<'_, [bool]> = match self.column.validity() {
            Some(validity) => Cow::Borrowed(&validity[range.clone()]),
            None => Cow::Owned(vec![true; range.len()]),
        };

        match self.column.data() {
            ColumnData::Boolean(v) => self.encode_values(&v[range], &validity),
            ColumnData::Int8(v) => self.encode_values(&widen(&v[range], i32::from), &validity),
            ColumnData::Int16(v) => self.encode_values(&widen(&v[range], i32::from), &validity),
            ColumnData::Int32(v) => self.encode_values(&v[range], &validity),
            ColumnData::Int64(v) => self.encode_values(&v[range], &validity),
            ColumnData::UInt8(v) => self.encode_values(&widen(&v[range], i32::from), &validity),
            ColumnData::UInt16(v) => self.encode_values(&widen(&v[range], i32::from), &validity),
            // unsigned values keep their bit pattern in the signed physical type
            ColumnData::UInt32(v) => {
                self.encode_values(&widen(&v[range], |x: u32| x as i32), &validity)
            }
            ColumnData::UInt64(v) => {
                self.encode_values(&widen(&v[range], |x: u64| x as i64), &validity)
            }
            ColumnData::Float32(v) => self.encode_values(&v[range], &validity),
            ColumnData::Float64(v) => self.encode_values(&v[range], &validity),
            ColumnData::String(v) => {
                let values: Vec<&[u8]> = v[range].iter().map(|s| s.as_bytes()).collect();
                self.encode_values(&values, &validity)
            }
            ColumnData::Timestamp(TimeUnit::Days, v) => {
                let days = convert_valid(&v[range], &validity, |days: i64| {
                    i32::try_from(days).map_err(|_| {
                        ParquetError::data_validation(format!(
                            "date {} days from epoch does not fit in 32 bits in column '{}'",
                            days,
                            self.column.name()
                        ))
                    })
                })?;
                self.encode_values(&days, &validity)
            }
            ColumnData::Timestamp(TimeUnit::Seconds, v) => {
                let millis = convert_valid(&v[range], &validity, |seconds: i64| {
                    seconds.checked_mul(MILLIS_PER_SECOND).ok_or_else(|| {
                        ParquetError::data_validation(format!(
                            "timestamp {}s overflows when scaled to milliseconds in column '{}'",
                            seconds,
                            self.column.name()
                        ))
                    })
                })?;
                self.encode_values(&millis, &validity)
            }
            ColumnData::Timestamp(_, v) => self.encode_values(&v[range], &validity),
            ColumnData::Duration(_, _) => Err(ParquetError::unsupported_type(format!(
                "column '{}' has type {} which has no Parquet encoder",
                self.column.name(),
                self.column.column_type()
            ))),
        }
    }

    fn sort_order(&self) -> SortOrder {
        if self.column.column_type().is_unsigned() {
            SortOrder::Unsigned
        } else {
            SortOrder::Signed
        }
    }

    fn choose_encoding<T: ParquetPrimitive>(&self, non_null: &[T]) -> ChunkEncoding<T> {
        if !self.options.dictionary_enabled || T::PHYSICAL_TYPE == PhysicalType::Boolean {
            return ChunkEncoding::Plain;
        }
        let limits = DictionaryLimits {
            max_ratio: DICTIONARY_MAX_RATIO,
            max_page_bytes: self.options.dictionary_page_byte_limit,
        };
        Dictionary::try_build(non_null, limits)
            .map_or(ChunkEncoding::Plain, ChunkEncoding::Dictionary)
    }

    fn encode_values<T: ParquetPrimitive>(
        &self,
        values: &[T],
        validity: &[bool],
    ) -> Result<EncodedColumnChunk> {
        debug_assert_eq!(values.len(), validity.len());
        let column_type = self.column.column_type();
        let physical_type = column_type.physical_type()?;
        let nullable = self.column.is_nullable();

        let non_null: Vec<T> = values
            .iter()
            .zip(validity)
            .filter_map(|(value, valid)| valid.then_some(*value))
            .collect();
        let encoding = self.choose_encoding(&non_null);

        let level_bits = usize::from(nullable);
        let limits = PageLimits {
            byte_target: self.options.page_byte_target,
            row_limit: self.options.page_row_limit,
        };
        let page_ranges = match &encoding {
            ChunkEncoding::Plain => split_pages(values.len(), limits, |row| {
                level_bits + if validity[row] { values[row].plain_bits() } else { 0 }
            }),
            ChunkEncoding::Dictionary(dict) => {
                let index_bits = dict.bit_width() as usize;
                split_pages(values.len(), limits, |row| {
                    level_bits + if validity[row] { index_bits } else { 0 }
                })
            }
        };

        let builder = PageBuilder::new(self.codec, nullable);
        let sort_order = self.sort_order();
        let mut chunk_stats = ValueStatistics::<T>::new(sort_order);
        let mut data_pages = Vec::with_capacity(page_ranges.len());
        let mut cursor = 0;

        for rows in page_ranges {
            let page_validity = &validity[rows];
            let present = page_validity.iter().filter(|valid| **valid).count();
            let page_values = &non_null[cursor..cursor + present];

            let mut page_stats = ValueStatistics::new(sort_order);
            page_stats.update_all(page_values);
            page_stats.add_nulls((page_validity.len() - present) as u64);

            let page = match &encoding {
                ChunkEncoding::Plain => {
                    let mut payload = Vec::new();
                    T::encode_plain(page_values, &mut payload);
                    builder.data_page(
                        page_validity,
                        Encoding::Plain,
                        &payload,
                        page_stats.to_thrift(),
                    )?
                }
                ChunkEncoding::Dictionary(dict) => {
                    let indices = &dict.indices()[cursor..cursor + present];
                    let payload = encode_dictionary_indices(indices, dict.bit_width());
                    builder.data_page(
                        page_validity,
                        Encoding::RleDictionary,
                        &payload,
                        page_stats.to_thrift(),
                    )?
                }
            };

            chunk_stats.merge(&page_stats);
            data_pages.push(page);
            cursor += present;
        }

        let (dictionary_page, encodings) = match &encoding {
            ChunkEncoding::Plain => (None, vec![Encoding::Plain, Encoding::Rle]),
            ChunkEncoding::Dictionary(dict) => {
                chunk_stats.set_distinct_count(dict.len() as u64);
                let page = builder.dictionary_page(&dict.encode_entries(), dict.len())?;
                (
                    Some(page),
                    vec![Encoding::Plain, Encoding::Rle, Encoding::RleDictionary],
                )
            }
        };

        Ok(EncodedColumnChunk {
            name: self.column.name().to_string(),
            physical_type,
            codec: self.options.compression.thrift_codec(),
            dictionary_page,
            data_pages,
            encodings,
            num_values: values.len(),
            statistics: chunk_stats.to_thrift(),
        })
    }
}

fn widen<S: Copy, T>(values: &[S], f: impl Fn(S) -> T) -> Vec<T> {
    values.iter().map(|v| f(*v)).collect()
}

/// Convert the valid slots of `values`; null slots become the default
fn convert_valid<S: Copy, T: Default>(
    values: &[S],
    validity: &[bool],
    f: impl Fn(S) -> Result<T>,
) -> Result<Vec<T>> {
    values
        .iter()
        .zip(validity)
        .map(|(value, valid)| if *valid { f(*value) } else { Ok(T::default()) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::NoCompression;

    fn options() -> WriterOptions {
        WriterOptions::default()
    }

    #[test]
    fn test_low_cardinality_uses_dictionary() {
        let column = Column::new(
            "city",
            ColumnData::String((0..1000).map(|i| format!("city-{}", i % 4)).collect()),
        );
        let options = options();
        let chunk = ColumnChunkWriter::new(&column, &options, &NoCompression)
            .encode(0..1000)
            .unwrap();
        assert!(chunk.is_dictionary_encoded());
        assert_eq!(chunk.statistics.distinct_count, Some(4));
        assert_eq!(
            chunk.encodings,
            vec![Encoding::Plain, Encoding::Rle, Encoding::RleDictionary]
        );
    }

    #[test]
    fn test_high_cardinality_uses_plain() {
        let column = Column::new("id", ColumnData::Int64((0..1000).collect()));
        let options = options();
        let chunk = ColumnChunkWriter::new(&column, &options, &NoCompression)
            .encode(0..1000)
            .unwrap();
        assert!(!chunk.is_dictionary_encoded());
        assert_eq!(chunk.statistics.min_value, Some(0i64.to_le_bytes().to_vec()));
        assert_eq!(chunk.statistics.max_value, Some(999i64.to_le_bytes().to_vec()));
    }

    #[test]
    fn test_booleans_never_dictionary() {
        let column = Column::new("flag", ColumnData::Boolean(vec![true; 500]));
        let options = options();
        let chunk = ColumnChunkWriter::new(&column, &options, &NoCompression)
            .encode(0..500)
            .unwrap();
        assert!(!chunk.is_dictionary_encoded());
    }

    #[test]
    fn test_small_page_target_splits_pages() {
        let column = Column::new("v", ColumnData::Int32((0..1000).collect()));
        let options = WriterOptions {
            page_byte_target: 400,
            ..options()
        };
        let chunk = ColumnChunkWriter::new(&column, &options, &NoCompression)
            .encode(0..1000)
            .unwrap();
        assert_eq!(chunk.num_data_pages(), 10);
        assert_eq!(chunk.num_values, 1000);
    }

    #[test]
    fn test_null_counts_and_range() {
        let column = Column::with_validity(
            "v",
            ColumnData::Float64(vec![1.0, 0.0, 5.0, 0.0]),
            vec![true, false, true, false],
        )
        .unwrap();
        let options = options();
        let chunk = ColumnChunkWriter::new(&column, &options, &NoCompression)
            .encode(1..4)
            .unwrap();
        assert_eq!(chunk.num_values, 3);
        assert_eq!(chunk.statistics.null_count, Some(2));
        assert_eq!(chunk.statistics.min_value, Some(5.0f64.to_le_bytes().to_vec()));
    }

    #[test]
    fn test_seconds_overflow_is_validation_error() {
        let column = Column::new(
            "ts",
            ColumnData::Timestamp(TimeUnit::Seconds, vec![i64::MAX]),
        );
        let options = options();
        let err = ColumnChunkWriter::new(&column, &options, &NoCompression)
            .encode(0..1)
            .unwrap_err();
        assert!(matches!(err, ParquetError::DataValidation(_)));
    }

    #[test]
    fn test_overflow_in_null_slot_is_ignored() {
        let column = Column::with_validity(
            "ts",
            ColumnData::Timestamp(TimeUnit::Seconds, vec![i64::MAX, 2]),
            vec![false, true],
        )
        .unwrap();
        let options = options();
        let chunk = ColumnChunkWriter::new(&column, &options, &NoCompression)
            .encode(0..2)
            .unwrap();
        assert_eq!(chunk.statistics.max_value, Some(2000i64.to_le_bytes().to_vec()));
    }

    #[test]
    fn test_duration_unsupported() {
        let column = Column::new("d", ColumnData::Duration(TimeUnit::Seconds, vec![1]));
        let options = options();
        let err = ColumnChunkWriter::new(&column, &options, &NoCompression)
            .encode(0..1)
            .unwrap_err();
        assert!(matches!(err, ParquetError::UnsupportedType(_)));
    }

    #[test]
    fn test_commit_records_offsets() {
        let column = Column::new("v", ColumnData::Int32(vec![1, 1, 1, 1, 2, 2, 2, 2]));
        let options = options();
        let chunk = ColumnChunkWriter::new(&column, &options, &NoCompression)
            .encode(0..8)
            .unwrap();
        let compressed = chunk.compressed_size();

        let mut sink = vec![0u8; 4];
        let chunk = chunk.commit(&mut sink).unwrap();
        assert_eq!(chunk.file_offset, 4);
        let meta = chunk.meta_data.unwrap();
        assert_eq!(meta.type_, parquet::format::Type::INT32);
        assert_eq!(meta.codec, CompressionCodec::UNCOMPRESSED);
        assert_eq!(meta.dictionary_page_offset, Some(4));
        assert!(meta.data_page_offset > 4);
        assert_eq!(meta.total_compressed_size as usize, compressed);
        assert_eq!(sink.len(), 4 + compressed);
    }
}
