//! Data and dictionary pages
//!
//! Pages are fully encoded and compressed in memory. Nothing here touches
//! the sink; the column chunk writer appends finished pages in order.

use crate::compression::PageCodec;
use crate::encoding::rle::encode_definition_levels;
use crate::format::{to_thrift_bytes, Encoding};
use crate::{ParquetError, Result};
use parquet::format::{DataPageHeader, DictionaryPageHeader, PageHeader, PageType, Statistics};
use std::ops::Range;
use tracing::trace;

/// When a page is closed
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageLimits {
    pub byte_target: usize,
    pub row_limit: usize,
}

/// Split `num_rows` rows into page ranges
///
/// `row_bits(i)` estimates the encoded size of row `i`, definition level
/// included. A page closes once its estimate reaches the byte target or it
/// holds `row_limit` rows; pages are never empty.
pub(crate) fn split_pages<F>(num_rows: usize, limits: PageLimits, row_bits: F) -> Vec<Range<usize>>
where
    F: Fn(usize) -> usize,
{
    let target_bits = limits.byte_target.saturating_mul(8).max(1);
    let row_limit = limits.row_limit.max(1);

    let mut pages = Vec::new();
    let mut start = 0;
    let mut bits = 0usize;
    for row in 0..num_rows {
        bits += row_bits(row);
        if bits >= target_bits || row + 1 - start >= row_limit {
            pages.push(start..row + 1);
            start = row + 1;
            bits = 0;
        }
    }
    if start < num_rows {
        pages.push(start..num_rows);
    }
    pages
}

/// A page ready to be appended: serialized header plus compressed payload
#[derive(Debug, Clone)]
pub(crate) struct CompressedPage {
    pub page_type: PageType,
    pub header: Vec<u8>,
    pub data: Vec<u8>,
    pub uncompressed_size: usize,
}

impl CompressedPage {
    /// Bytes this page occupies in the file
    pub fn compressed_len(&self) -> usize {
        self.header.len() + self.data.len()
    }

    /// Size the page would occupy without compression
    pub fn uncompressed_len(&self) -> usize {
        self.header.len() + self.uncompressed_size
    }
}

fn page_size(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| {
        ParquetError::data_validation(format!("page of {} bytes exceeds the format limit", len))
    })
}

/// Assembles raw page payloads, compresses them and builds their headers
pub(crate) struct PageBuilder<'a> {
    codec: &'a dyn PageCodec,
    nullable: bool,
}

impl<'a> PageBuilder<'a> {
    pub fn new(codec: &'a dyn PageCodec, nullable: bool) -> Self {
        Self { codec, nullable }
    }

    /// Build a format version 1 data page
    ///
    /// `validity` covers every row of the page; definition levels are only
    /// written for OPTIONAL columns.
    pub fn data_page(
        &self,
        validity: &[bool],
        encoding: Encoding,
        values: &[u8],
        statistics: Statistics,
    ) -> Result<CompressedPage> {
        let mut raw = Vec::new();
        if self.nullable {
            raw.extend_from_slice(&encode_definition_levels(validity));
        }
        raw.extend_from_slice(values);

        let num_values = validity.len();
        let data = self.codec.compress(&raw)?;
        let header = PageHeader {
            type_: PageType::DATA_PAGE,
            uncompressed_page_size: page_size(raw.len())?,
            compressed_page_size: page_size(data.len())?,
            crc: None,
            data_page_header: Some(DataPageHeader {
                num_values: page_size(num_values)?,
                encoding: encoding.into(),
                definition_level_encoding: Encoding::Rle.into(),
                repetition_level_encoding: Encoding::Rle.into(),
                statistics: Some(statistics),
            }),
            index_page_header: None,
            dictionary_page_header: None,
            data_page_header_v2: None,
        };

        trace!(
            num_values,
            uncompressed = raw.len(),
            compressed = data.len(),
            ?encoding,
            "built data page"
        );

        Ok(CompressedPage {
            page_type: PageType::DATA_PAGE,
            header: to_thrift_bytes(&header)?,
            data,
            uncompressed_size: raw.len(),
        })
    }

    /// Build the dictionary page from the PLAIN encoded entries
    pub fn dictionary_page(&self, entries: &[u8], num_entries: usize) -> Result<CompressedPage> {
        let data = self.codec.compress(entries)?;
        let header = PageHeader {
            type_: PageType::DICTIONARY_PAGE,
            uncompressed_page_size: page_size(entries.len())?,
            compressed_page_size: page_size(data.len())?,
            crc: None,
            data_page_header: None,
            index_page_header: None,
            dictionary_page_header: Some(DictionaryPageHeader {
                num_values: page_size(num_entries)?,
                encoding: Encoding::Plain.into(),
                is_sorted: Some(false),
            }),
            data_page_header_v2: None,
        };

        trace!(
            num_entries,
            uncompressed = entries.len(),
            compressed = data.len(),
            "built dictionary page"
        );

        Ok(CompressedPage {
            page_type: PageType::DICTIONARY_PAGE,
            header: to_thrift_bytes(&header)?,
            data,
            uncompressed_size: entries.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::{Compression, NoCompression};

    #[test]
    fn test_split_by_bytes() {
        let limits = PageLimits {
            byte_target: 16,
            row_limit: 1000,
        };
        // 4 bytes per row, 4 rows per page
        let pages = split_pages(10, limits, |_| 32);
        assert_eq!(pages, vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn test_split_by_rows() {
        let limits = PageLimits {
            byte_target: usize::MAX,
            row_limit: 3,
        };
        let pages = split_pages(7, limits, |_| 1);
        assert_eq!(pages, vec![0..3, 3..6, 6..7]);
    }

    #[test]
    fn test_oversized_row_gets_own_page() {
        let limits = PageLimits {
            byte_target: 1,
            row_limit: 100,
        };
        let pages = split_pages(3, limits, |_| 800);
        assert_eq!(pages, vec![0..1, 1..2, 2..3]);
        assert!(split_pages(0, limits, |_| 1).is_empty());
    }

    #[test]
    fn test_required_page_has_no_levels() {
        let codec = NoCompression;
        let builder = PageBuilder::new(&codec, false);
        let page = builder
            .data_page(&[true, true], Encoding::Plain, &[1, 2, 3, 4], Statistics::default())
            .unwrap();
        assert_eq!(page.data, vec![1, 2, 3, 4]);
        assert_eq!(page.uncompressed_size, 4);
    }

    #[test]
    fn test_optional_page_leads_with_levels() {
        let codec = NoCompression;
        let builder = PageBuilder::new(&codec, true);
        let page = builder
            .data_page(&[true, false], Encoding::Plain, &[7], Statistics::default())
            .unwrap();
        // length 2, one bit-packed group holding 0b01, then the value
        assert_eq!(page.data, vec![2, 0, 0, 0, 3, 1, 7]);
        assert_eq!(page.compressed_len(), page.uncompressed_len());
    }

    #[test]
    fn test_data_page_header_fields() {
        use parquet::thrift::TSerializable;
        use thrift::protocol::TCompactInputProtocol;

        let codec = NoCompression;
        let builder = PageBuilder::new(&codec, true);
        let stats = Statistics {
            null_count: Some(1),
            ..Statistics::default()
        };
        let page = builder
            .data_page(&[true, false, true], Encoding::RleDictionary, &[1, 0], stats)
            .unwrap();

        let mut protocol = TCompactInputProtocol::new(page.header.as_slice());
        let header = PageHeader::read_from_in_protocol(&mut protocol).unwrap();
        assert_eq!(header.type_, PageType::DATA_PAGE);
        assert_eq!(header.uncompressed_page_size as usize, page.uncompressed_size);
        let data = header.data_page_header.unwrap();
        assert_eq!(data.num_values, 3);
        assert_eq!(data.encoding, parquet::format::Encoding::RLE_DICTIONARY);
        assert_eq!(data.definition_level_encoding, parquet::format::Encoding::RLE);
        assert_eq!(data.statistics.unwrap().null_count, Some(1));
    }

    #[test]
    fn test_snappy_page_records_raw_size() {
        let codec = Compression::Snappy.codec();
        let builder = PageBuilder::new(codec.as_ref(), false);
        let values = vec![0u8; 4096];
        let page = builder
            .dictionary_page(&values, 1024)
            .unwrap();
        assert_eq!(page.uncompressed_size, 4096);
        assert!(page.data.len() < 4096);
        assert_eq!(page.page_type, PageType::DICTIONARY_PAGE);
    }
}
