use bytes::Bytes;
use parquet::basic::Compression as ParquetCompression;
use parquet::column::page::Page;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet_writer::*;

use test_helpers::*;

fn options_with(compression: Compression) -> WriterOptions {
    WriterOptions {
        compression,
        row_group_byte_target: 64 * 1024,
        page_byte_target: 4096,
        ..Default::default()
    }
}

/// Every page of every chunk, decompressed by the reader
fn decompressed_pages(bytes: &Bytes) -> Vec<(String, Bytes)> {
    let reader = SerializedFileReader::new(bytes.clone()).unwrap();
    let mut pages = Vec::new();
    for rg in 0..reader.num_row_groups() {
        let row_group = reader.get_row_group(rg).unwrap();
        for col in 0..row_group.num_columns() {
            for page in row_group.get_column_page_reader(col).unwrap() {
                let page = page.unwrap();
                let kind = match &page {
                    Page::DictionaryPage { .. } => "dictionary",
                    Page::DataPage { .. } => "data",
                    Page::DataPageV2 { .. } => "data_v2",
                };
                pages.push((kind.to_string(), page.buffer().clone()));
            }
        }
    }
    pages
}

#[test]
fn test_snappy_roundtrip() {
    let table = random_table(&SUPPORTED_TYPES, 5000, 0.2, 7);
    let bytes = test_roundtrip_with_options(&table, &options_with(Compression::Snappy));

    let metadata = read_metadata(&bytes);
    for row_group in metadata.row_groups() {
        for column in row_group.columns() {
            assert_eq!(column.compression(), ParquetCompression::SNAPPY);
        }
    }
}

#[test]
fn test_uncompressed_codec_in_metadata() {
    let table = create_test_table(100);
    let bytes = test_roundtrip(&table);

    let metadata = read_metadata(&bytes);
    for column in metadata.row_group(0).columns() {
        assert_eq!(column.compression(), ParquetCompression::UNCOMPRESSED);
        assert_eq!(column.compressed_size(), column.uncompressed_size());
    }
}

#[test]
fn test_snappy_pages_decompress_to_uncompressed_pages() {
    let table = random_table(&SUPPORTED_TYPES, 3000, 0.1, 11);
    let plain = write_to_bytes(&table, &options_with(Compression::Uncompressed)).unwrap();
    let snappy = write_to_bytes(&table, &options_with(Compression::Snappy)).unwrap();

    let plain_pages = decompressed_pages(&plain);
    let snappy_pages = decompressed_pages(&snappy);
    assert!(!plain_pages.is_empty());
    assert_eq!(plain_pages, snappy_pages);
}

#[test]
fn test_snappy_shrinks_repetitive_data() {
    let table = Table::try_new(vec![
        Column::new("repetitive", ColumnData::String(vec!["A".repeat(100); 2000])),
        Column::new("sequential", ColumnData::Int64((0..2000).collect())),
    ])
    .unwrap();
    let no_dictionary = |compression| WriterOptions {
        compression,
        dictionary_enabled: false,
        ..Default::default()
    };

    let plain = test_roundtrip_with_options(&table, &no_dictionary(Compression::Uncompressed));
    let snappy = test_roundtrip_with_options(&table, &no_dictionary(Compression::Snappy));
    assert!(snappy.len() * 4 < plain.len());

    let metadata = read_metadata(&snappy);
    let column = metadata.row_group(0).column(0);
    assert!(column.compressed_size() < column.uncompressed_size());
}

#[test]
fn test_compression_is_deterministic() {
    let table = random_table(&SUPPORTED_TYPES, 2000, 0.3, 3);
    let options = options_with(Compression::Snappy);

    let first = write_to_bytes(&table, &options).unwrap();
    let second = write_to_bytes(&table, &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_compression_from_config() {
    let options: WriterOptions = serde_json::from_str(r#"{"compression": "SNAPPY"}"#).unwrap();
    assert_eq!(options.compression, Compression::Snappy);

    let table = create_test_table(50);
    let bytes = test_roundtrip_with_options(&table, &options);
    let metadata = read_metadata(&bytes);
    assert_eq!(
        metadata.row_group(0).column(0).compression(),
        ParquetCompression::SNAPPY
    );
}
