//! Parquet wire-format mapping
//!
//! Page headers and the footer are the generated `parquet::format` structs,
//! serialized with the Thrift compact protocol. This module only maps the
//! writer's own vocabulary onto them.

use crate::Result;
use parquet::format;
use parquet::thrift::{TCompactOutputProtocol, TSerializable};
use thrift::protocol::TOutputProtocol;

/// Magic bytes opening and closing every Parquet file
pub const PARQUET_MAGIC: &[u8; 4] = b"PAR1";

/// Format version recorded in the footer
pub(crate) const FORMAT_VERSION: i32 = 1;

/// Physical storage type of a leaf column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Boolean,
    Int32,
    Int64,
    Float,
    Double,
    ByteArray,
}

impl From<PhysicalType> for format::Type {
    fn from(value: PhysicalType) -> Self {
        match value {
            PhysicalType::Boolean => format::Type::BOOLEAN,
            PhysicalType::Int32 => format::Type::INT32,
            PhysicalType::Int64 => format::Type::INT64,
            PhysicalType::Float => format::Type::FLOAT,
            PhysicalType::Double => format::Type::DOUBLE,
            PhysicalType::ByteArray => format::Type::BYTE_ARRAY,
        }
    }
}

/// Value encodings this writer produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Plain,
    Rle,
    RleDictionary,
}

impl From<Encoding> for format::Encoding {
    fn from(value: Encoding) -> Self {
        match value {
            Encoding::Plain => format::Encoding::PLAIN,
            Encoding::Rle => format::Encoding::RLE,
            Encoding::RleDictionary => format::Encoding::RLE_DICTIONARY,
        }
    }
}

/// Serialize a page header or footer with the compact protocol
pub(crate) fn to_thrift_bytes<T: TSerializable>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut protocol = TCompactOutputProtocol::new(&mut buf);
        value.write_to_out_protocol(&mut protocol)?;
        protocol.flush()?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use thrift::protocol::TCompactInputProtocol;

    fn decode<T: TSerializable>(bytes: &[u8]) -> T {
        let mut protocol = TCompactInputProtocol::new(bytes);
        T::read_from_in_protocol(&mut protocol).unwrap()
    }

    #[test]
    fn test_type_and_encoding_values() {
        assert_eq!(format::Type::from(PhysicalType::Boolean).0, 0);
        assert_eq!(format::Type::from(PhysicalType::Double).0, 5);
        assert_eq!(format::Type::from(PhysicalType::ByteArray).0, 6);
        assert_eq!(format::Encoding::from(Encoding::Rle).0, 3);
        assert_eq!(format::Encoding::from(Encoding::RleDictionary).0, 8);
    }

    #[test]
    fn test_key_value_bytes() {
        let kv = format::KeyValue::new("k".to_string(), Some("v".to_string()));
        // field 1 binary "k", field 2 binary "v", stop
        assert_eq!(
            to_thrift_bytes(&kv).unwrap(),
            vec![0x18, 0x01, b'k', 0x18, 0x01, b'v', 0x00]
        );
    }

    #[test]
    fn test_page_header_decodes() {
        let header = format::PageHeader {
            type_: format::PageType::DICTIONARY_PAGE,
            uncompressed_page_size: 40,
            compressed_page_size: 21,
            crc: None,
            data_page_header: None,
            index_page_header: None,
            dictionary_page_header: Some(format::DictionaryPageHeader::new(
                10,
                format::Encoding::PLAIN,
                false,
            )),
            data_page_header_v2: None,
        };
        let bytes = to_thrift_bytes(&header).unwrap();
        assert_eq!(decode::<format::PageHeader>(&bytes), header);
    }
}
