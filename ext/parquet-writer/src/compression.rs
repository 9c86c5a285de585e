//! Page compression
//!
//! Codecs are plain strategy objects: a [`Compression`] selector picks one,
//! and the page builder hands it the raw page bytes. The uncompressed length
//! is recorded in the page header whichever codec runs.

use crate::{ParquetError, Result};
use parquet::format::CompressionCodec;
use serde::{Deserialize, Serialize};

/// Block compression applied to every page of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Compression {
    #[default]
    #[serde(rename = "NONE", alias = "UNCOMPRESSED")]
    Uncompressed,
    #[serde(rename = "SNAPPY")]
    Snappy,
}

impl Compression {
    /// Codec recorded in column metadata
    pub(crate) fn thrift_codec(self) -> CompressionCodec {
        match self {
            Compression::Uncompressed => CompressionCodec::UNCOMPRESSED,
            Compression::Snappy => CompressionCodec::SNAPPY,
        }
    }

    /// Instantiate the codec for this selector
    pub fn codec(self) -> Box<dyn PageCodec> {
        match self {
            Compression::Uncompressed => Box::new(NoCompression),
            Compression::Snappy => Box::new(SnappyCodec),
        }
    }
}

/// A block compressor for page payloads
///
/// Implementations must be deterministic: the same input always produces
/// the same output bytes.
pub trait PageCodec: Send + Sync {
    fn compression(&self) -> Compression;

    /// Compressed form of `input`
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>>;
}

/// Byte-identity pass-through
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCompression;

impl PageCodec for NoCompression {
    fn compression(&self) -> Compression {
        Compression::Uncompressed
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(input.to_vec())
    }
}

/// Raw (unframed) Snappy blocks, as Parquet expects
#[derive(Debug, Clone, Copy, Default)]
pub struct SnappyCodec;

impl PageCodec for SnappyCodec {
    fn compression(&self) -> Compression {
        Compression::Snappy
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let max_len = snap::raw::max_compress_len(input.len());
        if max_len == 0 && !input.is_empty() {
            return Err(ParquetError::compression(format!(
                "snappy cannot compress a {} byte page",
                input.len()
            )));
        }

        let mut output = vec![0; max_len];
        let written = snap::raw::Encoder::new()
            .compress(input, &mut output)
            .map_err(|e| ParquetError::compression(format!("snappy: {}", e)))?;
        output.truncate(written);
        Ok(output)
    }
}
