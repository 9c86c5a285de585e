//! Dictionary encoding
//!
//! Entries are kept in first-occurrence order so the dictionary page is
//! deterministic for a given input.

use super::rle::num_required_bits;
use super::ParquetPrimitive;
use ahash::AHashMap;

/// Limits that make a chunk fall back to PLAIN
#[derive(Debug, Clone, Copy)]
pub(crate) struct DictionaryLimits {
    /// Maximum distinct / non-null ratio
    pub max_ratio: f64,
    /// Maximum PLAIN size of the dictionary page
    pub max_page_bytes: usize,
}

/// A built dictionary plus one index per non-null value
#[derive(Debug)]
pub(crate) struct Dictionary<T> {
    entries: Vec<T>,
    indices: Vec<u32>,
    plain_bytes: usize,
}

impl<T: ParquetPrimitive> Dictionary<T> {
    /// Try to dictionary encode `values` (non-null values only, in row
    /// order); `None` as soon as either limit is exceeded
    pub fn try_build(values: &[T], limits: DictionaryLimits) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let max_entries = (limits.max_ratio * values.len() as f64) as usize;
        let mut lookup: AHashMap<T::Key, u32> = AHashMap::new();
        let mut entries = Vec::new();
        let mut indices = Vec::with_capacity(values.len());
        let mut plain_bits = 0usize;

        for value in values {
            let next = entries.len() as u32;
            let index = *lookup.entry(value.dictionary_key()).or_insert(next);
            if index == next {
                entries.push(*value);
                plain_bits += value.plain_bits();
                if entries.len() > max_entries || plain_bits.div_ceil(8) > limits.max_page_bytes {
                    return None;
                }
            }
            indices.push(index);
        }

        Some(Self {
            entries,
            indices,
            plain_bytes: plain_bits.div_ceil(8),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Width of each encoded index, at least one bit
    pub fn bit_width(&self) -> u8 {
        num_required_bits(self.entries.len().saturating_sub(1) as u64).max(1)
    }

    /// PLAIN encoding of the entries, the dictionary page payload
    pub fn encode_entries(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.plain_bytes);
        T::encode_plain(&self.entries, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: DictionaryLimits = DictionaryLimits {
        max_ratio: 0.5,
        max_page_bytes: 1024 * 1024,
    };

    #[test]
    fn test_first_occurrence_order() {
        let values = [5i32, 3, 5, 5, 3, 9, 9, 9];
        let dict = Dictionary::try_build(&values, LIMITS).unwrap();
        assert_eq!(dict.entries, vec![5, 3, 9]);
        assert_eq!(dict.indices(), &[0, 1, 0, 0, 1, 2, 2, 2]);
        assert_eq!(dict.bit_width(), 2);
        assert_eq!(dict.plain_bytes, 12);
    }

    #[test]
    fn test_high_cardinality_aborts() {
        let values: Vec<i64> = (0..100).collect();
        assert!(Dictionary::try_build(&values, LIMITS).is_none());
    }

    #[test]
    fn test_byte_limit_aborts() {
        let long = vec![b'x'; 600];
        let other = vec![b'y'; 600];
        let values: Vec<&[u8]> = (0..10)
            .map(|i| if i % 2 == 0 { &long[..] } else { &other[..] })
            .collect();
        let limits = DictionaryLimits {
            max_ratio: 0.5,
            max_page_bytes: 1000,
        };
        assert!(Dictionary::try_build(&values, limits).is_none());
        assert!(Dictionary::try_build(&values, LIMITS).is_some());
    }

    #[test]
    fn test_single_entry_bit_width() {
        let values = [7.5f64; 10];
        let dict = Dictionary::try_build(&values, LIMITS).unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.bit_width(), 1);
        assert_eq!(dict.encode_entries(), 7.5f64.to_le_bytes().to_vec());
    }

    #[test]
    fn test_empty_input_has_no_dictionary() {
        assert!(Dictionary::<i32>::try_build(&[], LIMITS).is_none());
    }
}
