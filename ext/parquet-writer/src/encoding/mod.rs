//! Value encodings
//!
//! Every supported column type is lowered to one of five Parquet physical
//! types before encoding. [`ParquetPrimitive`] abstracts over those so the
//! PLAIN, dictionary and statistics code is written once.

pub(crate) mod dictionary;
pub(crate) mod plain;
pub(crate) mod rle;

use crate::format::PhysicalType;
use std::cmp::Ordering;
use std::hash::Hash;

/// How min/max statistics compare values of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortOrder {
    Signed,
    Unsigned,
}

/// A value of one of the Parquet physical types
pub(crate) trait ParquetPrimitive: Copy + Send + Sync {
    /// Hashable identity used to deduplicate dictionary entries
    type Key: Hash + Eq;

    const PHYSICAL_TYPE: PhysicalType;

    fn dictionary_key(&self) -> Self::Key;

    /// Size of the value's PLAIN encoding in bits
    fn plain_bits(&self) -> usize;

    /// Append the PLAIN encoding of `values`
    fn encode_plain(values: &[Self], out: &mut Vec<u8>);

    /// Bytes stored in `Statistics.min_value` / `max_value`
    fn stat_bytes(&self) -> Vec<u8>;

    fn compare(&self, other: &Self, order: SortOrder) -> Ordering;

    /// Values that must not take part in min/max
    fn ignored_in_stats(&self) -> bool {
        false
    }

    fn normalize_min(self) -> Self {
        self
    }

    fn normalize_max(self) -> Self {
        self
    }
}

impl ParquetPrimitive for bool {
    type Key = bool;
    const PHYSICAL_TYPE: PhysicalType = PhysicalType::Boolean;

    fn dictionary_key(&self) -> bool {
        *self
    }

    fn plain_bits(&self) -> usize {
        1
    }

    fn encode_plain(values: &[Self], out: &mut Vec<u8>) {
        plain::encode_booleans(values, out);
    }

    fn stat_bytes(&self) -> Vec<u8> {
        vec![*self as u8]
    }

    fn compare(&self, other: &Self, _order: SortOrder) -> Ordering {
        self.cmp(other)
    }
}

macro_rules! integer_primitive {
    ($ty:ty, $unsigned:ty, $physical:expr) => {
        impl ParquetPrimitive for $ty {
            type Key = $ty;
            const PHYSICAL_TYPE: PhysicalType = $physical;

            fn dictionary_key(&self) -> $ty {
                *self
            }

            fn plain_bits(&self) -> usize {
                std::mem::size_of::<$ty>() * 8
            }

            fn encode_plain(values: &[Self], out: &mut Vec<u8>) {
                out.reserve(values.len() * std::mem::size_of::<$ty>());
                for value in values {
                    out.extend_from_slice(&value.to_le_bytes());
                }
            }

            fn stat_bytes(&self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }

            fn compare(&self, other: &Self, order: SortOrder) -> Ordering {
                match order {
                    SortOrder::Signed => self.cmp(other),
                    SortOrder::Unsigned => (*self as $unsigned).cmp(&(*other as $unsigned)),
                }
            }
        }
    };
}

integer_primitive!(i32, u32, PhysicalType::Int32);
integer_primitive!(i64, u64, PhysicalType::Int64);

macro_rules! float_primitive {
    ($ty:ty, $bits:ty, $physical:expr) => {
        impl ParquetPrimitive for $ty {
            type Key = $bits;
            const PHYSICAL_TYPE: PhysicalType = $physical;

            // keyed by bit pattern so NaN and -0.0 get their own entries
            fn dictionary_key(&self) -> $bits {
                self.to_bits()
            }

            fn plain_bits(&self) -> usize {
                std::mem::size_of::<$ty>() * 8
            }

            fn encode_plain(values: &[Self], out: &mut Vec<u8>) {
                out.reserve(values.len() * std::mem::size_of::<$ty>());
                for value in values {
                    out.extend_from_slice(&value.to_le_bytes());
                }
            }

            fn stat_bytes(&self) -> Vec<u8> {
                self.to_le_bytes().to_vec()
            }

            fn compare(&self, other: &Self, _order: SortOrder) -> Ordering {
                self.total_cmp(other)
            }

            fn ignored_in_stats(&self) -> bool {
                self.is_nan()
            }

            fn normalize_min(self) -> Self {
                if self == 0.0 {
                    -0.0
                } else {
                    self
                }
            }

            fn normalize_max(self) -> Self {
                if self == 0.0 {
                    0.0
                } else {
                    self
                }
            }
        }
    };
}

float_primitive!(f32, u32, PhysicalType::Float);
float_primitive!(f64, u64, PhysicalType::Double);

impl<'a> ParquetPrimitive for &'a [u8] {
    type Key = &'a [u8];
    const PHYSICAL_TYPE: PhysicalType = PhysicalType::ByteArray;

    fn dictionary_key(&self) -> &'a [u8] {
        self
    }

    fn plain_bits(&self) -> usize {
        (4 + self.len()) * 8
    }

    fn encode_plain(values: &[Self], out: &mut Vec<u8>) {
        plain::encode_byte_arrays(values, out);
    }

    fn stat_bytes(&self) -> Vec<u8> {
        self.to_vec()
    }

    fn compare(&self, other: &Self, _order: SortOrder) -> Ordering {
        self.cmp(other)
    }
}
