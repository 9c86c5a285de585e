//! RLE / bit-packing hybrid
//!
//! Used for definition levels and dictionary indices. A stream is a
//! sequence of runs, each introduced by a ULEB128 header:
//!
//! - `count << 1` followed by one value in `ceil(bit_width / 8)` bytes is
//!   an RLE run of `count` copies.
//! - `groups << 1 | 1` followed by `groups * bit_width` bytes is a
//!   bit-packed run of `groups * 8` values, least significant bit first.
//!
//! Bit-packed runs hold whole groups of eight. Literal values pending in
//! front of a long repeat are topped up from that repeat so no partial
//! group is ever emitted mid-stream; only the last group of a stream may be
//! zero padded, and readers stop at the value count they were given.

/// Shortest repeat worth an RLE run
const MIN_REPEAT_RUN: usize = 8;

/// Bits needed to represent `max_value`
pub(crate) fn num_required_bits(max_value: u64) -> u8 {
    (64 - max_value.leading_zeros()) as u8
}

fn write_uleb128(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Encoder for one hybrid stream of `bit_width`-bit values
#[derive(Debug)]
pub(crate) struct RleEncoder {
    bit_width: u8,
    buffer: Vec<u8>,
}

impl RleEncoder {
    pub fn new(bit_width: u8) -> Self {
        debug_assert!(bit_width <= 32);
        Self {
            bit_width,
            buffer: Vec::new(),
        }
    }

    /// Encode a complete stream of values
    pub fn encode(mut self, values: &[u64]) -> Vec<u8> {
        let mut literal_start = 0;
        let mut i = 0;

        while i < values.len() {
            let value = values[i];
            let mut end = i + 1;
            while end < values.len() && values[end] == value {
                end += 1;
            }

            if end - i >= MIN_REPEAT_RUN {
                let pending = i - literal_start;
                let split = i + (MIN_REPEAT_RUN - pending % MIN_REPEAT_RUN) % MIN_REPEAT_RUN;
                if end - split >= MIN_REPEAT_RUN {
                    if split > literal_start {
                        self.write_bit_packed(&values[literal_start..split]);
                    }
                    self.write_rle_run(value, end - split);
                    literal_start = end;
                }
            }
            i = end;
        }

        if literal_start < values.len() {
            self.write_bit_packed(&values[literal_start..]);
        }
        self.buffer
    }

    fn write_rle_run(&mut self, value: u64, count: usize) {
        write_uleb128(&mut self.buffer, (count as u64) << 1);
        let value_bytes = (self.bit_width as usize).div_ceil(8);
        self.buffer
            .extend_from_slice(&value.to_le_bytes()[..value_bytes]);
    }

    fn write_bit_packed(&mut self, values: &[u64]) {
        let groups = values.len().div_ceil(8);
        write_uleb128(&mut self.buffer, ((groups as u64) << 1) | 1);

        let bit_width = self.bit_width as u32;
        let mut acc: u64 = 0;
        let mut bits: u32 = 0;
        for idx in 0..groups * 8 {
            let value = values.get(idx).copied().unwrap_or(0);
            acc |= value << bits;
            bits += bit_width;
            while bits >= 8 {
                self.buffer.push(acc as u8);
                acc >>= 8;
                bits -= 8;
            }
        }
    }
}

/// Definition levels of one page: 4-byte little-endian length prefix
/// followed by the hybrid encoding at bit width 1
pub(crate) fn encode_definition_levels(validity: &[bool]) -> Vec<u8> {
    let levels: Vec<u64> = validity.iter().map(|valid| *valid as u64).collect();
    let encoded = RleEncoder::new(1).encode(&levels);

    let mut out = Vec::with_capacity(encoded.len() + 4);
    out.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
    out.extend_from_slice(&encoded);
    out
}

/// Dictionary indices of one page: one byte of bit width followed by the
/// hybrid encoding
pub(crate) fn encode_dictionary_indices(indices: &[u32], bit_width: u8) -> Vec<u8> {
    let values: Vec<u64> = indices.iter().map(|idx| *idx as u64).collect();
    let encoded = RleEncoder::new(bit_width).encode(&values);

    let mut out = Vec::with_capacity(encoded.len() + 1);
    out.push(bit_width);
    out.extend_from_slice(&encoded);
    out
}
