//! PLAIN encoding for the two physical types that are not fixed-width bytes

/// Bit-pack booleans, least significant bit first
pub(crate) fn encode_booleans(values: &[bool], out: &mut Vec<u8>) {
    out.reserve(values.len().div_ceil(8));
    for chunk in values.chunks(8) {
        let byte = chunk
            .iter()
            .enumerate()
            .fold(0u8, |acc, (bit, value)| acc | ((*value as u8) << bit));
        out.push(byte);
    }
}

/// 4-byte little-endian length followed by the raw bytes, per value
pub(crate) fn encode_byte_arrays(values: &[&[u8]], out: &mut Vec<u8>) {
    let total: usize = values.iter().map(|v| v.len() + 4).sum();
    out.reserve(total);
    for value in values {
        out.extend_from_slice(&(value.len() as u32).to_le_bytes());
        out.extend_from_slice(value);
    }
}
