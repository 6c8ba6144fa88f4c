//! Variable-width integer packing.
//!
//! Helpers for the fixed-width tables of the bplist format: big- and
//! little-endian packing for byte widths `1..=8`, and the minimal widths used
//! to size integers, offsets and object references.

/// Writes `value` into `out` as a big-endian integer of `out.len()` bytes.
///
/// High-order bytes that do not fit are dropped.
///
/// ```
/// let mut out = [0u8; 3];
/// bplist_buffers::int::write_uint_be(&mut out, 0x010203);
/// assert_eq!(out, [1, 2, 3]);
/// ```
pub fn write_uint_be(out: &mut [u8], value: u64) {
    debug_assert!((1..=8).contains(&out.len()));
    let bytes = value.to_be_bytes();
    let width = out.len();
    out.copy_from_slice(&bytes[8 - width..]);
}

/// Reads a big-endian unsigned integer of `bytes.len()` bytes (at most 8).
pub fn read_uint_be(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}

/// Writes `value` into `out` as a little-endian integer of `out.len()` bytes.
pub fn write_uint_le(out: &mut [u8], value: u64) {
    debug_assert!((1..=8).contains(&out.len()));
    let bytes = value.to_le_bytes();
    let width = out.len();
    out.copy_from_slice(&bytes[..width]);
}

/// Reads a little-endian unsigned integer of `bytes.len()` bytes (at most 8).
pub fn read_uint_le(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    bytes.iter().rev().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}

/// Smallest number of bytes (at least 1) that holds `value` unsigned.
pub fn min_unsigned_width(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(8).max(1)
}

/// Smallest number of bytes that holds `value` with its sign bit intact.
///
/// Non-negative values keep one leading zero bit, so `128` needs 2 bytes.
/// Negative values always take the full 8 bytes.
pub fn min_signed_width(value: i64) -> usize {
    if value < 0 {
        return 8;
    }
    let bits = 64 - value.leading_zeros() as usize + 1;
    bits.div_ceil(8)
}

/// Rounds a byte count up to the next power of two (1, 2, 4 or 8).
pub fn pow2_width(width: usize) -> usize {
    width.max(1).next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn be_roundtrip_all_widths() {
        for width in 1..=8 {
            let mut out = vec![0u8; width];
            let value = 0x0102_0304_0506_0708u64 >> (8 * (8 - width));
            write_uint_be(&mut out, value);
            assert_eq!(out[0], 1);
            assert_eq!(read_uint_be(&out), value);
        }
    }

    #[test]
    fn le_layout() {
        let mut out = [0u8; 4];
        write_uint_le(&mut out, 0x0a0b0c0d);
        assert_eq!(out, [0x0d, 0x0c, 0x0b, 0x0a]);
        assert_eq!(read_uint_le(&out), 0x0a0b0c0d);
    }

    #[test]
    fn le_truncates_high_bytes() {
        let mut out = [0u8; 2];
        write_uint_le(&mut out, 0xffee_ddcc);
        assert_eq!(out, [0xcc, 0xdd]);
    }

    #[test]
    fn unsigned_widths() {
        assert_eq!(min_unsigned_width(0), 1);
        assert_eq!(min_unsigned_width(0xff), 1);
        assert_eq!(min_unsigned_width(0x100), 2);
        assert_eq!(min_unsigned_width(0xff_ffff), 3);
        assert_eq!(min_unsigned_width(u64::MAX), 8);
    }

    #[test]
    fn signed_widths() {
        assert_eq!(min_signed_width(0), 1);
        assert_eq!(min_signed_width(127), 1);
        assert_eq!(min_signed_width(128), 2);
        assert_eq!(min_signed_width(32767), 2);
        assert_eq!(min_signed_width(32768), 3);
        assert_eq!(min_signed_width(i64::MAX), 8);
        assert_eq!(min_signed_width(-1), 8);
        assert_eq!(min_signed_width(i64::MIN), 8);
    }

    #[test]
    fn pow2_rounding() {
        assert_eq!(pow2_width(0), 1);
        assert_eq!(pow2_width(1), 1);
        assert_eq!(pow2_width(2), 2);
        assert_eq!(pow2_width(3), 4);
        assert_eq!(pow2_width(5), 8);
        assert_eq!(pow2_width(8), 8);
    }
}
