//! Bounds-checked binary reader with cursor tracking.

use std::str;

use crate::int::read_uint_be;
use crate::BufferError;

/// Returns `data[offset..offset + len]`, failing closed when the range is not
/// fully contained in `data`.
///
/// # Example
///
/// ```
/// use bplist_buffers::{range, BufferError};
///
/// let data = [1u8, 2, 3, 4];
/// assert_eq!(range(&data, 1, 2), Ok(&[2u8, 3][..]));
/// assert_eq!(range(&data, 3, 2), Err(BufferError::OutOfBounds { offset: 3, len: 2 }));
/// ```
pub fn range(data: &[u8], offset: usize, len: usize) -> Result<&[u8], BufferError> {
    match offset.checked_add(len) {
        Some(end) if end <= data.len() => Ok(&data[offset..end]),
        _ => Err(BufferError::OutOfBounds { offset, len }),
    }
}

/// A binary reader over a byte slice.
///
/// Every read is checked against the end of the slice; a failed read leaves
/// the cursor where it was.
///
/// # Example
///
/// ```
/// use bplist_buffers::Reader;
///
/// let data = [0x01, 0x02, 0x03, 0x04];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.u8(), Ok(0x01));
/// assert_eq!(reader.uint_be(2), Ok(0x0203));
/// assert!(reader.uint_be(2).is_err());
/// ```
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given byte slice.
    pub fn new(uint8: &'a [u8]) -> Self {
        Self { uint8, x: 0 }
    }

    /// Creates a reader positioned at `x`.
    pub fn at(uint8: &'a [u8], x: usize) -> Self {
        Self { uint8, x }
    }

    /// Checks that `n` more bytes are available from the current cursor.
    #[inline]
    fn check(&self, n: usize) -> Result<(), BufferError> {
        match self.x.checked_add(n) {
            Some(end) if end <= self.uint8.len() => Ok(()),
            _ => Err(BufferError::OutOfBounds {
                offset: self.x,
                len: n,
            }),
        }
    }

    /// Reads an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        self.check(1)?;
        let val = self.uint8[self.x];
        self.x += 1;
        Ok(val)
    }

    /// Reads a `width`-byte unsigned big-endian integer, `width` in `1..=8`.
    #[inline]
    pub fn uint_be(&mut self, width: usize) -> Result<u64, BufferError> {
        self.check(width)?;
        let val = read_uint_be(&self.uint8[self.x..self.x + width]);
        self.x += width;
        Ok(val)
    }

    /// Reads a signed 64-bit big-endian integer.
    #[inline]
    pub fn i64(&mut self) -> Result<i64, BufferError> {
        Ok(self.uint_be(8)? as i64)
    }

    /// Reads a 32-bit big-endian float.
    #[inline]
    pub fn f32(&mut self) -> Result<f32, BufferError> {
        Ok(f32::from_bits(self.uint_be(4)? as u32))
    }

    /// Reads a 64-bit big-endian float.
    #[inline]
    pub fn f64(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_bits(self.uint_be(8)?))
    }

    /// Reads `size` raw bytes and advances the cursor.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        let bin = range(self.uint8, self.x, size)?;
        self.x += size;
        Ok(bin)
    }

    /// Reads a UTF-8 string of `size` bytes.
    pub fn utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        let start = self.x;
        let bin = range(self.uint8, start, size)?;
        let s = str::from_utf8(bin).map_err(|_| BufferError::InvalidUtf8 { offset: start })?;
        self.x += size;
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Writer;

    #[test]
    fn test_u8() {
        let data = [0x01, 0x02, 0x03];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.u8(), Ok(0x01));
        assert_eq!(reader.u8(), Ok(0x02));
        assert_eq!(reader.u8(), Ok(0x03));
        assert_eq!(reader.x, 3);
    }

    #[test]
    fn test_u8_end_of_buffer() {
        let data: [u8; 0] = [];
        let mut reader = Reader::new(&data);
        assert_eq!(
            reader.u8(),
            Err(BufferError::OutOfBounds { offset: 0, len: 1 })
        );
        // Cursor must not advance on error
        assert_eq!(reader.x, 0);
    }

    #[test]
    fn test_uint_be_partial() {
        let data = [0x01u8, 0x02, 0x03];
        let mut reader = Reader::at(&data, 1);
        assert_eq!(
            reader.uint_be(4),
            Err(BufferError::OutOfBounds { offset: 1, len: 4 })
        );
        assert_eq!(reader.x, 1);
        assert_eq!(reader.uint_be(2), Ok(0x0203));
    }

    #[test]
    fn test_i64_negative() {
        let mut writer = Writer::new();
        writer.u64(-9_999_999_999i64 as u64);
        let data = writer.flush();
        let mut reader = Reader::new(&data);
        assert_eq!(reader.i64(), Ok(-9_999_999_999i64));
    }

    #[test]
    fn test_f32() {
        let data = 1.5f32.to_be_bytes();
        let mut reader = Reader::new(&data);
        assert_eq!(reader.f32(), Ok(1.5f32));
    }

    #[test]
    fn test_f64() {
        let mut writer = Writer::new();
        writer.f64(std::f64::consts::PI);
        let data = writer.flush();
        let mut reader = Reader::new(&data);
        assert_eq!(reader.f64(), Ok(std::f64::consts::PI));
    }

    #[test]
    fn test_f64_end_of_buffer() {
        let data = [0u8; 7];
        let mut reader = Reader::new(&data);
        assert!(reader.f64().is_err());
    }

    #[test]
    fn test_buf() {
        let data = [1u8, 2, 3, 4, 5];
        let mut reader = Reader::new(&data);
        assert_eq!(reader.buf(3), Ok([1u8, 2, 3].as_ref()));
        assert_eq!(reader.x, 3);
        assert!(reader.buf(3).is_err());
        assert_eq!(reader.x, 3);
    }

    #[test]
    fn test_utf8() {
        let data = b"hello world";
        let mut reader = Reader::new(data);
        assert_eq!(reader.utf8(5), Ok("hello"));
        assert_eq!(reader.utf8(6), Ok(" world"));
    }

    #[test]
    fn test_utf8_invalid() {
        let data = [b'a', 0xff, 0xfe];
        let mut reader = Reader::at(&data, 1);
        assert_eq!(reader.utf8(2), Err(BufferError::InvalidUtf8 { offset: 1 }));
        assert_eq!(reader.x, 1);
    }

    #[test]
    fn test_range_overflow_is_out_of_bounds() {
        let data = [0u8; 4];
        assert_eq!(
            range(&data, usize::MAX, 2),
            Err(BufferError::OutOfBounds {
                offset: usize::MAX,
                len: 2
            })
        );
        assert_eq!(range(&data, 4, 0), Ok(&[][..]));
    }
}
