//! bplist00 wire constants.
//!
//! A document is laid out as header, object table, offset table, trailer.

/// Magic header, including the `00` version.
pub const MAGIC: &[u8; 8] = b"bplist00";

/// Byte length of the magic header.
pub const HEADER_SIZE: usize = 8;

/// Byte length of the trailer.
pub const TRAILER_SIZE: usize = 32;

/// Smallest buffer that can hold a header and a trailer.
pub const MIN_DOCUMENT_SIZE: usize = HEADER_SIZE + TRAILER_SIZE;

/// Low-nibble value announcing that a length follows as an integer object.
pub const EXTENDED_LENGTH: u8 = 0x0f;

/// Single-byte markers with a fixed meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Marker {
    Null = 0x00,
    False = 0x08,
    True = 0x09,
    Fill = 0x0f,
    Date = 0x33,
}

/// High nibble of an object marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ObjectType {
    Simple = 0x0,
    Integer = 0x1,
    Real = 0x2,
    Date = 0x3,
    Data = 0x4,
    AsciiString = 0x5,
    Utf16String = 0x6,
    Uid = 0x8,
    Array = 0xa,
    Dictionary = 0xd,
}

impl ObjectType {
    /// Classifies a marker byte by its high nibble.
    pub fn from_marker(marker: u8) -> Option<Self> {
        Some(match marker >> 4 {
            0x0 => ObjectType::Simple,
            0x1 => ObjectType::Integer,
            0x2 => ObjectType::Real,
            0x3 => ObjectType::Date,
            0x4 => ObjectType::Data,
            0x5 => ObjectType::AsciiString,
            0x6 => ObjectType::Utf16String,
            0x8 => ObjectType::Uid,
            0xa => ObjectType::Array,
            0xd => ObjectType::Dictionary,
            _ => return None,
        })
    }

    /// Builds a marker byte from this type and a low nibble.
    #[inline]
    pub fn marker(self, low: u8) -> u8 {
        ((self as u8) << 4) | (low & 0x0f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_composition() {
        assert_eq!(ObjectType::Integer.marker(3), 0x13);
        assert_eq!(ObjectType::AsciiString.marker(EXTENDED_LENGTH), 0x5f);
        assert_eq!(ObjectType::Date.marker(3), Marker::Date as u8);
    }

    #[test]
    fn classify_markers() {
        assert_eq!(ObjectType::from_marker(0x09), Some(ObjectType::Simple));
        assert_eq!(ObjectType::from_marker(0xa2), Some(ObjectType::Array));
        assert_eq!(ObjectType::from_marker(0xd0), Some(ObjectType::Dictionary));
        assert_eq!(ObjectType::from_marker(0x70), None);
        assert_eq!(ObjectType::from_marker(0xf0), None);
    }
}
