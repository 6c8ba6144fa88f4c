//! The fixed 32-byte document trailer.
//!
//! ```text
//! [0..5)   unused, zero
//! [5]      sort version, zero
//! [6]      offset table entry width
//! [7]      object reference width
//! [8..16)  object count          (u64 BE)
//! [16..24) top object reference  (u64 BE, always 0 here)
//! [24..32) offset table position (u64 BE)
//! ```

use bplist_buffers::{Reader, Writer};

use crate::constants::TRAILER_SIZE;
use crate::error::{BplistError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Trailer {
    /// Byte width of each offset table entry.
    pub offset_size: u8,
    /// Byte width of each object reference inside containers.
    pub ref_size: u8,
    pub num_objects: u64,
    /// Reference of the root object as recorded in the document.
    pub top_object: u64,
    /// Absolute position of the offset table.
    pub offset_table_offset: u64,
}

impl Trailer {
    /// Parses the last [`TRAILER_SIZE`] bytes of `data`.
    pub fn read(data: &[u8]) -> Result<Self> {
        let start = data
            .len()
            .checked_sub(TRAILER_SIZE)
            .ok_or(BplistError::OutOfBounds {
                offset: 0,
                len: TRAILER_SIZE,
            })?;
        let mut reader = Reader::at(data, start + 6);
        let offset_size = reader.u8()?;
        let ref_size = reader.u8()?;
        let num_objects = reader.uint_be(8)?;
        let top_object = reader.uint_be(8)?;
        let offset_table_offset = reader.uint_be(8)?;
        Ok(Self {
            offset_size,
            ref_size,
            num_objects,
            top_object,
            offset_table_offset,
        })
    }

    /// Appends the 32 trailer bytes.
    pub fn write(&self, writer: &mut Writer) {
        writer.buf(&[0u8; 6]);
        writer.u8(self.offset_size);
        writer.u8(self.ref_size);
        writer.u64(self.num_objects);
        writer.u64(self.top_object);
        writer.u64(self.offset_table_offset);
    }
}
