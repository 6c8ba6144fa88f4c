//! `BplistDecoder`: rebuilds a value tree from a bplist00 document.
//!
//! The trailer and offset table are validated up front; objects are then
//! resolved starting at reference 0 with an explicit stack, so deep nesting
//! cannot exhaust the call stack.
//!
//! Every object must be reached exactly once. A reference back into an open
//! container is a [`BplistError::CyclicReference`]; any other repeated
//! reference is a [`BplistError::SharedReference`]. Decoded output therefore
//! never outgrows the object table.

use bplist_buffers::int::read_uint_be;
use bplist_buffers::Reader;

use crate::constants::{
    Marker, ObjectType, EXTENDED_LENGTH, HEADER_SIZE, MAGIC, MIN_DOCUMENT_SIZE, TRAILER_SIZE,
};
use crate::error::{BplistError, Result};
use crate::trailer::Trailer;
use crate::value::{Array, Date, Dictionary, Value, ValueKind};

/// One decoded object block. Containers carry child references only.
enum Object {
    Leaf(Value),
    Array(Vec<u64>),
    Dictionary { keys: Vec<u64>, values: Vec<u64> },
}

enum Container {
    Array(Array),
    Dictionary { keys: Vec<String>, dict: Dictionary },
}

/// Resolution state of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    /// A container whose children are being resolved.
    Open,
    Done,
}

/// Outcome of entering an object.
enum Step {
    Leaf(Value),
    Open(Frame),
}

/// A container whose children are still being resolved.
struct Frame {
    slot: usize,
    refs: Vec<u64>,
    next: usize,
    container: Container,
}

impl Frame {
    fn pending(&self) -> Option<u64> {
        self.refs.get(self.next).copied()
    }

    fn push(&mut self, value: Value) {
        let index = self.next;
        self.next += 1;
        match &mut self.container {
            Container::Array(items) => items.push(value),
            Container::Dictionary { keys, dict } => {
                dict.insert(std::mem::take(&mut keys[index]), value);
            }
        }
    }

    fn finish(self) -> Value {
        match self.container {
            Container::Array(items) => Value::Array(items),
            Container::Dictionary { dict, .. } => Value::Dictionary(dict),
        }
    }
}

/// A validated document: object region plus resolved offset table.
struct Document<'a> {
    /// Header and object table; everything before the offset table.
    objects: &'a [u8],
    offsets: Vec<usize>,
    offset_size: usize,
    ref_size: usize,
}

impl<'a> Document<'a> {
    fn open(data: &'a [u8], trailer: &Trailer) -> Result<Self> {
        let trailer_start = data.len() - TRAILER_SIZE;
        let bad_trailer = BplistError::OutOfBounds {
            offset: trailer_start,
            len: TRAILER_SIZE,
        };
        let offset_size = usize::from(trailer.offset_size);
        let ref_size = usize::from(trailer.ref_size);
        if !(1..=8).contains(&offset_size)
            || !(1..=8).contains(&ref_size)
            || trailer.num_objects == 0
        {
            return Err(bad_trailer);
        }
        let count = usize::try_from(trailer.num_objects).map_err(|_| bad_trailer.clone())?;
        let table_start =
            usize::try_from(trailer.offset_table_offset).map_err(|_| bad_trailer.clone())?;
        let table_len = count.checked_mul(offset_size).ok_or(bad_trailer)?;
        // The offset table sits between the object table and the trailer.
        if table_start < HEADER_SIZE || table_start.checked_add(table_len) != Some(trailer_start) {
            return Err(BplistError::OutOfBounds {
                offset: table_start,
                len: table_len,
            });
        }

        let mut reader = Reader::at(data, table_start);
        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = reader.uint_be(offset_size)?;
            match usize::try_from(offset) {
                Ok(offset) if (HEADER_SIZE..table_start).contains(&offset) => offsets.push(offset),
                _ => {
                    return Err(BplistError::OutOfBounds {
                        offset: usize::try_from(offset).unwrap_or(usize::MAX),
                        len: 1,
                    })
                }
            }
        }

        Ok(Self {
            objects: &data[..table_start],
            offsets,
            offset_size,
            ref_size,
        })
    }

    /// Maps an object reference to its offset table index.
    fn slot(&self, reference: u64) -> Result<usize> {
        match usize::try_from(reference) {
            Ok(slot) if slot < self.offsets.len() => Ok(slot),
            _ => {
                let table_start = self.objects.len() as u64;
                let entry =
                    table_start.saturating_add(reference.saturating_mul(self.offset_size as u64));
                Err(BplistError::OutOfBounds {
                    offset: usize::try_from(entry).unwrap_or(usize::MAX),
                    len: self.offset_size,
                })
            }
        }
    }

    fn parse(&self, slot: usize) -> Result<Object> {
        let offset = self.offsets[slot];
        let mut reader = Reader::at(self.objects, offset);
        let marker = reader.u8()?;
        let low = marker & 0x0f;
        let unknown = BplistError::UnknownTag { marker, offset };
        let object_type = ObjectType::from_marker(marker).ok_or_else(|| unknown.clone())?;
        let object = match object_type {
            ObjectType::Simple => match marker {
                m if m == Marker::False as u8 => Object::Leaf(Value::Bool(false)),
                m if m == Marker::True as u8 => Object::Leaf(Value::Bool(true)),
                // Valid bplist, but no value kind maps to them.
                m if m == Marker::Null as u8 || m == Marker::Fill as u8 => return Err(unknown),
                _ => return Err(unknown),
            },
            ObjectType::Integer => {
                Object::Leaf(Value::Integer(read_int(&mut reader, marker, offset)?))
            }
            ObjectType::Real => match low {
                2 => Object::Leaf(Value::Real(f64::from(reader.f32()?))),
                3 => Object::Leaf(Value::Real(reader.f64()?)),
                _ => return Err(unknown),
            },
            ObjectType::Date if marker == Marker::Date as u8 => {
                Object::Leaf(Value::Date(Date(reader.f64()?)))
            }
            ObjectType::Data => {
                let len = read_length(&mut reader, low)?;
                Object::Leaf(Value::Data(reader.buf(len)?.to_vec()))
            }
            ObjectType::AsciiString => {
                let len = read_length(&mut reader, low)?;
                Object::Leaf(Value::String(reader.utf8(len)?.to_owned()))
            }
            ObjectType::Array => {
                let len = read_length(&mut reader, low)?;
                Object::Array(self.read_refs(&mut reader, len)?)
            }
            ObjectType::Dictionary => {
                let len = read_length(&mut reader, low)?;
                let keys = self.read_refs(&mut reader, len)?;
                let values = self.read_refs(&mut reader, len)?;
                Object::Dictionary { keys, values }
            }
            // UTF-16 strings and UIDs are not part of the value model.
            ObjectType::Date | ObjectType::Utf16String | ObjectType::Uid => return Err(unknown),
        };
        Ok(object)
    }

    fn read_refs(&self, reader: &mut Reader<'_>, len: usize) -> Result<Vec<u64>> {
        let size = len
            .checked_mul(self.ref_size)
            .ok_or(BplistError::OutOfBounds {
                offset: reader.x,
                len: usize::MAX,
            })?;
        let bytes = reader.buf(size)?;
        Ok(bytes.chunks_exact(self.ref_size).map(read_uint_be).collect())
    }

    /// Marks `reference` as entered. Every object belongs to exactly one
    /// parent, so reaching it a second time is an error.
    fn visit(&self, reference: u64, state: &mut [Visit]) -> Result<usize> {
        let slot = self.slot(reference)?;
        match state[slot] {
            Visit::New => Ok(slot),
            Visit::Open => Err(BplistError::CyclicReference(reference)),
            Visit::Done => Err(BplistError::SharedReference(reference)),
        }
    }

    /// Resolves a dictionary key, which must be a string object.
    fn key(&self, reference: u64, state: &mut [Visit]) -> Result<String> {
        let slot = self.visit(reference, state)?;
        state[slot] = Visit::Done;
        let found = match self.parse(slot)? {
            Object::Leaf(Value::String(key)) => return Ok(key),
            Object::Leaf(other) => other.kind(),
            Object::Array(_) => ValueKind::Array,
            Object::Dictionary { .. } => ValueKind::Dictionary,
        };
        Err(BplistError::TypeMismatch {
            expected: ValueKind::String,
            found,
        })
    }

    /// Opens `reference`: leaves come back finished, containers as a frame
    /// whose children are still pending.
    fn enter(&self, reference: u64, state: &mut [Visit]) -> Result<Step> {
        let slot = self.visit(reference, state)?;
        let (refs, container) = match self.parse(slot)? {
            Object::Leaf(value) => {
                state[slot] = Visit::Done;
                return Ok(Step::Leaf(value));
            }
            Object::Array(refs) => {
                let items = Array::with_capacity(refs.len());
                (refs, Container::Array(items))
            }
            Object::Dictionary { keys, values } => {
                state[slot] = Visit::Open;
                let keys = keys
                    .into_iter()
                    .map(|key| self.key(key, state))
                    .collect::<Result<Vec<_>>>()?;
                let dict = Dictionary::with_capacity(keys.len());
                (values, Container::Dictionary { keys, dict })
            }
        };
        let kind = match container {
            Container::Array(_) => ValueKind::Array,
            Container::Dictionary { .. } => ValueKind::Dictionary,
        };
        tracing::trace!(reference, %kind, children = refs.len(), "open container");
        state[slot] = Visit::Open;
        Ok(Step::Open(Frame {
            slot,
            refs,
            next: 0,
            container,
        }))
    }

    fn resolve(&self, root: u64) -> Result<Value> {
        let mut state = vec![Visit::New; self.offsets.len()];
        let mut current = match self.enter(root, &mut state)? {
            Step::Leaf(value) => return Ok(value),
            Step::Open(frame) => frame,
        };
        let mut parents: Vec<Frame> = Vec::new();
        loop {
            match current.pending() {
                Some(child) => match self.enter(child, &mut state)? {
                    Step::Leaf(value) => current.push(value),
                    Step::Open(frame) => parents.push(std::mem::replace(&mut current, frame)),
                },
                None => {
                    state[current.slot] = Visit::Done;
                    match parents.pop() {
                        Some(parent) => {
                            let done = std::mem::replace(&mut current, parent);
                            current.push(done.finish());
                        }
                        None => return Ok(current.finish()),
                    }
                }
            }
        }
    }
}

/// Reads the payload of an integer object whose marker was just consumed.
///
/// 1, 2 and 4 byte integers are unsigned; 8 byte integers are two's
/// complement.
fn read_int(reader: &mut Reader<'_>, marker: u8, offset: usize) -> Result<i64> {
    match marker & 0x0f {
        n @ 0..=2 => Ok(reader.uint_be(1 << n)? as i64),
        3 => Ok(reader.i64()?),
        _ => Err(BplistError::UnknownTag { marker, offset }),
    }
}

/// Reads an object length: the low nibble, or a trailing integer object.
fn read_length(reader: &mut Reader<'_>, low: u8) -> Result<usize> {
    if low != EXTENDED_LENGTH {
        return Ok(usize::from(low));
    }
    let offset = reader.x;
    let marker = reader.u8()?;
    if ObjectType::from_marker(marker) != Some(ObjectType::Integer) {
        return Err(BplistError::UnknownTag { marker, offset });
    }
    // A negative length wraps to a huge count and fails the bounds check.
    let len = read_int(reader, marker, offset)? as u64;
    Ok(usize::try_from(len).unwrap_or(usize::MAX))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BplistDecoder;

impl BplistDecoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, data: &[u8]) -> Result<Value> {
        let head = &data[..data.len().min(HEADER_SIZE)];
        if !MAGIC.starts_with(head) {
            return Err(BplistError::BadMagic);
        }
        if data.len() < MIN_DOCUMENT_SIZE {
            return Err(BplistError::OutOfBounds {
                offset: 0,
                len: MIN_DOCUMENT_SIZE,
            });
        }
        let trailer = Trailer::read(data)?;
        let document = Document::open(data, &trailer)?;
        if trailer.top_object != 0 {
            tracing::warn!(
                top_object = trailer.top_object,
                "trailer names a non-zero root; decoding from reference 0"
            );
        }
        let root = document.resolve(0)?;
        tracing::debug!(
            objects = trailer.num_objects,
            offset_size = trailer.offset_size,
            ref_size = trailer.ref_size,
            bytes = data.len(),
            "decoded bplist"
        );
        Ok(root)
    }
}

/// Decodes `data` with a fresh decoder.
pub fn decode(data: &[u8]) -> Result<Value> {
    BplistDecoder::new().decode(data)
}
