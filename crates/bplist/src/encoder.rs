//! `BplistEncoder`: serializes a value tree into a bplist00 document.
//!
//! The tree is first flattened into an arena in pre-order (root first,
//! container children in declared order, dictionary keys before dictionary
//! values). An object's reference is its arena index, so the root is always
//! reference 0. Blocks are then written in reference order, followed by the
//! offset table and the trailer.

use bplist_buffers::int::{min_signed_width, min_unsigned_width, pow2_width};
use bplist_buffers::Writer;

use crate::constants::{Marker, ObjectType, EXTENDED_LENGTH, MAGIC};
use crate::trailer::Trailer;
use crate::Value;

/// One object of the flattened tree.
#[derive(Clone, Copy)]
enum Node<'a> {
    Value(&'a Value),
    /// Dictionary keys are string objects of their own.
    Key(&'a str),
}

struct Slot<'a> {
    node: Node<'a>,
    children: Vec<u64>,
}

/// Number of objects `root` occupies once encoded, root included.
///
/// Every dictionary key counts as an object.
pub fn count_objects(root: &Value) -> usize {
    let mut count = 0;
    let mut stack = vec![root];
    while let Some(value) = stack.pop() {
        count += 1;
        match value {
            Value::Array(items) => stack.extend(items.iter()),
            Value::Dictionary(dict) => {
                count += dict.len();
                stack.extend(dict.values());
            }
            _ => {}
        }
    }
    count
}

fn flatten(root: &Value) -> Vec<Slot<'_>> {
    let mut slots: Vec<Slot<'_>> = Vec::with_capacity(count_objects(root));
    let mut stack = vec![(Node::Value(root), None::<usize>)];
    while let Some((node, parent)) = stack.pop() {
        let reference = slots.len();
        if let Some(parent) = parent {
            slots[parent].children.push(reference as u64);
        }
        // Pushed in reverse so they pop in declared order.
        match node {
            Node::Value(Value::Array(items)) => {
                for item in items.iter().rev() {
                    stack.push((Node::Value(item), Some(reference)));
                }
            }
            Node::Value(Value::Dictionary(dict)) => {
                for value in dict.values().rev() {
                    stack.push((Node::Value(value), Some(reference)));
                }
                for key in dict.keys().rev() {
                    stack.push((Node::Key(key), Some(reference)));
                }
            }
            _ => {}
        }
        slots.push(Slot {
            node,
            children: Vec::new(),
        });
    }
    slots
}

pub struct BplistEncoder {
    pub writer: Writer,
}

impl Default for BplistEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BplistEncoder {
    pub fn new() -> Self {
        Self {
            writer: Writer::new(),
        }
    }

    /// Creates an encoder whose writer starts with `alloc_size` bytes.
    pub fn with_alloc_size(alloc_size: usize) -> Self {
        Self {
            writer: Writer::with_alloc_size(alloc_size),
        }
    }

    pub fn encode(&mut self, root: &Value) -> Vec<u8> {
        self.writer.reset();
        let slots = flatten(root);
        let ref_size = min_unsigned_width(slots.len() as u64 - 1);

        self.writer.buf(MAGIC);
        let mut offsets = Vec::with_capacity(slots.len());
        for slot in &slots {
            offsets.push(self.writer.position() as u64);
            match slot.node {
                Node::Key(key) => self.write_str(key),
                Node::Value(value) => self.write_object(value, &slot.children, ref_size),
            }
        }

        let offset_table_offset = self.writer.position() as u64;
        let offset_size = min_unsigned_width(offsets.iter().copied().max().unwrap_or(0));
        for offset in &offsets {
            self.writer.uint_be(*offset, offset_size);
        }
        let trailer = Trailer {
            offset_size: offset_size as u8,
            ref_size: ref_size as u8,
            num_objects: slots.len() as u64,
            top_object: 0,
            offset_table_offset,
        };
        trailer.write(&mut self.writer);

        let out = self.writer.flush();
        tracing::debug!(
            objects = slots.len(),
            offset_size,
            ref_size,
            bytes = out.len(),
            "encoded bplist"
        );
        out
    }

    fn write_object(&mut self, value: &Value, children: &[u64], ref_size: usize) {
        match value {
            Value::Bool(b) => self.write_boolean(*b),
            Value::Integer(int) => self.write_integer(*int),
            Value::Real(float) => self.write_real(*float),
            Value::Date(date) => self.writer.u8f64(Marker::Date as u8, date.seconds()),
            Value::Data(bytes) => {
                self.write_header(ObjectType::Data, bytes.len());
                self.writer.buf(bytes);
            }
            Value::String(s) => self.write_str(s),
            Value::Array(items) => {
                self.write_header(ObjectType::Array, items.len());
                self.write_refs(children, ref_size);
            }
            Value::Dictionary(dict) => {
                self.write_header(ObjectType::Dictionary, dict.len());
                self.write_refs(children, ref_size);
            }
        }
    }

    pub fn write_boolean(&mut self, b: bool) {
        let marker = if b { Marker::True } else { Marker::False };
        self.writer.u8(marker as u8);
    }

    /// Writes an integer object in the narrowest power-of-two width that
    /// keeps its sign: 1, 2 or 4 bytes for small non-negative values, 8 bytes
    /// for everything else.
    pub fn write_integer(&mut self, int: i64) {
        let width = pow2_width(min_signed_width(int));
        self.writer
            .u8(ObjectType::Integer.marker(width.trailing_zeros() as u8));
        self.writer.uint_be(int as u64, width);
    }

    pub fn write_real(&mut self, float: f64) {
        self.writer.u8(ObjectType::Real.marker(3));
        self.writer.f64(float);
    }

    /// Writes a string object. The bytes go out verbatim, so only ASCII text
    /// is readable by other bplist implementations.
    pub fn write_str(&mut self, s: &str) {
        self.write_header(ObjectType::AsciiString, s.len());
        self.writer.utf8(s);
    }

    /// Writes a marker with an inline length, or an extended length as a
    /// trailing integer object when it does not fit in the low nibble.
    fn write_header(&mut self, object_type: ObjectType, len: usize) {
        if len < usize::from(EXTENDED_LENGTH) {
            self.writer.u8(object_type.marker(len as u8));
        } else {
            self.writer.u8(object_type.marker(EXTENDED_LENGTH));
            self.write_integer(len as i64);
        }
    }

    fn write_refs(&mut self, refs: &[u64], ref_size: usize) {
        for reference in refs {
            self.writer.uint_be(*reference, ref_size);
        }
    }
}

/// Encodes `value` with a fresh encoder.
pub fn encode(value: &Value) -> Vec<u8> {
    BplistEncoder::with_alloc_size(4 * 1024).encode(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Date, Dictionary};

    fn body(doc: &[u8]) -> &[u8] {
        &doc[8..]
    }

    #[test]
    fn single_bool_document() {
        let doc = encode(&Value::Bool(true));
        let mut expected = b"bplist00".to_vec();
        expected.push(0x09);
        expected.push(0x08);
        expected.extend_from_slice(&[0, 0, 0, 0, 0, 0, 1, 1]);
        expected.extend_from_slice(&1u64.to_be_bytes());
        expected.extend_from_slice(&0u64.to_be_bytes());
        expected.extend_from_slice(&9u64.to_be_bytes());
        assert_eq!(doc, expected);
    }

    #[test]
    fn integer_widths() {
        let cases: [(i64, &[u8]); 6] = [
            (0, &[0x10, 0x00]),
            (127, &[0x10, 0x7f]),
            (128, &[0x11, 0x00, 0x80]),
            (32767, &[0x11, 0x7f, 0xff]),
            (32768, &[0x12, 0x00, 0x00, 0x80, 0x00]),
            (-1, &[0x13, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]),
        ];
        for (int, expected) in cases {
            let doc = encode(&Value::Integer(int));
            assert_eq!(&body(&doc)[..expected.len()], expected, "int {int}");
        }
    }

    #[test]
    fn real_and_date_blocks() {
        let doc = encode(&Value::Real(0.5));
        assert_eq!(body(&doc)[0], 0x23);
        assert_eq!(&body(&doc)[1..9], &0.5f64.to_be_bytes());

        let doc = encode(&Value::Date(Date(-1.25)));
        assert_eq!(body(&doc)[0], 0x33);
        assert_eq!(&body(&doc)[1..9], &(-1.25f64).to_be_bytes());
    }

    #[test]
    fn extended_length_header() {
        let doc = encode(&Value::from("a".repeat(14)));
        assert_eq!(body(&doc)[0], 0x5e);

        let doc = encode(&Value::from("a".repeat(15)));
        assert_eq!(&body(&doc)[..3], &[0x5f, 0x10, 0x0f]);

        let doc = encode(&Value::Data(vec![7; 300]));
        assert_eq!(&body(&doc)[..4], &[0x4f, 0x11, 0x01, 0x2c]);
    }

    #[test]
    fn dictionary_references_keys_then_values() {
        let mut dict = Dictionary::new();
        dict.insert("$name".into(), Value::from("Test"));
        dict.insert("$channel".into(), Value::from(3));
        let doc = encode(&Value::Dictionary(dict));

        // dict, "$name", "$channel", "Test", 3
        assert_eq!(&doc[8..13], &[0xd2, 1, 2, 3, 4]);
        assert_eq!(&doc[13..19], b"\x55$name");
        assert_eq!(&doc[19..28], b"\x58$channel");
        assert_eq!(&doc[28..33], b"\x54Test");
        assert_eq!(&doc[33..35], &[0x10, 0x03]);
        assert_eq!(&doc[35..40], &[8, 13, 19, 28, 33]);
        assert_eq!(doc.len(), 72);
    }

    #[test]
    fn nested_containers_number_in_pre_order() {
        let tree: Value = vec![
            vec![Value::from(1), Value::from(2)].into(),
            Value::from(3),
        ]
        .into();
        let slots = flatten(&tree);
        assert_eq!(slots.len(), 5);
        assert_eq!(slots[0].children, vec![1, 4]);
        assert_eq!(slots[1].children, vec![2, 3]);
        assert!(matches!(slots[4].node, Node::Value(Value::Integer(3))));
    }

    #[test]
    fn count_objects_includes_keys() {
        let mut dict = Dictionary::new();
        dict.insert("a".into(), vec![Value::from(true)].into());
        dict.insert("b".into(), Value::from(1));
        assert_eq!(count_objects(&Value::Dictionary(dict)), 6);
        assert_eq!(count_objects(&Value::Array(vec![])), 1);
    }

    #[test]
    fn reference_width_grows_with_object_count() {
        let tree: Value = (0..300i64).map(Value::Integer).collect();
        let doc = encode(&tree);
        let trailer = Trailer::read(&doc).unwrap();
        assert_eq!(trailer.num_objects, 301);
        assert_eq!(trailer.ref_size, 2);
        assert_eq!(&body(&doc)[..6], &[0xaf, 0x11, 0x01, 0x2c, 0x00, 0x01]);
    }

    #[test]
    fn encoder_is_reusable() {
        let mut encoder = BplistEncoder::new();
        let first = encoder.encode(&Value::from("x"));
        let second = encoder.encode(&Value::from("x"));
        assert_eq!(first, second);
    }
}
