//! Property-based round-trip tests for the codec.

use bplist::{count_objects, decode, encode, BplistEncoder, BplistError, Date, Value};
use proptest::prelude::*;

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        // NaN != NaN
        any::<f64>()
            .prop_filter("not NaN", |f| !f.is_nan())
            .prop_map(Value::Real),
        any::<f64>()
            .prop_filter("not NaN", |f| !f.is_nan())
            .prop_map(|f| Value::Date(Date(f))),
        prop::collection::vec(any::<u8>(), 0..40).prop_map(Value::Data),
        "[ -~]{0,20}".prop_map(Value::String),
    ];

    leaf.prop_recursive(4, 64, 10, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..10).prop_map(Value::Array),
            prop::collection::vec(("[a-z$]{0,8}", inner), 0..10)
                .prop_map(|pairs| pairs.into_iter().collect::<Value>()),
        ]
    })
}

proptest! {
    #[test]
    fn decode_inverts_encode(value in arb_value()) {
        let doc = encode(&value);
        prop_assert_eq!(decode(&doc), Ok(value));
    }

    #[test]
    fn trailer_describes_document(value in arb_value()) {
        let doc = encode(&value);
        prop_assert_eq!(&doc[..8], b"bplist00");
        let n = doc.len();
        let count = u64::from_be_bytes(doc[n - 24..n - 16].try_into().unwrap());
        prop_assert_eq!(count as usize, count_objects(&value));
        let table = u64::from_be_bytes(doc[n - 8..].try_into().unwrap()) as usize;
        prop_assert_eq!(table + count as usize * usize::from(doc[n - 26]), n - 32);
    }

    #[test]
    fn encoder_reuse_is_stable(a in arb_value(), b in arb_value()) {
        let mut encoder = BplistEncoder::with_alloc_size(16);
        let first = encoder.encode(&a);
        let _ = encoder.encode(&b);
        prop_assert_eq!(encoder.encode(&a), first);
    }

    #[test]
    fn truncated_documents_fail(value in arb_value()) {
        let doc = encode(&value);
        for len in 0..doc.len() {
            let result = decode(&doc[..len]);
            prop_assert!(
                matches!(
                    result,
                    Err(BplistError::OutOfBounds { .. }) | Err(BplistError::UnknownTag { .. })
                ),
                "truncated to {}: {:?}",
                len,
                result
            );
        }
    }
}
