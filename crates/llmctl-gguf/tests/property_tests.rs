//! Property tests for the GGUF decoder and encoder.
//!
//! Uses proptest to check the round-trip law over every value kind and
//! nested arrays, header rejection, and error positions under truncation.

use llmctl_gguf::{
    GGUF_MAGIC, GgufArray, GgufError, GgufFile, GgufHeader, GgufMetadataKv, GgufReader,
    GgufValue, GgufValueType, TensorInfo, decode_slice,
};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_key() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(\\.[a-z_]{1,8}){0,2}"
}

fn types_up_to(depth: u32) -> Vec<GgufValueType> {
    GgufValueType::ALL.into_iter().filter(|t| depth > 0 || *t != GgufValueType::Array).collect()
}

/// A value of exactly `ty`; arrays nest at most `depth` more levels.
fn arb_value_of(ty: GgufValueType, depth: u32) -> BoxedStrategy<GgufValue> {
    match ty {
        GgufValueType::Uint8 => any::<u8>().prop_map(GgufValue::Uint8).boxed(),
        GgufValueType::Int8 => any::<i8>().prop_map(GgufValue::Int8).boxed(),
        GgufValueType::Uint16 => any::<u16>().prop_map(GgufValue::Uint16).boxed(),
        GgufValueType::Int16 => any::<i16>().prop_map(GgufValue::Int16).boxed(),
        GgufValueType::Uint32 => any::<u32>().prop_map(GgufValue::Uint32).boxed(),
        GgufValueType::Int32 => any::<i32>().prop_map(GgufValue::Int32).boxed(),
        GgufValueType::Float32 => (-1.0e6f32..1.0e6).prop_map(GgufValue::Float32).boxed(),
        GgufValueType::Bool => any::<bool>().prop_map(GgufValue::Bool).boxed(),
        GgufValueType::String => {
            prop::collection::vec(any::<u8>(), 0..24)
                .prop_map(|b| GgufValue::String(llmctl_gguf::GgufString::from_bytes(b)))
                .boxed()
        }
        GgufValueType::Uint64 => any::<u64>().prop_map(GgufValue::Uint64).boxed(),
        GgufValueType::Int64 => any::<i64>().prop_map(GgufValue::Int64).boxed(),
        GgufValueType::Float64 => (-1.0e12f64..1.0e12).prop_map(GgufValue::Float64).boxed(),
        GgufValueType::Array => {
            let inner = depth.saturating_sub(1);
            prop::sample::select(types_up_to(inner))
                .prop_flat_map(move |elem| {
                    prop::collection::vec(arb_value_of(elem, inner), 0..5)
                        .prop_map(move |els| GgufValue::Array(GgufArray::new(elem, els)))
                })
                .boxed()
        }
    }
}

fn arb_value(depth: u32) -> impl Strategy<Value = GgufValue> {
    prop::sample::select(types_up_to(depth)).prop_flat_map(move |ty| arb_value_of(ty, depth))
}

fn arb_tensor() -> impl Strategy<Value = TensorInfo> {
    ("[a-z.0-9_]{1,24}", prop::collection::vec(1u64..100_000, 0..=4), any::<u32>(), any::<u64>())
        .prop_map(|(name, dims, dtype, offset)| TensorInfo {
            name: name.into(),
            dims,
            dtype,
            offset,
        })
}

fn arb_file() -> impl Strategy<Value = GgufFile> {
    (
        prop::collection::vec((arb_key(), arb_value(3)), 0..6),
        prop::collection::vec(arb_tensor(), 0..4),
    )
        .prop_map(|(kvs, tensors)| GgufFile {
            header: GgufHeader {
                magic: GGUF_MAGIC,
                version: 3,
                tensor_count: tensors.len() as u64,
                metadata_kv_count: kvs.len() as u64,
            },
            metadata: kvs.into_iter().map(|(k, v)| GgufMetadataKv::new(k, v)).collect(),
            tensors,
        })
}

fn header_bytes(version: u32, n_tensors: u64, n_kv: u64) -> Vec<u8> {
    let mut d = GGUF_MAGIC.to_le_bytes().to_vec();
    d.extend_from_slice(&version.to_le_bytes());
    d.extend_from_slice(&n_tensors.to_le_bytes());
    d.extend_from_slice(&n_kv.to_le_bytes());
    d
}

// ---------------------------------------------------------------------------
// Round-trip law
// ---------------------------------------------------------------------------

proptest! {
    /// Encoding then decoding returns the same document, and re-encoding the
    /// decoded document reproduces the bytes exactly.
    #[test]
    fn prop_encode_decode_round_trip(file in arb_file()) {
        let bytes = file.to_bytes().expect("generated documents are encodable");
        let back = decode_slice(&bytes).expect("encoded documents decode");
        prop_assert_eq!(&back, &file);
        prop_assert_eq!(back.to_bytes().unwrap(), bytes);
    }

    /// Every one of the 13 kinds round-trips as a single metadata entry.
    #[test]
    fn prop_each_kind_round_trips(case in prop::sample::select(GgufValueType::ALL.to_vec())
        .prop_flat_map(|ty| arb_value_of(ty, 2).prop_map(move |v| (ty, v)))
    ) {
        let (ty, value) = case;
        prop_assert_eq!(value.value_type(), ty);
        let file = GgufFile {
            header: GgufHeader { magic: GGUF_MAGIC, version: 3, tensor_count: 0, metadata_kv_count: 1 },
            metadata: vec![GgufMetadataKv::new("k", value)],
            tensors: vec![],
        };
        let bytes = file.to_bytes().unwrap();
        prop_assert_eq!(decode_slice(&bytes).unwrap().to_bytes().unwrap(), bytes);
    }
}

#[test]
fn depth_three_array_round_trips() {
    let leaf = |xs: &[u64]| -> GgufValue {
        GgufArray::new(GgufValueType::Uint64, xs.iter().map(|&x| x.into()).collect()).into()
    };
    let mid = GgufValue::from(GgufArray::new(GgufValueType::Array, vec![leaf(&[1, 2]), leaf(&[])]));
    let top = GgufArray::new(GgufValueType::Array, vec![mid.clone(), mid]);
    let file = GgufFile {
        header: GgufHeader { magic: GGUF_MAGIC, version: 3, tensor_count: 0, metadata_kv_count: 1 },
        metadata: vec![GgufMetadataKv::new("deep", top)],
        tensors: vec![],
    };
    let bytes = file.to_bytes().unwrap();
    let back = decode_slice(&bytes).unwrap();
    assert_eq!(back, file);
    assert_eq!(back.to_bytes().unwrap(), bytes);
}

// ---------------------------------------------------------------------------
// Header rejection
// ---------------------------------------------------------------------------

proptest! {
    /// Any stream whose first u32 is not the magic fails with `BadMagic`
    /// after consuming exactly four bytes.
    #[test]
    fn prop_wrong_magic_reads_four_bytes(
        magic in any::<u32>().prop_filter("not GGUF", |&m| m != GGUF_MAGIC),
        tail in prop::collection::vec(any::<u8>(), 0..64)
    ) {
        let mut data = magic.to_le_bytes().to_vec();
        data.extend(tail);
        let mut r = GgufReader::new(data.as_slice());
        let err = GgufHeader::decode(&mut r).unwrap_err();
        prop_assert!(matches!(err, GgufError::BadMagic(m) if m == magic));
        prop_assert_eq!(r.position(), 4);
    }

    /// Valid magic with any version other than 3 is `UnsupportedVersion`.
    #[test]
    fn prop_other_versions_unsupported(
        version in any::<u32>().prop_filter("not 3", |&v| v != 3),
        n_tensors in any::<u64>(),
        n_kv in any::<u64>(),
    ) {
        let err = decode_slice(&header_bytes(version, n_tensors, n_kv)).unwrap_err();
        prop_assert!(matches!(err, GgufError::UnsupportedVersion(v) if v == version));
    }
}

// ---------------------------------------------------------------------------
// Truncation
// ---------------------------------------------------------------------------

proptest! {
    /// Cutting an n-element array after k < n elements fails with
    /// `TruncatedInput` at element index k.
    #[test]
    fn prop_truncated_array_fails_at_element_k(
        (n, k) in (1u64..32).prop_flat_map(|n| (Just(n), 0..n)),
        cut_into_element in 0usize..4,
    ) {
        let mut data = header_bytes(3, 0, 1);
        data.extend_from_slice(&3u64.to_le_bytes());
        data.extend_from_slice(b"arr");
        data.extend_from_slice(&9u32.to_le_bytes());
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&n.to_le_bytes());
        for i in 0..n {
            data.extend_from_slice(&(i as u32).to_le_bytes());
        }
        let element_start = data.len() - (n as usize) * 4 + (k as usize) * 4;
        data.truncate(element_start + cut_into_element);

        let err = decode_slice(&data).unwrap_err();
        prop_assert!(err.is_truncated());
        let expected = format!("parse array elem[{k}]");
        prop_assert_eq!(err.contexts(), vec!["metadata_kv[0]", "parse value", expected.as_str()]);
    }

    /// Every strict prefix of a valid document fails with `TruncatedInput`.
    #[test]
    fn prop_every_prefix_is_truncated(file in arb_file(), cut in any::<prop::sample::Index>()) {
        let bytes = file.to_bytes().unwrap();
        let at = cut.index(bytes.len());
        let err = decode_slice(&bytes[..at]).unwrap_err();
        prop_assert!(err.is_truncated(), "prefix of {} bytes gave {}", at, err);
    }

    /// Arbitrary bytes after a valid header never panic the decoder.
    #[test]
    fn prop_decode_never_panics(
        n_tensors in 0u64..8,
        n_kv in 0u64..8,
        body in prop::collection::vec(any::<u8>(), 0..512)
    ) {
        let mut data = header_bytes(3, n_tensors, n_kv);
        data.extend(body);
        let _ = decode_slice(&data);
    }
}
