#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    key: Vec<u8>,
    value_bytes: Vec<u8>,
    value_tag: u8,
}

fuzz_target!(|input: FuzzInput| {
    // Limit input size to prevent OOM
    if input.key.len() > 256 || input.value_bytes.len() > 4096 {
        return;
    }

    // Build a GGUF byte stream with one arbitrary metadata entry
    let mut buf = Vec::new();
    buf.extend_from_slice(b"GGUF");
    buf.extend_from_slice(&3u32.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&1u64.to_le_bytes());
    buf.extend_from_slice(&(input.key.len() as u64).to_le_bytes());
    buf.extend_from_slice(&input.key);
    // Tags past 12 exercise the unknown-tag path.
    buf.extend_from_slice(&u32::from(input.value_tag % 16).to_le_bytes());
    buf.extend_from_slice(&input.value_bytes);

    match llmctl_gguf::decode_slice(&buf) {
        Ok(file) => {
            assert_eq!(file.metadata.len(), 1);
            assert_eq!(file.metadata[0].key.as_bytes(), &input.key[..]);
        }
        Err(e) => {
            assert!(!e.contexts().is_empty(), "entry errors carry a position: {e}");
        }
    }
});
