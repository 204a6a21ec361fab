#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Must never panic; returning Err is fine.
    let Ok(file) = llmctl_gguf::decode_slice(data) else {
        return;
    };

    // Whatever decodes must re-encode to exactly the bytes it consumed.
    let bytes = file.to_bytes().expect("decoded documents are encodable");
    assert_eq!(&data[..bytes.len()], &bytes[..], "re-encoding must reproduce the input prefix");
});
