//! GGUF model-metadata container decoder.
//!
//! Decodes the fixed header, the ordered key/value metadata table and the
//! tensor-descriptor index of a GGUF v3 file. Tensor payload bytes are never
//! read. Every metadata value is self-describing: a `u32` tag selects one of
//! thirteen shapes, and arrays recursively carry more tagged values.
//!
//! Decoding is a single forward pass with strict bounds checks at every
//! field; the first failure aborts the whole document and is returned with
//! the stage and index where it happened.
//!
//! # Example
//!
//! ```no_run
//! use llmctl_gguf::{open, GgufValue};
//!
//! let file = open("model.gguf").unwrap();
//! for kv in &file.metadata {
//!     println!("{} => {}", kv.key, kv.value);
//! }
//! if let Some(arch) = file.get("general.architecture").and_then(GgufValue::as_str) {
//!     println!("architecture: {arch}");
//! }
//! ```

pub mod error;
pub mod file;
pub mod observer;
pub mod reader;
pub mod tensor;
pub mod value;
pub mod writer;

pub use error::{GgufError, Result, ResultExt};
pub use file::{GgufFile, GgufHeader, GgufMetadataKv, decode, decode_slice, open, open_with};
pub use observer::{DecodeObserver, NoopObserver, TracingObserver};
pub use reader::{GgufReader, GgufString};
pub use tensor::{GgmlType, TensorInfo};
pub use value::{GgufArray, GgufValue, GgufValueType};
pub use writer::GgufWriter;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// `"GGUF"` read as a little-endian `u32`.
pub const GGUF_MAGIC: u32 = 0x4655_4747;
/// The four-byte magic that every GGUF file starts with.
pub const GGUF_MAGIC_BYTES: [u8; 4] = *b"GGUF";
/// The only version this decoder accepts.
pub const GGUF_VERSION: u32 = 3;
/// Sanity cap on declared string and array lengths.
pub const MAX_LENGTH: u64 = 0x0FFF_FFFF;
/// Upper bound on tensor rank; the format convention is at most 4.
pub const MAX_DIMENSIONS: u32 = 16;
/// Deepest array-in-array nesting accepted before failing closed.
pub const MAX_NESTING_DEPTH: usize = 64;
/// Tensor-data alignment when `general.alignment` is absent.
pub const GGUF_DEFAULT_ALIGNMENT: u64 = 32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_constants_agree() {
        assert_eq!(u32::from_le_bytes(GGUF_MAGIC_BYTES), GGUF_MAGIC);
    }

    proptest::proptest! {
        #[test]
        fn decode_never_panics_on_arbitrary_bytes(
            data in proptest::collection::vec(0u8..=255, 0..256)
        ) {
            let _ = decode_slice(&data);
        }
    }
}
