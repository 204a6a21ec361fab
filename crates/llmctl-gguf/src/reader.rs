//! Fixed-width little-endian scalars and length-prefixed strings.

use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::io::Read;

use crate::MAX_LENGTH;
use crate::error::{GgufError, Result};

/// Initial buffer reservation for string payloads; the rest grows as bytes arrive.
const STRING_PREALLOC: u64 = 64 * 1024;

/// Sequential cursor over a GGUF byte stream.
///
/// Counts consumed bytes so callers can report positions. There is no
/// seeking: every field is read exactly once, front to back.
#[derive(Debug)]
pub struct GgufReader<R> {
    inner: R,
    position: u64,
}

macro_rules! read_le {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(&mut self) -> Result<$ty> {
                Ok(<$ty>::from_le_bytes(self.read_exact_array(stringify!($ty))?))
            }
        )*
    };
}

impl<R: Read> GgufReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_exact_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf).map_err(|e| GgufError::from_read(e, field))?;
        self.position += N as u64;
        Ok(buf)
    }

    read_le! {
        read_u8 => u8,
        read_i8 => i8,
        read_u16 => u16,
        read_i16 => i16,
        read_u32 => u32,
        read_i32 => i32,
        read_u64 => u64,
        read_i64 => i64,
        read_f32 => f32,
        read_f64 => f64,
    }

    /// One byte, strictly 0 or 1.
    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_exact_array::<1>("bool")?[0] {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(GgufError::invalid(format!("invalid bool value: {b}"))),
        }
    }

    /// `u64` length followed by that many raw bytes.
    ///
    /// The length is checked against [`MAX_LENGTH`] before anything is
    /// allocated, and the payload is pulled through `take` so a truncated
    /// stream never forces a buffer of the full declared size.
    pub fn read_string(&mut self) -> Result<GgufString> {
        let len = self.read_u64()?;
        if len > MAX_LENGTH {
            return Err(GgufError::invalid(format!("string length too large: {len}")));
        }

        let mut bytes = Vec::with_capacity(len.min(STRING_PREALLOC) as usize);
        let n = self
            .inner
            .by_ref()
            .take(len)
            .read_to_end(&mut bytes)
            .map_err(|e| GgufError::from_read(e, "string data"))?;
        self.position += n as u64;
        if (n as u64) < len {
            return Err(GgufError::TruncatedInput { field: "string data" });
        }
        Ok(GgufString::from_bytes(bytes))
    }
}

/// A GGUF string: raw bytes as stored on disk.
///
/// The format promises neither NUL termination nor valid UTF-8 (tokenizer
/// pieces in particular may be arbitrary bytes), so text conversion happens
/// on access rather than at decode time.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GgufString {
    bytes: Vec<u8>,
}

impl GgufString {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Length in bytes, as declared in the stream.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Strict text view; fails with `InvalidEncoding` on non-UTF-8 bytes.
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.bytes)
            .map_err(|e| GgufError::invalid(format!("string is not valid UTF-8: {e}")))
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

impl fmt::Debug for GgufString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_string_lossy())
    }
}

impl fmt::Display for GgufString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl From<&str> for GgufString {
    fn from(s: &str) -> Self {
        Self { bytes: s.as_bytes().to_vec() }
    }
}

impl From<String> for GgufString {
    fn from(s: String) -> Self {
        Self { bytes: s.into_bytes() }
    }
}

impl PartialEq<str> for GgufString {
    fn eq(&self, other: &str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl PartialEq<&str> for GgufString {
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl Serialize for GgufString {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}
