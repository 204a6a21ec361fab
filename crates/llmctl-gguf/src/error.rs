use std::io;
use thiserror::Error;

use crate::{GGUF_MAGIC, GGUF_VERSION, MAX_DIMENSIONS};

/// Errors returned while decoding or encoding a GGUF document.
///
/// Every failure is terminal: the decoder never skips a field or recovers,
/// because a single misread desynchronizes every read that follows. As an
/// error unwinds it is wrapped in [`GgufError::Context`] layers naming the
/// stage and index it passed through; [`GgufError::root`] recovers the kind.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GgufError {
    #[error("truncated input while reading {field}")]
    TruncatedInput { field: &'static str },
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
    #[error("not a GGUF file, magic=0x{0:08X} (expected 0x{expected:08X})", expected = GGUF_MAGIC)]
    BadMagic(u32),
    #[error("unsupported GGUF version: {0} (expected {expected})", expected = GGUF_VERSION)]
    UnsupportedVersion(u32),
    #[error("unknown metadata value type: {0}")]
    UnknownTag(u32),
    #[error("n_dimensions too large: {0} (max {max})", max = MAX_DIMENSIONS)]
    TooManyDimensions(u32),
    #[error("array nesting exceeds {0} levels")]
    NestingTooDeep(usize),
    #[error(transparent)]
    Io(io::Error),
    #[error("{context}: {inner}")]
    Context { context: String, inner: Box<GgufError> },
}

pub type Result<T> = std::result::Result<T, GgufError>;

impl GgufError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidEncoding(msg.into())
    }

    /// Map a reader failure for `field`; EOF means the stream was truncated.
    pub(crate) fn from_read(err: io::Error, field: &'static str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::TruncatedInput { field }
        } else {
            Self::Io(err)
        }
    }

    /// Wrap this error in one more position label.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context { context: context.into(), inner: Box::new(self) }
    }

    /// The innermost error, i.e. the one that carries the failure kind.
    pub fn root(&self) -> &GgufError {
        let mut err = self;
        while let Self::Context { inner, .. } = err {
            err = inner;
        }
        err
    }

    /// Position labels from the outermost stage inwards.
    pub fn contexts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut err = self;
        while let Self::Context { context, inner } = err {
            out.push(context.as_str());
            err = inner;
        }
        out
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self.root(), Self::TruncatedInput { .. })
    }
}

impl From<io::Error> for GgufError {
    fn from(err: io::Error) -> Self {
        Self::from_read(err, "input")
    }
}

/// `?`-friendly position labelling for decoder results.
pub trait ResultExt<T> {
    fn context(self, context: &'static str) -> Result<T>;
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    #[inline]
    fn context(self, context: &'static str) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    #[inline]
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| e.context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_and_contexts_walk_the_chain() {
        let err = GgufError::UnknownTag(42).context("parse value").context("metadata_kv[3]");
        assert!(matches!(err.root(), GgufError::UnknownTag(42)));
        assert_eq!(err.contexts(), vec!["metadata_kv[3]", "parse value"]);
        assert_eq!(
            err.to_string(),
            "metadata_kv[3]: parse value: unknown metadata value type: 42"
        );
    }

    #[test]
    fn unexpected_eof_becomes_truncated_input() {
        let err = GgufError::from_read(io::ErrorKind::UnexpectedEof.into(), "u32");
        assert!(err.is_truncated());
        assert_eq!(err.to_string(), "truncated input while reading u32");
    }

    #[test]
    fn other_io_errors_stay_io() {
        let err = GgufError::from(io::Error::other("disk on fire"));
        assert!(matches!(err, GgufError::Io(_)));
        assert!(!err.is_truncated());
    }

    #[test]
    fn bare_error_has_no_contexts() {
        let err = GgufError::BadMagic(0x4C4C_4D46);
        assert!(err.contexts().is_empty());
        assert!(std::ptr::eq(err.root(), &err));
    }
}
