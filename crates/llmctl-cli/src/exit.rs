use llmctl_gguf::GgufError;

// Exit codes so scripts can tell a foreign file from a damaged one
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_GENERIC_FAIL: i32 = 1;
pub const EXIT_NOT_GGUF: i32 = 2;
pub const EXIT_CORRUPT: i32 = 3;

/// Pick an exit code from the decode error buried in `err`, if any.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<GgufError>().map(GgufError::root) {
        Some(GgufError::BadMagic(_) | GgufError::UnsupportedVersion(_)) => EXIT_NOT_GGUF,
        Some(GgufError::Io(_)) | None => EXIT_GENERIC_FAIL,
        Some(_) => EXIT_CORRUPT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn classifies_wrapped_decode_errors() {
        let not_gguf: anyhow::Result<()> =
            Err(GgufError::BadMagic(0)).context("Parse GGUF error: x.bin");
        assert_eq!(exit_code_for(&not_gguf.unwrap_err()), EXIT_NOT_GGUF);

        let corrupt = anyhow::Error::new(
            GgufError::TruncatedInput { field: "u32" }.context("metadata_kv[0]"),
        );
        assert_eq!(exit_code_for(&corrupt), EXIT_CORRUPT);

        assert_eq!(exit_code_for(&anyhow::anyhow!("other")), EXIT_GENERIC_FAIL);
    }
}
