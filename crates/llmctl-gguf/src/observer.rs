//! Hooks for watching a decode as it progresses.

use tracing::debug;

use crate::file::{GgufHeader, GgufMetadataKv};
use crate::tensor::TensorInfo;

/// Receives each decoded piece in stream order. All methods default to no-ops.
///
/// The decoder never logs on its own; attach an observer to see progress.
pub trait DecodeObserver {
    fn on_header(&mut self, _header: &GgufHeader) {}
    fn on_metadata(&mut self, _index: u64, _kv: &GgufMetadataKv) {}
    fn on_tensor(&mut self, _index: u64, _info: &TensorInfo) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DecodeObserver for NoopObserver {}

/// Emits `tracing` debug events for the header and every entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DecodeObserver for TracingObserver {
    fn on_header(&mut self, header: &GgufHeader) {
        debug!(
            magic = %String::from_utf8_lossy(&header.magic.to_le_bytes()),
            version = header.version,
            metadata_count = header.metadata_kv_count,
            tensor_count = header.tensor_count,
            "GGUF header"
        );
    }

    fn on_metadata(&mut self, index: u64, kv: &GgufMetadataKv) {
        debug!(index, key = %kv.key, value_type = %kv.value_type(), "metadata entry");
    }

    fn on_tensor(&mut self, index: u64, info: &TensorInfo) {
        debug!(index, name = %info.name, dims = ?info.dims, dtype = %info.dtype_name(), "tensor info");
    }
}
