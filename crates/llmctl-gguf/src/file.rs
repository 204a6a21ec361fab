//! Whole-document decoding: header, metadata table, tensor index.

use serde::Serialize;
use std::io::Read;
use std::path::Path;

use crate::error::{GgufError, Result, ResultExt};
use crate::observer::{DecodeObserver, NoopObserver};
use crate::reader::{GgufReader, GgufString};
use crate::tensor::TensorInfo;
use crate::value::{GgufValue, GgufValueType};
use crate::{GGUF_DEFAULT_ALIGNMENT, GGUF_MAGIC, GGUF_VERSION};

/// Entries reserved up front per table; declared counts are not trusted for allocation.
const TABLE_PREALLOC: u64 = 1024;

/// Fixed header fields, in stream order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GgufHeader {
    pub magic: u32,
    pub version: u32,
    pub tensor_count: u64,
    pub metadata_kv_count: u64,
}

impl GgufHeader {
    /// Read and validate magic and version, then the two counts.
    pub fn decode<R: Read>(r: &mut GgufReader<R>) -> Result<Self> {
        let magic = r.read_u32().context("read magic")?;
        if magic != GGUF_MAGIC {
            return Err(GgufError::BadMagic(magic));
        }
        let version = r.read_u32().context("read version")?;
        if version != GGUF_VERSION {
            return Err(GgufError::UnsupportedVersion(version));
        }
        let tensor_count = r.read_u64().context("read tensor_count")?;
        let metadata_kv_count = r.read_u64().context("read metadata_kv_count")?;
        Ok(Self { magic, version, tensor_count, metadata_kv_count })
    }
}

/// A single key-value metadata entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GgufMetadataKv {
    pub key: GgufString,
    pub value: GgufValue,
}

impl GgufMetadataKv {
    pub fn new(key: impl Into<GgufString>, value: impl Into<GgufValue>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    pub fn decode<R: Read>(r: &mut GgufReader<R>) -> Result<Self> {
        let key = r.read_string().context("parse key")?;
        let tag = r.read_u32().context("read value_type")?;
        let value = GgufValue::decode(r, tag).context("parse value")?;
        Ok(Self { key, value })
    }

    pub fn value_type(&self) -> GgufValueType {
        self.value.value_type()
    }
}

/// A fully decoded GGUF document. Tensor payload bytes are never read.
///
/// `metadata` keeps file order and duplicate keys; the table is a list of
/// pairs, not a map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GgufFile {
    pub header: GgufHeader,
    pub metadata: Vec<GgufMetadataKv>,
    pub tensors: Vec<TensorInfo>,
}

impl GgufFile {
    pub fn decode<R: Read>(r: R) -> Result<Self> {
        Self::decode_with(r, &mut NoopObserver)
    }

    /// Decode in a single pass, reporting progress to `observer`.
    ///
    /// The first error at any depth aborts the decode; it comes back wrapped
    /// with the table index (`metadata_kv[i]` / `tensor_info[i]`) it hit.
    pub fn decode_with<R: Read>(r: R, observer: &mut dyn DecodeObserver) -> Result<Self> {
        let mut r = GgufReader::new(r);

        let header = GgufHeader::decode(&mut r)?;
        observer.on_header(&header);

        let mut metadata = Vec::with_capacity(header.metadata_kv_count.min(TABLE_PREALLOC) as usize);
        for i in 0..header.metadata_kv_count {
            let kv = GgufMetadataKv::decode(&mut r).with_context(|| format!("metadata_kv[{i}]"))?;
            observer.on_metadata(i, &kv);
            metadata.push(kv);
        }

        let mut tensors = Vec::with_capacity(header.tensor_count.min(TABLE_PREALLOC) as usize);
        for i in 0..header.tensor_count {
            let info = TensorInfo::decode(&mut r).with_context(|| format!("tensor_info[{i}]"))?;
            observer.on_tensor(i, &info);
            tensors.push(info);
        }

        Ok(Self { header, metadata, tensors })
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&GgufValue> {
        self.metadata.iter().find(|kv| kv.key == key).map(|kv| &kv.value)
    }

    /// Every value stored under `key`, in file order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a GgufValue> + 'a {
        self.metadata.iter().filter(move |kv| kv.key == key).map(|kv| &kv.value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &GgufString> {
        self.metadata.iter().map(|kv| &kv.key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(GgufValue::as_str)
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(GgufValue::as_u32)
    }

    /// Tensor-data alignment from `general.alignment`, falling back to 32
    /// when absent or not a power of two.
    pub fn alignment(&self) -> u64 {
        match self.get("general.alignment").and_then(GgufValue::to_u64) {
            Some(a) if a.is_power_of_two() => a,
            _ => GGUF_DEFAULT_ALIGNMENT,
        }
    }

    pub fn tensor(&self, name: &str) -> Option<&TensorInfo> {
        self.tensors.iter().find(|t| t.name == name)
    }
}

/// Decode a GGUF document from a byte stream positioned at offset 0.
pub fn decode<R: Read>(r: R) -> Result<GgufFile> {
    GgufFile::decode(r)
}

pub fn decode_slice(data: &[u8]) -> Result<GgufFile> {
    GgufFile::decode(data)
}

/// Memory-map a GGUF file and decode its header, metadata and tensor index.
///
/// The mapping is released before this returns.
pub fn open(path: impl AsRef<Path>) -> Result<GgufFile> {
    open_with(path, &mut NoopObserver)
}

pub fn open_with(path: impl AsRef<Path>, observer: &mut dyn DecodeObserver) -> Result<GgufFile> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .map_err(|e| GgufError::Io(e).context(format!("open {}", path.display())))?;
    // SAFETY: we do not mutate the mapping and the file is opened read-only.
    let mmap = unsafe { memmap2::Mmap::map(&file) }
        .map_err(|e| GgufError::Io(e).context(format!("mmap {}", path.display())))?;
    GgufFile::decode_with(&mmap[..], observer)
}
