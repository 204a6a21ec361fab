//! GGUF encoder, the exact inverse of the decoder.

use std::io::Write;

use crate::error::{GgufError, Result};
use crate::file::{GgufFile, GgufMetadataKv};
use crate::reader::GgufString;
use crate::tensor::TensorInfo;
use crate::value::{GgufArray, GgufValue};
use crate::{GGUF_MAGIC, GGUF_VERSION, MAX_DIMENSIONS, MAX_LENGTH};

/// Little-endian writer for the GGUF wire layout.
#[derive(Debug)]
pub struct GgufWriter<W> {
    inner: W,
}

macro_rules! write_le {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[inline]
            pub fn $name(&mut self, v: $ty) -> Result<()> {
                self.inner.write_all(&v.to_le_bytes())?;
                Ok(())
            }
        )*
    };
}

impl<W: Write> GgufWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    write_le! {
        write_u8 => u8,
        write_i8 => i8,
        write_u16 => u16,
        write_i16 => i16,
        write_u32 => u32,
        write_i32 => i32,
        write_u64 => u64,
        write_i64 => i64,
        write_f32 => f32,
        write_f64 => f64,
    }

    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_u8(u8::from(v))
    }

    pub fn write_string(&mut self, s: &GgufString) -> Result<()> {
        let len = s.len() as u64;
        if len > MAX_LENGTH {
            return Err(GgufError::invalid(format!("string length too large: {len}")));
        }
        self.write_u64(len)?;
        self.inner.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Value payload only; the caller writes the tag where the layout needs it.
    pub fn write_value(&mut self, value: &GgufValue) -> Result<()> {
        match value {
            GgufValue::Uint8(v) => self.write_u8(*v),
            GgufValue::Int8(v) => self.write_i8(*v),
            GgufValue::Uint16(v) => self.write_u16(*v),
            GgufValue::Int16(v) => self.write_i16(*v),
            GgufValue::Uint32(v) => self.write_u32(*v),
            GgufValue::Int32(v) => self.write_i32(*v),
            GgufValue::Float32(v) => self.write_f32(*v),
            GgufValue::Bool(v) => self.write_bool(*v),
            GgufValue::String(s) => self.write_string(s),
            GgufValue::Array(a) => self.write_array(a),
            GgufValue::Uint64(v) => self.write_u64(*v),
            GgufValue::Int64(v) => self.write_i64(*v),
            GgufValue::Float64(v) => self.write_f64(*v),
        }
    }

    fn write_array(&mut self, array: &GgufArray) -> Result<()> {
        let len = array.len() as u64;
        if len > MAX_LENGTH {
            return Err(GgufError::invalid(format!("array length too large: {len}")));
        }
        self.write_u32(array.elem_tag)?;
        self.write_u64(len)?;
        for (i, elem) in array.iter().enumerate() {
            if array.elem_type() != Some(elem.value_type()) {
                return Err(GgufError::invalid(format!(
                    "array elem[{i}] is {} but the array tag is {}",
                    elem.value_type(),
                    array.elem_tag
                )));
            }
            self.write_value(elem)?;
        }
        Ok(())
    }

    pub fn write_kv(&mut self, kv: &GgufMetadataKv) -> Result<()> {
        self.write_string(&kv.key)?;
        self.write_u32(kv.value_type().as_u32())?;
        self.write_value(&kv.value)
    }

    pub fn write_tensor_info(&mut self, info: &TensorInfo) -> Result<()> {
        let n_dims = u32::try_from(info.dims.len()).unwrap_or(u32::MAX);
        if n_dims > MAX_DIMENSIONS {
            return Err(GgufError::TooManyDimensions(n_dims));
        }
        self.write_string(&info.name)?;
        self.write_u32(n_dims)?;
        for &d in &info.dims {
            self.write_u64(d)?;
        }
        self.write_u32(info.dtype)?;
        self.write_u64(info.offset)
    }

    /// Header, metadata table and tensor index. Counts come from the vectors.
    pub fn write_file(&mut self, file: &GgufFile) -> Result<()> {
        self.write_u32(GGUF_MAGIC)?;
        self.write_u32(GGUF_VERSION)?;
        self.write_u64(file.tensors.len() as u64)?;
        self.write_u64(file.metadata.len() as u64)?;
        for (i, kv) in file.metadata.iter().enumerate() {
            self.write_kv(kv).map_err(|e| e.context(format!("metadata_kv[{i}]")))?;
        }
        for (i, info) in file.tensors.iter().enumerate() {
            self.write_tensor_info(info).map_err(|e| e.context(format!("tensor_info[{i}]")))?;
        }
        self.inner.flush()?;
        Ok(())
    }
}

impl GgufFile {
    pub fn write_to<W: Write>(&self, w: W) -> Result<()> {
        GgufWriter::new(w).write_file(self)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }
}
