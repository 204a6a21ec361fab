//! Tensor descriptors and the GGML storage-type enumeration.

use serde::Serialize;
use std::fmt;
use std::io::Read;

use crate::MAX_DIMENSIONS;
use crate::error::{GgufError, Result, ResultExt};
use crate::reader::{GgufReader, GgufString};

/// GGML tensor storage kinds, numbered as on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
#[allow(non_camel_case_types)]
pub enum GgmlType {
    F32 = 0,
    F16 = 1,
    Q4_0 = 2,
    Q4_1 = 3,
    /// Retired upstream; the slot stays reserved.
    Q4_2 = 4,
    /// Retired upstream; the slot stays reserved.
    Q4_3 = 5,
    Q5_0 = 6,
    Q5_1 = 7,
    Q8_0 = 8,
    Q8_1 = 9,
    Q2_K = 10,
    Q3_K = 11,
    Q4_K = 12,
    Q5_K = 13,
    Q6_K = 14,
    Q8_K = 15,
    IQ2_XXS = 16,
    IQ2_XS = 17,
    IQ3_XXS = 18,
    IQ1_S = 19,
    IQ4_NL = 20,
    IQ3_S = 21,
    IQ2_S = 22,
    IQ4_XS = 23,
    I8 = 24,
    I16 = 25,
    I32 = 26,
    I64 = 27,
    F64 = 28,
    IQ1_M = 29,
}

impl GgmlType {
    /// Number of known storage kinds.
    pub const COUNT: u32 = 30;

    pub const fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            0 => Self::F32,
            1 => Self::F16,
            2 => Self::Q4_0,
            3 => Self::Q4_1,
            4 => Self::Q4_2,
            5 => Self::Q4_3,
            6 => Self::Q5_0,
            7 => Self::Q5_1,
            8 => Self::Q8_0,
            9 => Self::Q8_1,
            10 => Self::Q2_K,
            11 => Self::Q3_K,
            12 => Self::Q4_K,
            13 => Self::Q5_K,
            14 => Self::Q6_K,
            15 => Self::Q8_K,
            16 => Self::IQ2_XXS,
            17 => Self::IQ2_XS,
            18 => Self::IQ3_XXS,
            19 => Self::IQ1_S,
            20 => Self::IQ4_NL,
            21 => Self::IQ3_S,
            22 => Self::IQ2_S,
            23 => Self::IQ4_XS,
            24 => Self::I8,
            25 => Self::I16,
            26 => Self::I32,
            27 => Self::I64,
            28 => Self::F64,
            29 => Self::IQ1_M,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::F32 => "F32",
            Self::F16 => "F16",
            Self::Q4_0 => "Q4_0",
            Self::Q4_1 => "Q4_1",
            Self::Q4_2 => "Q4_2",
            Self::Q4_3 => "Q4_3",
            Self::Q5_0 => "Q5_0",
            Self::Q5_1 => "Q5_1",
            Self::Q8_0 => "Q8_0",
            Self::Q8_1 => "Q8_1",
            Self::Q2_K => "Q2_K",
            Self::Q3_K => "Q3_K",
            Self::Q4_K => "Q4_K",
            Self::Q5_K => "Q5_K",
            Self::Q6_K => "Q6_K",
            Self::Q8_K => "Q8_K",
            Self::IQ2_XXS => "IQ2_XXS",
            Self::IQ2_XS => "IQ2_XS",
            Self::IQ3_XXS => "IQ3_XXS",
            Self::IQ1_S => "IQ1_S",
            Self::IQ4_NL => "IQ4_NL",
            Self::IQ3_S => "IQ3_S",
            Self::IQ2_S => "IQ2_S",
            Self::IQ4_XS => "IQ4_XS",
            Self::I8 => "I8",
            Self::I16 => "I16",
            Self::I32 => "I32",
            Self::I64 => "I64",
            Self::F64 => "F64",
            Self::IQ1_M => "IQ1_M",
        }
    }

    /// Check if this storage kind is block-quantized.
    pub const fn is_quantized(self) -> bool {
        !matches!(
            self,
            Self::F32 | Self::F16 | Self::F64 | Self::I8 | Self::I16 | Self::I32 | Self::I64
        )
    }
}

impl fmt::Display for GgmlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lightweight tensor descriptor from the GGUF tensor index.
///
/// The storage tag is kept raw: unlike metadata value tags, an unknown
/// storage kind is preserved rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TensorInfo {
    pub name: GgufString,
    pub dims: Vec<u64>,
    /// Raw GGML dtype discriminant.
    pub dtype: u32,
    /// Byte offset into the tensor-data section.
    pub offset: u64,
}

impl TensorInfo {
    pub fn decode<R: Read>(r: &mut GgufReader<R>) -> Result<Self> {
        let name = r.read_string().context("parse tensor name")?;

        let n_dims = r.read_u32().context("read n_dimensions")?;
        if n_dims > MAX_DIMENSIONS {
            return Err(GgufError::TooManyDimensions(n_dims));
        }
        let mut dims = Vec::with_capacity(n_dims as usize);
        for i in 0..n_dims {
            dims.push(r.read_u64().with_context(|| format!("read dimension[{i}]"))?);
        }

        let dtype = r.read_u32().context("read ggml_type")?;
        let offset = r.read_u64().context("read offset")?;

        Ok(Self { name, dims, dtype, offset })
    }

    pub fn n_dims(&self) -> u32 {
        self.dims.len() as u32
    }

    pub fn ggml_type(&self) -> Option<GgmlType> {
        GgmlType::from_u32(self.dtype)
    }

    /// Storage kind name, or `UNKNOWN_TYPE(n)` for tags outside the enumeration.
    pub fn dtype_name(&self) -> String {
        match self.ggml_type() {
            Some(t) => t.name().to_string(),
            None => format!("UNKNOWN_TYPE({})", self.dtype),
        }
    }

    /// Product of the dimensions; `None` on overflow.
    pub fn element_count(&self) -> Option<u64> {
        self.dims.iter().try_fold(1u64, |acc, &d| acc.checked_mul(d))
    }
}
