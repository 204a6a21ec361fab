//! The tagged metadata value model and its recursive decoder.

use serde::{Serialize, Serializer};
use std::fmt;
use std::io::Read;

use crate::error::{GgufError, Result, ResultExt};
use crate::reader::{GgufReader, GgufString};
use crate::{MAX_LENGTH, MAX_NESTING_DEPTH};

/// Elements reserved up front for an array; a corrupt count must not drive allocation.
const ARRAY_PREALLOC: u64 = 1024;

/// Discriminant tag for GGUF metadata values.
///
/// Numeric values and their order are part of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum GgufValueType {
    Uint8 = 0,
    Int8 = 1,
    Uint16 = 2,
    Int16 = 3,
    Uint32 = 4,
    Int32 = 5,
    Float32 = 6,
    Bool = 7,
    String = 8,
    Array = 9,
    Uint64 = 10,
    Int64 = 11,
    Float64 = 12,
}

impl GgufValueType {
    pub const ALL: [Self; 13] = [
        Self::Uint8,
        Self::Int8,
        Self::Uint16,
        Self::Int16,
        Self::Uint32,
        Self::Int32,
        Self::Float32,
        Self::Bool,
        Self::String,
        Self::Array,
        Self::Uint64,
        Self::Int64,
        Self::Float64,
    ];

    /// Convert from the raw u32 discriminant in the file.
    pub const fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Uint8),
            1 => Some(Self::Int8),
            2 => Some(Self::Uint16),
            3 => Some(Self::Int16),
            4 => Some(Self::Uint32),
            5 => Some(Self::Int32),
            6 => Some(Self::Float32),
            7 => Some(Self::Bool),
            8 => Some(Self::String),
            9 => Some(Self::Array),
            10 => Some(Self::Uint64),
            11 => Some(Self::Int64),
            12 => Some(Self::Float64),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Uint8 => "UINT8",
            Self::Int8 => "INT8",
            Self::Uint16 => "UINT16",
            Self::Int16 => "INT16",
            Self::Uint32 => "UINT32",
            Self::Int32 => "INT32",
            Self::Float32 => "FLOAT32",
            Self::Bool => "BOOL",
            Self::String => "STRING",
            Self::Array => "ARRAY",
            Self::Uint64 => "UINT64",
            Self::Int64 => "INT64",
            Self::Float64 => "FLOAT64",
        }
    }
}

impl fmt::Display for GgufValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for GgufValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// A parsed GGUF metadata value. Exactly one payload per tag.
#[derive(Debug, Clone, PartialEq)]
pub enum GgufValue {
    Uint8(u8),
    Int8(i8),
    Uint16(u16),
    Int16(i16),
    Uint32(u32),
    Int32(i32),
    Float32(f32),
    Bool(bool),
    String(GgufString),
    Array(GgufArray),
    Uint64(u64),
    Int64(i64),
    Float64(f64),
}

/// Array payload: the element tag tells the decoder how to read each element.
///
/// The tag is kept as read. It is only interpreted when an element is decoded,
/// so an empty array may carry a tag outside the known range.
#[derive(Debug, Clone, PartialEq)]
pub struct GgufArray {
    pub elem_tag: u32,
    pub elements: Vec<GgufValue>,
}

macro_rules! scalar_accessors {
    ($($fn_name:ident => $variant:ident : $ty:ty),* $(,)?) => {
        $(
            pub fn $fn_name(&self) -> Option<$ty> {
                match self {
                    Self::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        )*
    };
}

macro_rules! from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for GgufValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

from_scalar! {
    u8 => Uint8,
    i8 => Int8,
    u16 => Uint16,
    i16 => Int16,
    u32 => Uint32,
    i32 => Int32,
    f32 => Float32,
    bool => Bool,
    u64 => Uint64,
    i64 => Int64,
    f64 => Float64,
}

impl From<&str> for GgufValue {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<GgufArray> for GgufValue {
    fn from(a: GgufArray) -> Self {
        Self::Array(a)
    }
}

impl GgufValue {
    /// Decode one value whose tag has already been read.
    ///
    /// Arrays recurse through this same rule with their element tag. An
    /// unrecognized tag anywhere, at any depth, fails the whole decode.
    pub fn decode<R: Read>(r: &mut GgufReader<R>, tag: u32) -> Result<Self> {
        Self::decode_nested(r, tag, 0)
    }

    fn decode_nested<R: Read>(r: &mut GgufReader<R>, tag: u32, depth: usize) -> Result<Self> {
        let ty = GgufValueType::from_u32(tag).ok_or(GgufError::UnknownTag(tag))?;
        Ok(match ty {
            GgufValueType::Uint8 => Self::Uint8(r.read_u8()?),
            GgufValueType::Int8 => Self::Int8(r.read_i8()?),
            GgufValueType::Uint16 => Self::Uint16(r.read_u16()?),
            GgufValueType::Int16 => Self::Int16(r.read_i16()?),
            GgufValueType::Uint32 => Self::Uint32(r.read_u32()?),
            GgufValueType::Int32 => Self::Int32(r.read_i32()?),
            GgufValueType::Float32 => Self::Float32(r.read_f32()?),
            GgufValueType::Bool => Self::Bool(r.read_bool()?),
            GgufValueType::String => Self::String(r.read_string()?),
            GgufValueType::Array => Self::Array(GgufArray::decode(r, depth + 1)?),
            GgufValueType::Uint64 => Self::Uint64(r.read_u64()?),
            GgufValueType::Int64 => Self::Int64(r.read_i64()?),
            GgufValueType::Float64 => Self::Float64(r.read_f64()?),
        })
    }

    pub fn value_type(&self) -> GgufValueType {
        match self {
            Self::Uint8(_) => GgufValueType::Uint8,
            Self::Int8(_) => GgufValueType::Int8,
            Self::Uint16(_) => GgufValueType::Uint16,
            Self::Int16(_) => GgufValueType::Int16,
            Self::Uint32(_) => GgufValueType::Uint32,
            Self::Int32(_) => GgufValueType::Int32,
            Self::Float32(_) => GgufValueType::Float32,
            Self::Bool(_) => GgufValueType::Bool,
            Self::String(_) => GgufValueType::String,
            Self::Array(_) => GgufValueType::Array,
            Self::Uint64(_) => GgufValueType::Uint64,
            Self::Int64(_) => GgufValueType::Int64,
            Self::Float64(_) => GgufValueType::Float64,
        }
    }

    scalar_accessors! {
        as_u8 => Uint8: u8,
        as_i8 => Int8: i8,
        as_u16 => Uint16: u16,
        as_i16 => Int16: i16,
        as_u32 => Uint32: u32,
        as_i32 => Int32: i32,
        as_f32 => Float32: f32,
        as_bool => Bool: bool,
        as_u64 => Uint64: u64,
        as_i64 => Int64: i64,
        as_f64 => Float64: f64,
    }

    /// Any non-negative integer widened to `u64`.
    pub fn to_u64(&self) -> Option<u64> {
        match *self {
            Self::Uint8(v) => Some(v.into()),
            Self::Uint16(v) => Some(v.into()),
            Self::Uint32(v) => Some(v.into()),
            Self::Uint64(v) => Some(v),
            Self::Int8(v) => u64::try_from(v).ok(),
            Self::Int16(v) => u64::try_from(v).ok(),
            Self::Int32(v) => u64::try_from(v).ok(),
            Self::Int64(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&GgufString> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// UTF-8 text of a string value; `None` for other kinds or invalid text.
    pub fn as_str(&self) -> Option<&str> {
        self.as_string().and_then(|s| s.as_str().ok())
    }

    pub fn as_array(&self) -> Option<&GgufArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }
}

impl GgufArray {
    pub fn new(elem_type: GgufValueType, elements: Vec<GgufValue>) -> Self {
        Self { elem_tag: elem_type.as_u32(), elements }
    }

    /// The element kind, or `None` when the stored tag is not a known kind.
    pub fn elem_type(&self) -> Option<GgufValueType> {
        GgufValueType::from_u32(self.elem_tag)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GgufValue> {
        self.elements.iter()
    }

    fn decode<R: Read>(r: &mut GgufReader<R>, depth: usize) -> Result<Self> {
        if depth > MAX_NESTING_DEPTH {
            return Err(GgufError::NestingTooDeep(MAX_NESTING_DEPTH));
        }

        let elem_tag = r.read_u32().context("read array elem type")?;
        let len = r.read_u64().context("read array length")?;
        if len > MAX_LENGTH {
            return Err(GgufError::invalid(format!("array length too large: {len}")));
        }

        let mut elements = Vec::with_capacity(len.min(ARRAY_PREALLOC) as usize);
        for i in 0..len {
            let value = GgufValue::decode_nested(r, elem_tag, depth)
                .with_context(|| format!("parse array elem[{i}]"))?;
            elements.push(value);
        }

        Ok(Self { elem_tag, elements })
    }
}

/// Writes a float the way C's `%g` does with shortest digits: plain notation
/// for exponents in `-4..6`, otherwise `d.ddde±XX`.
fn write_general<T: fmt::Display + fmt::LowerExp>(f: &mut fmt::Formatter<'_>, v: T) -> fmt::Result {
    let sci = format!("{v:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        // NaN and infinities carry no exponent
        return match sci.as_str() {
            "inf" => f.write_str("+Inf"),
            "-inf" => f.write_str("-Inf"),
            other => f.write_str(other),
        };
    };
    let exp: i32 = exp.parse().map_err(|_| fmt::Error)?;
    if (-4..6).contains(&exp) {
        write!(f, "{v}")
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        write!(f, "{mantissa}e{sign}{:02}", exp.unsigned_abs())
    }
}

impl<'a> IntoIterator for &'a GgufArray {
    type Item = &'a GgufValue;
    type IntoIter = std::slice::Iter<'a, GgufValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl fmt::Display for GgufValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = self.value_type();
        match self {
            Self::Uint8(v) => write!(f, "{ty}({v})"),
            Self::Int8(v) => write!(f, "{ty}({v})"),
            Self::Uint16(v) => write!(f, "{ty}({v})"),
            Self::Int16(v) => write!(f, "{ty}({v})"),
            Self::Uint32(v) => write!(f, "{ty}({v})"),
            Self::Int32(v) => write!(f, "{ty}({v})"),
            Self::Float32(v) => {
                write!(f, "{ty}(")?;
                write_general(f, *v)?;
                f.write_str(")")
            }
            Self::Bool(v) => write!(f, "{ty}({v})"),
            Self::Uint64(v) => write!(f, "{ty}({v})"),
            Self::Int64(v) => write!(f, "{ty}({v})"),
            Self::Float64(v) => {
                write!(f, "{ty}(")?;
                write_general(f, *v)?;
                f.write_str(")")
            }
            Self::String(s) => write!(f, "STRING(len={}, data={s:?})", s.len()),
            Self::Array(a) => match a.elem_type() {
                Some(elem) => write!(f, "ARRAY(elem={elem}, len={})", a.len()),
                None => write!(f, "ARRAY(elem=UNKNOWN({}), len={})", a.elem_tag, a.len()),
            },
        }
    }
}

impl Serialize for GgufValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Uint8(v) => serializer.serialize_u8(*v),
            Self::Int8(v) => serializer.serialize_i8(*v),
            Self::Uint16(v) => serializer.serialize_u16(*v),
            Self::Int16(v) => serializer.serialize_i16(*v),
            Self::Uint32(v) => serializer.serialize_u32(*v),
            Self::Int32(v) => serializer.serialize_i32(*v),
            Self::Float32(v) => serializer.serialize_f32(*v),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::String(s) => s.serialize(serializer),
            Self::Array(a) => serializer.collect_seq(&a.elements),
            Self::Uint64(v) => serializer.serialize_u64(*v),
            Self::Int64(v) => serializer.serialize_i64(*v),
            Self::Float64(v) => serializer.serialize_f64(*v),
        }
    }
}
