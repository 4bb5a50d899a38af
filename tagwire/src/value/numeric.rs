//! Homogeneous numeric arrays and fixed-width scalars.
//!
//! Element buffers are always held in little-endian byte order, which is also
//! the wire order. Element types are described with the NumPy array-protocol
//! type string (`<f4`, `|u1`, `|b1`, ...).

use crate::error::CodecError;
use crate::envelope::{NDARRAY_TAG, NPGENERIC_TAG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

/// Byte order named by a type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ByteOrder {
    Little,
    Big,
}

impl DType {
    /// Width of one element in bytes.
    pub fn width(self) -> usize {
        match self {
            DType::Bool | DType::I8 | DType::U8 => 1,
            DType::I16 | DType::U16 => 2,
            DType::I32 | DType::U32 | DType::F32 => 4,
            DType::I64 | DType::U64 | DType::F64 => 8,
        }
    }

    fn kind(self) -> char {
        match self {
            DType::Bool => 'b',
            DType::I8 | DType::I16 | DType::I32 | DType::I64 => 'i',
            DType::U8 | DType::U16 | DType::U32 | DType::U64 => 'u',
            DType::F32 | DType::F64 => 'f',
        }
    }

    /// Kind and width without byte order, e.g. `f4`.
    pub fn name(self) -> String {
        format!("{}{}", self.kind(), self.width())
    }

    /// Wire type string: `<` for multi-byte types, `|` for single bytes.
    pub fn descr(self) -> String {
        let order = if self.width() == 1 { '|' } else { '<' };
        format!("{order}{}", self.name())
    }

    fn from_kind(kind: char, width: usize) -> Option<Self> {
        Some(match (kind, width) {
            ('b', 1) => DType::Bool,
            ('i', 1) => DType::I8,
            ('i', 2) => DType::I16,
            ('i', 4) => DType::I32,
            ('i', 8) => DType::I64,
            ('u', 1) => DType::U8,
            ('u', 2) => DType::U16,
            ('u', 4) => DType::U32,
            ('u', 8) => DType::U64,
            ('f', 4) => DType::F32,
            ('f', 8) => DType::F64,
            _ => return None,
        })
    }

    /// Parse a type string. Native order (`=`) is rejected: the wire never
    /// depends on the host.
    pub(crate) fn parse(descr: &str) -> Option<(DType, ByteOrder)> {
        let mut chars = descr.chars();
        let order = match chars.next()? {
            '<' => ByteOrder::Little,
            '>' => ByteOrder::Big,
            '|' => ByteOrder::Little,
            _ => return None,
        };
        let kind = chars.next()?;
        let width = match chars.as_str() {
            "1" => 1,
            "2" => 2,
            "4" => 4,
            "8" => 8,
            _ => return None,
        };
        let dtype = DType::from_kind(kind, width)?;
        if descr.starts_with('|') && width != 1 {
            return None;
        }
        Some((dtype, order))
    }
}

/// Convert a buffer in `order` into little-endian in place.
pub(crate) fn to_little_endian(bytes: &mut [u8], width: usize, order: ByteOrder) {
    if order == ByteOrder::Big && width > 1 {
        for chunk in bytes.chunks_exact_mut(width) {
            chunk.reverse();
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A primitive usable as an array element.
pub trait Element: Copy + sealed::Sealed {
    const DTYPE: DType;
    fn write_le(self, out: &mut Vec<u8>);
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! element {
    ($($t:ty => $dtype:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $t {}

            impl Element for $t {
                const DTYPE: DType = DType::$dtype;

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    <$t>::from_le_bytes(buf)
                }
            }
        )*
    };
}

element! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

impl sealed::Sealed for bool {}

impl Element for bool {
    const DTYPE: DType = DType::Bool;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(u8::from(self));
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// An n-dimensional array of one element type, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    dtype: DType,
    shape: Vec<usize>,
    data: Vec<u8>,
}

impl NdArray {
    /// One-dimensional array.
    pub fn from_vec<T: Element>(values: Vec<T>) -> Self {
        let shape = vec![values.len()];
        let mut data = Vec::with_capacity(values.len() * T::DTYPE.width());
        for v in values {
            v.write_le(&mut data);
        }
        Self {
            dtype: T::DTYPE,
            shape,
            data,
        }
    }

    pub fn from_shape_vec<T: Element>(shape: Vec<usize>, values: Vec<T>) -> Result<Self, CodecError> {
        let flat = Self::from_vec(values);
        flat.reshape(shape)
    }

    /// Build from a little-endian buffer. The buffer must hold exactly
    /// `product(shape)` elements.
    pub fn from_bytes(dtype: DType, shape: Vec<usize>, data: Vec<u8>) -> Result<Self, CodecError> {
        let count = element_count(&shape)
            .ok_or_else(|| CodecError::malformed(NDARRAY_TAG, "shape overflows"))?;
        let expected = count
            .checked_mul(dtype.width())
            .ok_or_else(|| CodecError::malformed(NDARRAY_TAG, "shape overflows"))?;
        if data.len() != expected {
            return Err(CodecError::malformed(
                NDARRAY_TAG,
                format!(
                    "buffer holds {} bytes, shape {:?} of {} needs {expected}",
                    data.len(),
                    shape,
                    dtype.descr()
                ),
            ));
        }
        check_bools(dtype, &data, NDARRAY_TAG)?;
        Ok(Self { dtype, shape, data })
    }

    pub fn reshape(self, shape: Vec<usize>) -> Result<Self, CodecError> {
        Self::from_bytes(self.dtype, shape, self.data)
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len() / self.dtype.width()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Little-endian element buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Elements in row-major order, or `None` if `T` is not the element type.
    pub fn to_vec<T: Element>(&self) -> Option<Vec<T>> {
        if T::DTYPE != self.dtype {
            return None;
        }
        Some(
            self.data
                .chunks_exact(self.dtype.width())
                .map(T::read_le)
                .collect(),
        )
    }
}

/// A `b1` element is one byte holding 0 or 1.
fn check_bools(dtype: DType, data: &[u8], tag: &str) -> Result<(), CodecError> {
    if dtype != DType::Bool {
        return Ok(());
    }
    match data.iter().find(|&&b| b > 1) {
        Some(byte) => Err(CodecError::malformed(
            tag,
            format!("bool element holds byte {byte:#04x}"),
        )),
        None => Ok(()),
    }
}

/// A single number with a fixed element type.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    dtype: DType,
    data: Vec<u8>,
}

impl Scalar {
    pub fn new<T: Element>(value: T) -> Self {
        let mut data = Vec::with_capacity(T::DTYPE.width());
        value.write_le(&mut data);
        Self {
            dtype: T::DTYPE,
            data,
        }
    }

    pub fn from_bytes(dtype: DType, data: Vec<u8>) -> Result<Self, CodecError> {
        if data.len() != dtype.width() {
            return Err(CodecError::malformed(
                NPGENERIC_TAG,
                format!(
                    "buffer holds {} bytes, {} needs {}",
                    data.len(),
                    dtype.descr(),
                    dtype.width()
                ),
            ));
        }
        check_bools(dtype, &data, NPGENERIC_TAG)?;
        Ok(Self { dtype, data })
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn get<T: Element>(&self) -> Option<T> {
        (T::DTYPE == self.dtype).then(|| T::read_le(&self.data))
    }
}
