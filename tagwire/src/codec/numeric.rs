use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::{Codec, unclaimed};
use crate::envelope::{Envelope, NDARRAY_TAG, NPGENERIC_TAG};
use crate::error::CodecError;
use crate::value::{ByteOrder, DType, NdArray, Scalar, Value, to_little_endian};

/// Numeric arrays (`ndarray`) and fixed-width scalars (`npgeneric`).
///
/// Payload: `data` is the base64 element buffer in little-endian order,
/// `dtype` the array-protocol type string, and arrays add `shape`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumericCodec;

impl Codec for NumericCodec {
    fn name(&self) -> &str {
        "numeric"
    }

    fn tags(&self) -> &[&str] {
        &[NDARRAY_TAG, NPGENERIC_TAG]
    }

    fn claims(&self, value: &Value) -> bool {
        matches!(value, Value::Array(_) | Value::Scalar(_))
    }

    fn encode(&self, value: &Value) -> Result<Option<Envelope>, CodecError> {
        let envelope = match value {
            Value::Array(array) => {
                let shape: Vec<Value> = array
                    .shape()
                    .iter()
                    .map(|&dim| dimension_value(dim))
                    .collect::<Result<_, _>>()?;
                Envelope::new(NDARRAY_TAG)
                    .with("data", BASE64.encode(array.as_bytes()))
                    .with("dtype", array.dtype().descr())
                    .with("shape", shape)
            }
            Value::Scalar(scalar) => Envelope::new(NPGENERIC_TAG)
                .with("data", BASE64.encode(scalar.as_bytes()))
                .with("dtype", scalar.dtype().descr()),
            _ => return Ok(None),
        };
        Ok(Some(envelope))
    }

    fn decode(&self, mut envelope: Envelope) -> Result<Value, CodecError> {
        match envelope.tag() {
            NDARRAY_TAG => {
                let (dtype, data) = element_buffer(&mut envelope)?;
                let dims: Vec<i64> = envelope.take_as("shape")?;
                let shape = dims
                    .into_iter()
                    .map(|dim| {
                        usize::try_from(dim).map_err(|_| {
                            CodecError::malformed(NDARRAY_TAG, format!("invalid dimension {dim}"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::Array(NdArray::from_bytes(dtype, shape, data)?))
            }
            NPGENERIC_TAG => {
                let (dtype, data) = element_buffer(&mut envelope)?;
                Ok(Value::Scalar(Scalar::from_bytes(dtype, data)?))
            }
            _ => Err(unclaimed(self, &envelope)),
        }
    }
}

fn dimension_value(dim: usize) -> Result<Value, CodecError> {
    i64::try_from(dim)
        .map(Value::Int)
        .map_err(|_| CodecError::malformed(NDARRAY_TAG, format!("dimension {dim} out of range")))
}

/// Take `dtype` and `data`, returning the element type and a little-endian
/// buffer.
fn element_buffer(envelope: &mut Envelope) -> Result<(DType, Vec<u8>), CodecError> {
    let descr: String = envelope.take_as("dtype")?;
    let encoded: String = envelope.take_as("data")?;
    let tag = envelope.tag();

    let (dtype, order) = DType::parse(&descr)
        .ok_or_else(|| CodecError::malformed(tag, format!("unsupported dtype `{descr}`")))?;
    let mut data = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| CodecError::malformed(tag, format!("invalid base64 buffer: {e}")))?;
    if order == ByteOrder::Big {
        tracing::trace!(tag, dtype = %descr, "swapping big-endian buffer");
    }
    to_little_endian(&mut data, dtype.width(), order);
    Ok((dtype, data))
}
