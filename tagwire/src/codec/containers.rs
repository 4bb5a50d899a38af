use super::{Codec, unclaimed};
use crate::envelope::{COMPLEX_TAG, Envelope, SET_TAG, TUPLE_TAG};
use crate::error::CodecError;
use crate::value::{Complex, Value};

/// Tuples, sets and complex numbers.
///
/// Tuples and sets travel as a `data` list; a set makes no promise about
/// element order. Complex numbers travel as `[real, imag]` floats, never as
/// text.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainerCodec;

impl Codec for ContainerCodec {
    fn name(&self) -> &str {
        "containers"
    }

    fn tags(&self) -> &[&str] {
        &[TUPLE_TAG, SET_TAG, COMPLEX_TAG]
    }

    fn claims(&self, value: &Value) -> bool {
        matches!(value, Value::Tuple(_) | Value::Set(_) | Value::Complex(_))
    }

    fn encode(&self, value: &Value) -> Result<Option<Envelope>, CodecError> {
        let envelope = match value {
            Value::Tuple(items) => Envelope::new(TUPLE_TAG).with("data", items.clone()),
            Value::Set(set) => {
                Envelope::new(SET_TAG).with("data", set.iter().cloned().collect::<Vec<_>>())
            }
            Value::Complex(c) => Envelope::new(COMPLEX_TAG)
                .with("data", vec![Value::Float(c.re), Value::Float(c.im)]),
            _ => return Ok(None),
        };
        Ok(Some(envelope))
    }

    fn decode(&self, mut envelope: Envelope) -> Result<Value, CodecError> {
        match envelope.tag() {
            TUPLE_TAG => Ok(Value::Tuple(envelope.take_as("data")?)),
            SET_TAG => {
                let items: Vec<Value> = envelope.take_as("data")?;
                Ok(Value::set(items))
            }
            COMPLEX_TAG => {
                let parts: Vec<Value> = envelope.take_as("data")?;
                let [re, im] = <[Value; 2]>::try_from(parts).map_err(|parts| {
                    CodecError::malformed(
                        COMPLEX_TAG,
                        format!("expected 2 components, got {}", parts.len()),
                    )
                })?;
                Ok(Value::Complex(Complex::new(component(re)?, component(im)?)))
            }
            _ => Err(unclaimed(self, &envelope)),
        }
    }
}

/// Floats, or integers a bulk decoder narrowed (`1.0` may arrive as `1`).
fn component(value: Value) -> Result<f64, CodecError> {
    match value {
        Value::Float(f) => Ok(f),
        Value::Int(i) => Ok(i as f64),
        other => Err(CodecError::malformed(
            COMPLEX_TAG,
            format!("component must be a number, got {}", other.type_description()),
        )),
    }
}
