use std::io;

use super::Format;
use crate::error::CodecError;
use crate::wire::Wire;

/// JSON text via `serde_json`.
///
/// JSON has no literal for NaN or the infinities, so a tree holding one is
/// rejected instead of being written as `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

impl Json {
    pub fn write_pretty(wire: &Wire) -> Result<Vec<u8>, CodecError> {
        ensure_finite(wire)?;
        Ok(serde_json::to_vec_pretty(wire)?)
    }
}

impl Format for Json {
    const NAME: &'static str = "json";

    fn write(wire: &Wire) -> Result<Vec<u8>, CodecError> {
        ensure_finite(wire)?;
        Ok(serde_json::to_vec(wire)?)
    }

    fn read(bytes: &[u8]) -> Result<Wire, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn write_to<W: io::Write>(wire: &Wire, writer: W) -> Result<(), CodecError> {
        ensure_finite(wire)?;
        Ok(serde_json::to_writer(writer, wire)?)
    }

    fn read_from<R: io::Read>(reader: R) -> Result<Wire, CodecError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

pub(crate) fn ensure_finite(wire: &Wire) -> Result<(), CodecError> {
    match wire {
        Wire::Float(f) if !f.is_finite() => Err(CodecError::NonFiniteFloat(*f)),
        Wire::List(items) => items.iter().try_for_each(ensure_finite),
        Wire::Map(map) => map.values().try_for_each(ensure_finite),
        _ => Ok(()),
    }
}
