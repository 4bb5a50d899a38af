use std::io;

use super::Format;
use crate::error::CodecError;
use crate::wire::Wire;

/// MessagePack via `rmp-serde`. Maps are written as maps, never as arrays.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPack;

impl Format for MsgPack {
    const NAME: &'static str = "msgpack";

    fn write(wire: &Wire) -> Result<Vec<u8>, CodecError> {
        Ok(rmp_serde::to_vec(wire)?)
    }

    fn read(bytes: &[u8]) -> Result<Wire, CodecError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    fn write_to<W: io::Write>(wire: &Wire, mut writer: W) -> Result<(), CodecError> {
        Ok(rmp_serde::encode::write(&mut writer, wire)?)
    }

    fn read_from<R: io::Read>(reader: R) -> Result<Wire, CodecError> {
        Ok(rmp_serde::decode::from_read(reader)?)
    }
}
