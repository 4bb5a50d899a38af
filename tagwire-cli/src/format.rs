use std::io;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tagwire_core::{CodecError, Format, Json, MsgPack, Wire};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Json,
    Msgpack,
}

impl FormatKind {
    /// Guess from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(FormatKind::Json),
            "msgpack" | "mpk" => Some(FormatKind::Msgpack),
            _ => None,
        }
    }

    /// Explicit choice, then the path's extension, then the fallback.
    pub fn resolve(explicit: Option<Self>, path: Option<&Path>, fallback: Self) -> Self {
        explicit
            .or_else(|| path.and_then(Self::from_path))
            .unwrap_or(fallback)
    }

    pub fn read(self, bytes: &[u8]) -> Result<Wire, CodecError> {
        match self {
            FormatKind::Json => Json::read(bytes),
            FormatKind::Msgpack => MsgPack::read(bytes),
        }
    }

    pub fn read_from<R: io::Read>(self, reader: R) -> Result<Wire, CodecError> {
        match self {
            FormatKind::Json => Json::read_from(reader),
            FormatKind::Msgpack => MsgPack::read_from(reader),
        }
    }

    /// `pretty` only affects JSON.
    pub fn write(self, wire: &Wire, pretty: bool) -> Result<Vec<u8>, CodecError> {
        match self {
            FormatKind::Json if pretty => Json::write_pretty(wire),
            FormatKind::Json => Json::write(wire),
            FormatKind::Msgpack => MsgPack::write(wire),
        }
    }
}
