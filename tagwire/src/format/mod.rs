//! Bulk formats and the adapter between values and wire trees.
//!
//! Encoding runs in two passes: the value tree is lowered to a [`Wire`] tree
//! (every non-native value goes through the codec registry's default hook),
//! then a serde encoder writes it. Decoding mirrors that: the bytes are read
//! into a wire tree, which is then raised bottom-up, every map passing
//! through the object hook.

mod json;
#[cfg(feature = "msgpack")]
mod msgpack;

pub(crate) use json::ensure_finite;
pub use json::Json;
#[cfg(feature = "msgpack")]
pub use msgpack::MsgPack;

use std::io;

use indexmap::IndexMap;

use crate::envelope::TYPE_KEY;
use crate::error::CodecError;
use crate::registry::CodecRegistry;
use crate::value::{Map, Value};
use crate::wire::Wire;

/// A bulk encoder/decoder for wire trees.
pub trait Format {
    /// Short lowercase name, used in logs.
    const NAME: &'static str;

    fn write(wire: &Wire) -> Result<Vec<u8>, CodecError>;

    fn read(bytes: &[u8]) -> Result<Wire, CodecError>;

    /// Stream the encoded tree into `writer`.
    fn write_to<W: io::Write>(wire: &Wire, writer: W) -> Result<(), CodecError>;

    /// Read exactly one document from `reader`.
    fn read_from<R: io::Read>(reader: R) -> Result<Wire, CodecError>;
}

/// Lower a value to a wire tree.
pub fn to_wire(codecs: &CodecRegistry, value: &Value) -> Result<Wire, CodecError> {
    Ok(match value {
        Value::Null => Wire::Null,
        Value::Bool(b) => Wire::Bool(*b),
        Value::Int(i) => Wire::Int(*i),
        Value::Float(f) => Wire::Float(*f),
        Value::Str(s) => Wire::Str(s.clone()),
        Value::List(items) => Wire::List(
            items
                .iter()
                .map(|item| to_wire(codecs, item))
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(map) => {
            // A plain map carrying the discriminator would decode as an
            // envelope.
            if map.contains_key(TYPE_KEY) {
                return Err(CodecError::unsupported(format!(
                    "map with reserved key `{TYPE_KEY}`"
                )));
            }
            lower_map(codecs, map)?
        }
        other => lower_map(codecs, &codecs.default_hook(other)?.into_map())?,
    })
}

fn lower_map(codecs: &CodecRegistry, map: &Map) -> Result<Wire, CodecError> {
    map.iter()
        .map(|(key, value)| Ok((key.clone(), to_wire(codecs, value)?)))
        .collect::<Result<IndexMap<_, _>, CodecError>>()
        .map(Wire::Map)
}

/// Raise a wire tree to a value, materializing envelopes bottom-up.
pub fn from_wire(codecs: &CodecRegistry, wire: Wire) -> Result<Value, CodecError> {
    Ok(match wire {
        Wire::Null => Value::Null,
        Wire::Bool(b) => Value::Bool(b),
        Wire::Int(i) => Value::Int(i),
        Wire::Float(f) => Value::Float(f),
        Wire::Str(s) => Value::Str(s),
        Wire::List(items) => Value::List(
            items
                .into_iter()
                .map(|item| from_wire(codecs, item))
                .collect::<Result<_, _>>()?,
        ),
        Wire::Map(map) => {
            let map = map
                .into_iter()
                .map(|(key, value)| Ok((key, from_wire(codecs, value)?)))
                .collect::<Result<Map, CodecError>>()?;
            codecs.object_hook(map)?
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Complex;

    fn wire_map(entries: &[(&str, Wire)]) -> Wire {
        Wire::Map(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn nested_values_are_lowered_recursively() {
        let codecs = CodecRegistry::with_builtins();
        let value = Value::List(vec![Value::tuple([Value::Complex(Complex::new(1.0, 2.0))])]);
        let wire = to_wire(&codecs, &value).unwrap();

        let complex = wire_map(&[
            ("__type__", Wire::Str("complex".into())),
            ("data", Wire::List(vec![Wire::Float(1.0), Wire::Float(2.0)])),
        ]);
        let tuple = wire_map(&[
            ("__type__", Wire::Str("tuple".into())),
            ("data", Wire::List(vec![complex])),
        ]);
        assert_eq!(wire, Wire::List(vec![tuple]));
        assert_eq!(from_wire(&codecs, wire).unwrap(), value);
    }

    #[test]
    fn plain_maps_pass_through() {
        let codecs = CodecRegistry::with_builtins();
        let wire = wire_map(&[("a", Wire::Int(1)), ("b", Wire::Null)]);
        let Value::Map(map) = from_wire(&codecs, wire.clone()).unwrap() else {
            panic!("expected a map");
        };
        assert_eq!(map.get("a"), Some(&Value::Int(1)));
        assert_eq!(to_wire(&codecs, &Value::Map(map)).unwrap(), wire);
    }

    #[test]
    fn map_with_type_key_is_rejected() {
        let codecs = CodecRegistry::with_builtins();
        let mut map = Map::new();
        map.insert(TYPE_KEY.into(), "tuple".into());
        let err = to_wire(&codecs, &Value::Map(map)).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedType { .. }));
    }

    #[test]
    fn unclaimed_tag_fails() {
        let codecs = CodecRegistry::with_builtins();
        let wire = wire_map(&[("__type__", Wire::Str("frobnicate".into()))]);
        let err = from_wire(&codecs, wire).unwrap_err();
        assert!(matches!(err, CodecError::UnknownTag(tag) if tag == "frobnicate"));
    }

    #[test]
    fn non_string_tag_is_malformed() {
        let codecs = CodecRegistry::with_builtins();
        let wire = wire_map(&[("__type__", Wire::Int(3))]);
        let err = from_wire(&codecs, wire).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEnvelope { .. }));
    }
}
