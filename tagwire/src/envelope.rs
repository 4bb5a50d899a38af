//! The envelope: a tagged mapping every codec produces and consumes.
//!
//! On the wire an envelope is a map whose reserved `__type__` key holds the
//! tag string; every other key is payload private to the owning codec. Record
//! envelopes also carry the reserved `__class__` key.

use indexmap::IndexMap;

use crate::error::CodecError;
use crate::value::{FromValue, Map, Value};

/// Reserved discriminator key.
pub const TYPE_KEY: &str = "__type__";
/// Reserved key naming the declared record type.
pub const CLASS_KEY: &str = "__class__";

pub const TUPLE_TAG: &str = "tuple";
pub const SET_TAG: &str = "set";
pub const COMPLEX_TAG: &str = "complex";
pub const DATE_TAG: &str = "date";
pub const TIME_TAG: &str = "time";
pub const DATETIME_TAG: &str = "datetime";
pub const NDARRAY_TAG: &str = "ndarray";
pub const NPGENERIC_TAG: &str = "npgeneric";
pub const RECORD_TAG: &str = "record";

/// True for keys no payload or record attribute may use.
pub fn is_reserved_key(key: &str) -> bool {
    key == TYPE_KEY || key == CLASS_KEY
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    tag: String,
    payload: Map,
}

impl Envelope {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            payload: IndexMap::new(),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add a payload entry. A `__type__` entry is accepted here but rejected
    /// when the registry hands the envelope to the bulk encoder.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.payload.insert(key.into(), value.into())
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    pub fn payload(&self) -> &Map {
        &self.payload
    }

    pub fn into_payload(self) -> Map {
        self.payload
    }

    /// Remove a required payload entry.
    pub fn take(&mut self, key: &str) -> Result<Value, CodecError> {
        self.payload
            .shift_remove(key)
            .ok_or_else(|| CodecError::malformed(&self.tag, format!("missing `{key}`")))
    }

    /// Remove a required payload entry and convert it.
    pub fn take_as<V: FromValue>(&mut self, key: &str) -> Result<V, CodecError> {
        let value = self.take(key)?;
        V::from_value(value).map_err(|e| CodecError::malformed(&self.tag, format!("`{key}`: {e}")))
    }

    /// Split a decoded map into an envelope. The map must carry a string
    /// `__type__`.
    pub fn from_map(mut map: Map) -> Result<Self, CodecError> {
        match map.shift_remove(TYPE_KEY) {
            Some(Value::Str(tag)) => Ok(Self { tag, payload: map }),
            Some(other) => Err(CodecError::malformed(
                TYPE_KEY,
                format!("tag must be a string, got {}", other.type_description()),
            )),
            None => Err(CodecError::malformed(TYPE_KEY, "missing tag")),
        }
    }

    /// Flatten into a single map, tag first.
    pub fn into_map(self) -> Map {
        let mut map = IndexMap::with_capacity(self.payload.len() + 1);
        map.insert(TYPE_KEY.to_string(), Value::Str(self.tag));
        map.extend(self.payload);
        map
    }
}
