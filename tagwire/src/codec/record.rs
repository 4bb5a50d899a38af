use std::sync::Arc;

use super::{Codec, Precedence};
use crate::envelope::{CLASS_KEY, Envelope, RECORD_TAG, is_reserved_key};
use crate::error::CodecError;
use crate::record::{Fields, RecordTypeRegistry};
use crate::value::{RecordValue, Value};

/// Instances of registered record types.
///
/// Encodes as `{"__type__": "record", "__class__": <declared name>, ...attributes}`.
/// Claims nothing but records whose Rust type is registered, so an
/// unregistered record falls through to `UnsupportedType`.
pub struct RecordCodec {
    types: Arc<RecordTypeRegistry>,
}

impl RecordCodec {
    pub fn new(types: Arc<RecordTypeRegistry>) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &RecordTypeRegistry {
        &self.types
    }
}

impl Codec for RecordCodec {
    fn name(&self) -> &str {
        "record"
    }

    fn tags(&self) -> &[&str] {
        &[RECORD_TAG]
    }

    fn precedence(&self) -> Precedence {
        Precedence::Generic
    }

    fn claims(&self, value: &Value) -> bool {
        value
            .as_record()
            .is_some_and(|r| self.types.by_type(r.rust_type()).is_some())
    }

    fn encode(&self, value: &Value) -> Result<Option<Envelope>, CodecError> {
        let Some(record) = value.as_record() else {
            return Ok(None);
        };
        let Some(record_type) = self.types.by_type(record.rust_type()) else {
            return Ok(None);
        };

        let fields = record_type.encode(record.as_record())?;
        let mut envelope = Envelope::new(RECORD_TAG).with(CLASS_KEY, record_type.name());
        for (name, value) in fields {
            if is_reserved_key(&name) {
                tracing::warn!(
                    record = record_type.name(),
                    attribute = %name,
                    "dropping attribute with a reserved name"
                );
                continue;
            }
            envelope.insert(name, value);
        }
        Ok(Some(envelope))
    }

    fn decode(&self, mut envelope: Envelope) -> Result<Value, CodecError> {
        let name: String = envelope.take_as(CLASS_KEY)?;
        let record_type = self
            .types
            .by_name(&name)
            .ok_or(CodecError::UnknownRecordType(name))?;

        let fields: Fields = envelope
            .into_payload()
            .into_iter()
            .filter(|(key, _)| !is_reserved_key(key))
            .collect();
        let record = record_type.decode(fields)?;
        Ok(Value::Record(RecordValue::from_box(record)))
    }
}
