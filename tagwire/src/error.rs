/// Errors raised while encoding or decoding a value.
///
/// Nothing is recovered locally: every codec or registry failure propagates
/// unchanged to the top-level `dumps`/`loads` call.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Encode: no codec claims the value.
    #[error("unable to serialise value of type {type_name}")]
    UnsupportedType { type_name: String },

    /// Decode: the `__class__` name is not in the record type registry.
    #[error("no record type registered for `{0}`")]
    UnknownRecordType(String),

    /// Decode: no codec claims the `__type__` tag.
    #[error("no codec claims tag `{0}`")]
    UnknownTag(String),

    /// Decode: required payload missing or of the wrong shape.
    #[error("malformed `{tag}` envelope: {reason}")]
    MalformedEnvelope { tag: String, reason: String },

    /// Encode: a codec put `__type__` into its own payload.
    #[error("codec `{codec}` wrote the reserved `__type__` key into its payload")]
    ReservedPayloadKey { codec: String },

    /// Encode: JSON has no representation for NaN or the infinities.
    #[error("non-finite float {0} cannot be written as JSON")]
    NonFiniteFloat(f64),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "msgpack")]
    #[error("MessagePack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    #[cfg(feature = "msgpack")]
    #[error("MessagePack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),
}

impl CodecError {
    pub fn unsupported(type_name: impl Into<String>) -> Self {
        CodecError::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    pub fn malformed(tag: impl Into<String>, reason: impl Into<String>) -> Self {
        CodecError::MalformedEnvelope {
            tag: tag.into(),
            reason: reason.into(),
        }
    }

    /// A record was asked to take an attribute it has no slot for.
    pub fn no_such_attribute(record: &str, attribute: &str) -> Self {
        Self::malformed(
            crate::envelope::RECORD_TAG,
            format!("`{record}` has no attribute `{attribute}`"),
        )
    }
}

/// Errors raised during the registration phase. All of them are fatal: the
/// registry is left exactly as it was before the failing call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("tag `{tag}` is already claimed by codec `{owner}`")]
    DuplicateTag { tag: String, owner: String },

    #[error("a record type named `{0}` is already registered")]
    DuplicateRecordName(String),

    #[error("rust type `{rust_type}` is already registered as record `{name}`")]
    DuplicateRecordImpl {
        rust_type: &'static str,
        name: String,
    },

    #[error("invalid record type `{name}`: {reason}")]
    InvalidRecordType { name: String, reason: String },

    #[error("registry is frozen; cannot register `{0}`")]
    Frozen(String),
}

/// A `FromValue` conversion found a different shape than it expected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("type error: expected {expected}, got {got}")]
pub struct TypeMismatch {
    pub expected: &'static str,
    pub got: String,
}

impl TypeMismatch {
    pub fn new(expected: &'static str, got: &crate::Value) -> Self {
        TypeMismatch {
            expected,
            got: got.type_description(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn unsupported_names_the_type() {
        let err = CodecError::unsupported("my_crate::Widget");
        assert_eq!(
            err.to_string(),
            "unable to serialise value of type my_crate::Widget"
        );
    }

    #[test]
    fn malformed_mentions_tag_and_reason() {
        let err = CodecError::malformed("ndarray", "missing `data`");
        assert_eq!(err.to_string(), "malformed `ndarray` envelope: missing `data`");
    }

    #[test]
    fn type_mismatch_describes_the_value() {
        let err = TypeMismatch::new("float", &Value::Str("x".into()));
        assert_eq!(err.to_string(), "type error: expected float, got str");
    }
}
