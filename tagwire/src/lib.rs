//! # tagwire
//!
//! Serializes rich value trees (tuples, sets, complex numbers, dates and
//! times, numeric arrays, user-defined records) to JSON and MessagePack and
//! back, losslessly.
//!
//! Values the bulk formats cannot carry are rewritten as *envelopes*: maps
//! with a reserved `__type__` tag whose remaining keys belong to the codec
//! that owns the tag. Records additionally name their declared type under
//! `__class__`, which is resolved through an explicit registry and nothing
//! else.
//!
//! ```rust,ignore
//! use tagwire_core::{Value, json};
//!
//! let value = Value::tuple([Value::Int(1), Value::from("a")]);
//! let text = json::dumps(&value)?;
//! assert_eq!(text, r#"{"__type__":"tuple","data":[1,"a"]}"#);
//! assert_eq!(json::loads(&text)?, value);
//! ```

pub mod codec;
pub mod envelope;
pub mod error;
pub mod format;
pub mod record;
pub mod registry;
pub mod value;
pub mod wire;

use std::sync::OnceLock;

pub use codec::{Codec, Precedence};
pub use envelope::Envelope;
pub use error::{CodecError, RegistrationError, TypeMismatch};
#[cfg(feature = "msgpack")]
pub use format::MsgPack;
pub use format::{Format, Json};
pub use record::{AttributeKind, DeclaredRecord, Fields, Record, RecordType, RecordTypeBuilder};
pub use registry::{CodecRegistry, Registry};
pub use value::{Complex, DType, FromValue, Map, NdArray, Scalar, Value, ValueSet};
pub use wire::Wire;

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry, created with the built-in codecs on first use.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::new)
}

/// Add a codec to the process-wide registry.
pub fn register_codec<C: Codec>(codec: C) -> Result<(), RegistrationError> {
    global().register_codec(codec)
}

/// Add a record type to the process-wide registry under `name`.
pub fn register_record_type(
    name: impl Into<String>,
    record_type: RecordType,
) -> Result<(), RegistrationError> {
    global().register_record_type(name, record_type)
}

/// Add a self-describing record type to the process-wide registry.
pub fn register_record<T: DeclaredRecord>() -> Result<(), RegistrationError> {
    global().register_record::<T>()
}

/// End the registration phase of the process-wide registry.
pub fn freeze() {
    global().freeze();
}

/// JSON against the process-wide registry.
pub mod json {
    use std::io;

    use crate::format::Json;
    use crate::{CodecError, Value, global};

    pub fn dumps(value: &Value) -> Result<String, CodecError> {
        global().to_json(value)
    }

    pub fn dumps_pretty(value: &Value) -> Result<String, CodecError> {
        global().to_json_pretty(value)
    }

    pub fn loads(text: &str) -> Result<Value, CodecError> {
        global().from_json(text)
    }

    pub fn dump<W: io::Write>(value: &Value, writer: W) -> Result<(), CodecError> {
        global().dump::<Json, W>(value, writer)
    }

    pub fn load<R: io::Read>(reader: R) -> Result<Value, CodecError> {
        global().load::<Json, R>(reader)
    }
}

/// MessagePack against the process-wide registry.
#[cfg(feature = "msgpack")]
pub mod msgpack {
    use std::io;

    use crate::format::MsgPack;
    use crate::{CodecError, Value, global};

    pub fn dumps(value: &Value) -> Result<Vec<u8>, CodecError> {
        global().to_msgpack(value)
    }

    pub fn loads(bytes: &[u8]) -> Result<Value, CodecError> {
        global().from_msgpack(bytes)
    }

    pub fn dump<W: io::Write>(value: &Value, writer: W) -> Result<(), CodecError> {
        global().dump::<MsgPack, W>(value, writer)
    }

    pub fn load<R: io::Read>(reader: R) -> Result<Value, CodecError> {
        global().load::<MsgPack, R>(reader)
    }
}
