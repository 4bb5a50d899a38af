//! Codec dispatch and the public registry facade.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::codec::{Codec, ContainerCodec, NumericCodec, Precedence, RecordCodec, TemporalCodec};
use crate::envelope::{Envelope, TYPE_KEY};
use crate::error::{CodecError, RegistrationError};
use crate::format::{self, Format, Json};
use crate::record::{DeclaredRecord, RecordType, RecordTypeRegistry};
use crate::value::{Map, Value};
use crate::wire::Wire;

// ─── Codec registry ───

#[derive(Default)]
struct Snapshot {
    /// Sorted by precedence class, then registration order.
    ordered: Vec<(Precedence, Arc<dyn Codec>)>,
    by_tag: HashMap<String, Arc<dyn Codec>>,
}

/// Ordered set of codecs with disjoint tags.
///
/// Lookups read an immutable snapshot without locking; registration takes a
/// mutex, builds the next snapshot and publishes it.
pub struct CodecRegistry {
    snapshot: ArcSwap<Snapshot>,
    write: Mutex<()>,
    frozen: AtomicBool,
}

impl CodecRegistry {
    /// A registry with no codecs at all.
    pub fn empty() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
            write: Mutex::new(()),
            frozen: AtomicBool::new(false),
        }
    }

    /// The built-in codecs, with a record codec over an empty record type
    /// registry.
    pub fn with_builtins() -> Self {
        Self::with_record_types(Arc::new(RecordTypeRegistry::new()))
    }

    /// The built-in codecs, with a record codec over `types`.
    pub fn with_record_types(types: Arc<RecordTypeRegistry>) -> Self {
        let registry = Self::empty();
        let builtins: [Arc<dyn Codec>; 4] = [
            Arc::new(ContainerCodec),
            Arc::new(TemporalCodec),
            Arc::new(NumericCodec),
            Arc::new(RecordCodec::new(types)),
        ];
        for codec in builtins {
            // Built-in tags are disjoint and the registry is fresh.
            if let Err(e) = registry.register_arc(codec) {
                tracing::error!("built-in codec rejected: {e}");
            }
        }
        registry
    }

    pub fn register<C: Codec>(&self, codec: C) -> Result<(), RegistrationError> {
        self.register_arc(Arc::new(codec))
    }

    /// Add `codec`. Fails without touching the registry if any of its tags is
    /// already claimed, or after [`freeze`](Self::freeze).
    pub fn register_arc(&self, codec: Arc<dyn Codec>) -> Result<(), RegistrationError> {
        let _guard = self.write.lock();
        if self.frozen.load(Ordering::Acquire) {
            return Err(RegistrationError::Frozen(codec.name().to_string()));
        }

        let current = self.snapshot.load();
        let mut by_tag = current.by_tag.clone();
        for tag in codec.tags() {
            if let Some(owner) = by_tag.get(*tag) {
                return Err(RegistrationError::DuplicateTag {
                    tag: tag.to_string(),
                    owner: owner.name().to_string(),
                });
            }
            by_tag.insert(tag.to_string(), codec.clone());
        }

        let precedence = codec.precedence();
        let mut ordered = current.ordered.clone();
        let position = ordered.partition_point(|(p, _)| *p <= precedence);
        ordered.insert(position, (precedence, codec.clone()));
        self.snapshot.store(Arc::new(Snapshot { ordered, by_tag }));

        tracing::debug!(
            codec = codec.name(),
            tags = ?codec.tags(),
            ?precedence,
            "registered codec"
        );
        Ok(())
    }

    /// First codec, in precedence order, whose predicate claims `value`.
    pub fn find_by_value(&self, value: &Value) -> Option<Arc<dyn Codec>> {
        self.snapshot
            .load()
            .ordered
            .iter()
            .find(|(_, codec)| codec.claims(value))
            .map(|(_, codec)| codec.clone())
    }

    pub fn find_by_tag(&self, tag: &str) -> Option<Arc<dyn Codec>> {
        self.snapshot.load().by_tag.get(tag).cloned()
    }

    /// Encode hook for every value the bulk encoder cannot carry.
    pub fn default_hook(&self, value: &Value) -> Result<Envelope, CodecError> {
        let Some(codec) = self.find_by_value(value) else {
            return Err(CodecError::unsupported(value.type_description()));
        };
        tracing::trace!(codec = codec.name(), value = %value.type_description(), "encoding");
        match codec.encode(value)? {
            Some(envelope) if envelope.get(TYPE_KEY).is_some() => {
                Err(CodecError::ReservedPayloadKey {
                    codec: codec.name().to_string(),
                })
            }
            Some(envelope) => Ok(envelope),
            None => {
                tracing::warn!(
                    codec = codec.name(),
                    value = %value.type_description(),
                    "codec claimed a value but declined to encode it"
                );
                Err(CodecError::unsupported(value.type_description()))
            }
        }
    }

    /// Decode hook for every map, after its entries are decoded. Maps without
    /// `__type__` pass through.
    pub fn object_hook(&self, map: Map) -> Result<Value, CodecError> {
        if !map.contains_key(TYPE_KEY) {
            return Ok(Value::Map(map));
        }
        let envelope = Envelope::from_map(map)?;
        let Some(codec) = self.find_by_tag(envelope.tag()) else {
            return Err(CodecError::UnknownTag(envelope.tag().to_string()));
        };
        tracing::trace!(codec = codec.name(), tag = envelope.tag(), "decoding");
        codec.decode(envelope)
    }

    /// Every claimed tag, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.snapshot.load().by_tag.keys().cloned().collect();
        tags.sort();
        tags
    }

    /// Codec names in encode lookup order.
    pub fn names(&self) -> Vec<String> {
        self.snapshot
            .load()
            .ordered
            .iter()
            .map(|(_, codec)| codec.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn freeze(&self) {
        let _guard = self.write.lock();
        self.frozen.store(true, Ordering::Release);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ─── Registry ───

/// Codecs plus record types: everything `dumps`/`loads` need.
///
/// ```rust,ignore
/// let registry = Registry::new();
/// registry.register_record::<Node>()?;
/// registry.freeze();
///
/// let text = registry.to_json(&Value::record(node))?;
/// let back = registry.from_json(&text)?;
/// ```
pub struct Registry {
    codecs: CodecRegistry,
    records: Arc<RecordTypeRegistry>,
}

impl Registry {
    /// A registry holding the built-in codecs and no record types.
    pub fn new() -> Self {
        let records = Arc::new(RecordTypeRegistry::new());
        Self {
            codecs: CodecRegistry::with_record_types(records.clone()),
            records,
        }
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub fn records(&self) -> &RecordTypeRegistry {
        &self.records
    }

    pub fn register_codec<C: Codec>(&self, codec: C) -> Result<(), RegistrationError> {
        self.codecs.register(codec)
    }

    /// Register `record_type` under `name`, overriding the name it was built
    /// with.
    pub fn register_record_type(
        &self,
        name: impl Into<String>,
        record_type: RecordType,
    ) -> Result<(), RegistrationError> {
        self.records.register(record_type.with_name(name))
    }

    pub fn register_record<T: DeclaredRecord>(&self) -> Result<(), RegistrationError> {
        self.records.register(T::record_type()?)
    }

    /// End the registration phase for both codecs and record types.
    pub fn freeze(&self) {
        self.codecs.freeze();
        self.records.freeze();
        tracing::debug!(
            codecs = self.codecs.len(),
            records = self.records.len(),
            "registry frozen"
        );
    }

    pub fn is_frozen(&self) -> bool {
        self.codecs.is_frozen() && self.records.is_frozen()
    }

    pub fn default_hook(&self, value: &Value) -> Result<Envelope, CodecError> {
        self.codecs.default_hook(value)
    }

    pub fn object_hook(&self, map: Map) -> Result<Value, CodecError> {
        self.codecs.object_hook(map)
    }

    pub fn to_wire(&self, value: &Value) -> Result<Wire, CodecError> {
        format::to_wire(&self.codecs, value)
    }

    pub fn from_wire(&self, wire: Wire) -> Result<Value, CodecError> {
        format::from_wire(&self.codecs, wire)
    }

    pub fn dumps<F: Format>(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let wire = self.to_wire(value)?;
        tracing::trace!(format = F::NAME, nodes = wire.node_count(), "writing");
        F::write(&wire)
    }

    pub fn loads<F: Format>(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        let wire = F::read(bytes)?;
        tracing::trace!(format = F::NAME, nodes = wire.node_count(), "read");
        self.from_wire(wire)
    }

    /// Encode `value` straight into `writer`.
    pub fn dump<F: Format, W: io::Write>(
        &self,
        value: &Value,
        writer: W,
    ) -> Result<(), CodecError> {
        let wire = self.to_wire(value)?;
        tracing::trace!(format = F::NAME, nodes = wire.node_count(), "writing");
        F::write_to(&wire, writer)
    }

    /// Decode one document read from `reader`.
    pub fn load<F: Format, R: io::Read>(&self, reader: R) -> Result<Value, CodecError> {
        let wire = F::read_from(reader)?;
        tracing::trace!(format = F::NAME, nodes = wire.node_count(), "read");
        self.from_wire(wire)
    }

    pub fn to_json(&self, value: &Value) -> Result<String, CodecError> {
        let wire = self.to_wire(value)?;
        format::ensure_finite(&wire)?;
        Ok(serde_json::to_string(&wire)?)
    }

    pub fn to_json_pretty(&self, value: &Value) -> Result<String, CodecError> {
        let wire = self.to_wire(value)?;
        format::ensure_finite(&wire)?;
        Ok(serde_json::to_string_pretty(&wire)?)
    }

    pub fn from_json(&self, text: &str) -> Result<Value, CodecError> {
        self.loads::<Json>(text.as_bytes())
    }

    #[cfg(feature = "msgpack")]
    pub fn to_msgpack(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        self.dumps::<format::MsgPack>(value)
    }

    #[cfg(feature = "msgpack")]
    pub fn from_msgpack(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        self.loads::<format::MsgPack>(bytes)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::TUPLE_TAG;

    /// Claims every tuple, under its own tag.
    struct PairCodec {
        tag: &'static [&'static str],
        precedence: Precedence,
        encodes: bool,
    }

    impl PairCodec {
        fn new(tag: &'static [&'static str], precedence: Precedence) -> Self {
            Self {
                tag,
                precedence,
                encodes: true,
            }
        }
    }

    impl Codec for PairCodec {
        fn name(&self) -> &str {
            self.tag[0]
        }

        fn tags(&self) -> &[&str] {
            self.tag
        }

        fn precedence(&self) -> Precedence {
            self.precedence
        }

        fn claims(&self, value: &Value) -> bool {
            matches!(value, Value::Tuple(_))
        }

        fn encode(&self, _value: &Value) -> Result<Option<Envelope>, CodecError> {
            Ok(self.encodes.then(|| Envelope::new(self.tag[0])))
        }

        fn decode(&self, _envelope: Envelope) -> Result<Value, CodecError> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn builtins_cover_every_tag() {
        let codecs = CodecRegistry::with_builtins();
        assert_eq!(codecs.len(), 4);
        assert_eq!(
            codecs.tags(),
            vec![
                "complex", "date", "datetime", "ndarray", "npgeneric", "record", "set", "time",
                "tuple"
            ]
        );
        assert_eq!(codecs.names().last().map(String::as_str), Some("record"));
    }

    #[test]
    fn duplicate_tag_leaves_registry_unchanged() {
        let codecs = CodecRegistry::with_builtins();
        let err = codecs
            .register(PairCodec::new(&["pair", TUPLE_TAG], Precedence::Exact))
            .unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateTag {
                tag: "tuple".into(),
                owner: "containers".into()
            }
        );
        assert_eq!(codecs.len(), 4);
        assert!(codecs.find_by_tag("pair").is_none());
    }

    #[test]
    fn earlier_registration_wins_within_a_class() {
        let codecs = CodecRegistry::empty();
        codecs.register(PairCodec::new(&["first"], Precedence::Structural)).unwrap();
        codecs.register(PairCodec::new(&["second"], Precedence::Structural)).unwrap();
        let found = codecs.find_by_value(&Value::tuple([])).unwrap();
        assert_eq!(found.name(), "first");
    }

    #[test]
    fn more_specific_class_wins_regardless_of_order() {
        let codecs = CodecRegistry::empty();
        codecs.register(PairCodec::new(&["generic"], Precedence::Generic)).unwrap();
        codecs.register(PairCodec::new(&["exact"], Precedence::Exact)).unwrap();
        let found = codecs.find_by_value(&Value::tuple([])).unwrap();
        assert_eq!(found.name(), "exact");
        assert_eq!(codecs.names(), vec!["exact", "generic"]);
    }

    #[test]
    fn declining_codec_is_unsupported() {
        let codecs = CodecRegistry::empty();
        let mut codec = PairCodec::new(&["lazy"], Precedence::Exact);
        codec.encodes = false;
        codecs.register(codec).unwrap();
        let err = codecs.default_hook(&Value::tuple([])).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedType { type_name } if type_name == "tuple"));
    }

    #[test]
    fn codec_writing_the_type_key_fails_to_encode() {
        struct Forging;

        impl Codec for Forging {
            fn name(&self) -> &str {
                "forging"
            }

            fn tags(&self) -> &[&str] {
                &["forged"]
            }

            fn claims(&self, value: &Value) -> bool {
                matches!(value, Value::Tuple(_))
            }

            fn encode(&self, _value: &Value) -> Result<Option<Envelope>, CodecError> {
                Ok(Some(Envelope::new("forged").with(TYPE_KEY, "tuple")))
            }

            fn decode(&self, _envelope: Envelope) -> Result<Value, CodecError> {
                Ok(Value::Null)
            }
        }

        let codecs = CodecRegistry::empty();
        codecs.register(Forging).unwrap();
        let err = codecs.default_hook(&Value::tuple([])).unwrap_err();
        assert!(matches!(err, CodecError::ReservedPayloadKey { codec } if codec == "forging"));
    }

    #[test]
    fn frozen_registry_rejects_codecs() {
        let registry = Registry::new();
        registry.freeze();
        assert!(registry.is_frozen());
        let err = registry
            .register_codec(PairCodec::new(&["late"], Precedence::Exact))
            .unwrap_err();
        assert_eq!(err, RegistrationError::Frozen("late".into()));
    }

    #[test]
    fn json_round_trip_through_facade() {
        let registry = Registry::new();
        let value = Value::set([Value::Int(1), Value::from("two")]);
        let text = registry.to_json(&value).unwrap();
        assert!(text.starts_with(r#"{"__type__":"set","data":["#));
        assert_eq!(registry.from_json(&text).unwrap(), value);
    }
}
