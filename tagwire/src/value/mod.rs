//! The in-memory value model.
//!
//! [`Value`] is what the codecs see: a handful of shapes the bulk encoders can
//! represent natively (null, bool, int, float, string, list, map) plus the
//! richer shapes that need a codec to get onto the wire.

mod from_value;
mod numeric;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;

use crate::record::{AnyRecord, Record};

pub use from_value::FromValue;
pub use numeric::{DType, Element, NdArray, Scalar};
pub(crate) use numeric::{ByteOrder, to_little_endian};

/// String-keyed map preserving insertion order.
pub type Map = IndexMap<String, Value>;

/// A dynamically-typed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    // Natively representable
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(Map),

    // Codec-handled
    Tuple(Vec<Value>),
    Set(ValueSet),
    Complex(Complex),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeTz(DateTime<FixedOffset>),
    Array(NdArray),
    Scalar(Scalar),
    Record(RecordValue),

    // Host values only a user-registered codec can handle
    Opaque(Opaque),
}

impl Value {
    /// Wrap a record instance.
    pub fn record<T: Record>(record: T) -> Self {
        Value::Record(RecordValue::new(record))
    }

    /// Wrap an arbitrary host value.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Opaque::new(value))
    }

    pub fn tuple(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Tuple(items.into_iter().collect())
    }

    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Set(items.into_iter().collect())
    }

    /// True for shapes the bulk encoder can carry without a codec.
    pub fn is_native(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Bool(_)
                | Value::Int(_)
                | Value::Float(_)
                | Value::Str(_)
                | Value::List(_)
                | Value::Map(_)
        )
    }

    /// Runtime type description used in error messages, e.g. `int`,
    /// `ndarray<f4>`, or the Rust type name of a record.
    pub fn type_description(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Bool(_) => "bool".into(),
            Value::Int(_) => "int".into(),
            Value::Float(_) => "float".into(),
            Value::Str(_) => "str".into(),
            Value::List(_) => "list".into(),
            Value::Map(_) => "map".into(),
            Value::Tuple(_) => "tuple".into(),
            Value::Set(_) => "set".into(),
            Value::Complex(_) => "complex".into(),
            Value::Date(_) => "date".into(),
            Value::Time(_) => "time".into(),
            Value::DateTime(_) => "datetime".into(),
            Value::DateTimeTz(_) => "datetime[tz]".into(),
            Value::Array(a) => format!("ndarray<{}>", a.dtype().name()),
            Value::Scalar(s) => format!("scalar<{}>", s.dtype().name()),
            Value::Record(r) => r.rust_type_name().to_string(),
            Value::Opaque(o) => o.type_name().to_string(),
        }
    }

    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Extract a concrete type, consuming the value.
    pub fn get<V: FromValue>(self) -> Result<V, crate::TypeMismatch> {
        V::from_value(self)
    }
}

// ─── Set ───

/// Unordered collection of unique values.
///
/// `Value` holds floats, so there is no `Hash`/`Ord` to lean on; uniqueness is
/// checked with `PartialEq` and equality ignores order. Scalar members (null,
/// bool, int, float, string) are indexed by a hash of their content, so a set
/// of scalars builds in linear time. Any other member is compared against
/// every non-scalar member already present, which is quadratic in their count.
#[derive(Debug, Clone, Default)]
pub struct ValueSet {
    items: Vec<Value>,
    scalars: HashMap<u64, Vec<usize>>,
    composites: Vec<usize>,
}

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value`, returning false if an equal value was already present.
    pub fn insert(&mut self, value: Value) -> bool {
        if self.contains(&value) {
            return false;
        }
        let slot = self.items.len();
        match scalar_fingerprint(&value) {
            Some(hash) => self.scalars.entry(hash).or_default().push(slot),
            None => self.composites.push(slot),
        }
        self.items.push(value);
        true
    }

    pub fn contains(&self, value: &Value) -> bool {
        let candidates: &[usize] = match scalar_fingerprint(value) {
            Some(hash) => self.scalars.get(&hash).map_or(&[][..], Vec::as_slice),
            None => &self.composites,
        };
        candidates.iter().any(|&slot| self.items[slot] == *value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.items
    }
}

/// Content hash for the variants with a total, cheap equality. Equal values
/// always hash alike: `0.0 == -0.0`, and NaN never equals anything.
fn scalar_fingerprint(value: &Value) -> Option<u64> {
    let mut hasher = DefaultHasher::new();
    std::mem::discriminant(value).hash(&mut hasher);
    match value {
        Value::Null => {}
        Value::Bool(b) => b.hash(&mut hasher),
        Value::Int(i) => i.hash(&mut hasher),
        Value::Float(f) if *f == 0.0 => 0u64.hash(&mut hasher),
        Value::Float(f) => f.to_bits().hash(&mut hasher),
        Value::Str(s) => s.hash(&mut hasher),
        _ => return None,
    }
    Some(hasher.finish())
}

impl PartialEq for ValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl FromIterator<Value> for ValueSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut set = ValueSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl IntoIterator for ValueSet {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

// ─── Complex ───

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

// ─── Records ───

/// A shared, immutable record instance.
#[derive(Clone)]
pub struct RecordValue(Arc<dyn Record>);

impl RecordValue {
    pub fn new<T: Record>(record: T) -> Self {
        Self(Arc::new(record))
    }

    pub(crate) fn from_box(record: Box<dyn Record>) -> Self {
        Self(Arc::from(record))
    }

    pub fn as_record(&self) -> &dyn Record {
        &*self.0
    }

    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        AnyRecord::as_any(&*self.0).downcast_ref::<T>()
    }

    pub fn rust_type(&self) -> std::any::TypeId {
        Any::type_id(AnyRecord::as_any(&*self.0))
    }

    pub fn rust_type_name(&self) -> &'static str {
        AnyRecord::rust_type_name(&*self.0)
    }

    /// Read an attribute through the record's own accessor.
    pub fn attribute(&self, name: &str) -> Option<Value> {
        self.0.attribute(name)
    }
}

impl fmt::Debug for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl PartialEq for RecordValue {
    fn eq(&self, other: &Self) -> bool {
        AnyRecord::dyn_eq(&*self.0, AnyRecord::as_any(&*other.0))
    }
}

// ─── Opaque host values ───

/// A host value with no built-in wire shape. Compares by identity.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.type_name)
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// ─── Into Value ───

macro_rules! value_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i64 => Int,
    f64 => Float,
    String => Str,
    Vec<Value> => List,
    Map => Map,
    ValueSet => Set,
    Complex => Complex,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => DateTimeTz,
    NdArray => Array,
    Scalar => Scalar,
    RecordValue => Record,
    Opaque => Opaque,
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v.into())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Record> From<Box<T>> for Value {
    fn from(v: Box<T>) -> Self {
        Value::Record(RecordValue::new(*v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_ignores_duplicates_and_order() {
        let a = ValueSet::from_iter([Value::Int(1), Value::Int(2), Value::Int(1)]);
        let b = ValueSet::from_iter([Value::Int(2), Value::Int(1)]);
        assert_eq!(a.len(), 2);
        assert_eq!(a, b);
        assert_ne!(a, ValueSet::from_iter([Value::Int(2)]));
    }

    #[test]
    fn set_membership_across_scalars_and_composites() {
        let mut set = ValueSet::new();
        for i in 0..1_000i64 {
            assert!(set.insert(Value::Int(i)));
        }
        assert!(!set.insert(Value::Int(999)));
        assert!(set.insert(Value::Float(999.0)));
        assert!(set.insert(Value::Float(0.0)));
        assert!(!set.insert(Value::Float(-0.0)));
        assert!(set.insert(Value::Float(f64::NAN)));
        assert!(set.insert(Value::Float(f64::NAN)));
        assert!(set.insert(Value::tuple([Value::Int(1)])));
        assert!(!set.insert(Value::tuple([Value::Int(1)])));
        assert!(set.contains(&Value::tuple([Value::Int(1)])));
        assert!(!set.contains(&Value::from("1")));
        assert_eq!(set.len(), 1_005);
    }

    #[test]
    fn native_shapes() {
        assert!(Value::Null.is_native());
        assert!(Value::List(vec![Value::tuple([])]).is_native());
        assert!(!Value::tuple([Value::Int(1)]).is_native());
        assert!(!Value::Complex(Complex::new(1.0, 0.0)).is_native());
    }

    #[test]
    fn opaque_compares_by_identity() {
        let a = Opaque::new(5u8);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Opaque::new(5u8));
        assert_eq!(a.downcast_ref::<u8>(), Some(&5));
        assert_eq!(Value::Opaque(a).type_description(), "u8");
    }

    #[test]
    fn option_into_value() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3i64)), Value::Int(3));
    }

    #[test]
    fn type_descriptions() {
        assert_eq!(Value::from(1.5).type_description(), "float");
        let array = NdArray::from_vec(vec![1.0f32, 2.0]);
        assert_eq!(Value::from(array).type_description(), "ndarray<f4>");
    }
}
