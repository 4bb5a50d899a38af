//! Trait for extracting concrete types from `Value` (owned).

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use super::{Complex, Map, NdArray, RecordValue, Scalar, Value, ValueSet};
use crate::error::TypeMismatch;
use crate::record::Record;

/// Extract a concrete type from a [`Value`].
///
/// Conversions are strict: an `Int` is not a `Float` and a `List` is not a
/// `Tuple`, except where noted.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, TypeMismatch>;
}

/// Identity impl
impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, TypeMismatch> {
        Ok(value)
    }
}

macro_rules! from_variant {
    ($($t:ty => $variant:ident as $expected:literal),* $(,)?) => {
        $(
            impl FromValue for $t {
                fn from_value(value: Value) -> Result<Self, TypeMismatch> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(TypeMismatch::new($expected, &other)),
                    }
                }
            }
        )*
    };
}

from_variant! {
    bool => Bool as "bool",
    i64 => Int as "int",
    f64 => Float as "float",
    String => Str as "str",
    Map => Map as "map",
    ValueSet => Set as "set",
    Complex => Complex as "complex",
    NaiveDate => Date as "date",
    NaiveTime => Time as "time",
    NaiveDateTime => DateTime as "datetime",
    DateTime<FixedOffset> => DateTimeTz as "datetime[tz]",
    NdArray => Array as "ndarray",
    Scalar => Scalar as "scalar",
    RecordValue => Record as "record",
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, TypeMismatch> {
        match value {
            Value::Int(i) => i32::try_from(i).map_err(|_| TypeMismatch {
                expected: "i32",
                got: format!("int {i}"),
            }),
            other => Err(TypeMismatch::new("i32", &other)),
        }
    }
}

/// Nullable: `Null` becomes `None`.
impl<V: FromValue> FromValue for Option<V> {
    fn from_value(value: Value) -> Result<Self, TypeMismatch> {
        match value {
            Value::Null => Ok(None),
            other => Ok(Some(V::from_value(other)?)),
        }
    }
}

/// Accepts both lists and tuples.
impl<V: FromValue> FromValue for Vec<V> {
    fn from_value(value: Value) -> Result<Self, TypeMismatch> {
        match value {
            Value::List(items) | Value::Tuple(items) => {
                items.into_iter().map(V::from_value).collect()
            }
            other => Err(TypeMismatch::new("list", &other)),
        }
    }
}

/// Owned copy of a nested record.
impl<T: Record + Clone> FromValue for Box<T> {
    fn from_value(value: Value) -> Result<Self, TypeMismatch> {
        match value {
            Value::Record(r) => match r.downcast_ref::<T>() {
                Some(record) => Ok(Box::new(record.clone())),
                None => Err(TypeMismatch {
                    expected: std::any::type_name::<T>(),
                    got: r.rust_type_name().to_string(),
                }),
            },
            other => Err(TypeMismatch::new(std::any::type_name::<T>(), &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_primitives() {
        assert_eq!(i64::from_value(Value::Int(4)), Ok(4));
        assert!(f64::from_value(Value::Int(4)).is_err());
        assert_eq!(String::from_value("a".into()), Ok("a".to_string()));
    }

    #[test]
    fn i32_range_checked() {
        assert_eq!(i32::from_value(Value::Int(-7)), Ok(-7));
        let err = i32::from_value(Value::Int(i64::MAX)).unwrap_err();
        assert_eq!(err.expected, "i32");
    }

    #[test]
    fn option_and_vec() {
        assert_eq!(Option::<i64>::from_value(Value::Null), Ok(None));
        assert_eq!(Option::<i64>::from_value(Value::Int(1)), Ok(Some(1)));
        let tuple = Value::tuple([Value::Int(1), Value::Int(2)]);
        assert_eq!(Vec::<i64>::from_value(tuple), Ok(vec![1, 2]));
        let err = Vec::<i64>::from_value(Value::List(vec![Value::Bool(true)])).unwrap_err();
        assert_eq!(err.got, "bool");
    }
}
