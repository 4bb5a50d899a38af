use indexmap::IndexMap;

use crate::envelope::RECORD_TAG;
use crate::error::CodecError;
use crate::value::{FromValue, Map, Value};

/// The attribute map of one record instance: what `default_encode` produces
/// and what constructors, builders and custom decoders consume.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Map);

impl Fields {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    /// Remove a required field and convert it.
    pub fn take<V: FromValue>(&mut self, name: &str) -> Result<V, CodecError> {
        let value = self
            .remove(name)
            .ok_or_else(|| CodecError::malformed(RECORD_TAG, format!("missing field `{name}`")))?;
        convert(name, value)
    }

    /// Remove an optional field and convert it. Absent and `Null` both give
    /// `None`.
    pub fn take_opt<V: FromValue>(&mut self, name: &str) -> Result<Option<V>, CodecError> {
        match self.remove(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => convert(name, value).map(Some),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_map(self) -> Map {
        self.0
    }
}

fn convert<V: FromValue>(name: &str, value: Value) -> Result<V, CodecError> {
    V::from_value(value)
        .map_err(|e| CodecError::malformed(RECORD_TAG, format!("field `{name}`: {e}")))
}

impl From<Map> for Fields {
    fn from(map: Map) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_converts_and_removes() {
        let mut fields = Fields::new().with("a", 1i64).with("b", "x");
        assert_eq!(fields.take::<i64>("a").unwrap(), 1);
        assert!(!fields.contains("a"));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn take_missing_is_malformed() {
        let mut fields = Fields::new();
        let err = fields.take::<i64>("a").unwrap_err();
        assert_eq!(err.to_string(), "malformed `record` envelope: missing field `a`");
    }

    #[test]
    fn take_wrong_shape_is_malformed() {
        let mut fields = Fields::new().with("a", "text");
        let err = fields.take::<i64>("a").unwrap_err();
        assert!(err.to_string().contains("field `a`: type error: expected int, got str"));
    }

    #[test]
    fn take_opt_treats_null_as_absent() {
        let mut fields = Fields::new().with("child", Value::Null);
        assert_eq!(fields.take_opt::<i64>("child").unwrap(), None);
        assert_eq!(fields.take_opt::<i64>("other").unwrap(), None);
    }
}
