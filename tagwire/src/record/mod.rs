//! The record capability: how user-defined types take part in serialization.
//!
//! A record type declares its attributes once, in a [`RecordType`]
//! descriptor, instead of being introspected on every encode. The descriptor
//! decides which attributes go on the wire and how an instance is rebuilt:
//!
//! - [`constructor`](RecordTypeBuilder::constructor): call the constructor with
//!   the envelope keys matching its parameters, then assign every remaining
//!   attribute directly. After reconstruction each serialized attribute holds
//!   its serialized value, whatever the constructor did with its arguments.
//! - [`from_fields`](RecordTypeBuilder::from_fields): build from the whole
//!   field map in one step. Prefer this for types whose constructor derives
//!   state from its arguments; phase two would silently overwrite it.
//! - [`custom`](RecordTypeBuilder::custom): replace both encode and decode.

mod fields;
pub mod registry;

use std::any::{Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::envelope::is_reserved_key;
use crate::error::{CodecError, RegistrationError};
use crate::value::Value;

pub use fields::Fields;
pub use registry::RecordTypeRegistry;

/// Object-safe access to the concrete type behind a `dyn Record`.
/// Implemented for every eligible type; never implement it by hand.
pub trait AnyRecord: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn rust_type_name(&self) -> &'static str;
    fn dyn_eq(&self, other: &dyn Any) -> bool;
}

impl<T: Any + Send + Sync + PartialEq> AnyRecord for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn rust_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }
}

/// A user-defined type that can be serialized attribute by attribute.
///
/// ```rust,ignore
/// #[derive(Debug, Clone, PartialEq)]
/// struct Point { x: i64, y: i64 }
///
/// impl Record for Point {
///     fn attribute(&self, name: &str) -> Option<Value> {
///         match name {
///             "x" => Some(self.x.into()),
///             "y" => Some(self.y.into()),
///             _ => None,
///         }
///     }
///
///     fn set_attribute(&mut self, name: &str, value: Value) -> Result<(), CodecError> {
///         let mut fields = Fields::new().with(name, value);
///         match name {
///             "x" => self.x = fields.take(name)?,
///             "y" => self.y = fields.take(name)?,
///             _ => return Err(CodecError::no_such_attribute("Point", name)),
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Record: AnyRecord + fmt::Debug {
    /// Read an attribute. `None` means the instance does not carry it.
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Assign an attribute directly, bypassing construction.
    fn set_attribute(&mut self, name: &str, value: Value) -> Result<(), CodecError>;
}

/// A record type that knows its own descriptor.
pub trait DeclaredRecord: Record + Sized {
    fn record_type() -> Result<RecordType, RegistrationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// Plain stored state; serialized by default.
    Stored,
    /// Derived accessor; skipped unless included.
    Computed,
    /// Callable member; skipped unless included.
    Method,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDecl {
    pub name: String,
    pub kind: AttributeKind,
}

/// Names with a leading underscore or a `__` are internal storage.
pub fn is_internal_name(name: &str) -> bool {
    name.starts_with('_') || name.contains("__")
}

type EncodeFn = Arc<dyn Fn(&dyn Record) -> Result<Fields, CodecError> + Send + Sync>;
type BuildFn = Arc<dyn Fn(Fields) -> Result<Box<dyn Record>, CodecError> + Send + Sync>;
type ConstructFn = Arc<dyn Fn(&mut Fields) -> Result<Box<dyn Record>, CodecError> + Send + Sync>;

#[derive(Clone)]
enum Reconstruct {
    Construct {
        params: Vec<String>,
        construct: ConstructFn,
    },
    Build(BuildFn),
}

/// Descriptor of one registered record type.
#[derive(Clone)]
pub struct RecordType {
    name: String,
    rust_type: TypeId,
    rust_type_name: &'static str,
    exposed: Vec<String>,
    // Keys phase two never assigns: exclusions not overridden by an
    // inclusion, plus computed and method attributes.
    not_assigned: HashSet<String>,
    encode: Option<EncodeFn>,
    reconstruct: Reconstruct,
}

impl RecordType {
    /// Start a descriptor for `T` under the declared `name`.
    pub fn builder<T: Record>(name: impl Into<String>) -> RecordTypeBuilder<T> {
        RecordTypeBuilder::new(name.into())
    }

    /// Start a descriptor for `T` named after the type itself
    /// (`crate::shapes::Point<f64>` → `Point`).
    pub fn for_type<T: Record>() -> RecordTypeBuilder<T> {
        RecordTypeBuilder::new(short_type_name(std::any::type_name::<T>()).to_string())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same descriptor under another declared name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn rust_type(&self) -> TypeId {
        self.rust_type
    }

    pub fn rust_type_name(&self) -> &'static str {
        self.rust_type_name
    }

    /// Attributes the default encoder writes, in declaration order.
    pub fn exposed_attributes(&self) -> &[String] {
        &self.exposed
    }

    /// Attribute map of `record`, through the custom encoder if one was
    /// declared.
    pub fn encode(&self, record: &dyn Record) -> Result<Fields, CodecError> {
        match &self.encode {
            Some(encode) => encode(record),
            None => Ok(self.default_encode(record)),
        }
    }

    /// Read every exposed attribute the instance carries.
    pub fn default_encode(&self, record: &dyn Record) -> Fields {
        let mut fields = Fields::new();
        for name in &self.exposed {
            if let Some(value) = record.attribute(name) {
                fields.insert(name.clone(), value);
            }
        }
        fields
    }

    /// Rebuild an instance from its attribute map (reserved keys already
    /// stripped).
    pub fn decode(&self, fields: Fields) -> Result<Box<dyn Record>, CodecError> {
        match &self.reconstruct {
            Reconstruct::Build(build) => build(fields),
            Reconstruct::Construct { params, construct } => {
                let mut args: Fields = params
                    .iter()
                    .filter_map(|p| fields.get(p).map(|v| (p.clone(), v.clone())))
                    .collect();
                let mut record = construct(&mut args)?;
                for (name, value) in fields {
                    if self.not_assigned.contains(&name) {
                        continue;
                    }
                    record.set_attribute(&name, value)?;
                }
                Ok(record)
            }
        }
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("rust_type", &self.rust_type_name)
            .field("exposed", &self.exposed)
            .field("custom_encode", &self.encode.is_some())
            .finish_non_exhaustive()
    }
}

fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Declares a [`RecordType`]. See the module docs for the reconstruction
/// strategies.
pub struct RecordTypeBuilder<T> {
    name: String,
    attributes: Vec<AttributeDecl>,
    include: Vec<String>,
    exclude: HashSet<String>,
    encode: Option<EncodeFn>,
    reconstruct: Option<Reconstruct>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Record> RecordTypeBuilder<T> {
    fn new(name: String) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            include: Vec::new(),
            exclude: HashSet::new(),
            encode: None,
            reconstruct: None,
            _marker: PhantomData,
        }
    }

    fn attribute(mut self, name: impl Into<String>, kind: AttributeKind) -> Self {
        self.attributes.push(AttributeDecl {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn field(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::Stored)
    }

    pub fn fields(self, names: &[&str]) -> Self {
        names.iter().fold(self, |b, name| b.field(*name))
    }

    pub fn computed(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::Computed)
    }

    pub fn method(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::Method)
    }

    /// Always serialize `name`, overriding every exclusion rule.
    pub fn include(mut self, name: impl Into<String>) -> Self {
        self.include.push(name.into());
        self
    }

    /// Never serialize `name`, nor assign it during reconstruction, unless it
    /// is also included.
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.exclude.insert(name.into());
        self
    }

    /// Two-phase reconstruction: `construct` receives the envelope entries
    /// named in `params` (absent ones are simply missing), then every
    /// stored attribute is assigned with [`Record::set_attribute`]. Computed
    /// and method attributes are written but never assigned back.
    pub fn constructor<F>(mut self, params: &[&str], construct: F) -> Self
    where
        F: Fn(&mut Fields) -> Result<T, CodecError> + Send + Sync + 'static,
    {
        let construct: ConstructFn =
            Arc::new(move |args| construct(args).map(|r| Box::new(r) as Box<dyn Record>));
        self.reconstruct = Some(Reconstruct::Construct {
            params: params.iter().map(|p| p.to_string()).collect(),
            construct,
        });
        self
    }

    /// Start from `T::default()`, then assign every attribute.
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(&[], |_| Ok(T::default()))
    }

    /// Build the instance from the full field map in one step.
    pub fn from_fields<F>(mut self, build: F) -> Self
    where
        F: Fn(Fields) -> Result<T, CodecError> + Send + Sync + 'static,
    {
        self.reconstruct = Some(Reconstruct::Build(Arc::new(move |fields| {
            build(fields).map(|r| Box::new(r) as Box<dyn Record>)
        })));
        self
    }

    /// Replace both phases. The attribute declarations and include/exclude
    /// sets are ignored when encoding.
    pub fn custom<E, D>(mut self, encode: E, decode: D) -> Self
    where
        E: Fn(&T) -> Result<Fields, CodecError> + Send + Sync + 'static,
        D: Fn(Fields) -> Result<T, CodecError> + Send + Sync + 'static,
    {
        self.encode = Some(Arc::new(move |record: &dyn Record| {
            match AnyRecord::as_any(record).downcast_ref::<T>() {
                Some(record) => encode(record),
                None => Err(CodecError::unsupported(AnyRecord::rust_type_name(record))),
            }
        }));
        self.from_fields(decode)
    }

    pub fn build(self) -> Result<RecordType, RegistrationError> {
        let invalid = |reason: String| RegistrationError::InvalidRecordType {
            name: self.name.clone(),
            reason,
        };
        if self.name.is_empty() {
            return Err(invalid("declared name is empty".into()));
        }
        let declared = self.attributes.iter().map(|a| &a.name);
        if let Some(name) = declared.chain(&self.include).find(|n| is_reserved_key(n)) {
            return Err(invalid(format!("`{name}` is a reserved key")));
        }
        let Some(reconstruct) = self.reconstruct.clone() else {
            return Err(invalid(
                "no constructor, builder or custom decoder declared".into(),
            ));
        };

        let mut exposed: Vec<String> = Vec::new();
        for decl in &self.attributes {
            let forced = self.include.contains(&decl.name);
            let eligible = !is_internal_name(&decl.name)
                && !self.exclude.contains(&decl.name)
                && decl.kind == AttributeKind::Stored;
            if (forced || eligible) && !exposed.contains(&decl.name) {
                exposed.push(decl.name.clone());
            }
        }
        for name in &self.include {
            if !exposed.contains(name) {
                exposed.push(name.clone());
            }
        }

        let derived = self
            .attributes
            .iter()
            .filter(|a| a.kind != AttributeKind::Stored)
            .map(|a| a.name.clone());
        let not_assigned = self
            .exclude
            .iter()
            .filter(|name| !self.include.contains(name))
            .cloned()
            .chain(derived)
            .collect();

        Ok(RecordType {
            name: self.name,
            rust_type: TypeId::of::<T>(),
            rust_type_name: std::any::type_name::<T>(),
            exposed,
            not_assigned,
            encode: self.encode,
            reconstruct,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Widget {
        size: i64,
        colour: String,
        secret: String,
        _cache: i64,
    }

    impl Record for Widget {
        fn attribute(&self, name: &str) -> Option<Value> {
            match name {
                "size" => Some(self.size.into()),
                "colour" => Some(self.colour.clone().into()),
                "secret" => Some(self.secret.clone().into()),
                "_cache" => Some(self._cache.into()),
                "area" => Some((self.size * self.size).into()),
                "describe" => Some(format!("{} widget", self.colour).into()),
                _ => None,
            }
        }

        fn set_attribute(&mut self, name: &str, value: Value) -> Result<(), CodecError> {
            let mut f = Fields::new().with(name, value);
            match name {
                "size" => self.size = f.take(name)?,
                "colour" => self.colour = f.take(name)?,
                "secret" => self.secret = f.take(name)?,
                "_cache" => self._cache = f.take(name)?,
                _ => return Err(CodecError::no_such_attribute("Widget", name)),
            }
            Ok(())
        }
    }

    fn widget_type() -> RecordTypeBuilder<Widget> {
        RecordType::builder::<Widget>("Widget")
            .fields(&["size", "colour", "secret", "_cache"])
            .computed("area")
            .method("describe")
            .default_constructor()
    }

    #[test]
    fn default_filtering() {
        let ty = widget_type().build().unwrap();
        assert_eq!(ty.exposed_attributes(), &["size", "colour", "secret"]);
    }

    #[test]
    fn exclusion_removes_eligible_attribute() {
        let ty = widget_type().exclude("secret").build().unwrap();
        assert_eq!(ty.exposed_attributes(), &["size", "colour"]);
    }

    #[test]
    fn inclusion_beats_every_exclusion_rule() {
        let ty = widget_type()
            .exclude("secret")
            .include("secret")
            .include("_cache")
            .include("area")
            .include("describe")
            .build()
            .unwrap();
        assert_eq!(
            ty.exposed_attributes(),
            &["size", "colour", "secret", "_cache", "area", "describe"]
        );
    }

    #[test]
    fn reserved_attribute_names_are_rejected() {
        let err = widget_type().field("__class__").build().unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidRecordType { .. }));
    }

    #[test]
    fn a_reconstruction_strategy_is_required() {
        let err = RecordType::builder::<Widget>("Widget")
            .field("size")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("no constructor"));
    }

    #[test]
    fn for_type_uses_short_name() {
        let ty = RecordType::for_type::<Widget>().default_constructor().build().unwrap();
        assert_eq!(ty.name(), "Widget");
        assert_eq!(short_type_name("a::b::Point<a::F>"), "Point");
    }

    #[test]
    fn encode_then_decode_via_default_constructor() {
        let ty = widget_type().build().unwrap();
        let widget = Widget {
            size: 3,
            colour: "red".into(),
            secret: "s".into(),
            _cache: 9,
        };
        let fields = ty.encode(&widget).unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields.get("size"), Some(&Value::Int(3)));

        let rebuilt = ty.decode(fields).unwrap();
        let rebuilt = AnyRecord::as_any(&*rebuilt).downcast_ref::<Widget>().unwrap();
        assert_eq!(rebuilt.size, 3);
        assert_eq!(rebuilt.colour, "red");
        assert_eq!(rebuilt._cache, 0);
    }

    #[test]
    fn excluded_keys_are_not_assigned_on_decode() {
        let ty = widget_type().exclude("secret").build().unwrap();
        let fields = Fields::new().with("size", 1i64).with("secret", "injected");
        let rebuilt = ty.decode(fields).unwrap();
        let rebuilt = AnyRecord::as_any(&*rebuilt).downcast_ref::<Widget>().unwrap();
        assert_eq!(rebuilt.secret, "");
    }

    #[test]
    fn included_keys_survive_an_exclusion_on_decode() {
        let ty = widget_type().exclude("secret").include("secret").build().unwrap();
        let widget = Widget {
            size: 2,
            colour: "blue".into(),
            secret: "s3cret".into(),
            _cache: 0,
        };
        let rebuilt = ty.decode(ty.encode(&widget).unwrap()).unwrap();
        let rebuilt = AnyRecord::as_any(&*rebuilt).downcast_ref::<Widget>().unwrap();
        assert_eq!(rebuilt, &widget);
    }

    #[test]
    fn included_derived_attributes_are_written_but_not_assigned() {
        let ty = widget_type().include("area").include("describe").build().unwrap();
        let widget = Widget {
            size: 4,
            colour: "green".into(),
            secret: String::new(),
            _cache: 0,
        };
        let fields = ty.encode(&widget).unwrap();
        assert_eq!(fields.get("area"), Some(&Value::Int(16)));
        assert_eq!(fields.get("describe"), Some(&Value::from("green widget")));

        let rebuilt = ty.decode(fields).unwrap();
        let rebuilt = AnyRecord::as_any(&*rebuilt).downcast_ref::<Widget>().unwrap();
        assert_eq!(rebuilt, &widget);
    }

    #[test]
    fn unknown_attribute_fails_decode() {
        let ty = widget_type().build().unwrap();
        let err = ty.decode(Fields::new().with("weight", 2i64)).unwrap_err();
        assert!(matches!(err, CodecError::MalformedEnvelope { .. }));
    }
}
